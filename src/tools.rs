//! External toolchain invocation: compiler, wat2wasm, and node
//!
//! The pipeline treats all three as opaque, synchronous, fallible commands.
//! A non-zero exit from any of them is reported with the tool's stderr so a
//! failing trial carries its own diagnostics.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use thiserror::Error;

/// JavaScript snippet that instantiates a wasm module and invokes one export
const NODE_RUNNER: &str = concat!(
    "const fs=require('fs');",
    "(async()=>{",
    "try{",
    "const wasmPath=process.argv[1];",
    "const fn=process.argv[2]||'main';",
    "const bytes=fs.readFileSync(wasmPath);",
    "const {instance}=await WebAssembly.instantiate(bytes);",
    "const result=instance.exports[fn]();",
    "process.stdout.write(String(result));",
    "}catch(err){console.error(err);process.exit(1);}",
    "})();"
);

/// Errors produced while invoking external tools
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}: {stderr}")]
    CommandFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Missing requirements:\n  {}", .0.join("\n  "))]
    Missing(Vec<String>),

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Locations of the external tools the pipeline shells out to
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Path to the optimizing compiler executable
    pub compiler: PathBuf,
    /// wat2wasm executable (bare name resolved via PATH)
    pub wat2wasm: String,
    /// Node.js executable (bare name resolved via PATH)
    pub node: String,
}

/// Check whether an executable is reachable, either directly or via PATH
fn shell_available(executable: &str) -> bool {
    if executable.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(executable).exists();
    }
    match std::env::var_os("PATH") {
        Some(paths) => std::env::split_paths(&paths).any(|dir| dir.join(executable).is_file()),
        None => false,
    }
}

fn run_checked(mut cmd: Command, program: &str) -> Result<Output, ToolError> {
    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(ToolError::CommandFailed {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        });
    }
    Ok(output)
}

fn ensure_parent(path: &Path) -> Result<(), ToolError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ToolError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

impl Toolchain {
    /// Verify every tool is reachable, collecting all problems into one error
    pub fn ensure_available(&self) -> Result<(), ToolError> {
        let mut missing = Vec::new();
        if !self.compiler.exists() {
            missing.push(format!(
                "Compiler executable not found at {}",
                self.compiler.display()
            ));
        }
        if !shell_available(&self.wat2wasm) {
            missing.push(format!("'{}' not found in PATH", self.wat2wasm));
        }
        if !shell_available(&self.node) {
            missing.push(format!("'{}' not found in PATH", self.node));
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ToolError::Missing(missing))
        }
    }

    /// Compile a benchmark source, capturing the textual artifact to `wat_path`
    pub fn compile(
        &self,
        source: &Path,
        flags: &[String],
        wat_path: &Path,
    ) -> Result<(), ToolError> {
        ensure_parent(wat_path)?;
        let mut cmd = Command::new(&self.compiler);
        cmd.arg(source).args(flags);
        let output = run_checked(cmd, &self.compiler.display().to_string())?;
        fs::write(wat_path, &output.stdout).map_err(|source| ToolError::Io {
            path: wat_path.to_path_buf(),
            source,
        })
    }

    /// Convert a textual artifact into an executable wasm module
    pub fn convert(&self, wat_path: &Path, wasm_path: &Path) -> Result<(), ToolError> {
        ensure_parent(wasm_path)?;
        let mut cmd = Command::new(&self.wat2wasm);
        cmd.arg(wat_path).arg("-o").arg(wasm_path);
        run_checked(cmd, &self.wat2wasm)?;
        Ok(())
    }

    /// Execute one exported symbol of a wasm module, returning trimmed stdout
    pub fn execute(&self, wasm_path: &Path, invoke: &str) -> Result<String, ToolError> {
        let mut cmd = Command::new(&self.node);
        cmd.arg("-e").arg(NODE_RUNNER).arg(wasm_path).arg(invoke);
        let output = run_checked(cmd, &self.node)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
