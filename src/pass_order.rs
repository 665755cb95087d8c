//! Closed enumeration of the compiler's optimization pass set
//!
//! Pass orderings are permutations of a fixed three-pass set. Parsing
//! normalizes case and whitespace; wrong cardinality, unknown tokens, and
//! duplicates are rejected during configuration loading, before any
//! compilation is attempted.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Errors produced while validating pass-order configuration entries
#[derive(Error, Debug)]
pub enum PassOrderError {
    #[error("Invalid pass name '{0}' (expected inline, unroll, tail)")]
    UnknownPass(String),

    #[error("Each pass_orders entry must have a 'name'")]
    MissingName,

    #[error("Pass order '{name}' must specify {expected} passes (got {actual})")]
    WrongLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Pass order '{name}' must list each pass exactly once")]
    DuplicatePass { name: String },
}

/// One optimization pass of the compiler's fixed pass set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Function inlining
    Inline,
    /// Loop unrolling
    Unroll,
    /// Tail-call elimination
    Tail,
}

impl Pass {
    /// Size of the fixed pass set
    pub const COUNT: usize = 3;

    /// Canonical lower-case token used in flags and configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Pass::Inline => "inline",
            Pass::Unroll => "unroll",
            Pass::Tail => "tail",
        }
    }

    /// Parse a pass token, trimming whitespace and ignoring case
    pub fn parse(token: &str) -> Result<Self, PassOrderError> {
        match token.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Pass::Inline),
            "unroll" => Ok(Pass::Unroll),
            "tail" => Ok(Pass::Tail),
            _ => Err(PassOrderError::UnknownPass(token.to_string())),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named permutation of the fixed pass set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOrdering {
    /// Configuration-supplied label for this ordering
    pub name: String,
    /// The permutation itself, in application order
    pub order: Vec<Pass>,
}

impl PassOrdering {
    /// The single ordering used when the configuration lists no `pass_orders`
    pub fn default_ordering() -> Self {
        Self {
            name: "inline-unroll-tail".to_string(),
            order: vec![Pass::Inline, Pass::Unroll, Pass::Tail],
        }
    }

    /// Validate a raw configuration entry into a canonical ordering
    pub fn from_entry(name: &str, order: &[String]) -> Result<Self, PassOrderError> {
        if name.trim().is_empty() {
            return Err(PassOrderError::MissingName);
        }
        if order.len() != Pass::COUNT {
            return Err(PassOrderError::WrongLength {
                name: name.to_string(),
                expected: Pass::COUNT,
                actual: order.len(),
            });
        }

        let mut passes = Vec::with_capacity(Pass::COUNT);
        for token in order {
            passes.push(Pass::parse(token)?);
        }
        let distinct: HashSet<Pass> = passes.iter().copied().collect();
        if distinct.len() != Pass::COUNT {
            return Err(PassOrderError::DuplicatePass {
                name: name.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            order: passes,
        })
    }

    /// Comma-joined canonical tokens, e.g. `inline,unroll,tail`
    pub fn joined(&self) -> String {
        self.order
            .iter()
            .map(Pass::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The compiler flag encoding this ordering
    pub fn flag(&self) -> String {
        format!("--pass-order={}", self.joined())
    }
}
