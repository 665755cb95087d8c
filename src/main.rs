use std::collections::HashMap;

use afinar::aggregate;
use afinar::cli::{AggregateArgs, Cli, CommandKind, FeaturesArgs, SweepArgs, ToolArgs};
use afinar::collect::{run_collect, CollectOptions};
use afinar::config::AutotuneConfig;
use afinar::csv_table;
use afinar::features;
use afinar::majority::resolve_dominant_orders;
use afinar::repeat::{run_repeat, RepeatOptions};
use afinar::sweep::{run_sweep, SweepOptions};
use afinar::tools::Toolchain;
use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn toolchain(args: &ToolArgs) -> Toolchain {
    Toolchain {
        compiler: args.compiler.clone(),
        wat2wasm: args.wat2wasm.clone(),
        node: args.node.clone(),
    }
}

/// Run one full sweep and persist the results table
fn cmd_sweep(args: SweepArgs) -> Result<()> {
    let config = AutotuneConfig::from_path(&args.config)?;
    let tools = toolchain(&args.tools);
    tools.ensure_available()?;

    let options = SweepOptions {
        output_dir: args.out_dir,
        runs: args.runs.unwrap_or(config.runs),
        warmup_runs: args.warmup.unwrap_or(config.warmup_runs),
    };
    let outcome = run_sweep(&config, &tools, &options);
    if outcome.rows.is_empty() {
        bail!(
            "No successful trials out of {} attempted; no results written",
            outcome.attempted
        );
    }
    csv_table::write_results(&outcome.rows, &args.output)?;
    println!(
        "\nWrote {} of {} attempted rows to {}",
        outcome.rows.len(),
        outcome.attempted,
        args.output.display()
    );
    Ok(())
}

/// Aggregate summaries into ranked deltas, per-order means, and tables
fn cmd_aggregate(args: AggregateArgs) -> Result<()> {
    let summary_paths = if args.summaries.is_empty() {
        aggregate::find_default_summaries(&args.project_root)
    } else {
        args.summaries
    };
    let summaries = aggregate::load_summaries(&summary_paths)?;

    let top_stats = aggregate::aggregate_variant_deltas(&summaries);
    let pass_means = aggregate::aggregate_pass_order_means(&summaries);

    aggregate::write_top_deltas_csv(
        &top_stats,
        args.top_n,
        &args.out_dir.join("top_deltas_table.csv"),
    )?;
    aggregate::write_pass_order_means_csv(
        &pass_means,
        &args.out_dir.join("pass_order_means.csv"),
    )?;

    let metrics = aggregate::AggregatedMetrics {
        summaries: summary_paths
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        top_variant_stats: top_stats,
        pass_order_means: pass_means,
    };
    metrics.write_json(&args.metrics)?;
    println!(
        "Wrote tables to {} and metrics to {}",
        args.out_dir.display(),
        args.metrics.display()
    );
    Ok(())
}

/// Resolve dominant orderings and render the feature correlation table
fn cmd_features(args: FeaturesArgs) -> Result<()> {
    let summary_paths = {
        let mut run_dirs: Vec<_> = std::fs::read_dir(&args.batch_runs)
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.is_dir()
                            && path
                                .file_name()
                                .and_then(|name| name.to_str())
                                .is_some_and(|name| name.starts_with("run"))
                    })
                    .collect()
            })
            .unwrap_or_default();
        run_dirs.sort();
        run_dirs
            .into_iter()
            .map(|dir| dir.join("summary.json"))
            .filter(|path| path.exists())
            .collect::<Vec<_>>()
    };
    if summary_paths.is_empty() {
        bail!("No batch runs found under {}", args.batch_runs.display());
    }
    let summaries = aggregate::load_summaries(&summary_paths)?;

    let dominant = resolve_dominant_orders(&summaries);
    let metrics = aggregate::AggregatedMetrics::from_path(&args.metrics)?;
    let avg_deltas: HashMap<(String, String), f64> = metrics
        .top_variant_stats
        .into_iter()
        .map(|(bench, variant, delta)| ((bench, variant), delta))
        .collect();

    let catalog = features::FeatureCatalog::from_path(&args.catalog)?;
    let rows = features::build_table(&catalog, &dominant, &avg_deltas);
    features::write_csv(&rows, &args.out_csv)?;
    features::write_latex(&rows, &args.out_latex)?;
    println!("Wrote benchmark feature tables.");
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    match args.command {
        CommandKind::Sweep(args) => cmd_sweep(args),
        CommandKind::Collect(args) => {
            let tools = toolchain(&args.tools);
            run_collect(&CollectOptions {
                project_root: args.project_root,
                config: args.config,
                results: args.results,
                summary: args.summary,
                out_dir: args.out_dir,
                tools,
                skip_build: args.skip_build,
                skip_tests: args.skip_tests,
                skip_sweep: args.skip_sweep,
                runs: args.runs,
                warmup: args.warmup,
            })
        }
        CommandKind::Aggregate(args) => cmd_aggregate(args),
        CommandKind::Repeat(args) => {
            let tools = toolchain(&args.tools);
            run_repeat(&RepeatOptions {
                runs: args.runs,
                project_root: args.project_root,
                config: args.config,
                results_root: args.results_root,
                tools,
                skip_build_after_first: args.skip_build_after_first,
                skip_tests_after_first: args.skip_tests_after_first,
                extra_args: args.extra_args,
            })
        }
        CommandKind::Features(args) => cmd_features(args),
    }
}
