//! CLI binary for sift.
//!
//! Prints one JSON line per query report on stdout, then a totals line.
//! Tracing output goes to stderr so stdout stays machine-readable.

use clap::Parser;
use sift::{Orchestrator, RunReport, SiftConfig};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sift: find candidate pages for search queries and extract their text.
#[derive(Parser)]
#[command(name = "sift", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable the headless browser tier.
    #[arg(long)]
    render: bool,

    /// Skip the readability proxy tier.
    #[arg(long)]
    no_proxy: bool,

    /// Maximum candidate URLs per query.
    #[arg(long)]
    per_query: Option<usize>,

    /// Write the configuration to the default config path and exit.
    /// Credentials from the environment are not written.
    #[arg(long)]
    init_config: bool,

    /// Search queries to run.
    #[arg(required_unless_present = "init_config")]
    queries: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sift=info,sift_search=info,chromiumoxide=warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    if cli.init_config {
        let path = SiftConfig::default_config_path();
        config.save_to_file(&path)?;
        println!("{}", path.display());
        return Ok(());
    }
    config.apply_env();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(run(config, &cli.queries))?;
    print_report(&report)?;
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<SiftConfig> {
    let mut config = match &cli.config {
        Some(path) => SiftConfig::from_file(path)?,
        None => {
            let default_path = SiftConfig::default_config_path();
            if default_path.exists() {
                SiftConfig::from_file(&default_path)?
            } else {
                SiftConfig::default()
            }
        }
    };
    if cli.render {
        config.render.enabled = true;
    }
    if cli.no_proxy {
        config.proxy.enabled = false;
    }
    if let Some(per_query) = cli.per_query {
        config.search.max_per_query = per_query;
    }
    Ok(config)
}

async fn run(config: SiftConfig, queries: &[String]) -> anyhow::Result<RunReport> {
    let orchestrator = Orchestrator::new(config)?;
    let effective = orchestrator.config();
    info!(
        queries = queries.len(),
        proxy = effective.proxy.enabled,
        render = effective.render.enabled,
        budget = effective.orchestrator.max_concurrent_extractions,
        "starting run"
    );

    let stop = orchestrator.stop_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, finishing the current batch");
            stop.cancel();
        }
    });

    Ok(orchestrator.run(queries).await?)
}

fn print_report(report: &RunReport) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for query in &report.queries {
        serde_json::to_writer(&mut out, query)?;
        writeln!(out)?;
    }
    serde_json::to_writer(
        &mut out,
        &serde_json::json!({
            "totals": report.totals,
            "stopped_early": report.stopped_early,
        }),
    )?;
    writeln!(out)?;
    Ok(())
}
