//! filings: fetch, verify and normalize SEC filings for a roster of entities.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{ArgGroup, Parser};
use filings::{Pipeline, PipelineConfig, Symbol, config::MAX_ATTEMPTS};
use tracing::info;

#[derive(Parser)]
#[command(name = "filings")]
#[command(about = "Fetch, verify and normalize SEC filings for a roster of entities")]
#[command(group(ArgGroup::new("entities").required(true).args(["symbols", "roster"])))]
struct Cli {
    /// Ticker symbols to process
    symbols: Vec<String>,

    /// File with one symbol per line; blank lines and `#` comments are skipped
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Data directory; filings are staged under `<DATA_DIR>/sec_filings`
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// User agent sent to EDGAR, e.g. "MyApp/1.0 (me@example.com)"
    #[arg(long, env = "SEC_EDGAR_USER_AGENT")]
    user_agent: String,

    /// Fetch attempts per entity before giving up
    #[arg(long, default_value_t = MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Zip file to write; defaults to `<DATA_DIR>.zip`, or
    /// `<DATA_DIR>/sec_filings.zip` when the data dir has no name (`.`, `..`)
    #[arg(long, conflicts_with = "no_package")]
    package: Option<PathBuf>,

    /// Skip packaging
    #[arg(long)]
    no_package: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let symbols = match &cli.roster {
        Some(path) => read_roster(path)?,
        None => cli.symbols.iter().map(Symbol::new).collect(),
    };
    if symbols.is_empty() {
        bail!("no symbols to process");
    }

    let mut config = PipelineConfig::new(cli.data_dir.join("sec_filings"))
        .with_max_attempts(cli.max_attempts);
    if !cli.no_package {
        let zip_path = cli
            .package
            .clone()
            .unwrap_or_else(|| default_package_path(&cli.data_dir));
        config = config.with_package(zip_path);
    }

    info!(
        symbols = symbols.len(),
        root = %config.staging_root.display(),
        "Configured run"
    );

    let pipeline = Pipeline::edgar(&cli.user_agent, config)?;
    let summary = pipeline.run(&symbols).await?;

    println!(
        "{} of {} entities complete, {} bundles renamed",
        summary.completed.len(),
        summary.entities_processed,
        summary.renamed
    );
    if summary.has_failures() {
        println!("Some filings need attention; see the log for details");
    }

    Ok(())
}

/// `data` gives `data.zip`; a nameless dir such as `.` keeps the zip inside it.
fn default_package_path(data_dir: &Path) -> PathBuf {
    match data_dir.file_name() {
        Some(_) => data_dir.with_extension("zip"),
        None => data_dir.join("sec_filings.zip"),
    }
}

fn read_roster(path: &Path) -> anyhow::Result<Vec<Symbol>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading roster {}", path.display()))?;
    Ok(parse_roster(&content))
}

fn parse_roster(content: &str) -> Vec<Symbol> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Symbol::new)
        .collect()
}
