use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error};

use fastetl::config::{ConfigFile, ExecutionConfig};
use fastetl::logging::FileSink;
use fastetl::scheduler;
use fastetl::subprocess::TokioProcessRunner;

/// Export blockchain blocks and transactions in parallel chunks
#[derive(Parser)]
#[command(name = "fastetl", version)]
#[command(about = "Parallel chunked driver for ethereum-etl exports", long_about = None)]
struct Cli {
    /// First block to export (inclusive)
    #[arg(long, env = "FASTETL_START_BLOCK")]
    start_block: Option<u64>,

    /// Last block to export (inclusive)
    #[arg(long, env = "FASTETL_END_BLOCK")]
    end_block: Option<u64>,

    /// Blocks per extractor invocation
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Maximum number of concurrent extractor processes
    #[arg(long)]
    max_workers: Option<usize>,

    /// Node endpoint passed to the extractor
    #[arg(long, env = "FASTETL_PROVIDER_URI")]
    provider_uri: Option<String>,

    /// Extractor-internal RPC batch size
    #[arg(long)]
    batch_size: Option<u64>,

    /// Extractor-internal writer thread count
    #[arg(long)]
    writer_threads: Option<usize>,

    /// Extractor executable to invoke
    #[arg(long)]
    extractor: Option<String>,

    /// Directory for blocks/ and transactions/ output
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Append-only job log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Path to a TOML configuration file (flags take precedence)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigFile {
        ConfigFile {
            start_block: self.start_block,
            end_block: self.end_block,
            chunk_size: self.chunk_size,
            max_workers: self.max_workers,
            provider_uri: self.provider_uri.clone(),
            batch_size: self.batch_size,
            writer_threads: self.writer_threads,
            extractor: self.extractor.clone(),
            output_dir: self.output_dir.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let config = ExecutionConfig::resolve(cli.overrides(), file)?;

    let sink = Arc::new(FileSink::create(&config.log_file)?);
    let runner = Arc::new(TokioProcessRunner);

    let summary = scheduler::run(config, runner, sink).await?;
    debug!(
        "run finished: {} chunks, {} succeeded, {} failed",
        summary.total, summary.succeeded, summary.failed
    );
    Ok(())
}
