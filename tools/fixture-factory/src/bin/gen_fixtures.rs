//! Fixture generator CLI
//!
//! Writes a batch of backtest test cases to disk.
//!
//! Usage:
//!   gen-fixtures --instruments instruments.json --tickers tickers.json --dest ./cases
//!   gen-fixtures --instruments instruments.json --tickers tickers.json --config factory.json --seed 7

use anyhow::{Context, Result};
use clap::Parser;
use fixture_factory::{FactoryConfig, StaticPriceSource, TestFactory};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use types::instrument::Catalogue;

#[derive(Parser, Debug)]
#[command(name = "gen-fixtures")]
#[command(about = "Generate backtest fixtures: instructions, order books and referred balances")]
struct Args {
    /// Instrument catalogue (extract or raw exchange response)
    #[arg(long, env = "FIXTURE_INSTRUMENTS")]
    instruments: PathBuf,

    /// Last traded prices (tickers response or symbol -> price map)
    #[arg(long, env = "FIXTURE_TICKERS")]
    tickers: PathBuf,

    /// Factory configuration JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Number of test cases
    #[arg(long)]
    count: Option<usize>,

    /// Exact pair count per test case
    #[arg(long)]
    pairs: Option<usize>,

    /// RNG seed
    #[arg(long, env = "FIXTURE_SEED")]
    seed: Option<u64>,

    /// Window length in seconds
    #[arg(long)]
    window_secs: Option<u64>,

    /// Mean seconds between instructions
    #[arg(long)]
    sec_per_inst: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FactoryConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FactoryConfig::default(),
    };
    if let Some(dest) = args.dest {
        config.dest_path = dest;
    }
    if let Some(count) = args.count {
        config.test_num = count;
    }
    if let Some(pairs) = args.pairs {
        config.min_pairs = pairs;
        config.max_pairs = pairs;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(secs) = args.window_secs {
        config.window_sec = Some(secs);
    }
    if let Some(sec_per_inst) = args.sec_per_inst {
        config.sec_per_inst = sec_per_inst;
    }

    let catalogue_json = std::fs::read_to_string(&args.instruments)
        .with_context(|| format!("Failed to read {}", args.instruments.display()))?;
    let catalogue = Catalogue::from_json(&catalogue_json).context("Failed to parse instrument catalogue")?;

    let tickers_json = std::fs::read_to_string(&args.tickers)
        .with_context(|| format!("Failed to read {}", args.tickers.display()))?;
    let prices = StaticPriceSource::from_tickers_json(&tickers_json).context("Failed to parse tickers")?;

    info!(
        instruments = catalogue.len(),
        prices = prices.len(),
        test_num = config.test_num,
        dest = %config.dest_path.display(),
        "Starting fixture generation"
    );

    let mut factory = TestFactory::new(config, catalogue, prices).context("Invalid factory configuration")?;
    let written = factory.write_batch().context("Fixture generation failed")?;

    info!(count = written.len(), "Done");
    Ok(())
}
