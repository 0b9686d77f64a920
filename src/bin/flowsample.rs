//! `flowsample`: run the adaptive sampling filter over a file of flow records
//!
//! Input lines hold a source and a destination separated by the delimiter
//! (tab by default). Each line is written back with `Sampled` or
//! `Not Sampled` appended.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use flowsample::driver::{self, DriverOptions, RecordFormat, DEFAULT_PROGRESS_INTERVAL};
use flowsample::sampling::{
    FilterConfig, DEFAULT_REAL_SIZE, DEFAULT_TARGET_PROBABILITY, DEFAULT_TOTAL_SIZE,
};

#[derive(Debug, Parser)]
#[command(name = "flowsample", version, about)]
struct Args {
    /// Input file of delimited source/destination records
    #[arg(env = "FLOWSAMPLE_INPUT")]
    input: PathBuf,

    /// Output file
    #[arg(short, long, env = "FLOWSAMPLE_OUTPUT", default_value = "output.txt")]
    output: PathBuf,

    /// Buckets tracked by the bitmap
    #[arg(long, env = "FLOWSAMPLE_REAL_SIZE", default_value_t = DEFAULT_REAL_SIZE)]
    real_size: usize,

    /// Size of the full hash space (real + virtual)
    #[arg(long, env = "FLOWSAMPLE_TOTAL_SIZE", default_value_t = DEFAULT_TOTAL_SIZE)]
    total_size: usize,

    /// Target sampling probability in (0, 1]
    #[arg(short, long, env = "FLOWSAMPLE_PROBABILITY", default_value_t = DEFAULT_TARGET_PROBABILITY)]
    probability: f64,

    /// Seed for the sampling generator
    #[arg(long, env = "FLOWSAMPLE_SEED")]
    seed: Option<u64>,

    /// Field delimiter for input and output records
    #[arg(short, long, env = "FLOWSAMPLE_DELIMITER", default_value_t = '\t')]
    delimiter: char,

    /// Log progress every N lines (0 disables)
    #[arg(long, env = "FLOWSAMPLE_PROGRESS_EVERY", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    progress_every: u64,

    /// Start a new sampling period every N records
    #[arg(long, env = "FLOWSAMPLE_RESET_EVERY", value_parser = clap::value_parser!(u64).range(1..))]
    reset_every: Option<u64>,
}

impl Args {
    fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            real_size: self.real_size,
            total_size: self.total_size,
            target_probability: self.probability,
            seed: self.seed,
        }
    }

    fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            format: RecordFormat {
                delimiter: self.delimiter,
            },
            progress_interval: self.progress_every,
            reset_every: self.reset_every,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Fail on bad parameters before touching any file
    let config = args.filter_config();
    let mut filter = config.build().context("invalid filter configuration")?;

    tracing::info!(
        real_size = config.real_size,
        total_size = config.total_size,
        probability = config.target_probability,
        eligible = config.eligible_fraction(),
        input = %args.input.display(),
        output = %args.output.display(),
        "starting"
    );

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open input {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("failed to create output {}", args.output.display()))?;

    let report = driver::run(
        &mut filter,
        BufReader::new(input),
        BufWriter::new(output),
        &args.driver_options(),
    )
    .context("sampling run failed")?;

    let stats = filter.stats();
    tracing::info!(
        rows = report.records,
        lines = report.lines,
        sampled = report.sampled,
        malformed = report.malformed,
        fill_ratio = stats.fill_ratio(),
        "processing completed, total rows processed: {}",
        report.records
    );

    Ok(())
}
