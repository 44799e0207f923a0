use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stock_matcher::config::Config;
use stock_matcher::perf::{self, PerfOptions};
use stock_matcher::workload::PriceDistribution;

#[derive(Parser)]
#[command(name = "stock-matcher", about = "Single-instrument matching core")]
struct Cli {
    /// Log filter used when RUST_LOG is not set (overrides MATCHER_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a synthetic order stream and print a JSON throughput report
    Perf(PerfArgs),
}

#[derive(Args)]
struct PerfArgs {
    /// Orders generated per side
    #[arg(short = 'n', long)]
    orders: Option<usize>,

    /// Notification ring capacity
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Lowest generated price (inclusive)
    #[arg(long)]
    low: Option<i64>,

    /// Highest generated price (exclusive)
    #[arg(long)]
    high: Option<i64>,

    #[arg(long, value_enum)]
    distribution: Option<PriceDistribution>,

    #[arg(long)]
    seed: Option<u64>,

    /// Drain notifications on a separate thread while matching
    #[arg(long)]
    drain: bool,
}

impl PerfArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(orders) = self.orders {
            config.order_count = orders;
        }
        if let Some(capacity) = self.capacity {
            config.notification_capacity = capacity;
        }
        if let Some(low) = self.low {
            config.price_low = low;
        }
        if let Some(high) = self.high {
            config.price_high = high;
        }
        if let Some(distribution) = self.distribution {
            config.distribution = distribution;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::try_from_env().context("could not load config")?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config.log_level);

    match cli.command {
        Commands::Perf(args) => {
            args.apply(&mut config);
            config.validate().context("invalid perf options")?;

            let mut options = PerfOptions::from(&config);
            options.drain = args.drain;
            info!("Starting perf run: {:?}", options);

            let report = perf::run(&options).context("perf run failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
