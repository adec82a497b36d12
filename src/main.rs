use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use wastectl::config::{self, Config};
use wastectl::estimator::CostEstimator;
use wastectl::exit_codes::exit_code_for_anyhow;
use wastectl::{output, region, resources};

#[derive(Parser)]
#[command(name = "wastectl")]
#[command(
    about = "Estimate the monthly cost of idle and unattached AWS resources",
    long_about = "wastectl prices resources flagged by waste scanners so cleanup can be prioritized.\n\nSupports:\n  - EBS volumes, EC2 instances, load balancers, RDS clusters and instances\n  - Static pricing from a built-in, inline, or file-based table\n  - Live pricing from the AWS Price List API with static fallback"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "WASTECTL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate monthly cost for a list of flagged resources
    ///
    /// Examples:
    ///   wastectl estimate resources.json
    ///   scanner | wastectl estimate --output json
    ///   wastectl estimate resources.json --pricing-mode live
    Estimate {
        /// JSON array of resource records (stdin if omitted)
        input: Option<PathBuf>,
        /// Pricing mode: static or live (overrides PRICING_MODE)
        #[arg(long)]
        pricing_mode: Option<String>,
        /// Inline JSON pricing table (overrides PRICING_JSON)
        #[arg(long)]
        pricing_json: Option<String>,
        /// JSON pricing table file (overrides PRICING_FILE)
        #[arg(long)]
        pricing_file: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Print the region for availability zone names
    Region {
        /// Zone names (e.g. us-east-1a, us-east-1-bos-1a)
        #[arg(required = true)]
        zones: Vec<String>,
    },
    /// Write a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".wastectl.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    if let Err(e) = run(cli).await {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(exit_code_for_anyhow(&e));
    }
}

fn init_logging(verbose: bool, format: LogFormat) {
    // Only warnings by default; RUST_LOG wins when set
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Estimate {
            input,
            pricing_mode,
            pricing_json,
            pricing_file,
            output: output_format,
        } => {
            let mut config = Config::load(cli.config.as_deref())?;
            config.apply_env()?;
            if let Some(mode) = pricing_mode {
                config.pricing.mode = mode;
            }
            if let Some(json) = pricing_json {
                config.pricing.json = Some(json);
            }
            if let Some(file) = pricing_file {
                config.pricing.file = Some(file);
            }

            let resources = resources::load_resources(input.as_deref()).with_context(|| {
                format!(
                    "Failed to read resources from {}",
                    input
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "stdin".to_string())
                )
            })?;

            let estimator = CostEstimator::from_config(&config).await?;
            let report = estimator.estimate(&resources).await?;

            match output_format {
                OutputFormat::Json => println!("{}", output::render_json(&report)?),
                OutputFormat::Text => print!("{}", output::render_table(&report)),
            }
        }
        Commands::Region { zones } => {
            for zone in zones {
                println!("{}\t{}", zone, region::region_from_az(&zone));
            }
        }
        Commands::Init { output } => {
            config::init_config(&output)?;
        }
    }

    Ok(())
}
