//! Indicator Analytics CLI
//!
//! Runs anomaly evaluation, forecasting, reporting compliance and category
//! distributions over indicator datasets stored as JSON.

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicator_cli::{
    commands::{CategoriesArgs, ComplianceArgs, EvaluateArgs, ForecastArgs},
    output::{get_formatter, OutputFormat},
    CliResult,
};
use indicator_config::{AnalyticsConfig, ObservabilityConfig};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "indicator-analytics",
    version,
    about = "Anomaly, forecast, compliance and category analytics for monitoring indicators"
)]
struct Cli {
    /// Output format
    #[arg(
        short,
        long,
        global = true,
        value_enum,
        value_name = "FORMAT",
        help = "Output format (table, json)"
    )]
    output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    verbose: bool,

    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "INDICATOR_CONFIG",
        value_name = "FILE",
        help = "Path to configuration file"
    )]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flag anomalous submissions
    #[command(name = "evaluate", about = "Evaluate submissions for anomalies")]
    Evaluate(EvaluateArgs),

    /// Linear forecast of numeric indicators
    #[command(name = "forecast", about = "Project numeric indicators forward")]
    Forecast(ForecastArgs),

    /// Reporting compliance
    #[command(name = "compliance", about = "Compare expected and received reports")]
    Compliance(ComplianceArgs),

    /// Category distribution
    #[command(name = "categories", about = "Category distribution over calendar periods")]
    Categories(CategoriesArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AnalyticsConfig::load(cli.config.clone())?;

    // Initialize tracing
    init_tracing(cli.verbose, &config.observability);
    debug!(config = ?cli.config, "Configuration loaded");

    // Get output formatter
    let formatter = get_formatter(cli.output.unwrap_or_default());

    // Execute command
    match cli.command {
        Commands::Evaluate(args) => args.execute(&config, formatter.as_ref()).await,
        Commands::Forecast(args) => args.execute(&config, formatter.as_ref()).await,
        Commands::Compliance(args) => args.execute(&config, formatter.as_ref()).await,
        Commands::Categories(args) => args.execute(&config, formatter.as_ref()).await,
    }
}

/// Initialize tracing/logging on stderr
fn init_tracing(verbose: bool, observability: &ObservabilityConfig) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&observability.log_level))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logging {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
