//! Market synth - main entry point
//!
//! This binary provides seven subcommands:
//! - accounts: Generate the synthetic account store
//! - assets: Generate asset reference data with base prices
//! - trades: Generate the baseline trade ledger
//! - holdings: Reconcile the trade ledger into net holdings
//! - wash: Generate wash-trading ring scenarios
//! - pump: Generate pump-and-dump schemes
//! - insider: Generate insider-trading scenarios

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "market-synth")]
#[command(about = "Synthetic trading data and fraud-scenario generation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the synthetic account store
    Accounts {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Number of accounts (overrides config file)
        #[arg(short, long)]
        num_accounts: Option<usize>,

        /// Output file (overrides config file)
        #[arg(short, long)]
        output_file: Option<String>,
    },

    /// Generate asset reference data with base prices
    Assets {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Output file (overrides config file)
        #[arg(short, long)]
        output_file: Option<String>,
    },

    /// Generate the baseline trade ledger
    Trades {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Output file (overrides config file)
        #[arg(short, long)]
        output_file: Option<String>,

        /// Print Elasticsearch bulk-loading instructions after generation
        #[arg(long)]
        elasticsearch: bool,
    },

    /// Reconcile the trade ledger into net holdings
    Holdings {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Trade ledger to reconcile (overrides config file)
        #[arg(short, long)]
        trades_file: Option<String>,

        /// Output file (overrides config file)
        #[arg(short, long)]
        output_file: Option<String>,

        /// Print Elasticsearch bulk-loading instructions after generation
        #[arg(long)]
        elasticsearch: bool,
    },

    /// Generate wash-trading ring scenarios
    Wash {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Number of scenarios to generate
        #[arg(short, long, default_value = "2")]
        num_scenarios: usize,

        /// Output file (overrides config file)
        #[arg(short, long)]
        output_file: Option<String>,

        /// Print Elasticsearch bulk-loading instructions after generation
        #[arg(long)]
        elasticsearch: bool,
    },

    /// Generate pump-and-dump schemes
    Pump {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Number of schemes to generate
        #[arg(short, long, default_value = "1")]
        num_scenarios: usize,

        /// Output file (overrides config file)
        #[arg(short, long)]
        output_file: Option<String>,

        /// Print Elasticsearch bulk-loading instructions after generation
        #[arg(long)]
        elasticsearch: bool,
    },

    /// Generate insider-trading scenarios
    Insider {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Number of scenarios to generate
        #[arg(short, long, default_value = "3")]
        num_scenarios: usize,

        /// Output file (overrides config file)
        #[arg(short, long)]
        output_file: Option<String>,

        /// Print Elasticsearch bulk-loading instructions after generation
        #[arg(long)]
        elasticsearch: bool,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Create log file with naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // File layer - same format but without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Accounts { .. } => "accounts",
        Commands::Assets { .. } => "assets",
        Commands::Trades { .. } => "trades",
        Commands::Holdings { .. } => "holdings",
        Commands::Wash { .. } => "wash",
        Commands::Pump { .. } => "pump",
        Commands::Insider { .. } => "insider",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Accounts {
            config,
            num_accounts,
            output_file,
        } => commands::accounts::run(config, num_accounts, output_file),

        Commands::Assets {
            config,
            output_file,
        } => commands::assets::run(config, output_file),

        Commands::Trades {
            config,
            output_file,
            elasticsearch,
        } => commands::trades::run(config, output_file, elasticsearch),

        Commands::Holdings {
            config,
            trades_file,
            output_file,
            elasticsearch,
        } => commands::holdings::run(config, trades_file, output_file, elasticsearch),

        Commands::Wash {
            config,
            num_scenarios,
            output_file,
            elasticsearch,
        } => commands::wash::run(config, num_scenarios, output_file, elasticsearch),

        Commands::Pump {
            config,
            num_scenarios,
            output_file,
            elasticsearch,
        } => commands::pump::run(config, num_scenarios, output_file, elasticsearch),

        Commands::Insider {
            config,
            num_scenarios,
            output_file,
            elasticsearch,
        } => commands::insider::run(config, num_scenarios, output_file, elasticsearch),
    }
}
