//! Holdings reconciliation command implementation

use anyhow::Result;
use market_synth::{holdings, Config};
use tracing::info;

use crate::commands::print_elasticsearch_note;

pub fn run(
    config_path: Option<String>,
    trades_override: Option<String>,
    output_override: Option<String>,
    elasticsearch: bool,
) -> Result<()> {
    info!("Starting holdings reconciliation");

    let config = Config::load(config_path.as_deref())?;
    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path);
    }

    let trades_file = trades_override.unwrap_or_else(|| config.paths.trades.clone());
    let output_file = output_override.unwrap_or_else(|| config.paths.holdings.clone());

    let summary = holdings::reconcile(&trades_file, &output_file)?;

    println!("\n{}", "=".repeat(60));
    println!("HOLDINGS RECONCILIATION RESULTS");
    println!("{}", "=".repeat(60));
    println!("Executed Trades:    {}", summary.stats.executed);
    println!("Cancelled Trades:   {}", summary.stats.cancelled);
    println!("Malformed Lines:    {}", summary.stats.malformed);
    println!("Holdings Written:   {}", summary.holdings_written);
    println!("Long Positions:     {}", summary.long_positions);
    println!("Short Positions:    {}", summary.short_positions);
    println!("Noise Filtered:     {}", summary.positions_filtered);
    println!("Output File:        {}", output_file);
    println!("{}", "=".repeat(60));

    if elasticsearch {
        print_elasticsearch_note(&output_file, "holdings", "holding_id");
    }

    info!("Holdings reconciliation completed successfully");

    Ok(())
}
