//! Baseline trade-ledger command implementation

use anyhow::Result;
use market_synth::{assets, store, trades, Config};
use tracing::info;

use crate::commands::print_elasticsearch_note;

pub fn run(
    config_path: Option<String>,
    output_override: Option<String>,
    elasticsearch: bool,
) -> Result<()> {
    info!("Starting trade ledger generation");

    let config = Config::load(config_path.as_deref())?;
    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path);
    }

    let output_file = output_override.unwrap_or_else(|| config.paths.trades.clone());
    let mut rng = rand::thread_rng();

    let accounts = store::load_accounts(&config.paths.accounts)?;
    info!("Loaded {} accounts", accounts.len());

    let asset_prices = assets::load_asset_prices(&config.paths.asset_details, &mut rng);
    info!("Loaded base prices for {} symbols", asset_prices.len());

    let count = trades::generate_ledger(
        &config.trades,
        &mut rng,
        &accounts,
        &asset_prices,
        &output_file,
    )?;

    println!("\n{}", "=".repeat(60));
    println!("TRADE GENERATION RESULTS");
    println!("{}", "=".repeat(60));
    println!("Accounts Processed: {}", accounts.len());
    println!("Symbols Available:  {}", asset_prices.len());
    println!("Trades Written:     {}", count);
    println!(
        "Trading Window:     {} to {}",
        config.trades.time_window_start, config.trades.time_window_end
    );
    println!("Output File:        {}", output_file);
    println!("{}", "=".repeat(60));

    if elasticsearch {
        print_elasticsearch_note(&output_file, "trades", "trade_id");
    }

    info!("Trade ledger generation completed successfully");

    Ok(())
}
