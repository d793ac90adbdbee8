//! Insider-trading scenario command implementation

use anyhow::Result;
use market_synth::{assets, scenarios::insider_trading, Config};
use tracing::info;

use crate::commands::print_elasticsearch_note;

pub fn run(
    config_path: Option<String>,
    num_scenarios: usize,
    output_override: Option<String>,
    elasticsearch: bool,
) -> Result<()> {
    info!("Starting insider trading generation");

    let config = Config::load(config_path.as_deref())?;
    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path);
    }

    let output_file = output_override.unwrap_or_else(|| config.paths.controlled_trades.clone());
    let mut rng = rand::thread_rng();

    let asset_prices = assets::load_asset_prices(&config.paths.asset_details, &mut rng);

    let count = insider_trading::generate_scenarios(
        &config.insider_trading,
        &mut rng,
        &config.paths.accounts,
        &asset_prices,
        num_scenarios,
        &output_file,
    )?;

    println!("\n{}", "=".repeat(60));
    println!("INSIDER TRADING RESULTS");
    println!("{}", "=".repeat(60));
    println!("Scenarios:          {}", num_scenarios);
    println!("Trades Appended:    {}", count);
    println!("Output File:        {}", output_file);
    println!("{}", "=".repeat(60));

    if elasticsearch {
        print_elasticsearch_note(&output_file, "trades", "trade_id");
    }

    info!("Insider trading generation completed successfully");

    Ok(())
}
