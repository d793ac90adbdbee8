//! Pump-and-dump scenario command implementation

use anyhow::Result;
use market_synth::{assets, scenarios::pump_and_dump, Config};
use tracing::info;

use crate::commands::print_elasticsearch_note;

pub fn run(
    config_path: Option<String>,
    num_scenarios: usize,
    output_override: Option<String>,
    elasticsearch: bool,
) -> Result<()> {
    info!("Starting pump and dump generation");

    let config = Config::load(config_path.as_deref())?;
    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path);
    }

    let output_file = output_override.unwrap_or_else(|| config.paths.controlled_trades.clone());
    let mut rng = rand::thread_rng();

    let asset_prices = assets::load_asset_prices(&config.paths.asset_details, &mut rng);

    let summaries = pump_and_dump::generate_scenarios(
        &config.pump_and_dump,
        &mut rng,
        &config.paths.accounts,
        &asset_prices,
        num_scenarios,
        &output_file,
    )?;

    println!("\n{}", "=".repeat(60));
    println!("PUMP AND DUMP RESULTS");
    println!("{}", "=".repeat(60));
    for summary in &summaries {
        println!(
            "{}: {} | {:?} | {} accounts | {} trades",
            summary.scheme_id,
            summary.symbol,
            summary.coordination,
            summary.num_accounts,
            summary.num_trades
        );
        println!(
            "  price: base ${:.2} -> peak ${:.2} -> final ${:.2}",
            summary.base_price, summary.peak_price, summary.final_price
        );
    }
    let total: usize = summaries.iter().map(|s| s.num_trades).sum();
    println!("Trades Appended:    {}", total);
    println!("Output File:        {}", output_file);
    println!("{}", "=".repeat(60));

    if elasticsearch {
        print_elasticsearch_note(&output_file, "trades", "trade_id");
    }

    info!("Pump and dump generation completed successfully");

    Ok(())
}
