//! Asset reference-data command implementation

use anyhow::Result;
use market_synth::{assets, Config};
use tracing::info;

pub fn run(config_path: Option<String>, output_override: Option<String>) -> Result<()> {
    info!("Starting asset detail generation");

    let config = Config::load(config_path.as_deref())?;
    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path);
    }

    let output_file = output_override.unwrap_or_else(|| config.paths.asset_details.clone());
    let mut rng = rand::thread_rng();

    let count = assets::generate_asset_details(&output_file, &mut rng)?;

    println!("\n{}", "=".repeat(60));
    println!("ASSET GENERATION RESULTS");
    println!("{}", "=".repeat(60));
    println!("Assets Written:     {}", count);
    println!("Output File:        {}", output_file);
    println!("{}", "=".repeat(60));

    info!("Asset detail generation completed successfully");

    Ok(())
}
