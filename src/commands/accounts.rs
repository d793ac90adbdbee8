//! Account generation command implementation

use anyhow::Result;
use market_synth::{accounts, Config};
use tracing::info;

pub fn run(
    config_path: Option<String>,
    num_accounts_override: Option<usize>,
    output_override: Option<String>,
) -> Result<()> {
    info!("Starting account generation");

    let mut config = Config::load(config_path.as_deref())?;
    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path);
    }

    if let Some(num_accounts) = num_accounts_override {
        info!("Overriding account count to: {}", num_accounts);
        config.accounts.num_accounts = num_accounts;
    }

    let output_file = output_override.unwrap_or_else(|| config.paths.accounts.clone());
    let mut rng = rand::thread_rng();

    let count = accounts::generate_account_store(&config.accounts, &output_file, &mut rng)?;

    println!("\n{}", "=".repeat(60));
    println!("ACCOUNT GENERATION RESULTS");
    println!("{}", "=".repeat(60));
    println!("Accounts Written:   {}", count);
    println!("Output File:        {}", output_file);
    println!("{}", "=".repeat(60));

    info!("Account generation completed successfully");

    Ok(())
}
