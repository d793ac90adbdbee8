//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files. Every section
//! carries defaults matching the documented generator parameters, so all
//! commands run without a config file present.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::RiskProfile;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: FilePaths,
    #[serde(default)]
    pub accounts: AccountGenConfig,
    #[serde(default)]
    pub trades: TradeGenConfig,
    #[serde(default)]
    pub wash_trading: WashTradingConfig,
    #[serde(default)]
    pub pump_and_dump: PumpAndDumpConfig,
    #[serde(default)]
    pub insider_trading: InsiderTradingConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Load from an optional path, falling back to defaults when absent
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

/// Locations of the generated JSONL data files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePaths {
    pub accounts: String,
    pub asset_details: String,
    pub trades: String,
    pub holdings: String,
    pub controlled_trades: String,
}

impl Default for FilePaths {
    fn default() -> Self {
        FilePaths {
            accounts: "generated_data/generated_accounts.jsonl".to_string(),
            asset_details: "generated_data/generated_asset_details.jsonl".to_string(),
            trades: "generated_data/generated_trades.jsonl".to_string(),
            holdings: "generated_data/generated_holdings.jsonl".to_string(),
            controlled_trades: "generated_data/generated_controlled_trades.jsonl".to_string(),
        }
    }
}

/// Account-store generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountGenConfig {
    pub num_accounts: usize,
    /// Exponent bounds for portfolio value: 10^min .. 10^max dollars.
    /// A log-uniform spread keeps every portfolio-size scoring tier populated.
    pub portfolio_value_exponent_range: (f64, f64),
}

impl Default for AccountGenConfig {
    fn default() -> Self {
        AccountGenConfig {
            num_accounts: 1000,
            portfolio_value_exponent_range: (4.5, 7.5),
        }
    }
}

/// Baseline trade-generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeGenConfig {
    /// Inclusive date bounds of the trading window (YYYY-MM-DD)
    pub time_window_start: String,
    pub time_window_end: String,
    /// Accounts processed per output batch
    pub batch_size: usize,
    /// Full bid/ask spread as a fraction of base price
    pub bid_ask_spread: f64,
    /// Orders above this share count attract market-order slippage
    pub large_order_threshold: f64,
    pub slippage_range: (f64, f64),
    pub cancellation_rate: f64,
    /// Trade-count band per risk profile
    pub risk_trade_volumes: HashMap<RiskProfile, (u32, u32)>,
}

impl Default for TradeGenConfig {
    fn default() -> Self {
        let mut risk_trade_volumes = HashMap::new();
        risk_trade_volumes.insert(RiskProfile::Conservative, (5, 15));
        risk_trade_volumes.insert(RiskProfile::VeryLow, (5, 15));
        risk_trade_volumes.insert(RiskProfile::Low, (5, 15));
        risk_trade_volumes.insert(RiskProfile::Medium, (15, 50));
        risk_trade_volumes.insert(RiskProfile::Moderate, (15, 50));
        risk_trade_volumes.insert(RiskProfile::Growth, (50, 150));
        risk_trade_volumes.insert(RiskProfile::High, (50, 150));
        risk_trade_volumes.insert(RiskProfile::VeryHigh, (50, 150));

        TradeGenConfig {
            time_window_start: "2025-06-01".to_string(),
            time_window_end: "2025-08-28".to_string(),
            batch_size: 1000,
            bid_ask_spread: 0.005,
            large_order_threshold: 1000.0,
            slippage_range: (0.001, 0.003),
            cancellation_rate: 0.07,
            risk_trade_volumes,
        }
    }
}

impl TradeGenConfig {
    /// Trade-count band for a profile, with the Medium band as fallback
    pub fn trade_count_range(&self, profile: RiskProfile) -> (u32, u32) {
        self.risk_trade_volumes
            .get(&profile)
            .copied()
            .unwrap_or((15, 50))
    }

    /// Parse the configured window into UTC datetime bounds
    pub fn window(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = parse_day(&self.time_window_start)
            .context("Invalid trades.time_window_start date")?;
        let end =
            parse_day(&self.time_window_end).context("Invalid trades.time_window_end date")?;
        if end <= start {
            anyhow::bail!(
                "Trade window end ({}) must be after start ({})",
                self.time_window_end,
                self.time_window_start
            );
        }
        Ok((start, end))
    }
}

fn parse_day(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight timestamp")?;
    Ok(midnight.and_utc())
}

/// Wash-trading ring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WashTradingConfig {
    pub accounts_per_ring: (usize, usize),
    pub trades_per_session: (u32, u32),
    pub session_duration_hours: (i64, i64),
    /// Fractional spread around the base price; kept minimal so wash pairs
    /// carry no real economic gain or loss
    pub price_spread: (f64, f64),
    pub cancellation_rate: f64,
    pub volume_per_trade: (i64, i64),
    pub sessions_per_scenario: (u32, u32),
    pub time_between_sessions_hours: (i64, i64),
    pub symbols_per_scenario: (usize, usize),
}

impl Default for WashTradingConfig {
    fn default() -> Self {
        WashTradingConfig {
            accounts_per_ring: (2, 4),
            trades_per_session: (20, 60),
            session_duration_hours: (2, 8),
            price_spread: (0.001, 0.003),
            cancellation_rate: 0.20,
            volume_per_trade: (100, 2000),
            sessions_per_scenario: (1, 3),
            time_between_sessions_hours: (1, 48),
            symbols_per_scenario: (1, 2),
        }
    }
}

/// Pump-and-dump scheme settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpAndDumpConfig {
    pub accounts_per_scheme: (usize, usize),
    pub accumulation_days: (u32, u32),
    pub pump_duration_hours: (u32, u32),
    pub dump_duration_hours: (u32, u32),
    /// Target fractional gain over the accumulation-end price
    pub price_pump_target: (f64, f64),
    /// Fractional crash from the pump peak
    pub price_dump_impact: (f64, f64),
    pub accumulation_volume_multiplier: (f64, f64),
    pub pump_volume_multiplier: (f64, f64),
    pub dump_volume_multiplier: (f64, f64),
    /// Coordination-type draw weights (tight, loose, mixed)
    pub coordination_weights: (f64, f64, f64),
    pub cancellation_rate: f64,
}

impl Default for PumpAndDumpConfig {
    fn default() -> Self {
        PumpAndDumpConfig {
            accounts_per_scheme: (8, 20),
            accumulation_days: (5, 10),
            pump_duration_hours: (2, 6),
            dump_duration_hours: (1, 3),
            price_pump_target: (0.15, 0.40),
            price_dump_impact: (0.25, 0.50),
            accumulation_volume_multiplier: (2.0, 4.0),
            pump_volume_multiplier: (8.0, 20.0),
            dump_volume_multiplier: (15.0, 35.0),
            coordination_weights: (0.4, 0.4, 0.2),
            cancellation_rate: 0.05,
        }
    }
}

/// Insider-trading timeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsiderTradingConfig {
    pub accounts_per_scenario: (usize, usize),
    pub pre_announcement_hours: (i64, i64),
    /// Volume increase over the account's normal activity
    pub volume_multiplier: (f64, f64),
    /// Price movement attributable to insider accumulation (5-15%)
    pub price_impact: (f64, f64),
    pub profit_taking_delay_hours: (i64, i64),
}

impl Default for InsiderTradingConfig {
    fn default() -> Self {
        InsiderTradingConfig {
            accounts_per_scenario: (5, 15),
            pre_announcement_hours: (12, 48),
            volume_multiplier: (3.0, 8.0),
            price_impact: (0.05, 0.15),
            profit_taking_delay_hours: (1, 6),
        }
    }
}
