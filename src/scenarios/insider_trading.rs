//! Insider-trading timeline generation
//!
//! Unusual accumulation in the hours before a news announcement, rising in
//! intensity as the announcement approaches, then profit-taking sells at
//! the post-announcement price. Every trade carries the announcement time
//! so detection queries can anchor on it.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::config::InsiderTradingConfig;
use crate::scenarios::{id_suffix, sort_by_timestamp};
use crate::store::{load_accounts, LedgerWriter, WriteMode};
use crate::types::{
    round2, Account, OrderStatus, OrderType, RiskProfile, ScenarioPhase, ScenarioType, Trade,
    TradeType,
};

/// Pre-announcement phase windows as fractions of the accumulation window,
/// with the share of each account's trades and a volume intensity that
/// ramps up toward the announcement.
struct PhaseWindow {
    phase: ScenarioPhase,
    window: (f64, f64),
    trade_share: f64,
    intensity: f64,
}

const PHASE_WINDOWS: [PhaseWindow; 3] = [
    PhaseWindow {
        phase: ScenarioPhase::Accumulation,
        window: (0.0, 0.6),
        trade_share: 0.6,
        intensity: 0.7,
    },
    PhaseWindow {
        phase: ScenarioPhase::Acceleration,
        window: (0.6, 0.9),
        trade_share: 0.3,
        intensity: 1.2,
    },
    PhaseWindow {
        phase: ScenarioPhase::FinalPush,
        window: (0.9, 1.0),
        trade_share: 0.1,
        intensity: 1.8,
    },
];

/// Target share of insiders per risk profile. Insiders skew toward
/// aggressive accounts but the cohort is never uniform.
const PROFILE_WEIGHTS: [(RiskProfile, f64); 4] = [
    (RiskProfile::High, 0.4),
    (RiskProfile::VeryHigh, 0.3),
    (RiskProfile::Growth, 0.2),
    (RiskProfile::Medium, 0.1),
];

/// Select the insider cohort: fill profile buckets by weight, then top up
/// from the remaining accounts when a bucket runs short
pub fn select_insider_accounts<R: Rng + ?Sized>(
    accounts: &[Account],
    num_accounts: usize,
    rng: &mut R,
) -> Vec<Account> {
    let mut selected: Vec<Account> = Vec::with_capacity(num_accounts);

    for (profile, weight) in PROFILE_WEIGHTS {
        let target = ((num_accounts as f64) * weight).round() as usize;
        let bucket: Vec<&Account> = accounts
            .iter()
            .filter(|a| a.risk_profile == profile)
            .collect();
        selected.extend(
            bucket
                .choose_multiple(rng, target.min(bucket.len()))
                .map(|a| (*a).clone()),
        );
    }

    if selected.len() < num_accounts {
        let remaining: Vec<&Account> = accounts
            .iter()
            .filter(|a| !selected.iter().any(|s| s.account_id == a.account_id))
            .collect();
        let shortfall = num_accounts - selected.len();
        selected.extend(
            remaining
                .choose_multiple(rng, shortfall.min(remaining.len()))
                .map(|a| (*a).clone()),
        );
    }

    selected.truncate(num_accounts);
    selected
}

/// Hourly prices across the accumulation window: a drift up to the full
/// price impact at announcement time. Early dips are clamped so the run-up
/// never starts with a visible decline.
pub fn price_timeline<R: Rng + ?Sized>(
    rng: &mut R,
    base_price: f64,
    price_impact: f64,
    window_hours: i64,
) -> Vec<f64> {
    (0..=window_hours)
        .map(|hour| {
            let progress = hour as f64 / window_hours as f64;
            let mut movement = price_impact * progress + rng.gen_range(-0.02..0.02);
            if progress < 0.3 {
                movement = movement.max(-0.01);
            }
            round2(base_price * (1.0 + movement))
        })
        .collect()
}

/// Price at the first hourly point at or after the trade offset
fn price_at(timeline: &[f64], offset_seconds: i64) -> f64 {
    let hour = (offset_seconds as f64 / 3600.0).ceil() as usize;
    timeline[hour.min(timeline.len() - 1)]
}

#[allow(clippy::too_many_arguments)]
fn insider_trade(
    account: &Account,
    symbol: &str,
    trade_type: TradeType,
    order_type: OrderType,
    quantity: f64,
    price: f64,
    trade_time: DateTime<Utc>,
    phase: ScenarioPhase,
    announcement: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Trade {
    let price = round2(price);
    Trade {
        trade_id: format!("INSIDER-{}-{}", id_suffix(), trade_time.timestamp()),
        account_id: account.account_id.clone(),
        symbol: symbol.to_string(),
        trade_type,
        order_type,
        order_status: OrderStatus::Executed,
        quantity,
        execution_price: price,
        trade_cost: round2(quantity * price),
        execution_timestamp: trade_time,
        last_updated: now,
        scenario_type: Some(ScenarioType::InsiderTrading),
        scenario_phase: Some(phase),
        scenario_symbol: Some(symbol.to_string()),
        wash_ring_id: None,
        pump_scheme_id: None,
        coordination_type: None,
        counterpart_account: None,
        news_announcement_time: Some(announcement),
    }
}

/// Generate one insider-trading scenario: pre-announcement accumulation by
/// a risk-skewed cohort, then post-announcement profit taking
pub fn generate_scenario<R: Rng + ?Sized>(
    config: &InsiderTradingConfig,
    rng: &mut R,
    accounts: &[Account],
    asset_prices: &HashMap<String, f64>,
) -> Vec<Trade> {
    let num_accounts =
        rng.gen_range(config.accounts_per_scenario.0..=config.accounts_per_scenario.1);
    let insiders = select_insider_accounts(accounts, num_accounts, rng);

    let symbols: Vec<&String> = asset_prices.keys().collect();
    let symbol = (*symbols.choose(rng).expect("asset price map is non-empty")).clone();
    let base_price = asset_prices[&symbol];

    let window_hours =
        rng.gen_range(config.pre_announcement_hours.0..=config.pre_announcement_hours.1);
    let price_impact = rng.gen_range(config.price_impact.0..config.price_impact.1);
    let volume_multiplier =
        rng.gen_range(config.volume_multiplier.0..config.volume_multiplier.1);

    let now = Utc::now();
    let announcement = now - Duration::days(rng.gen_range(1..=7));
    let window_start = announcement - Duration::hours(window_hours);
    let timeline = price_timeline(rng, base_price, price_impact, window_hours);

    info!(
        "Insider scenario: {} on ${:.2}, {} insiders, {}h window, {:.1}% impact",
        symbol,
        base_price,
        insiders.len(),
        window_hours,
        price_impact * 100.0
    );

    let mut trades = Vec::new();

    for account in &insiders {
        let base_trades = rng.gen_range(3..=12) as f64;
        let total = (base_trades
            * account.risk_profile.aggression_multiplier()
            * volume_multiplier)
            .round()
            .max(1.0) as u32;
        let base_quantity = (account.total_portfolio_value * 0.0001).max(100.0);

        let mut remaining = total;
        for (i, phase) in PHASE_WINDOWS.iter().enumerate() {
            let count = if i + 1 == PHASE_WINDOWS.len() {
                remaining
            } else {
                ((f64::from(total) * phase.trade_share).floor() as u32).min(remaining)
            };
            remaining -= count;

            let window_seconds = window_hours * 3600;
            let lo = (phase.window.0 * window_seconds as f64) as i64;
            let hi = (phase.window.1 * window_seconds as f64) as i64;

            for _ in 0..count {
                let offset = rng.gen_range(lo..hi.max(lo + 1));
                let trade_time = window_start + Duration::seconds(offset);

                let trade_type = if rng.gen::<f64>() < 0.95 {
                    TradeType::Buy
                } else {
                    TradeType::Sell
                };
                let order_type = if rng.gen::<f64>() < 0.70 {
                    OrderType::Market
                } else {
                    OrderType::Limit
                };
                let quantity =
                    (base_quantity * phase.intensity * rng.gen_range(0.5..1.5)).round();
                let price = price_at(&timeline, offset);

                trades.push(insider_trade(
                    account,
                    &symbol,
                    trade_type,
                    order_type,
                    quantity,
                    price,
                    trade_time,
                    phase.phase,
                    announcement,
                    now,
                ));
            }
        }

        // Profit taking after the news lands: unload at the elevated price
        let delay = rng.gen_range(
            config.profit_taking_delay_hours.0..=config.profit_taking_delay_hours.1,
        );
        let sell_start = announcement + Duration::hours(delay);
        let num_sells = rng.gen_range(2..=6);

        for _ in 0..num_sells {
            let trade_time = sell_start + Duration::seconds(rng.gen_range(0..3600));
            let order_type = if rng.gen::<f64>() < 0.80 {
                OrderType::Market
            } else {
                OrderType::Limit
            };
            let price = base_price * (1.0 + price_impact + rng.gen_range(0.02..0.08));
            let quantity = (base_quantity * rng.gen_range(2.0..5.0)).round();

            trades.push(insider_trade(
                account,
                &symbol,
                TradeType::Sell,
                order_type,
                quantity,
                price,
                trade_time,
                ScenarioPhase::ProfitTaking,
                announcement,
                now,
            ));
        }
    }

    sort_by_timestamp(&mut trades);
    trades
}

/// Generate `num_scenarios` scenarios and append them to the shared
/// controlled-trades file
pub fn generate_scenarios<R: Rng + ?Sized>(
    config: &InsiderTradingConfig,
    rng: &mut R,
    accounts_file: impl AsRef<Path>,
    asset_prices: &HashMap<String, f64>,
    num_scenarios: usize,
    output_file: impl AsRef<Path>,
) -> Result<usize> {
    info!("Starting insider trading scenario generation");
    let accounts = load_accounts(accounts_file)?;

    let mut writer = LedgerWriter::open(output_file.as_ref(), WriteMode::Append)?;
    let mut total = 0;

    for i in 0..num_scenarios {
        info!(
            "Generating insider trading scenario {}/{}",
            i + 1,
            num_scenarios
        );
        let trades = generate_scenario(config, rng, &accounts, asset_prices);
        total += writer.write_all(&trades)?;
    }

    writer.flush()?;
    info!(
        "Appended {} insider trades across {} scenarios to {}",
        total,
        num_scenarios,
        output_file.as_ref().display()
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn account(id: &str, risk_profile: RiskProfile) -> Account {
        Account {
            account_id: id.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            account_holder_name: String::new(),
            state: "NY".to_string(),
            account_type: "Growth".to_string(),
            risk_profile,
            contact_preference: "email".to_string(),
            total_portfolio_value: 3_000_000.0,
            last_updated: Utc::now(),
        }
    }

    fn mixed_accounts() -> Vec<Account> {
        let mut accounts = Vec::new();
        for (i, profile) in RiskProfile::ALL.iter().cycle().take(80).enumerate() {
            accounts.push(account(&format!("ACC{:06}", i + 1), *profile));
        }
        accounts
    }

    fn prices() -> HashMap<String, f64> {
        let mut map = HashMap::new();
        map.insert("NEWS".to_string(), 50.0);
        map
    }

    #[test]
    fn test_cohort_skews_aggressive() {
        let mut rng = StdRng::seed_from_u64(41);
        let cohort = select_insider_accounts(&mixed_accounts(), 10, &mut rng);
        assert_eq!(cohort.len(), 10);

        let aggressive = cohort
            .iter()
            .filter(|a| {
                matches!(
                    a.risk_profile,
                    RiskProfile::High | RiskProfile::VeryHigh | RiskProfile::Growth
                )
            })
            .count();
        assert!(aggressive >= 7, "only {} aggressive insiders", aggressive);
    }

    #[test]
    fn test_cohort_fills_when_buckets_short() {
        // No aggressive accounts at all; cohort still reaches the target size
        let accounts: Vec<Account> = (0..20)
            .map(|i| account(&format!("ACC{:06}", i + 1), RiskProfile::Conservative))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let cohort = select_insider_accounts(&accounts, 8, &mut rng);
        assert_eq!(cohort.len(), 8);
    }

    #[test]
    fn test_timeline_ends_near_full_impact() {
        let mut rng = StdRng::seed_from_u64(43);
        let timeline = price_timeline(&mut rng, 100.0, 0.10, 24);
        assert_eq!(timeline.len(), 25);

        let last = *timeline.last().unwrap();
        assert!(last > 107.0 && last < 113.0, "final price {}", last);
    }

    #[test]
    fn test_timeline_clamps_early_dips() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let timeline = price_timeline(&mut rng, 100.0, 0.05, 40);
            for (hour, price) in timeline.iter().enumerate() {
                if (hour as f64 / 40.0) < 0.3 {
                    assert!(*price >= 99.0, "hour {}: price {} dipped", hour, price);
                }
            }
        }
    }

    #[test]
    fn test_every_trade_anchored_to_announcement() {
        let config = InsiderTradingConfig::default();
        let mut rng = StdRng::seed_from_u64(44);
        let trades = generate_scenario(&config, &mut rng, &mixed_accounts(), &prices());

        assert!(!trades.is_empty());
        let announcement = trades[0].news_announcement_time.unwrap();
        for trade in &trades {
            assert_eq!(trade.scenario_type, Some(ScenarioType::InsiderTrading));
            assert_eq!(trade.news_announcement_time, Some(announcement));
            assert_eq!(trade.scenario_symbol.as_deref(), Some("NEWS"));
            assert!(trade.order_status.is_executed());
            assert!(trade.is_valid(), "invalid trade {}", trade.trade_id);
        }
    }

    #[test]
    fn test_profit_taking_follows_announcement() {
        let config = InsiderTradingConfig::default();
        let mut rng = StdRng::seed_from_u64(45);
        let trades = generate_scenario(&config, &mut rng, &mixed_accounts(), &prices());

        let announcement = trades[0].news_announcement_time.unwrap();
        for trade in &trades {
            match trade.scenario_phase.unwrap() {
                ScenarioPhase::ProfitTaking => {
                    assert_eq!(trade.trade_type, TradeType::Sell);
                    assert!(trade.execution_timestamp > announcement);
                    // Sells land above the fully impacted price
                    assert!(trade.execution_price > 50.0 * 1.05);
                }
                _ => {
                    assert!(trade.execution_timestamp <= announcement);
                }
            }
        }
    }

    #[test]
    fn test_accumulation_is_buy_heavy() {
        let config = InsiderTradingConfig::default();
        let mut rng = StdRng::seed_from_u64(46);
        let trades = generate_scenario(&config, &mut rng, &mixed_accounts(), &prices());

        let pre: Vec<_> = trades
            .iter()
            .filter(|t| t.scenario_phase != Some(ScenarioPhase::ProfitTaking))
            .collect();
        let buys = pre.iter().filter(|t| t.trade_type == TradeType::Buy).count();
        assert!(
            buys as f64 > pre.len() as f64 * 0.85,
            "{} buys of {}",
            buys,
            pre.len()
        );
    }
}
