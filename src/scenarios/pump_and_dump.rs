//! Pump-and-dump scheme generation
//!
//! Three-phase price manipulation: quiet accumulation over days, an
//! aggressive hourly pump, then a coordinated dump that crashes the price
//! below its pre-pump level. Trade volume and buy/sell mix shift per phase.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::config::PumpAndDumpConfig;
use crate::scenarios::{id_suffix, select_scored_accounts, sort_by_timestamp};
use crate::store::{load_accounts, LedgerWriter, WriteMode};
use crate::types::{
    round2, Account, CoordinationType, OrderStatus, OrderType, ScenarioPhase, ScenarioType,
    Trade, TradeType,
};

/// Banner-level facts about one generated scheme
#[derive(Debug, Clone)]
pub struct SchemeSummary {
    pub scheme_id: String,
    pub symbol: String,
    pub coordination: CoordinationType,
    pub num_accounts: usize,
    pub base_price: f64,
    pub peak_price: f64,
    pub final_price: f64,
    pub num_trades: usize,
}

/// Per-phase trade-shape parameters
struct PhaseShape {
    phase: ScenarioPhase,
    tag: &'static str,
    trades_per_account: (u32, u32),
    buy_probability: f64,
    market_order_probability: f64,
    quantity_multiplier: f64,
}

const ACCUMULATION_SHAPE: PhaseShape = PhaseShape {
    phase: ScenarioPhase::Accumulation,
    tag: "ACCUM",
    trades_per_account: (1, 3),
    buy_probability: 0.85,
    market_order_probability: 0.30,
    quantity_multiplier: 1.0,
};

const PUMP_SHAPE: PhaseShape = PhaseShape {
    phase: ScenarioPhase::Pump,
    tag: "PUMP",
    trades_per_account: (2, 6),
    buy_probability: 0.95,
    market_order_probability: 0.80,
    quantity_multiplier: 2.0,
};

const DUMP_SHAPE: PhaseShape = PhaseShape {
    phase: ScenarioPhase::Dump,
    tag: "DUMP",
    trades_per_account: (3, 8),
    buy_probability: 0.05,
    market_order_probability: 0.90,
    quantity_multiplier: 3.0,
};

fn draw_coordination<R: Rng + ?Sized>(
    weights: (f64, f64, f64),
    rng: &mut R,
) -> CoordinationType {
    let total = weights.0 + weights.1 + weights.2;
    let x = rng.gen::<f64>() * total;
    if x < weights.0 {
        CoordinationType::Tight
    } else if x < weights.0 + weights.1 {
        CoordinationType::Loose
    } else {
        CoordinationType::Mixed
    }
}

/// Fraction of scheme accounts active in a single time bucket
fn participation_fraction<R: Rng + ?Sized>(
    coordination: CoordinationType,
    rng: &mut R,
) -> f64 {
    match coordination {
        CoordinationType::Tight => rng.gen_range(0.7..0.9),
        CoordinationType::Loose => rng.gen_range(0.3..0.6),
        CoordinationType::Mixed => rng.gen_range(0.4..0.8),
    }
}

/// Daily accumulation price points: a slow 5% drift off the base price
/// with light noise. The slow creep is what a detection query should see
/// before the pump.
pub fn accumulation_path<R: Rng + ?Sized>(
    rng: &mut R,
    base_price: f64,
    days: u32,
    start: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, f64)> {
    (0..days)
        .map(|day| {
            let progress = f64::from(day) / f64::from(days);
            let noise = rng.gen_range(-0.01..0.01);
            let price = base_price * (1.0 + 0.05 * progress) * (1.0 + noise);
            (start + Duration::days(i64::from(day)), round2(price))
        })
        .collect()
}

/// Hourly pump price points: a concave climb toward the target gain.
/// Progress runs to 1.0 inclusive so the final bucket reaches the target.
pub fn pump_path<R: Rng + ?Sized>(
    rng: &mut R,
    accumulation_end_price: f64,
    pump_target: f64,
    hours: u32,
    start: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, f64)> {
    (0..hours)
        .map(|hour| {
            let progress = f64::from(hour + 1) / f64::from(hours);
            let noise = rng.gen_range(-0.02..0.03);
            let price =
                accumulation_end_price * (1.0 + pump_target * progress.powf(0.7)) * (1.0 + noise);
            (start + Duration::hours(i64::from(hour)), round2(price))
        })
        .collect()
}

/// Hourly dump price points: a convex crash off the peak, floored at half
/// the original base price. The full impact lands in the last bucket, so
/// the dump always ends below the peak.
pub fn dump_path<R: Rng + ?Sized>(
    rng: &mut R,
    peak_price: f64,
    base_price: f64,
    dump_impact: f64,
    hours: u32,
    start: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, f64)> {
    (0..hours)
        .map(|hour| {
            let progress = f64::from(hour + 1) / f64::from(hours);
            let noise = rng.gen_range(-0.05..0.02);
            let price = peak_price * (1.0 - dump_impact * progress.sqrt()) * (1.0 + noise);
            (
                start + Duration::hours(i64::from(hour)),
                round2(price.max(base_price * 0.5)),
            )
        })
        .collect()
}

/// Generate the trades for one phase across its time buckets
#[allow(clippy::too_many_arguments)]
fn phase_trades<R: Rng + ?Sized>(
    config: &PumpAndDumpConfig,
    rng: &mut R,
    shape: &PhaseShape,
    volume_multiplier_range: (f64, f64),
    buckets: &[(DateTime<Utc>, f64)],
    accounts: &[Account],
    symbol: &str,
    scheme_id: &str,
    coordination: CoordinationType,
) -> Vec<Trade> {
    let now = Utc::now();
    let mut trades = Vec::new();

    for (bucket_time, bucket_price) in buckets {
        let fraction = participation_fraction(coordination, rng);
        let active = ((accounts.len() as f64 * fraction).round() as usize).max(1);
        let participants: Vec<&Account> = accounts
            .choose_multiple(rng, active.min(accounts.len()))
            .collect();

        for account in participants {
            let num_trades =
                rng.gen_range(shape.trades_per_account.0..=shape.trades_per_account.1);
            for _ in 0..num_trades {
                let jitter = Duration::seconds(rng.gen_range(-1800..=1800));
                let trade_time = *bucket_time + jitter;

                let trade_type = if rng.gen::<f64>() < shape.buy_probability {
                    TradeType::Buy
                } else {
                    TradeType::Sell
                };
                let order_type = if rng.gen::<f64>() < shape.market_order_probability {
                    OrderType::Market
                } else {
                    OrderType::Limit
                };

                let volume_multiplier =
                    rng.gen_range(volume_multiplier_range.0..volume_multiplier_range.1);
                let base_quantity = (account.total_portfolio_value * 0.0002).max(100.0);
                let quantity =
                    (base_quantity * shape.quantity_multiplier * volume_multiplier).round();

                let status = if rng.gen::<f64>() < config.cancellation_rate {
                    OrderStatus::Cancelled
                } else {
                    OrderStatus::Executed
                };

                let price = bucket_price * (1.0 + rng.gen_range(-0.005..0.005));
                let (price, cost) = match status {
                    OrderStatus::Executed => (round2(price), round2(quantity * round2(price))),
                    OrderStatus::Cancelled => (0.0, 0.0),
                };

                trades.push(Trade {
                    trade_id: format!(
                        "PUMP-{}-{}-{}",
                        shape.tag,
                        id_suffix(),
                        trade_time.timestamp()
                    ),
                    account_id: account.account_id.clone(),
                    symbol: symbol.to_string(),
                    trade_type,
                    order_type,
                    order_status: status,
                    quantity,
                    execution_price: price,
                    trade_cost: cost,
                    execution_timestamp: trade_time,
                    last_updated: now,
                    scenario_type: Some(ScenarioType::PumpAndDump),
                    scenario_phase: Some(shape.phase),
                    scenario_symbol: Some(symbol.to_string()),
                    wash_ring_id: None,
                    pump_scheme_id: Some(scheme_id.to_string()),
                    coordination_type: Some(coordination),
                    counterpart_account: None,
                    news_announcement_time: None,
                });
            }
        }
    }

    trades
}

/// Generate one complete pump-and-dump scheme against a single symbol
pub fn generate_scheme<R: Rng + ?Sized>(
    config: &PumpAndDumpConfig,
    rng: &mut R,
    accounts: &[Account],
    asset_prices: &HashMap<String, f64>,
) -> (Vec<Trade>, SchemeSummary) {
    let num_accounts =
        rng.gen_range(config.accounts_per_scheme.0..=config.accounts_per_scheme.1);
    let scheme_accounts = select_scored_accounts(accounts, num_accounts, rng);
    let coordination = draw_coordination(config.coordination_weights, rng);
    let scheme_id = format!("SCHEME-{}", id_suffix());

    let symbols: Vec<&String> = asset_prices.keys().collect();
    let symbol = (*symbols.choose(rng).expect("asset price map is non-empty")).clone();
    let base_price = asset_prices[&symbol];

    let accumulation_days =
        rng.gen_range(config.accumulation_days.0..=config.accumulation_days.1);
    let pump_hours =
        rng.gen_range(config.pump_duration_hours.0..=config.pump_duration_hours.1);
    let dump_hours =
        rng.gen_range(config.dump_duration_hours.0..=config.dump_duration_hours.1);
    let pump_target = rng.gen_range(config.price_pump_target.0..config.price_pump_target.1);
    let dump_impact = rng.gen_range(config.price_dump_impact.0..config.price_dump_impact.1);

    let now = Utc::now();
    let accumulation_start = now - Duration::days(i64::from(accumulation_days) + 2);
    let pump_start = now - Duration::days(2);
    let dump_start = pump_start + Duration::hours(i64::from(pump_hours));

    let accumulation =
        accumulation_path(rng, base_price, accumulation_days, accumulation_start);
    let accumulation_end_price = accumulation
        .last()
        .map(|(_, price)| *price)
        .unwrap_or(base_price);
    let pump = pump_path(rng, accumulation_end_price, pump_target, pump_hours, pump_start);
    let peak_price = pump
        .iter()
        .map(|(_, price)| *price)
        .fold(accumulation_end_price, f64::max);
    let dump = dump_path(rng, peak_price, base_price, dump_impact, dump_hours, dump_start);
    let final_price = dump.last().map(|(_, price)| *price).unwrap_or(peak_price);

    info!(
        "Scheme {}: {} on {}, {:?} coordination, {} accum days, {}h pump, {}h dump",
        scheme_id,
        symbol,
        base_price,
        coordination,
        accumulation_days,
        pump_hours,
        dump_hours
    );

    let mut trades = Vec::new();
    trades.extend(phase_trades(
        config,
        rng,
        &ACCUMULATION_SHAPE,
        config.accumulation_volume_multiplier,
        &accumulation,
        &scheme_accounts,
        &symbol,
        &scheme_id,
        coordination,
    ));
    trades.extend(phase_trades(
        config,
        rng,
        &PUMP_SHAPE,
        config.pump_volume_multiplier,
        &pump,
        &scheme_accounts,
        &symbol,
        &scheme_id,
        coordination,
    ));
    trades.extend(phase_trades(
        config,
        rng,
        &DUMP_SHAPE,
        config.dump_volume_multiplier,
        &dump,
        &scheme_accounts,
        &symbol,
        &scheme_id,
        coordination,
    ));

    sort_by_timestamp(&mut trades);

    let summary = SchemeSummary {
        scheme_id,
        symbol,
        coordination,
        num_accounts: scheme_accounts.len(),
        base_price,
        peak_price,
        final_price,
        num_trades: trades.len(),
    };
    (trades, summary)
}

/// Generate `num_scenarios` schemes and append them to the shared
/// controlled-trades file
pub fn generate_scenarios<R: Rng + ?Sized>(
    config: &PumpAndDumpConfig,
    rng: &mut R,
    accounts_file: impl AsRef<Path>,
    asset_prices: &HashMap<String, f64>,
    num_scenarios: usize,
    output_file: impl AsRef<Path>,
) -> Result<Vec<SchemeSummary>> {
    info!("Starting pump and dump scheme generation");
    let accounts = load_accounts(accounts_file)?;

    let mut writer = LedgerWriter::open(output_file.as_ref(), WriteMode::Append)?;
    let mut summaries = Vec::with_capacity(num_scenarios);

    for i in 0..num_scenarios {
        info!("Generating pump and dump scheme {}/{}", i + 1, num_scenarios);
        let (trades, summary) = generate_scheme(config, rng, &accounts, asset_prices);
        writer.write_all(&trades)?;
        info!(
            "Scheme {}: {} trades, base ${:.2} -> peak ${:.2} -> final ${:.2}",
            summary.scheme_id,
            summary.num_trades,
            summary.base_price,
            summary.peak_price,
            summary.final_price
        );
        summaries.push(summary);
    }

    writer.flush()?;
    let total: usize = summaries.iter().map(|s| s.num_trades).sum();
    info!(
        "Appended {} pump and dump trades across {} schemes to {}",
        total,
        num_scenarios,
        output_file.as_ref().display()
    );
    Ok(summaries)
}
