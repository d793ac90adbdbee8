//! Baseline trade generation
//!
//! Synthesizes randomized trading activity per account over a configured
//! window. Volume follows the account's risk profile; pricing applies a
//! bid/ask spread, market-order slippage for large orders, and limit-order
//! price improvement.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::config::TradeGenConfig;
use crate::store::{LedgerWriter, WriteMode};
use crate::types::{round2, Account, OrderStatus, OrderType, Trade, TradeType};

const ROUND_LOTS: &[i64] = &[100, 200, 500, 1000];
const QUANTITY_RANGE: (i64, i64) = (10, 2000);
const ROUND_LOT_PROBABILITY: f64 = 0.30;

/// Unique trade ID embedding the execution date for traceability
pub fn generate_trade_id(timestamp: DateTime<Utc>) -> String {
    let unique = Uuid::new_v4().simple().to_string();
    format!("TRD-{}-{}", timestamp.format("%Y%m%d"), &unique[..8])
}

/// Draw a trade type: 45% buy, 40% sell, 10% short, 5% cover
fn draw_trade_type<R: Rng + ?Sized>(rng: &mut R) -> TradeType {
    let r: f64 = rng.gen();
    if r < 0.45 {
        TradeType::Buy
    } else if r < 0.85 {
        TradeType::Sell
    } else if r < 0.95 {
        TradeType::Short
    } else {
        TradeType::Cover
    }
}

/// Draw an order type: 70% market, 25% limit, 5% stop
fn draw_order_type<R: Rng + ?Sized>(rng: &mut R) -> OrderType {
    let r: f64 = rng.gen();
    if r < 0.70 {
        OrderType::Market
    } else if r < 0.95 {
        OrderType::Limit
    } else {
        OrderType::Stop
    }
}

/// Draw a share quantity, clustered on round lots 30% of the time
fn draw_quantity<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen::<f64>() < ROUND_LOT_PROBABILITY {
        *ROUND_LOTS.choose(rng).expect("lot table is non-empty") as f64
    } else {
        rng.gen_range(QUANTITY_RANGE.0..=QUANTITY_RANGE.1) as f64
    }
}

/// Execution price with bid/ask spread, slippage, and price improvement.
///
/// The half-spread always moves against the trader: buyers pay the ask,
/// sellers receive the bid. Large market orders add unidirectional
/// slippage; limit orders get a small favorable improvement.
pub fn execution_price<R: Rng + ?Sized>(
    config: &TradeGenConfig,
    rng: &mut R,
    base_price: f64,
    quantity: f64,
    order_type: OrderType,
    trade_type: TradeType,
) -> f64 {
    let spread = config.bid_ask_spread;
    let buy_side = trade_type.is_buy_side();

    let mut price = if buy_side {
        base_price * (1.0 + spread / 2.0)
    } else {
        base_price * (1.0 - spread / 2.0)
    };

    if quantity > config.large_order_threshold && order_type == OrderType::Market {
        let (slip_min, slip_max) = config.slippage_range;
        let slippage = rng.gen_range(slip_min..slip_max);
        if buy_side {
            price *= 1.0 + slippage;
        } else {
            price *= 1.0 - slippage;
        }
    }

    if order_type == OrderType::Limit {
        let improvement = rng.gen_range(0.0..spread / 4.0);
        if buy_side {
            price *= 1.0 - improvement;
        } else {
            price *= 1.0 + improvement;
        }
    }

    round2(price)
}

/// Generate all trades for a single account, sorted by timestamp
pub fn trades_for_account<R: Rng + ?Sized>(
    config: &TradeGenConfig,
    rng: &mut R,
    account: &Account,
    asset_prices: &HashMap<String, f64>,
    window: (DateTime<Utc>, DateTime<Utc>),
) -> Vec<Trade> {
    let symbols: Vec<&String> = asset_prices.keys().collect();
    if symbols.is_empty() {
        return Vec::new();
    }

    let (min_trades, max_trades) = config.trade_count_range(account.risk_profile);
    let num_trades = rng.gen_range(min_trades..=max_trades);

    let (window_start, window_end) = window;
    let window_seconds = (window_end - window_start).num_seconds();
    let now = Utc::now();

    let mut trades = Vec::with_capacity(num_trades as usize);
    for _ in 0..num_trades {
        let symbol = (*symbols.choose(rng).expect("symbols are non-empty")).clone();
        let base_price = asset_prices[&symbol];
        let trade_type = draw_trade_type(rng);
        let order_type = draw_order_type(rng);
        let quantity = draw_quantity(rng);

        let execution_timestamp =
            window_start + Duration::seconds(rng.gen_range(0..=window_seconds));

        let order_status = if rng.gen::<f64>() < config.cancellation_rate {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Executed
        };

        let (price, cost) = match order_status {
            OrderStatus::Executed => {
                let price =
                    execution_price(config, rng, base_price, quantity, order_type, trade_type);
                (price, round2(quantity * price))
            }
            OrderStatus::Cancelled => (0.0, 0.0),
        };

        trades.push(Trade {
            trade_id: generate_trade_id(execution_timestamp),
            account_id: account.account_id.clone(),
            symbol,
            trade_type,
            order_type,
            order_status,
            quantity,
            execution_price: price,
            trade_cost: cost,
            execution_timestamp,
            last_updated: now,
            scenario_type: None,
            scenario_phase: None,
            scenario_symbol: None,
            wash_ring_id: None,
            pump_scheme_id: None,
            coordination_type: None,
            counterpart_account: None,
            news_announcement_time: None,
        });
    }

    trades.sort_by_key(|t| t.execution_timestamp);
    trades
}

/// Generate the baseline ledger for every account, batch by batch.
///
/// The output file is truncated up front and then written account-major:
/// trades are time-sorted within one account but not across the whole
/// file. A crash mid-run leaves the batches written so far on disk.
pub fn generate_ledger<R: Rng + ?Sized>(
    config: &TradeGenConfig,
    rng: &mut R,
    accounts: &[Account],
    asset_prices: &HashMap<String, f64>,
    output_file: impl AsRef<Path>,
) -> Result<usize> {
    let window = config.window()?;
    info!(
        "Trade window: {} to {}",
        window.0.format("%Y-%m-%d"),
        window.1.format("%Y-%m-%d")
    );
    info!("Batch size: {} accounts", config.batch_size);

    let mut writer = LedgerWriter::open(output_file.as_ref(), WriteMode::Truncate)?;
    let mut total_trades = 0;

    for (batch_no, batch) in accounts.chunks(config.batch_size.max(1)).enumerate() {
        let mut batch_trades = 0;
        for account in batch {
            let trades = trades_for_account(config, rng, account, asset_prices, window);
            batch_trades += writer.write_all(&trades)?;
        }
        writer.flush()?;
        total_trades += batch_trades;
        info!(
            "Batch {}: {} accounts, {} trades",
            batch_no + 1,
            batch.len(),
            batch_trades
        );
    }

    info!(
        "Generated {} trades to {}",
        total_trades,
        output_file.as_ref().display()
    );
    Ok(total_trades)
}
