//! Position reconciliation
//!
//! Single-pass streaming aggregation of the trade ledger into net holdings.
//! Memory use is proportional to the number of distinct (account, symbol)
//! pairs, never to the number of trades.
//!
//! Net position = Σ(buys) + Σ(covers) − Σ(sells) − Σ(shorts), executed
//! trades only.

use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::store::{LedgerReader, LedgerWriter, WriteMode};
use crate::types::{round4, Holding, Trade};

/// Positions below this absolute quantity are rounding noise and dropped
pub const MIN_POSITION_QUANTITY: f64 = 0.01;

/// Positions above this absolute share count are flagged as probable
/// data anomalies
pub const EXTREME_POSITION_THRESHOLD: f64 = 100_000.0;

const PROGRESS_INTERVAL: usize = 10_000;

pub type PositionKey = (String, String);

/// Counters reported at the end of an aggregation pass
#[derive(Debug, Default, Clone, Copy)]
pub struct AggregateStats {
    pub executed: usize,
    pub cancelled: usize,
    pub malformed: usize,
}

/// Fold a stream of ledger records into net positions per (account, symbol).
///
/// Cancelled trades never touch the accumulator. Malformed lines are
/// logged with their line number and skipped.
pub fn aggregate_positions<I>(records: I) -> (HashMap<PositionKey, f64>, AggregateStats)
where
    I: IntoIterator<Item = (usize, Result<Trade>)>,
{
    let mut positions: HashMap<PositionKey, f64> = HashMap::new();
    let mut stats = AggregateStats::default();

    for (line_no, record) in records {
        let trade = match record {
            Ok(trade) => trade,
            Err(err) => {
                warn!("Skipping malformed trade at line {}: {}", line_no, err);
                stats.malformed += 1;
                continue;
            }
        };

        if !trade.order_status.is_executed() {
            stats.cancelled += 1;
            continue;
        }

        let delta = trade.trade_type.position_sign() * trade.quantity;
        *positions
            .entry((trade.account_id, trade.symbol))
            .or_insert(0.0) += delta;

        stats.executed += 1;
        if stats.executed % PROGRESS_INTERVAL == 0 {
            info!("  Processed {} trades...", stats.executed);
        }
    }

    info!(
        "Processed {} executed trades ({} cancelled, {} malformed)",
        stats.executed, stats.cancelled, stats.malformed
    );
    (positions, stats)
}

/// Drop near-zero positions and round survivors to 4 decimal places.
/// Returns the filtered map and the number of entries removed.
pub fn filter_positions(
    positions: HashMap<PositionKey, f64>,
) -> (HashMap<PositionKey, f64>, usize) {
    let before = positions.len();
    let filtered: HashMap<PositionKey, f64> = positions
        .into_iter()
        .filter(|(_, quantity)| quantity.abs() >= MIN_POSITION_QUANTITY)
        .map(|(key, quantity)| (key, round4(quantity)))
        .collect();

    let removed = before - filtered.len();
    if removed > 0 {
        info!("Filtered out {} near-zero positions", removed);
    }
    (filtered, removed)
}

/// Diagnostic summary of a reconciled position map
#[derive(Debug, Clone)]
pub struct PositionReport {
    pub total_accounts: usize,
    pub total_positions: usize,
    pub short_positions: usize,
    pub avg_positions_per_account: f64,
    /// Account holding the most distinct positions, with its count
    pub busiest_account: Option<(String, usize)>,
    /// Positions whose magnitude exceeds the anomaly threshold
    pub extreme_positions: Vec<(PositionKey, f64)>,
}

/// Compute validation diagnostics. Reporting only; the position map is
/// never altered here.
pub fn validate_positions(positions: &HashMap<PositionKey, f64>) -> PositionReport {
    let mut per_account: HashMap<&str, usize> = HashMap::new();
    let mut short_positions = 0;
    let mut extreme_positions = Vec::new();

    for ((account_id, symbol), quantity) in positions {
        *per_account.entry(account_id.as_str()).or_insert(0) += 1;
        if *quantity < 0.0 {
            short_positions += 1;
        }
        if quantity.abs() > EXTREME_POSITION_THRESHOLD {
            extreme_positions.push(((account_id.clone(), symbol.clone()), *quantity));
        }
    }

    let total_accounts = per_account.len();
    let total_positions = positions.len();
    let busiest_account = per_account
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(account, count)| (account.to_string(), *count));

    PositionReport {
        total_accounts,
        total_positions,
        short_positions,
        avg_positions_per_account: if total_accounts > 0 {
            total_positions as f64 / total_accounts as f64
        } else {
            0.0
        },
        busiest_account,
        extreme_positions,
    }
}

impl PositionReport {
    pub fn log(&self) {
        info!("=== Position Validation ===");
        info!("Total accounts with positions: {}", self.total_accounts);
        info!("Total unique positions: {}", self.total_positions);
        info!("Short positions (negative qty): {}", self.short_positions);
        info!(
            "Average positions per account: {:.1}",
            self.avg_positions_per_account
        );
        if let Some((account, count)) = &self.busiest_account {
            info!("Max positions in single account: {} ({})", count, account);
        }
        if !self.extreme_positions.is_empty() {
            warn!(
                "Found {} extreme positions (>{} shares)",
                self.extreme_positions.len(),
                EXTREME_POSITION_THRESHOLD
            );
            for ((account, symbol), quantity) in self.extreme_positions.iter().take(5) {
                warn!("  Account {} has {:.0} shares of {}", account, quantity, symbol);
            }
        }
    }
}

fn generate_holding_id(account_id: &str, symbol: &str) -> String {
    let unique = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", account_id, symbol, &unique[..8])
}

/// Materialize surviving positions as holding records with fresh IDs
pub fn build_holdings(positions: HashMap<PositionKey, f64>) -> Vec<Holding> {
    let now = Utc::now();
    let mut holdings: Vec<Holding> = positions
        .into_iter()
        .map(|((account_id, symbol), quantity)| Holding {
            holding_id: generate_holding_id(&account_id, &symbol),
            account_id,
            symbol,
            quantity,
            last_updated: now,
        })
        .collect();

    // Deterministic file order for easier diffing between runs
    holdings.sort_by(|a, b| {
        (a.account_id.as_str(), a.symbol.as_str()).cmp(&(b.account_id.as_str(), b.symbol.as_str()))
    });
    holdings
}

/// Outcome of one full reconciliation run
#[derive(Debug, Clone, Copy)]
pub struct ReconcileSummary {
    pub stats: AggregateStats,
    pub holdings_written: usize,
    pub positions_filtered: usize,
    pub long_positions: usize,
    pub short_positions: usize,
}

/// Run the full reconciliation: stream the ledger, aggregate, filter,
/// validate, and rewrite the holdings file from scratch.
pub fn reconcile(
    trades_file: impl AsRef<Path>,
    holdings_file: impl AsRef<Path>,
) -> Result<ReconcileSummary> {
    let reader = LedgerReader::open(trades_file.as_ref())?;

    info!("Step 1: Aggregating positions from trades...");
    let (positions, stats) = aggregate_positions(reader);

    info!("Step 2: Filtering positions...");
    let (positions, positions_filtered) = filter_positions(positions);

    info!("Step 3: Validating positions...");
    validate_positions(&positions).log();

    info!("Step 4: Generating holdings records...");
    let holdings = build_holdings(positions);
    let long_positions = holdings.iter().filter(|h| h.quantity > 0.0).count();
    let short_positions = holdings.len() - long_positions;

    info!(
        "Step 5: Writing {} holdings to {}...",
        holdings.len(),
        holdings_file.as_ref().display()
    );
    let mut writer = LedgerWriter::open(holdings_file.as_ref(), WriteMode::Truncate)?;
    let holdings_written = writer.write_all(&holdings)?;
    writer.flush()?;

    Ok(ReconcileSummary {
        stats,
        holdings_written,
        positions_filtered,
        long_positions,
        short_positions,
    })
}
