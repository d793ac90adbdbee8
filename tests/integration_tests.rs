//! End-to-end pipeline tests: accounts -> assets -> trades -> holdings,
//! plus the three manipulation generators appending to one controlled file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use market_synth::scenarios::{insider_trading, pump_and_dump, wash_trading};
use market_synth::store::{load_accounts, LedgerReader};
use market_synth::{accounts, assets, holdings, trades, Config};
use market_synth::{OrderStatus, ScenarioType, Trade, TradeType};

struct Pipeline {
    _dir: TempDir,
    accounts_file: PathBuf,
    trades_file: PathBuf,
    holdings_file: PathBuf,
    controlled_file: PathBuf,
    asset_prices: HashMap<String, f64>,
    config: Config,
}

/// Run the baseline pipeline with a small account set and a short window
fn run_pipeline(seed: u64) -> Pipeline {
    let dir = tempfile::tempdir().unwrap();
    let accounts_file = dir.path().join("accounts.jsonl");
    let assets_file = dir.path().join("assets.jsonl");
    let trades_file = dir.path().join("trades.jsonl");
    let holdings_file = dir.path().join("holdings.jsonl");
    let controlled_file = dir.path().join("controlled.jsonl");

    let mut config = Config::default();
    config.accounts.num_accounts = 50;
    config.trades.batch_size = 16;

    let mut rng = StdRng::seed_from_u64(seed);

    accounts::generate_account_store(&config.accounts, &accounts_file, &mut rng).unwrap();
    assets::generate_asset_details(&assets_file, &mut rng).unwrap();
    let asset_prices = assets::load_asset_prices(&assets_file, &mut rng);

    let loaded = load_accounts(&accounts_file).unwrap();
    trades::generate_ledger(&config.trades, &mut rng, &loaded, &asset_prices, &trades_file)
        .unwrap();
    holdings::reconcile(&trades_file, &holdings_file).unwrap();

    Pipeline {
        _dir: dir,
        accounts_file,
        trades_file,
        holdings_file,
        controlled_file,
        asset_prices,
        config,
    }
}

fn read_trades(path: &Path) -> Vec<Trade> {
    LedgerReader::open(path)
        .unwrap()
        .map(|(_, record)| record.unwrap())
        .collect()
}

#[test]
fn test_baseline_pipeline_produces_valid_ledger() {
    let pipeline = run_pipeline(100);
    let ledger = read_trades(&pipeline.trades_file);
    assert!(!ledger.is_empty());

    let (window_start, window_end) = pipeline.config.trades.window().unwrap();
    for trade in &ledger {
        assert!(trade.is_valid(), "invalid trade {}", trade.trade_id);
        assert!(trade.execution_timestamp >= window_start);
        assert!(trade.execution_timestamp <= window_end);
        assert!(pipeline.asset_prices.contains_key(&trade.symbol));
        assert!(trade.scenario_type.is_none());
    }

    // Cancellations exist at a 7% rate over thousands of trades
    let cancelled = ledger
        .iter()
        .filter(|t| t.order_status == OrderStatus::Cancelled)
        .count();
    assert!(cancelled > 0);
}

#[test]
fn test_holdings_match_manual_aggregation() {
    let pipeline = run_pipeline(101);
    let ledger = read_trades(&pipeline.trades_file);

    let mut expected: HashMap<(String, String), f64> = HashMap::new();
    for trade in ledger.iter().filter(|t| t.order_status.is_executed()) {
        *expected
            .entry((trade.account_id.clone(), trade.symbol.clone()))
            .or_insert(0.0) += trade.trade_type.position_sign() * trade.quantity;
    }
    expected.retain(|_, quantity| quantity.abs() >= 0.01);

    let file = std::fs::read_to_string(&pipeline.holdings_file).unwrap();
    let mut seen = 0;
    for line in file.lines() {
        let holding: market_synth::Holding = serde_json::from_str(line).unwrap();
        let key = (holding.account_id.clone(), holding.symbol.clone());
        let expected_quantity = expected
            .get(&key)
            .unwrap_or_else(|| panic!("unexpected holding {:?}", key));
        assert!(
            (holding.quantity - expected_quantity).abs() < 0.0001,
            "{:?}: {} != {}",
            key,
            holding.quantity,
            expected_quantity
        );
        seen += 1;
    }
    assert_eq!(seen, expected.len());
}

#[test]
fn test_reconciliation_is_idempotent() {
    let pipeline = run_pipeline(102);

    let first = holdings::reconcile(&pipeline.trades_file, &pipeline.holdings_file).unwrap();
    let second = holdings::reconcile(&pipeline.trades_file, &pipeline.holdings_file).unwrap();

    assert_eq!(first.holdings_written, second.holdings_written);
    assert_eq!(first.short_positions, second.short_positions);
    assert_eq!(first.stats.executed, second.stats.executed);
}

#[test]
fn test_scenarios_share_one_controlled_file() {
    let pipeline = run_pipeline(103);
    let mut rng = StdRng::seed_from_u64(103);
    let config = &pipeline.config;

    let wash_count = wash_trading::generate_scenarios(
        &config.wash_trading,
        &mut rng,
        &pipeline.accounts_file,
        &pipeline.asset_prices,
        2,
        &pipeline.controlled_file,
    )
    .unwrap();
    let pump_summaries = pump_and_dump::generate_scenarios(
        &config.pump_and_dump,
        &mut rng,
        &pipeline.accounts_file,
        &pipeline.asset_prices,
        1,
        &pipeline.controlled_file,
    )
    .unwrap();
    let insider_count = insider_trading::generate_scenarios(
        &config.insider_trading,
        &mut rng,
        &pipeline.accounts_file,
        &pipeline.asset_prices,
        1,
        &pipeline.controlled_file,
    )
    .unwrap();

    let controlled = read_trades(&pipeline.controlled_file);
    let pump_count: usize = pump_summaries.iter().map(|s| s.num_trades).sum();
    assert_eq!(controlled.len(), wash_count + pump_count + insider_count);

    // Every controlled trade is tagged, valid, and attributable
    for trade in &controlled {
        assert!(trade.is_valid(), "invalid trade {}", trade.trade_id);
        let scenario = trade.scenario_type.expect("controlled trade lacks tag");
        match scenario {
            ScenarioType::WashTrading => {
                assert!(trade.wash_ring_id.is_some());
                assert!(trade.counterpart_account.is_some());
            }
            ScenarioType::PumpAndDump => {
                assert!(trade.pump_scheme_id.is_some());
                assert!(trade.coordination_type.is_some());
            }
            ScenarioType::InsiderTrading => {
                assert!(trade.news_announcement_time.is_some());
                assert!(trade.order_status.is_executed());
            }
        }
        assert!(trade.scenario_phase.is_some());
        assert!(trade.scenario_symbol.is_some());
    }

    let types: std::collections::HashSet<_> =
        controlled.iter().map(|t| t.scenario_type.unwrap()).collect();
    assert_eq!(types.len(), 3);
}

#[test]
fn test_wash_trades_come_in_matched_pairs() {
    let pipeline = run_pipeline(104);
    let mut rng = StdRng::seed_from_u64(104);

    wash_trading::generate_scenarios(
        &pipeline.config.wash_trading,
        &mut rng,
        &pipeline.accounts_file,
        &pipeline.asset_prices,
        1,
        &pipeline.controlled_file,
    )
    .unwrap();

    let controlled = read_trades(&pipeline.controlled_file);
    assert_eq!(controlled.len() % 2, 0);

    let mut by_base: HashMap<String, Vec<&Trade>> = HashMap::new();
    for trade in &controlled {
        let base = trade.trade_id.rsplit_once('-').unwrap().0.to_string();
        by_base.entry(base).or_default().push(trade);
    }
    for legs in by_base.values() {
        assert_eq!(legs.len(), 2);
        let buys = legs.iter().filter(|t| t.trade_type == TradeType::Buy).count();
        let sells = legs.iter().filter(|t| t.trade_type == TradeType::Sell).count();
        assert_eq!((buys, sells), (1, 1));
        assert_eq!(legs[0].execution_timestamp, legs[1].execution_timestamp);
        assert_eq!(legs[0].quantity, legs[1].quantity);
    }
}

#[test]
fn test_pump_scheme_price_shape() {
    let pipeline = run_pipeline(105);
    let mut rng = StdRng::seed_from_u64(105);

    let summaries = pump_and_dump::generate_scenarios(
        &pipeline.config.pump_and_dump,
        &mut rng,
        &pipeline.accounts_file,
        &pipeline.asset_prices,
        3,
        &pipeline.controlled_file,
    )
    .unwrap();

    for summary in &summaries {
        assert!(summary.peak_price > summary.base_price);
        assert!(summary.final_price < summary.peak_price);
        assert!(summary.final_price >= summary.base_price * 0.5 * 0.99);
    }
}

#[test]
fn test_insider_accumulation_precedes_announcement() {
    let pipeline = run_pipeline(106);
    let mut rng = StdRng::seed_from_u64(106);

    insider_trading::generate_scenarios(
        &pipeline.config.insider_trading,
        &mut rng,
        &pipeline.accounts_file,
        &pipeline.asset_prices,
        1,
        &pipeline.controlled_file,
    )
    .unwrap();

    let controlled = read_trades(&pipeline.controlled_file);
    assert!(!controlled.is_empty());

    for trade in &controlled {
        let announcement = trade.news_announcement_time.unwrap();
        assert!(announcement < Utc::now());
        if trade.trade_type == TradeType::Buy {
            assert!(trade.execution_timestamp <= announcement);
        }
        // The whole timeline fits inside window + profit-taking bounds
        assert!(trade.execution_timestamp >= announcement - Duration::hours(48));
        assert!(trade.execution_timestamp <= announcement + Duration::hours(7));
    }
}

#[test]
fn test_missing_accounts_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.jsonl");
    let controlled = dir.path().join("controlled.jsonl");
    let mut rng = StdRng::seed_from_u64(107);

    let mut prices = HashMap::new();
    prices.insert("AAPL".to_string(), 200.0);

    let err = wash_trading::generate_scenarios(
        &Config::default().wash_trading,
        &mut rng,
        &missing,
        &prices,
        1,
        &controlled,
    )
    .unwrap_err();
    assert!(err.to_string().contains("accounts"));
}
