//! Asset reference data
//!
//! Static symbol catalog plus price loading from the generated
//! asset-details file. When the file is missing, generators fall back to a
//! random price table instead of failing.

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::store::{LedgerWriter, WriteMode};
use crate::types::{round2, Asset, PricePoint};

/// Static metadata for one catalog entry
#[derive(Debug, Clone, Copy)]
pub struct AssetInfo {
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
    pub instrument_type: &'static str,
}

/// Built-in symbol catalog: large-cap US stocks plus a handful of ETFs
pub const ASSET_CATALOG: &[AssetInfo] = &[
    AssetInfo { symbol: "AAPL", name: "Apple Inc.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "MSFT", name: "Microsoft Corp.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "GOOGL", name: "Alphabet Inc. (Class A)", sector: "Communication Services", instrument_type: "Stock" },
    AssetInfo { symbol: "AMZN", name: "Amazon.com Inc.", sector: "Consumer Discretionary", instrument_type: "Stock" },
    AssetInfo { symbol: "NVDA", name: "NVIDIA Corp.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "META", name: "Meta Platforms Inc.", sector: "Communication Services", instrument_type: "Stock" },
    AssetInfo { symbol: "TSLA", name: "Tesla Inc.", sector: "Consumer Discretionary", instrument_type: "Stock" },
    AssetInfo { symbol: "AVGO", name: "Broadcom Inc.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "ADBE", name: "Adobe Inc.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "CSCO", name: "Cisco Systems Inc.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "INTC", name: "Intel Corp.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "QCOM", name: "Qualcomm Inc.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "TXN", name: "Texas Instruments Inc.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "CRM", name: "Salesforce Inc.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "IBM", name: "International Business Machines Corp.", sector: "Technology", instrument_type: "Stock" },
    AssetInfo { symbol: "CMCSA", name: "Comcast Corp.", sector: "Communication Services", instrument_type: "Stock" },
    AssetInfo { symbol: "TMUS", name: "T-Mobile US Inc.", sector: "Communication Services", instrument_type: "Stock" },
    AssetInfo { symbol: "DIS", name: "The Walt Disney Co.", sector: "Communication Services", instrument_type: "Stock" },
    AssetInfo { symbol: "T", name: "AT&T Inc.", sector: "Communication Services", instrument_type: "Stock" },
    AssetInfo { symbol: "AMGN", name: "Amgen Inc.", sector: "Healthcare", instrument_type: "Stock" },
    AssetInfo { symbol: "ISRG", name: "Intuitive Surgical Inc.", sector: "Healthcare", instrument_type: "Stock" },
    AssetInfo { symbol: "MRNA", name: "Moderna Inc.", sector: "Healthcare", instrument_type: "Stock" },
    AssetInfo { symbol: "UNH", name: "UnitedHealth Group Inc.", sector: "Healthcare", instrument_type: "Stock" },
    AssetInfo { symbol: "LLY", name: "Eli Lilly and Co.", sector: "Healthcare", instrument_type: "Stock" },
    AssetInfo { symbol: "PFE", name: "Pfizer Inc.", sector: "Healthcare", instrument_type: "Stock" },
    AssetInfo { symbol: "CVS", name: "CVS Health Corp.", sector: "Healthcare", instrument_type: "Stock" },
    AssetInfo { symbol: "JPM", name: "JPMorgan Chase & Co.", sector: "Financials", instrument_type: "Stock" },
    AssetInfo { symbol: "BAC", name: "Bank of America Corp.", sector: "Financials", instrument_type: "Stock" },
    AssetInfo { symbol: "WFC", name: "Wells Fargo & Co.", sector: "Financials", instrument_type: "Stock" },
    AssetInfo { symbol: "GS", name: "The Goldman Sachs Group Inc.", sector: "Financials", instrument_type: "Stock" },
    AssetInfo { symbol: "MS", name: "Morgan Stanley", sector: "Financials", instrument_type: "Stock" },
    AssetInfo { symbol: "V", name: "Visa Inc.", sector: "Financials", instrument_type: "Stock" },
    AssetInfo { symbol: "MA", name: "Mastercard Inc.", sector: "Financials", instrument_type: "Stock" },
    AssetInfo { symbol: "XOM", name: "Exxon Mobil Corp.", sector: "Energy", instrument_type: "Stock" },
    AssetInfo { symbol: "CVX", name: "Chevron Corp.", sector: "Energy", instrument_type: "Stock" },
    AssetInfo { symbol: "COP", name: "ConocoPhillips", sector: "Energy", instrument_type: "Stock" },
    AssetInfo { symbol: "WMT", name: "Walmart Inc.", sector: "Consumer Staples", instrument_type: "Stock" },
    AssetInfo { symbol: "PG", name: "Procter & Gamble Co.", sector: "Consumer Staples", instrument_type: "Stock" },
    AssetInfo { symbol: "KO", name: "The Coca-Cola Co.", sector: "Consumer Staples", instrument_type: "Stock" },
    AssetInfo { symbol: "PEP", name: "PepsiCo Inc.", sector: "Consumer Staples", instrument_type: "Stock" },
    AssetInfo { symbol: "COST", name: "Costco Wholesale Corp.", sector: "Consumer Staples", instrument_type: "Stock" },
    AssetInfo { symbol: "HD", name: "The Home Depot Inc.", sector: "Consumer Discretionary", instrument_type: "Stock" },
    AssetInfo { symbol: "MCD", name: "McDonald's Corp.", sector: "Consumer Discretionary", instrument_type: "Stock" },
    AssetInfo { symbol: "NKE", name: "Nike Inc.", sector: "Consumer Discretionary", instrument_type: "Stock" },
    AssetInfo { symbol: "BA", name: "The Boeing Co.", sector: "Industrials", instrument_type: "Stock" },
    AssetInfo { symbol: "CAT", name: "Caterpillar Inc.", sector: "Industrials", instrument_type: "Stock" },
    AssetInfo { symbol: "UPS", name: "United Parcel Service Inc.", sector: "Industrials", instrument_type: "Stock" },
    AssetInfo { symbol: "SPY", name: "SPDR S&P 500 ETF Trust", sector: "Broad Market", instrument_type: "ETF" },
    AssetInfo { symbol: "QQQ", name: "Invesco QQQ Trust", sector: "Broad Market", instrument_type: "ETF" },
    AssetInfo { symbol: "IWM", name: "iShares Russell 2000 ETF", sector: "Broad Market", instrument_type: "ETF" },
    AssetInfo { symbol: "XLF", name: "Financial Select Sector SPDR Fund", sector: "Financials", instrument_type: "ETF" },
    AssetInfo { symbol: "XLE", name: "Energy Select Sector SPDR Fund", sector: "Energy", instrument_type: "ETF" },
    AssetInfo { symbol: "VTI", name: "Vanguard Total Stock Market ETF", sector: "Broad Market", instrument_type: "ETF" },
];

/// Price bounds of the fallback table, matching the documented 10-500 range
const FALLBACK_PRICE_RANGE: (f64, f64) = (10.0, 500.0);
const FALLBACK_SYMBOL_LIMIT: usize = 50;

// Lenient view of an asset-details line: only the fields the generators
// need, so extra keys or schema drift in the file never break loading.
#[derive(Debug, Deserialize)]
struct AssetPriceRecord {
    symbol: Option<String>,
    current_price: Option<PriceField>,
}

#[derive(Debug, Deserialize)]
struct PriceField {
    price: Option<f64>,
}

/// Load symbol -> current price from the asset-details file.
///
/// A missing file is not fatal: generators substitute a random price table
/// over the catalog instead. Malformed lines are skipped.
pub fn load_asset_prices<R: Rng + ?Sized>(
    path: impl AsRef<Path>,
    rng: &mut R,
) -> HashMap<String, f64> {
    let path = path.as_ref();

    if !path.exists() {
        warn!(
            "Asset details file not found: {}. Using fallback prices.",
            path.display()
        );
        return fallback_prices(rng);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            warn!(
                "Could not open asset details file {}: {}. Using fallback prices.",
                path.display(),
                err
            );
            return fallback_prices(rng);
        }
    };

    let mut prices = HashMap::new();
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { continue };
        let Ok(record) = serde_json::from_str::<AssetPriceRecord>(&line) else {
            continue;
        };
        if let (Some(symbol), Some(price)) = (
            record.symbol,
            record.current_price.and_then(|p| p.price),
        ) {
            if price > 0.0 {
                prices.insert(symbol, price);
            }
        }
    }

    if prices.is_empty() {
        warn!(
            "No usable prices in {}. Using fallback prices.",
            path.display()
        );
        return fallback_prices(rng);
    }

    info!("Loaded prices for {} assets", prices.len());
    prices
}

fn fallback_prices<R: Rng + ?Sized>(rng: &mut R) -> HashMap<String, f64> {
    ASSET_CATALOG
        .iter()
        .take(FALLBACK_SYMBOL_LIMIT)
        .map(|info| {
            let price = round2(rng.gen_range(FALLBACK_PRICE_RANGE.0..FALLBACK_PRICE_RANGE.1));
            (info.symbol.to_string(), price)
        })
        .collect()
}

/// Materialize the catalog to an asset-details file with randomized prices.
///
/// Prices are drawn per instrument type; the nested `current_price.price`
/// shape is what the price loader and the external bulk loader consume.
pub fn generate_asset_details<R: Rng + ?Sized>(
    output_file: impl AsRef<Path>,
    rng: &mut R,
) -> Result<usize> {
    let now = Utc::now();
    let mut writer = LedgerWriter::open(output_file.as_ref(), WriteMode::Truncate)?;
    let mut count = 0;

    for info in ASSET_CATALOG {
        let (min_price, max_price) = match info.instrument_type {
            "ETF" => (20.0, 600.0),
            _ => (10.0, 1500.0),
        };

        let asset = Asset {
            symbol: info.symbol.to_string(),
            name: info.name.to_string(),
            sector: info.sector.to_string(),
            instrument_type: info.instrument_type.to_string(),
            current_price: PricePoint {
                price: round2(rng.gen_range(min_price..max_price)),
                as_of: now,
            },
            last_updated: now,
        };

        writer.write(&asset)?;
        count += 1;
    }

    writer.flush()?;
    info!(
        "Wrote {} asset records to {}",
        count,
        output_file.as_ref().display()
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_fallback_prices_when_file_missing() {
        let mut rng = StdRng::seed_from_u64(7);
        let dir = tempfile::tempdir().unwrap();
        let prices = load_asset_prices(dir.path().join("missing.jsonl"), &mut rng);

        assert_eq!(prices.len(), ASSET_CATALOG.len().min(FALLBACK_SYMBOL_LIMIT));
        for price in prices.values() {
            assert!(*price >= FALLBACK_PRICE_RANGE.0 && *price <= FALLBACK_PRICE_RANGE.1);
        }
    }

    #[test]
    fn test_load_prices_skips_malformed_lines() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"symbol": "AAPL", "current_price": {{"price": 187.5}}}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"symbol": "MSFT"}}"#).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let prices = load_asset_prices(&path, &mut rng);
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["AAPL"], 187.5);
    }

    #[test]
    fn test_unusable_file_falls_back() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.jsonl");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"symbol": "MSFT"}}"#).unwrap();

        // A file with no usable prices behaves like a missing file
        let mut rng = StdRng::seed_from_u64(8);
        let prices = load_asset_prices(&path, &mut rng);
        assert_eq!(prices.len(), ASSET_CATALOG.len().min(FALLBACK_SYMBOL_LIMIT));
        for price in prices.values() {
            assert!(*price >= FALLBACK_PRICE_RANGE.0 && *price <= FALLBACK_PRICE_RANGE.1);
        }
    }

    #[test]
    fn test_generate_asset_details_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.jsonl");
        let mut rng = StdRng::seed_from_u64(42);

        let count = generate_asset_details(&path, &mut rng).unwrap();
        assert_eq!(count, ASSET_CATALOG.len());

        let prices = load_asset_prices(&path, &mut rng);
        assert_eq!(prices.len(), ASSET_CATALOG.len());
        assert!(prices.contains_key("SPY"));
    }

    #[test]
    fn test_catalog_symbols_unique() {
        let mut symbols: Vec<_> = ASSET_CATALOG.iter().map(|a| a.symbol).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), ASSET_CATALOG.len());
    }
}
