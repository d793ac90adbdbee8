//! Core data types shared by the generators and the reconciler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for trade records
#[derive(Debug, Error)]
pub enum TradeValidationError {
    #[error("quantity ({0}) must be positive")]
    NonPositiveQuantity(f64),

    #[error("execution price ({0}) must be non-negative")]
    NegativePrice(f64),

    #[error("executed trade cost {cost} != round(quantity {quantity} * price {price}, 2)")]
    CostMismatch { quantity: f64, price: f64, cost: f64 },

    #[error("cancelled trade carries non-zero price ({price}) or cost ({cost})")]
    CancelledWithValue { price: f64, cost: f64 },
}

/// Account risk profile, ordered roughly from least to most aggressive.
///
/// Serialized spellings match the upstream account files ("Very Low",
/// "Very High" with a space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskProfile {
    Conservative,
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    Moderate,
    Growth,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 8] = [
        RiskProfile::Conservative,
        RiskProfile::VeryLow,
        RiskProfile::Low,
        RiskProfile::Medium,
        RiskProfile::Moderate,
        RiskProfile::Growth,
        RiskProfile::High,
        RiskProfile::VeryHigh,
    ];

    /// Trading-aggression multiplier, used to scale per-account volume in
    /// the insider-trading generator.
    pub fn aggression_multiplier(self) -> f64 {
        match self {
            RiskProfile::Conservative => 0.5,
            RiskProfile::VeryLow => 0.5,
            RiskProfile::Low => 0.7,
            RiskProfile::Medium => 1.0,
            RiskProfile::Moderate => 1.0,
            RiskProfile::Growth => 1.5,
            RiskProfile::High => 2.0,
            RiskProfile::VeryHigh => 3.0,
        }
    }
}

impl std::fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskProfile::Conservative => "Conservative",
            RiskProfile::VeryLow => "Very Low",
            RiskProfile::Low => "Low",
            RiskProfile::Medium => "Medium",
            RiskProfile::Moderate => "Moderate",
            RiskProfile::Growth => "Growth",
            RiskProfile::High => "High",
            RiskProfile::VeryHigh => "Very High",
        };
        write!(f, "{}", s)
    }
}

/// Trade direction; determines the sign a fill contributes to a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Buy,
    Sell,
    Short,
    Cover,
}

impl TradeType {
    /// Sign applied to quantity when accumulating net positions.
    /// Buys and short covers add shares; sells and shorts remove them.
    pub fn position_sign(self) -> f64 {
        match self {
            TradeType::Buy | TradeType::Cover => 1.0,
            TradeType::Sell | TradeType::Short => -1.0,
        }
    }

    /// True when this direction pays the ask side of the spread
    pub fn is_buy_side(self) -> bool {
        matches!(self, TradeType::Buy | TradeType::Cover)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Executed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_executed(self) -> bool {
        matches!(self, OrderStatus::Executed)
    }
}

/// Manipulation pattern a controlled trade belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    WashTrading,
    PumpAndDump,
    InsiderTrading,
}

/// Phase tag stamped on controlled trades for downstream detectability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    CircularTrading,
    Accumulation,
    Pump,
    Dump,
    Acceleration,
    FinalPush,
    ProfitTaking,
}

/// How tightly a pump-and-dump ring coordinates its time buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinationType {
    Tight,
    Loose,
    Mixed,
}

fn default_risk_profile() -> RiskProfile {
    RiskProfile::Medium
}

/// Customer account record. Created by the account generator (or an
/// upstream source); read-only for every trade generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub account_holder_name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub account_type: String,
    #[serde(default = "default_risk_profile")]
    pub risk_profile: RiskProfile,
    #[serde(default)]
    pub contact_preference: String,
    #[serde(default)]
    pub total_portfolio_value: f64,
    pub last_updated: DateTime<Utc>,
}

/// Nested price object as stored in the asset-details file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub as_of: DateTime<Utc>,
}

/// Reference data for one tradeable instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub instrument_type: String,
    pub current_price: PricePoint,
    pub last_updated: DateTime<Utc>,
}

/// A single trade record, the central entity of every ledger file.
///
/// Scenario tags are `None` for baseline activity and serialized only when
/// present, so ordinary and controlled trades share one schema and one
/// trade store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: String,
    pub account_id: String,
    pub symbol: String,
    pub trade_type: TradeType,
    pub order_type: OrderType,
    pub order_status: OrderStatus,
    pub quantity: f64,
    pub execution_price: f64,
    pub trade_cost: f64,
    pub execution_timestamp: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_type: Option<ScenarioType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_phase: Option<ScenarioPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wash_ring_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pump_scheme_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordination_type: Option<CoordinationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpart_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_announcement_time: Option<DateTime<Utc>>,
}

impl Trade {
    /// Validate the arithmetic invariants every generator must uphold
    pub fn validate(&self) -> Result<(), TradeValidationError> {
        if self.quantity <= 0.0 {
            return Err(TradeValidationError::NonPositiveQuantity(self.quantity));
        }
        if self.execution_price < 0.0 {
            return Err(TradeValidationError::NegativePrice(self.execution_price));
        }
        match self.order_status {
            OrderStatus::Executed => {
                let expected = round2(self.quantity * self.execution_price);
                if (self.trade_cost - expected).abs() > 1e-6 {
                    return Err(TradeValidationError::CostMismatch {
                        quantity: self.quantity,
                        price: self.execution_price,
                        cost: self.trade_cost,
                    });
                }
            }
            OrderStatus::Cancelled => {
                if self.execution_price != 0.0 || self.trade_cost != 0.0 {
                    return Err(TradeValidationError::CancelledWithValue {
                        price: self.execution_price,
                        cost: self.trade_cost,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Materialized net position for one (account, symbol) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub holding_id: String,
    pub account_id: String,
    pub symbol: String,
    pub quantity: f64,
    pub last_updated: DateTime<Utc>,
}

/// Round to 2 decimal places (cents)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 4 decimal places (position precision)
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
