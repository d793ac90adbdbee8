//! Account-store generation
//!
//! Produces the synthetic customer accounts every trade generator consumes.
//! Account IDs are sequential on purpose: the wash-trading ring selector
//! uses numeric adjacency as one of its relationship patterns.

use anyhow::Result;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;
use tracing::info;

use crate::config::AccountGenConfig;
use crate::store::{LedgerWriter, WriteMode};
use crate::types::{round2, Account, RiskProfile};

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Christopher", "Karen", "Charles", "Lisa", "Daniel", "Nancy", "Matthew", "Betty",
    "Anthony", "Sandra", "Mark", "Margaret", "Donald", "Ashley", "Steven", "Kimberly", "Andrew",
    "Emily", "Paul", "Donna", "Joshua", "Michelle",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris", "Sanchez",
    "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young", "Allen", "King", "Wright",
    "Scott", "Torres", "Nguyen", "Hill", "Flores",
];

pub const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

const ACCOUNT_TYPES: &[&str] = &[
    "Growth",
    "Conservative",
    "Income-Focused",
    "Balanced",
    "Aggressive Growth",
    "Retirement",
];

const CONTACT_PREFERENCES: &[&str] = &["email", "app_notification", "none"];

/// Generate `num_accounts` synthetic accounts with sequential IDs
pub fn generate_accounts<R: Rng + ?Sized>(
    config: &AccountGenConfig,
    rng: &mut R,
) -> Vec<Account> {
    let now = Utc::now();
    let (exp_min, exp_max) = config.portfolio_value_exponent_range;

    (0..config.num_accounts)
        .map(|i| {
            let first_name = *FIRST_NAMES.choose(rng).expect("name table is non-empty");
            let last_name = *LAST_NAMES.choose(rng).expect("name table is non-empty");
            // Log-uniform portfolio values keep every size tier populated,
            // which the pump-and-dump scoring relies on.
            let portfolio_value = round2(10f64.powf(rng.gen_range(exp_min..exp_max)));

            Account {
                account_id: format!("ACC{:06}", i + 1),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                account_holder_name: format!("{} {}", first_name, last_name),
                state: US_STATES.choose(rng).expect("state table is non-empty").to_string(),
                account_type: ACCOUNT_TYPES
                    .choose(rng)
                    .expect("type table is non-empty")
                    .to_string(),
                risk_profile: *RiskProfile::ALL.choose(rng).expect("profiles are non-empty"),
                contact_preference: CONTACT_PREFERENCES
                    .choose(rng)
                    .expect("preference table is non-empty")
                    .to_string(),
                total_portfolio_value: portfolio_value,
                last_updated: now,
            }
        })
        .collect()
}

/// Generate accounts and write them to the account store (truncate mode)
pub fn generate_account_store<R: Rng + ?Sized>(
    config: &AccountGenConfig,
    output_file: impl AsRef<Path>,
    rng: &mut R,
) -> Result<usize> {
    let accounts = generate_accounts(config, rng);

    let mut writer = LedgerWriter::open(output_file.as_ref(), WriteMode::Truncate)?;
    let count = writer.write_all(&accounts)?;
    writer.flush()?;

    info!(
        "Wrote {} accounts to {}",
        count,
        output_file.as_ref().display()
    );
    Ok(count)
}
