//! Manipulation scenario generators
//!
//! Three structurally similar generators built on the baseline trade
//! primitives. Each one appends tagged trades to the shared
//! controlled-trades file so fraud-detection queries see them mixed in
//! with ordinary activity.

pub mod insider_trading;
pub mod pump_and_dump;
pub mod wash_trading;

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::types::{Account, RiskProfile, Trade};

/// Short hex suffix for scheme and trade IDs
pub fn id_suffix() -> String {
    let unique = Uuid::new_v4().simple().to_string();
    unique[..8].to_string()
}

/// Suitability score for coordinated manipulation: riskier profiles and
/// larger portfolios score higher.
pub fn manipulation_score(account: &Account) -> u32 {
    let risk_score = match account.risk_profile {
        RiskProfile::Conservative => 1,
        RiskProfile::VeryLow => 2,
        RiskProfile::Low => 3,
        RiskProfile::Medium => 4,
        RiskProfile::Moderate => 5,
        RiskProfile::Growth => 7,
        RiskProfile::High => 9,
        RiskProfile::VeryHigh => 10,
    };

    let portfolio_score = if account.total_portfolio_value > 10_000_000.0 {
        5
    } else if account.total_portfolio_value > 5_000_000.0 {
        3
    } else if account.total_portfolio_value > 1_000_000.0 {
        1
    } else {
        0
    };

    risk_score + portfolio_score
}

/// Select accounts biased toward high manipulation scores: rank everyone,
/// keep the top half, then sample the requested count from that pool.
/// Sampling (rather than pure top-N) avoids picking the identical cohort
/// for every scheme.
pub fn select_scored_accounts<R: Rng + ?Sized>(
    accounts: &[Account],
    num_accounts: usize,
    rng: &mut R,
) -> Vec<Account> {
    let mut scored: Vec<(&Account, u32)> = accounts
        .iter()
        .map(|a| (a, manipulation_score(a)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let top_half = &scored[..(scored.len() / 2).max(1)];
    top_half
        .choose_multiple(rng, num_accounts.min(top_half.len()))
        .map(|(account, _)| (*account).clone())
        .collect()
}

/// Sort a scenario's trades chronologically before they are appended
pub fn sort_by_timestamp(trades: &mut [Trade]) {
    trades.sort_by_key(|t| t.execution_timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn account(id: &str, risk_profile: RiskProfile, portfolio: f64) -> Account {
        Account {
            account_id: id.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            account_holder_name: String::new(),
            state: "CA".to_string(),
            account_type: "Growth".to_string(),
            risk_profile,
            contact_preference: "email".to_string(),
            total_portfolio_value: portfolio,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_score_favors_risk_and_size() {
        let timid = account("A", RiskProfile::Conservative, 100_000.0);
        let bold = account("B", RiskProfile::VeryHigh, 20_000_000.0);
        assert_eq!(manipulation_score(&timid), 1);
        assert_eq!(manipulation_score(&bold), 15);
    }

    #[test]
    fn test_selection_draws_from_top_half() {
        let mut accounts: Vec<Account> = (0..20)
            .map(|i| account(&format!("LOW{}", i), RiskProfile::Conservative, 10_000.0))
            .collect();
        for i in 0..20 {
            accounts.push(account(&format!("HIGH{}", i), RiskProfile::VeryHigh, 20_000_000.0));
        }

        let mut rng = StdRng::seed_from_u64(11);
        let selected = select_scored_accounts(&accounts, 10, &mut rng);
        assert_eq!(selected.len(), 10);
        for account in &selected {
            assert!(
                account.account_id.starts_with("HIGH"),
                "low scorer {} selected",
                account.account_id
            );
        }
    }

    #[test]
    fn test_selection_varies_between_draws() {
        let accounts: Vec<Account> = (0..40)
            .map(|i| account(&format!("ACC{}", i), RiskProfile::High, 6_000_000.0))
            .collect();

        let mut rng = StdRng::seed_from_u64(12);
        let first: Vec<String> = select_scored_accounts(&accounts, 5, &mut rng)
            .iter()
            .map(|a| a.account_id.clone())
            .collect();
        let second: Vec<String> = select_scored_accounts(&accounts, 5, &mut rng)
            .iter()
            .map(|a| a.account_id.clone())
            .collect();
        assert_ne!(first, second);
    }
}
