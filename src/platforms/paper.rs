//! Paper dice platform for dry runs.
//!
//! Rolls a uniform value in `[0.00, 99.99]` locally and settles the bet the
//! way the house would: `under` wins below the threshold, `over` above it.
//! Wins pay `amount × (multiplier − 1)`. Balance lives in memory only and
//! there is no rate limit.

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Mutex;
use tracing::debug;

use super::DicePlatform;
use crate::types::{BetOutcome, BetRequest, BetResponse, BetResult, Outcome, Rule, CURRENCY_DP};

const PLATFORM_NAME: &str = "paper";

pub struct PaperPlatform {
    currency: String,
    balance: Mutex<Decimal>,
}

impl PaperPlatform {
    pub fn new(currency: &str, starting_balance: Decimal) -> Self {
        Self {
            currency: currency.to_lowercase(),
            balance: Mutex::new(starting_balance),
        }
    }

    /// Settle `request` against a known roll. Exposed for deterministic tests.
    pub fn settle(&self, request: &BetRequest, roll: Decimal) -> BetOutcome {
        let mut balance = match self.balance.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if request.amount <= Decimal::ZERO {
            return BetOutcome::Rejected("amount must be positive".into());
        }
        if request.amount > *balance {
            return BetOutcome::Rejected("Insufficient balance".into());
        }

        let won = match request.rule {
            Rule::Under => roll < request.threshold,
            Rule::Over => roll > request.threshold,
        };

        let (outcome, profit) = if won {
            let profit = (request.amount * (request.multiplier - Decimal::ONE)).round_dp(CURRENCY_DP);
            *balance += profit;
            (Outcome::Win, profit)
        } else {
            *balance -= request.amount;
            (Outcome::Lose, -request.amount)
        };

        debug!(
            roll = %roll,
            rule = %request.rule,
            threshold = %request.threshold,
            outcome = %outcome,
            balance = %*balance,
            "Paper bet settled"
        );

        BetOutcome::Settled(BetResult {
            outcome,
            profit,
            amount: Some(request.amount),
            rolled_value: roll,
            new_balance: Some(*balance),
        })
    }

    pub fn balance(&self) -> Decimal {
        match self.balance.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DicePlatform for PaperPlatform {
    async fn get_balance(&self, currency: &str) -> Result<Decimal> {
        if !currency.eq_ignore_ascii_case(&self.currency) {
            anyhow::bail!("Paper platform only holds {}", self.currency);
        }
        Ok(self.balance())
    }

    async fn place_bet(&self, request: &BetRequest) -> Result<BetResponse> {
        let roll = Decimal::new(rand::thread_rng().gen_range(0..=9999), 2);
        Ok(BetResponse {
            outcome: self.settle(request, roll),
            rate_limit: None,
        })
    }

    fn name(&self) -> &'static str {
        PLATFORM_NAME
    }
}
