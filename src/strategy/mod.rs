//! Strategy engine — bet parameter conversion and martingale sizing.

pub mod martingale;
pub mod threshold;

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{BetRequest, Outcome, Session, CURRENCY_DP};
use martingale::StakeSizer;
use threshold::ThresholdConverter;

// ---------------------------------------------------------------------------
// Planned bet
// ---------------------------------------------------------------------------

/// A bet ready for submission, plus whether the ceiling guard fired while
/// preparing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBet {
    pub request: BetRequest,
    pub ceiling_reset: bool,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Pipelines ceiling guard → rule/threshold conversion → bet request, and
/// advances the stake once the bet settles.
pub struct MartingaleStrategy {
    converter: ThresholdConverter,
    sizer: StakeSizer,
}

impl MartingaleStrategy {
    pub fn new(converter: ThresholdConverter, sizer: StakeSizer) -> Self {
        Self { converter, sizer }
    }

    /// Build the next bet for `session`.
    ///
    /// The stake is rounded to currency precision before the ceiling guard
    /// sees it. If it has grown past `max_bet` it is reset to the base bet on
    /// the session itself, so the reset persists into the progression.
    pub fn plan_bet(&mut self, session: &mut Session) -> PlannedBet {
        let stake = session.current_bet.round_dp(CURRENCY_DP);
        let (amount, ceiling_reset) = self.sizer.enforce_ceiling(stake);
        session.current_bet = amount;

        let params = self.converter.next_parameters();
        let request = BetRequest {
            currency: session.currency.clone(),
            amount,
            rule: params.rule,
            threshold: params.threshold,
            multiplier: params.multiplier,
        };

        debug!(bet = %request, ceiling_reset, "Bet planned");

        PlannedBet { request, ceiling_reset }
    }

    /// Move the session's stake along the progression after a settled bet.
    pub fn advance(&self, session: &mut Session, outcome: Outcome, staked: Decimal) {
        session.current_bet = self.sizer.next_stake(outcome, staked);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
