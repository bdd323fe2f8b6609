//! Martingale stake sizing.
//!
//! Multiplies the stake by a fixed factor after each loss and drops back to
//! the base bet after a win. A ceiling guard resets the stake before it can
//! be submitted above `max_bet`.

use rust_decimal::Decimal;
use tracing::warn;

use crate::types::Outcome;

/// Decimal places kept when scaling a stake after a loss.
pub const STAKE_DP: u32 = 12;

#[derive(Debug, Clone)]
pub struct SizerConfig {
    pub base_bet: Decimal,
    pub progression_factor: Decimal,
    pub max_bet: Decimal,
}

pub struct StakeSizer {
    config: SizerConfig,
}

impl StakeSizer {
    pub fn new(config: SizerConfig) -> Self {
        Self { config }
    }

    pub fn base_bet(&self) -> Decimal {
        self.config.base_bet
    }

    /// Stake to use after a bet settled with `outcome` at `current` stake.
    ///
    /// A progression that overflows `Decimal` drops back to the base bet.
    pub fn next_stake(&self, outcome: Outcome, current: Decimal) -> Decimal {
        match outcome {
            Outcome::Win => self.config.base_bet,
            Outcome::Lose => match current.checked_mul(self.config.progression_factor) {
                Some(next) => next.round_dp(STAKE_DP),
                None => {
                    warn!(
                        current_bet = %current,
                        progression_factor = %self.config.progression_factor,
                        base_bet = %self.config.base_bet,
                        "Stake progression overflowed, resetting to base"
                    );
                    self.config.base_bet
                }
            },
        }
    }

    /// Apply the ceiling guard before a bet is placed.
    ///
    /// Returns the stake to submit and whether the guard tripped.
    pub fn enforce_ceiling(&self, current: Decimal) -> (Decimal, bool) {
        if current > self.config.max_bet {
            warn!(
                current_bet = %current,
                max_bet = %self.config.max_bet,
                base_bet = %self.config.base_bet,
                "Stake above max_bet, resetting to base"
            );
            (self.config.base_bet, true)
        } else {
            (current, false)
        }
    }
}
