//! Accountant — session P&L, bet counts, and stop conditions.
//!
//! Applies each settled bet to the session and decides, at the top of every
//! iteration, whether the session has crossed its stop-loss or take-profit.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::types::{BetResult, Outcome, Session, StopReason};

// ---------------------------------------------------------------------------
// Stop bounds
// ---------------------------------------------------------------------------

/// Profit bounds that end a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopBounds {
    /// Negative bound; reaching or dropping below it stops the session.
    pub stop_loss: Decimal,
    /// Positive bound; reaching or exceeding it stops the session.
    pub take_profit: Decimal,
}

// ---------------------------------------------------------------------------
// Settlement record
// ---------------------------------------------------------------------------

/// What a single settled bet did to the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub bet_number: u64,
    pub outcome: Outcome,
    /// Signed amount applied to session profit.
    pub delta: Decimal,
    pub session_profit: Decimal,
}

// ---------------------------------------------------------------------------
// Accountant
// ---------------------------------------------------------------------------

pub struct Accountant;

impl Accountant {
    /// Apply a settled bet to the session.
    ///
    /// A win credits the reported profit as-is. A loss debits `staked`, the
    /// amount actually submitted, whatever the house put in its profit field.
    pub fn settle(session: &mut Session, result: &BetResult, staked: Decimal) -> Settlement {
        let delta = match result.outcome {
            Outcome::Win => {
                session.win_count += 1;
                result.profit
            }
            Outcome::Lose => {
                session.lose_count += 1;
                -staked
            }
        };

        session.session_profit += delta;
        session.bet_count += 1;

        Settlement {
            bet_number: session.bet_count,
            outcome: result.outcome,
            delta,
            session_profit: session.session_profit,
        }
    }

    /// Check the stop bounds. Stop-loss is evaluated first and wins ties.
    pub fn check_stop(session: &Session, bounds: &StopBounds) -> Option<StopReason> {
        let reason = if session.session_profit <= bounds.stop_loss {
            StopReason::StopLoss
        } else if session.session_profit >= bounds.take_profit {
            StopReason::TakeProfit
        } else {
            return None;
        };

        info!(
            reason = %reason,
            session_profit = %session.session_profit,
            stop_loss = %bounds.stop_loss,
            take_profit = %bounds.take_profit,
            "Stop condition reached"
        );
        Some(reason)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
