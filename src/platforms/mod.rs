//! Platform integrations.
//!
//! Defines the `DicePlatform` trait and provides implementations for:
//! - Wolf.bet — live dice betting over its REST API
//! - Paper — in-memory simulated dice for dry runs

pub mod paper;
pub mod wolfbet;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{BetRequest, BetResponse};

/// Abstraction over a house that offers the dice game.
///
/// `place_bet` returns `Err` for transport or parse failures. A response
/// that reached the house but carries no bet is `Ok` with
/// [`BetOutcome::Rejected`](crate::types::BetOutcome::Rejected).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DicePlatform: Send + Sync {
    /// Balance held in `currency`.
    async fn get_balance(&self, currency: &str) -> Result<Decimal>;

    /// Submit one dice bet.
    async fn place_bet(&self, request: &BetRequest) -> Result<BetResponse>;

    /// Platform name for logging and identification.
    fn name(&self) -> &'static str;
}
