//! Scripted dice platform for integration testing.
//!
//! Provides a deterministic `DicePlatform` implementation that serves a
//! queue of canned bet responses and records every request — all in-memory
//! with no external dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dicebot::engine::session::Pauser;
use dicebot::platforms::DicePlatform;
use dicebot::types::*;

/// One scripted reply to `place_bet`.
pub enum Reply {
    Win { profit: Decimal, remaining: Option<u32> },
    Lose { remaining: Option<u32> },
    Rejected(String),
    NetworkError(String),
}

/// A dice platform driven entirely by test code.
pub struct ScriptedPlatform {
    balance: Option<Decimal>,
    replies: Mutex<VecDeque<Reply>>,
    requests: Arc<Mutex<Vec<BetRequest>>>,
}

impl ScriptedPlatform {
    pub fn new(balance: Decimal, replies: Vec<Reply>) -> Self {
        Self {
            balance: Some(balance),
            replies: Mutex::new(replies.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A platform whose balance endpoint always fails.
    pub fn without_balance() -> Self {
        Self {
            balance: None,
            replies: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request submitted so far.
    pub fn requests(&self) -> Vec<BetRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Stakes submitted so far, in order.
    pub fn amounts(&self) -> Vec<Decimal> {
        self.requests().iter().map(|r| r.amount).collect()
    }
}

fn rate_limit(remaining: Option<u32>) -> Option<RateLimit> {
    remaining.map(|r| RateLimit {
        limit: Some(60),
        remaining: Some(r),
    })
}

#[async_trait]
impl DicePlatform for ScriptedPlatform {
    async fn get_balance(&self, currency: &str) -> Result<Decimal> {
        self.balance
            .ok_or_else(|| anyhow!("balance endpoint unavailable for {currency}"))
    }

    async fn place_bet(&self, request: &BetRequest) -> Result<BetResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))?;

        let settled = |outcome, profit, remaining| BetResponse {
            outcome: BetOutcome::Settled(BetResult {
                outcome,
                profit,
                amount: Some(request.amount),
                rolled_value: Decimal::new(5000, 2),
                new_balance: None,
            }),
            rate_limit: rate_limit(remaining),
        };

        match reply {
            Reply::Win { profit, remaining } => Ok(settled(Outcome::Win, profit, remaining)),
            Reply::Lose { remaining } => Ok(settled(Outcome::Lose, Decimal::ZERO, remaining)),
            Reply::Rejected(msg) => Ok(BetResponse {
                outcome: BetOutcome::Rejected(msg),
                rate_limit: None,
            }),
            Reply::NetworkError(msg) => Err(anyhow!(msg)),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Clone, Default)]
pub struct RecordingPauser {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPauser {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pauser for RecordingPauser {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}
