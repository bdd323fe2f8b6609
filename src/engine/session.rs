//! Betting session — the STARTING → BETTING → STOPPED loop.
//!
//! One session reads the starting balance, then repeatedly checks the stop
//! bounds, plans a bet, submits it, settles it into the session and sleeps
//! before the next iteration. Everything runs sequentially on one task.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::engine::accountant::{Accountant, Settlement, StopBounds};
use crate::platforms::DicePlatform;
use crate::strategy::martingale::{SizerConfig, StakeSizer};
use crate::strategy::threshold::{RandomRuleChooser, RuleChooser, ThresholdConverter};
use crate::strategy::MartingaleStrategy;
use crate::types::{
    BetOutcome, DiceBotError, Outcome, RuleMode, Session, SessionSummary, StopReason,
};

/// Pause after the house reports an exhausted rate-limit window. Fixed,
/// independent of the configured cooldown.
pub const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Immutable inputs for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub currency: String,
    pub base_bet: Decimal,
    pub progression_factor: Decimal,
    pub max_bet: Decimal,
    pub win_chance: Decimal,
    pub rule_mode: RuleMode,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub cooldown: Duration,
}

impl SessionConfig {
    pub fn bounds(&self) -> StopBounds {
        StopBounds {
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
        }
    }

    pub fn sizer_config(&self) -> SizerConfig {
        SizerConfig {
            base_bet: self.base_bet,
            progression_factor: self.progression_factor,
            max_bet: self.max_bet,
        }
    }
}

// ---------------------------------------------------------------------------
// Pausing
// ---------------------------------------------------------------------------

/// Blocking wait between iterations.
#[async_trait]
pub trait Pauser: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPauser;

#[async_trait]
impl Pauser for TokioPauser {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// Result of one BETTING iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A stop bound was reached before betting.
    Stopped(StopReason),
    /// The bet settled; wait `pause` before the next one.
    Settled { settlement: Settlement, pause: Duration },
    /// Nothing settled; session state is untouched. Wait `pause` and retry.
    Retry { reason: String, pause: Duration },
}

impl Step {
    /// How long to wait before the next iteration, if there is one.
    pub fn pause(&self) -> Option<Duration> {
        match self {
            Step::Stopped(_) => None,
            Step::Settled { pause, .. } | Step::Retry { pause, .. } => Some(*pause),
        }
    }
}

// ---------------------------------------------------------------------------
// Session runner
// ---------------------------------------------------------------------------

pub struct BettingSession<'a> {
    platform: &'a dyn DicePlatform,
    strategy: MartingaleStrategy,
    pauser: Box<dyn Pauser>,
    config: SessionConfig,
}

impl<'a> BettingSession<'a> {
    /// Session with a random `auto` chooser and real sleeps.
    pub fn new(platform: &'a dyn DicePlatform, config: SessionConfig) -> Self {
        Self::with_parts(platform, config, Box::new(RandomRuleChooser), Box::new(TokioPauser))
    }

    /// Session with injected rule choice and pausing.
    pub fn with_parts(
        platform: &'a dyn DicePlatform,
        config: SessionConfig,
        chooser: Box<dyn RuleChooser>,
        pauser: Box<dyn Pauser>,
    ) -> Self {
        let converter = ThresholdConverter::with_chooser(config.win_chance, config.rule_mode, chooser);
        let sizer = StakeSizer::new(config.sizer_config());
        Self {
            platform,
            strategy: MartingaleStrategy::new(converter, sizer),
            pauser,
            config,
        }
    }

    /// STARTING: read the starting balance and open a fresh session.
    ///
    /// Fails with [`DiceBotError::BalanceUnavailable`] if the balance can't
    /// be read. There is no retry.
    pub async fn start(&self) -> Result<Session> {
        let currency = &self.config.currency;
        let balance = match self.platform.get_balance(currency).await {
            Ok(b) => b,
            Err(e) => {
                error!(
                    platform = self.platform.name(),
                    currency = %currency,
                    error = %format!("{e:#}"),
                    "Could not read balance, check the access token and endpoint. Session ended."
                );
                return Err(e.context(DiceBotError::BalanceUnavailable {
                    currency: currency.clone(),
                }));
            }
        };

        info!(
            platform = self.platform.name(),
            balance = format!("{:.8}", balance),
            currency = %currency.to_uppercase(),
            "Starting balance"
        );

        Ok(Session::new(currency, balance, self.config.base_bet))
    }

    /// BETTING: one iteration. Does not sleep; the returned step says how
    /// long to wait.
    pub async fn step(&mut self, session: &mut Session) -> Step {
        if let Some(reason) = Accountant::check_stop(session, &self.config.bounds()) {
            return Step::Stopped(reason);
        }

        let planned = self.strategy.plan_bet(session);
        let request = planned.request;

        info!(
            rule = %request.rule,
            threshold = format!("{:.2}", request.threshold),
            amount = format!("{:.8}", request.amount),
            currency = %request.currency,
            multiplier = %request.multiplier.normalize(),
            ceiling_reset = planned.ceiling_reset,
            "BET"
        );

        let response = match self.platform.place_bet(&request).await {
            Ok(r) => r,
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(error = %reason, "No bet data (network/parse), retrying after cooldown");
                return Step::Retry {
                    reason,
                    pause: self.config.cooldown,
                };
            }
        };

        if let Some(rl) = response.rate_limit {
            debug!(remaining = ?rl.remaining, limit = ?rl.limit, "Rate-limit");
        }

        let result = match response.outcome {
            BetOutcome::Settled(result) => result,
            BetOutcome::Rejected(reason) => {
                warn!(error = %reason, "Bet rejected, retrying after cooldown");
                return Step::Retry {
                    reason,
                    pause: self.config.cooldown,
                };
            }
        };

        let staked = request.amount;
        let settlement = Accountant::settle(session, &result, staked);
        self.strategy.advance(session, result.outcome, staked);

        match result.outcome {
            Outcome::Win => info!(
                roll = %result.rolled_value,
                profit = format!("+{:.8}", settlement.delta),
                session = format!("{:.8}", session.session_profit),
                "WIN"
            ),
            Outcome::Lose => info!(
                roll = %result.rolled_value,
                loss = format!("{:.8}", settlement.delta),
                session = format!("{:.8}", session.session_profit),
                "LOSE"
            ),
        }

        if let Some(balance) = result.new_balance {
            debug!(balance = format!("{:.8}", balance), "New balance");
        }

        let pause = if response.rate_limit.is_some_and(|rl| rl.is_exhausted()) {
            warn!(pause_secs = RATE_LIMIT_PAUSE.as_secs(), "Rate limit exhausted, pausing");
            RATE_LIMIT_PAUSE
        } else {
            self.config.cooldown
        };

        Step::Settled { settlement, pause }
    }

    /// Run the whole session to a stop condition.
    pub async fn run(&mut self) -> Result<SessionSummary> {
        let span = info_span!("session", id = %Uuid::new_v4());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&mut self) -> Result<SessionSummary> {
        info!(
            platform = self.platform.name(),
            currency = %self.config.currency,
            base_bet = %self.config.base_bet,
            max_bet = %self.config.max_bet,
            win_chance = %self.config.win_chance,
            rule_mode = %self.config.rule_mode,
            "Session starting"
        );

        let mut session = self.start().await?;

        loop {
            match self.step(&mut session).await {
                Step::Settled { pause, .. } | Step::Retry { pause, .. } => {
                    self.pauser.pause(pause).await
                }
                Step::Stopped(reason) => {
                    let summary = session.summary(reason);
                    info!(
                        reason = %summary.stop_reason,
                        starting_balance = %summary.starting_balance,
                        final_profit = format!("{:.8}", summary.final_profit),
                        bets = summary.bet_count,
                        wins = summary.win_count,
                        losses = summary.lose_count,
                        "Session stopped"
                    );
                    return Ok(summary);
                }
            }
        }
    }
}

/// Run one session against `platform` with real sleeps and random `auto`
/// rule selection.
pub async fn run_session(platform: &dyn DicePlatform, config: SessionConfig) -> Result<SessionSummary> {
    BettingSession::new(platform, config).run().await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
