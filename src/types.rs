//! Shared types for DICEBOT.
//!
//! Bet parameters, settled results, session summaries and the domain
//! error enum used across the crate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Comparison direction for a dice bet.
///
/// `Under` wins when the roll lands below the threshold, `Over` when it
/// lands above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Over,
    Under,
}

impl Rule {
    /// Wire value expected by the betting API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Over => "over",
            Rule::Under => "under",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Over => write!(f, "OVER"),
            Rule::Under => write!(f, "UNDER"),
        }
    }
}

/// How the rule is picked for each bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleMode {
    /// Coin-flip between over and under on every bet.
    #[default]
    Auto,
    Over,
    Under,
}

impl From<String> for RuleMode {
    /// Case-insensitive; anything unrecognised falls back to `Auto`.
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "over" => RuleMode::Over,
            "under" => RuleMode::Under,
            _ => RuleMode::Auto,
        }
    }
}

impl From<RuleMode> for String {
    fn from(mode: RuleMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for RuleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleMode::Auto => write!(f, "auto"),
            RuleMode::Over => write!(f, "over"),
            RuleMode::Under => write!(f, "under"),
        }
    }
}

/// Settled outcome of a single bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    /// Map the API `state` field. Only `"win"` counts as a win.
    pub fn from_state(state: &str) -> Self {
        if state.eq_ignore_ascii_case("win") {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "WIN"),
            Outcome::Lose => write!(f, "LOSE"),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::StopLoss => write!(f, "stop-loss"),
            StopReason::TakeProfit => write!(f, "take-profit"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bets
// ---------------------------------------------------------------------------

/// Decimal places a submitted stake is rounded to (satoshi precision).
pub const CURRENCY_DP: u32 = 8;

/// One wager, fully parameterised for submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetRequest {
    pub currency: String,
    pub amount: Decimal,
    pub rule: Rule,
    pub threshold: Decimal,
    pub multiplier: Decimal,
}

impl fmt::Display for BetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2} | amt={:.8} {} | mult={}",
            self.rule,
            self.threshold,
            self.amount,
            self.currency,
            self.multiplier.normalize(),
        )
    }
}

/// A settled bet as reported by the house.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetResult {
    pub outcome: Outcome,
    /// Profit credited by the house. Only authoritative on a win.
    pub profit: Decimal,
    /// Stake echoed back by the house, if any.
    pub amount: Option<Decimal>,
    pub rolled_value: Decimal,
    pub new_balance: Option<Decimal>,
}

/// Rate-limit headers attached to an API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RateLimit {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
}

impl RateLimit {
    /// True when the house reports no calls left in the current window.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// What came back from a bet submission that reached the house.
#[derive(Debug, Clone, PartialEq)]
pub enum BetOutcome {
    Settled(BetResult),
    /// Structured error payload with no bet attached (400/422 and friends).
    Rejected(String),
}

/// Full response from `place_bet`: the outcome plus any rate-limit signal.
#[derive(Debug, Clone, PartialEq)]
pub struct BetResponse {
    pub outcome: BetOutcome,
    pub rate_limit: Option<RateLimit>,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Mutable state of one betting session, owned by the loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub currency: String,
    pub starting_balance: Decimal,
    /// Stake for the next bet.
    pub current_bet: Decimal,
    /// Signed running profit. Only ever adjusted by deltas.
    pub session_profit: Decimal,
    pub bet_count: u64,
    pub win_count: u64,
    pub lose_count: u64,
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session: zero profit, stake at `base_bet`.
    pub fn new(currency: &str, starting_balance: Decimal, base_bet: Decimal) -> Self {
        Self {
            currency: currency.to_string(),
            starting_balance,
            current_bet: base_bet,
            session_profit: Decimal::ZERO,
            bet_count: 0,
            win_count: 0,
            lose_count: 0,
            started_at: Utc::now(),
        }
    }

    /// Close out the session with the given reason.
    pub fn summary(&self, stop_reason: StopReason) -> SessionSummary {
        SessionSummary {
            currency: self.currency.clone(),
            starting_balance: self.starting_balance,
            final_profit: self.session_profit,
            bet_count: self.bet_count,
            win_count: self.win_count,
            lose_count: self.lose_count,
            stop_reason,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session summary
// ---------------------------------------------------------------------------

/// Final tally reported when a session stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub currency: String,
    pub starting_balance: Decimal,
    pub final_profit: Decimal,
    pub bet_count: u64,
    pub win_count: u64,
    pub lose_count: u64,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Fraction of settled bets that were wins, in percent.
    pub fn win_rate(&self) -> f64 {
        if self.bet_count == 0 {
            return 0.0;
        }
        self.win_count as f64 / self.bet_count as f64 * 100.0
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cur = self.currency.to_uppercase();
        write!(
            f,
            "{} | start={:.8} {cur} | profit={:.8} {cur} | bets={} (W{}/L{}) | win_rate={:.1}%",
            self.stop_reason,
            self.starting_balance,
            self.final_profit,
            self.bet_count,
            self.win_count,
            self.lose_count,
            self.win_rate(),
        )
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deserialize a decimal that the API may send as a string, a number or
/// `null`. Missing and `null` both become zero.
pub fn de_lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_to_decimal).unwrap_or(Decimal::ZERO))
}

/// Like [`de_lenient_decimal`] but keeps absence as `None`.
pub fn de_lenient_decimal_opt<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(value_to_decimal))
}

fn value_to_decimal(v: &serde_json::Value) -> Option<Decimal> {
    match v {
        serde_json::Value::Number(n) => {
            let s = n.to_string();
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
        }
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for DICEBOT.
#[derive(Debug, thiserror::Error)]
pub enum DiceBotError {
    #[error("Could not read starting balance for {currency}")]
    BalanceUnavailable { currency: String },

    #[error("Access token missing: set the {0} environment variable")]
    MissingToken(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
