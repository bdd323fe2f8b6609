//! Wolf.bet dice integration.
//!
//! Live betting against the Wolf.bet REST API.
//!
//! API docs: https://docs.wolf.bet
//! Base URL: https://wolfbet.com/api/v1
//! Auth: `Authorization: Bearer {access_token}`
//! Rate limit: reported per response in `x-ratelimit-limit` and
//! `x-ratelimit-remaining`; the documented pause once exhausted is 60s.
//!
//! Numeric request fields are sent as strings, matching the documented
//! curl samples. Response numerics arrive as either strings or numbers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::DicePlatform;
use crate::types::{
    de_lenient_decimal, de_lenient_decimal_opt, BetOutcome, BetRequest, BetResponse, BetResult,
    DiceBotError, Outcome, RateLimit,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://wolfbet.com/api/v1";
const PLATFORM_NAME: &str = "wolfbet";
const GAME: &str = "dice";

const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// How much of an error body to keep in logs.
const BODY_PREVIEW_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// API types (Wolf.bet JSON → Rust)
// ---------------------------------------------------------------------------

/// `GET /user/balances`
#[derive(Debug, Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<BalanceEntry>,
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    #[serde(default)]
    currency: String,
    #[serde(default, deserialize_with = "de_lenient_decimal_opt")]
    amount: Option<Decimal>,
}

/// `POST /bet/place` request body.
#[derive(Debug, Serialize)]
struct PlaceBetPayload<'a> {
    currency: &'a str,
    game: &'static str,
    amount: String,
    rule: &'static str,
    multiplier: String,
    bet_value: String,
}

impl<'a> From<&'a BetRequest> for PlaceBetPayload<'a> {
    fn from(req: &'a BetRequest) -> Self {
        Self {
            currency: &req.currency,
            game: GAME,
            amount: req.amount.normalize().to_string(),
            rule: req.rule.as_str(),
            multiplier: req.multiplier.normalize().to_string(),
            bet_value: req.threshold.normalize().to_string(),
        }
    }
}

/// The `bet` object of a successful placement.
#[derive(Debug, Deserialize)]
struct WolfBet {
    #[serde(default)]
    state: String,
    #[serde(default, deserialize_with = "de_lenient_decimal")]
    profit: Decimal,
    #[serde(default, deserialize_with = "de_lenient_decimal_opt")]
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "de_lenient_decimal")]
    result_value: Decimal,
}

/// The `user_balance` object of a successful placement.
#[derive(Debug, Deserialize)]
struct UserBalance {
    #[serde(default, deserialize_with = "de_lenient_decimal_opt")]
    amount: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Wolf.bet platform client.
#[derive(Debug)]
pub struct WolfBetClient {
    http: Client,
    base_url: String,
}

impl WolfBetClient {
    /// Create a new client. The token is baked into the default headers.
    pub fn new(access_token: &SecretString, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let token = access_token.expose_secret().trim();
        if token.is_empty() {
            return Err(DiceBotError::Config("Wolf.bet access token is empty".into()).into());
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("Access token is not a valid header value")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Sent by the official curl sample; some CDN edges reject requests without it.
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent("DICEBOT/0.1.0")
            .build()
            .context("Failed to build HTTP client for Wolf.bet")?;

        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        info!(base_url = %base_url, "Wolf.bet client ready");
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl DicePlatform for WolfBetClient {
    async fn get_balance(&self, currency: &str) -> Result<Decimal> {
        let url = self.url("/user/balances");
        debug!(url = %url, "Fetching Wolf.bet balances");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Wolf.bet balances request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("Failed to read Wolf.bet balances response")?;

        if !status.is_success() {
            debug!(status = %status, body = %preview(&body), "Wolf.bet balances HTTP error");
        }

        balance_from_response(status, &body, currency)
    }

    async fn place_bet(&self, request: &BetRequest) -> Result<BetResponse> {
        let url = self.url("/bet/place");
        let payload = PlaceBetPayload::from(request);

        let resp = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Wolf.bet bet request failed")?;

        let rate_limit = parse_rate_limit(resp.headers());
        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("Failed to read Wolf.bet bet response")?;

        if !status.is_success() {
            debug!(status = %status, body = %preview(&body), "Wolf.bet bet HTTP error");
        }

        let outcome = parse_bet_body(&body)?;
        Ok(BetResponse { outcome, rate_limit })
    }

    fn name(&self) -> &'static str {
        PLATFORM_NAME
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Non-2xx is an API error; otherwise look the currency up in the body.
fn balance_from_response(status: StatusCode, body: &str, currency: &str) -> Result<Decimal> {
    if !status.is_success() {
        return Err(DiceBotError::Api(format!(
            "balances request returned {status}: {}",
            preview(body)
        ))
        .into());
    }
    find_balance(body, currency)
}

/// Pick `currency` out of a `/user/balances` body, case-insensitively.
fn find_balance(body: &str, currency: &str) -> Result<Decimal> {
    let parsed: BalancesResponse = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse Wolf.bet balances: {}", preview(body)))?;

    parsed
        .balances
        .into_iter()
        .find(|b| b.currency.eq_ignore_ascii_case(currency))
        .and_then(|b| b.amount)
        .with_context(|| format!("No {currency} balance in Wolf.bet response"))
}

/// Read both rate-limit headers. `None` when neither is present.
fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimit> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok())
    };

    let rl = RateLimit {
        limit: read(RATE_LIMIT_LIMIT),
        remaining: read(RATE_LIMIT_REMAINING),
    };

    if rl.limit.is_none() && rl.remaining.is_none() {
        None
    } else {
        Some(rl)
    }
}

/// Interpret a `/bet/place` body.
///
/// A `bet` object means the bet settled; anything else that is valid JSON
/// is a structured rejection. Invalid JSON is an error.
fn parse_bet_body(body: &str) -> Result<BetOutcome> {
    let value: serde_json::Value = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse Wolf.bet bet response: {}", preview(body)))?;

    let bet = match value.get("bet") {
        Some(bet) if !bet.is_null() => bet,
        _ => {
            let message = match value.get("error") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(err) if !err.is_null() => err.to_string(),
                _ => value.to_string(),
            };
            return Ok(BetOutcome::Rejected(message));
        }
    };

    let bet: WolfBet =
        serde_json::from_value(bet.clone()).context("Failed to parse Wolf.bet bet object")?;

    let new_balance = value
        .get("user_balance")
        .and_then(|ub| serde_json::from_value::<UserBalance>(ub.clone()).ok())
        .and_then(|ub| ub.amount);

    Ok(BetOutcome::Settled(BetResult {
        outcome: Outcome::from_state(&bet.state),
        profit: bet.profit,
        amount: bet.amount,
        rolled_value: bet.result_value,
        new_balance,
    }))
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
