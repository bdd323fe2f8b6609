//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The API access token is referenced by env-var name in the config and
//! resolved at runtime, never stored in the file.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::engine::session::SessionConfig;
use crate::types::{DiceBotError, RuleMode};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub access_token_env: String,
    pub timeout_secs: u64,
    /// Bet against the in-memory paper platform instead of the live API.
    pub dry_run: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wolfbet.com/api/v1".to_string(),
            access_token_env: "WOLFBET_ACCESS_TOKEN".to_string(),
            timeout_secs: 20,
            dry_run: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyConfig {
    pub currency: String,
    pub base_bet: Decimal,
    /// Stake multiplier applied after each loss.
    pub progression_factor: Decimal,
    pub max_bet: Decimal,
    /// Win chance in percent. Clamped to [0.01, 99.99] when converted.
    pub win_chance: Decimal,
    pub rule_mode: RuleMode,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    pub cooldown_secs: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            currency: "btc".to_string(),
            base_bet: dec!(0.00000001),
            progression_factor: dec!(2.0),
            max_bet: dec!(0.0001),
            win_chance: dec!(49.5),
            rule_mode: RuleMode::Auto,
            take_profit: dec!(0.0005),
            stop_loss: dec!(-0.0005),
            cooldown_secs: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PaperConfig {
    pub starting_balance: Decimal,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            starting_balance: dec!(0.001),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Per-bet diagnostics (rate-limit counters, balances, raw errors).
    pub debug: bool,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: true,
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.strategy.currency = config.strategy.currency.trim().to_lowercase();
        if config.strategy.currency.is_empty() {
            return Err(DiceBotError::Config("strategy.currency is empty".into()).into());
        }
        cooldown_from_secs(config.strategy.cooldown_secs)?;
        Ok(config)
    }

    /// Resolve the API access token from the environment.
    pub fn access_token(&self) -> Result<SecretString> {
        let env_name = &self.api.access_token_env;
        match std::env::var(env_name) {
            Ok(token) if !token.trim().is_empty() => Ok(SecretString::new(token.trim().to_string())),
            _ => Err(DiceBotError::MissingToken(env_name.clone()).into()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// The immutable per-session view of the strategy settings.
    pub fn session_config(&self) -> SessionConfig {
        let s = &self.strategy;
        SessionConfig {
            currency: s.currency.clone(),
            base_bet: s.base_bet,
            progression_factor: s.progression_factor,
            max_bet: s.max_bet,
            win_chance: s.win_chance,
            rule_mode: s.rule_mode,
            take_profit: s.take_profit,
            stop_loss: s.stop_loss,
            cooldown: cooldown_from_secs(s.cooldown_secs).unwrap_or(Duration::ZERO),
        }
    }
}

/// Negative cooldowns mean no wait. Infinite or oversized ones are rejected.
fn cooldown_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs.max(0.0)).map_err(|e| {
        DiceBotError::Config(format!("strategy.cooldown_secs = {secs} is out of range: {e}")).into()
    })
}
