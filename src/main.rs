//! DICEBOT — Martingale session runner for Wolf.bet dice
//!
//! Entry point. Loads configuration, initialises structured logging,
//! picks the live or paper platform, and runs one betting session until a
//! stop bound is hit or Ctrl+C is pressed.

use anyhow::Result;
use tracing::{error, info, warn};

use dicebot::config;
use dicebot::engine::session::run_session;
use dicebot::platforms::paper::PaperPlatform;
use dicebot::platforms::wolfbet::WolfBetClient;
use dicebot::platforms::DicePlatform;

const BANNER: &str = r#"
 ____ ___ ____ _____ ____   ___ _____
|  _ \_ _/ ___| ____| __ ) / _ \_   _|
| | | | | |   |  _| |  _ \| | | || |
| |_| | | |___| |___| |_) | |_| || |
|____/___\____|_____|____/ \___/ |_|

  Wolf.bet auto dice — martingale
  v0.1.0
"#;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging(&cfg);

    println!("{BANNER}");
    info!(
        config = %config_path,
        currency = %cfg.strategy.currency,
        base_bet = %cfg.strategy.base_bet,
        rule_mode = %cfg.strategy.rule_mode,
        dry_run = cfg.api.dry_run,
        "DICEBOT starting up"
    );

    // -- Platform --------------------------------------------------------

    let platform: Box<dyn DicePlatform> = if cfg.api.dry_run {
        warn!(
            starting_balance = %cfg.paper.starting_balance,
            "Dry-run mode: betting against the paper platform"
        );
        Box::new(PaperPlatform::new(&cfg.strategy.currency, cfg.paper.starting_balance))
    } else {
        let token = cfg.access_token()?;
        Box::new(WolfBetClient::new(&token, Some(&cfg.api.base_url), cfg.timeout())?)
    };

    // -- Session ---------------------------------------------------------

    let session = run_session(&*platform, cfg.session_config());
    let shutdown = tokio::signal::ctrl_c();

    tokio::select! {
        outcome = session => match outcome {
            Ok(summary) => {
                println!("{summary}");
                info!(summary = ?summary, "DICEBOT finished.");
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Session aborted");
                return Err(e);
            }
        },
        _ = shutdown => {
            info!("Shutdown signal received. Session abandoned.");
        }
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if cfg.logging.debug {
        "dicebot=debug"
    } else {
        "dicebot=info"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json_logging = cfg.logging.json || std::env::var("DICEBOT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
