//! End-to-end session scenarios through the public API.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;
use tokio_test::assert_ok;

use dicebot::config::AppConfig;
use dicebot::engine::session::{BettingSession, SessionConfig, RATE_LIMIT_PAUSE};
use dicebot::strategy::threshold::ScriptedRuleChooser;
use dicebot::types::{DiceBotError, Rule, RuleMode, StopReason};

use crate::mock_platform::{RecordingPauser, Reply, ScriptedPlatform};

fn config() -> SessionConfig {
    SessionConfig {
        currency: "btc".into(),
        base_bet: dec!(0.00000001),
        progression_factor: dec!(2.0),
        max_bet: dec!(0.0001),
        win_chance: dec!(49.5),
        rule_mode: RuleMode::Auto,
        take_profit: dec!(0.0005),
        stop_loss: dec!(-0.0005),
        cooldown: Duration::from_secs(1),
    }
}

fn session<'a>(
    platform: &'a ScriptedPlatform,
    cfg: SessionConfig,
    rules: Vec<Rule>,
    pauser: &RecordingPauser,
) -> BettingSession<'a> {
    BettingSession::with_parts(
        platform,
        cfg,
        Box::new(ScriptedRuleChooser::new(rules)),
        Box::new(pauser.clone()),
    )
}

#[tokio::test]
async fn lose_lose_win_then_take_profit() {
    let mut cfg = config();
    cfg.take_profit = dec!(0.00000001);
    let platform = ScriptedPlatform::new(
        dec!(0.001),
        vec![
            Reply::Lose { remaining: Some(10) },
            Reply::Lose { remaining: Some(9) },
            Reply::Win { profit: dec!(0.00000004), remaining: Some(8) },
        ],
    );
    let pauser = RecordingPauser::default();

    let summary = assert_ok!(
        session(&platform, cfg, vec![Rule::Under, Rule::Over], &pauser)
            .run()
            .await
    );

    assert_eq!(
        platform.amounts(),
        vec![dec!(0.00000001), dec!(0.00000002), dec!(0.00000004)]
    );
    assert_eq!(
        summary.final_profit,
        dec!(-0.00000001) - dec!(0.00000002) + dec!(0.00000004)
    );
    assert_eq!(summary.stop_reason, StopReason::TakeProfit);
    assert_eq!((summary.bet_count, summary.win_count, summary.lose_count), (3, 1, 2));
    assert_eq!(summary.starting_balance, dec!(0.001));

    // Auto mode alternated per the injected chooser.
    let rules: Vec<Rule> = platform.requests().iter().map(|r| r.rule).collect();
    assert_eq!(rules, vec![Rule::Under, Rule::Over, Rule::Under]);
    let thresholds: Vec<Decimal> = platform.requests().iter().map(|r| r.threshold).collect();
    assert_eq!(thresholds, vec![dec!(49.5), dec!(50.5), dec!(49.5)]);
    assert!(platform.requests().iter().all(|r| r.multiplier == dec!(2)));
}

#[tokio::test]
async fn win_after_progression_resets_next_stake() {
    let mut cfg = config();
    cfg.take_profit = dec!(0.00000002);
    let platform = ScriptedPlatform::new(
        dec!(0.001),
        vec![
            Reply::Lose { remaining: None },
            Reply::Lose { remaining: None },
            Reply::Win { profit: dec!(0.00000004), remaining: None },
            Reply::Win { profit: dec!(0.00000001), remaining: None },
        ],
    );
    let pauser = RecordingPauser::default();
    let summary = assert_ok!(session(&platform, cfg, vec![Rule::Under], &pauser).run().await);

    assert_eq!(platform.amounts()[3], dec!(0.00000001));
    assert_eq!(summary.final_profit, dec!(0.00000002));
    assert_eq!(summary.stop_reason, StopReason::TakeProfit);
}

#[tokio::test]
async fn rate_limit_exhaustion_sleeps_sixty_seconds() {
    let mut cfg = config();
    cfg.cooldown = Duration::from_secs(3);
    cfg.stop_loss = dec!(-0.00000003);
    let platform = ScriptedPlatform::new(
        dec!(0.001),
        vec![
            Reply::Lose { remaining: Some(0) },
            Reply::Lose { remaining: Some(59) },
        ],
    );
    let pauser = RecordingPauser::default();
    let summary = assert_ok!(session(&platform, cfg, vec![Rule::Over], &pauser).run().await);

    assert_eq!(summary.stop_reason, StopReason::StopLoss);
    assert_eq!(pauser.pauses(), vec![RATE_LIMIT_PAUSE, Duration::from_secs(3)]);
    assert_eq!(RATE_LIMIT_PAUSE, Duration::from_secs(60));
}

#[tokio::test]
async fn retries_are_unbounded_and_do_not_touch_the_tally() {
    let mut cfg = config();
    cfg.take_profit = dec!(0.00000001);
    let mut replies: Vec<Reply> = (0..25)
        .map(|i| {
            if i % 2 == 0 {
                Reply::NetworkError("timeout".into())
            } else {
                Reply::Rejected("Too many requests".into())
            }
        })
        .collect();
    replies.push(Reply::Win { profit: dec!(0.00000001), remaining: None });

    let platform = ScriptedPlatform::new(dec!(0.001), replies);
    let pauser = RecordingPauser::default();
    let summary = assert_ok!(session(&platform, cfg, vec![Rule::Under], &pauser).run().await);

    assert_eq!(summary.bet_count, 1);
    assert_eq!(summary.win_count, 1);
    assert_eq!(summary.final_profit, dec!(0.00000001));
    assert_eq!(platform.amounts(), vec![dec!(0.00000001); 26]);
    assert_eq!(pauser.pauses(), vec![Duration::from_secs(1); 26]);
}

#[tokio::test]
async fn stop_loss_precedes_take_profit_on_the_way_down() {
    let mut cfg = config();
    cfg.base_bet = dec!(0.0002);
    cfg.max_bet = dec!(0.01);
    let platform = ScriptedPlatform::new(
        dec!(0.01),
        vec![
            Reply::Lose { remaining: None },
            Reply::Lose { remaining: None },
            Reply::Win { profit: dec!(0.01), remaining: None },
        ],
    );
    let pauser = RecordingPauser::default();
    let summary = assert_ok!(session(&platform, cfg, vec![Rule::Under], &pauser).run().await);

    // -0.0002 - 0.0004 crosses -0.0005 before the win could land.
    assert_eq!(summary.stop_reason, StopReason::StopLoss);
    assert_eq!(summary.final_profit, dec!(-0.0006));
    assert_eq!(platform.requests().len(), 2);
}

#[tokio::test]
async fn ceiling_guard_resets_stake_mid_session() {
    let mut cfg = config();
    cfg.max_bet = dec!(0.00000004);
    cfg.stop_loss = dec!(-1);
    cfg.take_profit = dec!(0.00000001);
    let platform = ScriptedPlatform::new(
        dec!(0.001),
        vec![
            Reply::Lose { remaining: None },
            Reply::Lose { remaining: None },
            Reply::Lose { remaining: None },
            // Stake would be 8e-8 > max_bet: guard resets it.
            Reply::Win { profit: dec!(0.00000008), remaining: None },
        ],
    );
    let pauser = RecordingPauser::default();
    let summary = assert_ok!(session(&platform, cfg, vec![Rule::Under], &pauser).run().await);

    assert_eq!(
        platform.amounts(),
        vec![dec!(0.00000001), dec!(0.00000002), dec!(0.00000004), dec!(0.00000001)]
    );
    assert_eq!(summary.final_profit, dec!(0.00000001));
}

#[tokio::test]
async fn unreadable_balance_ends_session_before_betting() {
    let platform = ScriptedPlatform::without_balance();
    let pauser = RecordingPauser::default();
    let err = session(&platform, config(), vec![Rule::Under], &pauser)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DiceBotError>(),
        Some(DiceBotError::BalanceUnavailable { .. })
    ));
    assert!(platform.requests().is_empty());
    assert!(pauser.pauses().is_empty());
}

#[tokio::test]
async fn config_file_drives_the_session() {
    let cfg = AppConfig::from_toml(
        r#"
        [strategy]
        currency = "BTC"
        base_bet = 0.00000001
        progression_factor = 2
        max_bet = 0.0001
        win_chance = 25
        rule_mode = "over"
        take_profit = 0.00000003
        stop_loss = -0.0005
        cooldown_secs = 0
        "#,
    )
    .unwrap();

    let platform = ScriptedPlatform::new(
        dec!(0.5),
        vec![Reply::Win { profit: dec!(0.00000003), remaining: None }],
    );
    let pauser = RecordingPauser::default();
    let summary = assert_ok!(
        session(&platform, cfg.session_config(), vec![Rule::Under], &pauser)
            .run()
            .await
    );

    let req = &platform.requests()[0];
    assert_eq!(req.currency, "btc");
    assert_eq!(req.rule, Rule::Over);
    assert_eq!(req.threshold, dec!(75));
    assert_eq!(req.multiplier, dec!(3.96));
    assert_eq!(summary.stop_reason, StopReason::TakeProfit);
    assert_eq!(pauser.pauses(), vec![Duration::ZERO]);
}
