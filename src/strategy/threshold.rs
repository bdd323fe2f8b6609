//! Win-chance → bet parameter conversion.
//!
//! Turns a configured win chance (percent) and rule mode into the
//! `(rule, threshold, multiplier)` triple the dice API accepts. The payout
//! multiplier carries a fixed 1% house edge: `99 / win_zone`.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::{Rule, RuleMode};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lowest threshold the API accepts.
pub const MIN_THRESHOLD: Decimal = dec!(0.01);
/// Highest threshold the API accepts.
pub const MAX_THRESHOLD: Decimal = dec!(99.99);
/// Payout numerator. 100 would be a fair game; 99 bakes in the house edge.
pub const PAYOUT_NUMERATOR: Decimal = dec!(99);
/// Decimal places the multiplier is rounded to before submission.
pub const MULTIPLIER_DP: u32 = 4;

// ---------------------------------------------------------------------------
// Rule choice
// ---------------------------------------------------------------------------

/// Source of the over/under decision in `auto` mode.
pub trait RuleChooser: Send {
    fn choose(&mut self) -> Rule;
}

/// Unseeded coin flip on the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRuleChooser;

impl RuleChooser for RandomRuleChooser {
    fn choose(&mut self) -> Rule {
        if rand::thread_rng().gen_bool(0.5) {
            Rule::Under
        } else {
            Rule::Over
        }
    }
}

/// Replays a fixed sequence of rules, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRuleChooser {
    rules: Vec<Rule>,
    next: usize,
}

impl ScriptedRuleChooser {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules, next: 0 }
    }
}

impl RuleChooser for ScriptedRuleChooser {
    fn choose(&mut self) -> Rule {
        if self.rules.is_empty() {
            return Rule::Under;
        }
        let rule = self.rules[self.next % self.rules.len()];
        self.next += 1;
        rule
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Concrete parameters for one dice bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetParameters {
    pub rule: Rule,
    pub threshold: Decimal,
    pub multiplier: Decimal,
}

impl BetParameters {
    /// Size of the winning range, in percent of the roll space.
    pub fn win_zone(&self) -> Decimal {
        win_zone(self.rule, self.threshold)
    }
}

pub struct ThresholdConverter {
    win_chance: Decimal,
    mode: RuleMode,
    chooser: Box<dyn RuleChooser>,
}

impl ThresholdConverter {
    pub fn new(win_chance: Decimal, mode: RuleMode) -> Self {
        Self::with_chooser(win_chance, mode, Box::new(RandomRuleChooser))
    }

    pub fn with_chooser(win_chance: Decimal, mode: RuleMode, chooser: Box<dyn RuleChooser>) -> Self {
        Self {
            win_chance: clamp_threshold(win_chance),
            mode,
            chooser,
        }
    }

    /// Produce parameters for the next bet. In `auto` mode each call flips
    /// a fresh coin.
    pub fn next_parameters(&mut self) -> BetParameters {
        let rule = match self.mode {
            RuleMode::Over => Rule::Over,
            RuleMode::Under => Rule::Under,
            RuleMode::Auto => self.chooser.choose(),
        };

        let threshold = threshold_for(rule, self.win_chance);
        let multiplier = payout_multiplier(rule, threshold);

        debug!(
            rule = %rule,
            threshold = %threshold,
            multiplier = %multiplier,
            "Bet parameters computed"
        );

        BetParameters { rule, threshold, multiplier }
    }
}

/// Clamp a value into the API's accepted threshold range.
pub fn clamp_threshold(value: Decimal) -> Decimal {
    value.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

/// Threshold that gives `win_chance` percent of winning under `rule`.
pub fn threshold_for(rule: Rule, win_chance: Decimal) -> Decimal {
    match rule {
        Rule::Under => clamp_threshold(win_chance),
        Rule::Over => clamp_threshold(dec!(100) - win_chance),
    }
}

/// Winning range for `rule` at `threshold`, never zero.
pub fn win_zone(rule: Rule, threshold: Decimal) -> Decimal {
    let zone = match rule {
        Rule::Under => threshold,
        Rule::Over => dec!(100) - threshold,
    };
    clamp_threshold(zone)
}

/// `99 / win_zone`, rounded to four decimal places.
pub fn payout_multiplier(rule: Rule, threshold: Decimal) -> Decimal {
    (PAYOUT_NUMERATOR / win_zone(rule, threshold)).round_dp(MULTIPLIER_DP)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
