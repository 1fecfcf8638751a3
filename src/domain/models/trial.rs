//! Trial domain model.
//!
//! A trial presents one risky lottery against one guaranteed amount.
//! Conditions come from the combination generator, specs from the
//! timeline sequencer. Both are immutable once created.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::attention::AttentionQuestion;

/// Tolerance under which two expected values count as equal.
const EV_EPSILON: f64 = 0.01;

/// One of the two options shown on a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Risk,
    Safe,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Safe => "safe",
        }
    }
}

/// Screen side an option is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenSide {
    Left,
    Right,
}

impl ScreenSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Rendered bar size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarSize {
    Large,
    Small,
}

impl BarSize {
    /// CSS class the rendering layer uses for this size.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Large => "size-large",
            Self::Small => "size-small",
        }
    }
}

/// Relative bar sizing of the two options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeCondition {
    BothLarge,
    BothSmall,
    RiskLarge,
    SafeLarge,
}

impl SizeCondition {
    /// Every size condition, in the order the sequencer draws from.
    pub const ALL: [Self; 4] = [
        Self::BothLarge,
        Self::BothSmall,
        Self::RiskLarge,
        Self::SafeLarge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BothLarge => "both-large",
            Self::BothSmall => "both-small",
            Self::RiskLarge => "risk-large",
            Self::SafeLarge => "safe-large",
        }
    }

    /// Bar size of one option under this condition.
    pub fn bar_size(&self, option: OptionKind) -> BarSize {
        match (self, option) {
            (Self::BothLarge, _)
            | (Self::RiskLarge, OptionKind::Risk)
            | (Self::SafeLarge, OptionKind::Safe) => BarSize::Large,
            _ => BarSize::Small,
        }
    }
}

impl fmt::Display for SizeCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which option has the higher expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvComparison {
    Same,
    Safe,
    Risky,
}

/// A lottery/safe pairing: `risk_probability`% chance of `risk_reward`
/// (zero otherwise) against `safe_reward` for sure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialCondition {
    /// Win probability of the risky option, in percent
    pub risk_probability: u8,
    /// Reward of the risky option when it wins
    pub risk_reward: u64,
    /// Guaranteed reward of the safe option
    pub safe_reward: u64,
}

impl TrialCondition {
    /// Condition with a 100% safe option
    pub fn new(risk_probability: u8, risk_reward: u64, safe_reward: u64) -> Self {
        Self {
            risk_probability,
            risk_reward,
            safe_reward,
        }
    }

    /// Expected value of the risky option.
    pub fn risky_expected_value(&self) -> f64 {
        f64::from(self.risk_probability) / 100.0 * self.risk_reward as f64
    }

    /// Compare the expected values of both options.
    pub fn ev_comparison(&self) -> EvComparison {
        let risk_ev = self.risky_expected_value();
        let safe_ev = self.safe_reward as f64;
        if (risk_ev - safe_ev).abs() < EV_EPSILON {
            EvComparison::Same
        } else if safe_ev > risk_ev {
            EvComparison::Safe
        } else {
            EvComparison::Risky
        }
    }
}

/// Position of a trial within its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialNumber {
    Practice(u32),
    Main(u32),
}

impl TrialNumber {
    /// 1-based position within its block
    pub fn index(&self) -> u32 {
        match self {
            Self::Practice(n) | Self::Main(n) => *n,
        }
    }
}

impl fmt::Display for TrialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Practice(n) => write!(f, "practice_{n}"),
            Self::Main(n) => write!(f, "{n}"),
        }
    }
}

/// Links a trial back to the Phase 2 candidate it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phase2Link {
    pub trial_id: u32,
    pub combination_id: u32,
    pub indifference_point: u64,
    pub estimated_alpha: f64,
}

/// A fully specified trial as presented to the participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub trial_number: TrialNumber,
    #[serde(flatten)]
    pub condition: TrialCondition,
    pub size_condition: SizeCondition,
    pub risk_on_left: bool,
    pub is_practice: bool,
    /// Present only for personalized Phase 2 trials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase2: Option<Phase2Link>,
}

impl TrialSpec {
    /// Side the given option is rendered on.
    pub fn side_of(&self, option: OptionKind) -> ScreenSide {
        match (option, self.risk_on_left) {
            (OptionKind::Risk, true) | (OptionKind::Safe, false) => ScreenSide::Left,
            _ => ScreenSide::Right,
        }
    }

    /// Option rendered on the given side.
    pub fn option_at(&self, side: ScreenSide) -> OptionKind {
        match (side, self.risk_on_left) {
            (ScreenSide::Left, true) | (ScreenSide::Right, false) => OptionKind::Risk,
            _ => OptionKind::Safe,
        }
    }
}

/// An attention check placed in a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionCheckItem {
    /// 1-based position among the timeline's attention checks
    pub check_number: u32,
    pub question: AttentionQuestion,
}

/// One step of a timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineItem {
    Trial(TrialSpec),
    AttentionCheck(AttentionCheckItem),
}

impl TimelineItem {
    pub fn is_attention(&self) -> bool {
        matches!(self, Self::AttentionCheck(_))
    }

    /// The trial, unless this is an attention check
    pub fn as_trial(&self) -> Option<&TrialSpec> {
        match self {
            Self::Trial(spec) => Some(spec),
            Self::AttentionCheck(_) => None,
        }
    }
}

/// Ordered sequence of trials and attention checks for one block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    items: Vec<TimelineItem>,
}

impl Timeline {
    pub fn new(items: Vec<TimelineItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimelineItem> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    /// Trials only, skipping attention checks
    pub fn trials(&self) -> impl Iterator<Item = &TrialSpec> {
        self.items.iter().filter_map(TimelineItem::as_trial)
    }

    /// Number of trials, excluding attention checks
    pub fn trial_count(&self) -> usize {
        self.trials().count()
    }

    /// Number of attention checks
    pub fn attention_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_attention()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(risk_on_left: bool) -> TrialSpec {
        TrialSpec {
            trial_number: TrialNumber::Main(1),
            condition: TrialCondition::new(50, 200, 100),
            size_condition: SizeCondition::RiskLarge,
            risk_on_left,
            is_practice: false,
            phase2: None,
        }
    }

    #[test]
    fn test_size_condition_bar_sizes() {
        assert_eq!(SizeCondition::BothLarge.bar_size(OptionKind::Safe), BarSize::Large);
        assert_eq!(SizeCondition::BothSmall.bar_size(OptionKind::Risk), BarSize::Small);
        assert_eq!(SizeCondition::RiskLarge.bar_size(OptionKind::Risk), BarSize::Large);
        assert_eq!(SizeCondition::RiskLarge.bar_size(OptionKind::Safe), BarSize::Small);
        assert_eq!(SizeCondition::SafeLarge.bar_size(OptionKind::Safe), BarSize::Large);
        assert_eq!(SizeCondition::SafeLarge.bar_size(OptionKind::Risk), BarSize::Small);
    }

    #[test]
    fn test_ev_comparison() {
        assert_eq!(TrialCondition::new(50, 200, 100).ev_comparison(), EvComparison::Same);
        assert_eq!(TrialCondition::new(25, 200, 100).ev_comparison(), EvComparison::Safe);
        assert_eq!(TrialCondition::new(75, 200, 100).ev_comparison(), EvComparison::Risky);
    }

    #[test]
    fn test_sides() {
        let left = spec(true);
        assert_eq!(left.side_of(OptionKind::Risk), ScreenSide::Left);
        assert_eq!(left.option_at(ScreenSide::Right), OptionKind::Safe);

        let right = spec(false);
        assert_eq!(right.side_of(OptionKind::Risk), ScreenSide::Right);
        assert_eq!(right.option_at(ScreenSide::Left), OptionKind::Safe);
    }

    #[test]
    fn test_trial_number_display() {
        assert_eq!(TrialNumber::Practice(2).to_string(), "practice_2");
        assert_eq!(TrialNumber::Main(7).to_string(), "7");
    }

    #[test]
    fn test_spec_serializes_flat_condition() {
        let value = serde_json::to_value(spec(true)).unwrap();
        assert_eq!(value["risk_probability"], 50);
        assert_eq!(value["size_condition"], "risk-large");
        assert!(value.get("phase2").is_none());
    }
}
