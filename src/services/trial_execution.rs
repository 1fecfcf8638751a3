//! Per-trial execution state machine.
//!
//! Pure and clock-free: every input carries the time elapsed since the trial
//! started, and the caller reports the passage of time through [`TrialExecution::tick`].
//! The async driver in the application layer owns the actual countdown.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::domain::models::{
    BarSize, BarSizes, Choice, FontSizes, OptionKind, ScreenSide, TrialNumber, TrialResponse,
    TrialSpec,
};

/// Trial lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialState {
    WaitingForChoice,
    ChoiceMade,
    ConfidenceRated,
    Complete,
    TimedOut,
}

impl TrialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForChoice => "waiting_for_choice",
            Self::ChoiceMade => "choice_made",
            Self::ConfidenceRated => "confidence_rated",
            Self::Complete => "complete",
            Self::TimedOut => "timed_out",
        }
    }

    /// States reachable from this one
    pub fn valid_transitions(&self) -> &'static [TrialState] {
        match self {
            Self::WaitingForChoice => &[Self::ChoiceMade, Self::TimedOut],
            Self::ChoiceMade => &[Self::ConfidenceRated, Self::TimedOut],
            Self::ConfidenceRated => &[Self::Complete, Self::TimedOut],
            Self::Complete | Self::TimedOut => &[],
        }
    }

    pub fn can_transition_to(&self, next: TrialState) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// No further input is accepted
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::TimedOut)
    }
}

impl fmt::Display for TrialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input from the rendering layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialInput {
    SelectSide(ScreenSide),
    SelectOption(OptionKind),
    Confidence(u8),
    Advance,
}

/// What an input did to the trial
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// State or recorded values changed
    Applied,
    /// Not allowed in the current state; nothing changed
    Ignored,
    /// The trial finished and emitted its only response
    Completed(TrialResponse),
}

impl InputOutcome {
    /// The emitted response, if the input completed the trial
    pub fn into_response(self) -> Option<TrialResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::Applied | Self::Ignored => None,
        }
    }
}

/// One option as the renderer should draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub option: OptionKind,
    pub probability: u8,
    pub reward: u64,
    pub bar_size: BarSize,
    pub size_class: &'static str,
    /// Bar width in pixels
    pub width: u32,
    /// Bar height in pixels
    pub height: u32,
    /// Font size of the values drawn inside the bar
    pub value_font_size: u32,
    /// Font size of the labels around the bar
    pub label_font_size: u32,
}

/// Renderer-facing snapshot of a trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialView {
    /// "Practice N" or "Trial N of M"
    pub label: String,
    pub state: TrialState,
    pub left: OptionView,
    pub right: OptionView,
    pub selected: Option<ScreenSide>,
    /// Whole seconds left, rounded up; `None` without a deadline
    pub remaining_secs: Option<u64>,
    pub confidence_enabled: bool,
    pub confidence: Option<u8>,
    pub next_enabled: bool,
}

/// Execution of a single trial
#[derive(Debug, Clone)]
pub struct TrialExecution {
    spec: TrialSpec,
    deadline: Option<Duration>,
    total_trials: Option<usize>,
    bar_sizes: BarSizes,
    font_sizes: FontSizes,
    state: TrialState,
    choice: Option<OptionKind>,
    bar_choice_time: Option<f64>,
    confidence: u8,
    confidence_touched: bool,
}

impl TrialExecution {
    /// Start a trial. Practice trials never get a deadline.
    pub fn new(spec: TrialSpec, trial_duration: Duration) -> Self {
        let deadline = (!spec.is_practice).then_some(trial_duration);
        Self {
            spec,
            deadline,
            total_trials: None,
            bar_sizes: BarSizes::default(),
            font_sizes: FontSizes::default(),
            state: TrialState::WaitingForChoice,
            choice: None,
            bar_choice_time: None,
            confidence: 50,
            confidence_touched: false,
        }
    }

    /// Set the block size shown in the trial label
    pub fn with_total(mut self, total_trials: usize) -> Self {
        self.total_trials = Some(total_trials);
        self
    }

    /// Set the pixel sizes the view reports for bars and text
    pub fn with_layout(mut self, bar_sizes: BarSizes, font_sizes: FontSizes) -> Self {
        self.bar_sizes = bar_sizes;
        self.font_sizes = font_sizes;
        self
    }

    /// Trial being executed
    pub fn spec(&self) -> &TrialSpec {
        &self.spec
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    /// Time allowed for the trial, `None` for practice
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// A choice exists and the confidence control was used
    pub fn can_advance(&self) -> bool {
        self.state == TrialState::ConfidenceRated
    }

    /// Apply one renderer input at `elapsed`
    pub fn handle(&mut self, input: TrialInput, elapsed: Duration) -> InputOutcome {
        match input {
            TrialInput::SelectSide(side) => self.select_side(side, elapsed),
            TrialInput::SelectOption(option) => self.select_option(option, elapsed),
            TrialInput::Confidence(value) => self.update_confidence(value, elapsed),
            TrialInput::Advance => self.advance(elapsed),
        }
    }

    /// Choose whichever option is drawn on `side`
    pub fn select_side(&mut self, side: ScreenSide, elapsed: Duration) -> InputOutcome {
        let option = self.spec.option_at(side);
        self.select_option(option, elapsed)
    }

    /// Choose an option; re-selection before completion replaces the choice.
    pub fn select_option(&mut self, option: OptionKind, elapsed: Duration) -> InputOutcome {
        if let Some(outcome) = self.guard(elapsed, "select") {
            return outcome;
        }
        self.choice = Some(option);
        self.bar_choice_time = Some(elapsed.as_secs_f64());
        if self.state == TrialState::WaitingForChoice {
            self.state = TrialState::ChoiceMade;
        }
        InputOutcome::Applied
    }

    /// Move the confidence slider. Ignored until a choice exists.
    pub fn update_confidence(&mut self, value: u8, elapsed: Duration) -> InputOutcome {
        if let Some(outcome) = self.guard(elapsed, "confidence") {
            return outcome;
        }
        if self.state == TrialState::WaitingForChoice {
            debug!(trial = %self.spec.trial_number, "confidence before choice ignored");
            return InputOutcome::Ignored;
        }
        self.confidence = value.min(100);
        self.confidence_touched = true;
        self.state = TrialState::ConfidenceRated;
        InputOutcome::Applied
    }

    /// Request completion. Only the first successful request emits a response.
    pub fn advance(&mut self, elapsed: Duration) -> InputOutcome {
        if let Some(outcome) = self.guard(elapsed, "advance") {
            return outcome;
        }
        if !self.can_advance() {
            debug!(trial = %self.spec.trial_number, state = %self.state, "advance not yet allowed");
            return InputOutcome::Ignored;
        }
        self.state = TrialState::Complete;
        InputOutcome::Completed(self.response(elapsed.as_secs_f64(), false))
    }

    /// Report elapsed time; returns the timeout response once the deadline passes.
    pub fn tick(&mut self, elapsed: Duration) -> Option<TrialResponse> {
        match self.deadline {
            Some(deadline) if !self.is_finished() && elapsed >= deadline => {
                self.state = TrialState::TimedOut;
                debug!(
                    trial = %self.spec.trial_number,
                    chosen = self.choice.is_some(),
                    "trial timed out"
                );
                Some(self.response(deadline.as_secs_f64(), true))
            }
            _ => None,
        }
    }

    /// Expire or reject input before it is applied
    fn guard(&mut self, elapsed: Duration, input: &str) -> Option<InputOutcome> {
        if self.is_finished() {
            debug!(trial = %self.spec.trial_number, input, "input after completion ignored");
            return Some(InputOutcome::Ignored);
        }
        self.tick(elapsed).map(InputOutcome::Completed)
    }

    fn response(&self, submit_time: f64, timed_out: bool) -> TrialResponse {
        TrialResponse {
            choice: self.choice.map_or(Choice::Timeout, Choice::from),
            confidence: self.confidence_touched.then_some(self.confidence),
            page_entry_time: 0.0,
            bar_choice_time: self.bar_choice_time,
            submit_time,
            timed_out,
            trial: self.spec.clone(),
        }
    }

    /// Time left before the deadline
    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_sub(elapsed))
    }

    /// Heading shown above the bars
    pub fn label(&self) -> String {
        match (self.spec.trial_number, self.total_trials) {
            (TrialNumber::Practice(n), _) => format!("Practice {n}"),
            (TrialNumber::Main(n), Some(total)) => format!("Trial {n} of {total}"),
            (TrialNumber::Main(n), None) => format!("Trial {n}"),
        }
    }

    /// Snapshot for the renderer at `elapsed`
    pub fn view(&self, elapsed: Duration) -> TrialView {
        let option_view = |side: ScreenSide| {
            let option = self.spec.option_at(side);
            let (probability, reward) = match option {
                OptionKind::Risk => (
                    self.spec.condition.risk_probability,
                    self.spec.condition.risk_reward,
                ),
                OptionKind::Safe => (100, self.spec.condition.safe_reward),
            };
            let bar_size = self.spec.size_condition.bar_size(option);
            let dimensions = self.bar_sizes.dimensions(bar_size);
            OptionView {
                option,
                probability,
                reward,
                bar_size,
                size_class: bar_size.css_class(),
                width: dimensions.width,
                height: dimensions.height,
                value_font_size: self.font_sizes.large,
                label_font_size: self.font_sizes.small,
            }
        };

        TrialView {
            label: self.label(),
            state: self.state,
            left: option_view(ScreenSide::Left),
            right: option_view(ScreenSide::Right),
            selected: self.choice.map(|option| self.spec.side_of(option)),
            remaining_secs: self
                .remaining(elapsed)
                .map(|d| d.as_secs() + u64::from(d.subsec_nanos() > 0)),
            confidence_enabled: !self.is_finished() && self.choice.is_some(),
            confidence: self.confidence_touched.then_some(self.confidence),
            next_enabled: self.can_advance(),
        }
    }
}
