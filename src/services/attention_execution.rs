use std::time::Duration;
use tracing::debug;

use crate::domain::models::{AttentionCheckItem, AttentionCheckResult};

/// What a submitted answer did to an attention check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttentionOutcome {
    /// Answer recorded, the check still blocks
    Retry,
    /// The check is already over
    Ignored,
    Completed(AttentionCheckResult),
}

/// Execution of one attention check
///
/// The first answer decides `is_correct`. When correct answers are required,
/// advance stays blocked until the current answer is correct.
#[derive(Debug, Clone)]
pub struct AttentionExecution {
    item: AttentionCheckItem,
    require_correct: bool,
    first_answer: Option<String>,
    current_answer: Option<String>,
    attempts: u32,
    finished: bool,
}

impl AttentionExecution {
    /// Start a check; `require_correct` gates advance on a correct answer
    pub fn new(item: AttentionCheckItem, require_correct: bool) -> Self {
        Self {
            item,
            require_correct,
            first_answer: None,
            current_answer: None,
            attempts: 0,
            finished: false,
        }
    }

    pub fn item(&self) -> &AttentionCheckItem {
        &self.item
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Answers submitted so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record an answer, returns whether it is correct
    pub fn answer(&mut self, answer: &str) -> Option<bool> {
        if self.finished {
            return None;
        }
        self.attempts += 1;
        if self.first_answer.is_none() {
            self.first_answer = Some(answer.to_string());
        }
        self.current_answer = Some(answer.to_string());
        let correct = self.item.question.is_correct(answer);
        debug!(
            check = self.item.check_number,
            attempt = self.attempts,
            correct,
            "attention answer"
        );
        Some(correct)
    }

    /// Whether the current answer lets the participant move on
    pub fn can_advance(&self) -> bool {
        match &self.current_answer {
            None => false,
            Some(answer) => !self.require_correct || self.item.question.is_correct(answer),
        }
    }

    /// Finish the check and emit its result
    pub fn advance(&mut self, elapsed: Duration) -> Option<AttentionCheckResult> {
        if self.finished || !self.can_advance() {
            return None;
        }
        self.finished = true;

        let question = &self.item.question;
        let user_answer = self.first_answer.clone().unwrap_or_default();
        Some(AttentionCheckResult {
            check_number: self.item.check_number,
            question_type: question.kind,
            question_prompt: question.prompt.clone(),
            correct_answer: question.correct_answer.clone(),
            is_correct: question.is_correct(&user_answer),
            user_answer,
            attempts: self.attempts,
            response_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Answer and advance in one step, the way a form submit does
    pub fn submit(&mut self, answer: &str, elapsed: Duration) -> AttentionOutcome {
        if self.answer(answer).is_none() {
            return AttentionOutcome::Ignored;
        }
        match self.advance(elapsed) {
            Some(result) => AttentionOutcome::Completed(result),
            None => AttentionOutcome::Retry,
        }
    }
}
