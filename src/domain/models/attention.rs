//! Attention-check questions and results.

use serde::{Deserialize, Serialize};

/// How an attention question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultiChoice,
    Text,
    Likert,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultiChoice => "multi-choice",
            Self::Text => "text",
            Self::Likert => "likert",
        }
    }
}

/// A question from the attention-check bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionQuestion {
    #[serde(rename = "type")]
    pub kind: QuestionKind,

    pub prompt: String,

    /// Choices for multi-choice questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Scale labels for likert questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    #[serde(alias = "correctAnswer")]
    pub correct_answer: String,
}

impl AttentionQuestion {
    /// Question answered by picking one of `options`
    pub fn multi_choice(prompt: &str, options: &[&str], correct_answer: &str) -> Self {
        Self {
            kind: QuestionKind::MultiChoice,
            prompt: prompt.to_string(),
            options: options.iter().map(ToString::to_string).collect(),
            labels: Vec::new(),
            correct_answer: correct_answer.to_string(),
        }
    }

    /// Free-text question, scored trimmed and case-insensitively
    pub fn text(prompt: &str, correct_answer: &str) -> Self {
        Self {
            kind: QuestionKind::Text,
            prompt: prompt.to_string(),
            options: Vec::new(),
            labels: Vec::new(),
            correct_answer: correct_answer.to_string(),
        }
    }

    /// Agreement scale question over `labels`
    pub fn likert(prompt: &str, labels: &[&str], correct_answer: &str) -> Self {
        Self {
            kind: QuestionKind::Likert,
            prompt: prompt.to_string(),
            options: Vec::new(),
            labels: labels.iter().map(ToString::to_string).collect(),
            correct_answer: correct_answer.to_string(),
        }
    }

    /// Selectable answers, empty for free-text questions.
    pub fn choices(&self) -> &[String] {
        match self.kind {
            QuestionKind::MultiChoice => &self.options,
            QuestionKind::Likert => &self.labels,
            QuestionKind::Text => &[],
        }
    }

    /// Score an answer. Free text is compared trimmed and case-insensitively,
    /// selections must match a label exactly.
    pub fn is_correct(&self, answer: &str) -> bool {
        match self.kind {
            QuestionKind::Text => {
                answer.trim().to_lowercase() == self.correct_answer.trim().to_lowercase()
            }
            QuestionKind::MultiChoice | QuestionKind::Likert => answer == self.correct_answer,
        }
    }

    /// Check the question is answerable. Returns a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("attention question prompt cannot be empty".to_string());
        }
        if self.correct_answer.trim().is_empty() {
            return Err(format!("question '{}' has no correct answer", self.prompt));
        }
        if self.kind != QuestionKind::Text {
            if self.choices().is_empty() {
                return Err(format!(
                    "{} question '{}' has no {}",
                    self.kind.as_str(),
                    self.prompt,
                    if self.kind == QuestionKind::Likert { "labels" } else { "options" }
                ));
            }
            if !self.choices().contains(&self.correct_answer) {
                return Err(format!(
                    "correct answer '{}' is not selectable in question '{}'",
                    self.correct_answer, self.prompt
                ));
            }
        }
        Ok(())
    }
}

/// The question bank shipped with the survey.
pub fn default_question_bank() -> Vec<AttentionQuestion> {
    vec![
        AttentionQuestion::multi_choice(
            "To ensure you are paying attention, please select the option 'Blue'.",
            &["Red", "Green", "Blue", "Yellow"],
            "Blue",
        ),
        AttentionQuestion::text(
            "To ensure you are paying attention, please type the word 'apple' into the box below.",
            "apple",
        ),
        AttentionQuestion::likert(
            "For this question, please select 'Strongly Agree'.",
            &["Strongly Disagree", "Disagree", "Neutral", "Agree", "Strongly Agree"],
            "Strongly Agree",
        ),
    ]
}

/// Outcome of one attention check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionCheckResult {
    pub check_number: u32,
    pub question_type: QuestionKind,
    pub question_prompt: String,
    pub correct_answer: String,
    /// First answer the participant gave
    pub user_answer: String,
    /// Whether the first answer was correct
    pub is_correct: bool,
    /// Answers submitted before the check was passed
    pub attempts: u32,
    pub response_time_ms: u64,
}
