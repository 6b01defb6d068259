//! Interactive quiz sessions
//!
//! A session walks through the questions of one quiz payload:
//!
//! ```text
//! Answering(i) --select--> Answered(i) --advance--> Answering(i + 1)
//!                                      \--advance--> Finished
//! ```
//!
//! Using a hint costs [`HINT_PENALTY`] XP off the current question and is
//! allowed once per question, before answering.

use serde::Serialize;

use crate::conversation::EVENT_PREFIX;
use crate::protocol::{QuizPayload, QuizQuestion};

/// XP deducted from a question's reward when its hint is revealed
pub const HINT_PENALTY: u32 = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("Quiz has no questions")]
    Empty,

    #[error("This question has already been answered")]
    AlreadyAnswered,

    #[error("Answer the question before moving on")]
    NotAnswered,

    #[error("Hint already used for this question")]
    HintUnavailable,

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Quiz is finished")]
    Finished,
}

/// Where the session is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    Answering,
    Answered { selected: usize, correct: bool },
    Finished,
}

/// Result of answering one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub awarded_xp: u32,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

/// What `advance` moved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Now answering the question at this zero-based index
    Next(usize),
    Finished(QuizSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    pub correct: usize,
    pub total: usize,
    pub total_xp: u32,
}

impl QuizSummary {
    /// Share of correct answers, rounded to a whole percent
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }

    /// Event text reported to the conversation when the quiz ends
    pub fn event_message(&self) -> String {
        format!(
            "{}Quiz completed: {}/{} correct ({}%), earned {} XP",
            EVENT_PREFIX,
            self.correct,
            self.total,
            self.percentage(),
            self.total_xp
        )
    }
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    index: usize,
    state: QuizState,
    hint_used: bool,
    available_xp: u32,
    total_xp: u32,
    correct_count: usize,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        let first_reward = questions.first().ok_or(QuizError::Empty)?.xp_reward;
        Ok(Self {
            questions,
            index: 0,
            state: QuizState::Answering,
            hint_used: false,
            available_xp: first_reward,
            total_xp: 0,
            correct_count: 0,
        })
    }

    pub fn from_payload(payload: QuizPayload) -> Result<Self, QuizError> {
        Self::new(payload.into_questions())
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == QuizState::Finished
    }

    /// The question being shown, `None` once finished
    pub fn current(&self) -> Option<&QuizQuestion> {
        match self.state {
            QuizState::Finished => None,
            _ => self.questions.get(self.index),
        }
    }

    /// Zero-based index of the current question
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The current question is the final one
    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    pub fn hint_used(&self) -> bool {
        self.hint_used
    }

    /// XP the current question is still worth
    pub fn available_xp(&self) -> u32 {
        self.available_xp
    }

    pub fn total_xp(&self) -> u32 {
        self.total_xp
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            correct: self.correct_count,
            total: self.questions.len(),
            total_xp: self.total_xp,
        }
    }

    /// Answer the current question with the option at `index` (zero-based)
    pub fn select_index(&mut self, index: usize) -> Result<AnswerOutcome, QuizError> {
        self.ensure_answering()?;
        let question = &self.questions[self.index];
        if index >= question.options.len() {
            return Err(QuizError::UnknownOption(format!("#{}", index + 1)));
        }

        let correct = question.options[index] == question.correct_answer;
        let awarded_xp = if correct { self.available_xp } else { 0 };
        let outcome = AnswerOutcome {
            correct,
            awarded_xp,
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
        };

        self.total_xp = self.total_xp.saturating_add(awarded_xp);
        if correct {
            self.correct_count += 1;
        }
        self.state = QuizState::Answered {
            selected: index,
            correct,
        };
        tracing::debug!(
            question = self.index,
            correct,
            awarded_xp,
            "quiz question answered"
        );
        Ok(outcome)
    }

    /// Answer the current question by option text
    pub fn select(&mut self, option: &str) -> Result<AnswerOutcome, QuizError> {
        self.ensure_answering()?;
        let index = self.questions[self.index]
            .options
            .iter()
            .position(|o| o == option)
            .ok_or_else(|| QuizError::UnknownOption(option.to_string()))?;
        self.select_index(index)
    }

    /// Reveal the hint for the current question.
    ///
    /// Returns the hint text if the question has one; the penalty applies
    /// either way.
    pub fn use_hint(&mut self) -> Result<Option<String>, QuizError> {
        self.ensure_answering()?;
        if self.hint_used {
            return Err(QuizError::HintUnavailable);
        }
        self.hint_used = true;
        self.available_xp = self.available_xp.saturating_sub(HINT_PENALTY);
        Ok(self.questions[self.index].hint.clone())
    }

    /// Move past an answered question
    pub fn advance(&mut self) -> Result<Progress, QuizError> {
        match self.state {
            QuizState::Answering => return Err(QuizError::NotAnswered),
            QuizState::Finished => return Err(QuizError::Finished),
            QuizState::Answered { .. } => {}
        }

        self.hint_used = false;
        if !self.is_last() {
            self.index += 1;
            self.available_xp = self.questions[self.index].xp_reward;
            self.state = QuizState::Answering;
            Ok(Progress::Next(self.index))
        } else {
            self.available_xp = 0;
            self.state = QuizState::Finished;
            let summary = self.summary();
            tracing::info!(
                correct = summary.correct,
                total = summary.total,
                total_xp = summary.total_xp,
                "quiz finished"
            );
            Ok(Progress::Finished(summary))
        }
    }

    fn ensure_answering(&self) -> Result<(), QuizError> {
        match self.state {
            QuizState::Answering => Ok(()),
            QuizState::Answered { .. } => Err(QuizError::AlreadyAnswered),
            QuizState::Finished => Err(QuizError::Finished),
        }
    }
}
