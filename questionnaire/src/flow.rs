//! The questionnaire state machine.
//!
//! A flow is `Active(position)` for every position in `[0, N-1]` and ends in
//! `Completed`. Answers may be overwritten freely while active; advancing is
//! guarded by the presence of an answer for the current position.

use tracing::debug;

use crate::answers::AnswerMap;
use crate::catalog::Questionnaire;
use crate::error::FlowError;
use crate::types::Question;

/// Where a flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Active(usize),
    Completed,
}

/// Result of [`QuestionFlow::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Moved to the next question
    Moved { position: usize },
    /// Current question has no answer; nothing changed
    NeedsAnswer,
    /// The last question was answered; carries the final answers.
    /// Returned exactly once per flow.
    Completed(AnswerMap),
    /// The flow had already completed
    AlreadyCompleted,
}

/// Walks a respondent through an ordered list of questions.
#[derive(Debug, Clone)]
pub struct QuestionFlow {
    questions: Questionnaire,
    state: FlowState,
    answers: AnswerMap,
}

impl QuestionFlow {
    pub fn new(questions: Questionnaire) -> Self {
        Self {
            questions,
            state: FlowState::Active(0),
            answers: AnswerMap::new(),
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == FlowState::Completed
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn questions(&self) -> &Questionnaire {
        &self.questions
    }

    /// Question at the current position, `None` once completed.
    pub fn current(&self) -> Option<&Question> {
        match self.state {
            FlowState::Active(position) => self.questions.get(position),
            FlowState::Completed => None,
        }
    }

    /// Answer already recorded for the current position.
    pub fn current_answer(&self) -> Option<&str> {
        match self.state {
            FlowState::Active(position) => self.answers.get(position),
            FlowState::Completed => None,
        }
    }

    /// Record `value` for the current question, replacing any earlier value.
    ///
    /// The value is not checked against the question's options.
    pub fn record_answer(&mut self, value: impl Into<String>) -> Result<(), FlowError> {
        let FlowState::Active(position) = self.state else {
            return Err(FlowError::Completed);
        };
        self.answers.record(position, value);
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        match self.state {
            FlowState::Active(position) => self.answers.contains(position),
            FlowState::Completed => false,
        }
    }

    /// Move forward, or complete on the last question.
    pub fn advance(&mut self) -> Step {
        let FlowState::Active(position) = self.state else {
            return Step::AlreadyCompleted;
        };
        if !self.can_advance() {
            return Step::NeedsAnswer;
        }

        if position + 1 < self.questions.len() {
            self.state = FlowState::Active(position + 1);
            debug!(position = position + 1, "Advanced questionnaire");
            Step::Moved { position: position + 1 }
        } else {
            self.state = FlowState::Completed;
            debug!(answers = self.answers.len(), "Questionnaire completed");
            Step::Completed(self.answers.clone())
        }
    }

    /// Step back to the previous question. Returns `false` at the first
    /// question or once completed.
    pub fn back(&mut self) -> bool {
        match self.state {
            FlowState::Active(position) if position > 0 => {
                self.state = FlowState::Active(position - 1);
                true
            }
            _ => false,
        }
    }

    /// `(position + 1) / N` for display.
    pub fn progress_fraction(&self) -> f64 {
        let total = self.questions.len().max(1) as f64;
        match self.state {
            FlowState::Active(position) => (position + 1) as f64 / total,
            FlowState::Completed => 1.0,
        }
    }
}
