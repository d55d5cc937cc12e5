//! Error types for the questionnaire crate

use thiserror::Error;

/// Misuse of a [`QuestionFlow`](crate::QuestionFlow).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    /// The flow already reached its terminal state
    #[error("Questionnaire already completed")]
    Completed,
}

/// Problems loading a question catalogue.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// YAML could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A questionnaire needs at least one question
    #[error("Questionnaire has no questions")]
    Empty,

    /// Ordinals must run 0..N in order
    #[error("Question at position {position} has id {found}")]
    OrdinalGap { position: usize, found: usize },

    /// Choice and scale questions need options
    #[error("Question {0} has no options")]
    MissingOptions(usize),
}
