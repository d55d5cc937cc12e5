//! Error types for the submission workflow.

use questionnaire::FlowError;
use survey_store::StoreError;

/// Why a submission attempt failed.
///
/// Every variant is terminal for the attempt; nothing is retried
/// automatically. Hosts show [`SubmissionError::user_message`] and keep the
/// detail for logs.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// Respondent insert failed; nothing else was attempted
    #[error("Could not create respondent: {0}")]
    RespondentCreationFailed(#[source] StoreError),

    /// A store query failed while looking up an event
    #[error("Could not resolve event: {0}")]
    EventResolutionFailed(#[source] StoreError),

    /// No event existed and inserting one failed
    #[error("Could not create event for the survey: {0}")]
    EventCreationFailed(#[source] StoreError),

    /// The batch of response rows was rejected
    #[error("Could not insert responses: {0}")]
    ResponseBatchInsertFailed(#[source] StoreError),

    /// The submission task stopped before reporting (timeout or panic)
    #[error("Submission interrupted: {0}")]
    Interrupted(String),
}

impl SubmissionError {
    /// Stable name for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RespondentCreationFailed(_) => "respondent_creation_failed",
            Self::EventResolutionFailed(_) => "event_resolution_failed",
            Self::EventCreationFailed(_) => "event_creation_failed",
            Self::ResponseBatchInsertFailed(_) => "response_batch_insert_failed",
            Self::Interrupted(_) => "interrupted",
        }
    }

    /// The one message shown to respondents, whatever went wrong.
    pub fn user_message(&self) -> &'static str {
        "Por favor, tente novamente."
    }
}

/// Misuse of a [`SurveySession`](crate::SurveySession).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    /// Retry requested before the questionnaire was finished
    #[error("Questionnaire not completed yet")]
    NotCompleted,

    /// A submission is still outstanding
    #[error("Submission already in flight")]
    InFlight,

    /// The answers were already stored
    #[error("Survey already submitted")]
    AlreadySubmitted,
}
