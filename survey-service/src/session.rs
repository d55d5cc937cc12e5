//! SurveySession - one questionnaire flow bound to one coordinator.
//!
//! The host drives the flow synchronously; the final `advance` hands the
//! answers to a spawned task and returns at once. Outcomes are published on
//! a watch channel so any number of observers can follow the submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use questionnaire::{AnswerMap, QuestionFlow, Questionnaire, Step};

use crate::coordinator::{SubmissionCoordinator, SubmissionReceipt};
use crate::error::{SessionError, SubmissionError};

/// Where the submission of this session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// Nothing submitted yet
    Idle,
    /// A submission task is running
    InFlight,
    /// All rows were written
    Succeeded(SubmissionReceipt),
    /// The last attempt failed; `retry` is allowed
    Failed { reason: String },
}

impl SubmissionStatus {
    /// True once an attempt has finished, either way.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed { .. })
    }
}

/// Result of [`SurveySession::advance`].
#[derive(Debug)]
pub enum Advance {
    /// Moved to the next question
    Moved { position: usize },
    /// Current question has no answer
    NeedsAnswer,
    /// Last question answered; the submission is running
    Submitting(SubmissionHandle),
    /// A submission is outstanding; nothing was started
    InFlight,
    /// The questionnaire was already finished
    Completed,
}

/// Handle to a running submission.
#[derive(Debug)]
pub struct SubmissionHandle {
    task: JoinHandle<Result<SubmissionReceipt, SubmissionError>>,
}

impl SubmissionHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the submission to settle.
    ///
    /// Dropping the handle instead does not cancel the task.
    pub async fn outcome(self) -> Result<SubmissionReceipt, SubmissionError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(SubmissionError::Interrupted(e.to_string())),
        }
    }
}

/// Holds the in-flight flag for the lifetime of one submission task.
///
/// The flag is cleared before the status is published, so an observer that
/// sees a settled status can immediately start another attempt.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
    status: Arc<watch::Sender<SubmissionStatus>>,
    settled: bool,
}

impl InFlightGuard {
    fn acquire(flag: Arc<AtomicBool>, status: Arc<watch::Sender<SubmissionStatus>>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        status.send_replace(SubmissionStatus::InFlight);
        Some(Self {
            flag,
            status,
            settled: false,
        })
    }

    fn settle(mut self, outcome: SubmissionStatus) {
        self.settled = true;
        self.flag.store(false, Ordering::Release);
        self.status.send_replace(outcome);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Submission task ended without settling");
            self.flag.store(false, Ordering::Release);
            self.status.send_replace(SubmissionStatus::Failed {
                reason: "interrupted".to_string(),
            });
        }
    }
}

/// A respondent's pass through the questionnaire.
pub struct SurveySession {
    flow: QuestionFlow,
    coordinator: Arc<SubmissionCoordinator>,
    in_flight: Arc<AtomicBool>,
    status: Arc<watch::Sender<SubmissionStatus>>,
}

impl SurveySession {
    pub fn new(questions: Questionnaire, coordinator: Arc<SubmissionCoordinator>) -> Self {
        let (status, _) = watch::channel(SubmissionStatus::Idle);
        Self {
            flow: QuestionFlow::new(questions),
            coordinator,
            in_flight: Arc::new(AtomicBool::new(false)),
            status: Arc::new(status),
        }
    }

    pub fn flow(&self) -> &QuestionFlow {
        &self.flow
    }

    pub fn record_answer(&mut self, value: impl Into<String>) -> Result<(), SessionError> {
        Ok(self.flow.record_answer(value)?)
    }

    pub fn can_advance(&self) -> bool {
        self.flow.can_advance()
    }

    pub fn back(&mut self) -> bool {
        self.flow.back()
    }

    pub fn progress_fraction(&self) -> f64 {
        self.flow.progress_fraction()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Follow status changes.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status.borrow().clone()
    }

    /// Move the flow forward. The terminal transition spawns the submission
    /// onto the current Tokio runtime.
    pub fn advance(&mut self) -> Advance {
        if self.is_submitting() {
            return Advance::InFlight;
        }
        match self.flow.advance() {
            Step::Moved { position } => Advance::Moved { position },
            Step::NeedsAnswer => Advance::NeedsAnswer,
            Step::Completed(answers) => match self.spawn_submission(answers) {
                Some(handle) => Advance::Submitting(handle),
                None => Advance::InFlight,
            },
            Step::AlreadyCompleted => Advance::Completed,
        }
    }

    /// Submit the same answers again after a failed attempt. Writes a new
    /// respondent; earlier partial rows are left as they are.
    pub fn retry(&mut self) -> Result<SubmissionHandle, SessionError> {
        if !self.flow.is_completed() {
            return Err(SessionError::NotCompleted);
        }
        match self.status() {
            SubmissionStatus::Failed { .. } => {}
            SubmissionStatus::InFlight => return Err(SessionError::InFlight),
            SubmissionStatus::Succeeded(_) => return Err(SessionError::AlreadySubmitted),
            SubmissionStatus::Idle => return Err(SessionError::NotCompleted),
        }
        let answers = self.flow.answers().clone();
        self.spawn_submission(answers).ok_or(SessionError::InFlight)
    }

    fn spawn_submission(&self, answers: AnswerMap) -> Option<SubmissionHandle> {
        let guard = InFlightGuard::acquire(self.in_flight.clone(), self.status.clone())?;
        let coordinator = self.coordinator.clone();
        debug!(answers = answers.len(), "Spawning submission");

        let task = tokio::spawn(async move {
            let result = coordinator.submit(&answers).await;
            let outcome = match &result {
                Ok(receipt) => SubmissionStatus::Succeeded(receipt.clone()),
                Err(e) => SubmissionStatus::Failed {
                    reason: e.to_string(),
                },
            };
            guard.settle(outcome);
            result
        });
        Some(SubmissionHandle { task })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{Notification, NotificationKind};
    use questionnaire::catalog;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::time::Duration;
    use survey_store::{Filter, MemoryStore, Operation, SurveyStore, Table};

    /// Store whose writes panic, killing the submission task mid-flight.
    struct PanickingStore;

    #[async_trait]
    impl SurveyStore for PanickingStore {
        fn id(&self) -> &str {
            "panicking"
        }

        async fn insert(&self, table: Table, _row: Value) -> survey_store::Result<Value> {
            panic!("insert into {} blew up", table)
        }

        async fn query(
            &self,
            _table: Table,
            _filters: &[Filter],
            _limit: Option<usize>,
        ) -> survey_store::Result<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn insert_many(&self, _table: Table, _rows: Vec<Value>) -> survey_store::Result<()> {
            Ok(())
        }
    }

    const ANSWERS: [&str; 10] = [
        "Homem Cisgênero",
        "18 a 25 anos",
        "Jogo de futebol",
        "Carro próprio",
        "9",
        "Muito fácil",
        "Segurança",
        "Estacionamento",
        "Amei!",
        "Anitta",
    ];

    fn session(store: &Arc<MemoryStore>) -> SurveySession {
        let coordinator = Arc::new(SubmissionCoordinator::new(store.clone()));
        SurveySession::new(catalog::arena_brb(), coordinator)
    }

    /// Answer everything; returns the handle from the final advance.
    fn finish(session: &mut SurveySession) -> SubmissionHandle {
        for (i, answer) in ANSWERS.iter().enumerate() {
            session.record_answer(*answer).unwrap();
            match session.advance() {
                Advance::Moved { position } => assert_eq!(position, i + 1),
                Advance::Submitting(handle) => {
                    assert_eq!(i, ANSWERS.len() - 1);
                    return handle;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        panic!("flow never completed");
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);

        let receipt = finish(&mut session).outcome().await.unwrap();

        assert_eq!(receipt.responses_written, 6);
        assert!(receipt.event_created());
        assert!(!session.is_submitting());
        assert_eq!(session.status(), SubmissionStatus::Succeeded(receipt));
        assert_eq!(
            Notification::for_status(&session.status()).unwrap().kind,
            NotificationKind::Success
        );
        assert_eq!(store.count(Table::Respondent).await, 1);
        assert_eq!(store.count(Table::Response).await, 6);
    }

    #[tokio::test]
    async fn test_advance_without_answer() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);

        assert!(matches!(session.advance(), Advance::NeedsAnswer));
        assert_eq!(session.status(), SubmissionStatus::Idle);
        assert!((session.progress_fraction() - 0.1).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_advance_while_in_flight_is_ignored() {
        let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(200)));
        let mut session = session(&store);

        let handle = finish(&mut session);
        assert!(session.is_submitting());
        assert_eq!(session.status(), SubmissionStatus::InFlight);
        assert!(matches!(session.advance(), Advance::InFlight));
        assert!(matches!(session.advance(), Advance::InFlight));
        assert_eq!(session.retry().unwrap_err(), SessionError::InFlight);

        handle.outcome().await.unwrap();

        assert_eq!(store.count(Table::Respondent).await, 1);
        assert!(matches!(session.advance(), Advance::Completed));
    }

    #[tokio::test]
    async fn test_failure_clears_flag_and_allows_retry() {
        let store = Arc::new(
            MemoryStore::new().with_failure(Table::Response, Operation::InsertMany),
        );
        let mut session = session(&store);

        let err = finish(&mut session).outcome().await.unwrap_err();
        assert!(matches!(err, SubmissionError::ResponseBatchInsertFailed(_)));
        assert!(!session.is_submitting());
        assert!(session.flow().is_completed());
        assert!(matches!(session.status(), SubmissionStatus::Failed { .. }));
        assert_eq!(
            Notification::for_status(&session.status()),
            Some(Notification::failed())
        );

        let again = session.retry().unwrap().outcome().await;
        assert!(again.is_err());
        // Each attempt writes its own respondent
        assert_eq!(store.count(Table::Respondent).await, 2);
        assert_eq!(store.count(Table::Response).await, 0);
    }

    #[tokio::test]
    async fn test_retry_rules() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        assert_eq!(session.retry().unwrap_err(), SessionError::NotCompleted);

        finish(&mut session).outcome().await.unwrap();
        assert_eq!(session.retry().unwrap_err(), SessionError::AlreadySubmitted);
    }

    #[tokio::test]
    async fn test_subscribers_see_settlement() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        let mut rx = session.subscribe();

        let _handle = finish(&mut session);

        let status = rx
            .wait_for(SubmissionStatus::is_settled)
            .await
            .unwrap()
            .clone();
        assert!(matches!(status, SubmissionStatus::Succeeded(_)));
    }

    #[tokio::test]
    async fn test_recording_after_completion_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(&store);
        finish(&mut session).outcome().await.unwrap();

        assert_eq!(
            session.record_answer("outra").unwrap_err(),
            SessionError::Flow(questionnaire::FlowError::Completed)
        );
        assert_eq!(session.progress_fraction(), 1.0);
    }

    #[tokio::test]
    async fn test_panicking_task_clears_flag_and_allows_retry() {
        let coordinator = Arc::new(SubmissionCoordinator::new(Arc::new(PanickingStore)));
        let mut session = SurveySession::new(catalog::arena_brb(), coordinator);

        let err = finish(&mut session).outcome().await.unwrap_err();
        assert!(matches!(err, SubmissionError::Interrupted(_)));
        assert!(!session.is_submitting());
        assert_eq!(
            session.status(),
            SubmissionStatus::Failed {
                reason: "interrupted".into()
            }
        );

        let again = session.retry().expect("retry after an interrupted attempt");
        assert!(matches!(
            again.outcome().await,
            Err(SubmissionError::Interrupted(_))
        ));
        assert!(!session.is_submitting());
    }
}
