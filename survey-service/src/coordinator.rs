//! SubmissionCoordinator - persists one completed questionnaire.
//!
//! The sequence is strict and stops at the first failure:
//!
//! 1. insert the respondent,
//! 2. resolve an event (same type → any event → create one),
//! 3. insert the six response rows as one batch.
//!
//! Nothing is rolled back: a respondent or event created before a later step
//! fails stays in the store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use questionnaire::AnswerMap;
use survey_store::{
    insert_record, insert_records, Filter, NewEvent, NewRespondent, NewResponse, RecordId,
    SurveyStore, Table,
};

use crate::error::SubmissionError;
use crate::event_type::EventType;
use crate::layout::AnswerLayout;

/// Venue appended to generated event names.
pub const DEFAULT_VENUE: &str = "Arena BRB";

/// Capacity given to generated events.
pub const DEFAULT_CAPACITY: u32 = 1000;

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Venue name used in generated event names
    pub venue_name: String,
    /// Capacity for generated events
    pub default_capacity: u32,
    /// Which ordinal feeds which field
    pub layout: AnswerLayout,
    /// Bound on the whole submission sequence
    pub timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            venue_name: DEFAULT_VENUE.to_string(),
            default_capacity: DEFAULT_CAPACITY,
            layout: AnswerLayout::default(),
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// How the event for a submission was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// An event whose type equals the answer
    MatchedType,
    /// Some other existing event
    AnyExisting,
    /// A new event inserted for this submission
    Created,
}

/// What a successful submission wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub respondent_id: RecordId,
    pub event_id: RecordId,
    pub event_source: EventSource,
    pub responses_written: usize,
}

impl SubmissionReceipt {
    /// True when this submission inserted its own event.
    pub fn event_created(&self) -> bool {
        self.event_source == EventSource::Created
    }
}

/// Persists completed answer maps through an injected store.
pub struct SubmissionCoordinator {
    store: Arc<dyn SurveyStore>,
    config: CoordinatorConfig,
}

impl SubmissionCoordinator {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self {
            store,
            config: CoordinatorConfig::default(),
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SurveyStore> {
        &self.store
    }

    /// Run the full sequence for one completed questionnaire.
    ///
    /// Failures are logged here with their cause; callers only need the
    /// outcome.
    pub async fn submit(&self, answers: &AnswerMap) -> Result<SubmissionReceipt, SubmissionError> {
        let result = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(answers))
                .await
                .unwrap_or_else(|_| {
                    Err(SubmissionError::Interrupted(format!(
                        "timed out after {}s",
                        limit.as_secs()
                    )))
                }),
            None => self.run(answers).await,
        };

        match &result {
            Ok(receipt) => info!(
                store = self.store.id(),
                respondent_id = %receipt.respondent_id,
                event_id = %receipt.event_id,
                event_source = ?receipt.event_source,
                "Survey submitted"
            ),
            Err(e) => error!(
                store = self.store.id(),
                kind = e.kind(),
                error = %e,
                "Error saving survey"
            ),
        }
        result
    }

    async fn run(&self, answers: &AnswerMap) -> Result<SubmissionReceipt, SubmissionError> {
        let respondent_id = self.create_respondent(answers).await?;
        let (event_id, event_source) = self.resolve_event(answers).await?;

        let rows = self.response_rows(answers, &event_id, &respondent_id);
        debug!(rows = rows.len(), "Inserting responses");
        insert_records(self.store.as_ref(), Table::Response, &rows)
            .await
            .map_err(SubmissionError::ResponseBatchInsertFailed)?;

        Ok(SubmissionReceipt {
            respondent_id,
            event_id,
            event_source,
            responses_written: rows.len(),
        })
    }

    async fn create_respondent(&self, answers: &AnswerMap) -> Result<RecordId, SubmissionError> {
        let layout = &self.config.layout;
        let row = NewRespondent {
            gender: owned(answers, layout.gender),
            age_band: owned(answers, layout.age_band),
            transport_mode: owned(answers, layout.transport_mode),
        };

        let id = insert_record(self.store.as_ref(), Table::Respondent, &row)
            .await
            .map_err(SubmissionError::RespondentCreationFailed)?;
        debug!(respondent_id = %id, "Respondent created");
        Ok(id)
    }

    /// Three tiers, first hit wins: an event whose type equals the answer
    /// (raw label, then its canonical code), then any event, then a freshly
    /// inserted one.
    async fn resolve_event(&self, answers: &AnswerMap) -> Result<(RecordId, EventSource), SubmissionError> {
        let answer = answers.get(self.config.layout.event_type);

        for candidate in type_candidates(answer) {
            let rows = self
                .store
                .query(Table::Event, &[Filter::eq("event_type", candidate)], Some(1))
                .await
                .map_err(SubmissionError::EventResolutionFailed)?;
            if let Some(row) = rows.first() {
                let id = RecordId::from_row(Table::Event, row)
                    .map_err(SubmissionError::EventResolutionFailed)?;
                debug!(event_id = %id, event_type = candidate, "Matched event by type");
                return Ok((id, EventSource::MatchedType));
            }
        }

        let existing = self
            .store
            .query_first(Table::Event)
            .await
            .map_err(SubmissionError::EventResolutionFailed)?;
        if let Some(row) = existing {
            let id = RecordId::from_row(Table::Event, &row)
                .map_err(SubmissionError::EventResolutionFailed)?;
            debug!(event_id = %id, "Using existing event");
            return Ok((id, EventSource::AnyExisting));
        }

        let event = self.new_event(answer.unwrap_or_default());
        let id = insert_record(self.store.as_ref(), Table::Event, &event)
            .await
            .map_err(SubmissionError::EventCreationFailed)?;
        info!(event_id = %id, event_code = %event.event_code, event_type = %event.event_type, "Created event");
        Ok((id, EventSource::Created))
    }

    fn new_event(&self, label: &str) -> NewEvent {
        NewEvent {
            event_code: generate_event_code(),
            name: format!("{} - {}", label, self.config.venue_name),
            event_date: Utc::now().date_naive(),
            event_type: EventType::classify(label).code().to_string(),
            capacity: self.config.default_capacity,
        }
    }

    fn response_rows(
        &self,
        answers: &AnswerMap,
        event_id: &RecordId,
        respondent_id: &RecordId,
    ) -> Vec<NewResponse> {
        let nps_ordinal = self.config.layout.nps;
        self.config
            .layout
            .response_slots()
            .into_iter()
            .map(|(question_id, ordinal)| NewResponse {
                event_id: event_id.clone(),
                respondent_id: respondent_id.clone(),
                question_id: question_id.to_string(),
                answer_numeric: if ordinal == nps_ordinal {
                    answers.get(ordinal).and_then(parse_numeric)
                } else {
                    None
                },
                answer_value: owned(answers, ordinal),
            })
            .collect()
    }
}

/// `event_type` values that count as a match for an answer. Unknown labels
/// only match themselves.
fn type_candidates(answer: Option<&str>) -> Vec<&str> {
    let Some(label) = answer else {
        return Vec::new();
    };
    let mut candidates = vec![label];
    if let Some(known) = EventType::from_label(label) {
        if known.code() != label {
            candidates.push(known.code());
        }
    }
    candidates
}

fn owned(answers: &AnswerMap, ordinal: usize) -> Option<String> {
    answers.get(ordinal).map(str::to_string)
}

/// Numeric value of a scale answer; `None` when it is not a finite number.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `EVT<unix millis>-<random suffix>`, unique at insertion time.
pub fn generate_event_code() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("EVT{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}
