//! Survey Service - submission workflow for the Arena Mais Verde survey
//!
//! Takes the answers collected by a [`questionnaire::QuestionFlow`] and
//! persists them through an injected [`survey_store::SurveyStore`]:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            SurveySession                │
//! │  (flow + in-flight guard + status)      │
//! └────────────────┬────────────────────────┘
//!                  │ final AnswerMap
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │        SubmissionCoordinator            │
//! │ respondent → event (get/create) → rows  │
//! └────────────────┬────────────────────────┘
//!                  ▼
//!          Arc<dyn SurveyStore>
//! ```
//!
//! Alongside the workflow live the [`impact`] counter (trees planted per
//! hundred answers) and the [`dashboard`] aggregations read back from the
//! same store.

pub mod coordinator;
pub mod dashboard;
pub mod error;
pub mod event_type;
pub mod impact;
pub mod layout;
pub mod notification;
pub mod session;

pub use coordinator::{CoordinatorConfig, EventSource, SubmissionCoordinator, SubmissionReceipt};
pub use dashboard::{Dashboard, DashboardData, DashboardFilters};
pub use error::{SessionError, SubmissionError};
pub use event_type::EventType;
pub use impact::{CounterConfig, CounterHandle, CounterSimulation, ImpactTally};
pub use layout::AnswerLayout;
pub use notification::{Notification, NotificationKind};
pub use session::{Advance, SubmissionHandle, SubmissionStatus, SurveySession};
