//! Questionnaire flow for the Arena Mais Verde survey
//!
//! This crate holds the question catalogue and the state machine that walks a
//! respondent through it:
//!
//! - [`Question`]: immutable definition (ordinal, prompt, kind, options)
//! - [`AnswerMap`]: ordinal-keyed raw answers, last write wins
//! - [`QuestionFlow`]: `Active(position)` → `Completed` navigation
//! - [`catalog`]: the built-in Arena BRB questions and YAML loading
//!
//! # Example
//!
//! ```
//! use questionnaire::{catalog, QuestionFlow, Step};
//!
//! let mut flow = QuestionFlow::new(catalog::arena_brb());
//! flow.record_answer("Mulher Trans").unwrap();
//! assert!(matches!(flow.advance(), Step::Moved { position: 1 }));
//! ```

pub mod answers;
pub mod catalog;
pub mod error;
pub mod flow;
pub mod types;

pub use answers::AnswerMap;
pub use catalog::Questionnaire;
pub use error::{CatalogError, FlowError};
pub use flow::{FlowState, QuestionFlow, Step};
pub use types::*;
