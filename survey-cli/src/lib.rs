//! arena-survey - command-line host for the Arena Mais Verde survey
//!
//! Wires the questionnaire, the submission workflow and the tables API
//! client together behind a small set of subcommands.

pub mod config;
pub mod prompt;

pub use config::{Args, Command};
