//! Configuration for arena-survey
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chrono::{Duration, Utc};
use survey_service::DashboardFilters;
use survey_store::StoreConfig;

/// Arena Mais Verde - visitor survey
#[derive(Parser, Debug, Clone)]
#[command(name = "arena-survey")]
#[command(about = "Collect, submit and report on Arena Mais Verde visitor surveys")]
pub struct Args {
    /// Project URL of the tables API (without /rest/v1)
    #[arg(long, env = "SUPABASE_URL", default_value = "http://localhost:54321")]
    pub supabase_url: String,

    /// Anonymous API key, sent as apikey and bearer token
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Timeout for each store request, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// YAML questionnaire to use instead of the built-in one
    #[arg(long, env = "SURVEY_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Keep everything in memory instead of calling the tables API
    #[arg(long)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer the questionnaire on stdin and submit it
    Take,

    /// Run the tree counter simulation
    Counter {
        /// Starting response count
        #[arg(long, default_value = "0")]
        initial: u64,

        /// How long to run, in seconds
        #[arg(long, default_value = "30")]
        seconds: u64,

        /// Tick interval, in milliseconds
        #[arg(long, default_value = "3000")]
        interval_ms: u64,
    },

    /// Print dashboard figures
    Dashboard {
        /// Days back from today
        #[arg(long, default_value = "30")]
        days: i64,

        #[arg(long)]
        event_type: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        age_band: Option<String>,

        #[arg(long)]
        transport_mode: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(format!(
                "LOG_LEVEL must be one of {}",
                LOG_LEVELS.join(", ")
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if !self.memory {
            if !(self.supabase_url.starts_with("http://") || self.supabase_url.starts_with("https://")) {
                return Err("SUPABASE_URL must be an http(s) URL".to_string());
            }
            if self.supabase_anon_key.as_deref().map_or(true, str::is_empty) {
                return Err("SUPABASE_ANON_KEY is required unless --memory is set".to_string());
            }
        }

        if let Command::Dashboard { days, .. } = &self.command {
            if *days < 0 {
                return Err("--days must not be negative".to_string());
            }
        }

        Ok(())
    }

    /// Filter used when RUST_LOG is not set: our crates at `level`, the
    /// rest at info.
    pub fn default_log_filter(level: &str) -> String {
        ["arena_survey", "survey_cli", "survey_service", "survey_store", "questionnaire"]
            .iter()
            .map(|target| format!("{}={}", target, level))
            .chain(std::iter::once("info".to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Store settings; the timeout is rounded up to whole seconds.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            base_url: self.supabase_url.clone(),
            api_key: self.supabase_anon_key.clone(),
            timeout_secs: self.request_timeout_ms.div_ceil(1000).max(1),
        }
    }
}

impl Command {
    /// Dashboard filters for the `dashboard` subcommand.
    pub fn dashboard_filters(&self) -> Option<DashboardFilters> {
        let Command::Dashboard {
            days,
            event_type,
            gender,
            age_band,
            transport_mode,
            ..
        } = self
        else {
            return None;
        };
        let today = Utc::now().date_naive();
        Some(DashboardFilters {
            from: today - Duration::days(*days),
            to: today,
            event_type: event_type.clone(),
            gender: gender.clone(),
            age_band: age_band.clone(),
            transport_mode: transport_mode.clone(),
        })
    }
}
