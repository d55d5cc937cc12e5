//! Event categories and the label → code lookup used when creating events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical event categories stored in `dim_event.event_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "shows/festivais")]
    ShowsFestivais,
    #[serde(rename = "executivo")]
    Executivo,
    #[serde(rename = "futebol")]
    Futebol,
    #[serde(rename = "infantil")]
    Infantil,
    #[serde(rename = "tour")]
    Tour,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        Self::ShowsFestivais,
        Self::Executivo,
        Self::Futebol,
        Self::Infantil,
        Self::Tour,
    ];

    /// Category used when a label is not recognised.
    pub const FALLBACK: EventType = Self::Tour;

    /// Stored code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ShowsFestivais => "shows/festivais",
            Self::Executivo => "executivo",
            Self::Futebol => "futebol",
            Self::Infantil => "infantil",
            Self::Tour => "tour",
        }
    }

    /// Option label shown in the questionnaire.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ShowsFestivais => "Shows/Festivais",
            Self::Executivo => "Evento Executivo",
            Self::Futebol => "Jogo de futebol",
            Self::Infantil => "Evento infantil",
            Self::Tour => "Tour guiado",
        }
    }

    /// Exact, case-sensitive label match.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Label → category, [`EventType::FALLBACK`] for anything unknown.
    pub fn classify(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Self::FALLBACK)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
