//! Which question ordinal feeds which persisted field.

use serde::{Deserialize, Serialize};

/// `question_id` tags written to `fct_response`.
pub mod question_ids {
    pub const NPS: &str = "nps";
    pub const WAYFINDING_EASE: &str = "wayfinding_ease";
    pub const TROPHY: &str = "trophy";
    pub const FRUSTRATION: &str = "frustration";
    pub const VIBE: &str = "vibe";
    pub const NEXT_ARTIST: &str = "next_artist";

    /// All tags, in the order rows are written.
    pub const ALL: [&str; 6] = [NPS, WAYFINDING_EASE, TROPHY, FRUSTRATION, VIBE, NEXT_ARTIST];
}

/// Ordinals of the designated questions. Defaults match the built-in
/// Arena BRB catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerLayout {
    pub gender: usize,
    pub age_band: usize,
    pub event_type: usize,
    pub transport_mode: usize,
    pub nps: usize,
    pub wayfinding_ease: usize,
    pub trophy: usize,
    pub frustration: usize,
    pub vibe: usize,
    pub next_artist: usize,
}

impl Default for AnswerLayout {
    fn default() -> Self {
        Self {
            gender: 0,
            age_band: 1,
            event_type: 2,
            transport_mode: 3,
            nps: 4,
            wayfinding_ease: 5,
            trophy: 6,
            frustration: 7,
            vibe: 8,
            next_artist: 9,
        }
    }
}

impl AnswerLayout {
    /// `(question_id, ordinal)` for each response row.
    pub fn response_slots(&self) -> [(&'static str, usize); 6] {
        [
            (question_ids::NPS, self.nps),
            (question_ids::WAYFINDING_EASE, self.wayfinding_ease),
            (question_ids::TROPHY, self.trophy),
            (question_ids::FRUSTRATION, self.frustration),
            (question_ids::VIBE, self.vibe),
            (question_ids::NEXT_ARTIST, self.next_artist),
        ]
    }
}
