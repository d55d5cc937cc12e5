//! CX dashboard aggregations read back from the survey tables.
//!
//! Events are filtered by date and type, respondents by demographics; the
//! response facts of both surviving sets are joined in memory and reduced
//! into [`DashboardData`].

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use survey_store::{
    query_all_records, EventRecord, Filter, RecordId, RespondentRecord, ResponseRecord, StoreError,
    SurveyStore, Table,
};

use crate::coordinator::parse_numeric;
use crate::layout::question_ids;

/// Label used for respondents who left a demographic blank.
pub const UNANSWERED: &str = "Não informado";

/// Rows requested per page; hosted PostgREST caps pages at 1000 by default.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Event ids per `event_id=in.(…)` response query, to bound URL length.
const EVENT_IDS_PER_QUERY: usize = 100;

/// Which slice of the data the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilters {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub event_type: Option<String>,
    pub gender: Option<String>,
    pub age_band: Option<String>,
    pub transport_mode: Option<String>,
}

impl Default for DashboardFilters {
    /// The last 30 days, no other restriction.
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            from: today - Duration::days(30),
            to: today,
            event_type: None,
            gender: None,
            age_band: None,
            transport_mode: None,
        }
    }
}

impl DashboardFilters {
    fn event_filters(&self) -> Vec<Filter> {
        let mut filters = vec![
            Filter::gte("event_date", self.from.to_string()),
            Filter::lte("event_date", self.to.to_string()),
        ];
        if let Some(event_type) = &self.event_type {
            filters.push(Filter::eq("event_type", event_type));
        }
        filters
    }

    fn respondent_filters(&self) -> Vec<Filter> {
        [
            ("gender", &self.gender),
            ("age_band", &self.age_band),
            ("transport_mode", &self.transport_mode),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_ref().map(|v| Filter::eq(column, v)))
        .collect()
    }
}

/// NPS classification of a 0–10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpsBand {
    Promoter,
    Passive,
    Detractor,
}

impl NpsBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Self::Promoter
        } else if score >= 7.0 {
            Self::Passive
        } else {
            Self::Detractor
        }
    }
}

/// Band counts and the derived score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NpsBreakdown {
    pub promoters: usize,
    pub passives: usize,
    pub detractors: usize,
}

impl NpsBreakdown {
    fn add(&mut self, band: NpsBand) {
        match band {
            NpsBand::Promoter => self.promoters += 1,
            NpsBand::Passive => self.passives += 1,
            NpsBand::Detractor => self.detractors += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.promoters + self.passives + self.detractors
    }

    /// `%promoters - %detractors`, in `-100..=100`; `None` without answers.
    pub fn score(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some((self.promoters as f64 - self.detractors as f64) * 100.0 / total as f64)
    }

    pub fn promoter_share(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.promoters as f64 * 100.0 / total as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub respondents: usize,
    pub responses: usize,
    pub nps: NpsBreakdown,
    pub nps_score: Option<f64>,
    pub promoter_share: Option<f64>,
}

/// One answer value and how often it was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedAnswer {
    pub value: String,
    pub count: usize,
}

/// NPS bands among respondents who gave one vibe answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibeRow {
    pub vibe: String,
    pub nps: NpsBreakdown,
}

/// NPS within one demographic group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    pub segment: String,
    pub respondents: usize,
    pub nps_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segments {
    pub by_gender: Vec<SegmentScore>,
    pub by_age_band: Vec<SegmentScore>,
    pub by_transport_mode: Vec<SegmentScore>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHealth {
    /// Respondents with some, but not all six, response rows
    pub incomplete_respondents: usize,
    /// Respondents with no response rows for the selected events (failed
    /// submissions, or answers given at other events)
    pub respondents_without_responses: usize,
    /// NPS rows whose value is not a number
    pub unparsable_nps: usize,
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub kpis: KpiSummary,
    pub nps_vibe: Vec<VibeRow>,
    pub trophies: Vec<RankedAnswer>,
    pub frustrations: Vec<RankedAnswer>,
    pub wayfinding: Vec<RankedAnswer>,
    pub segments: Segments,
    pub top_artists: Vec<RankedAnswer>,
    pub health: DataHealth,
}

/// Loads and aggregates dashboard data from a store.
pub struct Dashboard {
    store: Arc<dyn SurveyStore>,
    page_size: usize,
}

impl Dashboard {
    pub fn new(store: Arc<dyn SurveyStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Read the filtered events and respondents, then only the responses
    /// that belong to those events. Every read is paged.
    pub async fn load(&self, filters: &DashboardFilters) -> Result<DashboardData, StoreError> {
        let store = self.store.as_ref();
        let events: Vec<EventRecord> =
            query_all_records(store, Table::Event, &filters.event_filters(), self.page_size).await?;
        let respondents: Vec<RespondentRecord> = query_all_records(
            store,
            Table::Respondent,
            &filters.respondent_filters(),
            self.page_size,
        )
        .await?;

        let mut responses: Vec<ResponseRecord> = Vec::new();
        for batch in events.chunks(EVENT_IDS_PER_QUERY) {
            let in_events = Filter::one_of("event_id", batch.iter().map(|e| e.event_id.to_string()));
            responses.extend(
                query_all_records::<_, ResponseRecord>(
                    store,
                    Table::Response,
                    &[in_events],
                    self.page_size,
                )
                .await?,
            );
        }
        debug!(
            events = events.len(),
            respondents = respondents.len(),
            responses = responses.len(),
            "Loaded dashboard rows"
        );

        let data = DashboardData::aggregate(&events, &respondents, &responses);
        info!(
            respondents = data.kpis.respondents,
            responses = data.kpis.responses,
            nps = ?data.kpis.nps_score,
            "Dashboard aggregated"
        );
        Ok(data)
    }
}

impl DashboardData {
    /// Join the three tables and reduce them.
    ///
    /// Only responses whose event and respondent both survived filtering
    /// count.
    pub fn aggregate(
        events: &[EventRecord],
        respondents: &[RespondentRecord],
        responses: &[ResponseRecord],
    ) -> Self {
        let event_ids: HashSet<&RecordId> = events.iter().map(|e| &e.event_id).collect();
        let people: HashMap<&RecordId, &RespondentRecord> =
            respondents.iter().map(|r| (&r.respondent_id, r)).collect();

        let mut answered: HashSet<&RecordId> = HashSet::new();
        for response in responses {
            if people.contains_key(&response.respondent_id) {
                answered.insert(&response.respondent_id);
            }
        }

        let kept: Vec<&ResponseRecord> = responses
            .iter()
            .filter(|r| event_ids.contains(&r.event_id) && people.contains_key(&r.respondent_id))
            .collect();

        let mut data = DashboardData::default();
        let mut per_respondent: BTreeMap<String, RespondentAnswers<'_>> = BTreeMap::new();

        for response in &kept {
            let entry = per_respondent
                .entry(response.respondent_id.to_string())
                .or_insert_with(|| RespondentAnswers::new(people[&response.respondent_id]));
            entry.questions.insert(response.question_id.as_str());

            let value = response.answer_value.as_deref().unwrap_or_default();
            match response.question_id.as_str() {
                question_ids::NPS => {
                    let score = response.answer_numeric.or_else(|| parse_numeric(value));
                    match score {
                        Some(score) => entry.nps = Some(NpsBand::from_score(score)),
                        None => data.health.unparsable_nps += 1,
                    }
                }
                question_ids::VIBE => entry.vibe = Some(value),
                _ => {}
            }
        }

        data.kpis.responses = kept.len();
        data.kpis.respondents = per_respondent.len();
        for answers in per_respondent.values() {
            if let Some(band) = answers.nps {
                data.kpis.nps.add(band);
            }
            if answers.questions.len() < question_ids::ALL.len() {
                data.health.incomplete_respondents += 1;
            }
        }
        data.kpis.nps_score = data.kpis.nps.score();
        data.kpis.promoter_share = data.kpis.nps.promoter_share();
        data.health.respondents_without_responses = respondents
            .iter()
            .filter(|r| !answered.contains(&r.respondent_id))
            .count();

        data.nps_vibe = vibe_matrix(per_respondent.values());
        data.trophies = rank(values_for(&kept, question_ids::TROPHY));
        data.frustrations = rank(values_for(&kept, question_ids::FRUSTRATION));
        data.wayfinding = rank(values_for(&kept, question_ids::WAYFINDING_EASE));
        data.top_artists = rank_folded(values_for(&kept, question_ids::NEXT_ARTIST));
        data.segments = Segments {
            by_gender: segment(per_respondent.values(), |r| r.gender.as_deref()),
            by_age_band: segment(per_respondent.values(), |r| r.age_band.as_deref()),
            by_transport_mode: segment(per_respondent.values(), |r| r.transport_mode.as_deref()),
        };
        data
    }
}

struct RespondentAnswers<'a> {
    respondent: &'a RespondentRecord,
    questions: HashSet<&'a str>,
    nps: Option<NpsBand>,
    vibe: Option<&'a str>,
}

impl<'a> RespondentAnswers<'a> {
    fn new(respondent: &'a RespondentRecord) -> Self {
        Self {
            respondent,
            questions: HashSet::new(),
            nps: None,
            vibe: None,
        }
    }
}

fn values_for<'a>(responses: &[&'a ResponseRecord], question_id: &str) -> Vec<&'a str> {
    responses
        .iter()
        .filter(|r| r.question_id == question_id)
        .filter_map(|r| r.answer_value.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

/// Most frequent first; ties alphabetical.
fn rank<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<RankedAnswer> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    sorted(counts.into_iter().map(|(value, count)| RankedAnswer {
        value: value.to_string(),
        count,
    }))
}

/// Like [`rank`] but merges values that differ only in case. The first
/// spelling seen is the one reported.
fn rank_folded<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<RankedAnswer> {
    let mut counts: HashMap<String, RankedAnswer> = HashMap::new();
    for value in values {
        counts
            .entry(value.to_lowercase())
            .or_insert_with(|| RankedAnswer {
                value: value.to_string(),
                count: 0,
            })
            .count += 1;
    }
    sorted(counts.into_values())
}

fn sorted(answers: impl IntoIterator<Item = RankedAnswer>) -> Vec<RankedAnswer> {
    let mut answers: Vec<RankedAnswer> = answers.into_iter().collect();
    answers.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    answers
}

fn vibe_matrix<'a, 'b: 'a>(respondents: impl Iterator<Item = &'a RespondentAnswers<'b>>) -> Vec<VibeRow> {
    let mut rows: BTreeMap<&str, NpsBreakdown> = BTreeMap::new();
    for answers in respondents {
        if let (Some(vibe), Some(band)) = (answers.vibe, answers.nps) {
            rows.entry(vibe).or_default().add(band);
        }
    }
    rows.into_iter()
        .map(|(vibe, nps)| VibeRow {
            vibe: vibe.to_string(),
            nps,
        })
        .collect()
}

fn segment<'a, 'b: 'a>(
    respondents: impl Iterator<Item = &'a RespondentAnswers<'b>>,
    key: impl Fn(&RespondentRecord) -> Option<&str>,
) -> Vec<SegmentScore> {
    let mut groups: BTreeMap<String, (usize, NpsBreakdown)> = BTreeMap::new();
    for answers in respondents {
        let name = key(answers.respondent)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(UNANSWERED);
        let (count, nps) = groups.entry(name.to_string()).or_default();
        *count += 1;
        if let Some(band) = answers.nps {
            nps.add(band);
        }
    }
    groups
        .into_iter()
        .map(|(segment, (respondents, nps))| SegmentScore {
            segment,
            respondents,
            nps_score: nps.score(),
        })
        .collect()
}
