//! Tables, filters and row shapes of the survey schema.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, StoreError};

/// Tables the survey reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// `dim_respondent`: one row per submission
    Respondent,
    /// `dim_event`: reference data for the occasion surveyed
    Event,
    /// `fct_response`: one row per answered question
    Response,
}

impl Table {
    /// Physical table name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Respondent => "dim_respondent",
            Self::Event => "dim_event",
            Self::Response => "fct_response",
        }
    }

    /// Generated key column.
    pub fn primary_key(&self) -> &'static str {
        match self {
            Self::Respondent => "respondent_id",
            Self::Event => "event_id",
            Self::Response => "response_id",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generated row identifier; integer or text depending on the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Read `table`'s key column out of a returned row.
    pub fn from_row(table: Table, row: &Value) -> Result<Self> {
        let missing = || StoreError::MissingId {
            table: table.name().to_string(),
            column: table.primary_key().to_string(),
        };
        match row.get(table.primary_key()) {
            Some(Value::Number(n)) => n.as_i64().map(Self::Int).ok_or_else(missing),
            Some(Value::String(s)) => Ok(Self::Text(s.clone())),
            _ => Err(missing()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
    /// Membership in a list; the value is a PostgREST list literal
    In,
}

impl FilterOp {
    /// PostgREST operator keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::In => "in",
        }
    }
}

/// Column filter, rendered as `column=op.value` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    pub fn gte(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Gte, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Lte, value)
    }

    /// Column value is one of `values`, rendered as `(a,b,"c,d")`.
    pub fn one_of<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let members: Vec<String> = values
            .into_iter()
            .map(|v| quote_list_member(v.as_ref()))
            .collect();
        Self::new(column, FilterOp::In, format!("({})", members.join(",")))
    }

    fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Query-string fragment, value URL-encoded.
    pub fn to_query_param(&self) -> String {
        format!(
            "{}={}.{}",
            self.column,
            self.op.as_str(),
            urlencoding::encode(&self.value)
        )
    }

    /// Evaluate against a JSON row. Null or missing columns never match.
    pub fn matches(&self, row: &Value) -> bool {
        let cell = match row.get(&self.column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return false,
        };

        if self.op == FilterOp::In {
            return list_members(&self.value)
                .iter()
                .any(|member| compare(&cell, member) == Some(Ordering::Equal));
        }

        match (self.op, compare(&cell, &self.value)) {
            (FilterOp::Eq, ordering) => cell == self.value || ordering == Some(Ordering::Equal),
            (FilterOp::Gte, Some(o)) => o != Ordering::Less,
            (FilterOp::Lte, Some(o)) => o != Ordering::Greater,
            _ => false,
        }
    }
}

/// Numeric when both sides parse, lexical otherwise.
fn compare(cell: &str, value: &str) -> Option<Ordering> {
    match (cell.parse::<f64>(), value.parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b),
        _ => Some(cell.cmp(value)),
    }
}

/// Quote a list member when it carries list syntax or edge whitespace.
fn quote_list_member(value: &str) -> String {
    let plain = !value.is_empty()
        && value.trim() == value
        && !value.contains([',', '(', ')', '"', '\\']);
    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Split a `(a,"b,c")` list literal back into its members.
fn list_members(list: &str) -> Vec<String> {
    let inner = list
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(list);
    if inner.is_empty() {
        return Vec::new();
    }

    let mut members = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => quoted = !quoted,
            '\\' if quoted => current.extend(chars.next()),
            ',' if !quoted => members.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    members.push(current);
    members
}

// ==================== Write shapes ====================

/// Row written to `dim_respondent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRespondent {
    pub gender: Option<String>,
    pub age_band: Option<String>,
    pub transport_mode: Option<String>,
}

/// Row written to `dim_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_code: String,
    pub name: String,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub capacity: u32,
}

/// Row written to `fct_response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResponse {
    pub event_id: RecordId,
    pub respondent_id: RecordId,
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_numeric: Option<f64>,
    pub answer_value: Option<String>,
}

// ==================== Read shapes ====================

/// Row read from `dim_respondent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespondentRecord {
    pub respondent_id: RecordId,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age_band: Option<String>,
    #[serde(default)]
    pub transport_mode: Option<String>,
}

/// Row read from `dim_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: RecordId,
    #[serde(default)]
    pub event_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
}

/// Row read from `fct_response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(default)]
    pub response_id: Option<RecordId>,
    pub event_id: RecordId,
    pub respondent_id: RecordId,
    pub question_id: String,
    #[serde(default)]
    pub answer_numeric: Option<f64>,
    #[serde(default)]
    pub answer_value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_from_row() {
        let row = json!({"event_id": 42, "name": "x"});
        assert_eq!(RecordId::from_row(Table::Event, &row).unwrap(), RecordId::Int(42));

        let row = json!({"respondent_id": "6f1c"});
        assert_eq!(
            RecordId::from_row(Table::Respondent, &row).unwrap(),
            RecordId::Text("6f1c".into())
        );

        let err = RecordId::from_row(Table::Event, &json!({})).unwrap_err();
        assert!(matches!(err, StoreError::MissingId { .. }));
    }

    #[test]
    fn test_filter_query_param_encodes_value() {
        let filter = Filter::eq("event_type", "Shows/Festivais");
        assert_eq!(filter.to_query_param(), "event_type=eq.Shows%2FFestivais");
        assert_eq!(
            Filter::gte("event_date", "2026-01-01").to_query_param(),
            "event_date=gte.2026-01-01"
        );
    }

    #[test]
    fn test_filter_matching() {
        let row = json!({"event_type": "futebol", "capacity": 1000, "event_date": "2026-03-10"});
        assert!(Filter::eq("event_type", "futebol").matches(&row));
        assert!(!Filter::eq("event_type", "Jogo de futebol").matches(&row));
        assert!(Filter::eq("capacity", "1000").matches(&row));
        assert!(Filter::gte("capacity", "999").matches(&row));
        assert!(!Filter::lte("capacity", "999").matches(&row));
        assert!(Filter::gte("event_date", "2026-03-10").matches(&row));
        assert!(!Filter::gte("event_date", "2026-03-11").matches(&row));
        assert!(!Filter::eq("missing", "x").matches(&row));
    }

    #[test]
    fn test_one_of_renders_list_literal() {
        let filter = Filter::one_of("event_id", ["1", "2", "3"]);
        assert_eq!(filter.op, FilterOp::In);
        assert_eq!(filter.value, "(1,2,3)");
        assert_eq!(filter.to_query_param(), "event_id=in.%281%2C2%2C3%29");

        let filter = Filter::one_of("name", ["Show, noite", "a\"b", "plain"]);
        assert_eq!(filter.value, r#"("Show, noite","a\"b",plain)"#);
    }

    #[test]
    fn test_one_of_matching() {
        let row = json!({"event_id": 2, "name": "Show, noite", "respondent_id": "a\"b"});
        assert!(Filter::one_of("event_id", ["1", "2"]).matches(&row));
        assert!(!Filter::one_of("event_id", ["1", "3"]).matches(&row));
        assert!(Filter::one_of("name", ["Show, noite"]).matches(&row));
        assert!(!Filter::one_of("name", ["Show"]).matches(&row));
        assert!(Filter::one_of("respondent_id", ["a\"b"]).matches(&row));
        assert!(!Filter::one_of("event_id", Vec::<String>::new()).matches(&row));
    }

    #[test]
    fn test_new_response_omits_missing_numeric() {
        let row = NewResponse {
            event_id: 1.into(),
            respondent_id: "r-1".into(),
            question_id: "vibe".into(),
            answer_numeric: None,
            answer_value: Some("Amei!".into()),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert!(value.get("answer_numeric").is_none());
        assert_eq!(value["respondent_id"], "r-1");
        assert_eq!(value["event_id"], 1);
    }

    #[test]
    fn test_new_event_date_format() {
        let row = NewEvent {
            event_code: "EVT1".into(),
            name: "Tour guiado - Arena BRB".into(),
            event_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            event_type: "tour".into(),
            capacity: 1000,
        };
        assert_eq!(serde_json::to_value(&row).unwrap()["event_date"], "2026-10-16");
    }
}
