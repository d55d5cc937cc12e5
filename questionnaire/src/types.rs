//! Question definitions and the tagged answer union used at collection time.

use serde::{Deserialize, Serialize};

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Pick one label from `options`
    SingleChoice,
    /// Pick one value from a numeric scale in `options`
    Scale,
    /// Free text, no options
    FreeText,
}

impl Default for QuestionKind {
    fn default() -> Self {
        Self::SingleChoice
    }
}

/// Immutable question definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Ordinal; unique and defines order
    pub id: usize,
    /// Text shown to the respondent
    pub prompt: String,
    /// Optional secondary line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub kind: QuestionKind,
    /// Ordered options; empty for free text
    #[serde(default)]
    pub options: Vec<String>,
}

impl Question {
    /// Single-choice question.
    pub fn choice<I, S>(id: usize, prompt: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            prompt: prompt.into(),
            subtitle: None,
            kind: QuestionKind::SingleChoice,
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// Numeric scale from `low` to `high` inclusive.
    pub fn scale(id: usize, prompt: impl Into<String>, low: u8, high: u8) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            subtitle: None,
            kind: QuestionKind::Scale,
            options: (low..=high).map(|v| v.to_string()).collect(),
        }
    }

    /// Free-text question.
    pub fn free_text(id: usize, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            subtitle: None,
            kind: QuestionKind::FreeText,
            options: Vec::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Interpret raw input typed by a respondent.
    ///
    /// For choice questions a 1-based option number selects that option's
    /// label. Scale input is kept as the typed value. Anything else passes
    /// through untouched: answers are never rejected here.
    pub fn interpret(&self, input: &str) -> Answer {
        let trimmed = input.trim();
        match self.kind {
            QuestionKind::FreeText => Answer::Text(input.to_string()),
            QuestionKind::Scale => match trimmed.parse::<u8>() {
                Ok(value) => Answer::Scale(value),
                Err(_) => Answer::Text(input.to_string()),
            },
            QuestionKind::SingleChoice => {
                if let Some(label) = self.options.iter().find(|o| o.as_str() == trimmed) {
                    return Answer::Choice(label.clone());
                }
                match trimmed.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= self.options.len() => {
                        Answer::Choice(self.options[n - 1].clone())
                    }
                    _ => Answer::Text(input.to_string()),
                }
            }
        }
    }

    /// Whether `value` is one of the declared options.
    ///
    /// Informational only; the flow stores whatever it is given.
    pub fn is_listed(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }
}

/// An answer as collected from the respondent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Choice(String),
    Scale(u8),
    Text(String),
}

impl Answer {
    /// Raw string stored in the [`AnswerMap`](crate::AnswerMap).
    pub fn into_raw(self) -> String {
        match self {
            Self::Choice(label) => label,
            Self::Scale(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }
}

impl From<Answer> for String {
    fn from(answer: Answer) -> Self {
        answer.into_raw()
    }
}
