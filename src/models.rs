use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::field::ParamCodec;

/// Question category as stored by the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Coding,
    SystemDesign,
    Behavioral,
    Theory,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::Coding,
        QuestionType::SystemDesign,
        QuestionType::Behavioral,
        QuestionType::Theory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Coding => "CODING",
            QuestionType::SystemDesign => "SYSTEM_DESIGN",
            QuestionType::Behavioral => "BEHAVIORAL",
            QuestionType::Theory => "THEORY",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParamCodec for QuestionType {
    fn from_param(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
    }

    fn to_param(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// Recency bucket for the "question age" filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionAge {
    LastMonth,
    #[serde(rename = "last-6-months")]
    LastSixMonths,
    LastYear,
    #[default]
    All,
}

impl QuestionAge {
    pub const ALL: [QuestionAge; 4] = [
        QuestionAge::LastMonth,
        QuestionAge::LastSixMonths,
        QuestionAge::LastYear,
        QuestionAge::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionAge::LastMonth => "last-month",
            QuestionAge::LastSixMonths => "last-6-months",
            QuestionAge::LastYear => "last-year",
            QuestionAge::All => "all",
        }
    }

    /// How many months back the bucket reaches, or None for no lower bound.
    pub fn months_back(&self) -> Option<u32> {
        match self {
            QuestionAge::LastMonth => Some(1),
            QuestionAge::LastSixMonths => Some(6),
            QuestionAge::LastYear => Some(12),
            QuestionAge::All => None,
        }
    }
}

impl ParamCodec for QuestionAge {
    fn from_param(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(token))
    }

    fn to_param(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl ParamCodec for SortOrder {
    fn from_param(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "ASC" => Some(SortOrder::Asc),
            "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn to_param(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    #[default]
    Top,
    New,
}

impl SortType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortType::Top => "TOP",
            SortType::New => "NEW",
        }
    }
}

impl ParamCodec for SortType {
    fn from_param(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "TOP" => Some(SortType::Top),
            "NEW" => Some(SortType::New),
            _ => None,
        }
    }

    fn to_param(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// A question record as returned by the filter query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub content: String,
    pub company: String,
    pub location: String,
    pub role: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub seen_at: DateTime<Utc>,
    pub num_answers: i64,
    pub num_votes: i64,
    pub received_count: i64,
}

/// Payload for contributing a new question (no server-generated fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub company_id: String,
    pub content: String,
    pub location: String,
    pub question_type: QuestionType,
    pub role: String,
    pub seen_at: DateTime<Utc>,
}

/// Stats returned by `qbrowse cache stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: i64,
    pub hits: i64,
    pub procedures: Vec<ProcedureCount>,
    pub oldest: Option<String>,
    pub newest: Option<String>,
    pub db_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureCount {
    pub procedure: String,
    pub count: i64,
}
