use chrono::{DateTime, TimeZone, Utc};
use rocket::serde::json::serde_json::Number;
use rocket::serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{RecordId, ValidationError};

/// Largest magnitude below which every integral `f64` is exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A score as stored in the database.
/// Integral values are serialized as JSON integers, everything else as floats.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Score(f64);

impl Score {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<i32> for Score {
    fn from(value: i32) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Score {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.0.fract() == 0.0 && self.0.abs() < MAX_EXACT_INTEGER {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self(f64::deserialize(deserializer)?))
    }
}

/// A score exactly as it arrived in a submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", untagged)]
pub enum ScoreInput {
    Number(f64),
    Text(String),
}

impl ScoreInput {
    fn parse(&self) -> Result<Score, ValidationError> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(ValidationError::MissingScore);
                }
                text.parse::<f64>()
                    .map_err(|_| ValidationError::InvalidScore {
                        value: text.to_owned(),
                    })?
            }
        };

        if !value.is_finite() {
            return Err(ValidationError::NonFiniteScore);
        }
        Ok(Score(value))
    }
}

/// A player name as it arrived in a submission.
/// Numbers are taken as their decimal text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", untagged)]
pub enum NameInput {
    Text(String),
    Number(Number),
}

impl NameInput {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Body of a score submission, before validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub name: Option<NameInput>,
    pub score: Option<ScoreInput>,
    #[serde(skip)]
    pub recorded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl ScoreSubmission {
    pub fn new(name: impl Into<String>, score: impl Into<f64>) -> Self {
        Self {
            name: Some(NameInput::Text(name.into())),
            score: Some(ScoreInput::Number(score.into())),
            recorded_at: None,
        }
    }

    pub fn recorded_at(self, recorded_at: DateTime<Utc>) -> Self {
        Self {
            recorded_at: Some(recorded_at),
            ..self
        }
    }
}

impl ScoreSubmission {
    /// Checks the submission and assigns the server-side fields.
    pub fn into_record(self) -> Result<ScoreRecord, ValidationError> {
        let name = self.name.ok_or(ValidationError::MissingName)?.into_text();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let score = self.score.ok_or(ValidationError::MissingScore)?.parse()?;
        let recorded_at = self.recorded_at.unwrap_or_else(Utc::now);

        Ok(ScoreRecord {
            id: RecordId::generate(),
            name,
            score,
            recorded_at: truncate_to_millis(recorded_at),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: RecordId,
    pub name: String,
    pub score: Score,
    pub recorded_at: DateTime<Utc>,
}

// Timestamps are stored as milliseconds since the epoch.
fn truncate_to_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(time.timestamp_millis())
        .single()
        .unwrap_or(time)
}

pub(super) fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
