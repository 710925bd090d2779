use crate::catalog::RehearsalType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys of the attendance headcount form, in form order.
pub const HEADCOUNT_KEYS: [&str; 16] = [
    "clarinete",
    "clarone",
    "saxSoprano",
    "saxAlto",
    "saxTenor",
    "saxBaritono",
    "trompete",
    "flugelhorn",
    "euphonio",
    "trombone",
    "trombonito",
    "tuba",
    "viola",
    "violino",
    "cello",
    "organista",
];

/// Number of musicians per instrument present at a rehearsal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentCounts(BTreeMap<String, u32>);

impl InstrumentCounts {
    pub fn zeroed() -> Self {
        Self(HEADCOUNT_KEYS.iter().map(|k| (k.to_string(), 0)).collect())
    }

    pub fn get(&self, key: &str) -> u32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: impl Into<String>, count: u32) {
        self.0.insert(key.into(), count);
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for InstrumentCounts {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Persisted rehearsal attendance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsaioData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub rehearsal_type: RehearsalType,
    pub date: NaiveDate,
    pub congregation_id: String,
    pub congregation_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer: Option<String>,
    #[serde(default)]
    pub instruments: InstrumentCounts,
}

/// A concrete rehearsal date derived from a congregation's rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RehearsalOccurrence {
    /// `<congregation id>-<YYYY-MM-DD>-<type>`; stable across expansions.
    pub id: String,
    pub congregation_id: String,
    pub congregation_name: String,
    pub rehearsal_type: RehearsalType,
    pub date: NaiveDate,
    pub instruments: InstrumentCounts,
}

impl RehearsalOccurrence {
    pub fn composite_id(
        congregation_id: &str,
        date: NaiveDate,
        rehearsal_type: RehearsalType,
    ) -> String {
        format!(
            "{}-{}-{}",
            congregation_id,
            date.format("%Y-%m-%d"),
            rehearsal_type.as_str()
        )
    }

    /// Attendance-shaped view used when generated dates are listed next to
    /// stored records.
    pub fn into_record(self, city: impl Into<String>) -> EnsaioData {
        EnsaioData {
            id: Some(self.id),
            rehearsal_type: self.rehearsal_type,
            date: self.date,
            congregation_id: self.congregation_id,
            congregation_name: self.congregation_name,
            city: city.into(),
            elder: None,
            officer: None,
            instruments: self.instruments,
        }
    }
}
