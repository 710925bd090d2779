use crate::catalog::{Instrument, Stage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Musician {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub congregation_id: String,
    pub congregation_name: String,
    pub city: String,
    #[serde(default)]
    pub phone: String,
    pub instrument: Instrument,
    pub stage: Stage,
}

/// Registration form as submitted by a user; every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicianForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub congregation_id: String,
    /// Falls back to the congregation's city when blank.
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub instrument: Option<Instrument>,
    #[serde(default)]
    pub stage: Option<Stage>,
}

impl MusicianForm {
    /// Names of the fields left blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.congregation_id.trim().is_empty() {
            missing.push("congregation_id");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if self.instrument.is_none() {
            missing.push("instrument");
        }
        if self.stage.is_none() {
            missing.push("stage");
        }
        missing
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicianFilter {
    #[serde(default)]
    pub instrument: Option<Instrument>,
    #[serde(default)]
    pub stage: Option<Stage>,
    #[serde(default)]
    pub congregation_id: Option<String>,
    /// Case-insensitive substring of the musician's name.
    #[serde(default)]
    pub search: Option<String>,
}

impl MusicianFilter {
    pub fn matches(&self, musician: &Musician) -> bool {
        if self.instrument.is_some_and(|i| i != musician.instrument) {
            return false;
        }
        if self.stage.is_some_and(|s| s != musician.stage) {
            return false;
        }
        if let Some(id) = &self.congregation_id {
            if &musician.congregation_id != id {
                return false;
            }
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if !musician.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Groups musicians by stage; every stage is present, in progression order.
pub fn group_by_stage(musicians: &[Musician]) -> BTreeMap<Stage, Vec<Musician>> {
    let mut groups: BTreeMap<Stage, Vec<Musician>> =
        Stage::ALL.into_iter().map(|s| (s, Vec::new())).collect();
    for musician in musicians {
        groups.entry(musician.stage).or_default().push(musician.clone());
    }
    groups
}
