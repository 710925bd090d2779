use crate::congregation::{Congregation, CongregationDirectory};
use crate::ensaio::EnsaioData;
use crate::musician::Musician;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("duplicate {kind} id {id}")]
    Duplicate { kind: &'static str, id: String },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A record owned by a repository collection.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name; also the SQLite table name.
    const KIND: &'static str;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
}

impl Entity for Congregation {
    const KIND: &'static str = "congregations";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Entity for Musician {
    const KIND: &'static str = "musicians";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

impl Entity for EnsaioData {
    const KIND: &'static str = "ensaios";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

pub trait Repository<T: Entity>: Send + Sync {
    fn get(&self, id: &str) -> PersistenceResult<Option<T>>;
    fn list(&self) -> PersistenceResult<Vec<T>>;
    /// Stores the item, assigning a fresh id when it has none.
    fn create(&self, item: T) -> PersistenceResult<T>;
    /// Replaces the whole record stored under `id`.
    fn update(&self, id: &str, item: T) -> PersistenceResult<T>;
    /// Returns whether a record was removed.
    fn delete(&self, id: &str) -> PersistenceResult<bool>;
}

pub(crate) fn assign_id<T: Entity>(item: &mut T) -> String {
    match item.id() {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => {
            let id = uuid::Uuid::new_v4().to_string();
            item.set_id(id.clone());
            id
        }
    }
}

impl CongregationDirectory for dyn Repository<Congregation> {
    fn list_all(&self) -> Vec<Congregation> {
        match self.list() {
            Ok(all) => all,
            Err(err) => {
                tracing::warn!(error = %err, "congregation directory unavailable");
                Vec::new()
            }
        }
    }
}

pub fn validate_musicians(musicians: &[Musician]) -> PersistenceResult<()> {
    let mut seen_ids = HashSet::with_capacity(musicians.len());
    for musician in musicians {
        if musician.name.trim().is_empty() {
            return Err(PersistenceError::InvalidData(
                "musician with empty name".to_string(),
            ));
        }
        if musician.congregation_id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "musician '{}' has no congregation",
                musician.name
            )));
        }
        if let Some(id) = musician.id.as_deref() {
            if !seen_ids.insert(id) {
                return Err(PersistenceError::InvalidData(format!(
                    "duplicate musician id {id}"
                )));
            }
        }
    }
    Ok(())
}

pub fn validate_ensaios(records: &[EnsaioData]) -> PersistenceResult<()> {
    let mut seen_ids = HashSet::with_capacity(records.len());
    for record in records {
        if record.congregation_id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "rehearsal on {} has no congregation",
                record.date
            )));
        }
        if let Some(id) = record.id.as_deref() {
            if !seen_ids.insert(id) {
                return Err(PersistenceError::InvalidData(format!(
                    "duplicate rehearsal id {id}"
                )));
            }
        }
    }
    Ok(())
}

pub fn validate_congregations(congregations: &[Congregation]) -> PersistenceResult<()> {
    let mut seen_ids = HashSet::with_capacity(congregations.len());
    for congregation in congregations {
        let Some(id) = congregation.id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return Err(PersistenceError::InvalidData(format!(
                "congregation '{}' has no id",
                congregation.name
            )));
        };
        if !seen_ids.insert(id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate congregation id {id}"
            )));
        }
        for (idx, rule) in congregation.rehearsals.iter().enumerate() {
            if let Some(month) = rule.months.iter().find(|m| !(1..=12).contains(*m)) {
                return Err(PersistenceError::InvalidData(format!(
                    "congregation {id} rule #{idx} has invalid month {month}"
                )));
            }
        }
    }
    Ok(())
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    Snapshot, load_musicians_from_csv, load_snapshot_from_json, save_musicians_to_csv,
    save_snapshot_to_json,
};
pub use memory::InMemoryRepository;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
