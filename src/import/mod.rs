//! Bulk musician import from PDF-extracted text and spreadsheet grids.

pub mod grid;
pub mod sheet;
pub mod split;
pub mod text;

use crate::musician::Musician;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use grid::{parse_grid, parse_grid_report};
pub use split::{SplitStrategy, split_fields};
pub use text::{RecordLayout, detect_layout, map_level_to_stage, parse_text, parse_text_report};

/// Placeholder city for text rows whose congregation could not be resolved.
pub const UNKNOWN_CITY: &str = "Não informada";

/// Raw input handed to the import preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSource {
    Text(String),
    Grid(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum RejectReason {
    /// Fewer fields than the layout needs.
    Unparsable,
    MissingFields,
    InvalidInstrument(String),
    InvalidStage(String),
    UnknownCongregation(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Unparsable => write!(f, "could not split row into fields"),
            RejectReason::MissingFields => write!(f, "required fields are empty"),
            RejectReason::InvalidInstrument(value) => write!(f, "invalid instrument '{value}'"),
            RejectReason::InvalidStage(value) => write!(f, "invalid stage '{value}'"),
            RejectReason::UnknownCongregation(value) => {
                write!(f, "congregation not found '{value}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    /// 1-based line (text) or row (grid, header included) number.
    pub row: usize,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    pub records: Vec<Musician>,
    pub rejected: Vec<RowRejection>,
}

impl ParseReport {
    pub(crate) fn reject(&mut self, row: usize, reason: RejectReason) {
        tracing::debug!(row, %reason, "import row skipped");
        self.rejected.push(RowRejection { row, reason });
    }

    pub fn outcome(self) -> ImportOutcome {
        if self.records.is_empty() {
            ImportOutcome::NothingFound
        } else {
            ImportOutcome::Found(self.records)
        }
    }
}

/// Result of an import preview: an empty parse is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    NothingFound,
    Found(Vec<Musician>),
}

/// `temp_<name>` id for congregations missing from the directory.
pub fn synthetic_congregation_id(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("temp_{slug}")
}
