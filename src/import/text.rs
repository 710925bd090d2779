use super::split::split_fields;
use super::{ParseReport, RejectReason, UNKNOWN_CITY, synthetic_congregation_id};
use crate::catalog::{Instrument, Stage};
use crate::congregation::{CongregationDirectory, fuzzy_match};
use crate::musician::Musician;
use tracing::{debug, info};

const DETECTION_LINES: usize = 10;
const STANDARD_FIELDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// `name | congregation | city | phone | instrument | stage`
    Standard,
    /// `name | instrument | locality | role | level`
    Alternative,
}

/// Looks for the alternative layout's column titles in the first lines.
pub fn detect_layout(lines: &[&str]) -> RecordLayout {
    let head = lines
        .iter()
        .take(DETECTION_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();
    if head.contains("LOCALIDADE") && head.contains("NIVEL") {
        RecordLayout::Alternative
    } else {
        RecordLayout::Standard
    }
}

/// Maps a free-form level ("ENSAIO RJM", "OFICIALIZADO") to a stage.
/// When both RJM and ENSAIO appear, RJM wins.
pub fn map_level_to_stage(level: &str) -> Option<Stage> {
    let level = level.trim().to_uppercase();
    let rjm = level.contains("RJM");
    let ensaio = level.contains("ENSAIO");
    if level.contains("OFICIALIZADO") {
        Some(Stage::Oficializacao)
    } else if level.contains("CULTO OFICIAL") {
        Some(Stage::CultoOficial)
    } else if rjm {
        Some(Stage::Rjm)
    } else if ensaio {
        Some(Stage::Ensaio)
    } else {
        None
    }
}

fn is_header_or_metadata(line: &str) -> bool {
    let lower = line.to_lowercase();
    (lower.contains("nome") && (lower.contains("congregação") || lower.contains("instrumento")))
        || lower.contains("relatório")
        || lower.contains("sistema")
        || lower.contains("gerado em")
}

#[derive(Debug, Default)]
struct RawRecord {
    name: String,
    congregation: String,
    city: String,
    phone: String,
    instrument: String,
    stage: String,
}

impl RawRecord {
    fn from_fields(layout: RecordLayout, fields: Vec<String>) -> Option<Self> {
        match layout {
            RecordLayout::Standard => {
                if fields.len() < STANDARD_FIELDS {
                    return None;
                }
                let mut it = fields.into_iter();
                let mut next = || it.next().unwrap_or_default();
                Some(Self {
                    name: next(),
                    congregation: next(),
                    city: next(),
                    phone: next(),
                    instrument: next(),
                    stage: next(),
                })
            }
            RecordLayout::Alternative => {
                let level = fields.last()?.clone();
                let locality = fields.get(2)?;
                // "RECANTO DAS ACÁCIAS - CAPINÓPOLIS": congregation first, city last
                let (congregation, city) = if locality.contains(" - ") {
                    let parts: Vec<&str> = locality.split(" - ").map(str::trim).collect();
                    (
                        parts.first().copied().unwrap_or_default().to_string(),
                        parts.last().copied().unwrap_or_default().to_string(),
                    )
                } else {
                    (locality.clone(), locality.clone())
                };
                let stage = map_level_to_stage(&level)
                    .map(|s| s.label().to_string())
                    .unwrap_or(level);
                Some(Self {
                    name: fields[0].clone(),
                    congregation,
                    city,
                    phone: String::new(),
                    instrument: fields[1].clone(),
                    stage,
                })
            }
        }
    }
}

/// Parses PDF-extracted text into musicians. Rows that fail validation are
/// skipped.
pub fn parse_text<D>(raw: &str, directory: &D) -> Vec<Musician>
where
    D: CongregationDirectory + ?Sized,
{
    parse_text_report(raw, directory).records
}

pub fn parse_text_report<D>(raw: &str, directory: &D) -> ParseReport
where
    D: CongregationDirectory + ?Sized,
{
    let congregations = directory.list_all();
    let lines: Vec<&str> = raw
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    let layout = detect_layout(&lines);
    debug!(lines = lines.len(), ?layout, "parsing extracted text");

    let mut report = ParseReport::default();
    for (idx, line) in lines.iter().enumerate() {
        let row = idx + 1;
        if is_header_or_metadata(line) {
            debug!(row, "skipping header line");
            continue;
        }

        let Some((strategy, fields)) = split_fields(line) else {
            report.reject(row, RejectReason::Unparsable);
            continue;
        };
        let Some(raw_record) = RawRecord::from_fields(layout, fields) else {
            report.reject(row, RejectReason::Unparsable);
            continue;
        };
        debug!(row, strategy = strategy.name(), name = %raw_record.name, "split line");

        if raw_record.name.is_empty()
            || raw_record.congregation.is_empty()
            || raw_record.instrument.is_empty()
            || raw_record.stage.is_empty()
        {
            report.reject(row, RejectReason::MissingFields);
            continue;
        }

        let instrument = match Instrument::from_label(&raw_record.instrument) {
            Some(instrument) => instrument,
            None => match Instrument::find_similar(&raw_record.instrument) {
                Some(similar) => {
                    debug!(
                        row,
                        given = %raw_record.instrument,
                        using = %similar,
                        "substituting similar instrument"
                    );
                    similar
                }
                None => {
                    report.reject(row, RejectReason::InvalidInstrument(raw_record.instrument));
                    continue;
                }
            },
        };

        let Some(stage) = Stage::from_label(&raw_record.stage) else {
            report.reject(row, RejectReason::InvalidStage(raw_record.stage));
            continue;
        };

        let musician = match fuzzy_match(&congregations, &raw_record.congregation) {
            Some(congregation) => Musician {
                id: None,
                name: raw_record.name,
                congregation_id: congregation.id_str().to_string(),
                congregation_name: congregation.name.clone(),
                city: if raw_record.city.is_empty() {
                    congregation.city.clone()
                } else {
                    raw_record.city
                },
                phone: raw_record.phone,
                instrument,
                stage,
            },
            None => {
                debug!(
                    row,
                    congregation = %raw_record.congregation,
                    "keeping row with unresolved congregation"
                );
                Musician {
                    id: None,
                    name: raw_record.name,
                    congregation_id: synthetic_congregation_id(&raw_record.congregation),
                    city: if raw_record.city.is_empty() {
                        UNKNOWN_CITY.to_string()
                    } else {
                        raw_record.city
                    },
                    congregation_name: raw_record.congregation,
                    phone: raw_record.phone,
                    instrument,
                    stage,
                }
            }
        };
        report.records.push(musician);
    }

    info!(
        found = report.records.len(),
        rejected = report.rejected.len(),
        "text import parsed"
    );
    report
}
