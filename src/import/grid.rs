use super::{ParseReport, RejectReason};
use crate::catalog::{Instrument, Stage};
use crate::congregation::{CongregationDirectory, fuzzy_match};
use crate::musician::Musician;
use tracing::info;

const GRID_FIELDS: usize = 6;

/// Parses spreadsheet rows (`name, congregation, city, phone, instrument,
/// stage`). The first row is a header and is always dropped.
///
/// Unlike text import, rows whose congregation is not in the directory are
/// rejected.
pub fn parse_grid<D, R>(rows: &[R], directory: &D) -> Vec<Musician>
where
    D: CongregationDirectory + ?Sized,
    R: AsRef<[String]>,
{
    parse_grid_report(rows, directory).records
}

pub fn parse_grid_report<D, R>(rows: &[R], directory: &D) -> ParseReport
where
    D: CongregationDirectory + ?Sized,
    R: AsRef<[String]>,
{
    let congregations = directory.list_all();
    let mut report = ParseReport::default();

    for (idx, row) in rows.iter().enumerate().skip(1) {
        let row_number = idx + 1;
        let cells = row.as_ref();
        if cells.len() < GRID_FIELDS {
            report.reject(row_number, RejectReason::Unparsable);
            continue;
        }

        let fields: Vec<&str> = cells.iter().take(GRID_FIELDS).map(|c| c.trim()).collect();
        let [name, congregation_name, city, phone, instrument, stage] = fields.as_slice() else {
            report.reject(row_number, RejectReason::Unparsable);
            continue;
        };

        if fields.iter().any(|f| f.is_empty()) {
            report.reject(row_number, RejectReason::MissingFields);
            continue;
        }

        let Some(instrument) = Instrument::from_label(instrument) else {
            report.reject(row_number, RejectReason::InvalidInstrument(instrument.to_string()));
            continue;
        };
        let Some(stage) = Stage::from_label(stage) else {
            report.reject(row_number, RejectReason::InvalidStage(stage.to_string()));
            continue;
        };
        let Some(congregation) = fuzzy_match(&congregations, congregation_name) else {
            report.reject(
                row_number,
                RejectReason::UnknownCongregation(congregation_name.to_string()),
            );
            continue;
        };

        report.records.push(Musician {
            id: None,
            name: name.to_string(),
            congregation_id: congregation.id_str().to_string(),
            congregation_name: congregation.name.clone(),
            city: city.to_string(),
            phone: phone.to_string(),
            instrument,
            stage,
        });
    }

    info!(
        found = report.records.len(),
        rejected = report.rejected.len(),
        "grid import parsed"
    );
    report
}
