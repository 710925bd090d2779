//! Reading spreadsheet files into a plain grid of strings.

use crate::repository::{PersistenceError, PersistenceResult};
use std::io::Read;
use std::path::Path;

/// Reads every record of a CSV source, header included, without
/// interpreting it.
pub fn read_csv_grid<R: Read>(reader: R) -> PersistenceResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(ToOwned::to_owned).collect());
    }
    Ok(rows)
}

pub fn read_csv_grid_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Vec<String>>> {
    let file = std::fs::File::open(path)?;
    read_csv_grid(file)
}

/// First worksheet of an Excel/ODS workbook as strings.
#[cfg(feature = "xlsx")]
pub fn read_workbook_grid<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Vec<String>>> {
    use calamine::{Data, Reader, open_workbook_auto};

    let mut workbook = open_workbook_auto(path.as_ref())
        .map_err(|e| PersistenceError::InvalidData(format!("failed to open workbook: {e}")))?;
    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(PersistenceError::InvalidData("workbook contains no sheets".into()));
    };
    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        PersistenceError::InvalidData(format!("failed to read sheet '{sheet_name}': {e}"))
    })?;

    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();
    Ok(rows)
}

/// Dispatches on the file extension: `.csv` through the csv reader,
/// anything else through the workbook reader.
pub fn read_grid_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Vec<String>>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        return read_csv_grid_file(path);
    }

    #[cfg(feature = "xlsx")]
    {
        read_workbook_grid(path)
    }
    #[cfg(not(feature = "xlsx"))]
    {
        Err(PersistenceError::InvalidData(format!(
            "unsupported spreadsheet '{}' (rebuild with the `xlsx` feature)",
            path.display()
        )))
    }
}
