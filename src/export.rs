use crate::calendar::{CalendarPeriod, MONTH_ABBREVIATIONS, weekday_abbreviation};
use crate::catalog::RehearsalType;
use crate::congregation::Congregation;
use crate::ensaio::EnsaioData;
use chrono::Datelike;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const CALENDAR_TITLE: &str = "CALENDÁRIO DE ENSAIOS MUSICAIS";
pub const CALENDAR_HEADER: [&str; 4] = ["Data", "Congregação", "Tipo", "Cidade"];

const DEFAULT_TIME: &str = "09h00";
const DEFAULT_LOCAL_TIME: &str = "19h30";
const NO_CITY: &str = "Sem cidade";
/// Days between 0001-01-01 and 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One spreadsheet row per calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub date: String,
    pub congregation: String,
    pub type_label: String,
    pub city: String,
}

fn find<'a>(congregations: &'a [Congregation], id: &str) -> Option<&'a Congregation> {
    congregations.iter().find(|c| c.id.as_deref() == Some(id))
}

/// Rows sorted by date; the city comes from the directory, `-` when unknown.
pub fn calendar_rows(entries: &[EnsaioData], congregations: &[Congregation]) -> Vec<CalendarRow> {
    let mut sorted: Vec<&EnsaioData> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);
    sorted
        .into_iter()
        .map(|entry| CalendarRow {
            date: entry.date.format("%d/%m/%Y").to_string(),
            congregation: entry.congregation_name.clone(),
            type_label: entry.rehearsal_type.label().to_string(),
            city: find(congregations, &entry.congregation_id)
                .map(|c| c.city.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

/// Title, one line per applied filter, the column header, then the rows.
pub fn write_calendar_csv<W: Write>(
    writer: W,
    filter_lines: &[String],
    rows: &[CalendarRow],
) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    writer.write_record([CALENDAR_TITLE])?;
    writer.write_record([""])?;
    for line in filter_lines {
        writer.write_record([line.as_str()])?;
    }
    writer.write_record([""])?;
    writer.write_record(CALENDAR_HEADER)?;
    for row in rows {
        writer.write_record([
            row.date.as_str(),
            row.congregation.as_str(),
            row.type_label.as_str(),
            row.city.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Column widths of the calendar sheet, in characters.
#[cfg(feature = "xlsx")]
const CALENDAR_COLUMN_WIDTHS: [f64; 4] = [12.0, 32.0, 12.0, 20.0];

/// Same layout as [`write_calendar_csv`] on an `Ensaios` sheet, returned as
/// the bytes of an `.xlsx` workbook.
#[cfg(feature = "xlsx")]
pub fn calendar_workbook(
    filter_lines: &[String],
    rows: &[CalendarRow],
) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    {
        let worksheet = workbook.add_worksheet().set_name("Ensaios")?;
        for (col, width) in CALENDAR_COLUMN_WIDTHS.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }

        worksheet.write_string_with_format(0, 0, CALENDAR_TITLE, &bold)?;
        // Row 1 stays blank, as in the CSV layout.
        let mut row = 2u32;
        for line in filter_lines {
            worksheet.write_string(row, 0, line)?;
            row += 1;
        }
        row += 1;
        for (col, title) in CALENDAR_HEADER.iter().enumerate() {
            worksheet.write_string_with_format(row, col as u16, *title, &bold)?;
        }
        for entry in rows {
            row += 1;
            worksheet.write_string(row, 0, &entry.date)?;
            worksheet.write_string(row, 1, &entry.congregation)?;
            worksheet.write_string(row, 2, &entry.type_label)?;
            worksheet.write_string(row, 3, &entry.city)?;
        }
    }
    workbook.save_to_buffer()
}

/// `calendario-ensaios-2025-anual.csv`, `calendario-ensaios-2025-03.csv`, ...
pub fn export_file_name(year: i32, period: CalendarPeriod, extension: &str) -> String {
    let suffix = match period {
        CalendarPeriod::Upcoming => String::new(),
        CalendarPeriod::Annual => "-anual".to_string(),
        CalendarPeriod::Month(m) => format!("-{m:02}"),
    };
    format!("calendario-ensaios-{year}{suffix}.{extension}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub locality: String,
    pub weekday: String,
    pub time: String,
    /// Day of month of the first entry in each month, `-` when none.
    pub months: [String; 12],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridTable {
    pub rehearsal_type: RehearsalType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub rows: Vec<GridRow>,
}

impl GridTable {
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(3 + MONTH_ABBREVIATIONS.len());

        let locality: Vec<&str> = self.rows.iter().map(|r| r.locality.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("LOCALIDADE"), locality).into_column());

        let weekday: Vec<&str> = self.rows.iter().map(|r| r.weekday.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("DIA"), weekday).into_column());

        let time: Vec<&str> = self.rows.iter().map(|r| r.time.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("HORA"), time).into_column());

        for (idx, month) in MONTH_ABBREVIATIONS.iter().enumerate() {
            let cells: Vec<&str> = self.rows.iter().map(|r| r.months[idx].as_str()).collect();
            columns.push(Series::new(PlSmallStr::from_static(month), cells).into_column());
        }

        DataFrame::new(columns)
    }
}

fn grid_row(
    entries: &[&EnsaioData],
    congregation: Option<&Congregation>,
    rehearsal_type: RehearsalType,
    locality: String,
    default_time: &str,
) -> GridRow {
    let mut months: [String; 12] = std::array::from_fn(|_| "-".to_string());
    for entry in entries {
        let idx = entry.date.month0() as usize;
        if months[idx] == "-" {
            months[idx] = entry.date.day().to_string();
        }
    }
    let weekday = entries
        .first()
        .map(|e| weekday_abbreviation(e.date.weekday()).to_string())
        .unwrap_or_default();
    let time = congregation
        .and_then(|c| c.time_for(rehearsal_type))
        .unwrap_or(default_time)
        .to_string();
    GridRow {
        locality,
        weekday,
        time,
        months,
    }
}

/// Groups entries by key, keeping the order in which keys first appear.
fn group_in_order<'a, K, F>(
    entries: impl IntoIterator<Item = &'a EnsaioData>,
    key: F,
) -> Vec<(K, Vec<&'a EnsaioData>)>
where
    K: PartialEq,
    F: Fn(&EnsaioData) -> K,
{
    let mut groups: Vec<(K, Vec<&'a EnsaioData>)> = Vec::new();
    for entry in entries {
        let k = key(entry);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(entry),
            None => groups.push((k, vec![entry])),
        }
    }
    groups
}

/// City a local rehearsal is listed under. Chaveslândia is a district of
/// Santa Vitória.
fn local_city(congregation: Option<&Congregation>) -> String {
    let Some(congregation) = congregation else {
        return NO_CITY.to_string();
    };
    let name = congregation.name.to_lowercase();
    if name.contains("chaveslândia") || name.contains("chaveslandia") {
        return "Santa Vitória".to_string();
    }
    let city = congregation.city.trim();
    if city.is_empty() {
        NO_CITY.to_string()
    } else {
        city.to_string()
    }
}

/// Per-type tables with one row per congregation and one column per month.
/// Regional, GEM, general and DARPE rehearsals get one table each; local
/// rehearsals get one table per city.
pub fn monthly_grid(entries: &[EnsaioData], congregations: &[Congregation]) -> Vec<GridTable> {
    let mut sorted: Vec<&EnsaioData> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut tables = Vec::new();
    for rehearsal_type in [
        RehearsalType::Regional,
        RehearsalType::Gem,
        RehearsalType::Geral,
        RehearsalType::Darpe,
    ] {
        let of_type = sorted.iter().copied().filter(|e| e.rehearsal_type == rehearsal_type);
        let by_congregation = group_in_order(of_type, |e| e.congregation_id.clone());
        if by_congregation.is_empty() {
            continue;
        }
        let rows = by_congregation
            .iter()
            .map(|(id, members)| {
                let congregation = find(congregations, id);
                let locality = match congregation {
                    Some(c) if !c.city.is_empty() => format!("{} - {}", c.city, c.name),
                    Some(c) => c.name.clone(),
                    None => members[0].congregation_name.clone(),
                };
                grid_row(members, congregation, rehearsal_type, locality, DEFAULT_TIME)
            })
            .collect();
        tables.push(GridTable {
            rehearsal_type,
            title: format!("ENSAIOS {}", rehearsal_type.plural_label()),
            subtitle: None,
            rows,
        });
    }

    let locals = sorted
        .iter()
        .copied()
        .filter(|e| e.rehearsal_type == RehearsalType::Local);
    let by_city = group_in_order(locals, |e| local_city(find(congregations, &e.congregation_id)));
    for (city, members) in by_city {
        let mut by_congregation =
            group_in_order(members.iter().copied(), |e| e.congregation_id.clone());
        by_congregation.sort_by_key(|(id, members)| {
            find(congregations, id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| members[0].congregation_name.clone())
        });
        let rows = by_congregation
            .iter()
            .map(|(id, members)| {
                let congregation = find(congregations, id);
                let locality = congregation
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| members[0].congregation_name.clone());
                grid_row(members, congregation, RehearsalType::Local, locality, DEFAULT_LOCAL_TIME)
            })
            .collect();
        tables.push(GridTable {
            rehearsal_type: RehearsalType::Local,
            title: format!("ENSAIOS {}", RehearsalType::Local.plural_label()),
            subtitle: Some(city.to_uppercase()),
            rows,
        });
    }

    tables
}

/// Flat table of calendar entries, sorted by date.
pub fn occurrences_dataframe(entries: &[EnsaioData]) -> PolarsResult<DataFrame> {
    let mut sorted: Vec<&EnsaioData> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut columns: Vec<Column> = Vec::with_capacity(5);

    let ids: Vec<Option<&str>> = sorted.iter().map(|e| e.id.as_deref()).collect();
    columns.push(Series::new(PlSmallStr::from_static("id"), ids).into_column());

    let days: Vec<i32> = sorted
        .iter()
        .map(|e| e.date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();
    columns.push(
        Series::new(PlSmallStr::from_static("date"), days)
            .cast(&DataType::Date)?
            .into_column(),
    );

    let congregation: Vec<&str> = sorted.iter().map(|e| e.congregation_name.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("congregation"), congregation).into_column());

    let kind: Vec<&str> = sorted.iter().map(|e| e.rehearsal_type.label()).collect();
    columns.push(Series::new(PlSmallStr::from_static("type"), kind).into_column());

    let city: Vec<&str> = sorted.iter().map(|e| e.city.as_str()).collect();
    columns.push(Series::new(PlSmallStr::from_static("city"), city).into_column());

    DataFrame::new(columns)
}
