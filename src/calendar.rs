use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto", "Setembro",
    "Outubro", "Novembro", "Dezembro",
];

/// Portuguese name of a 1-based month.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// January 1st through December 31st of `year`.
    pub fn year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self { start, end })
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = last_day_of_month(year, month)?;
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when any day of the given month falls inside the window.
    pub fn overlaps_month(&self, year: i32, month: u32) -> bool {
        match Self::month(year, month) {
            Some(m) => m.start <= self.end && m.end >= self.start,
            None => false,
        }
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start.year()..=self.end.year()
    }
}

/// Period selector used by calendar queries and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarPeriod {
    /// From today through the next three months.
    #[default]
    Upcoming,
    Annual,
    Month(u32),
}

impl CalendarPeriod {
    const UPCOMING_MONTHS: u32 = 3;

    /// Accepts `all`, `annual` or a month number (`1`..`12`, zero padded or not).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" | "upcoming" => Some(CalendarPeriod::Upcoming),
            "annual" | "anual" => Some(CalendarPeriod::Annual),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|m| (1..=12).contains(m))
                .map(CalendarPeriod::Month),
        }
    }

    pub fn window(&self, year: i32, today: NaiveDate) -> Option<DateWindow> {
        match self {
            CalendarPeriod::Upcoming => {
                let end = today.checked_add_months(Months::new(Self::UPCOMING_MONTHS))?;
                Some(DateWindow::new(today, end))
            }
            CalendarPeriod::Annual => DateWindow::year(year),
            CalendarPeriod::Month(month) => DateWindow::month(year, *month),
        }
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(next - Duration::days(1))
}

/// First date in the month that falls on `weekday`.
pub fn first_weekday_in_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (7 + weekday.num_days_from_sunday() - first.weekday().num_days_from_sunday()) % 7;
    Some(first + Duration::days(i64::from(offset)))
}

/// The `n`th (1-based) `weekday` of the month, or `None` when the month
/// does not have that many.
pub fn nth_weekday_in_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    if n == 0 {
        return None;
    }
    let first = first_weekday_in_month(year, month, weekday)?;
    let date = first + Duration::weeks(i64::from(n - 1));
    (date.month() == month).then_some(date)
}

fn fold_accents(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Parses Portuguese weekday names ("Terça", "sabado", "quarta-feira").
/// English three-letter names are accepted as well.
pub fn parse_weekday(value: &str) -> Option<Weekday> {
    let lowered = fold_accents(&value.trim().to_lowercase());
    let name = lowered.strip_suffix("-feira").unwrap_or(&lowered);
    match name {
        "domingo" | "sun" => Some(Weekday::Sun),
        "segunda" | "mon" => Some(Weekday::Mon),
        "terca" | "tue" => Some(Weekday::Tue),
        "quarta" | "wed" => Some(Weekday::Wed),
        "quinta" | "thu" => Some(Weekday::Thu),
        "sexta" | "fri" => Some(Weekday::Fri),
        "sabado" | "sat" => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn weekday_abbreviation(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "DOM",
        Weekday::Mon => "SEG",
        Weekday::Tue => "TER",
        Weekday::Wed => "QUA",
        Weekday::Thu => "QUI",
        Weekday::Fri => "SEX",
        Weekday::Sat => "SÁB",
    }
}
