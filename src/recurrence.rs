//! Expansion of congregation rehearsal rules into concrete dates.
//!
//! Weekly rules yield a single representative date per month (the first
//! matching weekday), monthly rules the `week_of_month`-th matching weekday of
//! each configured month, and scheduled rules their fixed date. Rules that
//! cannot produce a date are skipped without failing the expansion.

use crate::calendar::{self, DateWindow};
use crate::catalog::RehearsalType;
use crate::congregation::{Congregation, RecurrenceKind, RehearsalRule};
use crate::ensaio::{InstrumentCounts, RehearsalOccurrence};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ALL_MONTHS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionFilter {
    #[serde(default)]
    pub congregation_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub rehearsal_type: Option<RehearsalType>,
}

impl ExpansionFilter {
    fn accepts_congregation(&self, congregation: &Congregation) -> bool {
        if let Some(id) = &self.congregation_id {
            if congregation.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if &congregation.city != city {
                return false;
            }
        }
        true
    }

    fn accepts_type(&self, rehearsal_type: RehearsalType) -> bool {
        self.rehearsal_type.is_none_or(|t| t == rehearsal_type)
    }
}

/// Produces every occurrence of the congregations' rules inside `window`.
///
/// Output order follows congregation order, then rule order, then date.
pub fn expand(
    congregations: &[Congregation],
    window: &DateWindow,
    filter: &ExpansionFilter,
) -> Vec<RehearsalOccurrence> {
    let mut occurrences = Vec::new();

    for congregation in congregations.iter().filter(|c| filter.accepts_congregation(c)) {
        let Some(congregation_id) = congregation.id.as_deref() else {
            debug!(name = %congregation.name, "skipping congregation without id");
            continue;
        };

        for rule in congregation
            .rehearsals
            .iter()
            .filter(|r| filter.accepts_type(r.rehearsal_type))
        {
            for date in rule_dates(rule, window) {
                occurrences.push(RehearsalOccurrence {
                    id: RehearsalOccurrence::composite_id(
                        congregation_id,
                        date,
                        rule.rehearsal_type,
                    ),
                    congregation_id: congregation_id.to_string(),
                    congregation_name: congregation.name.clone(),
                    rehearsal_type: rule.rehearsal_type,
                    date,
                    instruments: InstrumentCounts::zeroed(),
                });
            }
        }
    }

    occurrences
}

/// Dates produced by a single rule inside the window.
pub fn rule_dates(rule: &RehearsalRule, window: &DateWindow) -> Vec<NaiveDate> {
    if rule.recurrence == RecurrenceKind::Scheduled {
        return match rule.date {
            Some(date) if window.contains(date) => vec![date],
            Some(_) => Vec::new(),
            None => {
                debug!(rehearsal_type = %rule.rehearsal_type, "scheduled rule without a date");
                Vec::new()
            }
        };
    }

    let Some(weekday) = rule.weekday else {
        debug!(
            rehearsal_type = %rule.rehearsal_type,
            recurrence = rule.recurrence.as_str(),
            "recurring rule without a weekday"
        );
        return Vec::new();
    };

    let months: &[u32] = match rule.recurrence {
        RecurrenceKind::Monthly if !rule.months.is_empty() => &rule.months,
        _ => &ALL_MONTHS,
    };
    // Ordinal 0 behaves like an unset ordinal.
    let ordinal = match rule.recurrence {
        RecurrenceKind::Monthly => rule.week_of_month.filter(|k| *k > 0).unwrap_or(1),
        _ => 1,
    };

    let mut dates = Vec::new();
    for year in window.years() {
        for &month in months {
            if !(1..=12).contains(&month) {
                debug!(month, "ignoring month outside 1..=12");
                continue;
            }
            if !window.overlaps_month(year, month) {
                continue;
            }
            match calendar::nth_weekday_in_month(year, month, weekday, ordinal) {
                Some(date) if window.contains(date) => dates.push(date),
                Some(_) => {}
                None => debug!(year, month, ordinal, "week of month past month end"),
            }
        }
    }
    dates.sort();
    dates.dedup();
    dates
}
