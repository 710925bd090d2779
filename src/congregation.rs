use crate::catalog::RehearsalType;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Weekly,
    Monthly,
    /// A single rehearsal on a specific date.
    Scheduled,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Scheduled => "scheduled",
        }
    }

    /// Accepts the English identifiers and the Portuguese form labels
    /// (`Semanal`, `Mensal`, `Agendado`).
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "weekly" | "semanal" => Some(RecurrenceKind::Weekly),
            "monthly" | "mensal" => Some(RecurrenceKind::Monthly),
            "scheduled" | "agendado" => Some(RecurrenceKind::Scheduled),
            _ => None,
        }
    }
}

/// Recurring (or one-off) rehearsal configured for a congregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RehearsalRule {
    pub rehearsal_type: RehearsalType,
    pub recurrence: RecurrenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// 1-based ordinal of the weekday inside the month (monthly rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_of_month: Option<u32>,
    /// Months (1..=12) a monthly rule applies to; empty means every month.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub months: Vec<u32>,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer: Option<String>,
}

impl RehearsalRule {
    pub fn weekly(
        rehearsal_type: RehearsalType,
        weekday: Weekday,
        time: impl Into<String>,
    ) -> Self {
        Self {
            rehearsal_type,
            recurrence: RecurrenceKind::Weekly,
            weekday: Some(weekday),
            date: None,
            week_of_month: None,
            months: Vec::new(),
            time: time.into(),
            elder: None,
            officer: None,
        }
    }

    pub fn monthly(
        rehearsal_type: RehearsalType,
        weekday: Weekday,
        week_of_month: Option<u32>,
        months: Vec<u32>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            recurrence: RecurrenceKind::Monthly,
            week_of_month,
            months,
            ..Self::weekly(rehearsal_type, weekday, time)
        }
    }

    pub fn scheduled(
        rehearsal_type: RehearsalType,
        date: NaiveDate,
        time: impl Into<String>,
    ) -> Self {
        Self {
            rehearsal_type,
            recurrence: RecurrenceKind::Scheduled,
            weekday: None,
            date: Some(date),
            week_of_month: None,
            months: Vec::new(),
            time: time.into(),
            elder: None,
            officer: None,
        }
    }

    pub fn with_leaders(mut self, elder: impl Into<String>, officer: impl Into<String>) -> Self {
        self.elder = Some(elder.into());
        self.officer = Some(officer.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Congregation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default)]
    pub rehearsals: Vec<RehearsalRule>,
}

impl Congregation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            city: city.into(),
            state: None,
            rehearsals: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: RehearsalRule) -> Self {
        self.rehearsals.push(rule);
        self
    }

    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    /// Time configured for the first rule of the given type.
    pub fn time_for(&self, rehearsal_type: RehearsalType) -> Option<&str> {
        self.rehearsals
            .iter()
            .find(|r| r.rehearsal_type == rehearsal_type)
            .map(|r| r.time.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// Read-only lookup over the known congregations.
pub trait CongregationDirectory {
    fn list_all(&self) -> Vec<Congregation>;

    fn find_by_id(&self, id: &str) -> Option<Congregation> {
        self.list_all()
            .into_iter()
            .find(|c| c.id.as_deref() == Some(id))
    }

    fn find_by_fuzzy_name(&self, name: &str) -> Option<Congregation> {
        let all = self.list_all();
        fuzzy_match(&all, name).cloned()
    }
}

/// First congregation whose name contains `name` or is contained by it,
/// ignoring case. Blank queries never match.
pub fn fuzzy_match<'a>(congregations: &'a [Congregation], name: &str) -> Option<&'a Congregation> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    congregations.iter().find(|c| {
        let candidate = c.name.to_lowercase();
        !candidate.is_empty() && (candidate.contains(&needle) || needle.contains(&candidate))
    })
}

impl CongregationDirectory for [Congregation] {
    fn list_all(&self) -> Vec<Congregation> {
        self.to_vec()
    }

    fn find_by_id(&self, id: &str) -> Option<Congregation> {
        self.iter().find(|c| c.id.as_deref() == Some(id)).cloned()
    }

    fn find_by_fuzzy_name(&self, name: &str) -> Option<Congregation> {
        fuzzy_match(self, name).cloned()
    }
}

impl CongregationDirectory for Vec<Congregation> {
    fn list_all(&self) -> Vec<Congregation> {
        self.clone()
    }

    fn find_by_id(&self, id: &str) -> Option<Congregation> {
        self.as_slice().find_by_id(id)
    }

    fn find_by_fuzzy_name(&self, name: &str) -> Option<Congregation> {
        self.as_slice().find_by_fuzzy_name(name)
    }
}
