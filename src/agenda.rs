//! Service layer tying the repositories, the congregation directory and the
//! notification sink together.

use crate::calendar::{self, CalendarPeriod};
use crate::catalog::{RehearsalType, Stage};
use crate::congregation::Congregation;
use crate::ensaio::{EnsaioData, HEADCOUNT_KEYS, InstrumentCounts};
use crate::export::{self, CalendarRow, GridTable};
use crate::import::{ImportSource, ParseReport, parse_grid_report, parse_text_report};
use crate::musician::{self, Musician, MusicianFilter, MusicianForm};
use crate::notify::{LogSink, Notification, NotificationSink};
use crate::recurrence::{self, ExpansionFilter};
use crate::repository::{
    Entity, InMemoryRepository, PersistenceError, Repository, Snapshot, assign_id,
    validate_congregations,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AgendaError {
    #[error(transparent)]
    Persistence(PersistenceError),
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("congregation {0} not found")]
    UnknownCongregation(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("no rehearsals match the selected filters")]
    NothingToExport,
    #[error("invalid calendar query: {0}")]
    InvalidQuery(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[cfg(feature = "xlsx")]
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl From<PersistenceError> for AgendaError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { kind, id } => AgendaError::NotFound { kind, id },
            other => AgendaError::Persistence(other),
        }
    }
}

pub type AgendaResult<T> = Result<T, AgendaError>;

/// Attendance ("frequência") form for a rehearsal that took place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceForm {
    #[serde(default)]
    pub rehearsal_type: Option<RehearsalType>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub congregation_id: String,
    /// Required for regional rehearsals, ignored otherwise.
    #[serde(default)]
    pub elder: Option<String>,
    #[serde(default)]
    pub officer: Option<String>,
    /// Headcounts by form key; absent keys count as zero.
    #[serde(default)]
    pub instruments: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    #[serde(default)]
    pub period: CalendarPeriod,
    #[serde(default)]
    pub congregation_id: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub rehearsal_type: Option<RehearsalType>,
}

impl CalendarQuery {
    pub fn for_year(year: i32) -> Self {
        Self {
            year,
            period: CalendarPeriod::default(),
            congregation_id: None,
            city: None,
            rehearsal_type: None,
        }
    }

    pub fn with_period(mut self, period: CalendarPeriod) -> Self {
        self.period = period;
        self
    }

    /// Human-readable description of the applied filters, printed above
    /// exported calendars.
    pub fn filter_lines(&self, congregations: &[Congregation]) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(id) = &self.congregation_id {
            let name = congregations
                .iter()
                .find(|c| c.id.as_deref() == Some(id.as_str()))
                .map(|c| c.name.as_str())
                .unwrap_or(id.as_str());
            lines.push(format!("Congregação: {name}"));
        }
        if let Some(city) = &self.city {
            lines.push(format!("Cidade: {city}"));
        }
        if let Some(rehearsal_type) = self.rehearsal_type {
            lines.push(format!("Tipo: {}", rehearsal_type.label()));
        }
        match self.period {
            CalendarPeriod::Month(month) => {
                if let Some(name) = calendar::month_name(month) {
                    lines.push(format!("Mês: {name}"));
                }
            }
            CalendarPeriod::Annual => lines.push("Período: Anual".to_string()),
            CalendarPeriod::Upcoming => {}
        }
        lines.push(format!("Ano: {}", self.year));
        lines
    }

    fn accepts(&self, entry: &EnsaioData, cities: &HashMap<&str, &str>) -> bool {
        if entry.date.year() != self.year {
            return false;
        }
        if let Some(id) = &self.congregation_id {
            if &entry.congregation_id != id {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if cities.get(entry.congregation_id.as_str()) != Some(&city.as_str()) {
                return false;
            }
        }
        if let CalendarPeriod::Month(month) = self.period {
            if entry.date.month() != month {
                return false;
            }
        }
        self.rehearsal_type.is_none_or(|t| t == entry.rehearsal_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: usize,
    pub failed: usize,
}

pub struct Agenda {
    congregations: Arc<dyn Repository<Congregation>>,
    musicians: Arc<dyn Repository<Musician>>,
    ensaios: Arc<dyn Repository<EnsaioData>>,
    notifier: Arc<dyn NotificationSink>,
}

impl Agenda {
    pub fn new(
        congregations: Arc<dyn Repository<Congregation>>,
        musicians: Arc<dyn Repository<Musician>>,
        ensaios: Arc<dyn Repository<EnsaioData>>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            congregations,
            musicians,
            ensaios,
            notifier,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRepository::<Congregation>::new()),
            Arc::new(InMemoryRepository::<Musician>::new()),
            Arc::new(InMemoryRepository::<EnsaioData>::new()),
            Arc::new(LogSink),
        )
    }

    /// Opens (or creates) the three collections in one SQLite file.
    #[cfg(feature = "sqlite")]
    pub fn with_sqlite<P: AsRef<std::path::Path>>(path: P) -> AgendaResult<Self> {
        use crate::repository::SqliteRepository;
        let path = path.as_ref();
        Ok(Self::new(
            Arc::new(SqliteRepository::<Congregation>::open(path)?),
            Arc::new(SqliteRepository::<Musician>::open(path)?),
            Arc::new(SqliteRepository::<EnsaioData>::open(path)?),
            Arc::new(LogSink),
        ))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    // Congregations

    pub fn congregations(&self) -> AgendaResult<Vec<Congregation>> {
        Ok(self.congregations.list()?)
    }

    pub fn congregation(&self, id: &str) -> AgendaResult<Congregation> {
        self.congregations
            .get(id)?
            .ok_or_else(|| AgendaError::UnknownCongregation(id.to_string()))
    }

    pub fn add_congregation(&self, mut congregation: Congregation) -> AgendaResult<Congregation> {
        assign_id(&mut congregation);
        validate_congregations(std::slice::from_ref(&congregation))?;
        let created = self.congregations.create(congregation)?;
        info!(id = created.id_str(), name = %created.name, "congregation added");
        Ok(created)
    }

    pub fn replace_congregation(
        &self,
        id: &str,
        mut congregation: Congregation,
    ) -> AgendaResult<Congregation> {
        congregation.id = Some(id.to_string());
        validate_congregations(std::slice::from_ref(&congregation))?;
        Ok(self.congregations.update(id, congregation)?)
    }

    pub fn remove_congregation(&self, id: &str) -> AgendaResult<()> {
        if !self.congregations.delete(id)? {
            return Err(AgendaError::UnknownCongregation(id.to_string()));
        }
        info!(id, "congregation removed");
        Ok(())
    }

    // Musicians

    pub fn register_musician(&self, form: MusicianForm) -> AgendaResult<Musician> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "musician registration rejected");
            self.notify(Notification::error(
                "Campos obrigatórios",
                "Preencha todos os campos para cadastrar um músico.",
            ));
            return Err(AgendaError::MissingFields(missing));
        }

        let congregation_id = form.congregation_id.trim();
        let Some(congregation) = self.congregations.get(congregation_id)? else {
            warn!(congregation_id, "musician registration for unknown congregation");
            self.notify(Notification::error(
                "Erro ao cadastrar",
                "Não foi possível cadastrar o músico.",
            ));
            return Err(AgendaError::UnknownCongregation(congregation_id.to_string()));
        };

        let city = match form.city.trim() {
            "" => congregation.city.clone(),
            city => city.to_string(),
        };
        if city.is_empty() {
            self.notify(Notification::error(
                "Campos obrigatórios",
                "Preencha todos os campos para cadastrar um músico.",
            ));
            return Err(AgendaError::MissingFields(vec!["city"]));
        }

        let (Some(instrument), Some(stage)) = (form.instrument, form.stage) else {
            return Err(AgendaError::MissingFields(form.missing_fields()));
        };
        let musician = Musician {
            id: None,
            name: form.name.trim().to_string(),
            congregation_id: congregation_id.to_string(),
            congregation_name: congregation.name.clone(),
            city,
            phone: form.phone.trim().to_string(),
            instrument,
            stage,
        };

        match self.musicians.create(musician) {
            Ok(created) => {
                info!(
                    id = created.id.as_deref().unwrap_or_default(),
                    name = %created.name,
                    "musician registered"
                );
                self.notify(Notification::info(
                    "Músico cadastrado!",
                    format!("{} foi cadastrado com sucesso.", created.name),
                ));
                Ok(created)
            }
            Err(err) => {
                self.notify(Notification::error(
                    "Erro ao cadastrar",
                    "Não foi possível cadastrar o músico.",
                ));
                Err(err.into())
            }
        }
    }

    pub fn replace_musician(&self, id: &str, musician: Musician) -> AgendaResult<Musician> {
        Ok(self.musicians.update(id, musician)?)
    }

    pub fn remove_musician(&self, id: &str) -> AgendaResult<Musician> {
        let Some(musician) = self.musicians.get(id)? else {
            return Err(AgendaError::NotFound {
                kind: "musicians",
                id: id.to_string(),
            });
        };
        match self.musicians.delete(id) {
            Ok(_) => {
                info!(id, name = %musician.name, "musician removed");
                self.notify(Notification::info(
                    "Músico removido",
                    format!("{} foi removido com sucesso.", musician.name),
                ));
                Ok(musician)
            }
            Err(err) => {
                self.notify(Notification::error(
                    "Erro ao remover",
                    "Não foi possível remover o músico.",
                ));
                Err(err.into())
            }
        }
    }

    pub fn musician(&self, id: &str) -> AgendaResult<Option<Musician>> {
        Ok(self.musicians.get(id)?)
    }

    pub fn musicians(&self, filter: &MusicianFilter) -> AgendaResult<Vec<Musician>> {
        let all = self.musicians.list()?;
        Ok(all.into_iter().filter(|m| filter.matches(m)).collect())
    }

    pub fn musicians_by_stage(
        &self,
        filter: &MusicianFilter,
    ) -> AgendaResult<BTreeMap<Stage, Vec<Musician>>> {
        Ok(musician::group_by_stage(&self.musicians(filter)?))
    }

    // Import

    /// Parses the input against the current congregation list without
    /// storing anything.
    pub fn preview_import(&self, source: &ImportSource) -> AgendaResult<ParseReport> {
        let congregations = self.congregations.list()?;
        let report = match source {
            ImportSource::Text(raw) => parse_text_report(raw, congregations.as_slice()),
            ImportSource::Grid(rows) => parse_grid_report(rows, congregations.as_slice()),
        };

        if report.records.is_empty() {
            self.notify(Notification::error(
                "Nenhum dado encontrado",
                "Verifique se o arquivo segue o formato Nome | Congregação | Cidade | Telefone | Instrumento | Etapa.",
            ));
        } else {
            self.notify(Notification::info(
                "Arquivo processado!",
                format!("{} músico(s) encontrado(s) no arquivo.", report.records.len()),
            ));
        }
        Ok(report)
    }

    /// Stores each previewed record; one failure does not stop the rest.
    pub fn confirm_import(&self, records: Vec<Musician>) -> ImportSummary {
        let mut summary = ImportSummary::default();
        if records.is_empty() {
            return summary;
        }

        for record in records {
            let name = record.name.clone();
            match self.musicians.create(record) {
                Ok(_) => summary.created += 1,
                Err(err) => {
                    warn!(%name, error = %err, "musician import failed");
                    summary.failed += 1;
                }
            }
        }

        info!(created = summary.created, failed = summary.failed, "import confirmed");
        let failures = if summary.failed > 0 {
            format!(". {} falha(s).", summary.failed)
        } else {
            ".".to_string()
        };
        self.notify(Notification::info(
            "Importação concluída!",
            format!("{} músico(s) importado(s) com sucesso{failures}", summary.created),
        ));
        summary
    }

    // Attendance

    pub fn record_attendance(&self, form: AttendanceForm) -> AgendaResult<EnsaioData> {
        let congregation_id = form.congregation_id.trim();
        let congregation = if congregation_id.is_empty() {
            None
        } else {
            self.congregations.get(congregation_id)?
        };
        let (Some(rehearsal_type), Some(date), Some(congregation)) =
            (form.rehearsal_type, form.date, congregation)
        else {
            self.notify(Notification::error(
                "Campos obrigatórios",
                "Preencha todos os campos obrigatórios.",
            ));
            let mut missing = Vec::new();
            if form.rehearsal_type.is_none() {
                missing.push("rehearsal_type");
            }
            if form.date.is_none() {
                missing.push("date");
            }
            if missing.is_empty() && !congregation_id.is_empty() {
                return Err(AgendaError::UnknownCongregation(congregation_id.to_string()));
            }
            if congregation_id.is_empty() {
                missing.push("congregation_id");
            }
            return Err(AgendaError::MissingFields(missing));
        };

        let leader = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let (elder, officer) = if rehearsal_type == RehearsalType::Regional {
            match (leader(&form.elder), leader(&form.officer)) {
                (Some(elder), Some(officer)) => (Some(elder), Some(officer)),
                (elder, officer) => {
                    self.notify(Notification::error(
                        "Campos obrigatórios",
                        "Informe o nome do Ancião e Encarregado Regional.",
                    ));
                    let mut missing = Vec::new();
                    if elder.is_none() {
                        missing.push("elder");
                    }
                    if officer.is_none() {
                        missing.push("officer");
                    }
                    return Err(AgendaError::MissingFields(missing));
                }
            }
        } else {
            (None, None)
        };

        let mut instruments = InstrumentCounts::zeroed();
        for (key, count) in form.instruments {
            if HEADCOUNT_KEYS.contains(&key.as_str()) {
                instruments.set(key, count);
            } else {
                warn!(%key, "ignoring unknown headcount key");
            }
        }

        let record = EnsaioData {
            id: None,
            rehearsal_type,
            date,
            congregation_id: congregation_id.to_string(),
            congregation_name: congregation.name.clone(),
            city: congregation.city.clone(),
            elder,
            officer,
            instruments,
        };

        match self.ensaios.create(record) {
            Ok(created) => {
                info!(
                    congregation = %created.congregation_name,
                    date = %created.date,
                    total = created.instruments.total(),
                    "attendance recorded"
                );
                self.notify(Notification::info(
                    "Frequência lançada!",
                    "Frequência de ensaio registrada com sucesso.",
                ));
                Ok(created)
            }
            Err(err) => {
                self.notify(Notification::error(
                    "Erro ao lançar frequência",
                    "Ocorreu um erro ao salvar.",
                ));
                Err(err.into())
            }
        }
    }

    pub fn attendance(&self) -> AgendaResult<Vec<EnsaioData>> {
        Ok(self.ensaios.list()?)
    }

    pub fn attendance_record(&self, id: &str) -> AgendaResult<Option<EnsaioData>> {
        Ok(self.ensaios.get(id)?)
    }

    pub fn remove_attendance(&self, id: &str) -> AgendaResult<()> {
        if !self.ensaios.delete(id)? {
            return Err(AgendaError::NotFound {
                kind: "ensaios",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    // Calendar

    /// Stored attendance records merged with the dates generated from every
    /// congregation's rules, filtered and sorted by date.
    pub fn calendar(
        &self,
        query: &CalendarQuery,
        today: NaiveDate,
    ) -> AgendaResult<Vec<EnsaioData>> {
        let congregations = self.congregations.list()?;
        self.calendar_with(&congregations, query, today)
    }

    fn calendar_with(
        &self,
        congregations: &[Congregation],
        query: &CalendarQuery,
        today: NaiveDate,
    ) -> AgendaResult<Vec<EnsaioData>> {
        let window = query.period.window(query.year, today).ok_or_else(|| {
            AgendaError::InvalidQuery(format!(
                "no date window for {:?} in {}",
                query.period, query.year
            ))
        })?;
        let cities: HashMap<&str, &str> = congregations
            .iter()
            .filter_map(|c| c.id.as_deref().map(|id| (id, c.city.as_str())))
            .collect();

        let filter = ExpansionFilter {
            congregation_id: query.congregation_id.clone(),
            city: query.city.clone(),
            rehearsal_type: query.rehearsal_type,
        };
        let generated = recurrence::expand(congregations, &window, &filter);
        let generated_count = generated.len();

        let mut entries = self.ensaios.list()?;
        let stored_count = entries.len();
        entries.extend(generated.into_iter().map(|occurrence| {
            let city = cities
                .get(occurrence.congregation_id.as_str())
                .copied()
                .unwrap_or_default();
            occurrence.into_record(city)
        }));
        entries.retain(|entry| query.accepts(entry, &cities));
        entries.sort_by_key(|entry| entry.date);

        tracing::debug!(
            stored = stored_count,
            generated = generated_count,
            kept = entries.len(),
            "calendar assembled"
        );
        Ok(entries)
    }

    fn nothing_to_export(&self) -> AgendaError {
        self.notify(Notification::error(
            "Nenhum ensaio encontrado",
            "Não há ensaios cadastrados com os filtros selecionados.",
        ));
        AgendaError::NothingToExport
    }

    /// Filter lines and sorted rows for a calendar export.
    fn export_rows(
        &self,
        query: &CalendarQuery,
        today: NaiveDate,
    ) -> AgendaResult<(Vec<String>, Vec<CalendarRow>)> {
        let congregations = self.congregations.list()?;
        let entries = self.calendar_with(&congregations, query, today)?;
        if entries.is_empty() {
            return Err(self.nothing_to_export());
        }
        let rows = export::calendar_rows(&entries, &congregations);
        Ok((query.filter_lines(&congregations), rows))
    }

    /// Writes the calendar as CSV and returns the number of entries written.
    pub fn export_calendar_csv<W: Write>(
        &self,
        query: &CalendarQuery,
        today: NaiveDate,
        writer: W,
    ) -> AgendaResult<usize> {
        let (filter_lines, rows) = self.export_rows(query, today)?;
        export::write_calendar_csv(writer, &filter_lines, &rows)?;
        info!(rows = rows.len(), year = query.year, format = "csv", "calendar exported");
        self.notify(Notification::info(
            "Calendário exportado!",
            "O arquivo CSV foi gerado com sucesso.",
        ));
        Ok(rows.len())
    }

    /// Writes the calendar as an `.xlsx` workbook and returns the number of
    /// entries written.
    #[cfg(feature = "xlsx")]
    pub fn export_calendar_xlsx<W: Write>(
        &self,
        query: &CalendarQuery,
        today: NaiveDate,
        mut writer: W,
    ) -> AgendaResult<usize> {
        let (filter_lines, rows) = self.export_rows(query, today)?;
        let bytes = export::calendar_workbook(&filter_lines, &rows)?;
        writer.write_all(&bytes)?;
        info!(rows = rows.len(), year = query.year, format = "xlsx", "calendar exported");
        self.notify(Notification::info(
            "Calendário exportado!",
            "O arquivo Excel foi gerado com sucesso.",
        ));
        Ok(rows.len())
    }

    pub fn calendar_grid(
        &self,
        query: &CalendarQuery,
        today: NaiveDate,
    ) -> AgendaResult<Vec<GridTable>> {
        let congregations = self.congregations.list()?;
        let entries = self.calendar_with(&congregations, query, today)?;
        if entries.is_empty() {
            return Err(self.nothing_to_export());
        }
        Ok(export::monthly_grid(&entries, &congregations))
    }

    // Snapshots

    pub fn snapshot(&self) -> AgendaResult<Snapshot> {
        Ok(Snapshot {
            congregations: self.congregations.list()?,
            musicians: self.musicians.list()?,
            ensaios: self.ensaios.list()?,
        })
    }

    /// Replaces every stored record with the snapshot's contents. Either the
    /// whole snapshot is applied or the previous contents are put back.
    pub fn restore(&self, snapshot: Snapshot) -> AgendaResult<()> {
        snapshot.validate()?;
        let previous = self.snapshot()?;
        if let Err(err) = self.replace_all(snapshot) {
            warn!(error = %err, "restore failed; reapplying previous contents");
            self.replace_all(previous)?;
            return Err(err);
        }
        Ok(())
    }

    /// Restores `snapshot` only into empty storage. Returns whether it was applied.
    pub fn seed(&self, snapshot: Snapshot) -> AgendaResult<bool> {
        let current = self.snapshot()?;
        if !current.congregations.is_empty()
            || !current.musicians.is_empty()
            || !current.ensaios.is_empty()
        {
            info!(
                congregations = current.congregations.len(),
                musicians = current.musicians.len(),
                "storage already populated; seed skipped"
            );
            return Ok(false);
        }
        self.restore(snapshot)?;
        Ok(true)
    }

    fn replace_all(&self, snapshot: Snapshot) -> AgendaResult<()> {
        clear(self.congregations.as_ref())?;
        clear(self.musicians.as_ref())?;
        clear(self.ensaios.as_ref())?;
        for congregation in snapshot.congregations {
            self.congregations.create(congregation)?;
        }
        for musician in snapshot.musicians {
            self.musicians.create(musician)?;
        }
        for record in snapshot.ensaios {
            self.ensaios.create(record)?;
        }
        Ok(())
    }
}

fn clear<T: Entity>(repository: &dyn Repository<T>) -> AgendaResult<()> {
    for item in repository.list()? {
        if let Some(id) = item.id() {
            repository.delete(id)?;
        }
    }
    Ok(())
}
