pub mod agenda;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod congregation;
pub mod ensaio;
pub mod export;
pub mod import;
pub mod logging;
pub mod musician;
pub mod notify;
pub mod recurrence;
pub mod repository;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use agenda::{Agenda, AgendaError, AgendaResult, AttendanceForm, CalendarQuery, ImportSummary};
pub use calendar::{CalendarPeriod, DateWindow};
pub use catalog::{Instrument, RehearsalType, Stage};
pub use config::{AppConfig, ConfigError};
pub use congregation::{Congregation, CongregationDirectory, RecurrenceKind, RehearsalRule};
pub use ensaio::{EnsaioData, InstrumentCounts, RehearsalOccurrence};
pub use export::{CalendarRow, GridRow, GridTable};
pub use import::{ImportOutcome, ImportSource, ParseReport, RejectReason, RowRejection};
pub use musician::{Musician, MusicianFilter, MusicianForm};
pub use notify::{LogSink, MemorySink, Notification, NotificationSink, Variant};
pub use recurrence::{ExpansionFilter, expand};
pub use repository::{
    InMemoryRepository, PersistenceError, PersistenceResult, Repository, Snapshot,
    load_musicians_from_csv, load_snapshot_from_json, save_musicians_to_csv,
    save_snapshot_to_json,
};
#[cfg(feature = "sqlite")]
pub use repository::SqliteRepository;
