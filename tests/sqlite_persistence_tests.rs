#![cfg(feature = "sqlite")]

use chrono::{NaiveDate, Weekday};
use ensaio_tool::{
    Agenda, Congregation, EnsaioData, InstrumentCounts, Instrument, Musician, MusicianFilter,
    MusicianForm, PersistenceError, RehearsalRule, RehearsalType, Repository, Snapshot,
    SqliteRepository, Stage,
};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn musician(id: Option<&str>, name: &str) -> Musician {
    Musician {
        id: id.map(str::to_string),
        name: name.into(),
        congregation_id: "c1".into(),
        congregation_name: "Central".into(),
        city: "Ituiutaba".into(),
        phone: "(34) 99999-0000".into(),
        instrument: Instrument::Viola,
        stage: Stage::CultoOficial,
    }
}

#[test]
fn sqlite_repository_round_trip_survives_reopen() {
    let file = NamedTempFile::new().unwrap();
    {
        let repo = SqliteRepository::<Congregation>::open(file.path()).unwrap();
        let congregation = Congregation::new("c1", "Central", "Ituiutaba").with_rule(
            RehearsalRule::monthly(
                RehearsalType::Regional,
                Weekday::Sun,
                Some(2),
                vec![3, 9],
                "09h00",
            )
            .with_leaders("Ancião José", "Encarregado Paulo"),
        );
        repo.create(congregation).expect("insert congregation");
    }

    let repo = SqliteRepository::<Congregation>::open(file.path()).unwrap();
    let loaded = repo.get("c1").unwrap().expect("congregation exists");
    assert_eq!(loaded.name, "Central");
    assert_eq!(loaded.rehearsals.len(), 1);
    assert_eq!(loaded.rehearsals[0].months, vec![3, 9]);
    assert_eq!(loaded.rehearsals[0].weekday, Some(Weekday::Sun));
    assert_eq!(loaded.rehearsals[0].elder.as_deref(), Some("Ancião José"));
}

#[test]
fn sqlite_list_keeps_insertion_order() {
    let repo = SqliteRepository::<Musician>::in_memory().unwrap();
    for name in ["Carlos", "Ana", "Bruno"] {
        repo.create(musician(None, name)).unwrap();
    }
    let names: Vec<String> = repo.list().unwrap().into_iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["Carlos", "Ana", "Bruno"]);
}

#[test]
fn sqlite_duplicate_id_is_rejected() {
    let repo = SqliteRepository::<Musician>::in_memory().unwrap();
    repo.create(musician(Some("m1"), "Ana")).unwrap();
    let err = repo.create(musician(Some("m1"), "Bia")).unwrap_err();
    assert!(matches!(err, PersistenceError::Duplicate { kind: "musicians", .. }));
}

#[test]
fn sqlite_update_and_delete() {
    let repo = SqliteRepository::<Musician>::in_memory().unwrap();
    repo.create(musician(Some("m1"), "Ana")).unwrap();

    let mut changed = musician(None, "Ana Clara");
    changed.instrument = Instrument::Violino;
    repo.update("m1", changed).unwrap();
    let stored = repo.get("m1").unwrap().unwrap();
    assert_eq!(stored.name, "Ana Clara");
    assert_eq!(stored.instrument, Instrument::Violino);

    let err = repo.update("missing", musician(None, "X")).unwrap_err();
    assert!(matches!(err, PersistenceError::NotFound { .. }));

    assert!(repo.delete("m1").unwrap());
    assert!(!repo.delete("m1").unwrap());
    assert_eq!(repo.get("m1").unwrap(), None);
}

#[test]
fn sqlite_stores_attendance_counts() {
    let repo = SqliteRepository::<EnsaioData>::in_memory().unwrap();
    let mut instruments = InstrumentCounts::zeroed();
    instruments.set("trompete", 4);
    instruments.set("organista", 1);
    let record = EnsaioData {
        id: None,
        rehearsal_type: RehearsalType::Local,
        date: d(2025, 3, 4),
        congregation_id: "c1".into(),
        congregation_name: "Central".into(),
        city: "Ituiutaba".into(),
        elder: None,
        officer: None,
        instruments,
    };

    let created = repo.create(record).unwrap();
    let loaded = repo.get(created.id.as_deref().unwrap()).unwrap().unwrap();
    assert_eq!(loaded.instruments.get("trompete"), 4);
    assert_eq!(loaded.instruments.total(), 5);
    assert_eq!(loaded.date, d(2025, 3, 4));
}

#[test]
fn seeding_a_populated_database_keeps_added_records() {
    let file = NamedTempFile::new().unwrap();
    let seed = Snapshot {
        congregations: vec![Congregation::new("c1", "Central", "Ituiutaba")],
        ..Snapshot::default()
    };
    let form = MusicianForm {
        name: "Ana".into(),
        congregation_id: "c1".into(),
        city: String::new(),
        phone: "(34) 99999-0000".into(),
        instrument: Some(Instrument::Viola),
        stage: Some(Stage::Ensaio),
    };

    {
        let agenda = Agenda::with_sqlite(file.path()).unwrap();
        assert!(agenda.seed(seed.clone()).unwrap());
        agenda.register_musician(form).unwrap();
    }

    let agenda = Agenda::with_sqlite(file.path()).unwrap();
    assert!(!agenda.seed(seed).unwrap());
    let musicians = agenda.musicians(&MusicianFilter::default()).unwrap();
    assert_eq!(musicians.len(), 1);
    assert_eq!(musicians[0].name, "Ana");
}
