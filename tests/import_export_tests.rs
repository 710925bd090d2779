use chrono::{NaiveDate, Weekday};
use ensaio_tool::{
    Congregation, EnsaioData, InstrumentCounts, Instrument, Musician, PersistenceError,
    RehearsalRule, RehearsalType, Snapshot, Stage, load_musicians_from_csv,
    load_snapshot_from_json, save_musicians_to_csv, save_snapshot_to_json,
};
use ensaio_tool::import::parse_grid;
use ensaio_tool::import::sheet::read_csv_grid_file;
use std::io::Write;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn musician(id: &str, name: &str) -> Musician {
    Musician {
        id: Some(id.into()),
        name: name.into(),
        congregation_id: "c1".into(),
        congregation_name: "Central".into(),
        city: "Ituiutaba".into(),
        phone: "(34) 99999-0000".into(),
        instrument: Instrument::SaxBaritono,
        stage: Stage::Oficializacao,
    }
}

fn build_sample_snapshot() -> Snapshot {
    let mut instruments = InstrumentCounts::zeroed();
    instruments.set("clarinete", 3);
    Snapshot {
        congregations: vec![
            Congregation::new("c1", "Central", "Ituiutaba")
                .with_rule(RehearsalRule::weekly(RehearsalType::Local, Weekday::Tue, "19h30")),
        ],
        musicians: vec![musician("m1", "Ana"), musician("m2", "Bruno")],
        ensaios: vec![EnsaioData {
            id: Some("e1".into()),
            rehearsal_type: RehearsalType::Regional,
            date: d(2025, 3, 9),
            congregation_id: "c1".into(),
            congregation_name: "Central".into(),
            city: "Ituiutaba".into(),
            elder: Some("Ancião José".into()),
            officer: Some("Encarregado Paulo".into()),
            instruments,
        }],
    }
}

#[test]
fn snapshot_json_round_trip() {
    let snapshot = build_sample_snapshot();
    let file = NamedTempFile::new().unwrap();
    save_snapshot_to_json(&snapshot, file.path()).unwrap();

    let loaded = load_snapshot_from_json(file.path()).unwrap();
    assert_eq!(loaded, snapshot);
    assert_eq!(loaded.ensaios[0].instruments.get("clarinete"), 3);
}

#[test]
fn snapshot_rejects_duplicate_congregation_ids() {
    let mut snapshot = build_sample_snapshot();
    snapshot
        .congregations
        .push(Congregation::new("c1", "Outra", "Capinópolis"));
    let file = NamedTempFile::new().unwrap();
    let err = save_snapshot_to_json(&snapshot, file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn snapshot_rejects_out_of_range_months() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"congregations":[{{"id":"c1","name":"Central","city":"Ituiutaba",
            "rehearsals":[{{"rehearsal_type":"regional","recurrence":"monthly",
            "weekday":"Sun","week_of_month":2,"months":[13],"time":"09h00"}}]}}]}}"#
    )
    .unwrap();
    let err = load_snapshot_from_json(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(msg) if msg.contains("month 13")));
}

#[test]
fn missing_snapshot_sections_default_to_empty() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"musicians":[]}}"#).unwrap();
    let loaded = load_snapshot_from_json(file.path()).unwrap();
    assert!(loaded.congregations.is_empty());
    assert!(loaded.ensaios.is_empty());
}

#[test]
fn musician_csv_round_trip() {
    let musicians = vec![musician("m1", "Ana"), musician("m2", "Bruno")];
    let file = NamedTempFile::new().unwrap();
    save_musicians_to_csv(&musicians, file.path()).unwrap();

    let loaded = load_musicians_from_csv(file.path()).unwrap();
    assert_eq!(loaded, musicians);
}

#[test]
fn exported_roster_can_be_imported_as_grid() {
    let musicians = vec![musician("m1", "Ana")];
    let file = NamedTempFile::new().unwrap();
    save_musicians_to_csv(&musicians, file.path()).unwrap();

    let rows = read_csv_grid_file(file.path()).unwrap();
    assert_eq!(rows[0][0], "Nome");
    let directory = vec![Congregation::new("c1", "Central", "Ituiutaba")];
    let imported = parse_grid(&rows, directory.as_slice());
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].name, "Ana");
    assert_eq!(imported[0].instrument, Instrument::SaxBaritono);
    assert_eq!(imported[0].id, None);
}

#[test]
fn empty_csv_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Nome,Congregação,Cidade,Telefone,Instrumento,Etapa,Id,CongregaçãoId"
    )
    .unwrap();
    let err = load_musicians_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn csv_with_unknown_instrument_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Nome,Congregação,Cidade,Telefone,Instrumento,Etapa,Id,CongregaçãoId"
    )
    .unwrap();
    writeln!(file, "Ana,Central,Ituiutaba,34 9999,Guitarra,Ensaio,m1,c1").unwrap();
    let err = load_musicians_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(msg) if msg.contains("Guitarra")));
}
