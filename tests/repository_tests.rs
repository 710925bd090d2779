use ensaio_tool::{
    Congregation, InMemoryRepository, Instrument, Musician, PersistenceError, Repository, Stage,
};

fn musician(id: Option<&str>, name: &str) -> Musician {
    Musician {
        id: id.map(str::to_string),
        name: name.into(),
        congregation_id: "c1".into(),
        congregation_name: "Central".into(),
        city: "Ituiutaba".into(),
        phone: "(34) 99999-0000".into(),
        instrument: Instrument::Trompete,
        stage: Stage::Ensaio,
    }
}

#[test]
fn create_assigns_id_when_missing() {
    let repo = InMemoryRepository::<Musician>::new();
    let created = repo.create(musician(None, "Ana")).unwrap();
    let id = created.id.clone().expect("id assigned");
    assert!(!id.is_empty());
    assert_eq!(repo.get(&id).unwrap(), Some(created));
}

#[test]
fn create_keeps_given_id_and_rejects_duplicates() {
    let repo = InMemoryRepository::<Musician>::new();
    repo.create(musician(Some("m1"), "Ana")).unwrap();
    let err = repo.create(musician(Some("m1"), "Outra Ana")).unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Duplicate { kind: "musicians", ref id } if id == "m1"
    ));
    assert_eq!(repo.list().unwrap().len(), 1);
}

#[test]
fn blank_id_is_replaced() {
    let repo = InMemoryRepository::<Musician>::new();
    let created = repo.create(musician(Some("  "), "Ana")).unwrap();
    assert_ne!(created.id.as_deref(), Some("  "));
}

#[test]
fn list_preserves_insertion_order() {
    let repo = InMemoryRepository::<Musician>::new();
    for name in ["Carlos", "Ana", "Bruno"] {
        repo.create(musician(None, name)).unwrap();
    }
    let names: Vec<String> = repo.list().unwrap().into_iter().map(|m| m.name).collect();
    assert_eq!(names, vec!["Carlos", "Ana", "Bruno"]);
}

#[test]
fn update_replaces_whole_record_and_pins_id() {
    let repo = InMemoryRepository::<Musician>::new();
    repo.create(musician(Some("m1"), "Ana")).unwrap();

    let mut replacement = musician(Some("other"), "Ana Paula");
    replacement.stage = Stage::Rjm;
    let updated = repo.update("m1", replacement).unwrap();

    assert_eq!(updated.id.as_deref(), Some("m1"));
    let stored = repo.get("m1").unwrap().unwrap();
    assert_eq!(stored.name, "Ana Paula");
    assert_eq!(stored.stage, Stage::Rjm);
    assert_eq!(repo.get("other").unwrap(), None);
}

#[test]
fn update_missing_record_is_not_found() {
    let repo = InMemoryRepository::<Musician>::new();
    let err = repo.update("nope", musician(None, "Ana")).unwrap_err();
    assert!(matches!(err, PersistenceError::NotFound { kind: "musicians", .. }));
}

#[test]
fn delete_reports_whether_anything_was_removed() {
    let repo = InMemoryRepository::<Musician>::new();
    repo.create(musician(Some("m1"), "Ana")).unwrap();
    assert!(repo.delete("m1").unwrap());
    assert!(!repo.delete("m1").unwrap());
    assert!(repo.list().unwrap().is_empty());
}

#[test]
fn seeded_repository_assigns_missing_ids() {
    let repo = InMemoryRepository::with_items(vec![
        Congregation::new("c1", "Central", "Ituiutaba"),
        Congregation {
            id: None,
            ..Congregation::new("x", "Vila Nova", "Ituiutaba")
        },
    ]);
    let all = repo.list().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id.as_deref(), Some("c1"));
    assert!(all[1].id.is_some());
}

#[test]
fn repository_works_behind_trait_object() {
    let repo: Box<dyn Repository<Musician>> = Box::new(InMemoryRepository::new());
    repo.create(musician(Some("m1"), "Ana")).unwrap();
    assert_eq!(repo.list().unwrap().len(), 1);
}
