use ensaio_tool::import::sheet::{read_csv_grid, read_grid_file};
use ensaio_tool::import::{parse_grid, parse_grid_report};
use ensaio_tool::{Congregation, Instrument, RejectReason, Stage};
use std::io::Write;

fn directory() -> Vec<Congregation> {
    vec![
        Congregation::new("c1", "Congregação Central", "São Paulo"),
        Congregation::new("c2", "Vila Nova", "Ituiutaba"),
    ]
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn header() -> Vec<String> {
    row(&["Nome", "Congregação", "Cidade", "Telefone", "Instrumento", "Etapa"])
}

#[test]
fn valid_row_resolves_congregation() {
    let rows = vec![
        header(),
        row(&["Maria Silva", "Central", "São Paulo", "(11) 98888-7777", "Clarinete", "Ensaio"]),
    ];
    let musicians = parse_grid(&rows, directory().as_slice());

    assert_eq!(musicians.len(), 1);
    assert_eq!(musicians[0].congregation_id, "c1");
    assert_eq!(musicians[0].congregation_name, "Congregação Central");
    assert_eq!(musicians[0].instrument, Instrument::Clarinete);
    assert_eq!(musicians[0].stage, Stage::Ensaio);
}

#[test]
fn first_row_is_always_dropped() {
    let rows = vec![row(&[
        "Maria Silva", "Central", "São Paulo", "(11) 98888-7777", "Clarinete", "Ensaio",
    ])];
    let report = parse_grid_report(&rows, directory().as_slice());
    assert!(report.records.is_empty());
    assert!(report.rejected.is_empty());
}

#[test]
fn invalid_rows_are_reported_with_their_row_number() {
    let rows = vec![
        header(),
        row(&["Carlos", "Vila Nova", "Ituiutaba", "34 9999", "Guitarra", "Ensaio"]),
        row(&["Ana", "Vila Nova", "Ituiutaba", "34 9999", "Violino", "Iniciante"]),
        row(&["Pedro", "Jardim das Flores", "Uberlândia", "34 9999", "Tuba", "RJM"]),
        row(&["Lia", "Vila Nova", "", "34 9999", "Tuba", "RJM"]),
        row(&["Curto", "Vila Nova"]),
        row(&["Rui", "Vila Nova", "Ituiutaba", "34 9999", "Trombone", "Culto Oficial"]),
    ];
    let report = parse_grid_report(&rows, directory().as_slice());

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].name, "Rui");

    let reasons: Vec<(usize, RejectReason)> = report
        .rejected
        .into_iter()
        .map(|r| (r.row, r.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (2, RejectReason::InvalidInstrument("Guitarra".into())),
            (3, RejectReason::InvalidStage("Iniciante".into())),
            (4, RejectReason::UnknownCongregation("Jardim das Flores".into())),
            (5, RejectReason::MissingFields),
            (6, RejectReason::Unparsable),
        ]
    );
}

#[test]
fn grid_does_not_substitute_similar_instruments() {
    let rows = vec![
        header(),
        row(&["Carlos", "Vila Nova", "Ituiutaba", "34 9999", "sax tenor", "Ensaio"]),
    ];
    assert!(parse_grid(&rows, directory().as_slice()).is_empty());
}

#[test]
fn csv_grid_keeps_header_and_ragged_rows() {
    let data = "Nome,Congregação,Cidade,Telefone,Instrumento,Etapa\n\
                Maria,Central,São Paulo,11 98888-7777,Clarinete,Ensaio\n\
                Curto,Central\n";
    let rows = read_csv_grid(data.as_bytes()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][0], "Nome");
    assert_eq!(rows[2].len(), 2);

    let report = parse_grid_report(&rows, directory().as_slice());
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.rejected.len(), 1);
}

#[test]
fn grid_file_dispatches_on_csv_extension() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Nome,Congregação,Cidade,Telefone,Instrumento,Etapa").unwrap();
    writeln!(file, "Ana,Vila Nova,Ituiutaba,34 99999-0000,Violino,RJM").unwrap();
    file.flush().unwrap();

    let rows = read_grid_file(file.path()).unwrap();
    let musicians = parse_grid(&rows, directory().as_slice());
    assert_eq!(musicians.len(), 1);
    assert_eq!(musicians[0].congregation_id, "c2");
    assert_eq!(musicians[0].stage, Stage::Rjm);
}

#[cfg(feature = "xlsx")]
#[test]
fn unreadable_workbook_is_invalid_data() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"not a workbook").unwrap();
    let err = read_grid_file(file.path()).unwrap_err();
    assert!(matches!(err, ensaio_tool::PersistenceError::InvalidData(_)));
}
