use ensaio_tool::import::{
    RecordLayout, SplitStrategy, UNKNOWN_CITY, detect_layout, map_level_to_stage, parse_text,
    parse_text_report, split_fields, synthetic_congregation_id,
};
use ensaio_tool::{Congregation, Instrument, RejectReason, Stage};

fn directory() -> Vec<Congregation> {
    vec![
        Congregation::new("c1", "Congregação Central", "São Paulo"),
        Congregation::new("c2", "Vila Nova", "Ituiutaba"),
    ]
}

#[test]
fn pipe_separated_line_resolves_congregation() {
    let text = "Maria Silva | Congregação Central | São Paulo | (11) 98888-7777 | Clarinete | Ensaio";
    let musicians = parse_text(text, directory().as_slice());

    assert_eq!(musicians.len(), 1);
    let m = &musicians[0];
    assert_eq!(m.name, "Maria Silva");
    assert_eq!(m.congregation_id, "c1");
    assert_eq!(m.congregation_name, "Congregação Central");
    assert_eq!(m.city, "São Paulo");
    assert_eq!(m.phone, "(11) 98888-7777");
    assert_eq!(m.instrument, Instrument::Clarinete);
    assert_eq!(m.stage, Stage::Ensaio);
    assert_eq!(m.id, None);
}

#[test]
fn header_and_metadata_lines_are_skipped() {
    let text = "\
Relatório de Músicos
Nome | Congregação | Cidade | Telefone | Instrumento | Etapa
Maria Silva | Congregação Central | São Paulo | (11) 98888-7777 | Clarinete | Ensaio
Gerado em 01/02/2025";
    let report = parse_text_report(text, directory().as_slice());
    assert_eq!(report.records.len(), 1);
    assert!(report.rejected.is_empty());
}

#[test]
fn tab_and_multi_space_separators() {
    let text = "Ana Lima\tVila Nova\tItuiutaba\t(34) 99999-0000\tViolino\tRJM\n\
                Pedro Alves    Vila Nova    Ituiutaba    (34) 98888-1111    Trombone    Culto Oficial";
    let musicians = parse_text(text, directory().as_slice());

    assert_eq!(musicians.len(), 2);
    assert_eq!(musicians[0].instrument, Instrument::Violino);
    assert_eq!(musicians[0].stage, Stage::Rjm);
    assert_eq!(musicians[1].name, "Pedro Alves");
    assert_eq!(musicians[1].stage, Stage::CultoOficial);
    assert_eq!(musicians[1].congregation_id, "c2");
}

#[test]
fn split_chain_reports_matching_strategy() {
    let (strategy, fields) = split_fields("a | b | c | d").unwrap();
    assert_eq!(strategy, SplitStrategy::Pipe);
    assert_eq!(fields, vec!["a", "b", "c", "d"]);

    let (strategy, _) = split_fields("a\tb\tc\td").unwrap();
    assert_eq!(strategy, SplitStrategy::Tab);

    let (strategy, _) = split_fields("a  b  c  d").unwrap();
    assert_eq!(strategy, SplitStrategy::MultiSpace);

    assert!(split_fields("only three | fields | here").is_none());
    assert!(split_fields("no separators at all").is_none());
}

#[test]
fn phone_anchored_split_needs_fields_on_both_sides() {
    let line = "José  Central  Campinas (19) 97777-6666 Tuba  Ensaio";
    let fields = SplitStrategy::PhoneAnchored.split(line).unwrap();
    assert_eq!(
        fields,
        vec!["José", "Central", "Campinas", "(19) 97777-6666", "Tuba", "Ensaio"]
    );

    assert!(
        SplitStrategy::PhoneAnchored
            .split("José Central (19) 97777-6666 Tuba  Ensaio")
            .is_none()
    );
}

#[test]
fn similar_instrument_is_substituted() {
    let text = "Carlos | Vila Nova | Ituiutaba | 34 99999-1234 | sax tenor (Bb) | Oficialização";
    let musicians = parse_text(text, directory().as_slice());
    assert_eq!(musicians.len(), 1);
    assert_eq!(musicians[0].instrument, Instrument::SaxTenor);
    assert_eq!(musicians[0].stage, Stage::Oficializacao);
}

#[test]
fn invalid_instrument_and_stage_are_rejected() {
    let text = "\
Carlos | Vila Nova | Ituiutaba | 34 99999-1234 | Guitarra | Ensaio
Beatriz | Vila Nova | Ituiutaba | 34 99999-4321 | Flauta | Iniciante
Curto | Vila Nova | Ituiutaba";
    let report = parse_text_report(text, directory().as_slice());

    assert!(report.records.is_empty());
    assert_eq!(report.rejected.len(), 3);
    assert_eq!(report.rejected[0].row, 1);
    assert_eq!(report.rejected[0].reason, RejectReason::InvalidInstrument("Guitarra".into()));
    assert_eq!(report.rejected[1].reason, RejectReason::InvalidStage("Iniciante".into()));
    assert_eq!(report.rejected[2].reason, RejectReason::Unparsable);
}

#[test]
fn unresolved_congregation_is_kept_with_synthetic_id() {
    let text = "Lucas | Jardim das Flores | Uberlândia | (34) 91234-5678 | Cello | Ensaio";
    let musicians = parse_text(text, directory().as_slice());

    assert_eq!(musicians.len(), 1);
    assert_eq!(musicians[0].congregation_id, "temp_jardim_das_flores");
    assert_eq!(musicians[0].congregation_name, "Jardim das Flores");
    assert_eq!(musicians[0].city, "Uberlândia");
}

#[test]
fn standard_layout_needs_six_fields() {
    // Empty cells collapse, leaving five fields
    let text = "Rita | Morada Nova | | (34) 91234-0000 | Viola | Ensaio";
    let report = parse_text_report(text, directory().as_slice());
    assert!(report.records.is_empty());
    assert_eq!(report.rejected[0].reason, RejectReason::Unparsable);
}

#[test]
fn locality_without_separator_fills_congregation_and_city() {
    let musicians = parse_text(
        "NOME | INSTRUMENTO | LOCALIDADE | CARGO | NIVEL\nRita | Viola | Morada Nova | Músico | ENSAIO",
        directory().as_slice(),
    );
    assert_eq!(musicians.len(), 1);
    assert_eq!(musicians[0].congregation_name, "Morada Nova");
    assert_eq!(musicians[0].city, "Morada Nova");
    assert_ne!(musicians[0].city, UNKNOWN_CITY);
}

#[test]
fn synthetic_id_slug() {
    assert_eq!(synthetic_congregation_id("Jardim  das Flores"), "temp_jardim_das_flores");
    assert_eq!(synthetic_congregation_id("Central"), "temp_central");
}

#[test]
fn alternative_layout_is_detected_from_headers() {
    let lines = ["RELATÓRIO", "NOME | INSTRUMENTO | LOCALIDADE | CARGO | NIVEL"];
    assert_eq!(detect_layout(&lines), RecordLayout::Alternative);
    assert_eq!(detect_layout(&["Nome | Congregação | Cidade"]), RecordLayout::Standard);
    assert_eq!(detect_layout(&["LOCALIDADE apenas"]), RecordLayout::Standard);
}

#[test]
fn alternative_layout_splits_locality_and_maps_level() {
    let text = "\
NOME | INSTRUMENTO | LOCALIDADE | CARGO | NIVEL
João Souza | Trompete | Recanto das Acácias - Capinópolis | Músico | ENSAIO RJM";
    let musicians = parse_text(text, directory().as_slice());

    assert_eq!(musicians.len(), 1);
    let m = &musicians[0];
    assert_eq!(m.name, "João Souza");
    assert_eq!(m.instrument, Instrument::Trompete);
    assert_eq!(m.congregation_name, "Recanto das Acácias");
    assert_eq!(m.city, "Capinópolis");
    assert_eq!(m.stage, Stage::Rjm);
    assert_eq!(m.phone, "");
    assert!(m.congregation_id.starts_with("temp_"));
}

#[test]
fn alternative_layout_resolves_known_congregation() {
    let text = "\
NOME | INSTRUMENTO | LOCALIDADE | CARGO | NIVEL
Marta | Órgão | VILA NOVA - ITUIUTABA | Organista | OFICIALIZADO";
    let musicians = parse_text(text, directory().as_slice());

    assert_eq!(musicians.len(), 1);
    assert_eq!(musicians[0].congregation_id, "c2");
    assert_eq!(musicians[0].congregation_name, "Vila Nova");
    assert_eq!(musicians[0].city, "ITUIUTABA");
    assert_eq!(musicians[0].stage, Stage::Oficializacao);
}

#[test]
fn unmapped_level_fails_stage_validation() {
    let text = "\
NOME | INSTRUMENTO | LOCALIDADE | CARGO | NIVEL
Paulo | Tuba | Vila Nova - Ituiutaba | Músico | INICIANTE";
    let report = parse_text_report(text, directory().as_slice());
    assert!(report.records.is_empty());
    assert_eq!(report.rejected[0].reason, RejectReason::InvalidStage("INICIANTE".into()));
}

#[test]
fn level_priority() {
    assert_eq!(map_level_to_stage("OFICIALIZADO"), Some(Stage::Oficializacao));
    assert_eq!(map_level_to_stage("culto oficial"), Some(Stage::CultoOficial));
    assert_eq!(map_level_to_stage("RJM"), Some(Stage::Rjm));
    assert_eq!(map_level_to_stage("ENSAIO"), Some(Stage::Ensaio));
    assert_eq!(map_level_to_stage("ENSAIO RJM"), Some(Stage::Rjm));
    assert_eq!(map_level_to_stage("INICIANTE"), None);
}

#[test]
fn empty_input_reports_nothing_found() {
    let report = parse_text_report("\n\n   \n", directory().as_slice());
    assert!(report.records.is_empty());
    assert!(matches!(report.outcome(), ensaio_tool::ImportOutcome::NothingFound));
}
