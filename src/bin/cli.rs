use chrono::{Datelike, NaiveDate};
use ensaio_tool::calendar::parse_weekday;
use ensaio_tool::export::{export_file_name, occurrences_dataframe};
use ensaio_tool::import::sheet::{read_csv_grid_file, read_grid_file};
use ensaio_tool::{
    Agenda, AppConfig, AttendanceForm, CalendarPeriod, CalendarQuery, Congregation, ImportSource,
    Instrument, MemorySink, Musician, MusicianFilter, MusicianForm, RehearsalRule, RehearsalType,
    Stage, load_musicians_from_csv, load_snapshot_from_json, logging, save_musicians_to_csv,
    save_snapshot_to_json,
};
use polars::prelude::{AnyValue, DataFrame, IntoColumn, NamedFrom, PlSmallStr, PolarsResult, Series};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn cell_text(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, s) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(s);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(s.chars().count())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn musicians_dataframe(musicians: &[Musician]) -> PolarsResult<DataFrame> {
    let column = |name: &'static str, values: Vec<&str>| {
        Series::new(PlSmallStr::from_static(name), values).into_column()
    };
    DataFrame::new(vec![
        column("id", musicians.iter().map(|m| m.id.as_deref().unwrap_or_default()).collect()),
        column("name", musicians.iter().map(|m| m.name.as_str()).collect()),
        column("congregation", musicians.iter().map(|m| m.congregation_name.as_str()).collect()),
        column("city", musicians.iter().map(|m| m.city.as_str()).collect()),
        column("phone", musicians.iter().map(|m| m.phone.as_str()).collect()),
        column("instrument", musicians.iter().map(|m| m.instrument.label()).collect()),
        column("stage", musicians.iter().map(|m| m.stage.label()).collect()),
    ])
}

fn print_df(result: PolarsResult<DataFrame>) {
    match result {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error building table: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                                         Show this help\n  congregations                                List congregations and their rules\n  congregation add <id>;<name>;<city>          Add a congregation\n  rule <id> weekly <type> <weekday> <time>     Add a weekly rehearsal rule\n  rule <id> monthly <type> <weekday> <n> <months|all> <time>\n                                               Add a monthly rule (months like 1,4,7)\n  rule <id> scheduled <type> <YYYY-MM-DD> <time>\n                                               Add a one-off rehearsal\n  musicians [stage]                            List musicians (optionally by stage)\n  add <name>;<congregation_id>;<city>;<phone>;<instrument>;<stage>\n                                               Register a musician (blank city = congregation's)\n  delete <id>                                  Remove a musician\n  import <text|csv|xlsx> <path>                Preview a roster import\n  confirm | cancel                             Store or discard the previewed import\n  attend <type>;<YYYY-MM-DD>;<congregation_id>[;<elder>;<officer>]\n                                               Record rehearsal attendance\n  calendar <year> [period] [type]              Show rehearsals (period: all|annual|1-12)\n  grid <year> [period]                         Show the monthly rehearsal grid\n  export <year> [period] [dir] [csv|xlsx]      Write the calendar file into dir\n  save <json|csv> <path>                       Save everything (json) or the roster (csv)\n  load <json|csv> <path>                       Load everything (json) or the roster (csv)\n  quit|exit                                    Exit"
    );
}

fn print_notifications(sink: &MemorySink) {
    for notification in sink.drain() {
        println!("[{}]", notification.message().replace('\n', " - "));
    }
}

fn print_congregations(agenda: &Agenda) {
    match agenda.congregations() {
        Ok(congregations) if congregations.is_empty() => println!("No congregations."),
        Ok(congregations) => {
            for congregation in congregations {
                println!(
                    "{:<12} {} ({})",
                    congregation.id_str(),
                    congregation.name,
                    congregation.city
                );
                for rule in &congregation.rehearsals {
                    let when = match (rule.date, rule.weekday) {
                        (Some(date), _) => date.to_string(),
                        (None, Some(weekday)) => weekday.to_string(),
                        (None, None) => "-".to_string(),
                    };
                    println!(
                        "    {:<9} {:<10} {:<12} {}",
                        rule.rehearsal_type.label(),
                        rule.recurrence.as_str(),
                        when,
                        rule.time
                    );
                }
            }
        }
        Err(e) => println!("Error listing congregations: {}", e),
    }
}

fn parse_months(value: &str) -> Option<Vec<u32>> {
    if value == "all" {
        return Some(Vec::new());
    }
    value
        .split(',')
        .map(|m| m.trim().parse::<u32>().ok().filter(|m| (1..=12).contains(m)))
        .collect()
}

fn parse_rule<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<RehearsalRule, String> {
    let kind = parts.next().ok_or("missing recurrence")?;
    let rehearsal_type = parts
        .next()
        .and_then(RehearsalType::from_str)
        .ok_or("invalid rehearsal type")?;
    match kind {
        "weekly" => {
            let weekday = parts.next().and_then(parse_weekday).ok_or("invalid weekday")?;
            let time = parts.next().unwrap_or_default();
            Ok(RehearsalRule::weekly(rehearsal_type, weekday, time))
        }
        "monthly" => {
            let weekday = parts.next().and_then(parse_weekday).ok_or("invalid weekday")?;
            let week = parts
                .next()
                .and_then(|w| w.parse::<u32>().ok())
                .ok_or("invalid week of month")?;
            let months = parts.next().and_then(parse_months).ok_or("invalid months")?;
            let time = parts.next().unwrap_or_default();
            Ok(RehearsalRule::monthly(rehearsal_type, weekday, Some(week), months, time))
        }
        "scheduled" => {
            let date = parts
                .next()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .ok_or("invalid date")?;
            let time = parts.next().unwrap_or_default();
            Ok(RehearsalRule::scheduled(rehearsal_type, date, time))
        }
        other => Err(format!("unknown recurrence '{other}'")),
    }
}

fn parse_calendar_args<'a>(
    mut parts: impl Iterator<Item = &'a str>,
    today: NaiveDate,
) -> Result<(CalendarQuery, Option<&'a str>), String> {
    let year = match parts.next() {
        Some(y) => y.parse::<i32>().map_err(|_| format!("invalid year '{y}'"))?,
        None => today.year(),
    };
    let period = match parts.next() {
        Some(p) => CalendarPeriod::parse(p).ok_or_else(|| format!("invalid period '{p}'"))?,
        None => CalendarPeriod::Annual,
    };
    Ok((CalendarQuery::for_year(year).with_period(period), parts.next()))
}

fn semicolon_fields(rest: &str) -> Vec<String> {
    rest.split(';').map(|f| f.trim().to_string()).collect()
}

fn open_agenda(config: &AppConfig) -> Result<Agenda, Box<dyn std::error::Error>> {
    let agenda = match &config.database_path {
        #[cfg(feature = "sqlite")]
        Some(path) => Agenda::with_sqlite(path)?,
        _ => Agenda::in_memory(),
    };
    if let Some(seed) = &config.seed_path {
        agenda.seed(load_snapshot_from_json(seed)?)?;
    }
    Ok(agenda)
}

fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            AppConfig::default()
        }
    };
    logging::init_tracing(&config.log_filter);

    let sink = Arc::new(MemorySink::new());
    let agenda = match open_agenda(&config) {
        Ok(agenda) => agenda.with_notifier(sink.clone()),
        Err(e) => {
            eprintln!("Could not open storage: {}", e);
            return;
        }
    };
    let today = chrono::Local::now().date_naive();
    let mut pending: Vec<Musician> = Vec::new();

    println!("Ensaio Tool (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let rest = input[cmd.len()..].trim();

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "congregations" => print_congregations(&agenda),
            "congregation" => match parts.next() {
                Some("add") => {
                    let fields = semicolon_fields(rest.trim_start_matches("add").trim());
                    match fields.as_slice() {
                        [id, name, city] if !id.is_empty() && !name.is_empty() => {
                            match agenda.add_congregation(Congregation::new(id, name, city)) {
                                Ok(c) => {
                                    println!("Added congregation {} ({}).", c.name, c.id_str())
                                }
                                Err(e) => println!("Error adding congregation: {}", e),
                            }
                        }
                        _ => println!("Usage: congregation add <id>;<name>;<city>"),
                    }
                }
                _ => println!("Usage: congregation add <id>;<name>;<city>"),
            },
            "rule" => {
                let Some(id) = parts.next() else {
                    println!("Usage: rule <congregation_id> <weekly|monthly|scheduled> ...");
                    continue;
                };
                match parse_rule(parts) {
                    Ok(rule) => match agenda.congregation(id) {
                        Ok(congregation) => {
                            let updated = congregation.with_rule(rule);
                            match agenda.replace_congregation(id, updated) {
                                Ok(_) => println!("Rule added to {}.", id),
                                Err(e) => println!("Error saving rule: {}", e),
                            }
                        }
                        Err(e) => println!("Error: {}", e),
                    },
                    Err(e) => println!("Invalid rule: {}", e),
                }
            }
            "musicians" => {
                let stage = match (!rest.is_empty()).then_some(rest) {
                    Some(label) => match Stage::from_label(label) {
                        Some(stage) => Some(stage),
                        None => {
                            println!("Unknown stage '{}'.", label);
                            continue;
                        }
                    },
                    None => None,
                };
                let filter = MusicianFilter {
                    stage,
                    ..MusicianFilter::default()
                };
                match agenda.musicians(&filter) {
                    Ok(musicians) => print_df(musicians_dataframe(&musicians)),
                    Err(e) => println!("Error listing musicians: {}", e),
                }
            }
            "add" => {
                let fields = semicolon_fields(rest);
                let [name, congregation_id, city, phone, instrument, stage] = fields.as_slice()
                else {
                    println!("Usage: add <name>;<congregation_id>;<city>;<phone>;<instrument>;<stage>");
                    continue;
                };
                let form = MusicianForm {
                    name: name.clone(),
                    congregation_id: congregation_id.clone(),
                    city: city.clone(),
                    phone: phone.clone(),
                    instrument: Instrument::from_label(instrument)
                        .or_else(|| Instrument::find_similar(instrument)),
                    stage: Stage::from_label(stage),
                };
                match agenda.register_musician(form) {
                    Ok(m) => println!(
                        "Registered musician {}.",
                        m.id.as_deref().unwrap_or_default()
                    ),
                    Err(e) => println!("Error registering musician: {}", e),
                }
            }
            "delete" => match parts.next() {
                Some(id) => match agenda.remove_musician(id) {
                    Ok(_) => println!("Deleted musician {id}."),
                    Err(e) => println!("Error deleting musician: {}", e),
                },
                None => println!("Usage: delete <id>"),
            },
            "import" => {
                let source = match (parts.next(), parts.next()) {
                    (Some("text"), Some(path)) => fs::read_to_string(path)
                        .map(ImportSource::Text)
                        .map_err(|e| e.to_string()),
                    (Some("csv"), Some(path)) => read_csv_grid_file(path)
                        .map(ImportSource::Grid)
                        .map_err(|e| e.to_string()),
                    (Some("xlsx"), Some(path)) => read_grid_file(path)
                        .map(ImportSource::Grid)
                        .map_err(|e| e.to_string()),
                    _ => {
                        println!("Usage: import <text|csv|xlsx> <path>");
                        continue;
                    }
                };
                match source.map(|s| agenda.preview_import(&s)) {
                    Ok(Ok(report)) => {
                        for rejection in &report.rejected {
                            println!("  row {} skipped: {}", rejection.row, rejection.reason);
                        }
                        pending = report.records;
                        print_df(musicians_dataframe(&pending));
                        if !pending.is_empty() {
                            println!(
                                "{} record(s) ready; type 'confirm' to store them.",
                                pending.len()
                            );
                        }
                    }
                    Ok(Err(e)) => println!("Error previewing import: {}", e),
                    Err(e) => println!("Error reading import file: {}", e),
                }
            }
            "confirm" => {
                if pending.is_empty() {
                    println!("Nothing to confirm.");
                } else {
                    let summary = agenda.confirm_import(std::mem::take(&mut pending));
                    println!(
                        "Imported {} musician(s), {} failure(s).",
                        summary.created, summary.failed
                    );
                }
            }
            "cancel" => {
                pending.clear();
                println!("Import discarded.");
            }
            "attend" => {
                let fields = semicolon_fields(rest);
                if fields.len() < 3 {
                    println!("Usage: attend <type>;<YYYY-MM-DD>;<congregation_id>[;<elder>;<officer>]");
                    continue;
                }
                let form = AttendanceForm {
                    rehearsal_type: RehearsalType::from_str(&fields[0]),
                    date: NaiveDate::parse_from_str(&fields[1], "%Y-%m-%d").ok(),
                    congregation_id: fields[2].clone(),
                    elder: fields.get(3).cloned(),
                    officer: fields.get(4).cloned(),
                    ..AttendanceForm::default()
                };
                match agenda.record_attendance(form) {
                    Ok(record) => println!(
                        "Recorded attendance {}.",
                        record.id.as_deref().unwrap_or_default()
                    ),
                    Err(e) => println!("Error recording attendance: {}", e),
                }
            }
            "calendar" => match parse_calendar_args(parts, today) {
                Ok((mut query, type_arg)) => {
                    if let Some(value) = type_arg {
                        match RehearsalType::from_str(value) {
                            Some(t) => query.rehearsal_type = Some(t),
                            None => {
                                println!("Unknown rehearsal type '{}'.", value);
                                continue;
                            }
                        }
                    }
                    match agenda.calendar(&query, today) {
                        Ok(entries) => {
                            println!("{} rehearsal(s).", entries.len());
                            print_df(occurrences_dataframe(&entries));
                        }
                        Err(e) => println!("Error building calendar: {}", e),
                    }
                }
                Err(e) => println!("{}", e),
            },
            "grid" => match parse_calendar_args(parts, today) {
                Ok((query, _)) => match agenda.calendar_grid(&query, today) {
                    Ok(tables) => {
                        for table in tables {
                            match &table.subtitle {
                                Some(subtitle) => println!("{} - {}", table.title, subtitle),
                                None => println!("{}", table.title),
                            }
                            print_df(table.to_dataframe());
                        }
                    }
                    Err(e) => println!("Error building grid: {}", e),
                },
                Err(e) => println!("{}", e),
            },
            "export" => {
                let args: Vec<&str> = parts.collect();
                let format = args.get(3).copied().unwrap_or("csv");
                match parse_calendar_args(args.iter().copied().take(3), today) {
                    Ok((query, dir)) => {
                        let dir = dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
                        let path = dir.join(export_file_name(query.year, query.period, format));
                        let mut buffer = Vec::new();
                        let result = match format {
                            "csv" => agenda.export_calendar_csv(&query, today, &mut buffer),
                            #[cfg(feature = "xlsx")]
                            "xlsx" => agenda.export_calendar_xlsx(&query, today, &mut buffer),
                            other => {
                                println!("Unsupported export format '{}'.", other);
                                continue;
                            }
                        };
                        match result {
                            Ok(rows) => match fs::write(&path, buffer) {
                                Ok(_) => {
                                    println!(
                                        "Calendar exported to {} ({} rows).",
                                        path.display(),
                                        rows
                                    )
                                }
                                Err(e) => println!("Error writing {}: {}", path.display(), e),
                            },
                            Err(e) => println!("Error exporting calendar: {}", e),
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            "save" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) => match agenda.snapshot() {
                        Ok(snapshot) => match save_snapshot_to_json(&snapshot, path) {
                            Ok(_) => println!("Data saved to {}.", path),
                            Err(e) => println!("Error saving data: {}", e),
                        },
                        Err(e) => println!("Error reading data: {}", e),
                    },
                    (Some("csv"), Some(path)) => {
                        match agenda.musicians(&MusicianFilter::default()) {
                            Ok(musicians) => match save_musicians_to_csv(&musicians, path) {
                                Ok(_) => println!("Roster saved to {}.", path),
                                Err(e) => println!("Error saving roster: {}", e),
                            },
                            Err(e) => println!("Error reading musicians: {}", e),
                        }
                    }
                    _ => println!("Usage: save <json|csv> <path>"),
                }
            }
            "load" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some("json"), Some(path)) => {
                        match load_snapshot_from_json(path).map_err(|e| e.to_string()).and_then(
                            |snapshot| agenda.restore(snapshot).map_err(|e| e.to_string()),
                        ) {
                            Ok(_) => println!("Data loaded from {}.", path),
                            Err(e) => println!("Error loading data: {}", e),
                        }
                    }
                    (Some("csv"), Some(path)) => {
                        let result = load_musicians_from_csv(Path::new(path))
                            .map_err(|e| e.to_string())
                            .and_then(|musicians| {
                                let mut snapshot = agenda.snapshot().map_err(|e| e.to_string())?;
                                snapshot.musicians = musicians;
                                agenda.restore(snapshot).map_err(|e| e.to_string())
                            });
                        match result {
                            Ok(_) => println!("Roster loaded from {}.", path),
                            Err(e) => println!("Error loading roster: {}", e),
                        }
                    }
                    _ => println!("Usage: load <json|csv> <path>"),
                }
            }
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
        print_notifications(&sink);
    }
}
