#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use ensaio_tool::{Agenda, AppConfig, http_api, load_snapshot_from_json, logging};

    let config = AppConfig::load()?;
    logging::init_tracing(&config.log_filter);

    let agenda = match &config.database_path {
        #[cfg(feature = "sqlite")]
        Some(path) => {
            tracing::info!(path = %path.display(), "opening SQLite storage");
            Agenda::with_sqlite(path)?
        }
        #[cfg(not(feature = "sqlite"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "built without `sqlite`; using in-memory storage"
            );
            Agenda::in_memory()
        }
        None => Agenda::in_memory(),
    };

    if let Some(seed) = &config.seed_path {
        let snapshot = load_snapshot_from_json(seed)?;
        let congregations = snapshot.congregations.len();
        let musicians = snapshot.musicians.len();
        if agenda.seed(snapshot)? {
            tracing::info!(path = %seed.display(), congregations, musicians, "seeded storage");
        }
    }

    println!("ensaio-tool HTTP API listening on http://{}", config.http_addr);
    http_api::serve(config.http_addr, agenda).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
