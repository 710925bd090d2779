use super::{PersistenceError, PersistenceResult};
use crate::catalog::{Instrument, Stage};
use crate::congregation::Congregation;
use crate::ensaio::EnsaioData;
use crate::musician::Musician;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Everything the tool stores, as written to a JSON backup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub congregations: Vec<Congregation>,
    #[serde(default)]
    pub musicians: Vec<Musician>,
    #[serde(default)]
    pub ensaios: Vec<EnsaioData>,
}

impl Snapshot {
    pub fn validate(&self) -> PersistenceResult<()> {
        super::validate_congregations(&self.congregations)?;
        super::validate_musicians(&self.musicians)?;
        super::validate_ensaios(&self.ensaios)?;
        Ok(())
    }
}

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &Snapshot,
    path: P,
) -> PersistenceResult<()> {
    snapshot.validate()?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Snapshot> {
    let file = File::open(path)?;
    let snapshot: Snapshot = serde_json::from_reader(file)?;
    snapshot.validate()?;
    Ok(snapshot)
}

/// Column order matches the spreadsheet import layout so an exported roster
/// can be imported again.
#[derive(Serialize, Deserialize)]
struct MusicianCsvRecord {
    #[serde(rename = "Nome")]
    name: String,
    #[serde(rename = "Congregação")]
    congregation_name: String,
    #[serde(rename = "Cidade")]
    city: String,
    #[serde(rename = "Telefone")]
    phone: String,
    #[serde(rename = "Instrumento")]
    instrument: String,
    #[serde(rename = "Etapa")]
    stage: String,
    #[serde(rename = "Id", default)]
    id: String,
    #[serde(rename = "CongregaçãoId", default)]
    congregation_id: String,
}

impl From<&Musician> for MusicianCsvRecord {
    fn from(musician: &Musician) -> Self {
        Self {
            name: musician.name.clone(),
            congregation_name: musician.congregation_name.clone(),
            city: musician.city.clone(),
            phone: musician.phone.clone(),
            instrument: musician.instrument.label().to_string(),
            stage: musician.stage.label().to_string(),
            id: musician.id.clone().unwrap_or_default(),
            congregation_id: musician.congregation_id.clone(),
        }
    }
}

impl MusicianCsvRecord {
    fn into_musician(self) -> PersistenceResult<Musician> {
        let instrument = Instrument::from_label(self.instrument.trim()).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid instrument '{}'", self.instrument))
        })?;
        let stage = Stage::from_label(self.stage.trim()).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid stage '{}'", self.stage))
        })?;
        Ok(Musician {
            id: parse_string_option(self.id),
            name: self.name,
            congregation_id: self.congregation_id,
            congregation_name: self.congregation_name,
            city: self.city,
            phone: self.phone,
            instrument,
            stage,
        })
    }
}

pub fn save_musicians_to_csv<P: AsRef<Path>>(
    musicians: &[Musician],
    path: P,
) -> PersistenceResult<()> {
    super::validate_musicians(musicians)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for musician in musicians {
        writer.serialize(MusicianCsvRecord::from(musician))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_musicians_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Musician>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut musicians = Vec::new();
    for record in reader.deserialize::<MusicianCsvRecord>() {
        let record = record?;
        musicians.push(record.into_musician()?);
    }

    if musicians.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no musicians".into(),
        ));
    }

    super::validate_musicians(&musicians)?;
    Ok(musicians)
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
