use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruments accepted in the musician roster, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Instrument {
    #[serde(rename = "Clarinete")]
    Clarinete,
    #[serde(rename = "Clarone")]
    Clarone,
    #[serde(rename = "Sax Soprano")]
    SaxSoprano,
    #[serde(rename = "Sax Alto")]
    SaxAlto,
    #[serde(rename = "Sax Tenor")]
    SaxTenor,
    #[serde(rename = "Sax Barítono")]
    SaxBaritono,
    #[serde(rename = "Trompete")]
    Trompete,
    #[serde(rename = "Flugelhorn")]
    Flugelhorn,
    #[serde(rename = "Eufônio")]
    Eufonio,
    #[serde(rename = "Trombone")]
    Trombone,
    #[serde(rename = "Trombonito")]
    Trombonito,
    #[serde(rename = "Tuba")]
    Tuba,
    #[serde(rename = "Viola")]
    Viola,
    #[serde(rename = "Violino")]
    Violino,
    #[serde(rename = "Cello")]
    Cello,
    #[serde(rename = "Órgão")]
    Orgao,
    #[serde(rename = "Acordeon")]
    Acordeon,
    #[serde(rename = "Flauta")]
    Flauta,
}

impl Instrument {
    pub const ALL: [Instrument; 18] = [
        Instrument::Clarinete,
        Instrument::Clarone,
        Instrument::SaxSoprano,
        Instrument::SaxAlto,
        Instrument::SaxTenor,
        Instrument::SaxBaritono,
        Instrument::Trompete,
        Instrument::Flugelhorn,
        Instrument::Eufonio,
        Instrument::Trombone,
        Instrument::Trombonito,
        Instrument::Tuba,
        Instrument::Viola,
        Instrument::Violino,
        Instrument::Cello,
        Instrument::Orgao,
        Instrument::Acordeon,
        Instrument::Flauta,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Instrument::Clarinete => "Clarinete",
            Instrument::Clarone => "Clarone",
            Instrument::SaxSoprano => "Sax Soprano",
            Instrument::SaxAlto => "Sax Alto",
            Instrument::SaxTenor => "Sax Tenor",
            Instrument::SaxBaritono => "Sax Barítono",
            Instrument::Trompete => "Trompete",
            Instrument::Flugelhorn => "Flugelhorn",
            Instrument::Eufonio => "Eufônio",
            Instrument::Trombone => "Trombone",
            Instrument::Trombonito => "Trombonito",
            Instrument::Tuba => "Tuba",
            Instrument::Viola => "Viola",
            Instrument::Violino => "Violino",
            Instrument::Cello => "Cello",
            Instrument::Orgao => "Órgão",
            Instrument::Acordeon => "Acordeon",
            Instrument::Flauta => "Flauta",
        }
    }

    /// Exact, case-sensitive match against the canonical names.
    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.label() == value)
    }

    /// First instrument (in list order) whose name contains `value` or is
    /// contained by it, ignoring case.
    pub fn find_similar(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|i| {
            let name = i.label().to_lowercase();
            name.contains(&needle) || needle.contains(&name)
        })
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progression level of a musician.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Ensaio")]
    Ensaio,
    #[serde(rename = "RJM")]
    Rjm,
    #[serde(rename = "Culto Oficial")]
    CultoOficial,
    #[serde(rename = "Oficialização")]
    Oficializacao,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Ensaio,
        Stage::Rjm,
        Stage::CultoOficial,
        Stage::Oficializacao,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Ensaio => "Ensaio",
            Stage::Rjm => "RJM",
            Stage::CultoOficial => "Culto Oficial",
            Stage::Oficializacao => "Oficialização",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == value)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RehearsalType {
    Local,
    Regional,
    Gem,
    Geral,
    Darpe,
}

impl RehearsalType {
    pub const ALL: [RehearsalType; 5] = [
        RehearsalType::Local,
        RehearsalType::Regional,
        RehearsalType::Gem,
        RehearsalType::Geral,
        RehearsalType::Darpe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RehearsalType::Local => "local",
            RehearsalType::Regional => "regional",
            RehearsalType::Gem => "gem",
            RehearsalType::Geral => "geral",
            RehearsalType::Darpe => "darpe",
        }
    }

    /// Case-insensitive parse of the lowercase identifier.
    pub fn from_str(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    /// Label used in spreadsheet rows and filter summaries.
    pub fn label(&self) -> &'static str {
        match self {
            RehearsalType::Local => "Local",
            RehearsalType::Regional => "Regional",
            RehearsalType::Gem => "GEM",
            RehearsalType::Geral => "Geral",
            RehearsalType::Darpe => "DARPE",
        }
    }

    /// Plural form used in grid table titles ("ENSAIOS REGIONAIS").
    pub fn plural_label(&self) -> &'static str {
        match self {
            RehearsalType::Local => "LOCAIS",
            RehearsalType::Regional => "REGIONAIS",
            RehearsalType::Gem => "GEM",
            RehearsalType::Geral => "GERAIS",
            RehearsalType::Darpe => "DARPE",
        }
    }
}

impl fmt::Display for RehearsalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
