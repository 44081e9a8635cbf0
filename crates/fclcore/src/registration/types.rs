use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Tournament discipline
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
pub enum Discipline {
    #[serde(rename = "CS2")]
    #[strum(serialize = "CS2")]
    Cs2,
    #[serde(rename = "DOTA2")]
    #[strum(serialize = "DOTA2")]
    Dota2,
    #[serde(rename = "FC26")]
    #[strum(serialize = "FC26")]
    Fc26,
}

impl Discipline {
    /// FC26 is played one on one, so only individual registration exists for it
    pub fn supports_teams(&self) -> bool {
        !matches!(self, Discipline::Fc26)
    }
}

/// Whether a player registers alone or with a team
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegistrationMode {
    Team,
    Individual,
}

/// In-progress registration state
///
/// Saved wholesale: the backend never merges fields, it replaces the stored copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub discipline: Option<Discipline>,
    #[serde(default)]
    pub mode: Option<RegistrationMode>,
    /// Form fields, opaque to the client
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Body of `GET /draft`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftResponse {
    pub draft: Option<Draft>,
}

/// Reasons a draft cannot be submitted yet
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("discipline and mode are required")]
    Incomplete,

    #[error("{discipline} requires individual registration")]
    TeamNotSupported { discipline: Discipline },
}

impl Draft {
    pub fn new(discipline: Discipline, mode: RegistrationMode) -> Self {
        Self {
            discipline: Some(discipline),
            mode: Some(mode),
            data: Map::new(),
        }
    }

    /// Sets a form field, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.data.insert(field.into(), value.into());
        self
    }

    /// Applies the mode rules the backend enforces on save:
    /// FC26 is always individual; CS2 and DOTA2 default to team.
    pub fn normalized(mut self) -> Self {
        match self.discipline {
            Some(d) if !d.supports_teams() => self.mode = Some(RegistrationMode::Individual),
            Some(_) if self.mode.is_none() => self.mode = Some(RegistrationMode::Team),
            _ => {}
        }
        self
    }

    /// Client-side mirror of the backend's submit precondition
    ///
    /// Purely advisory; the backend remains the authority.
    pub fn ensure_submittable(&self) -> Result<(), DraftError> {
        match (self.discipline, self.mode) {
            (Some(discipline), Some(RegistrationMode::Team)) if !discipline.supports_teams() => {
                Err(DraftError::TeamNotSupported { discipline })
            }
            (Some(_), Some(_)) => Ok(()),
            _ => Err(DraftError::Incomplete),
        }
    }
}
