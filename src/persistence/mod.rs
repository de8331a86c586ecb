use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

use crate::WorkSettings;
use crate::settings::SettingsError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<SettingsError> for PersistenceError {
    fn from(value: SettingsError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Read/write access to the persisted [`WorkSettings`].
pub trait SettingsStore {
    fn save_settings(&self, settings: &WorkSettings) -> PersistenceResult<()>;
    /// `Ok(None)` when nothing has been saved yet.
    fn load_settings(&self) -> PersistenceResult<Option<WorkSettings>>;

    fn load_or_default(&self) -> PersistenceResult<WorkSettings> {
        Ok(self.load_settings()?.unwrap_or_default())
    }
}

pub fn validate_settings(settings: &WorkSettings) -> PersistenceResult<()> {
    settings.validate().map_err(PersistenceError::from)
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonSettingsStore, load_artifacts_from_csv, load_artifacts_from_json, load_settings_from_json,
    save_artifacts_to_csv, save_artifacts_to_json, save_settings_to_json,
};
