use super::{PersistenceError, PersistenceResult, SettingsStore};
use crate::{
    ArtifactLog, WorkArtifact, WorkSettings,
    artifact::{FileType, blank_to_none},
    schedule::ArtifactTag,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn save_settings_to_json<P: AsRef<Path>>(
    settings: &WorkSettings,
    path: P,
) -> PersistenceResult<()> {
    super::validate_settings(settings)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, settings)?;
    info!(path = %path.as_ref().display(), "settings saved");
    Ok(())
}

pub fn load_settings_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<WorkSettings> {
    let file = File::open(path.as_ref())?;
    let settings: WorkSettings = serde_json::from_reader(file)?;
    super::validate_settings(&settings)?;
    info!(path = %path.as_ref().display(), "settings loaded");
    Ok(settings)
}

/// Settings kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn save_settings(&self, settings: &WorkSettings) -> PersistenceResult<()> {
        save_settings_to_json(settings, &self.path)
    }

    fn load_settings(&self) -> PersistenceResult<Option<WorkSettings>> {
        match load_settings_from_json(&self.path) {
            Ok(settings) => Ok(Some(settings)),
            Err(PersistenceError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

pub fn save_artifacts_to_json<P: AsRef<Path>>(log: &ArtifactLog, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, log)?;
    Ok(())
}

pub fn load_artifacts_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ArtifactLog> {
    let file = File::open(path)?;
    let log: ArtifactLog = serde_json::from_reader(file)?;
    validate_artifact_ids(log.artifacts())?;
    Ok(ArtifactLog::from_artifacts(log.into_artifacts()))
}

/// One manifest row. Absent optional fields are written as empty cells, so a
/// blank location or title reads back as `None`, matching how
/// [`ArtifactLog::from_artifacts`] normalizes them.
#[derive(Default, Serialize, Deserialize)]
struct ArtifactCsvRecord {
    id: u64,
    timestamp: String,
    company_name: String,
    tag: String,
    file_type: String,
    location: String,
    custom_title: String,
}

impl From<&WorkArtifact> for ArtifactCsvRecord {
    fn from(artifact: &WorkArtifact) -> Self {
        Self {
            id: artifact.id,
            timestamp: artifact.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            company_name: artifact.company_name.clone(),
            tag: artifact.tag.as_str().to_string(),
            file_type: artifact.file_type.to_string(),
            location: artifact.location.clone().unwrap_or_default(),
            custom_title: artifact.custom_title.clone().unwrap_or_default(),
        }
    }
}

impl ArtifactCsvRecord {
    fn into_artifact(self) -> PersistenceResult<WorkArtifact> {
        let timestamp = NaiveDateTime::parse_from_str(self.timestamp.trim(), TIMESTAMP_FORMAT)
            .map_err(|e| {
                PersistenceError::InvalidData(format!("invalid timestamp '{}': {e}", self.timestamp))
            })?;
        Ok(WorkArtifact {
            id: self.id,
            timestamp,
            location: blank_to_none(Some(self.location)),
            company_name: self.company_name,
            tag: parse_tag(&self.tag)?,
            file_type: parse_file_type(&self.file_type)?,
            custom_title: blank_to_none(Some(self.custom_title)),
        })
    }
}

pub fn save_artifacts_to_csv<P: AsRef<Path>>(log: &ArtifactLog, path: P) -> PersistenceResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::Writer::from_writer(file);
    for artifact in log.artifacts() {
        writer.serialize(ArtifactCsvRecord::from(artifact))?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), rows = log.len(), "artifact manifest written");
    Ok(())
}

pub fn load_artifacts_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<ArtifactLog> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut artifacts = Vec::new();
    for record in reader.deserialize::<ArtifactCsvRecord>() {
        artifacts.push(record?.into_artifact()?);
    }
    validate_artifact_ids(&artifacts)?;
    Ok(ArtifactLog::from_artifacts(artifacts))
}

fn validate_artifact_ids(artifacts: &[WorkArtifact]) -> PersistenceResult<()> {
    let mut seen = std::collections::HashSet::new();
    for artifact in artifacts {
        if !seen.insert(artifact.id) {
            return Err(PersistenceError::InvalidData(format!(
                "duplicate artifact id {}",
                artifact.id
            )));
        }
    }
    Ok(())
}

fn parse_tag(input: &str) -> PersistenceResult<ArtifactTag> {
    input
        .parse()
        .map_err(|_| PersistenceError::InvalidData(format!("invalid tag '{}'", input.trim())))
}

fn parse_file_type(input: &str) -> PersistenceResult<FileType> {
    match input.trim() {
        "image" => Ok(FileType::Image),
        "audio" => Ok(FileType::Audio),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid file_type '{other}'"
        ))),
    }
}
