use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::schedule::{ArtifactTag, ScheduleConfig, ScheduleEngine};

const UNKNOWN_LOCATION: &str = "Unknown location";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("no artifact with id {0}")]
    NotFound(u64),
    #[error("artifact ids exhausted")]
    IdsExhausted,
    #[error("unknown tag '{0}'")]
    UnknownTag(String),
    #[error("tag {tag} is not allowed for {file_type} artifacts")]
    TagNotAllowed { file_type: FileType, tag: ArtifactTag },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Image,
    Audio,
}

impl FileType {
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Image => "jpg",
            FileType::Audio => "m4a",
        }
    }

    /// Audio keeps the Audio tag; images take any of the time-based tags.
    pub fn allows_tag(&self, tag: ArtifactTag) -> bool {
        match self {
            FileType::Audio => tag == ArtifactTag::Audio,
            FileType::Image => tag != ArtifactTag::Audio,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Image => f.write_str("image"),
            FileType::Audio => f.write_str("audio"),
        }
    }
}

/// Metadata for one captured photo or recording. Media bytes live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkArtifact {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub company_name: String,
    pub tag: ArtifactTag,
    pub file_type: FileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
}

impl WorkArtifact {
    /// Build a freshly captured artifact, tagged from `config`. A blank
    /// location is stored as `None`.
    pub fn capture(
        id: u64,
        file_type: FileType,
        timestamp: NaiveDateTime,
        location: Option<String>,
        company_name: impl Into<String>,
        config: &ScheduleConfig,
    ) -> Self {
        let tag = ScheduleEngine::new().classify_capture(file_type, &timestamp, config);
        Self {
            id,
            timestamp,
            location: blank_to_none(location),
            company_name: company_name.into(),
            tag,
            file_type,
            custom_title: None,
        }
    }

    /// Custom title if set, otherwise [`WorkArtifact::default_title`].
    pub fn title(&self) -> String {
        match &self.custom_title {
            Some(title) => title.clone(),
            None => self.default_title(),
        }
    }

    /// `MM-dd HH:mm-<tag label>`.
    pub fn default_title(&self) -> String {
        format!("{}-{}", self.timestamp.format("%m-%d %H:%M"), self.tag.label())
    }

    /// Retag and retitle.
    ///
    /// A tag change drops any custom title so the default one shows. With the
    /// tag unchanged, `title` is kept only when it differs from the default
    /// title; a blank or default title clears it.
    pub fn apply_edit(&mut self, tag: ArtifactTag, title: Option<&str>) -> Result<(), ArtifactError> {
        if !self.file_type.allows_tag(tag) {
            return Err(ArtifactError::TagNotAllowed {
                file_type: self.file_type,
                tag,
            });
        }
        let retagged = self.tag != tag;
        self.tag = tag;
        self.custom_title = match blank_to_none(title.map(str::to_string)) {
            Some(title) if !retagged && title != self.default_title() => Some(title),
            _ => None,
        };
        Ok(())
    }

    pub fn watermark_text(&self) -> String {
        format!(
            "Company: {}\nTime: {}\nType: {}\nLocation: {}",
            self.company_name,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.tag.label(),
            self.location.as_deref().unwrap_or(UNKNOWN_LOCATION)
        )
    }

    /// Relative archive path, `YYYY/MM/<title>.<ext>`.
    pub fn export_path(&self) -> PathBuf {
        let mut path = PathBuf::from(format!("{:04}", self.timestamp.year()));
        path.push(format!("{:02}", self.timestamp.month()));
        path.push(format!(
            "{}.{}",
            sanitize_file_name(&self.title()),
            self.file_type.extension()
        ));
        path
    }
}

/// Blank and whitespace-only strings carry no information and read as `None`.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            other => other,
        })
        .collect()
}

/// Captured artifacts in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLog {
    artifacts: Vec<WorkArtifact>,
}

impl ArtifactLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank locations and titles are normalized to `None`.
    pub fn from_artifacts(artifacts: Vec<WorkArtifact>) -> Self {
        let artifacts = artifacts
            .into_iter()
            .map(|mut artifact| {
                artifact.location = blank_to_none(artifact.location.take());
                artifact.custom_title = blank_to_none(artifact.custom_title.take());
                artifact
            })
            .collect();
        Self { artifacts }
    }

    pub fn get(&self, id: u64) -> Option<&WorkArtifact> {
        self.artifacts.iter().find(|artifact| artifact.id == id)
    }

    pub fn artifacts(&self) -> &[WorkArtifact] {
        &self.artifacts
    }

    pub fn into_artifacts(self) -> Vec<WorkArtifact> {
        self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn next_id(&self) -> Result<u64, ArtifactError> {
        match self.artifacts.iter().map(|artifact| artifact.id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(ArtifactError::IdsExhausted),
        }
    }

    pub fn record(&mut self, artifact: WorkArtifact) {
        self.artifacts.push(artifact);
    }

    /// Tag and record a new capture, returning the stored artifact.
    pub fn capture(
        &mut self,
        file_type: FileType,
        timestamp: NaiveDateTime,
        location: Option<String>,
        company_name: impl Into<String>,
        config: &ScheduleConfig,
    ) -> Result<&WorkArtifact, ArtifactError> {
        let artifact = WorkArtifact::capture(
            self.next_id()?,
            file_type,
            timestamp,
            location,
            company_name,
            config,
        );
        tracing::debug!(id = artifact.id, tag = %artifact.tag, "captured artifact");
        let index = self.artifacts.len();
        self.artifacts.push(artifact);
        Ok(&self.artifacts[index])
    }

    /// Retag and retitle an artifact, see [`WorkArtifact::apply_edit`].
    pub fn edit(
        &mut self,
        id: u64,
        tag: ArtifactTag,
        title: Option<&str>,
    ) -> Result<&WorkArtifact, ArtifactError> {
        let artifact = self
            .artifacts
            .iter_mut()
            .find(|artifact| artifact.id == id)
            .ok_or(ArtifactError::NotFound(id))?;
        artifact.apply_edit(tag, title)?;
        tracing::debug!(id, tag = %artifact.tag, "edited artifact");
        Ok(artifact)
    }

    pub fn remove(&mut self, id: u64) -> Result<WorkArtifact, ArtifactError> {
        let index = self
            .artifacts
            .iter()
            .position(|artifact| artifact.id == id)
            .ok_or(ArtifactError::NotFound(id))?;
        tracing::debug!(id, "removed artifact");
        Ok(self.artifacts.remove(index))
    }

    /// Move every artifact recorded under `old` to `new`. Returns how many changed.
    pub fn rename_company(&mut self, old: &str, new: &str) -> usize {
        let mut renamed = 0;
        for artifact in self.artifacts.iter_mut().filter(|a| a.company_name == old) {
            artifact.company_name = new.to_string();
            renamed += 1;
        }
        if renamed > 0 {
            tracing::info!(old, new, renamed, "company renamed on artifacts");
        }
        renamed
    }

    /// Artifacts stamped within `start..=end`.
    pub fn in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> impl Iterator<Item = &WorkArtifact> + '_ {
        self.artifacts
            .iter()
            .filter(move |artifact| artifact.timestamp >= start && artifact.timestamp <= end)
    }

    pub fn count_in_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> usize {
        self.in_range(start, end).count()
    }

    /// Archive layout for artifacts in `start..=end`: company name ascending,
    /// newest first within a company.
    pub fn export_plan(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Vec<(PathBuf, &WorkArtifact)> {
        let mut selected: Vec<&WorkArtifact> = self.in_range(start, end).collect();
        selected.sort_by(|a, b| {
            a.company_name
                .cmp(&b.company_name)
                .then_with(|| Reverse(a.timestamp).cmp(&Reverse(b.timestamp)))
        });
        selected
            .into_iter()
            .map(|artifact| (artifact.export_path(), artifact))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn audio_capture_is_always_tagged_audio() {
        let config = ScheduleConfig::default();
        let artifact =
            WorkArtifact::capture(1, FileType::Audio, at(3, 3, 9, 0), None, "Acme", &config);
        assert_eq!(artifact.tag, ArtifactTag::Audio);
    }

    #[test]
    fn title_and_export_path_follow_timestamp() {
        let config = ScheduleConfig::default();
        let artifact =
            WorkArtifact::capture(1, FileType::Image, at(3, 3, 8, 50), None, "Acme", &config);
        assert_eq!(artifact.title(), "03-03 08:50-Check-in");
        assert_eq!(
            artifact.export_path(),
            PathBuf::from("2025").join("03").join("03-03 08-50-Check-in.jpg")
        );
    }

    #[test]
    fn custom_title_is_sanitized_in_path() {
        let mut artifact = WorkArtifact::capture(
            7,
            FileType::Audio,
            at(11, 1, 20, 0),
            None,
            "Acme",
            &ScheduleConfig::default(),
        );
        artifact.custom_title = Some("late/night: call".into());
        assert_eq!(
            artifact.export_path().file_name().unwrap().to_string_lossy(),
            "late-night- call.m4a"
        );
    }

    #[test]
    fn watermark_mentions_unknown_location() {
        let artifact = WorkArtifact::capture(
            1,
            FileType::Image,
            at(3, 3, 12, 0),
            None,
            "Acme",
            &ScheduleConfig::default(),
        );
        let text = artifact.watermark_text();
        assert!(text.contains("Company: Acme"));
        assert!(text.contains("Time: 2025-03-03 12:00:00"));
        assert!(text.contains("Type: Other"));
        assert!(text.ends_with("Location: Unknown location"));
    }

    #[test]
    fn export_plan_orders_by_company_then_newest() {
        let config = ScheduleConfig::default();
        let mut log = ArtifactLog::new();
        log.capture(FileType::Image, at(3, 3, 9, 0), None, "Zeta", &config).unwrap();
        log.capture(FileType::Image, at(3, 3, 17, 0), None, "Acme", &config).unwrap();
        log.capture(FileType::Audio, at(3, 4, 9, 0), None, "Acme", &config).unwrap();
        log.capture(FileType::Image, at(4, 1, 9, 0), None, "Acme", &config).unwrap();

        let plan = log.export_plan(at(3, 1, 0, 0), at(3, 31, 23, 59));
        let ids: Vec<u64> = plan.iter().map(|(_, a)| a.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(log.count_in_range(at(3, 1, 0, 0), at(3, 31, 23, 59)), 3);
        assert_eq!(log.next_id(), Ok(5));
    }

    #[test]
    fn capture_fails_instead_of_overflowing_ids() {
        let config = ScheduleConfig::default();
        let last = WorkArtifact::capture(u64::MAX, FileType::Image, at(3, 3, 9, 0), None, "Acme", &config);
        let mut log = ArtifactLog::from_artifacts(vec![last]);
        assert_eq!(log.next_id(), Err(ArtifactError::IdsExhausted));
        assert_eq!(
            log.capture(FileType::Audio, at(3, 3, 10, 0), None, "Acme", &config)
                .unwrap_err(),
            ArtifactError::IdsExhausted
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn retagging_drops_custom_title() {
        let config = ScheduleConfig::default();
        let mut log = ArtifactLog::new();
        log.capture(FileType::Image, at(3, 3, 12, 0), None, "Acme", &config).unwrap();

        let edited = log.edit(1, ArtifactTag::Other, Some("Site visit")).unwrap();
        assert_eq!(edited.title(), "Site visit");

        let edited = log.edit(1, ArtifactTag::Overtime, Some("Site visit")).unwrap();
        assert_eq!(edited.custom_title, None);
        assert_eq!(edited.title(), "03-03 12:00-Overtime");
    }

    #[test]
    fn default_or_blank_title_is_not_stored() {
        let config = ScheduleConfig::default();
        let mut log = ArtifactLog::new();
        log.capture(FileType::Image, at(3, 3, 12, 0), None, "Acme", &config).unwrap();
        log.edit(1, ArtifactTag::Other, Some("Lunch")).unwrap();

        let edited = log.edit(1, ArtifactTag::Other, Some("03-03 12:00-Other")).unwrap();
        assert_eq!(edited.custom_title, None);
        log.edit(1, ArtifactTag::Other, Some("Lunch")).unwrap();
        assert_eq!(log.edit(1, ArtifactTag::Other, Some("  ")).unwrap().custom_title, None);
    }

    #[test]
    fn edit_rejects_mismatched_tags_and_unknown_ids() {
        let config = ScheduleConfig::default();
        let mut log = ArtifactLog::new();
        log.capture(FileType::Audio, at(3, 3, 12, 0), None, "Acme", &config).unwrap();
        log.capture(FileType::Image, at(3, 3, 12, 0), None, "Acme", &config).unwrap();

        assert!(matches!(
            log.edit(1, ArtifactTag::CheckIn, None),
            Err(ArtifactError::TagNotAllowed { .. })
        ));
        assert!(matches!(
            log.edit(2, ArtifactTag::Audio, None),
            Err(ArtifactError::TagNotAllowed { .. })
        ));
        assert_eq!(
            log.edit(9, ArtifactTag::Other, None).unwrap_err(),
            ArtifactError::NotFound(9)
        );
        assert_eq!(log.get(1).unwrap().tag, ArtifactTag::Audio);
    }

    #[test]
    fn remove_and_rename_company() {
        let config = ScheduleConfig::default();
        let mut log = ArtifactLog::new();
        log.capture(FileType::Image, at(3, 3, 9, 0), None, "Acme", &config).unwrap();
        log.capture(FileType::Image, at(3, 3, 17, 0), None, "Zeta", &config).unwrap();
        log.capture(FileType::Audio, at(3, 4, 9, 0), None, "Acme", &config).unwrap();

        assert_eq!(log.rename_company("Acme", "Acme Works"), 2);
        assert_eq!(log.get(3).unwrap().company_name, "Acme Works");
        assert_eq!(log.get(2).unwrap().company_name, "Zeta");

        assert_eq!(log.remove(1).unwrap().id, 1);
        assert_eq!(log.remove(1).unwrap_err(), ArtifactError::NotFound(1));
        assert_eq!(log.len(), 2);
        // ids are not reused while a later one exists
        assert_eq!(log.next_id(), Ok(4));
    }

    #[test]
    fn blank_location_is_stored_as_none() {
        let artifact = WorkArtifact::capture(
            1,
            FileType::Image,
            at(3, 3, 12, 0),
            Some("   ".into()),
            "Acme",
            &ScheduleConfig::default(),
        );
        assert_eq!(artifact.location, None);
    }
}
