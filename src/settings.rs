use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

use crate::calendar::RestDays;
use crate::reminder::NextReminder;
use crate::schedule::{ClockTime, ScheduleConfig, ScheduleEngine, ScheduleType};

pub const DEFAULT_COMPANY_NAME: &str = "My Company";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("end time {end} must be after start time {start}")]
    InvalidWorkTime { start: ClockTime, end: ClockTime },
    #[error("weekday {0} is outside 1 (Sunday) ..= 7 (Saturday)")]
    InvalidWeekday(u8),
    #[error("invalid time of day '{0}', expected HH:MM")]
    InvalidClockTime(String),
    #[error("unknown schedule type '{0}'")]
    UnknownScheduleType(String),
    #[error("company name must not be empty")]
    EmptyCompanyName,
}

/// User-editable settings that feed the schedule engine.
///
/// Mutators validate their input; a `WorkSettings` obtained through them or
/// through [`WorkSettings::validate`] always holds a usable schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSettings {
    pub company_name: String,
    pub schedule: ScheduleConfig,
    /// Day the long-week flag was last flipped; drives weekly rollover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_week_toggle: Option<NaiveDate>,
}

impl Default for WorkSettings {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            schedule: ScheduleConfig::default(),
            last_week_toggle: None,
        }
    }
}

impl WorkSettings {
    pub fn new(company_name: impl Into<String>, schedule: ScheduleConfig) -> Result<Self, SettingsError> {
        let settings = Self {
            company_name: company_name.into(),
            schedule,
            last_week_toggle: None,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.company_name.trim().is_empty() {
            return Err(SettingsError::EmptyCompanyName);
        }
        let (start, end) = (self.schedule.start_time, self.schedule.end_time);
        if end.minutes_since_midnight() <= start.minutes_since_midnight() {
            return Err(SettingsError::InvalidWorkTime { start, end });
        }
        Ok(())
    }

    pub fn set_company_name(&mut self, name: impl Into<String>) -> Result<(), SettingsError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SettingsError::EmptyCompanyName);
        }
        self.company_name = name.trim().to_string();
        Ok(())
    }

    pub fn set_schedule_type(&mut self, schedule_type: ScheduleType) {
        self.schedule.schedule_type = schedule_type;
    }

    pub fn set_work_time(&mut self, start: ClockTime, end: ClockTime) -> Result<(), SettingsError> {
        if end.minutes_since_midnight() <= start.minutes_since_midnight() {
            return Err(SettingsError::InvalidWorkTime { start, end });
        }
        self.schedule.start_time = start;
        self.schedule.end_time = end;
        Ok(())
    }

    pub fn set_rest_days<I>(&mut self, days: I) -> Result<(), SettingsError>
    where
        I: IntoIterator<Item = u8>,
    {
        self.schedule.custom_rest_days = RestDays::new(days)?;
        Ok(())
    }

    /// Store the long-week flag; a change restarts the weekly rollover at `today`.
    pub fn set_long_week(&mut self, is_long_week: bool, today: NaiveDate) {
        if self.schedule.is_long_week != is_long_week {
            self.last_week_toggle = Some(today);
        }
        self.schedule.is_long_week = is_long_week;
    }

    /// Long-week flag as of `today`.
    ///
    /// For an alternating schedule the stored flag inverts once per whole week
    /// elapsed since the last toggle. A toggle date in the future counts as
    /// zero weeks.
    pub fn effective_long_week(&self, today: NaiveDate) -> bool {
        let stored = self.schedule.is_long_week;
        if self.schedule.schedule_type != ScheduleType::AlternatingWeekend {
            return stored;
        }
        let Some(toggled) = self.last_week_toggle else {
            return stored;
        };
        let weeks = (today - toggled).num_days().max(0) / 7;
        if weeks % 2 == 0 { stored } else { !stored }
    }

    /// Schedule with the long-week flag resolved for `today`.
    pub fn resolved_config(&self, today: NaiveDate) -> ScheduleConfig {
        let mut config = self.schedule.clone();
        config.is_long_week = self.effective_long_week(today);
        config
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        ScheduleEngine::new().is_workday(&date, &self.resolved_config(date))
    }

    /// Next reminder with the long-week flag resolved for each day scanned,
    /// so a rollover inside the lookahead is honored.
    pub fn next_reminder(&self, now: NaiveDateTime) -> Option<NextReminder> {
        ScheduleEngine::new().next_reminder_by(now, |date| Cow::Owned(self.resolved_config(date)))
    }

    /// Workdays in `start..=end`, each judged with that day's long-week flag.
    pub fn workdays_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        ScheduleEngine::new()
            .workdays_in_range_by(start, end, |date| Cow::Owned(self.resolved_config(date)))
    }
}
