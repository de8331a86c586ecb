use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::artifact::{ArtifactError, FileType};
use crate::calendar::{self, FRIDAY, MONDAY, RestDays, SATURDAY, SUNDAY, THURSDAY};
use crate::clock::Clock;
use crate::reminder::{NextReminder, ReminderKind};
use crate::settings::SettingsError;

/// Tolerance around the configured start/end times, in minutes.
pub const CHECK_BUFFER_MINUTES: i32 = 30;

/// How many days past today the reminder search looks at.
pub const REMINDER_LOOKAHEAD_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Monday through Friday.
    #[default]
    DoubleWeekend,
    /// Monday through Saturday.
    SingleWeekend,
    /// Saturday alternates between long and short weeks.
    AlternatingWeekend,
    /// Explicit set of rest days.
    Custom,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::DoubleWeekend => "double_weekend",
            ScheduleType::SingleWeekend => "single_weekend",
            ScheduleType::AlternatingWeekend => "alternating_weekend",
            ScheduleType::Custom => "custom",
        }
    }

    pub fn variants() -> [(&'static str, &'static str); 4] {
        [
            ("double_weekend", "Monday to Friday"),
            ("single_weekend", "Monday to Saturday"),
            ("alternating_weekend", "Saturday depends on long/short week"),
            ("custom", "Pick rest days explicitly"),
        ]
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleType {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "double" | "double_weekend" => Ok(ScheduleType::DoubleWeekend),
            "single" | "single_weekend" => Ok(ScheduleType::SingleWeekend),
            "alternating" | "alternating_weekend" => Ok(ScheduleType::AlternatingWeekend),
            "custom" => Ok(ScheduleType::Custom),
            other => Err(SettingsError::UnknownScheduleType(other.to_string())),
        }
    }
}

/// A wall-clock time of day with minute precision, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, SettingsError> {
        if hour > 23 || minute > 59 {
            return Err(SettingsError::InvalidClockTime(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> i32 {
        (self.hour * 60 + self.minute) as i32
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
            .expect("hour and minute are range-checked on construction")
    }

    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.to_naive_time())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SettingsError::InvalidClockTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse::<u32>().map_err(|_| invalid())?;
        let minute = minute.parse::<u32>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = SettingsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(value: NaiveTime) -> Self {
        Self {
            hour: value.hour(),
            minute: value.minute(),
        }
    }
}

/// Weekly schedule plus daily start/end times.
///
/// `end_time > start_time` is expected but not enforced here; the settings
/// editor checks it before a config reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub schedule_type: ScheduleType,
    /// Only read for [`ScheduleType::AlternatingWeekend`].
    #[serde(default)]
    pub is_long_week: bool,
    /// Only read for [`ScheduleType::Custom`].
    #[serde(default)]
    pub custom_rest_days: RestDays,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            schedule_type: ScheduleType::DoubleWeekend,
            is_long_week: false,
            custom_rest_days: RestDays::weekend(),
            start_time: ClockTime { hour: 9, minute: 0 },
            end_time: ClockTime {
                hour: 17,
                minute: 0,
            },
        }
    }
}

impl ScheduleConfig {
    pub fn new(schedule_type: ScheduleType, start_time: ClockTime, end_time: ClockTime) -> Self {
        Self {
            schedule_type,
            start_time,
            end_time,
            ..Self::default()
        }
    }

    pub fn with_long_week(mut self, is_long_week: bool) -> Self {
        self.is_long_week = is_long_week;
        self
    }

    pub fn with_rest_days(mut self, rest_days: RestDays) -> Self {
        self.custom_rest_days = rest_days;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactTag {
    CheckIn,
    CheckOut,
    Overtime,
    Other,
    Audio,
}

impl ArtifactTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactTag::CheckIn => "check_in",
            ArtifactTag::CheckOut => "check_out",
            ArtifactTag::Overtime => "overtime",
            ArtifactTag::Other => "other",
            ArtifactTag::Audio => "audio",
        }
    }

    /// Human readable label used in titles and watermarks.
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactTag::CheckIn => "Check-in",
            ArtifactTag::CheckOut => "Check-out",
            ArtifactTag::Overtime => "Overtime",
            ArtifactTag::Other => "Other",
            ArtifactTag::Audio => "Audio",
        }
    }
}

impl FromStr for ArtifactTag {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check_in" | "checkin" => Ok(ArtifactTag::CheckIn),
            "check_out" | "checkout" => Ok(ArtifactTag::CheckOut),
            "overtime" => Ok(ArtifactTag::Overtime),
            "other" => Ok(ArtifactTag::Other),
            "audio" => Ok(ArtifactTag::Audio),
            _ => Err(ArtifactError::UnknownTag(s.trim().to_string())),
        }
    }
}

impl fmt::Display for ArtifactTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workday membership, capture tagging and reminder timing.
///
/// Stateless: every call depends only on its arguments, so a single value can
/// be shared freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleEngine;

impl ScheduleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Whether the date's weekday is a workday under `config`.
    pub fn is_workday<D: Datelike>(&self, date: &D, config: &ScheduleConfig) -> bool {
        self.is_working_weekday(calendar::weekday_number(date), config)
    }

    /// Same rule keyed by Sunday-first weekday number.
    ///
    /// Under an alternating schedule both Friday (6) and Saturday (7) follow
    /// the long-week flag.
    pub fn is_working_weekday(&self, weekday: u8, config: &ScheduleConfig) -> bool {
        match config.schedule_type {
            ScheduleType::DoubleWeekend => (MONDAY..=FRIDAY).contains(&weekday),
            ScheduleType::SingleWeekend => (MONDAY..=SATURDAY).contains(&weekday),
            ScheduleType::AlternatingWeekend => match weekday {
                SUNDAY => false,
                MONDAY..=THURSDAY => true,
                FRIDAY | SATURDAY => config.is_long_week,
                _ => false,
            },
            ScheduleType::Custom => {
                calendar::is_valid_weekday(weekday) && !config.custom_rest_days.contains(weekday)
            }
        }
    }

    /// Tag an image captured at `timestamp`.
    ///
    /// The check-in window is tested before the check-out window, so it wins
    /// when the two overlap.
    pub fn classify_artifact_tag<T: Timelike>(
        &self,
        timestamp: &T,
        config: &ScheduleConfig,
    ) -> ArtifactTag {
        let total = (timestamp.hour() * 60 + timestamp.minute()) as i32;
        let check_in = config.start_time.minutes_since_midnight();
        let check_out = config.end_time.minutes_since_midnight();
        let buffer = CHECK_BUFFER_MINUTES;

        if total >= check_in - buffer && total <= check_in + buffer {
            ArtifactTag::CheckIn
        } else if total >= check_out - buffer && total <= check_out + buffer {
            ArtifactTag::CheckOut
        } else if total > check_out + buffer {
            ArtifactTag::Overtime
        } else {
            ArtifactTag::Other
        }
    }

    /// Audio is never classified by time.
    pub fn classify_capture(
        &self,
        file_type: FileType,
        timestamp: &NaiveDateTime,
        config: &ScheduleConfig,
    ) -> ArtifactTag {
        match file_type {
            FileType::Audio => ArtifactTag::Audio,
            FileType::Image => self.classify_artifact_tag(timestamp, config),
        }
    }

    pub fn next_reminder(&self, now: NaiveDateTime, config: &ScheduleConfig) -> Option<NextReminder> {
        self.next_reminder_by(now, |_| Cow::Borrowed(config))
    }

    /// Like [`ScheduleEngine::next_reminder`], but asks `config_for` for the
    /// schedule in force on each candidate day. Used when the long-week flag
    /// rolls over inside the lookahead window.
    pub fn next_reminder_by<'c, F>(&self, now: NaiveDateTime, config_for: F) -> Option<NextReminder>
    where
        F: Fn(NaiveDate) -> Cow<'c, ScheduleConfig>,
    {
        let today = now.date();
        let config = config_for(today);
        let start = config.start_time.on(today);
        let end = config.end_time.on(today);

        if self.is_workday(&today, &config) {
            if now < start {
                debug!(%now, at = %start, "next reminder is today's start");
                return Some(NextReminder::new(start, ReminderKind::CheckIn));
            }
            if now < end {
                debug!(%now, at = %end, "next reminder is today's end");
                return Some(NextReminder::new(end, ReminderKind::CheckOut));
            }
        }

        let next = (1..=REMINDER_LOOKAHEAD_DAYS)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .find_map(|date| {
                let config = config_for(date);
                self.is_workday(&date, &config)
                    .then(|| NextReminder::new(config.start_time.on(date), ReminderKind::CheckIn))
            });

        match &next {
            Some(reminder) => debug!(%now, at = %reminder.at, "next reminder on a later workday"),
            None => debug!(%now, "no workday within lookahead"),
        }
        next
    }

    pub fn next_reminder_instant(
        &self,
        now: NaiveDateTime,
        config: &ScheduleConfig,
    ) -> Option<NaiveDateTime> {
        self.next_reminder(now, config).map(|reminder| reminder.at)
    }

    pub fn next_reminder_from<C: Clock + ?Sized>(
        &self,
        clock: &C,
        config: &ScheduleConfig,
    ) -> Option<NextReminder> {
        self.next_reminder(clock.now(), config)
    }

    /// Workdays between `start` and `end`, inclusive.
    pub fn workdays_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        config: &ScheduleConfig,
    ) -> Vec<NaiveDate> {
        self.workdays_in_range_by(start, end, |_| Cow::Borrowed(config))
    }

    /// Workdays between `start` and `end`, resolving the schedule per day.
    pub fn workdays_in_range_by<'c, F>(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        config_for: F,
    ) -> Vec<NaiveDate>
    where
        F: Fn(NaiveDate) -> Cow<'c, ScheduleConfig>,
    {
        calendar::days_inclusive(start, end)
            .filter(|date| self.is_workday(date, &config_for(*date)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_parses_and_formats() {
        let t: ClockTime = "9:05".parse().unwrap();
        assert_eq!(t.to_string(), "09:05");
        assert_eq!(t.minutes_since_midnight(), 545);
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("nine".parse::<ClockTime>().is_err());
    }

    #[test]
    fn clock_time_converts_to_naive_time_at_bounds() {
        let midnight = ClockTime::new(0, 0).unwrap();
        let last = ClockTime::new(23, 59).unwrap();
        assert_eq!(midnight.to_naive_time(), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(last.to_naive_time(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert_eq!(last.on(date).to_string(), "2025-03-03 23:59:00");
    }

    #[test]
    fn artifact_tag_parses_storage_names() {
        assert_eq!("check_out".parse::<ArtifactTag>().unwrap(), ArtifactTag::CheckOut);
        assert_eq!(" Overtime ".parse::<ArtifactTag>().unwrap(), ArtifactTag::Overtime);
        assert_eq!(
            "lunch".parse::<ArtifactTag>(),
            Err(ArtifactError::UnknownTag("lunch".into()))
        );
    }

    #[test]
    fn schedule_type_accepts_short_names() {
        assert_eq!(
            "alternating".parse::<ScheduleType>().unwrap(),
            ScheduleType::AlternatingWeekend
        );
        assert!(matches!(
            "weekly".parse::<ScheduleType>(),
            Err(SettingsError::UnknownScheduleType(_))
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ScheduleConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["start_time"], "09:00");
        assert_eq!(json["custom_rest_days"], serde_json::json!([1, 7]));
        let back: ScheduleConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn check_in_window_near_midnight_does_not_underflow() {
        let config = ScheduleConfig::new(
            ScheduleType::DoubleWeekend,
            ClockTime::new(0, 10).unwrap(),
            ClockTime::new(8, 0).unwrap(),
        );
        let t = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(
            ScheduleEngine.classify_artifact_tag(&t, &config),
            ArtifactTag::CheckIn
        );
    }
}
