use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::calendar::ALL_WEEKDAYS;
use crate::schedule::{ClockTime, ScheduleConfig, ScheduleEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    CheckIn,
    CheckOut,
}

impl ReminderKind {
    pub fn identifier_prefix(&self) -> &'static str {
        match self {
            ReminderKind::CheckIn => "work-start",
            ReminderKind::CheckOut => "work-end",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReminderKind::CheckIn => "Check-in reminder",
            ReminderKind::CheckOut => "Check-out reminder",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            ReminderKind::CheckIn => "Tap to take a check-in photo",
            ReminderKind::CheckOut => "Tap to take a check-out photo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextReminder {
    pub at: NaiveDateTime,
    pub kind: ReminderKind,
}

impl NextReminder {
    pub fn new(at: NaiveDateTime, kind: ReminderKind) -> Self {
        Self { at, kind }
    }
}

/// One repeating weekly reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSlot {
    /// Stable id such as `work-start-2`; re-registering replaces the old slot.
    pub identifier: String,
    pub kind: ReminderKind,
    /// Sunday-first weekday number.
    pub weekday: u8,
    pub time: ClockTime,
}

/// Repeating reminders for every workday of the week.
///
/// Check-in slots come first, each group ordered by weekday. Uses the same
/// workday rule as [`ScheduleEngine::is_workday`].
pub fn weekly_plan(config: &ScheduleConfig) -> Vec<ReminderSlot> {
    let engine = ScheduleEngine::new();
    let workdays: Vec<u8> = ALL_WEEKDAYS
        .into_iter()
        .filter(|weekday| engine.is_working_weekday(*weekday, config))
        .collect();

    [
        (ReminderKind::CheckIn, config.start_time),
        (ReminderKind::CheckOut, config.end_time),
    ]
    .into_iter()
    .flat_map(|(kind, time)| {
        workdays.iter().map(move |weekday| ReminderSlot {
            identifier: format!("{}-{}", kind.identifier_prefix(), weekday),
            kind,
            weekday: *weekday,
            time,
        })
    })
    .collect()
}
