use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::settings::SettingsError;

/// Sunday-first weekday numbers, matching the device calendar convention.
pub const SUNDAY: u8 = 1;
pub const MONDAY: u8 = 2;
pub const TUESDAY: u8 = 3;
pub const WEDNESDAY: u8 = 4;
pub const THURSDAY: u8 = 5;
pub const FRIDAY: u8 = 6;
pub const SATURDAY: u8 = 7;

pub const ALL_WEEKDAYS: [u8; 7] = [
    SUNDAY, MONDAY, TUESDAY, WEDNESDAY, THURSDAY, FRIDAY, SATURDAY,
];

/// Weekday number of a date, 1 = Sunday through 7 = Saturday.
pub fn weekday_number<D: Datelike>(date: &D) -> u8 {
    date.weekday().number_from_sunday() as u8
}

pub fn weekday_name(weekday: u8) -> Option<&'static str> {
    match weekday {
        SUNDAY => Some("Sunday"),
        MONDAY => Some("Monday"),
        TUESDAY => Some("Tuesday"),
        WEDNESDAY => Some("Wednesday"),
        THURSDAY => Some("Thursday"),
        FRIDAY => Some("Friday"),
        SATURDAY => Some("Saturday"),
        _ => None,
    }
}

pub fn is_valid_weekday(weekday: u8) -> bool {
    (SUNDAY..=SATURDAY).contains(&weekday)
}

/// Every date from `start` to `end` inclusive. Empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let mut current = Some(start);
    std::iter::from_fn(move || {
        let date = current.filter(|d| *d <= end)?;
        current = date.checked_add_days(Days::new(1));
        Some(date)
    })
}

/// The set of rest days for a custom schedule.
///
/// Values are always in `1..=7`. An empty set is legal and makes every day a
/// workday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct RestDays(BTreeSet<u8>);

impl Default for RestDays {
    fn default() -> Self {
        Self::weekend()
    }
}

impl RestDays {
    pub fn new<I>(days: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = u8>,
    {
        let mut set = BTreeSet::new();
        for day in days {
            if !is_valid_weekday(day) {
                return Err(SettingsError::InvalidWeekday(day));
            }
            set.insert(day);
        }
        Ok(Self(set))
    }

    /// Saturday and Sunday.
    pub fn weekend() -> Self {
        Self(BTreeSet::from([SUNDAY, SATURDAY]))
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, weekday: u8) -> bool {
        self.0.contains(&weekday)
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<u8>> for RestDays {
    type Error = SettingsError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RestDays> for Vec<u8> {
    fn from(value: RestDays) -> Self {
        value.0.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_numbers_are_sunday_first() {
        // 2025-01-05 is a Sunday, 2025-01-11 a Saturday
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
        assert_eq!(weekday_number(&sunday), SUNDAY);
        assert_eq!(weekday_number(&saturday), SATURDAY);
        assert_eq!(weekday_name(MONDAY), Some("Monday"));
        assert_eq!(weekday_name(0), None);
    }

    #[test]
    fn rest_days_reject_out_of_range_values() {
        assert_eq!(RestDays::new([1, 8]), Err(SettingsError::InvalidWeekday(8)));
        assert!(RestDays::new([]).unwrap().is_empty());
    }

    #[test]
    fn rest_days_serialize_as_sorted_list() {
        let days = RestDays::new([7, 1, 4, 1]).unwrap();
        assert_eq!(serde_json::to_string(&days).unwrap(), "[1,4,7]");
        let parsed: RestDays = serde_json::from_str("[7,1]").unwrap();
        assert_eq!(parsed, RestDays::weekend());
        assert!(serde_json::from_str::<RestDays>("[0]").is_err());
    }

    #[test]
    fn days_inclusive_covers_both_ends() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        assert_eq!(days_inclusive(start, end).count(), 4);
        assert_eq!(days_inclusive(end, start).count(), 0);
    }
}
