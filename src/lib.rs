pub mod artifact;
pub mod calendar;
pub mod clock;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod reminder;
pub mod schedule;
pub mod settings;

pub use artifact::{ArtifactError, ArtifactLog, FileType, WorkArtifact};
pub use calendar::RestDays;
pub use clock::{Clock, FixedClock, OffsetClock, SystemClock, TimeSyncCheck, TimeSyncReport};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteSettingsStore;
pub use persistence::{
    JsonSettingsStore, PersistenceError, SettingsStore, load_artifacts_from_csv,
    load_artifacts_from_json, load_settings_from_json, save_artifacts_to_csv,
    save_artifacts_to_json, save_settings_to_json,
};
pub use reminder::{NextReminder, ReminderKind, ReminderSlot, weekly_plan};
pub use schedule::{ArtifactTag, ClockTime, ScheduleConfig, ScheduleEngine, ScheduleType};
pub use settings::{SettingsError, WorkSettings};
