pub mod app;
pub mod cli;
pub mod config;
pub mod i18n;
pub mod notify;
pub mod reminders;
pub mod schedule;
pub mod storage;

pub use app::{DeleteOutcome, ReminderDraft, ReminderError, ReminderService};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use reminders::Reminder;
