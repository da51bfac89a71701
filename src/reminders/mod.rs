use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::notify::NotificationId;
use crate::schedule;
use crate::storage::KeyValueStore;

pub const REMINDERS_KEY: &str = "photoReminders";

/// One configured reminder window and the notification handles it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// Window length in minutes.
    pub duration: u32,
    /// Minutes between notifications.
    pub interval: u32,
    pub notification_ids: Vec<NotificationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_content: Option<String>,
}

impl Reminder {
    pub fn ends_at(&self) -> Option<OffsetDateTime> {
        schedule::window_end(self.start_time, self.duration)
    }

    /// Open while `now` is strictly before the end of the window.
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        match self.ends_at() {
            Some(end) => now < end,
            None => true,
        }
    }

    pub fn title(&self) -> Option<&str> {
        non_blank(self.reminder_title.as_deref())
    }

    pub fn content(&self) -> Option<&str> {
        non_blank(self.reminder_content.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Millisecond timestamp id, bumped past any id already in `existing`.
pub fn next_reminder_id(now: OffsetDateTime, existing: &[Reminder]) -> String {
    let mut candidate = now.unix_timestamp_nanos() / 1_000_000;
    while existing
        .iter()
        .any(|reminder| reminder.id == candidate.to_string())
    {
        candidate += 1;
    }
    candidate.to_string()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored reminder list is malformed")]
    Malformed(#[source] serde_json::Error),
    #[error("reading stored reminders")]
    Read(#[source] anyhow::Error),
    #[error("writing stored reminders")]
    Write(#[source] anyhow::Error),
}

/// Whole-list persistence of reminders under a single key.
pub struct ReminderStore<'a> {
    kv: &'a dyn KeyValueStore,
}

impl<'a> ReminderStore<'a> {
    pub fn new(kv: &'a dyn KeyValueStore) -> Self {
        Self { kv }
    }

    pub fn load(&self) -> Result<Vec<Reminder>, StoreError> {
        let raw = self.kv.get_item(REMINDERS_KEY).map_err(StoreError::Read)?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(StoreError::Malformed)
    }

    pub fn save(&self, reminders: &[Reminder]) -> Result<(), StoreError> {
        let json = serde_json::to_string(reminders)
            .map_err(|err| StoreError::Write(anyhow::Error::new(err)))?;
        self.kv
            .set_item(REMINDERS_KEY, &json)
            .map_err(StoreError::Write)?;
        tracing::debug!(count = reminders.len(), "saved reminder list");
        Ok(())
    }
}
