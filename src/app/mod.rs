use time::OffsetDateTime;

use crate::notify::{NotificationContent, NotificationId, NotificationScheduler, PermissionStatus};
use crate::reminders::{next_reminder_id, Reminder, ReminderStore};
use crate::schedule::{self, Schedule};
use crate::storage::KeyValueStore;

mod error;

pub use error::{Operation, ReminderError};

/// Raw create-form input. Duration and interval stay text until validated.
#[derive(Debug, Clone)]
pub struct ReminderDraft {
    pub start_time: OffsetDateTime,
    pub duration: String,
    pub interval: String,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Notification text used when a reminder has no title or content of its own.
#[derive(Debug, Clone)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { reminder: Reminder, cancelled: usize },
    NotFound,
}

/// Create, list and delete flows over a reminder store and a notification backend.
pub struct ReminderService<'a> {
    store: ReminderStore<'a>,
    notifier: &'a dyn NotificationScheduler,
    defaults: NotificationDefaults,
    sound: bool,
    cancel_all_before_create: bool,
}

impl<'a> ReminderService<'a> {
    pub fn new(
        kv: &'a dyn KeyValueStore,
        notifier: &'a dyn NotificationScheduler,
        defaults: NotificationDefaults,
    ) -> Self {
        Self {
            store: ReminderStore::new(kv),
            notifier,
            defaults,
            sound: true,
            cancel_all_before_create: false,
        }
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_cancel_all_before_create(mut self, enabled: bool) -> Self {
        self.cancel_all_before_create = enabled;
        self
    }

    pub fn request_permissions(&self) -> PermissionStatus {
        match self.notifier.request_permissions() {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(?err, "permission request failed, treating as denied");
                PermissionStatus::Denied
            }
        }
    }

    /// Validates the draft, schedules one notification per fire time and appends the
    /// record. Any failure after the first registration cancels what was registered.
    pub fn create(
        &self,
        draft: ReminderDraft,
        now: OffsetDateTime,
    ) -> Result<Reminder, ReminderError> {
        let schedule = Schedule::parse(&draft.duration, &draft.interval)?;
        let fire_times = schedule.fire_times(draft.start_time)?;
        let title = non_blank(draft.title);
        let content = non_blank(draft.content);

        if self.cancel_all_before_create {
            if let Err(err) = self.notifier.cancel_all() {
                tracing::warn!(?err, "failed to clear pending notifications before create");
            }
        }

        let notification = NotificationContent {
            title: title.clone().unwrap_or_else(|| self.defaults.title.clone()),
            body: content.clone().unwrap_or_else(|| self.defaults.body.clone()),
            sound: self.sound,
        };
        let total = fire_times.len();
        let mut notification_ids = Vec::with_capacity(total);
        for (index, fire_at) in fire_times.into_iter().enumerate() {
            match self.notifier.schedule(&notification, fire_at) {
                Ok(id) => {
                    tracing::debug!(%id, %fire_at, "scheduled notification");
                    notification_ids.push(id);
                }
                Err(source) => {
                    self.roll_back(&notification_ids);
                    return Err(ReminderError::NotificationSchedule {
                        index: index + 1,
                        total,
                        source,
                    });
                }
            }
        }

        let mut reminders = match self.store.load() {
            Ok(reminders) => reminders,
            Err(source) => {
                self.roll_back(&notification_ids);
                return Err(ReminderError::StorageRead {
                    op: Operation::Create,
                    source,
                });
            }
        };
        let reminder = Reminder {
            id: next_reminder_id(now, &reminders),
            start_time: draft.start_time,
            duration: schedule.duration(),
            interval: schedule.interval(),
            notification_ids,
            reminder_title: title,
            reminder_content: content,
        };
        reminders.push(reminder.clone());
        if let Err(source) = self.store.save(&reminders) {
            self.roll_back(&reminder.notification_ids);
            return Err(ReminderError::StorageWrite {
                op: Operation::Create,
                source,
            });
        }

        tracing::info!(
            id = %reminder.id,
            notifications = reminder.notification_ids.len(),
            duration = reminder.duration,
            interval = reminder.interval,
            "created reminder"
        );
        Ok(reminder)
    }

    pub fn list_all(&self) -> Result<Vec<Reminder>, ReminderError> {
        self.store
            .load()
            .map_err(|source| ReminderError::StorageRead {
                op: Operation::List,
                source,
            })
    }

    /// Stored reminders whose window is still open, in storage order.
    pub fn list_active(&self, now: OffsetDateTime) -> Result<Vec<Reminder>, ReminderError> {
        let reminders = self.list_all()?;
        Ok(schedule::active_reminders(now, &reminders)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Cancels every handle the reminder owns, then drops it from storage. When a cancel
    /// fails the record stays, keeping only the handles that could not be cancelled.
    pub fn delete(&self, id: &str) -> Result<DeleteOutcome, ReminderError> {
        let mut reminders = self
            .store
            .load()
            .map_err(|source| ReminderError::StorageRead {
                op: Operation::Delete,
                source,
            })?;
        let Some(position) = reminders.iter().position(|reminder| reminder.id == id) else {
            tracing::debug!(id, "delete requested for unknown reminder");
            return Ok(DeleteOutcome::NotFound);
        };

        let attempted = reminders[position].notification_ids.len();
        let mut failed = Vec::new();
        let mut first_error = None;
        for handle in &reminders[position].notification_ids {
            if let Err(err) = self.notifier.cancel(handle) {
                tracing::warn!(%handle, ?err, "failed to cancel notification");
                failed.push(handle.clone());
                first_error.get_or_insert(err);
            }
        }

        if let Some(source) = first_error {
            if failed.len() < attempted {
                reminders[position].notification_ids = failed.clone();
                if let Err(err) = self.store.save(&reminders) {
                    tracing::warn!(?err, id, "failed to prune cancelled notification handles");
                }
            }
            return Err(ReminderError::NotificationCancel {
                id: id.to_string(),
                failed,
                attempted,
                source,
            });
        }

        let reminder = reminders.remove(position);
        self.store
            .save(&reminders)
            .map_err(|source| ReminderError::StorageWrite {
                op: Operation::Delete,
                source,
            })?;
        tracing::info!(id, cancelled = attempted, "deleted reminder");
        Ok(DeleteOutcome::Deleted {
            reminder,
            cancelled: attempted,
        })
    }

    fn roll_back(&self, scheduled: &[NotificationId]) {
        if scheduled.is_empty() {
            return;
        }
        tracing::warn!(count = scheduled.len(), "rolling back scheduled notifications");
        for id in scheduled {
            if let Err(err) = self.notifier.cancel(id) {
                tracing::warn!(%id, ?err, "failed to roll back notification");
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
