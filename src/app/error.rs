use thiserror::Error;

use crate::i18n::{Localizer, MessageKey};
use crate::notify::{NotificationId, NotifyError};
use crate::reminders::StoreError;
use crate::schedule::{ScheduleError, ScheduleField};

/// The user action an error interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Delete,
}

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),
    #[error("failed to load reminders")]
    StorageRead {
        op: Operation,
        #[source]
        source: StoreError,
    },
    #[error("failed to save reminders")]
    StorageWrite {
        op: Operation,
        #[source]
        source: StoreError,
    },
    #[error("failed to schedule notification {index} of {total}")]
    NotificationSchedule {
        index: usize,
        total: usize,
        #[source]
        source: NotifyError,
    },
    #[error(
        "{} of {attempted} notifications for reminder {id} could not be cancelled",
        .failed.len()
    )]
    NotificationCancel {
        id: String,
        failed: Vec<NotificationId>,
        attempted: usize,
        #[source]
        source: NotifyError,
    },
}

impl ReminderError {
    pub fn message_key(&self) -> MessageKey {
        match self {
            ReminderError::InvalidSchedule(ScheduleError::IntervalExceedsDuration { .. }) => {
                MessageKey::IntervalShorterError
            }
            ReminderError::InvalidSchedule(err) => match err.field() {
                ScheduleField::Duration => MessageKey::ValidDurationError,
                ScheduleField::Interval => MessageKey::ValidIntervalError,
            },
            ReminderError::StorageRead { op, .. } | ReminderError::StorageWrite { op, .. } => {
                match op {
                    Operation::Create => MessageKey::SaveError,
                    Operation::List => MessageKey::LoadError,
                    Operation::Delete => MessageKey::DeleteError,
                }
            }
            ReminderError::NotificationSchedule { .. } => MessageKey::SaveError,
            ReminderError::NotificationCancel { .. } => MessageKey::DeleteError,
        }
    }

    /// Localized alert text: the error title followed by the message.
    pub fn user_message(&self, localizer: &dyn Localizer) -> String {
        format!(
            "{}: {}",
            localizer.lookup(MessageKey::Error),
            localizer.lookup(self.message_key())
        )
    }
}
