use std::collections::HashSet;

use parking_lot::Mutex;
use time::OffsetDateTime;

use super::{NotificationContent, NotificationId, NotificationScheduler, NotifyError, PermissionStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEntry {
    pub id: NotificationId,
    pub fire_at: OffsetDateTime,
    pub content: NotificationContent,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    scheduled: Vec<ScheduledEntry>,
    schedule_calls: usize,
    cancel_calls: usize,
    cancel_all_calls: usize,
    fail_schedule_after: Option<usize>,
    fail_cancel: HashSet<NotificationId>,
    denied: bool,
}

/// Process-local notification backend. Nothing is ever delivered; it records calls and
/// can be told to fail, which makes it a dry-run target and a test double.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    state: Mutex<MemoryState>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_permissions(&self) {
        self.state.lock().denied = true;
    }

    /// Every `schedule` call after the first `successes` fails.
    pub fn fail_schedule_after(&self, successes: usize) {
        self.state.lock().fail_schedule_after = Some(successes);
    }

    pub fn fail_cancel_for(&self, id: &NotificationId) {
        self.state.lock().fail_cancel.insert(id.clone());
    }

    pub fn scheduled(&self) -> Vec<ScheduledEntry> {
        self.state.lock().scheduled.clone()
    }

    pub fn is_scheduled(&self, id: &NotificationId) -> bool {
        self.state.lock().scheduled.iter().any(|entry| &entry.id == id)
    }

    pub fn schedule_calls(&self) -> usize {
        self.state.lock().schedule_calls
    }

    pub fn cancel_calls(&self) -> usize {
        self.state.lock().cancel_calls
    }

    pub fn cancel_all_calls(&self) -> usize {
        self.state.lock().cancel_all_calls
    }
}

impl NotificationScheduler for MemoryNotifier {
    fn request_permissions(&self) -> Result<PermissionStatus, NotifyError> {
        Ok(if self.state.lock().denied {
            PermissionStatus::Denied
        } else {
            PermissionStatus::Granted
        })
    }

    fn schedule(
        &self,
        content: &NotificationContent,
        fire_at: OffsetDateTime,
    ) -> Result<NotificationId, NotifyError> {
        let mut state = self.state.lock();
        state.schedule_calls += 1;
        if let Some(limit) = state.fail_schedule_after {
            if state.schedule_calls > limit {
                return Err(NotifyError::ScheduleRejected(format!(
                    "injected failure on call {}",
                    state.schedule_calls
                )));
            }
        }
        state.next_id += 1;
        let id = NotificationId::from(format!("mem-{}", state.next_id));
        state.scheduled.push(ScheduledEntry {
            id: id.clone(),
            fire_at,
            content: content.clone(),
        });
        Ok(id)
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotifyError> {
        let mut state = self.state.lock();
        state.cancel_calls += 1;
        if state.fail_cancel.contains(id) {
            return Err(NotifyError::CancelRejected(id.clone()));
        }
        state.scheduled.retain(|entry| &entry.id != id);
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), NotifyError> {
        let mut state = self.state.lock();
        state.cancel_all_calls += 1;
        state.scheduled.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use time::macros::datetime;

    fn content() -> NotificationContent {
        NotificationContent {
            title: "t".into(),
            body: "b".into(),
            sound: false,
        }
    }

    #[test]
    fn injected_schedule_failure_starts_after_successes() {
        let notifier = MemoryNotifier::new();
        notifier.fail_schedule_after(1);
        let at = datetime!(2026-10-19 18:00 UTC);

        assert!(notifier.schedule(&content(), at).is_ok());
        assert_matches!(
            notifier.schedule(&content(), at),
            Err(NotifyError::ScheduleRejected(_))
        );
        assert_eq!(notifier.scheduled().len(), 1);
        assert_eq!(notifier.schedule_calls(), 2);
    }

    #[test]
    fn injected_cancel_failure_keeps_entry() -> Result<(), NotifyError> {
        let notifier = MemoryNotifier::new();
        let id = notifier.schedule(&content(), datetime!(2026-10-19 18:00 UTC))?;
        notifier.fail_cancel_for(&id);

        assert_matches!(notifier.cancel(&id), Err(NotifyError::CancelRejected(_)));
        assert!(notifier.is_scheduled(&id));
        Ok(())
    }
}
