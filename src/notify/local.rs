use anyhow::{Context, Result};
use rusqlite::{params, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{NotificationContent, NotificationId, NotificationScheduler, NotifyError, PermissionStatus};
use crate::storage::StorageHandle;

/// A notification row that has not been delivered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    pub id: NotificationId,
    pub fire_at: OffsetDateTime,
    pub content: NotificationContent,
}

/// Notification backend that keeps scheduled notifications in the local database.
/// Delivery happens when a [`super::DeliveryLoop`] polls [`LocalNotifier::take_due`].
#[derive(Clone)]
pub struct LocalNotifier {
    storage: StorageHandle,
    permitted: bool,
}

impl LocalNotifier {
    pub fn new(storage: StorageHandle, permitted: bool) -> Self {
        Self { storage, permitted }
    }

    pub fn pending(&self) -> Result<Vec<PendingNotification>> {
        self.storage.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, fire_at, title, body, sound
                 FROM scheduled_notifications
                 WHERE delivered_at IS NULL
                 ORDER BY fire_at, rowid",
            )?;
            let rows = stmt
                .query_map([], pending_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("listing pending notifications")?;
            rows.into_iter().collect()
        })
    }

    /// Marks every pending notification due at or before `now` as delivered and returns them.
    pub fn take_due(&self, now: OffsetDateTime) -> Result<Vec<PendingNotification>> {
        let cutoff = to_millis(now);
        let delivered_at = now.unix_timestamp();
        self.storage.with_connection(|conn| {
            let tx = conn
                .unchecked_transaction()
                .context("starting delivery transaction")?;
            let due = {
                let mut stmt = tx.prepare(
                    "SELECT id, fire_at, title, body, sound
                     FROM scheduled_notifications
                     WHERE delivered_at IS NULL AND fire_at <= ?1
                     ORDER BY fire_at, rowid",
                )?;
                let rows = stmt
                    .query_map(params![cutoff], pending_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .context("selecting due notifications")?;
                rows.into_iter().collect::<Result<Vec<_>>>()?
            };
            for pending in &due {
                tx.execute(
                    "UPDATE scheduled_notifications SET delivered_at = ?1 WHERE id = ?2",
                    params![delivered_at, pending.id.as_str()],
                )
                .context("marking notification delivered")?;
            }
            tx.commit().context("committing delivery")?;
            Ok(due)
        })
    }
}

impl NotificationScheduler for LocalNotifier {
    fn request_permissions(&self) -> Result<PermissionStatus, NotifyError> {
        Ok(if self.permitted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        })
    }

    fn schedule(
        &self,
        content: &NotificationContent,
        fire_at: OffsetDateTime,
    ) -> Result<NotificationId, NotifyError> {
        let id = NotificationId::from(Uuid::new_v4().to_string());
        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.storage.with_connection(|conn| {
            conn.execute(
                "INSERT INTO scheduled_notifications (id, fire_at, title, body, sound, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.as_str(),
                    to_millis(fire_at),
                    content.title,
                    content.body,
                    content.sound,
                    now
                ],
            )
            .context("inserting scheduled notification")?;
            Ok(())
        })?;
        Ok(id)
    }

    fn cancel(&self, id: &NotificationId) -> Result<(), NotifyError> {
        self.storage.with_connection(|conn| {
            let removed = conn
                .execute(
                    "DELETE FROM scheduled_notifications WHERE id = ?1 AND delivered_at IS NULL",
                    params![id.as_str()],
                )
                .context("cancelling notification")?;
            if removed == 0 {
                tracing::debug!(%id, "cancel ignored for unknown or delivered notification");
            }
            Ok(())
        })?;
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), NotifyError> {
        let removed = self.storage.with_connection(|conn| {
            conn.execute(
                "DELETE FROM scheduled_notifications WHERE delivered_at IS NULL",
                [],
            )
            .context("cancelling all notifications")
        })?;
        tracing::info!(removed, "cancelled every pending notification");
        Ok(())
    }
}

fn pending_from_row(row: &Row<'_>) -> rusqlite::Result<Result<PendingNotification>> {
    let id: String = row.get(0)?;
    let fire_at: i64 = row.get(1)?;
    let content = NotificationContent {
        title: row.get(2)?,
        body: row.get(3)?,
        sound: row.get(4)?,
    };
    Ok(from_millis(fire_at).map(|fire_at| PendingNotification {
        id: NotificationId::from(id),
        fire_at,
        content,
    }))
}

fn to_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(millis: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .with_context(|| format!("stored fire time {millis} is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, StorageOptions};
    use crate::storage;
    use tempfile::TempDir;
    use time::macros::datetime;
    use time::Duration;

    fn notifier() -> anyhow::Result<(TempDir, LocalNotifier)> {
        let temp = TempDir::new()?;
        let config_dir = temp.path().join("config");
        let paths = ConfigPaths::rooted(
            config_dir.clone(),
            config_dir.join("config.toml"),
            temp.path().join("data"),
        );
        paths.ensure_directories()?;
        let storage = storage::init(&paths, &StorageOptions::default())?;
        Ok((temp, LocalNotifier::new(storage, true)))
    }

    fn content(title: &str) -> NotificationContent {
        NotificationContent {
            title: title.to_string(),
            body: "body".to_string(),
            sound: true,
        }
    }

    #[test]
    fn schedule_returns_distinct_handles() -> anyhow::Result<()> {
        let (_temp, notifier) = notifier()?;
        let at = datetime!(2026-10-19 18:00 UTC);
        let first = notifier.schedule(&content("a"), at)?;
        let second = notifier.schedule(&content("b"), at)?;
        assert_ne!(first, second);
        assert_eq!(notifier.pending()?.len(), 2);
        Ok(())
    }

    #[test]
    fn take_due_delivers_in_fire_order_once() -> anyhow::Result<()> {
        let (_temp, notifier) = notifier()?;
        let start = datetime!(2026-10-19 18:00 UTC);
        notifier.schedule(&content("third"), start + Duration::minutes(10))?;
        notifier.schedule(&content("first"), start)?;
        notifier.schedule(&content("second"), start + Duration::minutes(5))?;

        let due = notifier.take_due(start + Duration::minutes(5))?;
        let titles: Vec<_> = due.iter().map(|n| n.content.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(due[0].fire_at, start);

        assert!(notifier.take_due(start + Duration::minutes(5))?.is_empty());
        assert_eq!(notifier.pending()?.len(), 1);
        Ok(())
    }

    #[test]
    fn cancel_removes_only_the_named_handle() -> anyhow::Result<()> {
        let (_temp, notifier) = notifier()?;
        let at = datetime!(2026-10-19 18:00 UTC);
        let keep = notifier.schedule(&content("keep"), at)?;
        let dropped = notifier.schedule(&content("drop"), at)?;

        notifier.cancel(&dropped)?;
        notifier.cancel(&NotificationId::from("never-issued"))?;

        let pending = notifier.pending()?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, keep);
        Ok(())
    }

    #[test]
    fn cancel_all_clears_pending() -> anyhow::Result<()> {
        let (_temp, notifier) = notifier()?;
        let at = datetime!(2026-10-19 18:00 UTC);
        notifier.schedule(&content("a"), at)?;
        notifier.schedule(&content("b"), at + Duration::minutes(1))?;

        notifier.cancel_all()?;
        assert!(notifier.pending()?.is_empty());
        Ok(())
    }

    #[test]
    fn permission_follows_configuration() -> anyhow::Result<()> {
        let (_temp, notifier) = notifier()?;
        assert_eq!(notifier.request_permissions()?, PermissionStatus::Granted);
        let denied = LocalNotifier::new(notifier.storage.clone(), false);
        assert_eq!(denied.request_permissions()?, PermissionStatus::Denied);
        Ok(())
    }
}
