use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{select, tick, Receiver, Sender};
use time::OffsetDateTime;

use super::local::{LocalNotifier, PendingNotification};
use super::{NotificationId, Presentation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredNotification {
    pub id: NotificationId,
    pub fire_at: OffsetDateTime,
    pub title: String,
    /// `None` when banners are disabled; only the title lands in the list.
    pub body: Option<String>,
    pub sound: bool,
}

impl DeliveredNotification {
    fn present(pending: PendingNotification, presentation: Presentation) -> Self {
        Self {
            id: pending.id,
            fire_at: pending.fire_at,
            title: pending.content.title,
            body: presentation.show_banner.then_some(pending.content.body),
            sound: pending.content.sound && presentation.play_sound,
        }
    }
}

/// Polls the local backend and hands due notifications to a consumer.
pub struct DeliveryLoop {
    notifier: LocalNotifier,
    poll_every: Duration,
    presentation: Presentation,
}

impl DeliveryLoop {
    pub fn new(notifier: LocalNotifier, poll_every: Duration, presentation: Presentation) -> Self {
        Self {
            notifier,
            poll_every,
            presentation,
        }
    }

    pub fn deliver_due(&self, now: OffsetDateTime) -> Result<Vec<DeliveredNotification>> {
        let due = self.notifier.take_due(now)?;
        Ok(due
            .into_iter()
            .map(|pending| DeliveredNotification::present(pending, self.presentation))
            .collect())
    }

    /// Runs until `shutdown` fires or disconnects, or the consumer hangs up.
    pub fn run(&self, events: Sender<DeliveredNotification>, shutdown: Receiver<()>) {
        let ticker = tick(self.poll_every);
        tracing::info!(poll_ms = self.poll_every.as_millis() as u64, "delivery loop started");
        if !self.forward(&events) {
            return;
        }
        loop {
            select! {
                recv(ticker) -> _ => {
                    if !self.forward(&events) {
                        break;
                    }
                }
                recv(shutdown) -> _ => break,
            }
        }
        tracing::info!("delivery loop stopped");
    }

    fn forward(&self, events: &Sender<DeliveredNotification>) -> bool {
        let delivered = match self.deliver_due(OffsetDateTime::now_utc()) {
            Ok(delivered) => delivered,
            Err(err) => {
                tracing::error!(?err, "failed to collect due notifications");
                return true;
            }
        };
        for notification in delivered {
            tracing::debug!(id = %notification.id, "delivering notification");
            if events.send(notification).is_err() {
                tracing::warn!("notification consumer disconnected");
                return false;
            }
        }
        true
    }
}
