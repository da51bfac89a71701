use std::fmt;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

pub mod dispatch;
pub mod local;
pub mod memory;

pub use dispatch::{DeliveredNotification, DeliveryLoop};
pub use local::LocalNotifier;
pub use memory::MemoryNotifier;

/// Opaque handle returned by a notification backend, used only for cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub sound: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification {0} could not be cancelled")]
    CancelRejected(NotificationId),
    #[error("notification backend refused to schedule: {0}")]
    ScheduleRejected(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// One-shot local notifications keyed by opaque handles.
pub trait NotificationScheduler {
    fn request_permissions(&self) -> Result<PermissionStatus, NotifyError>;

    fn schedule(
        &self,
        content: &NotificationContent,
        fire_at: OffsetDateTime,
    ) -> Result<NotificationId, NotifyError>;

    /// Cancelling an unknown or already delivered handle is a no-op.
    fn cancel(&self, id: &NotificationId) -> Result<(), NotifyError>;

    fn cancel_all(&self) -> Result<(), NotifyError>;
}

/// How delivered notifications are presented. Set once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub show_banner: bool,
    pub play_sound: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            show_banner: true,
            play_sound: true,
        }
    }
}

static PRESENTATION: OnceCell<Presentation> = OnceCell::new();

/// Returns false when presentation was already configured; the first value wins.
pub fn configure_presentation(presentation: Presentation) -> bool {
    let installed = PRESENTATION.set(presentation).is_ok();
    if !installed {
        tracing::debug!("notification presentation already configured, ignoring");
    }
    installed
}

pub fn presentation() -> Presentation {
    PRESENTATION.get().copied().unwrap_or_default()
}
