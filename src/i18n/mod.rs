use std::borrow::Cow;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::storage::KeyValueStore;

mod catalog;

pub const LANGUAGE_KEY: &str = "language";

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Jp,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Jp,
            Language::Jp => Language::En,
        }
    }
}

/// Identifiers for every user-facing string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum MessageKey {
    PhotoReminderSettings,
    StartDateTime,
    TotalDuration,
    NotificationInterval,
    ReminderTitle,
    ReminderContent,
    SetReminder,
    TitlePlaceholder,
    ContentPlaceholder,
    NotificationPermissionRequired,
    PermissionMessage,
    Error,
    ValidDurationError,
    ValidIntervalError,
    IntervalShorterError,
    SetupComplete,
    SetupMessage,
    SaveError,
    ScheduledReminders,
    NoReminders,
    TotalDurationDisplay,
    IntervalDisplay,
    DeleteHint,
    DeleteReminder,
    DeleteConfirm,
    Cancel,
    Delete,
    LoadError,
    DeleteError,
    ReminderDeleted,
    ReminderNotFound,
    CurrentLanguage,
    DefaultNotificationTitle,
    DefaultNotificationBody,
}

pub trait Localizer {
    fn language(&self) -> Language;

    fn lookup(&self, key: MessageKey) -> &str;

    fn format(&self, key: MessageKey, args: &[&str]) -> String {
        format_string(self.lookup(key), args).into_owned()
    }
}

/// Static en/jp message tables selected by one language flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Catalog {
    language: Language,
}

impl Catalog {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

impl Localizer for Catalog {
    fn language(&self) -> Language {
        self.language
    }

    fn lookup(&self, key: MessageKey) -> &str {
        match self.language {
            Language::En => catalog::en(key),
            Language::Jp => catalog::jp(key),
        }
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}").expect("valid placeholder pattern"));

/// Replaces `{N}` with `args[N]`. Placeholders without an argument stay as written.
pub fn format_string<'t>(template: &'t str, args: &[&str]) -> Cow<'t, str> {
    PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|index| args.get(index))
            .map(|arg| (*arg).to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
}

/// Stored preference, or English when absent, unrecognised, or unreadable.
pub fn load_language(kv: &dyn KeyValueStore) -> Language {
    match kv.get_item(LANGUAGE_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "ignoring unknown language preference");
            Language::default()
        }),
        Ok(None) => Language::default(),
        Err(err) => {
            tracing::warn!(?err, "failed to load language preference");
            Language::default()
        }
    }
}

pub fn save_language(kv: &dyn KeyValueStore, language: Language) -> Result<()> {
    kv.set_item(LANGUAGE_KEY, language.as_ref())
        .context("saving language preference")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, StorageOptions};
    use crate::storage;
    use insta::assert_snapshot;
    use strum::IntoEnumIterator;
    use tempfile::TempDir;

    #[test]
    fn fills_numbered_placeholders() {
        let catalog = Catalog::new(Language::En);
        let message = catalog.format(MessageKey::SetupMessage, &["5", "30", "2026-10-19", "18:00"]);
        assert_snapshot!(message, @"Notifications will be sent every 5 minutes for a total of 30 minutes, starting from 2026-10-19 18:00.");
    }

    #[test]
    fn japanese_template_reorders_arguments() {
        let catalog = Catalog::new(Language::Jp);
        let message = catalog.format(MessageKey::SetupMessage, &["5", "30", "2026-10-19", "18:00"]);
        assert_eq!(message, "2026-10-19 18:00から30分間、5分ごとに通知します。");
    }

    #[test]
    fn missing_arguments_leave_placeholder() {
        assert_eq!(format_string("{0} and {1}", &["one"]), "one and {1}");
        assert_eq!(format_string("no placeholders", &["x"]), "no placeholders");
    }

    #[test]
    fn every_key_has_text_in_both_languages() {
        for language in Language::iter() {
            let catalog = Catalog::new(language);
            for key in MessageKey::iter() {
                let name: &'static str = key.into();
                assert!(
                    !catalog.lookup(key).is_empty(),
                    "{name} is empty for {language}"
                );
            }
        }
    }

    #[test]
    fn language_preference_persists() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let config_dir = temp.path().join("config");
        let paths = ConfigPaths::rooted(
            config_dir.clone(),
            config_dir.join("config.toml"),
            temp.path().join("data"),
        );
        paths.ensure_directories()?;
        let storage = storage::init(&paths, &StorageOptions::default())?;

        assert_eq!(load_language(&storage), Language::En);
        save_language(&storage, Language::Jp)?;
        assert_eq!(load_language(&storage), Language::Jp);
        assert_eq!(storage.get_item(LANGUAGE_KEY)?.as_deref(), Some("jp"));

        storage.set_item(LANGUAGE_KEY, "fr")?;
        assert_eq!(load_language(&storage), Language::En);
        Ok(())
    }

    #[test]
    fn toggling_flips_between_languages() {
        assert_eq!(Language::En.toggled(), Language::Jp);
        assert_eq!(Language::Jp.toggled().to_string(), "en");
    }
}
