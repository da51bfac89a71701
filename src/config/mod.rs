use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "PhotoReminder";
const APP_NAME: &str = "photoremind";

pub const CONFIG_ENV: &str = "PHOTOREMIND_CONFIG";
pub const DATA_ENV: &str = "PHOTOREMIND_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        Ok(Self::rooted(config_dir, config_file, data_dir))
    }

    /// Lays out every path under explicit config and data roots.
    pub fn rooted(config_dir: PathBuf, config_file: PathBuf, data_dir: PathBuf) -> Self {
        let database_path = data_dir.join("reminders.db");
        Self {
            config_dir,
            config_file,
            data_dir,
            database_path,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub defaults: ScheduleDefaults,
    pub notifications: NotificationOptions,
    pub storage: StorageOptions,
}

impl AppConfig {
    fn post_load(&mut self) {
        if !self.defaults.is_consistent() {
            tracing::warn!(
                duration = self.defaults.duration_minutes,
                interval = self.defaults.interval_minutes,
                "default schedule in config is invalid, falling back to built-in defaults"
            );
            self.defaults = ScheduleDefaults::default();
        }
        if self.notifications.poll_interval_ms == 0 {
            tracing::warn!("notifications.poll_interval_ms must be positive, using 1000");
            self.notifications.poll_interval_ms = NotificationOptions::default().poll_interval_ms;
        }
    }
}

/// Values pre-filled into the create form when the user leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleDefaults {
    pub duration_minutes: u32,
    pub interval_minutes: u32,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            duration_minutes: 30,
            interval_minutes: 5,
        }
    }
}

impl ScheduleDefaults {
    fn is_consistent(&self) -> bool {
        self.duration_minutes > 0
            && self.interval_minutes > 0
            && self.interval_minutes <= self.duration_minutes
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationOptions {
    /// Whether the local backend grants notification permission.
    pub enabled: bool,
    pub show_banner: bool,
    pub play_sound: bool,
    pub poll_interval_ms: u64,
    /// Wipe every pending notification before scheduling a new reminder.
    pub cancel_all_before_create: bool,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            show_banner: true,
            play_sound: true,
            poll_interval_ms: 1000,
            cancel_all_before_create: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    pub wal_autocheckpoint: u32,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            wal_autocheckpoint: 1000,
        }
    }
}
