use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use time::UtcOffset;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::notify::{self, Presentation};
use crate::storage;

pub mod commands;

use self::commands::{CommandContext, CreateArgs, DeleteArgs, LanguageArgs, ListArgs, WatchArgs};

#[derive(Parser, Debug)]
#[command(
    name = "photoremind",
    version,
    about = "Schedule a burst of photo reminders across a time window"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over PHOTOREMIND_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over PHOTOREMIND_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Schedule notifications across a new reminder window
    Create(CreateArgs),
    /// Show reminders whose window has not ended yet (default)
    List(ListArgs),
    /// Cancel a reminder's notifications and remove it
    Delete(DeleteArgs),
    /// Show or change the display language
    Language(LanguageArgs),
    /// Deliver scheduled notifications as they come due
    Watch(WatchArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    // Must be read before any thread is spawned.
    let offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
        tracing::warn!(?err, "local UTC offset unavailable, displaying times in UTC");
        UtcOffset::UTC
    });
    let config = loader.load_or_init()?;
    notify::configure_presentation(Presentation {
        show_banner: config.notifications.show_banner,
        play_sound: config.notifications.play_sound,
    });
    let storage = storage::init(&paths, &config.storage)?;
    tracing::debug!(
        config = %paths.config_file.display(),
        database = %storage.database_path().display(),
        "startup complete"
    );

    let ctx = CommandContext::new(Arc::new(config), storage, offset);
    let command = cli
        .command
        .unwrap_or_else(|| Commands::List(ListArgs::default()));
    match command {
        Commands::Create(args) => commands::create_reminder(&ctx, args),
        Commands::List(args) => commands::list_reminders(&ctx, args),
        Commands::Delete(args) => commands::delete_reminder(&ctx, args),
        Commands::Language(args) => commands::handle_language(&ctx, args),
        Commands::Watch(args) => commands::watch_notifications(&ctx, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
