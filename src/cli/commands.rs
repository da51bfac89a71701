use std::fmt::Write as _;
use std::io::{self, Read};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use crossbeam_channel::unbounded;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::app::{DeleteOutcome, NotificationDefaults, ReminderDraft, ReminderError, ReminderService};
use crate::config::AppConfig;
use crate::i18n::{self, Catalog, Language, Localizer, MessageKey};
use crate::notify::{self, DeliveredNotification, DeliveryLoop, LocalNotifier, PermissionStatus};
use crate::reminders::Reminder;
use crate::storage::StorageHandle;

#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Window start: RFC 3339, "YYYY-MM-DD HH:MM" or "HH:MM" in local time (default: now)
    #[arg(long)]
    pub start: Option<String>,
    /// Total duration in minutes (default from config)
    #[arg(long)]
    pub duration: Option<String>,
    /// Minutes between notifications (default from config)
    #[arg(long)]
    pub interval: Option<String>,
    /// Notification title
    #[arg(long)]
    pub title: Option<String>,
    /// Notification body. If omitted and stdin is piped, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Include reminders whose window has already ended
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Reminder identifier as shown by `list`
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LanguageArgs {
    /// Language to switch to (en, jp)
    pub language: Option<Language>,
    /// Switch to the other language
    #[arg(long, conflicts_with = "language")]
    pub toggle: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Deliver whatever is due right now and exit
    #[arg(long)]
    pub once: bool,
}

/// Everything a command needs, resolved once at startup.
pub struct CommandContext {
    pub config: Arc<AppConfig>,
    pub storage: StorageHandle,
    pub offset: UtcOffset,
}

impl CommandContext {
    pub fn new(config: Arc<AppConfig>, storage: StorageHandle, offset: UtcOffset) -> Self {
        Self {
            config,
            storage,
            offset,
        }
    }

    fn catalog(&self) -> Catalog {
        Catalog::new(i18n::load_language(&self.storage))
    }

    fn notifier(&self) -> LocalNotifier {
        LocalNotifier::new(self.storage.clone(), self.config.notifications.enabled)
    }

    fn service<'a>(&'a self, notifier: &'a LocalNotifier, catalog: &Catalog) -> ReminderService<'a> {
        let defaults = NotificationDefaults {
            title: catalog.lookup(MessageKey::DefaultNotificationTitle).to_string(),
            body: catalog.lookup(MessageKey::DefaultNotificationBody).to_string(),
        };
        ReminderService::new(&self.storage, notifier, defaults)
            .with_sound(self.config.notifications.play_sound)
            .with_cancel_all_before_create(self.config.notifications.cancel_all_before_create)
    }
}

pub fn create_reminder(ctx: &CommandContext, mut args: CreateArgs) -> Result<()> {
    if args.content.is_none() {
        args.content = read_stdin()?.map(|body| body.trim_end().to_string());
    }
    let output = run_create(ctx, args, OffsetDateTime::now_utc())?;
    print!("{output}");
    Ok(())
}

fn run_create(ctx: &CommandContext, args: CreateArgs, now: OffsetDateTime) -> Result<String> {
    let catalog = ctx.catalog();
    let notifier = ctx.notifier();
    let service = ctx.service(&notifier, &catalog);

    if service.request_permissions() == PermissionStatus::Denied {
        eprintln!(
            "{}: {}",
            catalog.lookup(MessageKey::NotificationPermissionRequired),
            catalog.lookup(MessageKey::PermissionMessage)
        );
    }

    let start_time = match args.start.as_deref() {
        Some(raw) => parse_start(raw, ctx.offset, now)?,
        None => now.to_offset(ctx.offset),
    };
    let defaults = &ctx.config.defaults;
    let draft = ReminderDraft {
        start_time,
        duration: args
            .duration
            .unwrap_or_else(|| defaults.duration_minutes.to_string()),
        interval: args
            .interval
            .unwrap_or_else(|| defaults.interval_minutes.to_string()),
        title: args.title,
        content: args.content,
    };
    let reminder = service
        .create(draft, now)
        .map_err(|err| localized(err, &catalog))?;

    let local_start = reminder.start_time.to_offset(ctx.offset);
    let date = local_start
        .format(format_description!("[year]-[month]-[day]"))
        .context("formatting start date")?;
    let clock = local_start
        .format(format_description!("[hour]:[minute]"))
        .context("formatting start time")?;
    let interval = reminder.interval.to_string();
    let duration = reminder.duration.to_string();

    let mut out = String::new();
    let _ = writeln!(&mut out, "{}", catalog.lookup(MessageKey::SetupComplete));
    let _ = writeln!(
        &mut out,
        "{}",
        catalog.format(
            MessageKey::SetupMessage,
            &[interval.as_str(), duration.as_str(), date.as_str(), clock.as_str()]
        )
    );
    let _ = writeln!(&mut out, "id {}", reminder.id);
    Ok(out)
}

pub fn list_reminders(ctx: &CommandContext, args: ListArgs) -> Result<()> {
    let output = run_list(ctx, &args, OffsetDateTime::now_utc())?;
    print!("{output}");
    Ok(())
}

fn run_list(ctx: &CommandContext, args: &ListArgs, now: OffsetDateTime) -> Result<String> {
    let catalog = ctx.catalog();
    let notifier = ctx.notifier();
    let service = ctx.service(&notifier, &catalog);
    let reminders = if args.all {
        service.list_all()
    } else {
        service.list_active(now)
    }
    .map_err(|err| localized(err, &catalog))?;
    Ok(format_reminder_list(&reminders, &catalog, ctx.offset))
}

fn format_reminder_list(reminders: &[Reminder], catalog: &Catalog, offset: UtcOffset) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}", catalog.lookup(MessageKey::ScheduledReminders));
    if reminders.is_empty() {
        let _ = writeln!(&mut out, "{}", catalog.lookup(MessageKey::NoReminders));
        return out;
    }
    for reminder in reminders {
        let end = reminder
            .ends_at()
            .map(|end| format_window_edge(end, offset))
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(&mut out);
        let _ = writeln!(
            &mut out,
            "{} 〜 {}",
            format_window_edge(reminder.start_time, offset),
            end
        );
        if let Some(title) = reminder.title() {
            let _ = writeln!(&mut out, "    {title}");
        }
        if let Some(content) = reminder.content() {
            let _ = writeln!(&mut out, "    {content}");
        }
        let _ = writeln!(
            &mut out,
            "    {}",
            catalog.format(MessageKey::TotalDurationDisplay, &[reminder.duration.to_string().as_str()])
        );
        let _ = writeln!(
            &mut out,
            "    {}",
            catalog.format(MessageKey::IntervalDisplay, &[reminder.interval.to_string().as_str()])
        );
        let _ = writeln!(
            &mut out,
            "    {}",
            catalog.format(MessageKey::DeleteHint, &[reminder.id.as_str()])
        );
    }
    out
}

fn format_window_edge(at: OffsetDateTime, offset: UtcOffset) -> String {
    let local = at.to_offset(offset);
    local
        .format(format_description!("[year]/[month]/[day] [hour]:[minute]"))
        .unwrap_or_else(|_| local.to_string())
}

pub fn delete_reminder(ctx: &CommandContext, args: DeleteArgs) -> Result<()> {
    if !args.yes {
        let catalog = ctx.catalog();
        let answer = prompt(&format!(
            "{}: {} [y/N]",
            catalog.lookup(MessageKey::DeleteReminder),
            catalog.lookup(MessageKey::DeleteConfirm)
        ))?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("{}", catalog.lookup(MessageKey::Cancel));
            return Ok(());
        }
    }
    let output = run_delete(ctx, &args.id)?;
    print!("{output}");
    Ok(())
}

fn run_delete(ctx: &CommandContext, id: &str) -> Result<String> {
    let catalog = ctx.catalog();
    let notifier = ctx.notifier();
    let service = ctx.service(&notifier, &catalog);
    let outcome = service.delete(id).map_err(|err| localized(err, &catalog))?;
    let key = match outcome {
        DeleteOutcome::Deleted { .. } => MessageKey::ReminderDeleted,
        DeleteOutcome::NotFound => MessageKey::ReminderNotFound,
    };
    Ok(format!("{}\n", catalog.format(key, &[id])))
}

pub fn handle_language(ctx: &CommandContext, args: LanguageArgs) -> Result<()> {
    let output = run_language(ctx, &args)?;
    print!("{output}");
    Ok(())
}

fn run_language(ctx: &CommandContext, args: &LanguageArgs) -> Result<String> {
    let current = i18n::load_language(&ctx.storage);
    let target = if args.toggle {
        Some(current.toggled())
    } else {
        args.language
    };
    let language = match target {
        Some(language) if language != current => {
            i18n::save_language(&ctx.storage, language)?;
            tracing::info!(%language, "language preference updated");
            language
        }
        _ => current,
    };
    let catalog = Catalog::new(language);
    let name = language.to_string();
    Ok(format!(
        "{}\n",
        catalog.format(MessageKey::CurrentLanguage, &[name.as_str()])
    ))
}

pub fn watch_notifications(ctx: &CommandContext, args: WatchArgs) -> Result<()> {
    let delivery = DeliveryLoop::new(
        ctx.notifier(),
        Duration::from_millis(ctx.config.notifications.poll_interval_ms),
        notify::presentation(),
    );
    if args.once {
        let output = run_watch_once(ctx, &delivery, OffsetDateTime::now_utc())?;
        print!("{output}");
        return Ok(());
    }

    let (events_tx, events_rx) = unbounded();
    let (_shutdown_tx, shutdown_rx) = unbounded::<()>();
    let worker = thread::Builder::new()
        .name("delivery".into())
        .spawn(move || delivery.run(events_tx, shutdown_rx))
        .context("spawning delivery thread")?;
    for notification in events_rx.iter() {
        print!("{}", format_delivered(&notification, ctx.offset));
    }
    if worker.join().is_err() {
        bail!("delivery thread panicked");
    }
    Ok(())
}

fn run_watch_once(
    ctx: &CommandContext,
    delivery: &DeliveryLoop,
    now: OffsetDateTime,
) -> Result<String> {
    let delivered = delivery.deliver_due(now)?;
    let mut out = String::new();
    for notification in &delivered {
        out.push_str(&format_delivered(notification, ctx.offset));
    }
    Ok(out)
}

fn format_delivered(notification: &DeliveredNotification, offset: UtcOffset) -> String {
    let mut line = format!(
        "[{}] {}",
        format_window_edge(notification.fire_at, offset),
        notification.title
    );
    if let Some(body) = &notification.body {
        line.push_str(": ");
        line.push_str(body);
    }
    if notification.sound {
        line.push('\u{7}');
    }
    line.push('\n');
    line
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM` or a bare `HH:MM` for today, in `offset`.
fn parse_start(input: &str, offset: UtcOffset, now: OffsetDateTime) -> Result<OffsetDateTime> {
    let trimmed = input.trim();
    if let Ok(at) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(at);
    }
    let date_time_formats = [
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]/[month]/[day] [hour]:[minute]"),
    ];
    for format in date_time_formats {
        if let Ok(at) = PrimitiveDateTime::parse(trimmed, format) {
            return Ok(at.assume_offset(offset));
        }
    }
    if let Ok(time) = Time::parse(trimmed, format_description!("[hour]:[minute]")) {
        return Ok(now.to_offset(offset).replace_time(time));
    }
    bail!("unrecognised start time '{trimmed}' (expected RFC 3339, YYYY-MM-DD HH:MM or HH:MM)")
}

fn localized(err: ReminderError, catalog: &Catalog) -> anyhow::Error {
    let message = err.user_message(catalog);
    anyhow::Error::new(err).context(message)
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{} ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    if buf.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigPaths, StorageOptions};
    use crate::notify::Presentation;
    use crate::storage;
    use tempfile::TempDir;
    use time::macros::{datetime, offset};

    type TestResult<T = ()> = Result<T>;

    const NOW: OffsetDateTime = datetime!(2026-10-19 09:00 UTC);

    fn setup_context() -> TestResult<(TempDir, CommandContext)> {
        let temp = TempDir::new().context("creating temp dir")?;
        let root = temp.path();
        let paths = ConfigPaths::rooted(
            root.join("config"),
            root.join("config/config.toml"),
            root.join("data"),
        );
        paths.ensure_directories()?;
        let storage = storage::init(&paths, &StorageOptions::default())?;
        let ctx = CommandContext::new(Arc::new(AppConfig::default()), storage, UtcOffset::UTC);
        Ok((temp, ctx))
    }

    fn create_args(start: &str, duration: &str, interval: &str) -> CreateArgs {
        CreateArgs {
            start: Some(start.into()),
            duration: Some(duration.into()),
            interval: Some(interval.into()),
            title: None,
            content: None,
        }
    }

    #[test]
    fn create_prints_setup_confirmation() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        let output = run_create(&ctx, create_args("2026-10-19 18:00", "30", "5"), NOW)?;

        assert!(output.starts_with("Setup Complete\n"));
        assert!(output.contains(
            "Notifications will be sent every 5 minutes for a total of 30 minutes, starting from 2026-10-19 18:00."
        ));
        assert_eq!(ctx.notifier().pending()?.len(), 6);
        Ok(())
    }

    #[test]
    fn create_uses_config_defaults() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        let args = CreateArgs {
            start: Some("18:00".into()),
            ..CreateArgs::default()
        };
        run_create(&ctx, args, NOW)?;

        let pending = ctx.notifier().pending()?;
        assert_eq!(pending.len(), 6);
        assert_eq!(pending[0].fire_at, datetime!(2026-10-19 18:00 UTC));
        assert_eq!(pending[0].content.title, "Time to take photos!");
        Ok(())
    }

    #[test]
    fn create_rejects_bad_interval_with_localized_error() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        i18n::save_language(&ctx.storage, Language::Jp)?;

        let err = run_create(&ctx, create_args("18:00", "10", "20"), NOW)
            .expect_err("interval longer than duration");
        assert_eq!(
            err.to_string(),
            "エラー: 通知間隔は合計時間より短くする必要があります"
        );
        assert!(ctx.notifier().pending()?.is_empty());
        Ok(())
    }

    #[test]
    fn japanese_defaults_feed_notification_text() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        i18n::save_language(&ctx.storage, Language::Jp)?;
        run_create(&ctx, create_args("18:00", "10", "10"), NOW)?;

        let pending = ctx.notifier().pending()?;
        assert_eq!(pending[0].content.title, "写真を撮る時間です！");
        assert_eq!(pending[0].content.body, "忘れずに想い出を残しましょう！");
        Ok(())
    }

    #[test]
    fn list_shows_only_open_windows() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        let mut upcoming = create_args("2026-10-19 18:00", "30", "5");
        upcoming.title = Some("Dinner with friends".into());
        upcoming.content = Some("Group photo".into());
        run_create(&ctx, upcoming, NOW)?;
        run_create(&ctx, create_args("2026-10-18 18:00", "30", "5"), NOW)?;

        let output = run_list(&ctx, &ListArgs::default(), NOW)?;
        assert!(output.starts_with("Scheduled Reminders\n"));
        assert!(output.contains("2026/10/19 18:00 〜 2026/10/19 18:30"));
        assert!(output.contains("    Dinner with friends\n    Group photo\n"));
        assert!(output.contains("Total Duration: 30 minutes"));
        assert!(output.contains("Notification Interval: Every 5 minutes"));
        assert!(!output.contains("2026/10/18"));

        let everything = run_list(&ctx, &ListArgs { all: true }, NOW)?;
        assert!(everything.contains("2026/10/18 18:00 〜 2026/10/18 18:30"));
        Ok(())
    }

    #[test]
    fn empty_list_says_so() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        let output = run_list(&ctx, &ListArgs::default(), NOW)?;
        assert_eq!(output, "Scheduled Reminders\nNo scheduled reminders\n");
        Ok(())
    }

    #[test]
    fn list_renders_in_display_offset() -> TestResult {
        let (_temp, mut ctx) = setup_context()?;
        run_create(&ctx, create_args("2026-10-19T18:00:00Z", "60", "30"), NOW)?;
        ctx.offset = offset!(+9);

        let output = run_list(&ctx, &ListArgs::default(), NOW)?;
        assert!(output.contains("2026/10/20 03:00 〜 2026/10/20 04:00"));
        Ok(())
    }

    #[test]
    fn delete_cancels_pending_notifications() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        run_create(&ctx, create_args("18:00", "30", "10"), NOW)?;
        let keep = run_create(&ctx, create_args("19:00", "20", "10"), NOW)?;
        let reminders = ctx
            .service(&ctx.notifier(), &ctx.catalog())
            .list_all()?;
        let target = reminders[0].id.clone();

        let output = run_delete(&ctx, &target)?;
        assert_eq!(output, format!("Reminder {target} deleted\n"));
        assert_eq!(ctx.notifier().pending()?.len(), 2);
        assert!(keep.contains(&reminders[1].id));

        let again = run_delete(&ctx, &target)?;
        assert_eq!(again, format!("No reminder with id {target}\n"));
        Ok(())
    }

    #[test]
    fn language_switches_and_persists() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        assert_eq!(run_language(&ctx, &LanguageArgs::default())?, "Language: en\n");

        let toggle = LanguageArgs {
            language: None,
            toggle: true,
        };
        assert_eq!(run_language(&ctx, &toggle)?, "言語: jp\n");
        assert_eq!(i18n::load_language(&ctx.storage), Language::Jp);

        let explicit = LanguageArgs {
            language: Some(Language::En),
            toggle: false,
        };
        assert_eq!(run_language(&ctx, &explicit)?, "Language: en\n");
        Ok(())
    }

    #[test]
    fn watch_once_delivers_due_notifications() -> TestResult {
        let (_temp, ctx) = setup_context()?;
        let mut args = create_args("08:30", "30", "10");
        args.title = Some("Sunrise".into());
        run_create(&ctx, args, NOW)?;

        let delivery = DeliveryLoop::new(
            ctx.notifier(),
            Duration::from_millis(10),
            Presentation {
                show_banner: false,
                play_sound: false,
            },
        );
        let output = run_watch_once(&ctx, &delivery, datetime!(2026-10-19 08:45 UTC))?;
        assert_eq!(
            output,
            "[2026/10/19 08:30] Sunrise\n[2026/10/19 08:40] Sunrise\n"
        );
        assert_eq!(ctx.notifier().pending()?.len(), 1);
        Ok(())
    }

    #[test]
    fn start_time_formats() -> TestResult {
        let tokyo = offset!(+9);
        assert_eq!(
            parse_start("2026-10-19T18:00:00+09:00", UtcOffset::UTC, NOW)?,
            datetime!(2026-10-19 18:00 +9)
        );
        assert_eq!(
            parse_start("2026-10-19 18:00", tokyo, NOW)?,
            datetime!(2026-10-19 18:00 +9)
        );
        assert_eq!(
            parse_start("2026/10/19 18:00", tokyo, NOW)?,
            datetime!(2026-10-19 18:00 +9)
        );
        assert_eq!(
            parse_start("07:15", tokyo, NOW)?,
            datetime!(2026-10-19 07:15 +9)
        );
        assert!(parse_start("tomorrow-ish", tokyo, NOW).is_err());
        Ok(())
    }
}
