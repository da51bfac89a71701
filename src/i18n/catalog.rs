use super::MessageKey;

pub(super) fn en(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        PhotoReminderSettings => "Photo Reminder Settings",
        StartDateTime => "Start Date/Time:",
        TotalDuration => "Total Duration (minutes):",
        NotificationInterval => "Notification Interval (minutes):",
        ReminderTitle => "Reminder Title:",
        ReminderContent => "Reminder Content:",
        SetReminder => "Set Reminder",
        TitlePlaceholder => "Example: Dinner with friends",
        ContentPlaceholder => "Example: Don't forget to take photos of this rare meetup!",
        NotificationPermissionRequired => "Notification Permission Required",
        PermissionMessage => "Photo reminder requires notification permissions to work properly.",
        Error => "Error",
        ValidDurationError => "Please enter a valid duration (minutes)",
        ValidIntervalError => "Please enter a valid notification interval (minutes)",
        IntervalShorterError => "Notification interval must be shorter than the total duration",
        SetupComplete => "Setup Complete",
        SetupMessage => "Notifications will be sent every {0} minutes for a total of {1} minutes, starting from {2} {3}.",
        SaveError => "Failed to save settings",
        ScheduledReminders => "Scheduled Reminders",
        NoReminders => "No scheduled reminders",
        TotalDurationDisplay => "Total Duration: {0} minutes",
        IntervalDisplay => "Notification Interval: Every {0} minutes",
        DeleteHint => "(Delete with: photoremind delete {0})",
        DeleteReminder => "Delete Reminder",
        DeleteConfirm => "Are you sure you want to delete this reminder?",
        Cancel => "Cancel",
        Delete => "Delete",
        LoadError => "Failed to load reminders",
        DeleteError => "Failed to delete reminder",
        ReminderDeleted => "Reminder {0} deleted",
        ReminderNotFound => "No reminder with id {0}",
        CurrentLanguage => "Language: {0}",
        DefaultNotificationTitle => "Time to take photos!",
        DefaultNotificationBody => "Don't forget to capture the moment!",
    }
}

pub(super) fn jp(key: MessageKey) -> &'static str {
    use MessageKey::*;
    match key {
        PhotoReminderSettings => "写真リマインダー設定",
        StartDateTime => "開始日時:",
        TotalDuration => "合計時間 (分):",
        NotificationInterval => "通知間隔 (分):",
        ReminderTitle => "リマインダータイトル:",
        ReminderContent => "リマインダー内容:",
        SetReminder => "リマインダーを設定",
        TitlePlaceholder => "例: 友だちとご飯",
        ContentPlaceholder => "例: なかなか会えないから絶対に写真を忘れない！",
        NotificationPermissionRequired => "通知の許可が必要です",
        PermissionMessage => "写真リマインダーを使用するには通知の許可が必要です。",
        Error => "エラー",
        ValidDurationError => "有効な時間（分）を入力してください",
        ValidIntervalError => "有効な通知間隔（分）を入力してください",
        IntervalShorterError => "通知間隔は合計時間より短くする必要があります",
        SetupComplete => "設定完了",
        SetupMessage => "{2} {3}から{1}分間、{0}分ごとに通知します。",
        SaveError => "設定の保存に失敗しました",
        ScheduledReminders => "設定済みリマインダー",
        NoReminders => "設定済みのリマインダーはありません",
        TotalDurationDisplay => "合計時間: {0}分",
        IntervalDisplay => "通知間隔: {0}分ごと",
        DeleteHint => "(削除: photoremind delete {0})",
        DeleteReminder => "リマインダーを削除",
        DeleteConfirm => "本当にこのリマインダーを削除しますか？",
        Cancel => "キャンセル",
        Delete => "削除",
        LoadError => "リマインダーの読み込みに失敗しました",
        DeleteError => "リマインダーの削除に失敗しました",
        ReminderDeleted => "リマインダー {0} を削除しました",
        ReminderNotFound => "ID {0} のリマインダーはありません",
        CurrentLanguage => "言語: {0}",
        DefaultNotificationTitle => "写真を撮る時間です！",
        DefaultNotificationBody => "忘れずに想い出を残しましょう！",
    }
}
