//! Core data types for command interpretation

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

macro_rules! intents {
    ($($variant:ident => $label:literal $(| $alias:literal)*),* $(,)?) => {
        /// A recognized category of user request.
        ///
        /// The label is the join key between classifier output and handler
        /// lookup; aliases let several trained labels land on one handler.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum Intent {
            $($variant,)*
        }

        impl Intent {
            pub const ALL: &'static [Intent] = &[$(Intent::$variant,)*];

            /// Canonical label.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Intent::$variant => $label,)*
                }
            }

            /// Resolve a label (canonical or alias) to an intent.
            pub fn from_label(label: &str) -> Option<Self> {
                match label.trim() {
                    $($label $(| $alias)* => Some(Intent::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

intents! {
    // Butler control
    StartListening => "start_listening",
    StopListening => "stop_listening",
    WakeUp => "wake_up",
    ButlerSleep => "butler_sleep",
    Greeting => "greeting",
    ThankYou => "thank_you",

    // Applications
    OpenChrome => "open_chrome",
    OpenFirefox => "open_firefox",
    OpenEdge => "open_edge",
    OpenNotepad => "open_notepad",
    OpenCalculator => "open_calculator",
    OpenExplorer => "open_explorer",
    OpenTaskManager => "open_taskmgr",
    OpenWord => "open_word",
    OpenExcel => "open_excel",
    OpenPowerPoint => "open_powerpoint",
    OpenOutlook => "open_outlook",
    OpenTeams => "open_teams",
    OpenVsCode => "open_vscode",
    OpenSpotify => "open_spotify",
    OpenSteam => "open_steam",
    OpenDiscord => "open_discord",
    OpenApplication => "open_application",
    CloseApplication => "close_application",
    MinimizeApplication => "minimize_application",

    // Power
    ScheduleShutdown => "schedule_shutdown",
    ShutdownNow => "shutdown_now",
    ScheduleRestart => "schedule_restart",
    RestartNow => "restart_now",
    LockComputer => "lock_computer",
    SleepComputer => "sleep_computer",

    // Volume and notifications
    SetVolume => "set_volume",
    VolumeUp => "volume_up",
    VolumeDown => "volume_down",
    MuteVolume => "mute_volume",
    UnmuteVolume => "unmute_volume",
    MuteNotifications => "mute_notifications",
    DisableNotifications => "disable_notifications",
    EnableNotifications => "enable_notifications",

    // Files
    OrganizeFiles => "organize_files",
    MoveFile => "move_file",
    DeleteFile => "delete_file",
    RenameFile => "rename_file",
    CreateFolder => "create_folder",

    // Tasks and reminders
    SetReminder => "set_reminder" | "set_reminder_time" | "set_reminder_datetime" | "set_reminder_relative",
    SetRecurringReminder => "set_recurring_reminder",
    AddTask => "add_task",
    AddTaskDue => "add_task_due",
    AddTaskPriority => "add_task_priority",
    ShowTasks => "show_tasks" | "list_tasks",
    ListReminders => "list_reminders",
    CompleteTask => "complete_task",
    DeleteTask => "delete_task" | "delete_reminder",

    // Information
    GetTime => "get_time",
    GetDate => "get_date",
    DailySummary => "daily_summary",
    ClipboardHistory => "clipboard_history",
    PasteFromHistory => "paste_from_history",
    ClearClipboardHistory => "clear_clipboard_history",
    SystemStatus => "system_status",
    BatteryStatus => "battery_status",
    WifiStatus => "wifi_status",

    // Routines
    OpenAndSearch => "open_and_search",
    FocusMode => "focus_mode",
    GamingMode => "gaming_mode",
    MorningRoutine => "morning_routine",
    EveningRoutine => "evening_routine",
}

impl Intent {
    /// App alias launched by the single-app intents.
    pub fn app(&self) -> Option<&'static str> {
        let app = match self {
            Intent::OpenChrome => "chrome",
            Intent::OpenFirefox => "firefox",
            Intent::OpenEdge => "edge",
            Intent::OpenNotepad => "notepad",
            Intent::OpenCalculator => "calculator",
            Intent::OpenExplorer => "explorer",
            Intent::OpenTaskManager => "task manager",
            Intent::OpenWord => "word",
            Intent::OpenExcel => "excel",
            Intent::OpenPowerPoint => "powerpoint",
            Intent::OpenOutlook => "outlook",
            Intent::OpenTeams => "teams",
            Intent::OpenVsCode => "vs code",
            Intent::OpenSpotify => "spotify",
            Intent::OpenSteam => "steam",
            Intent::OpenDiscord => "discord",
            _ => return None,
        };
        Some(app)
    }
}

impl From<Intent> for String {
    fn from(intent: Intent) -> Self {
        intent.label().to_string()
    }
}

impl TryFrom<String> for Intent {
    type Error = String;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Intent::from_label(&label).ok_or_else(|| format!("unknown intent label `{label}`"))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One command as it moves through the dispatcher.
#[derive(Debug, Clone)]
pub struct Command {
    pub raw: String,
    pub normalized: String,
}

impl Command {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: raw.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// Groups captured by a successful pattern match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub pattern: String,
    /// Positional groups; index 0 is the whole match.
    pub groups: Vec<Option<String>>,
    pub named: AHashMap<String, String>,
}

impl MatchResult {
    pub fn from_captures(pattern: &str, regex: &regex::Regex, caps: &regex::Captures<'_>) -> Self {
        let groups = caps
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        let named = regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();

        Self {
            pattern: pattern.to_string(),
            groups,
            named,
        }
    }

    /// Positional group, trimmed; `None` when absent or blank.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups
            .get(index)
            .and_then(|g| g.as_deref())
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    pub fn name(&self, name: &str) -> Option<&str> {
        self.named
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// A classifier's prediction for one command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// `None` when the label has no bound handler.
    pub intent: Option<Intent>,
    pub confidence: f64,
    pub model_key: String,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f64, model_key: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            intent: Intent::from_label(&label),
            label,
            confidence: confidence.clamp(0.0, 1.0),
            model_key: model_key.into(),
        }
    }
}

/// Kind of value pulled out of raw command text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Path,
    Time,
    Number,
    App,
    Query,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Path => "path",
            EntityKind::Time => "time",
            EntityKind::Number => "number",
            EntityKind::App => "app",
            EntityKind::Query => "query",
        }
    }
}

/// Represents an extracted entity from user input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub value: String,
    pub original: String,
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn new(kind: EntityKind, value: String, original: String, start: usize, end: usize) -> Self {
        Self {
            kind,
            value,
            original,
            start,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(intent.label()), Some(*intent));
        }
    }

    #[test]
    fn test_alias_labels() {
        assert_eq!(Intent::from_label("set_reminder_time"), Some(Intent::SetReminder));
        assert_eq!(Intent::from_label("list_tasks"), Some(Intent::ShowTasks));
        assert_eq!(Intent::from_label("delete_reminder"), Some(Intent::DeleteTask));
        assert_eq!(Intent::from_label("dev_environment"), None);
    }

    #[test]
    fn test_command_normalization() {
        let cmd = Command::new("  Open NotePad \n");
        assert_eq!(cmd.normalized, "open notepad");
        assert!(Command::new("   ").is_empty());
    }

    #[test]
    fn test_classification_binds_intent() {
        let result = ClassificationResult::new("open_notepad", 1.4, "apps_naive_bayes");
        assert_eq!(result.intent, Some(Intent::OpenNotepad));
        assert_eq!(result.confidence, 1.0);
    }
}
