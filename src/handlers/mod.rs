//! Intent handlers
//!
//! One handler per [`Intent`]. Parameters come from rule captures when the
//! rule table matched, and from entity extraction when a classifier routed
//! the command. Every side effect goes through [`Collaborators`].

mod apps;
mod files;
mod info;
mod system;
mod tasks;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::collab::{AppTable, Collaborators};
use crate::entities::EntityExtractor;
use crate::error::HandlerError;
use crate::responses::{ResponseCategory, ResponseProvider};
use crate::types::{ClassificationResult, Entity, EntityKind, Intent, MatchResult};

pub type HandlerResult = Result<String, HandlerError>;

/// What a handler knows about the command it is serving.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub raw: &'a str,
    pub normalized: &'a str,
    /// Present when a rule matched.
    pub captures: Option<&'a MatchResult>,
    /// Present when a classifier routed the command.
    pub classification: Option<&'a ClassificationResult>,
}

impl<'a> HandlerContext<'a> {
    pub fn from_rule(raw: &'a str, normalized: &'a str, captures: &'a MatchResult) -> Self {
        Self {
            raw,
            normalized,
            captures: Some(captures),
            classification: None,
        }
    }

    pub fn from_classifier(raw: &'a str, normalized: &'a str, classification: &'a ClassificationResult) -> Self {
        Self {
            raw,
            normalized,
            captures: None,
            classification: Some(classification),
        }
    }

    /// Positional capture group, trimmed and non-empty.
    pub fn group(&self, index: usize) -> Option<&'a str> {
        self.captures.and_then(|c| c.group(index))
    }

    pub fn named(&self, name: &str) -> Option<&'a str> {
        self.captures.and_then(|c| c.name(name))
    }
}

/// Folders that "organize my downloads/desktop" refer to.
#[derive(Debug, Clone, Default)]
pub struct KnownFolders {
    pub downloads: Option<PathBuf>,
    pub desktop: Option<PathBuf>,
}

impl KnownFolders {
    /// The current user's folders, as reported by the platform.
    pub fn from_platform() -> Self {
        Self {
            downloads: dirs::download_dir(),
            desktop: dirs::desktop_dir(),
        }
    }
}

pub struct HandlerSet {
    collab: Collaborators,
    apps: AppTable,
    folders: KnownFolders,
    extractor: EntityExtractor,
    responses: Arc<dyn ResponseProvider>,
}

impl HandlerSet {
    pub fn new(collab: Collaborators, apps: AppTable, responses: Arc<dyn ResponseProvider>) -> Self {
        Self {
            collab,
            apps,
            folders: KnownFolders::from_platform(),
            extractor: EntityExtractor::new(),
            responses,
        }
    }

    pub fn with_folders(mut self, folders: KnownFolders) -> Self {
        self.folders = folders;
        self
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    pub fn apps(&self) -> &AppTable {
        &self.apps
    }

    /// Run the handler bound to `intent`.
    ///
    /// Malformed parameters produce a corrective reply rather than an error.
    /// Nothing is deduplicated: two calls perform the side effect twice.
    pub fn handle(&self, intent: Intent, ctx: &HandlerContext<'_>) -> HandlerResult {
        debug!(intent = %intent, text = ctx.normalized, "handling");

        match intent {
            // Butler control
            Intent::StartListening => self.start_listening(),
            Intent::StopListening => self.stop_listening(),
            Intent::WakeUp => self.wake_up(),
            Intent::ButlerSleep => self.butler_sleep(),
            Intent::Greeting => Ok(self.responses.render(ResponseCategory::Greeting)),
            Intent::ThankYou => Ok(self.responses.render(ResponseCategory::Thanks)),

            // Applications
            Intent::OpenChrome
            | Intent::OpenFirefox
            | Intent::OpenEdge
            | Intent::OpenNotepad
            | Intent::OpenCalculator
            | Intent::OpenExplorer
            | Intent::OpenTaskManager
            | Intent::OpenWord
            | Intent::OpenExcel
            | Intent::OpenPowerPoint
            | Intent::OpenOutlook
            | Intent::OpenTeams
            | Intent::OpenVsCode
            | Intent::OpenSpotify
            | Intent::OpenSteam
            | Intent::OpenDiscord => self.open_named_app(intent),
            Intent::OpenApplication => self.open_application(ctx),
            Intent::CloseApplication => self.close_application(ctx),
            Intent::MinimizeApplication => self.minimize_application(ctx),

            // Power
            Intent::ScheduleShutdown => self.schedule_shutdown(ctx),
            Intent::ShutdownNow => self.shutdown_now(),
            Intent::ScheduleRestart => self.schedule_restart(ctx),
            Intent::RestartNow => self.restart_now(),
            Intent::LockComputer => self.lock_computer(),
            Intent::SleepComputer => self.sleep_computer(),

            // Volume and notifications
            Intent::SetVolume => self.set_volume(ctx),
            Intent::VolumeUp => self.volume_up(),
            Intent::VolumeDown => self.volume_down(),
            Intent::MuteVolume => self.mute_volume(),
            Intent::UnmuteVolume => self.unmute_volume(),
            Intent::MuteNotifications => self.mute_notifications(ctx),
            Intent::DisableNotifications => self.disable_notifications(),
            Intent::EnableNotifications => self.enable_notifications(),

            // Files
            Intent::OrganizeFiles => self.organize_files(ctx),
            Intent::MoveFile => self.move_file(ctx),
            Intent::DeleteFile => self.delete_file(ctx),
            Intent::RenameFile => self.rename_file(ctx),
            Intent::CreateFolder => self.create_folder(ctx),

            // Tasks and reminders
            Intent::SetReminder => self.set_reminder(ctx),
            Intent::SetRecurringReminder => self.set_recurring_reminder(ctx),
            Intent::AddTask => self.add_task(ctx),
            Intent::AddTaskDue => self.add_task_due(ctx),
            Intent::AddTaskPriority => self.add_task_priority(ctx),
            Intent::ShowTasks => self.show_tasks(),
            Intent::ListReminders => self.list_reminders(),
            Intent::CompleteTask => self.complete_task(ctx),
            Intent::DeleteTask => self.delete_task(ctx),

            // Information
            Intent::GetTime => self.get_time(),
            Intent::GetDate => self.get_date(),
            Intent::DailySummary => self.daily_summary(),
            Intent::ClipboardHistory => self.clipboard_history(),
            Intent::PasteFromHistory => self.paste_from_history(ctx),
            Intent::ClearClipboardHistory => self.clear_clipboard_history(),
            Intent::SystemStatus => self.system_status(),
            Intent::BatteryStatus => self.battery_status(),
            Intent::WifiStatus => self.wifi_status(),

            // Routines
            Intent::OpenAndSearch => self.open_and_search(ctx),
            Intent::FocusMode => self.focus_mode(),
            Intent::GamingMode => self.gaming_mode(),
            Intent::MorningRoutine => self.morning_routine(),
            Intent::EveningRoutine => self.evening_routine(),
        }
    }

    fn entity(&self, ctx: &HandlerContext<'_>, kind: EntityKind) -> Option<Entity> {
        self.extractor.first(ctx.normalized, kind)
    }

    fn entities(&self, ctx: &HandlerContext<'_>, kind: EntityKind) -> Vec<Entity> {
        self.extractor
            .extract(ctx.normalized)
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    /// Capture group `index`, or the first extracted entity of `kind`.
    fn param(&self, ctx: &HandlerContext<'_>, index: usize, kind: EntityKind) -> Option<String> {
        match ctx.captures {
            Some(_) => ctx.group(index).map(str::to_string),
            None => self.entity(ctx, kind).map(|e| e.value),
        }
    }
}

/// Parse a captured count. `None` for non-digits or values that overflow.
fn parse_count(text: &str) -> Option<u64> {
    text.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::testing::Harness;
    use super::*;
    use crate::collab::{ClipboardStore, TaskStore};
    use crate::error::CollabError;

    #[test]
    fn test_named_app_launches_resolved_executable() {
        let h = Harness::new();
        let reply = h.rule("open notepad").unwrap();
        assert_eq!(reply, "Opening Notepad for you.");
        assert_eq!(h.process.launched(), vec!["notepad.exe".to_string()]);
    }

    #[test]
    fn test_no_dedup_between_calls() {
        let h = Harness::new();
        h.rule("open notepad").unwrap();
        h.rule("open notepad").unwrap();
        assert_eq!(h.process.launched().len(), 2);
    }

    #[test]
    fn test_generic_open_and_close() {
        let h = Harness::new();
        assert_eq!(h.rule("open gimp").unwrap(), "Opening gimp now.");
        assert_eq!(h.rule("close chrome").unwrap(), "Closing chrome.");
        assert_eq!(h.process.launched(), vec!["gimp".to_string()]);
        assert_eq!(h.process.terminated(), vec!["chrome.exe".to_string()]);
    }

    #[test]
    fn test_classifier_path_uses_entities() {
        let h = Harness::new();
        let reply = h.classified(Intent::OpenApplication, "please launch spotify").unwrap();
        assert_eq!(reply, "Opening spotify now.");
        assert_eq!(h.process.launched(), vec!["spotify.exe".to_string()]);

        let err = h.classified(Intent::OpenApplication, "do the thing").unwrap_err();
        assert!(matches!(err, HandlerError::MissingParameter(_)));
    }

    #[test]
    fn test_volume_is_clamped() {
        let h = Harness::new();
        assert_eq!(h.rule("set volume to 150").unwrap(), "Setting volume to 100%.");
        assert_eq!(h.rule("volume 40").unwrap(), "Setting volume to 40%.");
        assert_eq!(h.system.calls(), vec!["volume 100", "volume 40"]);
    }

    #[test]
    fn test_volume_overflow_is_corrected_not_failed() {
        let h = Harness::new();
        let reply = h.rule("set volume to 99999999999999999999999").unwrap();
        assert!(reply.contains("between 0 and 100"));
        assert!(h.system.calls().is_empty());
    }

    #[test]
    fn test_schedule_shutdown() {
        let h = Harness::new();
        assert_eq!(h.rule("shutdown in 5 minutes").unwrap(), "System will shutdown in 5 minutes.");
        assert_eq!(h.system.calls(), vec!["shutdown 300s"]);
    }

    #[test]
    fn test_delete_missing_file_is_an_error() {
        let h = Harness::new();
        let err = h.rule("delete nonexistent_file.xyz").unwrap_err();
        assert!(matches!(err, HandlerError::Collaborator(CollabError::NotFound(_))));
    }

    #[test]
    fn test_file_operations_in_base_dir() {
        let h = Harness::new();
        std::fs::write(h.dir.path().join("notes.txt"), b"x").unwrap();

        assert_eq!(h.rule("create folder archive").unwrap(), "Created folder 'archive'.");
        assert_eq!(h.rule("move notes.txt to archive").unwrap(), "Moved notes.txt to archive.");
        assert!(h.dir.path().join("archive/notes.txt").exists());
        h.rule("rename archive/notes.txt to final.txt").unwrap();
        assert!(h.dir.path().join("archive/final.txt").exists());
        h.rule("delete archive/final.txt").unwrap();
        assert!(!h.dir.path().join("archive/final.txt").exists());
    }

    #[test]
    fn test_reminder_from_rule_captures() {
        let h = Harness::new();
        let reply = h.rule("remind me to call mom at 5 pm").unwrap();
        assert_eq!(reply, "I'll remind you to call mom tomorrow at 05:00 PM.");

        let tasks = h.tasks.list_pending().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "call mom");
        assert!(tasks[0].is_reminder());
    }

    #[test]
    fn test_reminder_from_classifier_defaults_to_one_hour() {
        let h = Harness::new();
        let reply = h.classified(Intent::SetReminder, "set a reminder to stretch").unwrap();
        assert_eq!(reply, "I'll remind you to stretch at 07:00 PM.");
    }

    #[test]
    fn test_recurring_reminder() {
        let h = Harness::new();
        let reply = h
            .classified(Intent::SetRecurringReminder, "remind me to take vitamins every day at 9 am")
            .unwrap();
        assert_eq!(reply, "I'll remind you to take vitamins every day, starting tomorrow at 09:00 AM.");
        let task = &h.tasks.list_pending().unwrap()[0];
        assert_eq!(task.recurring, Some(crate::collab::Recurrence::Daily));
    }

    #[test]
    fn test_task_priority_and_listing() {
        let h = Harness::new();
        h.rule("add task buy milk").unwrap();
        let reply = h
            .classified(Intent::AddTaskPriority, "add high priority task finish the report")
            .unwrap();
        assert_eq!(reply, "Added high priority task: finish the report");

        let listing = h.rule("show my tasks").unwrap();
        assert!(listing.starts_with("Your pending tasks:"));
        assert!(listing.contains("- buy milk"));
        assert!(listing.contains("- finish the report"));
    }

    #[test]
    fn test_complete_and_delete_task() {
        let h = Harness::new();
        h.rule("add task buy milk").unwrap();
        h.rule("add task water plants").unwrap();

        assert_eq!(h.rule("mark task buy milk as done").unwrap(), "Marked task as complete: buy milk");
        assert!(h.rule("mark task walk the dog done").is_err());

        let reply = h.classified(Intent::DeleteTask, "delete task 2").unwrap();
        assert_eq!(reply, "Deleted task: water plants");
        assert_eq!(h.rule("show my tasks").unwrap(), "You have no pending tasks. Well done!");
    }

    #[test]
    fn test_time_and_date_use_clock() {
        let h = Harness::new();
        assert_eq!(h.rule("what time is it").unwrap(), "It's 06:00 PM.");
        assert_eq!(h.rule("what day is it").unwrap(), "Today is Thursday, March 14, 2024.");
    }

    #[test]
    fn test_clipboard_history_and_paste() {
        let h = Harness::new();
        assert_eq!(h.rule("clipboard history").unwrap(), "Your clipboard history is empty.");

        h.clipboard.record("first", h.now());
        h.clipboard.record("second", h.now());
        let history = h.rule("show me my clipboard history").unwrap();
        assert_eq!(history, "Recent clipboard items:\n1. second\n2. first");

        assert_eq!(h.rule("paste item 2").unwrap(), "Pasting clipboard item 2.");
        assert_eq!(h.clipboard.current().as_deref(), Some("first"));

        let reply = h.rule("paste item 0").unwrap();
        assert!(reply.contains("numbered from 1"));

        h.rule("clear clipboard history").unwrap();
        assert!(h.clipboard.history(10).unwrap().is_empty());
    }

    #[test]
    fn test_conversational_replies() {
        let h = Harness::new();
        assert_eq!(h.rule("hello butler").unwrap(), "Hello! How may I assist you today?");
        assert_eq!(h.rule("thank you").unwrap(), "You're most welcome, sir.");
    }

    #[test]
    fn test_listening_control() {
        let h = Harness::new();
        h.rule("stop listening").unwrap();
        h.rule("start listening").unwrap();
        assert_eq!(h.listening.events(), vec!["stop", "start"]);
    }

    #[test]
    fn test_routines() {
        let h = Harness::new();
        h.handle_plain(Intent::MorningRoutine).unwrap();
        assert_eq!(h.process.launched(), vec!["chrome.exe", "outlook.exe", "teams.exe"]);

        h.handle_plain(Intent::FocusMode).unwrap();
        assert_eq!(h.system.calls(), vec!["mute notifications 3600s"]);

        h.rule("add task review notes").unwrap();
        let reply = h.handle_plain(Intent::EveningRoutine).unwrap();
        assert_eq!(h.process.terminated(), vec!["outlook.exe", "teams.exe"]);
        assert!(reply.contains("1 pending task"));
    }

    #[test]
    fn test_organize_downloads() {
        let h = Harness::new();
        let downloads = h.dir.path().join("Downloads");
        std::fs::write(downloads.join("report.pdf"), b"x").unwrap();
        std::fs::write(downloads.join("photo.jpg"), b"x").unwrap();

        let reply = h.rule("clean up my downloads").unwrap();
        assert_eq!(reply, "Organized 2 files in your Downloads folder. Much better now!");
        assert!(downloads.join("Documents/report.pdf").exists());

        assert_eq!(h.rule("organize desktop").unwrap(), "Your Desktop folder is already tidy.");
    }

    #[test]
    fn test_organize_without_known_folder() {
        let h = Harness::with_folders(KnownFolders::default());
        let err = h.rule("organize my desktop").unwrap_err();
        assert!(matches!(err, HandlerError::Collaborator(CollabError::NotFound(_))));
    }

    #[test]
    fn test_every_intent_has_a_handler() {
        let h = Harness::new();
        for intent in Intent::ALL {
            // Must not panic; errors and corrective replies are both fine
            let _ = h.handle_plain(*intent);
        }
    }
}
