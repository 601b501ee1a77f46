//! Recording collaborators and a fixed clock for handler and dispatcher tests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use tempfile::TempDir;

use super::{HandlerContext, HandlerResult, HandlerSet, KnownFolders};
use crate::collab::{
    AppTable, Clock, CollabResult, Collaborators, DirectoryOrganizer, InMemoryClipboard, InMemoryTaskStore,
    ListeningControl, NoActivity, ProcessControl, SystemControl,
};
use crate::matcher::RuleMatcher;
use crate::registry::IntentRegistry;
use crate::responses::FixedResponses;
use crate::types::{ClassificationResult, Command, Intent};

/// Thursday 2024-03-14, 18:00.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 14)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap()
}

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingProcess {
    launched: Mutex<Vec<String>>,
    terminated: Mutex<Vec<String>>,
}

impl RecordingProcess {
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().clone()
    }

    pub fn terminated(&self) -> Vec<String> {
        self.terminated.lock().clone()
    }
}

impl ProcessControl for RecordingProcess {
    fn launch(&self, target: &str, _args: &[String]) -> CollabResult<()> {
        self.launched.lock().push(target.to_string());
        Ok(())
    }

    fn terminate(&self, target: &str) -> CollabResult<()> {
        self.terminated.lock().push(target.to_string());
        Ok(())
    }

    fn minimize(&self, target: &str) -> CollabResult<()> {
        self.launched.lock().push(format!("minimize {target}"));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSystem {
    calls: Mutex<Vec<String>>,
}

impl RecordingSystem {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) -> CollabResult<()> {
        self.calls.lock().push(call);
        Ok(())
    }
}

impl SystemControl for RecordingSystem {
    fn set_volume(&self, level: u8) -> CollabResult<()> {
        self.record(format!("volume {level}"))
    }

    fn volume_up(&self) -> CollabResult<()> {
        self.record("volume up".into())
    }

    fn volume_down(&self) -> CollabResult<()> {
        self.record("volume down".into())
    }

    fn set_muted(&self, muted: bool) -> CollabResult<()> {
        self.record(format!("muted {muted}"))
    }

    fn shutdown(&self, after: Duration) -> CollabResult<()> {
        self.record(format!("shutdown {}s", after.as_secs()))
    }

    fn restart(&self, after: Duration) -> CollabResult<()> {
        self.record(format!("restart {}s", after.as_secs()))
    }

    fn lock(&self) -> CollabResult<()> {
        self.record("lock".into())
    }

    fn sleep(&self) -> CollabResult<()> {
        self.record("sleep".into())
    }

    fn mute_notifications(&self, duration: Option<Duration>) -> CollabResult<()> {
        match duration {
            Some(d) => self.record(format!("mute notifications {}s", d.as_secs())),
            None => self.record("mute notifications".into()),
        }
    }

    fn enable_notifications(&self) -> CollabResult<()> {
        self.record("enable notifications".into())
    }

    fn performance_summary(&self) -> CollabResult<String> {
        Ok("CPU usage is 12% and memory usage is 40%.".into())
    }

    fn battery_summary(&self) -> CollabResult<String> {
        Ok("Battery is at 80% and charging.".into())
    }

    fn network_summary(&self) -> CollabResult<String> {
        Ok("You are connected to HomeNet.".into())
    }
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl ListeningControl for RecordingListener {
    fn start_listening(&self) {
        self.events.lock().push("start".into());
    }

    fn stop_listening(&self) {
        self.events.lock().push("stop".into());
    }
}

pub struct Harness {
    pub handlers: Arc<HandlerSet>,
    pub collab: Collaborators,
    pub process: Arc<RecordingProcess>,
    pub system: Arc<RecordingSystem>,
    pub tasks: Arc<InMemoryTaskStore>,
    pub clipboard: Arc<InMemoryClipboard>,
    pub listening: Arc<RecordingListener>,
    pub matcher: RuleMatcher,
    pub dir: TempDir,
}

impl Harness {
    /// Harness whose Downloads and Desktop live in a fresh temp dir.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("Downloads");
        let desktop = dir.path().join("Desktop");
        std::fs::create_dir_all(&downloads).unwrap();
        std::fs::create_dir_all(&desktop).unwrap();
        Self::build(
            dir,
            KnownFolders {
                downloads: Some(downloads),
                desktop: Some(desktop),
            },
        )
    }

    pub fn with_folders(folders: KnownFolders) -> Self {
        Self::build(tempfile::tempdir().unwrap(), folders)
    }

    fn build(dir: TempDir, folders: KnownFolders) -> Self {
        let process = Arc::new(RecordingProcess::default());
        let system = Arc::new(RecordingSystem::default());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let clipboard = Arc::new(InMemoryClipboard::default());
        let listening = Arc::new(RecordingListener::default());
        let base: PathBuf = dir.path().to_path_buf();

        let collab = Collaborators {
            process: process.clone(),
            system: system.clone(),
            tasks: tasks.clone(),
            clipboard: clipboard.clone(),
            files: Arc::new(DirectoryOrganizer::new(base)),
            activity: Arc::new(NoActivity),
            listening: listening.clone(),
            clock: Arc::new(FixedClock(fixed_now())),
        };
        let handlers = HandlerSet::new(collab.clone(), AppTable::default(), Arc::new(FixedResponses::default()))
            .with_folders(folders);
        let matcher = RuleMatcher::new(Arc::new(IntentRegistry::builtin().unwrap()));

        Self {
            handlers: Arc::new(handlers),
            collab,
            process,
            system,
            tasks,
            clipboard,
            listening,
            matcher,
            dir,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        fixed_now()
    }

    /// Route `text` through the built-in rules and handle it.
    pub fn rule(&self, text: &str) -> HandlerResult {
        let command = Command::new(text);
        let (intent, captures) = self
            .matcher
            .match_text(&command.normalized)
            .unwrap_or_else(|| panic!("no rule matched {text:?}"));
        let ctx = HandlerContext::from_rule(&command.raw, &command.normalized, &captures);
        self.handlers.handle(intent, &ctx)
    }

    /// Handle `text` as if a classifier had labelled it `intent`.
    pub fn classified(&self, intent: Intent, text: &str) -> HandlerResult {
        let command = Command::new(text);
        let classification = ClassificationResult::new(intent.label(), 0.9, "test_model");
        let ctx = HandlerContext::from_classifier(&command.raw, &command.normalized, &classification);
        self.handlers.handle(intent, &ctx)
    }

    /// Handle `intent` with no text at all.
    pub fn handle_plain(&self, intent: Intent) -> HandlerResult {
        self.classified(intent, "")
    }
}
