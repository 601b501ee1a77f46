//! Collaborator interfaces
//!
//! Handlers never touch the OS directly. Every side effect goes through one
//! of these traits, so the surrounding application decides how (and whether)
//! an app is launched, a file is moved, or a task is stored.

pub mod memory;
pub mod organizer;
pub mod process;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CollabError;

pub use memory::{InMemoryClipboard, InMemoryTaskStore};
pub use organizer::DirectoryOrganizer;
pub use process::{AppTable, SpawnProcessControl, UnsupportedSystem};

pub type CollabResult<T> = Result<T, CollabError>;

/// Launches, terminates, and minimizes applications.
pub trait ProcessControl: Send + Sync {
    fn launch(&self, target: &str, args: &[String]) -> CollabResult<()>;
    fn terminate(&self, target: &str) -> CollabResult<()>;
    fn minimize(&self, target: &str) -> CollabResult<()>;
}

/// Volume, power, notification and status controls.
pub trait SystemControl: Send + Sync {
    fn set_volume(&self, level: u8) -> CollabResult<()>;
    fn volume_up(&self) -> CollabResult<()>;
    fn volume_down(&self) -> CollabResult<()>;
    fn set_muted(&self, muted: bool) -> CollabResult<()>;

    fn shutdown(&self, after: Duration) -> CollabResult<()>;
    fn restart(&self, after: Duration) -> CollabResult<()>;
    fn lock(&self) -> CollabResult<()>;
    fn sleep(&self) -> CollabResult<()>;

    /// `None` mutes until re-enabled.
    fn mute_notifications(&self, duration: Option<Duration>) -> CollabResult<()>;
    fn enable_notifications(&self) -> CollabResult<()>;

    fn performance_summary(&self) -> CollabResult<String>;
    fn battery_summary(&self) -> CollabResult<String>;
    fn network_summary(&self) -> CollabResult<String>;
}

pub type TaskId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

/// A task or reminder to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub description: String,
    pub due: Option<NaiveDateTime>,
    pub priority: Priority,
    pub category: String,
    pub recurring: Option<Recurrence>,
}

impl NewTask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            due: None,
            priority: Priority::Medium,
            category: "general".to_string(),
            recurring: None,
        }
    }

    pub fn reminder(description: impl Into<String>, due: NaiveDateTime) -> Self {
        Self {
            due: Some(due),
            priority: Priority::High,
            category: "reminder".to_string(),
            ..Self::new(description)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub due: Option<NaiveDateTime>,
    pub priority: Priority,
    pub category: String,
    pub recurring: Option<Recurrence>,
}

impl Task {
    pub fn is_reminder(&self) -> bool {
        self.category == "reminder"
    }
}

pub trait TaskStore: Send + Sync {
    fn add_task(&self, task: NewTask) -> CollabResult<TaskId>;
    fn list_pending(&self) -> CollabResult<Vec<Task>>;
    fn complete(&self, id: TaskId) -> CollabResult<()>;
    fn delete(&self, id: TaskId) -> CollabResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub content: String,
    pub copied_at: NaiveDateTime,
}

/// Clipboard history, newest first.
pub trait ClipboardStore: Send + Sync {
    fn history(&self, limit: usize) -> CollabResult<Vec<ClipboardEntry>>;
    /// Put history item `index` (1-based, newest first) back on the clipboard.
    fn restore(&self, index: usize) -> CollabResult<ClipboardEntry>;
    fn clear(&self) -> CollabResult<()>;
}

/// Outcome of organizing one directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizeStats {
    pub total_files: usize,
    pub organized_files: usize,
    pub skipped_files: usize,
    pub errors: usize,
    /// Files moved per category.
    pub per_category: BTreeMap<String, usize>,
}

pub trait FileOrganizer: Send + Sync {
    fn organize_directory(&self, path: &Path) -> CollabResult<OrganizeStats>;
    fn move_path(&self, source: &Path, destination: &Path) -> CollabResult<()>;
    fn delete_path(&self, path: &Path) -> CollabResult<()>;
    fn rename_path(&self, path: &Path, new_name: &str) -> CollabResult<()>;
    fn create_folder(&self, path: &Path) -> CollabResult<()>;
}

pub trait ActivityLog: Send + Sync {
    fn daily_summary(&self) -> CollabResult<String>;
}

pub trait ListeningControl: Send + Sync {
    fn start_listening(&self);
    fn stop_listening(&self);
}

/// Fire-and-forget speech output.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Speech sink that only logs what would have been said.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSpeech;

impl SpeechSink for LoggingSpeech {
    fn speak(&self, text: &str) {
        info!(%text, "speak");
    }
}

/// Activity log for hosts without activity tracking.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoActivity;

impl ActivityLog for NoActivity {
    fn daily_summary(&self) -> CollabResult<String> {
        Err(CollabError::Unsupported("activity tracking"))
    }
}

/// Listening control for hosts without a voice listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoListener;

impl ListeningControl for NoListener {
    fn start_listening(&self) {}
    fn stop_listening(&self) {}
}

/// Every collaborator a [`HandlerSet`](crate::handlers::HandlerSet) needs.
#[derive(Clone)]
pub struct Collaborators {
    pub process: Arc<dyn ProcessControl>,
    pub system: Arc<dyn SystemControl>,
    pub tasks: Arc<dyn TaskStore>,
    pub clipboard: Arc<dyn ClipboardStore>,
    pub files: Arc<dyn FileOrganizer>,
    pub activity: Arc<dyn ActivityLog>,
    pub listening: Arc<dyn ListeningControl>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Collaborators that work on any platform: spawned processes, in-memory
    /// task and clipboard stores, and a filesystem organizer rooted at
    /// `base_dir`. Volume, power and activity tracking report unsupported.
    pub fn portable(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            process: Arc::new(SpawnProcessControl),
            system: Arc::new(UnsupportedSystem),
            tasks: Arc::new(InMemoryTaskStore::new()),
            clipboard: Arc::new(InMemoryClipboard::default()),
            files: Arc::new(DirectoryOrganizer::new(base_dir)),
            activity: Arc::new(NoActivity),
            listening: Arc::new(NoListener),
            clock: Arc::new(SystemClock),
        }
    }
}
