//! In-process task and clipboard stores.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use parking_lot::Mutex;

use super::{ClipboardEntry, ClipboardStore, CollabResult, NewTask, Task, TaskId, TaskStore};
use crate::error::CollabError;

#[derive(Debug, Default)]
struct TaskTable {
    next_id: TaskId,
    pending: Vec<Task>,
}

/// Pending tasks kept in memory; completed and deleted tasks are dropped.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    inner: Mutex<TaskTable>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn add_task(&self, task: NewTask) -> CollabResult<TaskId> {
        let mut table = self.inner.lock();
        table.next_id += 1;
        let id = table.next_id;
        table.pending.push(Task {
            id,
            description: task.description,
            due: task.due,
            priority: task.priority,
            category: task.category,
            recurring: task.recurring,
        });
        Ok(id)
    }

    fn list_pending(&self) -> CollabResult<Vec<Task>> {
        let mut pending = self.inner.lock().pending.clone();
        // Dated tasks first, soonest first; undated keep insertion order
        pending.sort_by_key(|t| (t.due.is_none(), t.due));
        Ok(pending)
    }

    fn complete(&self, id: TaskId) -> CollabResult<()> {
        self.delete(id)
    }

    fn delete(&self, id: TaskId) -> CollabResult<()> {
        let mut table = self.inner.lock();
        let before = table.pending.len();
        table.pending.retain(|t| t.id != id);
        if table.pending.len() == before {
            return Err(CollabError::NotFound(format!("task {id}")));
        }
        Ok(())
    }
}

/// Bounded clipboard history, newest first.
#[derive(Debug)]
pub struct InMemoryClipboard {
    capacity: usize,
    entries: Mutex<VecDeque<ClipboardEntry>>,
    current: Mutex<Option<String>>,
}

impl InMemoryClipboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
            current: Mutex::new(None),
        }
    }

    /// Record a copy. Consecutive duplicates are ignored.
    ///
    /// A new copy supersedes any earlier restore.
    pub fn record(&self, content: impl Into<String>, copied_at: NaiveDateTime) {
        let content = content.into();
        self.current.lock().take();
        let mut entries = self.entries.lock();
        if entries.front().is_some_and(|e| e.content == content) {
            return;
        }
        entries.push_front(ClipboardEntry { content, copied_at });
        entries.truncate(self.capacity);
    }

    /// Content most recently restored or recorded.
    pub fn current(&self) -> Option<String> {
        self.current
            .lock()
            .clone()
            .or_else(|| self.entries.lock().front().map(|e| e.content.clone()))
    }
}

impl Default for InMemoryClipboard {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ClipboardStore for InMemoryClipboard {
    fn history(&self, limit: usize) -> CollabResult<Vec<ClipboardEntry>> {
        Ok(self.entries.lock().iter().take(limit).cloned().collect())
    }

    fn restore(&self, index: usize) -> CollabResult<ClipboardEntry> {
        let entry = index
            .checked_sub(1)
            .and_then(|i| self.entries.lock().get(i).cloned())
            .ok_or_else(|| CollabError::NotFound(format!("clipboard item {index}")))?;
        *self.current.lock() = Some(entry.content.clone());
        Ok(entry)
    }

    fn clear(&self) -> CollabResult<()> {
        self.entries.lock().clear();
        *self.current.lock() = None;
        Ok(())
    }
}
