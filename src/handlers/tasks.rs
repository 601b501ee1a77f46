//! Task and reminder handlers.

use chrono::NaiveDateTime;

use super::{parse_count, HandlerContext, HandlerResult, HandlerSet};
use crate::collab::{NewTask, Priority, Recurrence, Task};
use crate::entities::{strip_phrases, without_span};
use crate::error::{CollabError, HandlerError};
use crate::timeparse::parse_time;
use crate::types::EntityKind;

const REMINDER_LEADS: &[&str] = &[
    "remind me to",
    "remind me",
    "set a reminder to",
    "set reminder to",
    "set a reminder for",
    "set a reminder",
    "reminder to",
];

const TASK_LEADS: &[&str] = &[
    "add a task to",
    "add a task",
    "add task",
    "create a task to",
    "create a task",
    "create task",
    "new task",
    "add",
];

const RECURRENCE_PHRASES: &[(&str, Recurrence)] = &[
    ("every day", Recurrence::Daily),
    ("everyday", Recurrence::Daily),
    ("daily", Recurrence::Daily),
    ("every week", Recurrence::Weekly),
    ("weekly", Recurrence::Weekly),
    ("every month", Recurrence::Monthly),
    ("monthly", Recurrence::Monthly),
];

const PRIORITY_PHRASES: &[(&str, Priority)] = &[
    ("high priority", Priority::High),
    ("urgent", Priority::High),
    ("important", Priority::High),
    ("medium priority", Priority::Medium),
    ("normal priority", Priority::Medium),
    ("low priority", Priority::Low),
];

/// Tasks shown in a listing.
const LIST_LIMIT: usize = 5;

/// `text` with every occurrence of `phrases` removed and whitespace collapsed.
fn remove_phrases<'p>(text: &str, phrases: impl IntoIterator<Item = &'p str>) -> String {
    let mut out = format!(" {text} ");
    for phrase in phrases {
        out = out.replace(&format!(" {phrase} "), " ");
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "at 05:00 PM", "tomorrow at 05:00 PM" or "on Monday, March 18 at 05:00 PM".
fn describe_due(due: NaiveDateTime, now: NaiveDateTime) -> String {
    let clock = due.format("%I:%M %p");
    if due.date() == now.date() {
        format!("at {clock}")
    } else if Some(due.date()) == now.date().succ_opt() {
        format!("tomorrow at {clock}")
    } else {
        format!("on {} at {clock}", due.format("%A, %B %d"))
    }
}

fn priority_name(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high",
        Priority::Medium => "medium",
        Priority::Low => "low",
    }
}

fn recurrence_phrase(recurrence: Recurrence) -> &'static str {
    match recurrence {
        Recurrence::Daily => "every day",
        Recurrence::Weekly => "every week",
        Recurrence::Monthly => "every month",
    }
}

impl HandlerSet {
    /// Description and optional time expression from the command text.
    fn split_time(&self, ctx: &HandlerContext<'_>, leads: &[&str]) -> (String, Option<String>) {
        match self.entity(ctx, EntityKind::Time) {
            Some(time) => {
                let rest = without_span(ctx.normalized, &time);
                (strip_phrases(&rest, leads), Some(time.value))
            }
            None => (strip_phrases(ctx.normalized, leads), None),
        }
    }

    fn now(&self) -> NaiveDateTime {
        self.collab.clock.now()
    }

    /// Pending task by id or by (case-insensitive) description fragment.
    fn find_task(&self, reference: &str) -> Result<Task, HandlerError> {
        let pending = self.collab.tasks.list_pending()?;
        let reference = reference.trim().to_lowercase();
        let found = match parse_count(&reference) {
            Some(id) => pending.into_iter().find(|t| t.id == id),
            None => pending
                .into_iter()
                .find(|t| t.description.to_lowercase().contains(&reference)),
        };
        found.ok_or_else(|| CollabError::NotFound(format!("task '{reference}'")).into())
    }

    pub(super) fn set_reminder(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let (task, time) = match (ctx.named("task"), ctx.named("time")) {
            (Some(task), time) => (task.to_string(), time.map(str::to_string)),
            _ => self.split_time(ctx, REMINDER_LEADS),
        };
        if task.is_empty() {
            return Err(HandlerError::MissingParameter("reminder description"));
        }

        let now = self.now();
        let due = parse_time(time.as_deref().unwrap_or_default(), now);
        self.collab.tasks.add_task(NewTask::reminder(task.clone(), due))?;
        Ok(format!("I'll remind you to {task} {}.", describe_due(due, now)))
    }

    pub(super) fn set_recurring_reminder(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let recurrence = RECURRENCE_PHRASES
            .iter()
            .find(|(phrase, _)| ctx.normalized.contains(phrase))
            .map_or(Recurrence::Daily, |(_, r)| *r);

        let (text, time) = self.split_time(ctx, REMINDER_LEADS);
        let task = remove_phrases(&text, RECURRENCE_PHRASES.iter().map(|(p, _)| *p));
        if task.is_empty() {
            return Err(HandlerError::MissingParameter("reminder description"));
        }

        let now = self.now();
        let due = parse_time(time.as_deref().unwrap_or_default(), now);
        self.collab.tasks.add_task(NewTask {
            recurring: Some(recurrence),
            ..NewTask::reminder(task.clone(), due)
        })?;
        Ok(format!(
            "I'll remind you to {task} {}, starting {}.",
            recurrence_phrase(recurrence),
            describe_due(due, now)
        ))
    }

    pub(super) fn add_task(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let task = match ctx.group(1) {
            Some(task) => task.to_string(),
            None => strip_phrases(ctx.normalized, TASK_LEADS),
        };
        if task.is_empty() {
            return Err(HandlerError::MissingParameter("task description"));
        }
        self.collab.tasks.add_task(NewTask::new(task.clone()))?;
        Ok(format!("Task added: {task}"))
    }

    pub(super) fn add_task_due(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let (task, time) = self.split_time(ctx, TASK_LEADS);
        if task.is_empty() {
            return Err(HandlerError::MissingParameter("task description"));
        }
        let now = self.now();
        let due = parse_time(time.as_deref().unwrap_or_default(), now);
        self.collab.tasks.add_task(NewTask {
            due: Some(due),
            ..NewTask::new(task.clone())
        })?;
        Ok(format!("Task added: {task}, due {}.", describe_due(due, now)))
    }

    pub(super) fn add_task_priority(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let priority = PRIORITY_PHRASES
            .iter()
            .find(|(phrase, _)| ctx.normalized.contains(phrase))
            .map_or(Priority::Medium, |(_, p)| *p);

        let text = remove_phrases(ctx.normalized, PRIORITY_PHRASES.iter().map(|(p, _)| *p));
        let task = strip_phrases(&text, TASK_LEADS);
        if task.is_empty() {
            return Err(HandlerError::MissingParameter("task description"));
        }
        self.collab.tasks.add_task(NewTask {
            priority,
            ..NewTask::new(task.clone())
        })?;
        Ok(format!("Added {} priority task: {task}", priority_name(priority)))
    }

    pub(super) fn show_tasks(&self) -> HandlerResult {
        let tasks = self.collab.tasks.list_pending()?;
        if tasks.is_empty() {
            return Ok("You have no pending tasks. Well done!".to_string());
        }
        let lines: Vec<String> = tasks
            .iter()
            .take(LIST_LIMIT)
            .map(|t| format!("- {}", t.description))
            .collect();
        let mut reply = format!("Your pending tasks:\n{}", lines.join("\n"));
        if tasks.len() > LIST_LIMIT {
            reply.push_str(&format!("\n...and {} more.", tasks.len() - LIST_LIMIT));
        }
        Ok(reply)
    }

    pub(super) fn list_reminders(&self) -> HandlerResult {
        let now = self.now();
        let reminders: Vec<String> = self
            .collab
            .tasks
            .list_pending()?
            .into_iter()
            .filter(Task::is_reminder)
            .take(LIST_LIMIT)
            .map(|t| match t.due {
                Some(due) => format!("- {} {}", t.description, describe_due(due, now)),
                None => format!("- {}", t.description),
            })
            .collect();
        if reminders.is_empty() {
            return Ok("You have no reminders set.".to_string());
        }
        Ok(format!("Your reminders:\n{}", reminders.join("\n")))
    }

    pub(super) fn complete_task(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let reference = match ctx.group(1) {
            Some(r) => r.to_string(),
            None => self
                .entity(ctx, EntityKind::Number)
                .map(|e| e.value)
                .ok_or(HandlerError::MissingParameter("task"))?,
        };
        let task = self.find_task(&reference)?;
        self.collab.tasks.complete(task.id)?;
        Ok(format!("Marked task as complete: {}", task.description))
    }

    pub(super) fn delete_task(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let reference = match self.entity(ctx, EntityKind::Number) {
            Some(number) => number.value,
            None => strip_phrases(
                ctx.normalized,
                &["delete the task", "delete task", "remove task", "delete reminder", "cancel reminder"],
            ),
        };
        if reference.is_empty() {
            return Err(HandlerError::MissingParameter("task"));
        }
        let task = self.find_task(&reference)?;
        self.collab.tasks.delete(task.id)?;
        Ok(format!("Deleted task: {}", task.description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_describe_due() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap().and_hms_opt(18, 0, 0).unwrap();
        assert_eq!(describe_due(now + Duration::hours(1), now), "at 07:00 PM");
        assert_eq!(describe_due(now + Duration::hours(15), now), "tomorrow at 09:00 AM");
        assert_eq!(describe_due(now + Duration::days(4), now), "on Monday, March 18 at 06:00 PM");
    }

    #[test]
    fn test_remove_phrases() {
        assert_eq!(
            remove_phrases("add high priority task ship it", ["high priority"]),
            "add task ship it"
        );
        assert_eq!(remove_phrases("water plants daily", ["daily"]), "water plants");
    }
}
