//! Clock, clipboard, summary and butler-control handlers.

use super::{parse_count, HandlerContext, HandlerResult, HandlerSet};
use crate::error::HandlerError;
use crate::types::EntityKind;

/// Clipboard items shown in a listing.
const CLIPBOARD_LIST_LIMIT: usize = 5;

/// Characters of each clipboard item shown in a listing.
const PREVIEW_CHARS: usize = 50;

fn preview(content: &str) -> String {
    let single_line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() > PREVIEW_CHARS {
        let cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        single_line
    }
}

impl HandlerSet {
    pub(super) fn start_listening(&self) -> HandlerResult {
        self.collab.listening.start_listening();
        Ok("I'm listening again.".to_string())
    }

    pub(super) fn stop_listening(&self) -> HandlerResult {
        self.collab.listening.stop_listening();
        Ok("I'll stop listening now. Say \"wake up\" when you need me.".to_string())
    }

    pub(super) fn wake_up(&self) -> HandlerResult {
        self.collab.listening.start_listening();
        Ok("I'm awake and ready to assist!".to_string())
    }

    pub(super) fn butler_sleep(&self) -> HandlerResult {
        self.collab.listening.stop_listening();
        Ok("Going to sleep mode. Call my name to wake me up.".to_string())
    }

    pub(super) fn get_time(&self) -> HandlerResult {
        Ok(format!("It's {}.", self.collab.clock.now().format("%I:%M %p")))
    }

    pub(super) fn get_date(&self) -> HandlerResult {
        Ok(format!("Today is {}.", self.collab.clock.now().format("%A, %B %d, %Y")))
    }

    pub(super) fn daily_summary(&self) -> HandlerResult {
        Ok(self.collab.activity.daily_summary()?)
    }

    pub(super) fn clipboard_history(&self) -> HandlerResult {
        let history = self.collab.clipboard.history(CLIPBOARD_LIST_LIMIT)?;
        if history.is_empty() {
            return Ok("Your clipboard history is empty.".to_string());
        }
        let items: Vec<String> = history
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{}. {}", i + 1, preview(&entry.content)))
            .collect();
        Ok(format!("Recent clipboard items:\n{}", items.join("\n")))
    }

    pub(super) fn paste_from_history(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let raw = self
            .param(ctx, 1, EntityKind::Number)
            .ok_or(HandlerError::MissingParameter("clipboard item number"))?;
        let index = match parse_count(&raw).and_then(|n| usize::try_from(n).ok()) {
            Some(n) if n >= 1 => n,
            _ => return Ok("Clipboard items are numbered from 1. Say \"clipboard history\" to see them.".to_string()),
        };
        self.collab.clipboard.restore(index)?;
        Ok(format!("Pasting clipboard item {index}."))
    }

    pub(super) fn clear_clipboard_history(&self) -> HandlerResult {
        self.collab.clipboard.clear()?;
        Ok("Clipboard history cleared.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_items() {
        assert_eq!(preview("short\ntext"), "short text");
        let long = "x".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(50)));
    }
}
