//! Rule matcher - first-match-wins evaluation of the intent registry

use std::sync::Arc;

use tracing::trace;

use crate::registry::IntentRegistry;
use crate::types::{Intent, MatchResult};

/// Walks the registry in order against normalized command text.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    registry: Arc<IntentRegistry>,
}

impl RuleMatcher {
    pub fn new(registry: Arc<IntentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    /// Match normalized input against the rules.
    ///
    /// Returns the intent of the first rule whose pattern is found anywhere
    /// in `text`, with its captured groups. Later rules are never consulted
    /// once one matches, even if they would capture more.
    pub fn match_text(&self, text: &str) -> Option<(Intent, MatchResult)> {
        if text.trim().is_empty() {
            return None;
        }

        for (index, rule) in self.registry.rules().iter().enumerate() {
            if let Some(caps) = rule.regex.captures(text) {
                trace!(index, intent = %rule.intent, pattern = %rule.pattern, "rule matched");
                return Some((
                    rule.intent,
                    MatchResult::from_captures(&rule.pattern, &rule.regex, &caps),
                ));
            }
        }

        None
    }
}
