//! Entity extraction from command text
//!
//! Classifier-routed commands arrive without capture groups, so handlers
//! pull their parameters (times, numbers, app names, paths) out of the raw
//! text here instead.

use regex::Regex;

use crate::types::{Entity, EntityKind};

/// Extract entities from user input
pub struct EntityExtractor {
    patterns: Vec<(Regex, EntityKind)>,
}

impl EntityExtractor {
    pub fn new() -> Self {
        // Static patterns; compiling them cannot fail
        let patterns = vec![
            // Quoted paths/files
            (Regex::new(r#""([^"]+)""#).expect("Invalid regex pattern"), EntityKind::Path),
            (Regex::new(r"'([^']+)'").expect("Invalid regex pattern"), EntityKind::Path),
            // Relative and clock times (must come before plain numbers)
            (
                Regex::new(r"(?i)\b(in\s+(?:\d+|an?)\s+(?:minutes?|mins?|hours?|hrs?|days?))\b")
                    .expect("Invalid regex pattern"),
                EntityKind::Time,
            ),
            (
                Regex::new(r"(?i)\b(\d{1,2}:\d{2}(?:\s*(?:am|pm))?|\d{1,2}\s*(?:am|pm))\b")
                    .expect("Invalid regex pattern"),
                EntityKind::Time,
            ),
            // App after a launch verb
            (
                Regex::new(r"(?i)\b(?:open|launch|start|close|quit)\s+([a-z][\w .-]*?)(?:\s+(?:and|then|for|to)\b|$)")
                    .expect("Invalid regex pattern"),
                EntityKind::App,
            ),
            // Search query
            (
                Regex::new(r"(?i)\b(?:search|look up|google)\s+(?:for\s+)?(.+)$").expect("Invalid regex pattern"),
                EntityKind::Query,
            ),
            // Plain numbers
            (Regex::new(r"\b(\d+)\b").expect("Invalid regex pattern"), EntityKind::Number),
        ];

        Self { patterns }
    }

    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let mut entities: Vec<Entity> = Vec::new();

        for (pattern, kind) in &self.patterns {
            for cap in pattern.captures_iter(text) {
                let (Some(matched), Some(value)) = (cap.get(0), cap.get(1)) else {
                    continue;
                };
                let start = matched.start();
                let end = matched.end();

                // Skip spans already claimed by an earlier pattern (e.g. the
                // "30" inside "in 30 minutes")
                if entities.iter().any(|e| start < e.end && e.start < end) {
                    continue;
                }

                entities.push(Entity::new(
                    *kind,
                    value.as_str().trim().to_string(),
                    matched.as_str().to_string(),
                    start,
                    end,
                ));
            }
        }

        entities.sort_by_key(|e| e.start);
        entities
    }

    /// First entity of `kind`.
    pub fn first(&self, text: &str, kind: EntityKind) -> Option<Entity> {
        self.extract(text).into_iter().find(|e| e.kind == kind)
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// `text` with `entity`'s span cut out and whitespace collapsed.
pub fn without_span(text: &str, entity: &Entity) -> String {
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..entity.start]);
    out.push(' ');
    out.push_str(&text[entity.end..]);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip the first matching leading phrase and any trailing connective.
pub fn strip_phrases(text: &str, leading: &[&str]) -> String {
    let mut rest = text.trim();
    for phrase in leading {
        if let Some(stripped) = rest.strip_prefix(phrase) {
            rest = stripped.trim_start();
            break;
        }
    }
    for connective in [" at", " in", " on", " by", " due"] {
        if let Some(stripped) = rest.strip_suffix(connective) {
            rest = stripped;
            break;
        }
    }
    rest.trim().to_string()
}
