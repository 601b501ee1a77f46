//! Response phrasing
//!
//! Fixed categories of reply (didn't catch that, unrecognized, apology, ...)
//! each have a small set of phrasings. Which one is used is up to the
//! [`ResponseProvider`]; tests use [`FixedResponses`] so output is stable.

use rand::seq::SliceRandom;

/// Reply categories chosen by the dispatcher and conversational handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCategory {
    DidntCatch,
    Unrecognized,
    HandlerFailure,
    Greeting,
    Thanks,
}

pub const DIDNT_CATCH_RESPONSES: &[&str] = &["I didn't catch that. Could you please repeat?"];

pub const UNRECOGNIZED_RESPONSES: &[&str] = &[
    "I'm not sure I understand that command. Could you rephrase it?",
    "I didn't quite catch that. Could you try saying it differently?",
    "I'm still learning that command. Could you be more specific?",
    "That's a new one for me. Could you explain what you'd like me to do?",
];

/// `{reason}` is replaced with the failure message.
pub const HANDLER_FAILURE_RESPONSES: &[&str] = &[
    "I'm sorry, I ran into a problem with that: {reason}",
    "Apologies, {user}, that didn't work: {reason}",
];

pub const GREETING_RESPONSES: &[&str] = &[
    "Hello! How may I assist you today?",
    "Good to see you! What can I do for you?",
    "At your service, {user}. What do you need?",
    "Hello there! Ready to be productive?",
];

pub const THANKS_RESPONSES: &[&str] = &[
    "You're most welcome, {user}.",
    "My pleasure to assist.",
    "Always at your service.",
    "Happy to help!",
];

impl ResponseCategory {
    pub fn phrasings(&self) -> &'static [&'static str] {
        match self {
            ResponseCategory::DidntCatch => DIDNT_CATCH_RESPONSES,
            ResponseCategory::Unrecognized => UNRECOGNIZED_RESPONSES,
            ResponseCategory::HandlerFailure => HANDLER_FAILURE_RESPONSES,
            ResponseCategory::Greeting => GREETING_RESPONSES,
            ResponseCategory::Thanks => THANKS_RESPONSES,
        }
    }
}

/// Picks a phrasing for a category.
pub trait ResponseProvider: Send + Sync {
    /// Raw template for `category`; may contain `{user}` and `{reason}`.
    fn template(&self, category: ResponseCategory) -> &'static str;

    /// Form of address substituted for `{user}`.
    fn user_name(&self) -> &str;

    fn render(&self, category: ResponseCategory) -> String {
        self.template(category).replace("{user}", self.user_name())
    }

    fn render_failure(&self, reason: &str) -> String {
        self.render(ResponseCategory::HandlerFailure)
            .replace("{reason}", reason)
    }
}

/// Chooses uniformly among phrasings.
#[derive(Debug, Clone)]
pub struct RandomResponses {
    user_name: String,
}

impl RandomResponses {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }
}

impl ResponseProvider for RandomResponses {
    fn template(&self, category: ResponseCategory) -> &'static str {
        let phrasings = category.phrasings();
        phrasings
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(phrasings[0])
    }

    fn user_name(&self) -> &str {
        &self.user_name
    }
}

/// Always the first phrasing of each category.
#[derive(Debug, Clone)]
pub struct FixedResponses {
    user_name: String,
}

impl FixedResponses {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }
}

impl Default for FixedResponses {
    fn default() -> Self {
        Self::new("sir")
    }
}

impl ResponseProvider for FixedResponses {
    fn template(&self, category: ResponseCategory) -> &'static str {
        category.phrasings()[0]
    }

    fn user_name(&self) -> &str {
        &self.user_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_stays_in_category() {
        let provider = RandomResponses::new("sir");
        for _ in 0..20 {
            let reply = provider.render(ResponseCategory::Unrecognized);
            assert!(UNRECOGNIZED_RESPONSES.contains(&reply.as_str()));
        }
    }

    #[test]
    fn test_user_substitution() {
        let provider = FixedResponses::new("Ada");
        assert_eq!(provider.render(ResponseCategory::Thanks), "You're most welcome, Ada.");
    }

    #[test]
    fn test_failure_reason() {
        let provider = FixedResponses::default();
        let reply = provider.render_failure("file not found");
        assert!(reply.starts_with("I'm sorry"));
        assert!(reply.ends_with("file not found"));
    }
}
