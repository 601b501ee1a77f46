//! Ordered table of pattern rules
//!
//! Position is the only priority: the matcher walks the rules in the order
//! they were registered and the first structural match wins.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::types::Intent;

/// One regular expression bound to one intent.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub pattern: String,
    pub regex: Regex,
    pub intent: Intent,
}

impl PatternRule {
    pub fn new(pattern: &str, intent: Intent) -> Result<Self, RegistryError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RegistryError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            intent,
        })
    }
}

/// A rule declared in configuration, bound by intent label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub intent: String,
}

impl RuleSpec {
    pub fn compile(&self) -> Result<PatternRule, RegistryError> {
        let intent = Intent::from_label(&self.intent)
            .ok_or_else(|| RegistryError::UnknownIntent(self.intent.clone()))?;
        PatternRule::new(&self.pattern, intent)
    }
}

/// Built-in rules in evaluation order.
///
/// Task rules come first so the text of a reminder or task ("remind me to
/// open the garage at 5 pm") is not taken as a command of its own. Listening
/// controls precede the generic `start X` app rule, and the named app rules
/// precede `open X` so "open notepad" reaches `open_notepad`.
const BUILTIN_RULES: &[(&str, Intent)] = &[
    // Tasks
    (
        r"remind\s+me\s+(?:to\s+)?(?P<task>.*?)\s+(?:at\s+)?(?P<time>in\s+\d+\s+\w+|\d{1,2}(?::\d{2})?\s*(?:am|pm)?)$",
        Intent::SetReminder,
    ),
    (r"add\s+task\s+(.*?)$", Intent::AddTask),
    (r"(?:what\s+are\s+my|show\s+my|list\s+my)\s+(?:pending\s+)?tasks?", Intent::ShowTasks),
    (r"(?:what\s+are\s+my|show\s+my|list\s+my)\s+reminders?", Intent::ListReminders),
    (r"mark\s+task\s+(.*?)\s+(?:as\s+)?(?:done|complete)", Intent::CompleteTask),
    // Butler control
    (r"start\s+listening", Intent::StartListening),
    (r"stop\s+listening", Intent::StopListening),
    (r"wake\s+up", Intent::WakeUp),
    (r"(?:hello|hi|hey)\s+(?:nexa|butler)", Intent::Greeting),
    (r"\b(?:thank\s+you|thanks)\b", Intent::ThankYou),
    // Named applications
    (r"open\s+(chrome|google chrome)\b", Intent::OpenChrome),
    (r"open\s+(firefox|mozilla)\b", Intent::OpenFirefox),
    (r"open\s+(edge|microsoft edge)\b", Intent::OpenEdge),
    (r"open\s+(notepad|text editor)\b", Intent::OpenNotepad),
    (r"open\s+(calculator|calc)\b", Intent::OpenCalculator),
    (r"open\s+(file explorer|explorer)\b", Intent::OpenExplorer),
    (r"open\s+(task manager)\b", Intent::OpenTaskManager),
    (r"open\s+(word|ms word)\b", Intent::OpenWord),
    (r"open\s+(excel|ms excel)\b", Intent::OpenExcel),
    (r"open\s+(powerpoint|ppt)\b", Intent::OpenPowerPoint),
    (r"open\s+(outlook|email)\b", Intent::OpenOutlook),
    (r"open\s+(teams|microsoft teams)\b", Intent::OpenTeams),
    (r"open\s+(vscode|vs code|code editor)\b", Intent::OpenVsCode),
    (r"open\s+(spotify|music player)\b", Intent::OpenSpotify),
    (r"open\s+(steam)\b", Intent::OpenSteam),
    (r"open\s+(discord)\b", Intent::OpenDiscord),
    // Generic application control
    (r"open\s+(.*?)(?:\s+browser|\s+app|\s+application)?$", Intent::OpenApplication),
    (r"launch\s+(.*?)$", Intent::OpenApplication),
    (r"^start\s+(.*?)$", Intent::OpenApplication),
    (r"close\s+(.*?)$", Intent::CloseApplication),
    (r"quit\s+(.*?)$", Intent::CloseApplication),
    (r"minimize\s+(.*?)$", Intent::MinimizeApplication),
    // Power
    (r"shutdown\s+(?:in\s+)?(\d+)\s+minutes?", Intent::ScheduleShutdown),
    (r"shutdown\s+now", Intent::ShutdownNow),
    (r"restart\s+(?:in\s+)?(\d+)\s+minutes?", Intent::ScheduleRestart),
    (r"restart\s+now", Intent::RestartNow),
    (r"lock\s+(?:the\s+)?(?:computer|pc|laptop)", Intent::LockComputer),
    (r"sleep\s+(?:the\s+)?(?:computer|pc|laptop)", Intent::SleepComputer),
    // Volume
    (r"(?:set\s+)?volume\s+(?:to\s+)?(\d+)(?:%)?", Intent::SetVolume),
    (r"(?:turn\s+)?volume\s+up", Intent::VolumeUp),
    (r"(?:turn\s+)?volume\s+down", Intent::VolumeDown),
    (r"unmute\s+(?:the\s+)?(?:volume|sound|audio)", Intent::UnmuteVolume),
    (r"mute\s+(?:the\s+)?(?:volume|sound|audio)", Intent::MuteVolume),
    // Notifications
    (r"mute\s+(?:all\s+)?notifications?\s+for\s+(\d+)\s+minutes?", Intent::MuteNotifications),
    (r"(?:turn\s+off|disable)\s+notifications?", Intent::DisableNotifications),
    (r"(?:turn\s+on|enable)\s+notifications?", Intent::EnableNotifications),
    // Files
    (r"organize\s+(?:my\s+)?(downloads?|desktop)", Intent::OrganizeFiles),
    (r"clean\s+up\s+(?:my\s+)?(downloads?|desktop)", Intent::OrganizeFiles),
    (r"move\s+(.*?)\s+to\s+(.*?)$", Intent::MoveFile),
    (r"delete\s+(.*?)$", Intent::DeleteFile),
    (r"rename\s+(.*?)\s+to\s+(.*?)$", Intent::RenameFile),
    (r"create\s+folder\s+(.*?)$", Intent::CreateFolder),
    // Information
    (r"what\s+time\s+is\s+it", Intent::GetTime),
    (r"what\s+(?:day|date)\s+is\s+(?:it|today)", Intent::GetDate),
    (r"(?:show\s+me\s+)?(?:my\s+)?(?:daily\s+)?(?:productivity\s+)?summary", Intent::DailySummary),
    (r"clear\s+clipboard\s+history", Intent::ClearClipboardHistory),
    (r"(?:show\s+me\s+)?(?:my\s+)?clipboard\s+history", Intent::ClipboardHistory),
    (r"paste\s+(?:from\s+)?(?:clipboard\s+)?(?:item\s+)?(\d+)", Intent::PasteFromHistory),
    // System status
    (r"(?:how\s+is\s+)?(?:my\s+)?(?:system|computer|pc|laptop)\s+(?:doing|performance)", Intent::SystemStatus),
    (r"(?:what\s+is\s+)?(?:my\s+)?(?:battery|power)\s+(?:level|status)", Intent::BatteryStatus),
    (r"(?:what\s+is\s+)?(?:my\s+)?(?:wifi|internet)\s+(?:status|connection)", Intent::WifiStatus),
    // Butler sleep
    (r"(?:go\s+to\s+)?sleep", Intent::ButlerSleep),
];

/// Ordered, immutable list of rules.
#[derive(Debug, Clone, Default)]
pub struct IntentRegistry {
    rules: Vec<PatternRule>,
}

impl IntentRegistry {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// The built-in command table.
    pub fn builtin() -> Result<Self, RegistryError> {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(pattern, intent)| PatternRule::new(pattern, *intent))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Custom rules evaluated ahead of the built-in table.
    pub fn with_custom(custom: &[RuleSpec]) -> Result<Self, RegistryError> {
        let mut rules = custom
            .iter()
            .map(RuleSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        rules.extend(Self::builtin()?.rules);
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule routes to `intent`.
    pub fn routes_to(&self, intent: Intent) -> bool {
        self.rules.iter().any(|rule| rule.intent == intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_compiles() {
        let registry = IntentRegistry::builtin().unwrap();
        assert_eq!(registry.len(), BUILTIN_RULES.len());
        assert!(registry.routes_to(Intent::OpenNotepad));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PatternRule::new(r"open\s+(", Intent::OpenApplication).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPattern { .. }));
    }

    #[test]
    fn test_custom_rules_go_first() {
        let custom = vec![RuleSpec {
            pattern: r"open my coding setup".to_string(),
            intent: "open_vscode".to_string(),
        }];
        let registry = IntentRegistry::with_custom(&custom).unwrap();
        assert_eq!(registry.rules()[0].intent, Intent::OpenVsCode);
        assert_eq!(registry.len(), BUILTIN_RULES.len() + 1);
    }

    #[test]
    fn test_custom_rule_unknown_intent() {
        let custom = vec![RuleSpec {
            pattern: "do a backflip".to_string(),
            intent: "backflip".to_string(),
        }];
        assert!(matches!(
            IntentRegistry::with_custom(&custom),
            Err(RegistryError::UnknownIntent(label)) if label == "backflip"
        ));
    }
}
