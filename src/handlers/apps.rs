//! Application launch, close and minimize, plus the multi-app routines.

use std::time::Duration;

use tracing::{debug, info};

use super::{HandlerContext, HandlerResult, HandlerSet};
use crate::error::{CollabError, HandlerError};
use crate::types::{EntityKind, Intent};

const FOCUS_MUTE: Duration = Duration::from_secs(60 * 60);

/// Spoken product name for a named-app intent.
fn display_name(intent: Intent) -> &'static str {
    match intent {
        Intent::OpenChrome => "Chrome",
        Intent::OpenFirefox => "Firefox",
        Intent::OpenEdge => "Microsoft Edge",
        Intent::OpenNotepad => "Notepad",
        Intent::OpenCalculator => "Calculator",
        Intent::OpenExplorer => "File Explorer",
        Intent::OpenTaskManager => "Task Manager",
        Intent::OpenWord => "Microsoft Word",
        Intent::OpenExcel => "Microsoft Excel",
        Intent::OpenPowerPoint => "Microsoft PowerPoint",
        Intent::OpenOutlook => "Microsoft Outlook",
        Intent::OpenTeams => "Microsoft Teams",
        Intent::OpenVsCode => "Visual Studio Code",
        Intent::OpenSpotify => "Spotify",
        Intent::OpenSteam => "Steam",
        Intent::OpenDiscord => "Discord",
        _ => "that application",
    }
}

impl HandlerSet {
    fn launch_app(&self, name: &str) -> Result<(), HandlerError> {
        let target = self.apps.resolve(name);
        self.collab.process.launch(target, &[])?;
        info!(app = name, target, "application launched");
        Ok(())
    }

    fn app_name(&self, ctx: &HandlerContext<'_>) -> Result<String, HandlerError> {
        self.param(ctx, 1, EntityKind::App)
            .map(|name| name.trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|name| !name.is_empty())
            .ok_or(HandlerError::MissingParameter("application name"))
    }

    pub(super) fn open_named_app(&self, intent: Intent) -> HandlerResult {
        let alias = intent.app().ok_or(HandlerError::MissingParameter("application name"))?;
        self.launch_app(alias)?;
        Ok(format!("Opening {} for you.", display_name(intent)))
    }

    pub(super) fn open_application(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let name = self.app_name(ctx)?;
        self.launch_app(&name)?;
        Ok(format!("Opening {name} now."))
    }

    pub(super) fn close_application(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let name = self.app_name(ctx)?;
        self.collab.process.terminate(self.apps.resolve(&name))?;
        Ok(format!("Closing {name}."))
    }

    pub(super) fn minimize_application(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let name = self.app_name(ctx)?;
        self.collab.process.minimize(self.apps.resolve(&name))?;
        Ok(format!("Minimizing {name}."))
    }

    pub(super) fn open_and_search(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        self.launch_app("chrome")?;
        match self.entity(ctx, EntityKind::Query) {
            Some(query) => Ok(format!("Opening Chrome. You can search for {} in the browser.", query.value)),
            None => Ok("Opening Chrome. You can search for your query in the browser.".to_string()),
        }
    }

    pub(super) fn focus_mode(&self) -> HandlerResult {
        self.launch_app("spotify")?;
        self.collab.system.mute_notifications(Some(FOCUS_MUTE))?;
        Ok("Focus mode activated. I've opened Spotify for focus music and muted notifications for an hour."
            .to_string())
    }

    pub(super) fn gaming_mode(&self) -> HandlerResult {
        self.launch_app("steam")?;
        self.launch_app("discord")?;
        self.collab.system.mute_notifications(None)?;
        Ok("Gaming mode activated. Steam and Discord are starting, and notifications are off.".to_string())
    }

    pub(super) fn morning_routine(&self) -> HandlerResult {
        for app in ["chrome", "outlook", "teams"] {
            self.launch_app(app)?;
        }
        Ok("Morning routine started! I've opened Chrome, Outlook, and Teams.".to_string())
    }

    pub(super) fn evening_routine(&self) -> HandlerResult {
        for app in ["outlook", "teams"] {
            match self.collab.process.terminate(self.apps.resolve(app)) {
                Ok(()) => {}
                // Not running is fine at the end of the day
                Err(CollabError::NotFound(what)) => debug!(app, %what, "not running"),
                Err(e) => return Err(e.into()),
            }
        }
        let pending = self.collab.tasks.list_pending()?.len();
        let tasks = match pending {
            0 => "no pending tasks".to_string(),
            1 => "1 pending task".to_string(),
            n => format!("{n} pending tasks"),
        };
        Ok(format!(
            "Evening routine complete. I've closed Outlook and Teams. You have {tasks} for tomorrow."
        ))
    }
}
