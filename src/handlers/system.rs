//! Power, volume, notification and status handlers.

use std::time::Duration;

use super::{parse_count, HandlerContext, HandlerResult, HandlerSet};
use crate::error::HandlerError;
use crate::types::EntityKind;

const MAX_VOLUME: u64 = 100;

/// Longest delay accepted for shutdown, restart and notification muting.
const MAX_MINUTES: u64 = 7 * 24 * 60;

impl HandlerSet {
    /// Captured minute count, or a corrective reply when it is unusable.
    fn minutes(&self, ctx: &HandlerContext<'_>) -> Result<Result<u64, String>, HandlerError> {
        let raw = self
            .param(ctx, 1, EntityKind::Number)
            .ok_or(HandlerError::MissingParameter("number of minutes"))?;
        Ok(match parse_count(&raw) {
            Some(minutes) if minutes <= MAX_MINUTES => Ok(minutes),
            _ => Err(format!(
                "I can only schedule that between 0 and {MAX_MINUTES} minutes from now."
            )),
        })
    }

    pub(super) fn schedule_shutdown(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let minutes = match self.minutes(ctx)? {
            Ok(m) => m,
            Err(correction) => return Ok(correction),
        };
        self.collab.system.shutdown(Duration::from_secs(minutes * 60))?;
        Ok(format!("System will shutdown in {minutes} minutes."))
    }

    pub(super) fn shutdown_now(&self) -> HandlerResult {
        self.collab.system.shutdown(Duration::ZERO)?;
        Ok("Shutting down the system now.".to_string())
    }

    pub(super) fn schedule_restart(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let minutes = match self.minutes(ctx)? {
            Ok(m) => m,
            Err(correction) => return Ok(correction),
        };
        self.collab.system.restart(Duration::from_secs(minutes * 60))?;
        Ok(format!("System will restart in {minutes} minutes."))
    }

    pub(super) fn restart_now(&self) -> HandlerResult {
        self.collab.system.restart(Duration::ZERO)?;
        Ok("Restarting the system now.".to_string())
    }

    pub(super) fn lock_computer(&self) -> HandlerResult {
        self.collab.system.lock()?;
        Ok("Locking the computer.".to_string())
    }

    pub(super) fn sleep_computer(&self) -> HandlerResult {
        self.collab.system.sleep()?;
        Ok("Putting the computer to sleep.".to_string())
    }

    pub(super) fn set_volume(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let raw = self
            .param(ctx, 1, EntityKind::Number)
            .ok_or(HandlerError::MissingParameter("volume level"))?;
        let Some(level) = parse_count(&raw) else {
            return Ok("Volume must be a number between 0 and 100.".to_string());
        };
        let level = level.min(MAX_VOLUME) as u8;
        self.collab.system.set_volume(level)?;
        Ok(format!("Setting volume to {level}%."))
    }

    pub(super) fn volume_up(&self) -> HandlerResult {
        self.collab.system.volume_up()?;
        Ok("Turning volume up.".to_string())
    }

    pub(super) fn volume_down(&self) -> HandlerResult {
        self.collab.system.volume_down()?;
        Ok("Turning volume down.".to_string())
    }

    pub(super) fn mute_volume(&self) -> HandlerResult {
        self.collab.system.set_muted(true)?;
        Ok("Muting the volume.".to_string())
    }

    pub(super) fn unmute_volume(&self) -> HandlerResult {
        self.collab.system.set_muted(false)?;
        Ok("Unmuting the volume.".to_string())
    }

    pub(super) fn mute_notifications(&self, ctx: &HandlerContext<'_>) -> HandlerResult {
        let minutes = match self.minutes(ctx)? {
            Ok(m) => m,
            Err(correction) => return Ok(correction),
        };
        self.collab
            .system
            .mute_notifications(Some(Duration::from_secs(minutes * 60)))?;
        Ok(format!("Muting all notifications for {minutes} minutes."))
    }

    pub(super) fn disable_notifications(&self) -> HandlerResult {
        self.collab.system.mute_notifications(None)?;
        Ok("Disabling notifications.".to_string())
    }

    pub(super) fn enable_notifications(&self) -> HandlerResult {
        self.collab.system.enable_notifications()?;
        Ok("Enabling notifications.".to_string())
    }

    pub(super) fn system_status(&self) -> HandlerResult {
        Ok(self.collab.system.performance_summary()?)
    }

    pub(super) fn battery_status(&self) -> HandlerResult {
        Ok(self.collab.system.battery_summary()?)
    }

    pub(super) fn wifi_status(&self) -> HandlerResult {
        Ok(self.collab.system.network_summary()?)
    }
}
