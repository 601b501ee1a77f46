//! Process control by spawning executables.

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ahash::AHashMap;
use tracing::{debug, info, warn};

use super::{CollabResult, ProcessControl, SystemControl};
use crate::error::CollabError;

/// Spoken app names and the executable each one starts.
pub const KNOWN_APPS: &[(&str, &str)] = &[
    ("chrome", "chrome.exe"),
    ("google chrome", "chrome.exe"),
    ("firefox", "firefox.exe"),
    ("mozilla", "firefox.exe"),
    ("edge", "msedge.exe"),
    ("microsoft edge", "msedge.exe"),
    ("notepad", "notepad.exe"),
    ("text editor", "notepad.exe"),
    ("calculator", "calc.exe"),
    ("calc", "calc.exe"),
    ("file explorer", "explorer.exe"),
    ("explorer", "explorer.exe"),
    ("task manager", "taskmgr.exe"),
    ("control panel", "control.exe"),
    ("settings", "ms-settings:"),
    ("word", "winword.exe"),
    ("ms word", "winword.exe"),
    ("excel", "excel.exe"),
    ("ms excel", "excel.exe"),
    ("powerpoint", "powerpnt.exe"),
    ("ppt", "powerpnt.exe"),
    ("outlook", "outlook.exe"),
    ("email", "outlook.exe"),
    ("teams", "teams.exe"),
    ("microsoft teams", "teams.exe"),
    ("skype", "skype.exe"),
    ("discord", "discord.exe"),
    ("spotify", "spotify.exe"),
    ("music player", "spotify.exe"),
    ("steam", "steam.exe"),
    ("vlc", "vlc.exe"),
    ("photoshop", "photoshop.exe"),
    ("vs code", "code.exe"),
    ("vscode", "code.exe"),
    ("code editor", "code.exe"),
    ("visual studio code", "code.exe"),
    ("visual studio", "devenv.exe"),
];

/// Alias table: spoken name → executable.
#[derive(Debug, Clone)]
pub struct AppTable {
    entries: AHashMap<String, String>,
}

impl AppTable {
    /// Built-in aliases overlaid with `overrides`.
    pub fn new<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut entries: AHashMap<String, String> = KNOWN_APPS
            .iter()
            .map(|(name, exe)| (name.to_string(), exe.to_string()))
            .collect();
        for (name, exe) in overrides {
            entries.insert(name.trim().to_lowercase(), exe.clone());
        }
        Self { entries }
    }

    /// Executable for `name`, or `name` itself when unknown.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries
            .get(name.trim().to_lowercase().as_str())
            .map(String::as_str)
            .unwrap_or(name.trim())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name.trim().to_lowercase().as_str())
    }
}

impl Default for AppTable {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

/// Wait for `child` on a detached thread so it is reaped when it exits.
fn reap(mut child: Child) -> io::Result<JoinHandle<Option<ExitStatus>>> {
    let pid = child.id();
    thread::Builder::new().name(format!("butler-reap-{pid}")).spawn(move || match child.wait() {
        Ok(status) => {
            debug!(pid, %status, "launched process exited");
            Some(status)
        }
        Err(e) => {
            debug!(pid, error = %e, "could not wait on launched process");
            None
        }
    })
}

/// Launches executables directly and terminates them by image name.
#[derive(Debug, Clone, Default)]
pub struct SpawnProcessControl;

impl ProcessControl for SpawnProcessControl {
    fn launch(&self, target: &str, args: &[String]) -> CollabResult<()> {
        let result = if cfg!(windows) {
            // `start` resolves App Paths and URI schemes such as ms-settings:
            Command::new("cmd")
                .args(["/C", "start", "", target])
                .args(args)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
        } else {
            Command::new(target)
                .args(args)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
        };

        match result {
            Ok(child) => {
                if let Err(e) = reap(child) {
                    warn!(target, error = %e, "launched process will not be reaped");
                }
                info!(target, "launched");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CollabError::NotFound(target.to_string())),
            Err(e) => Err(CollabError::failed(format!("launching {target}"), e)),
        }
    }

    fn terminate(&self, target: &str) -> CollabResult<()> {
        let output = if cfg!(windows) {
            let image = if target.ends_with(".exe") {
                target.to_string()
            } else {
                format!("{target}.exe")
            };
            Command::new("taskkill").args(["/F", "/IM", &image]).output()?
        } else {
            let name = target.trim_end_matches(".exe");
            Command::new("pkill").args(["-x", name]).output()?
        };

        if output.status.success() {
            info!(target, "terminated");
            Ok(())
        } else {
            let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(target, %reason, "terminate failed");
            Err(CollabError::NotFound(format!("running process {target}")))
        }
    }

    fn minimize(&self, _target: &str) -> CollabResult<()> {
        Err(CollabError::Unsupported("window management"))
    }
}

/// System control for hosts that have not wired one up.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSystem;

impl SystemControl for UnsupportedSystem {
    fn set_volume(&self, _level: u8) -> CollabResult<()> {
        Err(CollabError::Unsupported("volume control"))
    }

    fn volume_up(&self) -> CollabResult<()> {
        Err(CollabError::Unsupported("volume control"))
    }

    fn volume_down(&self) -> CollabResult<()> {
        Err(CollabError::Unsupported("volume control"))
    }

    fn set_muted(&self, _muted: bool) -> CollabResult<()> {
        Err(CollabError::Unsupported("volume control"))
    }

    fn shutdown(&self, _after: Duration) -> CollabResult<()> {
        Err(CollabError::Unsupported("power control"))
    }

    fn restart(&self, _after: Duration) -> CollabResult<()> {
        Err(CollabError::Unsupported("power control"))
    }

    fn lock(&self) -> CollabResult<()> {
        Err(CollabError::Unsupported("power control"))
    }

    fn sleep(&self) -> CollabResult<()> {
        Err(CollabError::Unsupported("power control"))
    }

    fn mute_notifications(&self, _duration: Option<Duration>) -> CollabResult<()> {
        Err(CollabError::Unsupported("notification control"))
    }

    fn enable_notifications(&self) -> CollabResult<()> {
        Err(CollabError::Unsupported("notification control"))
    }

    fn performance_summary(&self) -> CollabResult<String> {
        Err(CollabError::Unsupported("system monitoring"))
    }

    fn battery_summary(&self) -> CollabResult<String> {
        Err(CollabError::Unsupported("battery monitoring"))
    }

    fn network_summary(&self) -> CollabResult<String> {
        Err(CollabError::Unsupported("network monitoring"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_table_resolution() {
        let overrides = [("Notepad".to_string(), "notepad++.exe".to_string())];
        let table = AppTable::new(overrides.iter().map(|(k, v)| (k, v)));

        assert_eq!(table.resolve("chrome"), "chrome.exe");
        assert_eq!(table.resolve("notepad"), "notepad++.exe");
        assert_eq!(table.resolve(" gimp "), "gimp");
        assert!(table.contains("Google Chrome"));
    }

    #[cfg(unix)]
    #[test]
    fn test_launched_child_is_waited_on() {
        let child = Command::new("true").spawn().unwrap();
        let status = reap(child).unwrap().join().unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_missing_executable() {
        let err = SpawnProcessControl.launch("butler-no-such-program", &[]).unwrap_err();
        assert!(matches!(err, CollabError::NotFound(_)));
    }
}
