//! Local process discovery.
//!
//! The control API's port and credentials are only published on the client
//! process's command line. [`ProcessLocator`] is the seam the connection
//! manager uses to read them; [`SystemProcessLocator`] is the OS-backed
//! implementation.
//!
//! | Platform | Source |
//! |----------|--------|
//! | Linux | `/proc/<pid>/comm` and `/proc/<pid>/cmdline` |
//! | Windows | `Win32_Process` via PowerShell |
//! | Other Unix | `ps -A -ww -o args=` |
//!
//! Process names compare case-insensitively with any `.exe` suffix removed,
//! so a client running under Wine is found on Linux.

// ============================================================================
// Submodules
// ============================================================================

/// Command-line argument parsing.
pub mod cmdline;

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tracing::{debug, trace};

pub use cmdline::CommandLineArgs;

// ============================================================================
// ProcessLocator
// ============================================================================

/// Finds a named process and reads its command line.
#[async_trait]
pub trait ProcessLocator: Send + Sync {
    /// Returns `true` if a process with this name is running.
    async fn is_running(&self, name: &str) -> bool;

    /// Returns the parsed command line of the first matching process.
    async fn command_line(&self, name: &str) -> Option<CommandLineArgs>;
}

// ============================================================================
// SystemProcessLocator
// ============================================================================

/// [`ProcessLocator`] backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessLocator;

impl SystemProcessLocator {
    /// Creates a locator.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLocator for SystemProcessLocator {
    async fn is_running(&self, name: &str) -> bool {
        let running = platform::find(name).await.is_some();
        trace!(name, running, "Process lookup");
        running
    }

    async fn command_line(&self, name: &str) -> Option<CommandLineArgs> {
        let args = platform::find(name).await?;
        debug!(name, options = args.len(), "Read process command line");
        Some(args)
    }
}

/// Compares a process name against the wanted one.
fn name_matches(candidate: &str, wanted: &str) -> bool {
    let strip = |s: &str| {
        let s = s.trim();
        s.strip_suffix(".exe")
            .or_else(|| s.strip_suffix(".EXE"))
            .unwrap_or(s)
            .to_ascii_lowercase()
    };
    strip(candidate) == strip(wanted)
}

/// Returns the file name component of an executable path.
fn executable_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

// ============================================================================
// Platform: Linux
// ============================================================================

#[cfg(target_os = "linux")]
mod platform {
    use super::{CommandLineArgs, executable_name, name_matches};

    /// Scans `/proc` for the first process whose name matches.
    pub(super) async fn find(name: &str) -> Option<CommandLineArgs> {
        let mut entries = tokio::fs::read_dir("/proc").await.ok()?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            let file_name = entry.file_name();
            let Some(pid) = file_name.to_str() else {
                continue;
            };
            if !pid.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            let Ok(raw) = tokio::fs::read(entry.path().join("cmdline")).await else {
                continue;
            };
            let argv: Vec<String> = raw
                .split(|b| *b == 0)
                .filter(|part| !part.is_empty())
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect();

            let comm = tokio::fs::read_to_string(entry.path().join("comm"))
                .await
                .unwrap_or_default();

            let by_comm = name_matches(&comm, name);
            let by_argv = argv
                .first()
                .is_some_and(|exe| name_matches(executable_name(exe), name));

            if by_comm || by_argv {
                return Some(CommandLineArgs::from_tokens(argv));
            }
        }

        None
    }
}

// ============================================================================
// Platform: Windows
// ============================================================================

#[cfg(windows)]
mod platform {
    use std::process::Stdio;

    use tokio::process::Command;

    use super::CommandLineArgs;

    /// Queries `Win32_Process` for the process command line.
    pub(super) async fn find(name: &str) -> Option<CommandLineArgs> {
        let image = if name.to_ascii_lowercase().ends_with(".exe") {
            name.to_string()
        } else {
            format!("{name}.exe")
        };
        let image = image.replace('\'', "''");
        let script = format!(
            "Get-CimInstance Win32_Process -Filter \"Name = '{image}'\" | \
             Select-Object -First 1 -ExpandProperty CommandLine"
        );

        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", &script])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;

        let line = String::from_utf8_lossy(&output.stdout);
        let line = line.trim();
        if !output.status.success() || line.is_empty() {
            return None;
        }

        Some(CommandLineArgs::parse(line))
    }
}

// ============================================================================
// Platform: Other Unix
// ============================================================================

#[cfg(all(unix, not(target_os = "linux")))]
mod platform {
    use std::process::Stdio;

    use tokio::process::Command;

    use super::{CommandLineArgs, cmdline::tokenize, executable_name, name_matches};

    /// Scans `ps` output for the first matching process.
    pub(super) async fn find(name: &str) -> Option<CommandLineArgs> {
        let output = Command::new("ps")
            .args(["-A", "-ww", "-o", "args="])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;

        let listing = String::from_utf8_lossy(&output.stdout);
        listing
            .lines()
            .map(tokenize)
            .find(|tokens| {
                tokens
                    .first()
                    .is_some_and(|exe| name_matches(executable_name(exe), name))
            })
            .map(CommandLineArgs::from_tokens)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches() {
        assert!(name_matches("LeagueClientUx", "LeagueClientUx"));
        assert!(name_matches("LeagueClientUx.exe", "LeagueClientUx"));
        assert!(name_matches("leagueclientux\n", "LeagueClientUx"));
        assert!(!name_matches("LeagueClient", "LeagueClientUx"));
    }

    #[test]
    fn test_executable_name() {
        assert_eq!(
            executable_name("C:\\Riot Games\\League of Legends\\LeagueClientUx.exe"),
            "LeagueClientUx.exe"
        );
        assert_eq!(executable_name("/usr/bin/ls"), "ls");
        assert_eq!(executable_name("ls"), "ls");
    }

    #[tokio::test]
    async fn test_missing_process_is_not_running() {
        let locator = SystemProcessLocator::new();
        assert!(!locator.is_running("definitely-not-a-real-process-4821").await);
        assert!(
            locator
                .command_line("definitely-not-a-real-process-4821")
                .await
                .is_none()
        );
    }
}
