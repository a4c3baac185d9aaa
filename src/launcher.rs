//! Detached process launching.
//!
//! Applications are started through a configurable prefix (by default
//! `app2unit --`, which wraps each app in its own systemd scope) in a new
//! process group, so they survive the short-lived hyprtoggle process.

use crate::traits::Launcher;
use log::debug;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

/// Why an app could not be launched.
///
/// Never fatal to a toggle run: the entry's spawn step is skipped and the
/// remaining steps and entries still run.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("{0:?} is neither a desktop entry nor an executable on $PATH")]
    Unresolvable(String),
    #[error("empty command")]
    Empty,
    #[error("failed to spawn {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build a [`Command`] for `argv` that runs in its own process group with
/// stdin closed.  Callers decide what to do with stdout/stderr.
pub fn detached_command(argv: &[String]) -> Result<Command, SpawnError> {
    let (program, args) = argv.split_first().ok_or(SpawnError::Empty)?;
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).process_group(0);
    Ok(cmd)
}

/// Spawn `argv` detached with all stdio discarded, without waiting for it.
pub fn spawn_quiet(argv: &[String]) -> Result<(), SpawnError> {
    let mut cmd = detached_command(argv)?;
    cmd.stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
        .map_err(|source| SpawnError::Io {
            program: argv[0].clone(),
            source,
        })
}

/// [`Launcher`] that prefixes every command with a wrapper such as
/// `app2unit --`.
#[derive(Debug, Clone)]
pub struct AppLauncher {
    prefix: Vec<String>,
}

impl Default for AppLauncher {
    fn default() -> Self {
        Self::new(vec!["app2unit".into(), "--".into()])
    }
}

impl AppLauncher {
    /// `prefix` may be empty to exec commands directly.
    pub fn new(prefix: Vec<String>) -> Self {
        Self { prefix }
    }

    /// The full argv that will be executed for `command`.
    pub fn argv_for(&self, command: &[String]) -> Vec<String> {
        self.prefix.iter().chain(command).cloned().collect()
    }
}

impl Launcher for AppLauncher {
    fn is_resolvable(&self, program: &str) -> bool {
        program.ends_with(".desktop") || which::which(program).is_ok()
    }

    fn spawn_detached(&self, argv: &[String]) -> Result<(), SpawnError> {
        if argv.is_empty() {
            return Err(SpawnError::Empty);
        }
        let full = self.argv_for(argv);
        debug!("spawning {:?}", full);
        spawn_quiet(&full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn prefix_is_prepended() {
        let launcher = AppLauncher::default();
        assert_eq!(
            launcher.argv_for(&argv(&["spicetify", "watch", "-s"])),
            ["app2unit", "--", "spicetify", "watch", "-s"]
        );
        let direct = AppLauncher::new(Vec::new());
        assert_eq!(direct.argv_for(&argv(&["todoist"])), ["todoist"]);
    }

    #[test]
    fn desktop_entries_are_always_resolvable() {
        let launcher = AppLauncher::default();
        assert!(launcher.is_resolvable("org.telegram.desktop.desktop"));
    }

    #[test]
    fn path_lookup_decides_binaries() {
        let launcher = AppLauncher::default();
        assert!(launcher.is_resolvable("sh"));
        assert!(!launcher.is_resolvable("definitely-not-installed-hyprtoggle-app"));
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            AppLauncher::default().spawn_detached(&[]),
            Err(SpawnError::Empty)
        ));
        assert!(matches!(detached_command(&[]), Err(SpawnError::Empty)));
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let err = spawn_quiet(&argv(&["/nonexistent/hyprtoggle-test-bin"])).unwrap_err();
        assert!(matches!(err, SpawnError::Io { ref program, .. } if program == "/nonexistent/hyprtoggle-test-bin"));
    }

    #[test]
    fn spawn_does_not_wait() {
        let start = std::time::Instant::now();
        spawn_quiet(&argv(&["sh", "-c", "sleep 2"])).unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }
}
