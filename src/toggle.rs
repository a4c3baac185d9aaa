//! The toggle orchestrator.
//!
//! [`Toggler`] owns the window manager, the launcher and the configuration,
//! and turns a toggle-group id into window-manager commands:
//!
//! 1. for every enabled app of the group, in order:
//!    * spawn its command if no known window matches it,
//!    * if `move` is set, pull every matching window that is not already on
//!      `special:<group>` onto it (silently, by address);
//! 2. toggle `special:<group>`, always, exactly once.
//!
//! Every step is derived from live state, so repeated runs issue no
//! redundant spawns or moves.

use crate::clients::ClientCache;
use crate::config::{AppEntry, ConfigError, ConfigStore};
use crate::launcher::SpawnError;
use crate::matcher::matches_any;
use crate::special::{self, SPECIAL_PREFIX, SPECIAL_WS_GROUP};
use crate::traits::{Launcher, WindowManager};
use log::{debug, info, warn};

/// Errors that abort a toggle run.
#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The window manager returned an error.
    #[error("window manager error: {0}")]
    WindowManager(String),
}

fn wm_error(e: impl std::error::Error) -> ToggleError {
    ToggleError::WindowManager(e.to_string())
}

/// What happened to an app's spawn step.
#[derive(Debug)]
pub enum SpawnOutcome {
    /// A matching window already exists.
    Present,
    /// The command was launched.
    Spawned,
    /// Launching was skipped or failed; the run continued.
    Failed(SpawnError),
}

/// Per-app record of a run.
#[derive(Debug)]
pub struct AppReport {
    pub name: String,
    /// `None` when the app has no command.
    pub spawn: Option<SpawnOutcome>,
    /// Addresses successfully moved to the special workspace.
    pub moved: Vec<String>,
    /// Addresses whose move dispatch failed.
    pub failed_moves: Vec<String>,
}

/// Summary of one [`Toggler::run`].
#[derive(Debug)]
pub struct ToggleReport {
    /// The special workspace that was toggled (without `special:`).
    pub workspace: String,
    pub apps: Vec<AppReport>,
}

impl ToggleReport {
    /// Names of apps whose command was launched.
    pub fn spawned(&self) -> Vec<&str> {
        self.apps
            .iter()
            .filter(|app| matches!(app.spawn, Some(SpawnOutcome::Spawned)))
            .map(|app| app.name.as_str())
            .collect()
    }

    /// All addresses moved during the run.
    pub fn moved(&self) -> Vec<&str> {
        self.apps
            .iter()
            .flat_map(|app| app.moved.iter().map(String::as_str))
            .collect()
    }
}

/// Orchestrates spawning, moving and toggling for toggle groups.
///
/// Generic over any [`WindowManager`] and [`Launcher`], so it has no
/// knowledge of Hyprland or `app2unit`.
///
/// ```ignore
/// let toggler = Toggler::new(HyprlandWm::new(), AppLauncher::default(), store);
/// toggler.run("music")?;
/// ```
pub struct Toggler<W: WindowManager, L: Launcher> {
    wm: W,
    launcher: L,
    config: ConfigStore,
}

impl<W: WindowManager, L: Launcher> Toggler<W, L> {
    pub fn new(wm: W, launcher: L, config: ConfigStore) -> Self {
        Self {
            wm,
            launcher,
            config,
        }
    }

    /// Toggle `group`.  The reserved id [`SPECIAL_WS_GROUP`] toggles the
    /// currently relevant special workspace instead.
    pub fn run(&self, group: &str) -> Result<ToggleReport, ToggleError> {
        if group == SPECIAL_WS_GROUP {
            let workspace = special::toggle_active(&self.wm).map_err(wm_error)?;
            info!("toggled special workspace {}", workspace);
            return Ok(ToggleReport {
                workspace,
                apps: Vec::new(),
            });
        }

        let effective = self.config.effective(group)?;
        let target = format!("{}{}", SPECIAL_PREFIX, group);
        let mut clients = ClientCache::new(&self.wm);
        let mut apps = Vec::new();

        for (name, app) in effective.enabled_apps() {
            debug!("processing {}", name);
            let mut report = AppReport {
                name: name.to_string(),
                spawn: None,
                moved: Vec::new(),
                failed_moves: Vec::new(),
            };

            if let Some(command) = app.spawn_command() {
                let outcome = self.spawn_if_missing(&mut clients, app, command)?;
                if let SpawnOutcome::Failed(e) = &outcome {
                    warn!("{}: not spawned: {}", name, e);
                }
                report.spawn = Some(outcome);
            }

            if app.move_to_workspace {
                self.move_strays(&mut clients, app, &target, &mut report)?;
            }

            apps.push(report);
        }

        self.wm
            .dispatch("togglespecialworkspace", group)
            .map_err(wm_error)?;
        info!("toggled {}", target);

        Ok(ToggleReport {
            workspace: group.to_string(),
            apps,
        })
    }

    fn spawn_if_missing(
        &self,
        clients: &mut ClientCache<'_, W>,
        app: &AppEntry,
        command: &[String],
    ) -> Result<SpawnOutcome, ToggleError> {
        if !self.launcher.is_resolvable(&command[0]) {
            return Ok(SpawnOutcome::Failed(SpawnError::Unresolvable(
                command[0].clone(),
            )));
        }

        let present = clients
            .clients()
            .map_err(wm_error)?
            .iter()
            .any(|c| matches_any(c, &app.rules));
        if present {
            debug!("{:?} already running", command[0]);
            return Ok(SpawnOutcome::Present);
        }

        Ok(match self.launcher.spawn_detached(command) {
            Ok(()) => {
                info!("spawned {:?}", command);
                SpawnOutcome::Spawned
            }
            Err(e) => SpawnOutcome::Failed(e),
        })
    }

    fn move_strays(
        &self,
        clients: &mut ClientCache<'_, W>,
        app: &AppEntry,
        target: &str,
        report: &mut AppReport,
    ) -> Result<(), ToggleError> {
        let clients = clients.clients().map_err(wm_error)?;
        for client in clients.iter().filter(|c| matches_any(c, &app.rules)) {
            if client.workspace_name() == Some(target) {
                continue;
            }
            let Some(address) = client.address() else {
                warn!("{}: matching window has no address", report.name);
                continue;
            };
            let args = format!("{},address:{}", target, address);
            match self.wm.dispatch("movetoworkspacesilent", &args) {
                Ok(()) => {
                    debug!("moved {} to {}", address, target);
                    report.moved.push(address.to_string());
                }
                Err(e) => {
                    warn!("{}: moving {} failed: {}", report.name, address, e);
                    report.failed_moves.push(address.to_string());
                }
            }
        }
        Ok(())
    }
}
