//! Toggling "whatever special workspace is relevant right now".
//!
//! Used for the reserved group id [`SPECIAL_WS_GROUP`].  No app entries are
//! evaluated; exactly one `togglespecialworkspace` is dispatched.

use crate::traits::WindowManager;
use log::debug;

/// Group id that selects this mode instead of a configured toggle group.
pub const SPECIAL_WS_GROUP: &str = "specialws";

/// Prefix Hyprland puts in front of special workspace names.
pub const SPECIAL_PREFIX: &str = "special:";

/// The plain special workspace (`special:special`), and the fallback target.
pub const DEFAULT_SPECIAL: &str = "special";

/// Strip the special-workspace prefix from a workspace name.
pub fn special_name(workspace: &str) -> Option<&str> {
    workspace.strip_prefix(SPECIAL_PREFIX)
}

/// Decide which special workspace to toggle:
///
/// 1. `special` if `special:special` currently exists;
/// 2. otherwise the special workspace the active window is on;
/// 3. otherwise `special`.
pub fn resolve_target<W: WindowManager>(wm: &W) -> Result<String, W::Error> {
    let plain = format!("{}{}", SPECIAL_PREFIX, DEFAULT_SPECIAL);
    if wm.workspaces()?.iter().any(|ws| ws.name == plain) {
        debug!("{} is open", plain);
        return Ok(DEFAULT_SPECIAL.to_string());
    }

    let active = wm.active_window()?;
    let target = active
        .as_ref()
        .and_then(|w| w.workspace_name())
        .and_then(special_name)
        .unwrap_or(DEFAULT_SPECIAL);
    debug!("special workspace target: {}", target);
    Ok(target.to_string())
}

/// Resolve the target and toggle it.  Returns the toggled name.
pub fn toggle_active<W: WindowManager>(wm: &W) -> Result<String, W::Error> {
    let target = resolve_target(wm)?;
    wm.dispatch("togglespecialworkspace", &target)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Client, Monitor, Workspace};
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct StaticWm {
        workspaces: Vec<&'static str>,
        active_ws: Option<&'static str>,
        dispatches: RefCell<Vec<(String, String)>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("static wm error")]
    struct StaticErr;

    impl WindowManager for StaticWm {
        type Error = StaticErr;

        fn clients(&self) -> Result<Vec<Client>, StaticErr> {
            panic!("resolver must not look at clients")
        }

        fn workspaces(&self) -> Result<Vec<Workspace>, StaticErr> {
            Ok(self
                .workspaces
                .iter()
                .enumerate()
                .map(|(i, name)| Workspace {
                    id: i as i64,
                    name: name.to_string(),
                })
                .collect())
        }

        fn active_window(&self) -> Result<Option<Client>, StaticErr> {
            Ok(self.active_ws.map(|name| {
                Client::from_value(json!({
                    "address": "0xa",
                    "workspace": { "id": -90, "name": name }
                }))
                .unwrap()
            }))
        }

        fn monitors(&self) -> Result<Vec<Monitor>, StaticErr> {
            Ok(Vec::new())
        }

        fn dispatch(&self, dispatcher: &str, args: &str) -> Result<(), StaticErr> {
            self.dispatches
                .borrow_mut()
                .push((dispatcher.into(), args.into()));
            Ok(())
        }
    }

    #[test]
    fn open_plain_special_wins() {
        let wm = StaticWm {
            workspaces: vec!["1", "special:special", "special:sysmon"],
            active_ws: Some("special:sysmon"),
            ..Default::default()
        };
        assert_eq!(toggle_active(&wm).unwrap(), "special");
    }

    #[test]
    fn active_special_workspace_is_unwrapped() {
        let wm = StaticWm {
            workspaces: vec!["1", "special:sysmon"],
            active_ws: Some("special:sysmon"),
            ..Default::default()
        };
        assert_eq!(toggle_active(&wm).unwrap(), "sysmon");
        assert_eq!(
            wm.dispatches.borrow().as_slice(),
            [("togglespecialworkspace".to_string(), "sysmon".to_string())]
        );
    }

    #[test]
    fn regular_workspace_falls_back_to_special() {
        let wm = StaticWm {
            workspaces: vec!["1", "2"],
            active_ws: Some("2"),
            ..Default::default()
        };
        assert_eq!(resolve_target(&wm).unwrap(), "special");
    }

    #[test]
    fn no_active_window_falls_back_to_special() {
        let wm = StaticWm {
            workspaces: vec!["1"],
            ..Default::default()
        };
        assert_eq!(toggle_active(&wm).unwrap(), "special");
        assert_eq!(wm.dispatches.borrow().len(), 1);
    }

    #[test]
    fn prefix_only_strips_special() {
        assert_eq!(special_name("special:music"), Some("music"));
        assert_eq!(special_name("special:"), Some(""));
        assert_eq!(special_name("music"), None);
    }
}
