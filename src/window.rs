//! Snapshots of live window-manager state.
//!
//! [`Client`] is kept as the raw attribute map the window manager reports,
//! because match rules may name any attribute (`class`, `initialTitle`,
//! `workspace.name`, ...).  [`Workspace`] and [`Monitor`] are the small typed
//! subsets the rest of the crate actually reads.

use serde::Deserialize;
use serde_json::{Map, Value};

/// A single window as reported by the window manager.
///
/// Read-only; fetched at most once per invocation through
/// [`ClientCache`](crate::clients::ClientCache).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Client(Map<String, Value>);

impl Client {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// Build a client from a JSON value.  Returns `None` unless `value` is an
    /// object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// All attributes, keyed by the window manager's field names.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0
    }

    /// `true` when the window manager reported no attributes at all (Hyprland
    /// answers `{}` for `activewindow` when nothing is focused).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn address(&self) -> Option<&str> {
        self.0.get("address").and_then(Value::as_str)
    }

    /// Name of the workspace the window currently lives on.
    pub fn workspace_name(&self) -> Option<&str> {
        self.0
            .get("workspace")
            .and_then(|ws| ws.get("name"))
            .and_then(Value::as_str)
    }
}

/// Subset of a workspace entry returned by `j/workspaces`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
}

/// Subset of a monitor entry returned by `j/monitors`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Monitor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub focused: bool,
}
