//! [`WindowManager`] implementation backed by Hyprland IPC.
//!
//! Communicates directly with Hyprland through its Unix socket at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`,
//! without shelling out to `hyprctl`.

use crate::traits::WindowManager;
use crate::window::{Client, Monitor, Workspace};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Hyprland-backed window manager.
///
/// Each method call opens a short-lived IPC request; no connection is kept.
#[derive(Debug, Default)]
pub struct HyprlandWm;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandWmError(String);

impl HyprlandWm {
    pub fn new() -> Self {
        Self
    }
}

//  Direct Hyprland IPC helpers

/// Resolve the Hyprland command socket path.
///
/// Hyprland ≥ 0.40 stores its sockets at
/// `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket.sock`.
fn socket_path() -> Result<PathBuf, HyprlandWmError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandWmError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandWmError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(runtime_dir)
        .join("hypr")
        .join(his)
        .join(".socket.sock"))
}

/// Send a raw request to the command socket and return the response.
fn ipc_request(request: &str) -> Result<String, HyprlandWmError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandWmError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(request.as_bytes())
        .map_err(|e| HyprlandWmError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandWmError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandWmError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and deserialize the answer.
fn ipc_json<T: DeserializeOwned>(query: &str) -> Result<T, HyprlandWmError> {
    let json = ipc_request(&format!("j/{}", query))?;
    serde_json::from_str(&json).map_err(|e| HyprlandWmError(format!("parse {}: {}", query, e)))
}

/// Hyprland answers every successful dispatch with exactly `ok`.
fn check_dispatch_response(response: &str) -> Result<(), HyprlandWmError> {
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandWmError(format!("dispatch error: {}", response.trim())))
    }
}

//  WindowManager implementation

impl WindowManager for HyprlandWm {
    type Error = HyprlandWmError;

    fn clients(&self) -> Result<Vec<Client>, Self::Error> {
        ipc_json("clients")
    }

    fn workspaces(&self) -> Result<Vec<Workspace>, Self::Error> {
        ipc_json("workspaces")
    }

    fn active_window(&self) -> Result<Option<Client>, Self::Error> {
        // Hyprland returns an empty object `{}` when no window is focused.
        let value: Value = ipc_json("activewindow")?;
        Ok(Client::from_value(value).filter(|c| !c.is_empty()))
    }

    fn monitors(&self) -> Result<Vec<Monitor>, Self::Error> {
        ipc_json("monitors")
    }

    fn dispatch(&self, dispatcher: &str, args: &str) -> Result<(), Self::Error> {
        debug!("dispatch {} {}", dispatcher, args);
        let response = ipc_request(&format!("/dispatch {} {}", dispatcher, args))?;
        check_dispatch_response(&response)
    }
}
