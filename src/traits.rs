//! Core traits that decouple hyprtoggle from any specific window manager or
//! process-launching mechanism.
//!
//! The [`Toggler`](crate::toggle::Toggler) and the special-workspace resolver
//! only depend on these abstractions; Hyprland and `app2unit` live behind
//! them in [`hyprland`](crate::hyprland) and [`launcher`](crate::launcher).

use crate::launcher::SpawnError;
use crate::window::{Client, Monitor, Workspace};

/// Abstraction over a window manager that can be queried for its live state
/// and told to do things.
///
/// Queries are synchronous round-trips.  Dispatches are imperative commands
/// whose only observable result is the absence of a transport error.
pub trait WindowManager {
    /// The error type produced by this window manager.
    type Error: std::error::Error + Send + 'static;

    /// All windows, in the order the window manager reports them.
    fn clients(&self) -> Result<Vec<Client>, Self::Error>;

    /// All workspaces, including special ones.
    fn workspaces(&self) -> Result<Vec<Workspace>, Self::Error>;

    /// The focused window, or `None` if nothing is focused.
    fn active_window(&self) -> Result<Option<Client>, Self::Error>;

    /// All monitors.
    fn monitors(&self) -> Result<Vec<Monitor>, Self::Error>;

    /// Run `dispatcher` with `args`, e.g.
    /// `dispatch("togglespecialworkspace", "music")`.
    fn dispatch(&self, dispatcher: &str, args: &str) -> Result<(), Self::Error>;
}

/// Launches applications detached from the calling process.
pub trait Launcher {
    /// `true` if `program` can be started: either a desktop-entry reference
    /// (`*.desktop`) or an executable found on `$PATH`.
    fn is_resolvable(&self, program: &str) -> bool;

    /// Start `argv` without waiting for it.  The child must outlive the
    /// caller.
    fn spawn_detached(&self, argv: &[String]) -> Result<(), SpawnError>;
}
