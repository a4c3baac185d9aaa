//! **hyprtoggle** — scratchpad toggles and screen recording for Hyprland.
//!
//! A *toggle group* (e.g. `music`) is a set of applications that share one
//! special workspace.  Toggling a group makes sure each app is running,
//! pulls its windows onto `special:<group>`, and then shows or hides that
//! workspace.  Nothing is remembered between invocations: every decision is
//! re-derived from the live window list and the configuration.
//!
//! # Architecture
//!
//! * [`config`] layers the user's `"toggles"` over built-in defaults.
//! * [`matcher`] decides whether a live window belongs to an app entry.
//! * [`clients`] caches the window list for one invocation.
//! * [`toggle`] orchestrates spawns, moves and the final toggle.
//! * [`special`] handles the reserved `specialws` group.
//!
//! The window manager and process launching sit behind the traits in
//! [`traits`]; concrete implementations live in [`hyprland`] and
//! [`launcher`].  [`record`] is the separate screen-recording command.

pub mod clients;
pub mod config;
pub mod hyprland;
pub mod launcher;
pub mod matcher;
pub mod notify;
pub mod paths;
pub mod record;
pub mod special;
pub mod toggle;
pub mod traits;
pub mod window;
