//! Hyprland-specific implementations.
//!
//! This module provides the concrete backend for the
//! [`WindowManager`](crate::traits::WindowManager) trait, powered by
//! Hyprland's IPC socket.
//!
//! Nothing outside this module should reference Hyprland's transport
//! directly.

pub mod wm;
