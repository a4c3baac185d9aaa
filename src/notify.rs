//! Desktop notifications through `notify-send` and the freedesktop
//! notification service.

use log::debug;
use std::io;
use std::process::{Command, Stdio};

const APP_NAME: &str = "hyprtoggle";

/// Run `notify-send -a hyprtoggle <args>` and return its trimmed stdout.
///
/// With `-p` the output is the notification id; with `--action` flags the
/// call blocks until the user picks one and the output is the action name.
pub fn notify(args: &[&str]) -> io::Result<String> {
    debug!("notify-send {:?}", args);
    let output = Command::new("notify-send")
        .args(["-a", APP_NAME])
        .args(args)
        .stdin(Stdio::null())
        .output()?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Close notification `id` via `org.freedesktop.Notifications`.
pub fn close(id: &str) -> io::Result<()> {
    Command::new("gdbus")
        .args([
            "call",
            "--session",
            "--dest=org.freedesktop.Notifications",
            "--object-path=/org/freedesktop/Notifications",
            "--method=org.freedesktop.Notifications.CloseNotification",
            id,
        ])
        .stdout(Stdio::null())
        .status()
        .map(drop)
}
