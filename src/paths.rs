//! Filesystem locations, derived from the XDG base directories.

use std::path::PathBuf;

const APP_DIR: &str = "hyprtoggle";

fn home() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
}

/// `$<var>` if set and non-empty, otherwise `$HOME/<fallback>`.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home().join(fallback),
    }
}

/// `$XDG_CONFIG_HOME/hyprtoggle`.
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join(APP_DIR)
}

/// Default configuration file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.json")
}

/// `$XDG_STATE_HOME/hyprtoggle`.
pub fn state_dir() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", ".local/state").join(APP_DIR)
}

/// Scratch directory for the in-progress recording.
pub fn record_state_dir() -> PathBuf {
    state_dir().join("record")
}

/// Where the recorder writes while it is running.
pub fn recording_path() -> PathBuf {
    record_state_dir().join("recording.mp4")
}

/// Id of the "Recording started" notification.
pub fn recording_notif_path() -> PathBuf {
    record_state_dir().join("notifid.txt")
}

/// Recorder stderr, kept for the failure notification.
pub fn recorder_log_path() -> PathBuf {
    record_state_dir().join("recorder.log")
}

/// `$XDG_VIDEOS_DIR/Recordings`, or `~/Videos/Recordings`.
pub fn recordings_dir() -> PathBuf {
    xdg_dir("XDG_VIDEOS_DIR", "Videos").join("Recordings")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_files_share_the_state_dir() {
        let dir = record_state_dir();
        assert_eq!(recording_path().parent(), Some(dir.as_path()));
        assert_eq!(recording_notif_path().parent(), Some(dir.as_path()));
        assert!(dir.ends_with("hyprtoggle/record"));
    }

    #[test]
    fn config_file_lives_in_app_dir() {
        assert!(config_file().ends_with("hyprtoggle/config.json"));
    }
}
