//! Screen recording.
//!
//! A single command toggles recording: if a recorder process is running it
//! is stopped and the file is filed away, otherwise a new recording starts.
//! Either `wl-screenrec` or `wf-recorder` does the actual work; which one is
//! decided per invocation from the installed binaries and the GPU vendor.

use crate::launcher::{detached_command, spawn_quiet, SpawnError};
use crate::notify;
use crate::paths;
use crate::traits::WindowManager;
use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Program used to open files and folders once a recording is saved.
const OPENER: &str = "app2unit";

/// Errors that abort a record invocation.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("no compatible screen recorder found")]
    NoRecorder,
    #[error("no audio source found")]
    NoAudioSource,
    #[error("no focused monitor")]
    NoFocusedMonitor,
    #[error("window manager error: {0}")]
    WindowManager(String),
    #[error("{program} failed ({status})")]
    CommandFailed { program: String, status: ExitStatus },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

fn io_error(context: impl Into<String>) -> impl FnOnce(io::Error) -> RecordError {
    let context = context.into();
    move |source| RecordError::Io { context, source }
}

/// Supported recorder backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorder {
    WlScreenrec,
    WfRecorder,
}

impl Recorder {
    pub fn binary(self) -> &'static str {
        match self {
            Recorder::WlScreenrec => "wl-screenrec",
            Recorder::WfRecorder => "wf-recorder",
        }
    }

    /// Flags that record from audio source `source`.
    pub fn audio_args(self, source: &str) -> Vec<String> {
        match self {
            Recorder::WfRecorder => vec!["-a".into(), source.into()],
            Recorder::WlScreenrec => {
                vec!["--audio".into(), "--audio-device".into(), source.into()]
            }
        }
    }

    /// Pick a recorder from `lspci` output (`None` if it could not run) and
    /// a predicate telling which binaries are installed.
    ///
    /// NVIDIA GPUs prefer `wf-recorder`; everything else prefers
    /// `wl-screenrec`.
    pub fn choose(
        lspci: Option<&str>,
        installed: impl Fn(&str) -> bool,
    ) -> Result<Self, RecordError> {
        let wl = Recorder::WlScreenrec;
        let wf = Recorder::WfRecorder;
        let Some(lspci) = lspci else {
            return Ok(if installed(wl.binary()) { wl } else { wf });
        };
        if lspci.to_lowercase().contains("nvidia") && installed(wf.binary()) {
            return Ok(wf);
        }
        [wl, wf]
            .into_iter()
            .find(|r| installed(r.binary()))
            .ok_or(RecordError::NoRecorder)
    }

    /// [`choose`](Self::choose) using the real `lspci` and `$PATH`.
    pub fn detect() -> Result<Self, RecordError> {
        let lspci = Command::new("lspci")
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| String::from_utf8_lossy(&out.stdout).into_owned());
        let recorder = Self::choose(lspci.as_deref(), |bin| which::which(bin).is_ok())?;
        debug!("using {}", recorder.binary());
        Ok(recorder)
    }
}

/// What to record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOptions {
    /// `Some("slurp")` asks the user to select a region; any other value is a
    /// geometry passed to the recorder.  `None` records the focused monitor.
    pub region: Option<String>,
    /// Record the running audio source.
    pub sound: bool,
}

/// The action picked on the "Recording stopped" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    Watch,
    Open,
    Delete,
    Dismissed,
}

impl StopAction {
    pub fn parse(output: &str) -> Self {
        match output.trim() {
            "watch" => StopAction::Watch,
            "open" => StopAction::Open,
            "delete" => StopAction::Delete,
            _ => StopAction::Dismissed,
        }
    }
}

/// Source name of the first `RUNNING` line of `pactl list short sources`.
pub fn running_source(pactl: &str) -> Option<&str> {
    pactl
        .lines()
        .find(|line| line.contains("RUNNING"))
        .and_then(|line| line.split_whitespace().nth(1))
}

/// File name a finished recording is saved under.
pub fn recording_file_name(at: NaiveDateTime) -> String {
    at.format("recording_%Y%m%d_%H-%M-%S.mp4").to_string()
}

fn capture(program: &str, args: &[&str]) -> Result<String, RecordError> {
    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .output()
        .map_err(io_error(format!("running {}", program)))?;
    if !output.status.success() {
        return Err(RecordError::CommandFailed {
            program: program.to_string(),
            status: output.status,
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn process_running(binary: &str) -> bool {
    Command::new("pidof")
        .arg(binary)
        .stdout(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// `rename`, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

/// Starts and stops recordings.
pub struct ScreenRecorder<W: WindowManager> {
    wm: W,
    recorder: Recorder,
    recordings_dir: PathBuf,
}

impl<W: WindowManager> ScreenRecorder<W> {
    pub fn new(wm: W, recorder: Recorder, recordings_dir: PathBuf) -> Self {
        Self {
            wm,
            recorder,
            recordings_dir,
        }
    }

    /// Stop a running recording, or start one with `opts`.
    pub fn run(&self, opts: &RecordOptions) -> Result<(), RecordError> {
        if process_running(self.recorder.binary()) {
            self.stop()
        } else {
            self.start(opts)
        }
    }

    /// Recorder flags selecting what part of the screen to capture.
    fn capture_args(&self, region: Option<&str>) -> Result<Vec<String>, RecordError> {
        match region {
            Some("slurp") => {
                let geometry = capture("slurp", &[])?;
                Ok(vec!["-g".into(), geometry.trim().to_string()])
            }
            Some(geometry) => Ok(vec!["-g".into(), geometry.trim().to_string()]),
            None => {
                let monitors = self
                    .wm
                    .monitors()
                    .map_err(|e| RecordError::WindowManager(e.to_string()))?;
                let focused = monitors
                    .into_iter()
                    .find(|m| m.focused)
                    .ok_or(RecordError::NoFocusedMonitor)?;
                Ok(vec!["-o".into(), focused.name])
            }
        }
    }

    pub fn start(&self, opts: &RecordOptions) -> Result<(), RecordError> {
        let mut argv = vec![self.recorder.binary().to_string()];
        argv.extend(self.capture_args(opts.region.as_deref())?);

        if opts.sound {
            let sources = capture("pactl", &["list", "short", "sources"])?;
            let source = running_source(&sources).ok_or(RecordError::NoAudioSource)?;
            argv.extend(self.recorder.audio_args(source));
        }

        let path = paths::recording_path();
        let state_dir = paths::record_state_dir();
        fs::create_dir_all(&state_dir)
            .map_err(io_error(format!("creating {}", state_dir.display())))?;
        argv.push("-f".into());
        argv.push(path.to_string_lossy().into_owned());

        // The recorder outlives us, so its stderr goes to a file, not a pipe.
        let log_path = paths::recorder_log_path();
        let log = File::create(&log_path)
            .map_err(io_error(format!("creating {}", log_path.display())))?;

        info!("starting {:?}", argv);
        let mut child = detached_command(&argv)?
            .stdout(Stdio::null())
            .stderr(log)
            .spawn()
            .map_err(|source| SpawnError::Io {
                program: argv[0].clone(),
                source,
            })?;

        thread::sleep(POLL_INTERVAL);
        match child.try_wait() {
            Ok(None) => match notify::notify(&["-p", "Recording started", "Recording..."]) {
                Ok(id) => {
                    if let Err(e) = fs::write(paths::recording_notif_path(), id) {
                        warn!("could not store notification id: {}", e);
                    }
                }
                Err(e) => warn!("notify-send failed: {}", e),
            },
            _ => {
                let stderr = fs::read_to_string(&log_path).unwrap_or_default();
                warn!("{} exited early: {}", argv[0], stderr.trim());
                let body = format!("Recording failed to start: {}", stderr.trim());
                if let Err(e) = notify::notify(&["Recording failed", &body]) {
                    warn!("notify-send failed: {}", e);
                }
            }
        }
        Ok(())
    }

    pub fn stop(&self) -> Result<(), RecordError> {
        let binary = self.recorder.binary();
        info!("stopping {}", binary);
        Command::new("pkill")
            .arg(binary)
            .status()
            .map_err(io_error("running pkill"))?;

        // The file is only complete once the recorder has exited.
        while process_running(binary) {
            thread::sleep(POLL_INTERVAL);
        }

        fs::create_dir_all(&self.recordings_dir)
            .map_err(io_error(format!("creating {}", self.recordings_dir.display())))?;
        let saved = self
            .recordings_dir
            .join(recording_file_name(Local::now().naive_local()));
        let recording = paths::recording_path();
        move_file(&recording, &saved).map_err(io_error(format!(
            "moving {} to {}",
            recording.display(),
            saved.display()
        )))?;
        info!("saved {}", saved.display());

        if let Ok(id) = fs::read_to_string(paths::recording_notif_path()) {
            if let Err(e) = notify::close(id.trim()) {
                debug!("could not close notification {}: {}", id.trim(), e);
            }
        }

        let body = format!("Recording saved in {}", saved.display());
        let action = notify::notify(&[
            "--action=watch=Watch",
            "--action=open=Open",
            "--action=delete=Delete",
            "Recording stopped",
            &body,
        ])
        .unwrap_or_else(|e| {
            warn!("notify-send failed: {}", e);
            String::new()
        });

        self.follow_up(StopAction::parse(&action), &saved)
    }

    fn follow_up(&self, action: StopAction, saved: &Path) -> Result<(), RecordError> {
        let open = |target: &Path| {
            spawn_quiet(&[
                OPENER.to_string(),
                "-O".to_string(),
                target.to_string_lossy().into_owned(),
            ])
        };
        match action {
            StopAction::Watch => open(saved)?,
            StopAction::Open => {
                let shown = Command::new("dbus-send")
                    .args([
                        "--session",
                        "--dest=org.freedesktop.FileManager1",
                        "--type=method_call",
                        "/org/freedesktop/FileManager1",
                        "org.freedesktop.FileManager1.ShowItems",
                    ])
                    .arg(format!("array:string:file://{}", saved.display()))
                    .arg("string:")
                    .status()
                    .map(|status| status.success())
                    .unwrap_or(false);
                if !shown {
                    if let Some(dir) = saved.parent() {
                        open(dir)?;
                    }
                }
            }
            StopAction::Delete => fs::remove_file(saved)
                .map_err(io_error(format!("deleting {}", saved.display())))?,
            StopAction::Dismissed => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Client, Monitor, Workspace};
    use chrono::NaiveDate;

    #[test]
    fn nvidia_prefers_wf_recorder() {
        let lspci = "01:00.0 VGA compatible controller: NVIDIA Corporation AD104";
        assert_eq!(
            Recorder::choose(Some(lspci), |_| true).unwrap(),
            Recorder::WfRecorder
        );
    }

    #[test]
    fn nvidia_without_wf_recorder_uses_wl_screenrec() {
        let lspci = "VGA compatible controller: NVIDIA Corporation";
        assert_eq!(
            Recorder::choose(Some(lspci), |bin| bin == "wl-screenrec").unwrap(),
            Recorder::WlScreenrec
        );
    }

    #[test]
    fn other_gpus_prefer_wl_screenrec() {
        let lspci = "VGA compatible controller: Advanced Micro Devices";
        assert_eq!(
            Recorder::choose(Some(lspci), |_| true).unwrap(),
            Recorder::WlScreenrec
        );
        assert_eq!(
            Recorder::choose(Some(lspci), |bin| bin == "wf-recorder").unwrap(),
            Recorder::WfRecorder
        );
    }

    #[test]
    fn nothing_installed_is_an_error() {
        assert!(matches!(
            Recorder::choose(Some("Intel"), |_| false),
            Err(RecordError::NoRecorder)
        ));
    }

    #[test]
    fn failed_lspci_falls_back_without_erroring() {
        assert_eq!(Recorder::choose(None, |_| true).unwrap(), Recorder::WlScreenrec);
        assert_eq!(Recorder::choose(None, |_| false).unwrap(), Recorder::WfRecorder);
    }

    #[test]
    fn audio_flags_per_recorder() {
        assert_eq!(Recorder::WfRecorder.audio_args("mic"), ["-a", "mic"]);
        assert_eq!(
            Recorder::WlScreenrec.audio_args("mic"),
            ["--audio", "--audio-device", "mic"]
        );
    }

    #[test]
    fn first_running_source_is_used() {
        let pactl = "\
50\talsa_output.monitor\tPipeWire\ts32le 2ch 48000Hz\tSUSPENDED
51\talsa_input.mic\tPipeWire\ts32le 2ch 48000Hz\tRUNNING
52\tbluez.monitor\tPipeWire\ts16le 2ch 48000Hz\tRUNNING";
        assert_eq!(running_source(pactl), Some("alsa_input.mic"));
        assert_eq!(running_source("50\tx\tPipeWire\tIDLE"), None);
    }

    #[test]
    fn file_name_uses_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(13, 4, 5)
            .unwrap();
        assert_eq!(recording_file_name(at), "recording_20240501_13-04-05.mp4");
    }

    #[test]
    fn notification_actions() {
        assert_eq!(StopAction::parse("watch\n"), StopAction::Watch);
        assert_eq!(StopAction::parse("open"), StopAction::Open);
        assert_eq!(StopAction::parse("delete"), StopAction::Delete);
        assert_eq!(StopAction::parse(""), StopAction::Dismissed);
    }

    #[test]
    fn capture_returns_stdout() {
        assert_eq!(capture("sh", &["-c", "echo 0,0 10x10"]).unwrap().trim(), "0,0 10x10");
    }

    #[test]
    fn capture_fails_on_nonzero_exit() {
        // A cancelled slurp exits non-zero with empty output.
        assert!(matches!(
            capture("false", &[]),
            Err(RecordError::CommandFailed { ref program, .. }) if program == "false"
        ));
    }

    #[test]
    fn move_file_moves() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.mp4");
        let to = dir.path().join("b.mp4");
        fs::write(&from, b"frames").unwrap();
        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"frames");
    }

    //  Capture target

    #[derive(Debug, Default)]
    struct MonitorWm {
        monitors: Vec<Monitor>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("monitor wm error")]
    struct MonitorErr;

    impl WindowManager for MonitorWm {
        type Error = MonitorErr;

        fn clients(&self) -> Result<Vec<Client>, MonitorErr> {
            Ok(Vec::new())
        }

        fn workspaces(&self) -> Result<Vec<Workspace>, MonitorErr> {
            Ok(Vec::new())
        }

        fn active_window(&self) -> Result<Option<Client>, MonitorErr> {
            Ok(None)
        }

        fn monitors(&self) -> Result<Vec<Monitor>, MonitorErr> {
            Ok(self.monitors.clone())
        }

        fn dispatch(&self, _: &str, _: &str) -> Result<(), MonitorErr> {
            Ok(())
        }
    }

    fn recorder(monitors: Vec<Monitor>) -> ScreenRecorder<MonitorWm> {
        ScreenRecorder::new(
            MonitorWm { monitors },
            Recorder::WlScreenrec,
            PathBuf::from("/tmp/recordings"),
        )
    }

    #[test]
    fn no_region_records_focused_monitor() {
        let r = recorder(vec![
            Monitor {
                id: 0,
                name: "DP-1".into(),
                focused: false,
            },
            Monitor {
                id: 1,
                name: "HDMI-A-1".into(),
                focused: true,
            },
        ]);
        assert_eq!(r.capture_args(None).unwrap(), ["-o", "HDMI-A-1"]);
    }

    #[test]
    fn no_focused_monitor_is_an_error() {
        let r = recorder(Vec::new());
        assert!(matches!(
            r.capture_args(None),
            Err(RecordError::NoFocusedMonitor)
        ));
    }

    #[test]
    fn explicit_region_is_passed_as_geometry() {
        let r = recorder(Vec::new());
        assert_eq!(
            r.capture_args(Some("10,20 300x200\n")).unwrap(),
            ["-g", "10,20 300x200"]
        );
    }
}
