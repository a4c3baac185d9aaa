//! Entry point for the **hyprtoggle** command.
//!
//! Every invocation is short-lived: load the configuration, talk to
//! Hyprland, launch whatever needs launching, exit.

use clap::{Parser, Subcommand};
use hyprtoggle::config::Config;
use hyprtoggle::hyprland::wm::HyprlandWm;
use hyprtoggle::launcher::AppLauncher;
use hyprtoggle::paths;
use hyprtoggle::record::{RecordOptions, Recorder, ScreenRecorder};
use hyprtoggle::toggle::Toggler;
use log::{error, info};
use std::path::PathBuf;

/// Scratchpad toggles and screen recording for Hyprland
#[derive(Debug, Parser)]
#[command(name = "hyprtoggle", version)]
struct Args {
    /// Configuration file (default: $XDG_CONFIG_HOME/hyprtoggle/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Show or hide a toggle group's special workspace
    Toggle {
        /// Toggle group, or "specialws" for the active special workspace
        workspace: String,
    },
    /// Start or stop a screen recording
    Record {
        /// Record a region; without a value the region is picked with slurp
        #[arg(short, long, num_args = 0..=1, default_missing_value = "slurp")]
        region: Option<String>,
        /// Also record the running audio source
        #[arg(short, long)]
        sound: bool,
    },
}

/// Load the config from `--config` or the default location.  Unreadable
/// files fall back to defaults; malformed ones are fatal.
fn load_config(path: Option<PathBuf>) -> Config {
    let path = path.unwrap_or_else(paths::config_file);
    match Config::load(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(args.config);

    match args.command {
        Cmd::Toggle { workspace } => run_toggle(config, &workspace),
        Cmd::Record { region, sound } => run_record(config, RecordOptions { region, sound }),
    }
}

fn run_toggle(config: Config, workspace: &str) {
    let toggler = Toggler::new(
        HyprlandWm::new(),
        AppLauncher::new(config.launcher),
        config.toggles,
    );
    match toggler.run(workspace) {
        Ok(report) => info!(
            "{}: spawned {:?}, moved {} window(s)",
            report.workspace,
            report.spawned(),
            report.moved().len()
        ),
        Err(e) => {
            error!("toggle {}: {}", workspace, e);
            std::process::exit(1);
        }
    }
}

fn run_record(config: Config, opts: RecordOptions) {
    let recorder = match Recorder::detect() {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let dir = config
        .record
        .recordings_dir
        .unwrap_or_else(paths::recordings_dir);
    let screen = ScreenRecorder::new(HyprlandWm::new(), recorder, dir);
    if let Err(e) = screen.run(&opts) {
        error!("record: {}", e);
        std::process::exit(1);
    }
}
