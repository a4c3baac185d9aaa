//! Application configuration.
//!
//! The configuration is an optional JSON file (`--config <path>`, or
//! `$XDG_CONFIG_HOME/hyprtoggle/config.json`).  Its `"toggles"` section is a
//! partial override of the built-in toggle groups: it is layered over the
//! defaults key by key, at every nesting depth, so a user only has to spell
//! out what differs.
//!
//! # Example
//!
//! ```json
//! {
//!   "toggles": {
//!     "communication": {
//!       "discord": { "command": ["vesktop"] },
//!       "signal": {
//!         "enable": true,
//!         "match": [{ "class": "signal" }],
//!         "command": ["signal-desktop"],
//!         "move": true
//!       }
//!     }
//!   },
//!   "launcher": ["app2unit", "--"],
//!   "record": { "recordings_dir": "/home/me/Videos/Recordings" }
//! }
//! ```
//!
//! Anything that stops the file from being *read* (missing, unreadable, not
//! JSON, no `"toggles"` key) is recovered from silently: the defaults are
//! used.  A file that reads fine but does not fit the schema is an error.

use crate::matcher::MatchRule;
use log::info;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Error from loading or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The user config could not be read or parsed.  Callers fall back to
    /// the defaults.
    #[error("config unavailable: {0}")]
    Unavailable(String),
    /// The requested key exists in neither layer.
    #[error("no configuration for {0:?}")]
    KeyNotFound(String),
    /// The config was readable but does not match the schema.
    #[error("invalid config at {path}: {reason}")]
    Invalid { path: String, reason: String },
}

//  Layered lookup

/// A read-only view over several JSON object layers, searched in order.
///
/// The first layer that has a key wins.  When the winning value is an
/// object, the result is another `Layered` over that object *and* every
/// lower layer's object at the same key, so siblings the upper layer did not
/// mention still resolve from below.  Arrays and scalars are leaves: the
/// winning one is returned whole.
#[derive(Debug, Clone)]
pub struct Layered<'a> {
    layers: Vec<&'a Map<String, Value>>,
}

/// Result of a [`Layered`] lookup.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    Leaf(&'a Value),
    Branch(Layered<'a>),
}

impl<'a> Resolved<'a> {
    /// Materialize into an owned JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Resolved::Leaf(v) => v.clone(),
            Resolved::Branch(layered) => Value::Object(layered.materialize()),
        }
    }
}

impl<'a> Layered<'a> {
    /// Layers are given highest priority first.
    pub fn new(layers: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Look up `key`, or `None` if no layer has it.
    pub fn get(&self, key: &str) -> Option<Resolved<'a>> {
        let mut hits = self.layers.iter().copied().filter_map(|layer| layer.get(key));
        match hits.next()? {
            Value::Object(first) => {
                let mut layers = vec![first];
                layers.extend(hits.filter_map(Value::as_object));
                Some(Resolved::Branch(Layered { layers }))
            }
            leaf => Some(Resolved::Leaf(leaf)),
        }
    }

    /// Like [`get`](Self::get), failing with [`ConfigError::KeyNotFound`].
    pub fn resolve(&self, key: &str) -> Result<Resolved<'a>, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))
    }

    /// Follow `path` one key at a time.  An empty path resolves to `self`.
    pub fn get_path(&self, path: &[&str]) -> Result<Resolved<'a>, ConfigError> {
        let mut current = Resolved::Branch(self.clone());
        for (depth, key) in path.iter().enumerate() {
            current = match current {
                Resolved::Branch(layered) => layered.resolve(key)?,
                Resolved::Leaf(_) => {
                    return Err(ConfigError::KeyNotFound(path[..=depth].join(".")))
                }
            };
        }
        Ok(current)
    }

    /// Union of all layers' keys: the lowest layer's keys first, in its
    /// order, then keys that only appear higher up.
    pub fn keys(&self) -> Vec<&'a str> {
        let mut keys: Vec<&'a str> = Vec::new();
        for layer in self.layers.iter().copied().rev() {
            for key in layer.keys() {
                if !keys.contains(&key.as_str()) {
                    keys.push(key.as_str());
                }
            }
        }
        keys
    }

    /// Produce the merged tree as an owned object.
    pub fn materialize(&self) -> Map<String, Value> {
        self.keys()
            .into_iter()
            .filter_map(|key| Some((key.to_string(), self.get(key)?.into_value())))
            .collect()
    }
}

//  Typed toggle schema

/// One application that belongs to a toggle group.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppEntry {
    /// Disabled entries are skipped entirely.
    #[serde(default, alias = "enable")]
    pub enabled: bool,
    /// Windows that belong to this app (OR of rules).
    #[serde(default, rename = "match")]
    pub rules: Vec<MatchRule>,
    /// Command to launch when no matching window exists.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    /// Pull matching windows into the group's special workspace.
    #[serde(default, rename = "move")]
    pub move_to_workspace: bool,
}

impl AppEntry {
    /// The launch command, if one is configured and non-empty.
    pub fn spawn_command(&self) -> Option<&[String]> {
        self.command.as_deref().filter(|argv| !argv.is_empty())
    }
}

/// The effective app set of one toggle group, in processing order.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleGroup {
    pub name: String,
    pub apps: Vec<(String, AppEntry)>,
}

impl ToggleGroup {
    fn from_layered(name: &str, layered: &Layered<'_>) -> Result<Self, ConfigError> {
        let apps = layered
            .keys()
            .into_iter()
            .map(|app| {
                let value = layered.resolve(app)?.into_value();
                let entry: AppEntry =
                    serde_json::from_value(value).map_err(|e| ConfigError::Invalid {
                        path: format!("toggles.{}.{}", name, app),
                        reason: e.to_string(),
                    })?;
                Ok((app.to_string(), entry))
            })
            .collect::<Result<_, ConfigError>>()?;
        Ok(Self {
            name: name.to_string(),
            apps,
        })
    }

    /// Entries with `enable: true`, in order.
    pub fn enabled_apps(&self) -> impl Iterator<Item = (&str, &AppEntry)> {
        self.apps
            .iter()
            .filter(|(_, app)| app.enabled)
            .map(|(name, app)| (name.as_str(), app))
    }
}

//  ConfigStore

/// Built-in toggle groups with an optional user override layered on top.
///
/// Read-only after construction; the defaults are never modified.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    overrides: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            overrides: Map::new(),
            defaults: default_toggles(),
        }
    }
}

impl ConfigStore {
    /// Layer `overrides` over the built-in defaults, validating every
    /// resulting group.
    pub fn with_overrides(mut overrides: Map<String, Value>) -> Result<Self, ConfigError> {
        normalize_enable_keys(&mut overrides);
        let store = Self {
            overrides,
            ..Self::default()
        };
        for group in store.groups() {
            store.effective(group)?;
        }
        Ok(store)
    }

    pub fn layered(&self) -> Layered<'_> {
        Layered::new([&self.overrides, &self.defaults])
    }

    /// Names of all known groups (defaults first, then user-only groups).
    pub fn groups(&self) -> Vec<&str> {
        self.layered().keys()
    }

    /// The merged app set for `group`.
    pub fn effective(&self, group: &str) -> Result<ToggleGroup, ConfigError> {
        match self.layered().get_path(&[group])? {
            Resolved::Branch(apps) => ToggleGroup::from_layered(group, &apps),
            Resolved::Leaf(_) => Err(ConfigError::Invalid {
                path: format!("toggles.{}", group),
                reason: "expected an object of app entries".into(),
            }),
        }
    }
}

/// Rewrite `enabled` to `enable` in every app entry, so both spellings
/// layer over the defaults as one key.  An entry spelling both is left
/// alone and rejected by validation.
fn normalize_enable_keys(overrides: &mut Map<String, Value>) {
    let apps = overrides
        .values_mut()
        .filter_map(Value::as_object_mut)
        .flat_map(|group| group.values_mut())
        .filter_map(Value::as_object_mut);
    for app in apps {
        if app.contains_key("enable") {
            continue;
        }
        if let Some(enabled) = app.remove("enabled") {
            app.insert("enable".into(), enabled);
        }
    }
}

/// The toggle groups available without any user configuration.
pub fn default_toggles() -> Map<String, Value> {
    let defaults = json!({
        "communication": {
            "discord": {
                "enable": true,
                "match": [{ "class": "discord" }],
                "command": ["discord"],
                "move": true
            },
            "whatsapp": {
                "enable": true,
                "match": [{ "class": "whatsapp" }],
                "move": true
            }
        },
        "music": {
            "spotify": {
                "enable": true,
                "match": [
                    { "class": "Spotify" },
                    { "initialTitle": "Spotify" },
                    { "initialTitle": "Spotify Free" }
                ],
                "command": ["spicetify", "watch", "-s"],
                "move": true
            },
            "feishin": {
                "enable": true,
                "match": [{ "class": "feishin" }],
                "move": true
            }
        },
        "sysmon": {
            "btop": {
                "enable": true,
                "match": [{
                    "class": "btop",
                    "title": "btop",
                    "workspace": { "name": "special:sysmon" }
                }],
                "command": ["foot", "-a", "btop", "-T", "btop", "fish", "-C", "exec btop"]
            }
        },
        "todo": {
            "todoist": {
                "enable": true,
                "match": [{ "class": "Todoist" }],
                "command": ["todoist"],
                "move": true
            }
        }
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

//  Whole file

/// Screen-recording settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Where finished recordings are moved.  Defaults to
    /// [`paths::recordings_dir`](crate::paths::recordings_dir).
    pub recordings_dir: Option<PathBuf>,
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub toggles: ConfigStore,
    /// Prefix prepended to every spawned command.
    pub launcher: Vec<String>,
    pub record: RecordConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toggles: ConfigStore::default(),
            launcher: default_launcher(),
            record: RecordConfig::default(),
        }
    }
}

/// On-disk shape.  Unknown top-level keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    toggles: Option<Map<String, Value>>,
    launcher: Option<Vec<String>>,
    record: RecordConfig,
}

fn default_launcher() -> Vec<String> {
    vec!["app2unit".into(), "--".into()]
}

impl Config {
    /// Load configuration from `path`, falling back to the defaults when the
    /// file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match read_document(path) {
            Ok(doc) => {
                info!("loaded config from {}", path.display());
                Self::from_document(doc)
            }
            Err(e) => {
                info!("{}, using defaults", e);
                Ok(Self::default())
            }
        }
    }

    /// Build from an already-parsed JSON document.
    pub fn from_document(doc: Value) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_value(doc).map_err(|e| ConfigError::Invalid {
            path: "<root>".into(),
            reason: e.to_string(),
        })?;

        let toggles = match file.toggles {
            Some(overrides) => ConfigStore::with_overrides(overrides)?,
            None => {
                info!("no \"toggles\" section, using default toggle groups");
                ConfigStore::default()
            }
        };

        let launcher = file.launcher.unwrap_or_else(default_launcher);
        if launcher.iter().any(String::is_empty) {
            return Err(ConfigError::Invalid {
                path: "launcher".into(),
                reason: "launcher arguments must not be empty".into(),
            });
        }

        Ok(Self {
            toggles,
            launcher,
            record: file.record,
        })
    }
}

fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Unavailable(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| ConfigError::Unavailable(format!("failed to parse {}: {}", path.display(), e)))
}
