use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

mod parser;

/// Error types for configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("line {line}: unknown option {option:?}")]
    UnknownOption { line: usize, option: String },

    #[error("line {line}: invalid value {value:?} for {option}")]
    InvalidValue { line: usize, option: String, value: String },

    #[error("Invalid {kind}: {value:?}")]
    InvalidSpec { kind: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Border colour option names understood by `color`.
pub const COLOR_OPTIONS: &[&str] = &[
    "activeborder",
    "inactiveborder",
    "urgencyborder",
    "groupborder",
    "ungroupborder",
    "menubg",
    "menufg",
    "font",
    "fontsel",
];

/// Modifier letters accepted in key and mouse specs: Control, Mod1, Mod4, Shift.
pub const MODIFIERS: &str = "CM4S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Gap {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// `name.class` or just `class`, matched against `WM_CLASS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientSpec {
    pub name: Option<String>,
    pub class: String,
}

impl ClientSpec {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let spec = match s.split_once('.') {
            Some((name, class)) => ClientSpec { name: Some(name.to_string()), class: class.to_string() },
            None => ClientSpec { name: None, class: s.to_string() },
        };
        if spec.class.is_empty() {
            return Err(ConfigError::InvalidSpec { kind: "clientspec", value: s.to_string() });
        }
        Ok(spec)
    }

    pub fn matches(&self, name: &str, class: &str) -> bool {
        self.class == class && self.name.as_deref().map_or(true, |n| n == name)
    }
}

impl TryFrom<String> for ClientSpec {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ClientSpec> for String {
    fn from(spec: ClientSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for ClientSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}.{}", name, self.class),
            None => write!(f, "{}", self.class),
        }
    }
}

/// `mods-key`, e.g. `CM-Return`, or a bare key. The same shape names a
/// mouse button (`M-1`) in `mousebind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeySpec {
    pub mods: String,
    pub key: String,
}

pub type MouseSpec = KeySpec;

impl KeySpec {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let spec = match s.split_once('-') {
            Some((mods, key)) if !key.is_empty() => KeySpec { mods: mods.to_string(), key: key.to_string() },
            Some(_) => return Err(ConfigError::InvalidSpec { kind: "keyspec", value: s.to_string() }),
            None => KeySpec { mods: String::new(), key: s.to_string() },
        };
        if spec.key.is_empty() || !spec.mods.chars().all(|c| MODIFIERS.contains(c)) {
            return Err(ConfigError::InvalidSpec { kind: "keyspec", value: s.to_string() });
        }
        Ok(spec)
    }

    pub fn has_mod(&self, letter: char) -> bool {
        self.mods.contains(letter)
    }
}

impl TryFrom<String> for KeySpec {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<KeySpec> for String {
    fn from(spec: KeySpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}-{}", self.mods, self.key)
        }
    }
}

/// Window manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub border_width: i32,
    pub snap_dist: i32,
    pub colors: HashMap<String, String>,
    pub gap: Gap,
    pub autogroups: HashMap<ClientSpec, u32>,
    pub binds: HashMap<KeySpec, String>,
    pub commands: HashMap<String, String>,
    pub font: String,
    pub ignores: Vec<String>,
    pub mouse_binds: HashMap<MouseSpec, String>,
    pub move_amount: i32,
    pub sticky: bool,
}

impl Default for Config {
    fn default() -> Self {
        let colors = [("activeborder", "#cccccc"), ("inactiveborder", "#666666")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            border_width: 1,
            snap_dist: 0,
            colors,
            gap: Gap::default(),
            autogroups: HashMap::new(),
            binds: HashMap::new(),
            commands: HashMap::new(),
            font: "fixed".to_string(),
            ignores: Vec::new(),
            mouse_binds: HashMap::new(),
            move_amount: 1,
            sticky: false,
        }
    }
}

impl Config {
    /// Parses the cwmrc-style format.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        parser::parse(input)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Loads `path`, picking the format from its extension. A missing file
    /// yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = if path.extension().map_or(false, |ext| ext == "toml") {
            Self::from_toml(&content)?
        } else {
            Self::parse(&content)?
        };
        debug!(
            binds = config.binds.len(),
            mouse_binds = config.mouse_binds.len(),
            "Loaded config from {}",
            path.display()
        );
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quadwm")
            .join("quadwmrc")
    }

    pub fn color(&self, option: &str) -> Option<&str> {
        self.colors.get(option).map(String::as_str)
    }

    /// Autogroup number for a window, if any spec matches it.
    pub fn group_for(&self, name: &str, class: &str) -> Option<u32> {
        self.autogroups
            .iter()
            .filter(|(spec, _)| spec.matches(name, class))
            // a spec naming the instance wins over a class-only one
            .max_by_key(|(spec, _)| spec.name.is_some())
            .map(|(_, group)| *group)
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignores.iter().any(|ignored| ignored == name)
    }
}
