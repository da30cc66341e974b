//! TOML-based application configuration.
//!
//! Stores:
//! - Timer durations and auto-continue flags
//! - The category list and the active category
//!
//! Configuration is stored at `~/.config/focustrack/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, CoreError, Result, ValidationError};
use crate::ports::{CategorySource, SettingsProvider};
use crate::session::Category;
use crate::timer::TimerSettings;

use super::data_dir;

/// Categories every installation starts with. They cannot be removed.
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Studying", "📚"),
    ("Coding", "💻"),
    ("Project", "📁"),
    ("Reading", "📖"),
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
    /// Name of the category new sessions are attributed to.
    #[serde(default)]
    pub active_category: Option<String>,
}

fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, icon)| Category::new(*name, *icon))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerSettings::default(),
            categories: default_categories(),
            active_category: None,
        }
    }
}

fn is_builtin(name: &str) -> bool {
    DEFAULT_CATEGORIES.iter().any(|(builtin, _)| *builtin == name)
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        key.split('.').try_fold(root, |current, part| current.get(part))
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("expected true or false, got '{value}'")))?,
            ),
            serde_json::Value::Number(_) => serde_json::Value::Number(
                value
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                    .into(),
            ),
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ if value.is_empty() || value == "none" => serde_json::Value::Null,
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Location of the config file in the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        ConfigFile::default_location()?.load()
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        ConfigFile::default_location()?.save(self)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Flattened `key = value` pairs for every scalar setting.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            flatten("", &json, &mut out);
        }
        out
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid. On error `self` is unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check the invariants the timer relies on.
    ///
    /// # Errors
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("timer.work_minutes", self.timer.work_minutes),
            ("timer.short_break_minutes", self.timer.short_break_minutes),
            ("timer.long_break_minutes", self.timer.long_break_minutes),
            ("timer.sessions_until_long_break", self.timer.sessions_until_long_break),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(active) = &self.active_category {
            if self.category(active).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "active_category".to_string(),
                    message: format!("no category named '{active}'"),
                });
            }
        }
        Ok(())
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// The active category, if it still exists.
    pub fn active_category(&self) -> Option<&Category> {
        self.active_category.as_deref().and_then(|name| self.category(name))
    }

    pub fn is_builtin_category(&self, name: &str) -> bool {
        is_builtin(name)
    }

    /// # Errors
    /// Fails on an empty or already used name.
    pub fn add_category(&mut self, name: &str, icon: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".to_string(),
                message: "category name cannot be empty".to_string(),
            }
            .into());
        }
        if self.category(name).is_some() {
            return Err(ValidationError::Duplicate(name.to_string()).into());
        }
        self.categories.push(Category::new(name, icon));
        Ok(())
    }

    /// Remove a user-defined category. Clears the active category if it was
    /// the one removed.
    ///
    /// # Errors
    /// Fails for built-in or unknown names.
    pub fn remove_category(&mut self, name: &str) -> Result<()> {
        if is_builtin(name) {
            return Err(ValidationError::BuiltIn(name.to_string()).into());
        }
        let before = self.categories.len();
        self.categories.retain(|c| c.name != name);
        if self.categories.len() == before {
            return Err(ValidationError::NotFound(name.to_string()).into());
        }
        if self.active_category.as_deref() == Some(name) {
            self.active_category = None;
        }
        Ok(())
    }

    /// # Errors
    /// Fails if no category has this name.
    pub fn use_category(&mut self, name: &str) -> Result<()> {
        if self.category(name).is_none() {
            return Err(ValidationError::NotFound(name.to_string()).into());
        }
        self.active_category = Some(name.to_string());
        Ok(())
    }

    pub fn clear_active_category(&mut self) {
        self.active_category = None;
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        // lists are managed through their own commands
        serde_json::Value::Array(_) => {}
        serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

impl SettingsProvider for Config {
    fn snapshot(&self) -> TimerSettings {
        self.timer.clone()
    }
}

impl CategorySource for Config {
    fn current(&self) -> Option<Category> {
        self.active_category().cloned()
    }
}

/// A config file that is re-read on every access.
///
/// Used where edits made by another process (e.g. `focustrack config set`
/// while a timer runs) must be seen at the next mode switch.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, writing the default first if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or created.
    pub fn load(&self) -> Result<Config> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| {
                    ConfigError::ParseFailed(format!("{}: {e}", self.path.display()))
                })?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "writing default config");
                let cfg = Config::default();
                self.save(&cfg)?;
                Ok(cfg)
            }
            Err(err) => Err(CoreError::from(ConfigError::LoadFailed {
                path: self.path.clone(),
                message: err.to_string(),
            })),
        }
    }

    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self, cfg: &Config) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        let content = toml::to_string_pretty(cfg).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(&self.path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load, apply `edit`, save.
    ///
    /// # Errors
    /// Propagates errors from loading, from `edit`, and from saving.
    pub fn update<T>(&self, edit: impl FnOnce(&mut Config) -> Result<T>) -> Result<T> {
        let mut cfg = self.load()?;
        let out = edit(&mut cfg)?;
        self.save(&cfg)?;
        Ok(out)
    }

    fn load_logged(&self) -> Config {
        self.load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), error = %err, "config unreadable, using defaults");
            Config::default()
        })
    }
}

impl SettingsProvider for ConfigFile {
    fn snapshot(&self) -> TimerSettings {
        self.load_logged().timer
    }
}

impl CategorySource for ConfigFile {
    fn current(&self) -> Option<Category> {
        self.load_logged().active_category().cloned()
    }
}
