use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;

use crate::log::{
    dispatcher::{DispatcherConfig, OverflowPolicy},
    file_sink::{DEFAULT_MAX_BYTES, DEFAULT_MAX_LINES, DEFAULT_MAX_RETENTION_DAYS, DEFAULT_PATH, FileSinkConfig},
    log_level::LogLevel,
    sink_kind::SinkKind,
};

/// Section holding every logging key.
pub const LOGGING_SECTION: &str = "Logging";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error reading file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Default)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    /// Reads an INI-style file: `[section]` headers, `key = value` pairs and
    /// `#` comments. Keys before the first header are globals.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_string();
                let value = value.trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_or_default<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get(section, key)
            .or_else(|| self.get_global(key))
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_non_empty_or_default<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Parses `section.key` (falling back to the global key), or returns
    /// `default` when neither is set or the value is empty.
    pub fn get_parsed<T: FromStr>(
        &self,
        section: &str,
        key: &str,
        default: T,
    ) -> Result<T, ConfigError> {
        let Some(raw) = self
            .get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
        else {
            return Ok(default);
        };
        raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: format!("{section}.{key}"),
            value: raw.to_owned(),
        })
    }

    /// Like [`get_parsed`](Self::get_parsed) but also accepts
    /// `yes`/`no`/`on`/`off`/`1`/`0`.
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
        let raw = self.get_non_empty_or_default(section, key, "");
        match raw.to_ascii_lowercase().as_str() {
            "" => Ok(default),
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: format!("{section}.{key}"),
                value: raw.to_owned(),
            }),
        }
    }

    /// Sink kinds listed under `Logging.sinks`, in order. Defaults to console.
    #[must_use]
    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        self.get_or_default(LOGGING_SECTION, "sinks", "console")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SinkKind::from_name)
            .collect()
    }
}

impl DispatcherConfig {
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let s = LOGGING_SECTION;
        let queue_capacity = cfg.get_parsed(s, "queue_capacity", defaults.queue_capacity)?;
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: format!("{s}.queue_capacity"),
                value: "0".into(),
            });
        }
        Ok(Self {
            queue_capacity,
            min_level: cfg.get_parsed::<LogLevel>(s, "min_level", defaults.min_level)?,
            overflow: cfg.get_parsed::<OverflowPolicy>(s, "overflow", defaults.overflow)?,
        })
    }
}

impl FileSinkConfig {
    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let s = LOGGING_SECTION;
        Ok(Self {
            path: expand_path(cfg.get_non_empty_or_default(s, "file_path", DEFAULT_PATH)),
            max_lines: cfg.get_parsed(s, "max_lines", DEFAULT_MAX_LINES)?,
            max_bytes: cfg.get_parsed(s, "max_bytes", DEFAULT_MAX_BYTES)?,
            daily_rotation: cfg.get_bool(s, "daily_rotation", true)?,
            max_retention_days: cfg.get_parsed(s, "max_retention_days", DEFAULT_MAX_RETENTION_DAYS)?,
            rotation_enabled: cfg.get_bool(s, "rotation_enabled", true)?,
            min_level: cfg.get_parsed::<LogLevel>(s, "file_min_level", LogLevel::Trace)?,
        })
    }
}

/// Expands tilde (`~`) in file paths to the user's home directory.
#[must_use]
pub fn expand_path(path_str: &str) -> PathBuf {
    if path_str.starts_with('~') {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .ok()
            .map(PathBuf::from);

        if let Some(mut home_path) = home {
            if path_str == "~" {
                return home_path;
            }
            if let Some(rest) = path_str.strip_prefix("~/").or_else(|| path_str.strip_prefix("~\\")) {
                home_path.push(rest);
                return home_path;
            }
        }
    }
    PathBuf::from(path_str)
}
