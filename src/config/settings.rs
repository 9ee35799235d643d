//! TOML-based configuration for virtcol.
//!
//! Supports a config file (virtcol.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [compile]
//! dialect = "pg"
//! alias_prefix = "__nc"
//! now = "2024-03-31 12:00:00"   # pin "today" for date filters
//!
//! [formula]
//! dry_run = true
//! error_literal = "ERR!"
//!
//! [filter]
//! date_format = "%Y-%m-%d"
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compile::{CompileOptions, DEFAULT_DATE_FORMAT, DEFAULT_ERROR_LITERAL};
use crate::planner::DEFAULT_ALIAS_PREFIX;
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub compile: CompileSettings,
    pub formula: FormulaSettings,
    pub filter: FilterSettings,
}

/// `[compile]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileSettings {
    /// Dialect used when the schema does not name one (pg, mysql, sqlite, mssql).
    pub dialect: Option<String>,

    /// Prefix of generated subquery aliases.
    pub alias_prefix: String,

    /// Fixed "now" for date sub-operators, as a date, a date-time or RFC 3339.
    pub now: Option<String>,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            dialect: None,
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
            now: None,
        }
    }
}

/// `[formula]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormulaSettings {
    /// Parse compiled formulas with sqlparser during validation.
    pub dry_run: bool,

    /// Literal emitted for formula columns with a recorded error.
    pub error_literal: String,
}

impl Default for FormulaSettings {
    fn default() -> Self {
        Self {
            dry_run: true,
            error_literal: DEFAULT_ERROR_LITERAL.to_string(),
        }
    }
}

/// `[filter]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// chrono format of bound date values.
    pub date_format: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `VIRTCOL_CONFIG`
    /// 2. `./virtcol.toml`
    /// 3. `~/.config/virtcol/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("VIRTCOL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("virtcol.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("virtcol").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Configured dialect, if any.
    pub fn dialect(&self) -> Result<Option<Dialect>, SettingsError> {
        self.compile
            .dialect
            .as_deref()
            .map(|raw| {
                expand_env_vars(raw)?
                    .parse()
                    .map_err(SettingsError::InvalidConfig)
            })
            .transpose()
    }

    /// Configured "now" override, if any.
    pub fn now(&self) -> Result<Option<NaiveDateTime>, SettingsError> {
        let Some(raw) = self.compile.now.as_deref() else {
            return Ok(None);
        };
        let raw = expand_env_vars(raw)?;
        let raw = raw.trim();
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Ok(Some(dt));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(dt.naive_utc()));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| Some(d.and_time(chrono::NaiveTime::MIN)))
            .map_err(|_| SettingsError::InvalidConfig(format!("invalid now override '{}'", raw)))
    }

    /// Compile options with environment variables expanded.
    pub fn compile_options(&self) -> Result<CompileOptions, SettingsError> {
        Ok(CompileOptions::default()
            .with_dry_run(self.formula.dry_run)
            .with_error_literal(&expand_env_vars(&self.formula.error_literal)?)
            .with_date_format(&expand_env_vars(&self.filter.date_format)?)
            .with_alias_prefix(&expand_env_vars(&self.compile.alias_prefix)?))
    }
}

impl TryFrom<&Settings> for CompileOptions {
    type Error = SettingsError;

    fn try_from(settings: &Settings) -> Result<Self, Self::Error> {
        settings.compile_options()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.next_if_eq(&'{').is_some() {
            let mut var_name = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }
            if !closed {
                return Err(SettingsError::InvalidConfig(format!(
                    "unterminated variable '${{{}'",
                    var_name
                )));
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            // $VAR ends at the first non-alphanumeric, non-underscore char
            let mut var_name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                result.push('$');
            } else {
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}
