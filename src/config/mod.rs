//! Configuration module for virtcol.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, CompileSettings, FilterSettings, FormulaSettings, Settings, SettingsError,
};
