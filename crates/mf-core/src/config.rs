//! Configuration loading for mf-core.
//!
//! Resolution order (highest to lowest priority):
//! 1. CLI flags (applied by the caller via [`Settings::apply`])
//! 2. Explicit config file (`--config` / `MF_CONFIG`)
//! 3. XDG config home (`~/.config/monkey-frame/config.toml`)
//! 4. Built-in defaults
//!
//! File format:
//!
//! ```toml
//! [bundle]
//! script_extension = ".monkey"
//! package_extension = ".pbw"
//! descriptor = "appinfo.json"
//! strict = false
//! ```

use mf_bundle::{
    normalize_extension, TransformOptions, DEFAULT_DESCRIPTOR, DEFAULT_PACKAGE_EXTENSION,
    DEFAULT_SCRIPT_EXTENSION,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "monkey-frame";

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Where the settings were loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument or environment.
    Explicit,
    /// Found in the XDG config directory.
    XdgConfig,
    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Explicit => write!(f, "explicit config file"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Bundle layout and framing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleSettings {
    pub script_extension: String,
    pub package_extension: String,
    pub descriptor: String,
    /// Reject app names/ids that would break the generated script.
    pub strict: bool,
}

impl Default for BundleSettings {
    fn default() -> Self {
        BundleSettings {
            script_extension: DEFAULT_SCRIPT_EXTENSION.to_string(),
            package_extension: DEFAULT_PACKAGE_EXTENSION.to_string(),
            descriptor: DEFAULT_DESCRIPTOR.to_string(),
            strict: false,
        }
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub bundle: BundleSettings,
}

/// CLI overrides; `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub script_extension: Option<String>,
    pub package_extension: Option<String>,
    pub descriptor: Option<String>,
    pub strict: bool,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply CLI overrides. `--strict` can only turn strict mode on.
    pub fn apply(mut self, overrides: &SettingsOverrides) -> Self {
        if let Some(ext) = &overrides.script_extension {
            self.bundle.script_extension = ext.clone();
        }
        if let Some(ext) = &overrides.package_extension {
            self.bundle.package_extension = ext.clone();
        }
        if let Some(descriptor) = &overrides.descriptor {
            self.bundle.descriptor = descriptor.clone();
        }
        self.bundle.strict |= overrides.strict;
        self
    }

    /// Check values that would make the transform meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let script = normalize_extension(&self.bundle.script_extension);
        let package = normalize_extension(&self.bundle.package_extension);

        for (field, ext) in [
            ("bundle.script_extension", &script),
            ("bundle.package_extension", &package),
        ] {
            if ext.len() < 2 || ext.contains('/') {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("'{ext}' is not a file extension"),
                });
            }
        }
        if script == package {
            return Err(ConfigError::InvalidValue {
                field: "bundle.package_extension".to_string(),
                message: "must differ from bundle.script_extension".to_string(),
            });
        }
        if self.bundle.descriptor.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "bundle.descriptor".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Convert into transform options for the bundle crate.
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions::default()
            .with_script_extension(&self.bundle.script_extension)
            .with_package_extension(&self.bundle.package_extension)
            .with_descriptor(self.bundle.descriptor.clone())
            .with_strict_parameters(self.bundle.strict)
    }
}

/// Settings with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: Settings,
    /// Path of the file the settings came from (None for defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file (highest file priority).
    pub config_path: Option<PathBuf>,
    /// Override the XDG config home (used by tests).
    pub config_home: Option<PathBuf>,
}

/// Load settings with the standard resolution order.
///
/// An explicit path that does not exist is an error; a missing XDG file
/// falls back to defaults.
pub fn load_settings(options: &ConfigOptions) -> Result<ResolvedSettings, ConfigError> {
    if let Some(path) = &options.config_path {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.clone() });
        }
        let settings = read_settings(path)?;
        return Ok(ResolvedSettings {
            settings,
            path: Some(path.clone()),
            source: ConfigSource::Explicit,
        });
    }

    let xdg_path = options
        .config_home
        .clone()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));

    if let Some(path) = xdg_path.filter(|p| p.exists()) {
        let settings = read_settings(&path)?;
        return Ok(ResolvedSettings {
            settings,
            path: Some(path),
            source: ConfigSource::XdgConfig,
        });
    }

    Ok(ResolvedSettings {
        settings: Settings::default(),
        path: None,
        source: ConfigSource::BuiltinDefault,
    })
}

fn read_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_toml(&text, path)
}
