//! Organizer configuration.
//!
//! Settings are loaded from a TOML file into a fixed schema. Unknown keys are
//! rejected and values are validated once at load time, so the rest of the
//! crate can treat the configuration as a plain read-only value.
//!
//! # Configuration File Format
//!
//! ```toml
//! source_dir = "/home/me/Pictures"
//! excluded_folders = ["Private", "/home/me/Pictures/Backups"]
//! image_extensions = ["jpg", "jpeg", "png"]
//! video_extensions = ["mp4", "mov"]
//! unwanted_extensions = ["tmp", "bak"]
//! unwanted_files = ["thumbs.db", ".ds_store"]
//! size_threshold_mb = 500
//! include_unclassified = false
//!
//! [probe]
//! enabled = true
//! program = "ffprobe"
//! timeout_secs = 10
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure, including unknown keys.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// A value parsed but violates a constraint.
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Settings for the external video metadata probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// When false, videos fall straight through to the modification time.
    pub enabled: bool,
    /// Program invoked to read the creation time.
    pub program: String,
    /// Upper bound for a single probe call.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "ffprobe".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Every setting the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizerConfig {
    /// Root of the media tree every operation works on.
    pub source_dir: PathBuf,
    /// Directories that are never traversed. Relative entries resolve under `source_dir`.
    pub excluded_folders: Vec<PathBuf>,
    pub image_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
    pub unwanted_extensions: Vec<String>,
    /// Exact file names (case-insensitive) that count as unwanted.
    pub unwanted_files: Vec<String>,
    /// Files strictly above this many MiB are reported by the large-file scan.
    pub size_threshold_mb: u64,
    /// Also sort files that are neither images nor videos.
    pub include_unclassified: bool,
    pub probe: ProbeConfig,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            excluded_folders: Vec::new(),
            image_extensions: strings(&[
                "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "heic", "webp",
            ]),
            video_extensions: strings(&["mp4", "mov", "avi", "mkv", "wmv", "flv", "3gp", "m4v"]),
            unwanted_extensions: strings(&["tmp", "bak", "log"]),
            unwanted_files: strings(&["thumbs.db", ".ds_store", "desktop.ini"]),
            size_threshold_mb: 500,
            include_unclassified: false,
            probe: ProbeConfig::default(),
        }
    }
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.mediatidyrc.toml` in the current directory
    /// 3. Look for `~/.config/mediatidy/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file that is found fails to parse or validate.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".mediatidyrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("mediatidy")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validated()
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Normalize extension and name lists and check cross-field constraints.
    ///
    /// Extensions may be written with or without a leading dot and in any case;
    /// they are stored lower-cased without the dot.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.image_extensions = normalize_extensions("image_extensions", &self.image_extensions)?;
        self.video_extensions = normalize_extensions("video_extensions", &self.video_extensions)?;
        self.unwanted_extensions =
            normalize_extensions("unwanted_extensions", &self.unwanted_extensions)?;
        self.unwanted_files = normalize_names("unwanted_files", &self.unwanted_files)?;

        let images: HashSet<&String> = self.image_extensions.iter().collect();
        if let Some(shared) = self.video_extensions.iter().find(|ext| images.contains(ext)) {
            return Err(ConfigError::InvalidValue {
                key: "video_extensions",
                reason: format!("'{}' is also listed in image_extensions", shared),
            });
        }

        let media: HashSet<&String> = images
            .into_iter()
            .chain(self.video_extensions.iter())
            .collect();
        if let Some(shared) = self
            .unwanted_extensions
            .iter()
            .find(|ext| media.contains(ext))
        {
            return Err(ConfigError::InvalidValue {
                key: "unwanted_extensions",
                reason: format!("'{}' is also a media extension", shared),
            });
        }

        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "probe.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.probe.enabled && self.probe.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "probe.program",
                reason: "must not be empty when the probe is enabled".to_string(),
            });
        }

        Ok(self)
    }
}

fn normalize_extensions(key: &'static str, values: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(values.len());
    for value in values {
        let ext = value.trim().trim_start_matches('.').to_lowercase();
        if ext.is_empty() {
            return Err(ConfigError::InvalidValue {
                key,
                reason: format!("'{}' is not a valid extension", value),
            });
        }
        if seen.insert(ext.clone()) {
            normalized.push(ext);
        }
    }
    Ok(normalized)
}

fn normalize_names(key: &'static str, values: &[String]) -> Result<Vec<String>, ConfigError> {
    let mut normalized = Vec::with_capacity(values.len());
    for value in values {
        let name = value.trim().to_lowercase();
        if name.is_empty() || name.contains('/') {
            return Err(ConfigError::InvalidValue {
                key,
                reason: format!("'{}' is not a plain file name", value),
            });
        }
        normalized.push(name);
    }
    Ok(normalized)
}
