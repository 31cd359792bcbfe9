// FollowDiff - platform/config.rs
//
// Platform-specific configuration, directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for FollowDiff configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/followdiff/ or %APPDATA%\FollowDiff\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[import]` section.
    pub import: ImportSection,
    /// `[export]` section.
    pub export: ExportSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[import]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ImportSection {
    /// Wrapper keys tried in priority order when a file is a JSON object.
    pub wrapper_keys: Option<Vec<String>>,
    /// Records processed between cooperative yields.
    pub chunk_size: Option<usize>,
    /// Largest file accepted for import.
    pub max_file_size_bytes: Option<u64>,
}

/// `[export]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// "text", "csv" or "json".
    pub format: Option<String>,
    /// Emit usernames without the leading '@'.
    pub strip_at: Option<bool>,
    /// "array" or "object".
    pub json_style: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Import --
    pub wrapper_keys: Vec<String>,
    pub chunk_size: usize,
    pub max_file_size: u64,

    // -- Export --
    /// Lowercase format name, one of "text", "csv", "json".
    pub export_format: String,
    pub strip_at: bool,
    /// True for `{ "nonFollowers": [...] }`, false for a bare array.
    pub json_object: bool,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wrapper_keys: constants::DEFAULT_WRAPPER_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            chunk_size: constants::DEFAULT_EXTRACT_CHUNK_SIZE,
            max_file_size: constants::DEFAULT_MAX_IMPORT_FILE_SIZE,
            export_format: "text".to_string(),
            strip_at: false,
            json_object: false,
            log_level: None,
        }
    }
}

/// Load and validate config.toml at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file yields defaults with no warnings (first run). An unreadable
/// or unparseable file yields defaults plus a warning: the application still
/// runs but the user is informed.
///
/// Runs before logging is initialised, so problems are only reported through
/// the returned warnings.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        return (AppConfig::default(), warnings);
    }

    let raw = match read_raw_config(config_path) {
        Ok(raw) => raw,
        Err(e) => {
            warnings.push(format!("{e}. Using defaults."));
            return (AppConfig::default(), warnings);
        }
    };

    let config = validate(raw, &mut warnings);
    (config, warnings)
}

fn read_raw_config(config_path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })
}

/// Validate each field against named constants, accumulating all problems.
fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();

    // -- Import: wrapper_keys --
    if let Some(keys) = raw.import.wrapper_keys {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            warnings.push(
                "[import] wrapper_keys is empty. Using the built-in key list.".to_string(),
            );
        } else {
            config.wrapper_keys = keys;
        }
    }

    // -- Import: chunk_size --
    if let Some(size) = raw.import.chunk_size {
        if (constants::MIN_EXTRACT_CHUNK_SIZE..=constants::MAX_EXTRACT_CHUNK_SIZE).contains(&size)
        {
            config.chunk_size = size;
        } else {
            warnings.push(out_of_range(
                "[import] chunk_size",
                size,
                constants::MIN_EXTRACT_CHUNK_SIZE,
                constants::MAX_EXTRACT_CHUNK_SIZE,
                constants::DEFAULT_EXTRACT_CHUNK_SIZE,
            ));
        }
    }

    // -- Import: max_file_size_bytes --
    if let Some(bytes) = raw.import.max_file_size_bytes {
        if (constants::MIN_MAX_IMPORT_FILE_SIZE..=constants::ABSOLUTE_MAX_IMPORT_FILE_SIZE)
            .contains(&bytes)
        {
            config.max_file_size = bytes;
        } else {
            warnings.push(out_of_range(
                "[import] max_file_size_bytes",
                bytes,
                constants::MIN_MAX_IMPORT_FILE_SIZE,
                constants::ABSOLUTE_MAX_IMPORT_FILE_SIZE,
                constants::DEFAULT_MAX_IMPORT_FILE_SIZE,
            ));
        }
    }

    // -- Export: format --
    if let Some(ref format) = raw.export.format {
        match format.to_lowercase().as_str() {
            "text" | "txt" => config.export_format = "text".to_string(),
            "csv" => config.export_format = "csv".to_string(),
            "json" => config.export_format = "json".to_string(),
            other => warnings.push(format!(
                "[export] format = \"{other}\" is not recognised. \
                 Expected \"text\", \"csv\" or \"json\". Using default (text).",
            )),
        }
    }

    // -- Export: strip_at --
    if let Some(strip) = raw.export.strip_at {
        config.strip_at = strip;
    }

    // -- Export: json_style --
    if let Some(ref style) = raw.export.json_style {
        match style.to_lowercase().as_str() {
            "array" => config.json_object = false,
            "object" => config.json_object = true,
            other => warnings.push(format!(
                "[export] json_style = \"{other}\" is not recognised. \
                 Expected \"array\" or \"object\". Using default (array).",
            )),
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        if constants::VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: {}. Using default ({}).",
                constants::VALID_LOG_LEVELS.join(", "),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    config
}

fn out_of_range<T: std::fmt::Display>(field: &str, value: T, min: T, max: T, default: T) -> String {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: format!("{min}-{max}, using default ({default})"),
    }
    .to_string()
}
