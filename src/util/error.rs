// FollowDiff - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every failure is recoverable: callers keep their previously committed
// state and the user may retry.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all FollowDiff operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum FollowDiffError {
    /// Importing a followers/following file failed.
    Import(ImportError),

    /// The non-follower list could not be computed.
    Reconcile(ReconcileError),

    /// Rendering or writing an export failed.
    Export(ExportError),
}

impl fmt::Display for FollowDiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(e) => write!(f, "Import error: {e}"),
            Self::Reconcile(e) => write!(f, "Reconcile error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
        }
    }
}

impl std::error::Error for FollowDiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Import(e) => Some(e),
            Self::Reconcile(e) => Some(e),
            Self::Export(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Import errors
// ---------------------------------------------------------------------------

/// Errors raised while turning one uploaded file into a username set.
///
/// `file` is the display name of the file (not necessarily a full path) so
/// the message can be shown to the user as-is.
#[derive(Debug)]
pub enum ImportError {
    /// The file could not be read.
    Read { file: String, source: io::Error },

    /// The file exceeds the configured import size limit.
    FileTooLarge {
        file: String,
        size: u64,
        max_size: u64,
    },

    /// The text is not valid JSON.
    Parse {
        file: String,
        source: serde_json::Error,
    },

    /// Valid JSON, but no array of relationship records could be located.
    UnrecognizedFormat {
        file: String,
        attempted_keys: Vec<String>,
    },
}

impl ImportError {
    /// Display name of the file the error refers to.
    pub fn file(&self) -> &str {
        match self {
            Self::Read { file, .. }
            | Self::FileTooLarge { file, .. }
            | Self::Parse { file, .. }
            | Self::UnrecognizedFormat { file, .. } => file,
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { file, source } => write!(f, "Cannot read '{file}': {source}"),
            Self::FileTooLarge {
                file,
                size,
                max_size,
            } => write!(
                f,
                "'{file}' is {size} bytes, exceeds maximum of {max_size} bytes"
            ),
            Self::Parse { file, source } => {
                write!(f, "'{file}' is not valid JSON: {source}")
            }
            Self::UnrecognizedFormat {
                file,
                attempted_keys,
            } => write!(
                f,
                "'{file}': no list of accounts found. Expected a top-level array \
                 or one of the keys [{}]",
                attempted_keys.join(", ")
            ),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ImportError> for FollowDiffError {
    fn from(e: ImportError) -> Self {
        Self::Import(e)
    }
}

// ---------------------------------------------------------------------------
// Reconcile errors
// ---------------------------------------------------------------------------

/// Errors related to computing the non-follower list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// `recompute` was called before this side had been loaded.
    SideNotLoaded { side: &'static str },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SideNotLoaded { side } => {
                write!(f, "The {side} list has not been loaded yet")
            }
        }
    }
}

impl std::error::Error for ReconcileError {}

impl From<ReconcileError> for FollowDiffError {
    fn from(e: ReconcileError) -> Self {
        Self::Reconcile(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export output.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { source: csv::Error },

    /// JSON serialisation error.
    Json { source: serde_json::Error },

    /// Serialised output was not valid UTF-8.
    Encoding { source: std::string::FromUtf8Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { source } => write!(f, "CSV export error: {source}"),
            Self::Json { source } => write!(f, "JSON export error: {source}"),
            Self::Encoding { source } => write!(f, "Export produced invalid UTF-8: {source}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source } => Some(source),
            Self::Json { source } => Some(source),
            Self::Encoding { source } => Some(source),
        }
    }
}

impl From<ExportError> for FollowDiffError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading. These never abort a run: the
/// loader reports them as warnings and falls back to defaults.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for FollowDiff results.
pub type Result<T> = std::result::Result<T, FollowDiffError>;
