// FollowDiff - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "FollowDiff";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "FollowDiff";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Import
// =============================================================================

/// Wrapper keys tried, in priority order, when the top-level JSON value is an
/// object rather than an array of relationship records.
///
/// Different export revisions have used different names; none of them is
/// authoritative, so the list is overridable via `[import] wrapper_keys`.
pub const DEFAULT_WRAPPER_KEYS: &[&str] = &[
    "relationships_followers",
    "relationships_following",
    "followers",
    "following",
    "relationships_unfollowed_users",
    "unfollowed",
    "string_map_data",
];

/// Field holding the per-record list of value entries.
pub const STRING_LIST_FIELD: &str = "string_list_data";

/// Number of relationship records processed between cooperative yields.
pub const DEFAULT_EXTRACT_CHUNK_SIZE: usize = 2_000;

/// Minimum user-configurable chunk size.
pub const MIN_EXTRACT_CHUNK_SIZE: usize = 100;

/// Maximum user-configurable chunk size.
pub const MAX_EXTRACT_CHUNK_SIZE: usize = 1_000_000;

/// Largest export file accepted for import. Real exports are a few MB even
/// for accounts with hundreds of thousands of relationships.
pub const DEFAULT_MAX_IMPORT_FILE_SIZE: u64 = 256 * 1024 * 1024; // 256 MB

/// Hard upper bound on the configurable import size.
pub const ABSOLUTE_MAX_IMPORT_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024; // 2 GB

/// Smallest configurable import size.
pub const MIN_MAX_IMPORT_FILE_SIZE: u64 = 1024;

/// Retry limits for transient I/O errors while reading an import file.
pub const READ_MAX_RETRIES: u32 = 3;
pub const READ_RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

// =============================================================================
// Export
// =============================================================================

/// Prefix added to every exported username unless `strip_at` is set.
pub const AT_PREFIX: char = '@';

/// CSV header line.
pub const CSV_HEADER: &str = "Username";

/// Key used by the object-style JSON export.
pub const JSON_OBJECT_KEY: &str = "nonFollowers";

/// Base name for exported files (extension follows the format).
pub const EXPORT_FILE_STEM: &str = "non_followers";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log levels accepted in `[logging] level`.
pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
