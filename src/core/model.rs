// FollowDiff - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// =============================================================================
// Username
// =============================================================================

/// A case-normalised account identifier.
///
/// Always lowercase and never empty; construct through [`Username::new`].
/// No other validation is applied: any non-empty string value found in an
/// export is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Normalise `raw` into a username. Returns `None` for empty input.
    pub fn new(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Set of unique usernames for one side of the relationship.
pub type UsernameSet = HashSet<Username>;

// =============================================================================
// Relationship records (raw export shape)
// =============================================================================

/// One exported relationship entry.
///
/// The export nests one username per sub-entry, typically exactly one.
/// `string_list_data` is optional so that a record missing it deserialises
/// cleanly and can be skipped by the importer. Entries stay untyped: only
/// their `value` field is read, and a sibling entry with unexpected field
/// types must not cost the rest of the record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipRecord {
    #[serde(default)]
    pub string_list_data: Option<Vec<serde_json::Value>>,
}

impl RelationshipRecord {
    /// String `value` of each entry, in order. Entries without a string
    /// value are passed over.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.string_list_data
            .iter()
            .flatten()
            .filter_map(|entry| entry.get("value").and_then(serde_json::Value::as_str))
    }
}

// =============================================================================
// Side
// =============================================================================

/// Which canonical set an import targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Accounts following the user.
    Followers,
    /// Accounts the user follows.
    Following,
}

impl Side {
    pub fn all() -> &'static [Side] {
        &[Side::Followers, Side::Following]
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Side::Followers => "followers",
            Side::Following => "following",
        }
    }

    /// Stable array index, used for per-side bookkeeping.
    pub fn index(&self) -> usize {
        match self {
            Side::Followers => 0,
            Side::Following => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Sorting and statistics
// =============================================================================

/// Direction of the non-follower list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Self::Ascending
        } else {
            Self::Descending
        }
    }

    pub fn is_ascending(&self) -> bool {
        matches!(self, Self::Ascending)
    }
}

/// Projection of the current set sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub follower_count: usize,
    pub following_count: usize,
    pub non_follower_count: usize,
}

// =============================================================================
// Import outcome
// =============================================================================

/// Which extraction rule located the record array in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedStrategy {
    TopLevelArray,
    WrapperKey(String),
    FirstProperty(String),
}

impl std::fmt::Display for MatchedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopLevelArray => f.write_str("top-level array"),
            Self::WrapperKey(key) => write!(f, "wrapper key '{key}'"),
            Self::FirstProperty(key) => write!(f, "first property '{key}'"),
        }
    }
}

/// Pure result of importing one file. Nothing is committed until the caller
/// hands this to the session.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Display name of the imported file.
    pub file: String,

    /// Deduplicated, lowercased usernames.
    pub usernames: UsernameSet,

    /// Number of relationship records found.
    pub records: usize,

    /// Records skipped because they lacked a usable `string_list_data`.
    pub skipped_records: usize,

    /// The rule that located the record array.
    pub strategy: MatchedStrategy,
}

impl ImportOutcome {
    pub fn is_empty(&self) -> bool {
        self.usernames.is_empty()
    }
}

/// Informational notices raised by an otherwise successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportNotice {
    /// The file was recognised but contained no usernames. The side is now
    /// treated as having zero members.
    Empty { file: String },
}

impl std::fmt::Display for ImportNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { file } => write!(f, "'{file}' contains no accounts"),
        }
    }
}

/// What the session reports back after committing an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub side: Side,
    pub file: String,
    pub usernames: usize,
    pub records: usize,
    pub skipped_records: usize,
    pub notice: Option<ImportNotice>,
}

// =============================================================================
// Import progress (for consumer updates)
// =============================================================================

/// Messages sent from an import worker thread to the consumer thread.
///
/// Every message carries the side and the generation it belongs to so the
/// consumer can drop results from superseded imports.
#[derive(Debug)]
pub enum ImportProgress {
    /// The worker started reading the file.
    Started { side: Side, generation: u64 },

    /// A slice of records has been processed.
    Progress {
        side: Side,
        generation: u64,
        processed: usize,
        total: usize,
    },

    /// The file was imported; the outcome is ready to commit.
    Completed {
        side: Side,
        generation: u64,
        outcome: ImportOutcome,
    },

    /// The import failed. Prior state for the side must be kept.
    Failed {
        side: Side,
        generation: u64,
        error: crate::util::error::ImportError,
    },

    /// The import was superseded or cancelled before completion.
    Cancelled { side: Side, generation: u64 },
}

impl ImportProgress {
    pub fn side(&self) -> Side {
        match self {
            Self::Started { side, .. }
            | Self::Progress { side, .. }
            | Self::Completed { side, .. }
            | Self::Failed { side, .. }
            | Self::Cancelled { side, .. } => *side,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Started { generation, .. }
            | Self::Progress { generation, .. }
            | Self::Completed { generation, .. }
            | Self::Failed { generation, .. }
            | Self::Cancelled { generation, .. } => *generation,
        }
    }

    /// True for messages that end an import (completed, failed, cancelled).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Cancelled { .. }
        )
    }
}
