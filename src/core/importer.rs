// FollowDiff - core/importer.rs
//
// Turns the raw text of one exported followers/following file into a
// deduplicated username set.
//
// Core layer: pure functions of their input. Nothing here touches shared
// state, so the caller decides whether a result is committed.
//
// Format tolerance is an ordered list of extraction strategies. Each one
// either yields the array of relationship records or reports no match;
// the first match wins.

use crate::core::model::{
    ImportOutcome, MatchedStrategy, RelationshipRecord, Username, UsernameSet,
};
use crate::util::constants;
use crate::util::error::ImportError;
use serde::Deserialize;
use serde_json::Value;
use std::ops::ControlFlow;

// =============================================================================
// Configuration
// =============================================================================

/// One rule for locating the record array inside a parsed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// The document itself is the array.
    TopLevelArray,

    /// The document is an object holding the array under this key.
    WrapperKey(String),

    /// The array value of the object's first property, in document order.
    FirstProperty,
}

impl ExtractionStrategy {
    /// Returns the matched array, or `None` if this rule does not apply.
    fn try_extract<'v>(&self, value: &'v Value) -> Option<(&'v [Value], MatchedStrategy)> {
        match self {
            Self::TopLevelArray => value
                .as_array()
                .map(|records| (records.as_slice(), MatchedStrategy::TopLevelArray)),
            Self::WrapperKey(key) => value
                .get(key.as_str())
                .and_then(Value::as_array)
                .map(|records| {
                    (
                        records.as_slice(),
                        MatchedStrategy::WrapperKey(key.clone()),
                    )
                }),
            Self::FirstProperty => {
                let (key, first) = value.as_object()?.iter().next()?;
                first.as_array().map(|records| {
                    (
                        records.as_slice(),
                        MatchedStrategy::FirstProperty(key.clone()),
                    )
                })
            }
        }
    }
}

/// Ordered list of extraction strategies, tried first to last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionStrategies(Vec<ExtractionStrategy>);

impl ExtractionStrategies {
    /// Standard order: top-level array, then each wrapper key in the given
    /// priority order, then the first-property fallback.
    pub fn from_wrapper_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut strategies = vec![ExtractionStrategy::TopLevelArray];
        strategies.extend(keys.into_iter().map(|k| ExtractionStrategy::WrapperKey(k.into())));
        strategies.push(ExtractionStrategy::FirstProperty);
        Self(strategies)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractionStrategy> {
        self.0.iter()
    }

    /// Wrapper keys in priority order, for error reporting.
    pub fn attempted_keys(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|s| match s {
                ExtractionStrategy::WrapperKey(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for ExtractionStrategies {
    fn default() -> Self {
        Self::from_wrapper_keys(constants::DEFAULT_WRAPPER_KEYS.iter().copied())
    }
}

/// Everything the importer needs besides the file text.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub strategies: ExtractionStrategies,

    /// Records processed between checkpoints in chunked extraction.
    pub chunk_size: usize,

    /// Files larger than this are rejected before reading.
    pub max_file_size: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            strategies: ExtractionStrategies::default(),
            chunk_size: constants::DEFAULT_EXTRACT_CHUNK_SIZE,
            max_file_size: constants::DEFAULT_MAX_IMPORT_FILE_SIZE,
        }
    }
}

// =============================================================================
// Parsing and record location
// =============================================================================

/// Parse raw file text as JSON. A leading UTF-8 byte-order mark is ignored.
pub fn parse(file_name: &str, raw_text: &str) -> Result<Value, ImportError> {
    let text = raw_text.strip_prefix('\u{feff}').unwrap_or(raw_text);
    serde_json::from_str(text).map_err(|e| ImportError::Parse {
        file: file_name.to_string(),
        source: e,
    })
}

/// Locate the array of relationship records inside a parsed export.
pub fn extract_records<'v>(
    file_name: &str,
    value: &'v Value,
    strategies: &ExtractionStrategies,
) -> Result<(&'v [Value], MatchedStrategy), ImportError> {
    for strategy in strategies.iter() {
        if let Some((records, matched)) = strategy.try_extract(value) {
            tracing::debug!(
                file = file_name,
                strategy = %matched,
                records = records.len(),
                "Located relationship records"
            );
            return Ok((records, matched));
        }
    }

    Err(ImportError::UnrecognizedFormat {
        file: file_name.to_string(),
        attempted_keys: strategies.attempted_keys(),
    })
}

// =============================================================================
// Username extraction
// =============================================================================

/// Accumulated result of username extraction.
#[derive(Debug, Clone, Default)]
pub struct UsernameExtraction {
    pub usernames: UsernameSet,

    /// Records without a usable `string_list_data` field.
    pub skipped_records: usize,
}

impl UsernameExtraction {
    /// Fold one record into the accumulator. A malformed record is counted
    /// and skipped; it never aborts the file.
    fn absorb(&mut self, record: &Value) {
        match RelationshipRecord::deserialize(record) {
            Ok(record) if record.string_list_data.is_some() => {
                for username in record.values().filter_map(Username::new) {
                    tracing::trace!(username = %username, "Extracted username");
                    self.usernames.insert(username);
                }
            }
            Ok(_) => {
                tracing::debug!(
                    field = constants::STRING_LIST_FIELD,
                    "Record has no value list, skipping"
                );
                self.skipped_records += 1;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Malformed relationship record, skipping");
                self.skipped_records += 1;
            }
        }
    }
}

/// Extract every username from `records` in a single pass.
pub fn extract_usernames(records: &[Value]) -> UsernameExtraction {
    let mut extraction = UsernameExtraction::default();
    for record in records {
        extraction.absorb(record);
    }
    extraction
}

/// Extract usernames in fixed-size slices, calling `checkpoint` with
/// `(processed, total)` after each slice.
///
/// Returning `ControlFlow::Break` from the checkpoint abandons the work and
/// yields `None`. Only local accumulation state is touched between slices.
pub fn extract_usernames_chunked<F>(
    records: &[Value],
    chunk_size: usize,
    mut checkpoint: F,
) -> Option<UsernameExtraction>
where
    F: FnMut(usize, usize) -> ControlFlow<()>,
{
    let total = records.len();
    let mut processed = 0;
    let mut extraction = UsernameExtraction::default();

    for chunk in records.chunks(chunk_size.max(1)) {
        for record in chunk {
            extraction.absorb(record);
        }
        processed += chunk.len();
        if checkpoint(processed, total).is_break() {
            tracing::debug!(processed, total, "Extraction stopped at checkpoint");
            return None;
        }
    }

    Some(extraction)
}

// =============================================================================
// Whole-file import
// =============================================================================

/// Parse, locate, and extract in one pure call.
pub fn import_text(
    file_name: &str,
    raw_text: &str,
    config: &ImportConfig,
) -> Result<ImportOutcome, ImportError> {
    let outcome = import_text_chunked(file_name, raw_text, config, |_, _| {
        ControlFlow::Continue(())
    })?;
    // The checkpoint above never breaks.
    Ok(outcome.unwrap_or_else(|| empty_outcome(file_name)))
}

/// Chunked variant of [`import_text`]. `Ok(None)` means the checkpoint
/// abandoned the import.
pub fn import_text_chunked<F>(
    file_name: &str,
    raw_text: &str,
    config: &ImportConfig,
    checkpoint: F,
) -> Result<Option<ImportOutcome>, ImportError>
where
    F: FnMut(usize, usize) -> ControlFlow<()>,
{
    let value = parse(file_name, raw_text)?;
    let (records, strategy) = extract_records(file_name, &value, &config.strategies)?;

    let Some(extraction) = extract_usernames_chunked(records, config.chunk_size, checkpoint)
    else {
        return Ok(None);
    };

    tracing::info!(
        file = file_name,
        records = records.len(),
        usernames = extraction.usernames.len(),
        skipped = extraction.skipped_records,
        "Import parsed"
    );

    Ok(Some(ImportOutcome {
        file: file_name.to_string(),
        usernames: extraction.usernames,
        records: records.len(),
        skipped_records: extraction.skipped_records,
        strategy,
    }))
}

fn empty_outcome(file_name: &str) -> ImportOutcome {
    ImportOutcome {
        file: file_name.to_string(),
        usernames: UsernameSet::new(),
        records: 0,
        skipped_records: 0,
        strategy: MatchedStrategy::TopLevelArray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(outcome: &ImportOutcome) -> Vec<String> {
        let mut v: Vec<String> = outcome
            .usernames
            .iter()
            .map(|u| u.as_str().to_string())
            .collect();
        v.sort();
        v
    }

    fn import(text: &str) -> Result<ImportOutcome, ImportError> {
        import_text("test.json", text, &ImportConfig::default())
    }

    #[test]
    fn test_top_level_array() {
        let text = r#"[
            {"string_list_data": [{"href": "https://x/amy", "value": "amy", "timestamp": 1700000000}]},
            {"string_list_data": [{"value": "bob"}]}
        ]"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["amy", "bob"]);
        assert_eq!(outcome.strategy, MatchedStrategy::TopLevelArray);
        assert_eq!(outcome.records, 2);
    }

    #[test]
    fn test_wrapper_key() {
        let text = r#"{"relationships_following": [{"string_list_data":[{"value":"bob"}]}]}"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["bob"]);
        assert_eq!(
            outcome.strategy,
            MatchedStrategy::WrapperKey("relationships_following".to_string())
        );
    }

    #[test]
    fn test_wrapper_key_priority_order() {
        // Both keys present: the earlier key in the priority list wins even
        // though it appears later in the document.
        let text = r#"{
            "following": [{"string_list_data":[{"value":"late"}]}],
            "relationships_followers": [{"string_list_data":[{"value":"early"}]}]
        }"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["early"]);
    }

    #[test]
    fn test_wrapper_key_that_is_not_an_array_is_passed_over() {
        let text = r#"{
            "followers": {"count": 3},
            "following": [{"string_list_data":[{"value":"zed"}]}]
        }"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["zed"]);
        assert_eq!(
            outcome.strategy,
            MatchedStrategy::WrapperKey("following".to_string())
        );
    }

    #[test]
    fn test_first_property_fallback_uses_document_order() {
        let text = r#"{
            "zz_custom": [{"string_list_data":[{"value":"first"}]}],
            "aa_other": [{"string_list_data":[{"value":"second"}]}]
        }"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["first"]);
        assert_eq!(
            outcome.strategy,
            MatchedStrategy::FirstProperty("zz_custom".to_string())
        );
    }

    #[test]
    fn test_unrecognized_format_names_keys() {
        let err = import(r#"{"meta": {"version": 2}}"#).unwrap_err();
        match err {
            ImportError::UnrecognizedFormat {
                file,
                attempted_keys,
            } => {
                assert_eq!(file, "test.json");
                assert!(attempted_keys.contains(&"relationships_followers".to_string()));
            }
            other => panic!("expected UnrecognizedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_document_is_unrecognized() {
        assert!(matches!(
            import("42"),
            Err(ImportError::UnrecognizedFormat { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = import("{not json").unwrap_err();
        assert!(matches!(err, ImportError::Parse { .. }), "got {err:?}");
        assert_eq!(err.file(), "test.json");
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let text = r#"[
            {"string_list_data":[{"value":"a"}]},
            {"no_string_list_data": true},
            {"string_list_data":[{"value":"b"}]}
        ]"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["a", "b"]);
        assert_eq!(outcome.skipped_records, 1);
    }

    #[test]
    fn test_wrong_shape_records_are_skipped() {
        let text = r#"[
            "not a record",
            {"string_list_data": "oops"},
            {"string_list_data":[{"value":"kept"}]}
        ]"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["kept"]);
        assert_eq!(outcome.skipped_records, 2);
    }

    #[test]
    fn test_fractional_timestamp_keeps_username() {
        let text = r#"[{"string_list_data":[{"value":"amy","timestamp":1700000000.5}]}]"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["amy"]);
        assert_eq!(outcome.skipped_records, 0);
    }

    #[test]
    fn test_bad_sibling_entry_keeps_the_others() {
        let text = r#"[
            {"string_list_data":[{"value":"amy"}, {"value":42}, {"value":"bob","href":9}]}
        ]"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["amy", "bob"]);
        assert_eq!(outcome.skipped_records, 0);
    }

    #[test]
    fn test_case_and_duplicates_collapse() {
        let text = r#"[
            {"string_list_data":[{"value":"Alice"}]},
            {"string_list_data":[{"value":"alice"}, {"value":"ALICE"}]}
        ]"#;
        let outcome = import(text).unwrap();
        assert_eq!(names(&outcome), vec!["alice"]);
    }

    #[test]
    fn test_empty_and_missing_values_ignored() {
        let text = r#"[
            {"string_list_data":[{"value":""}, {"href":"https://x/none"}]},
            {"string_list_data":[]}
        ]"#;
        let outcome = import(text).unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.skipped_records, 0);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let outcome = import("[]").unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.records, 0);
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let outcome = import("\u{feff}[{\"string_list_data\":[{\"value\":\"amy\"}]}]").unwrap();
        assert_eq!(names(&outcome), vec!["amy"]);
    }

    #[test]
    fn test_custom_wrapper_keys() {
        let config = ImportConfig {
            strategies: ExtractionStrategies::from_wrapper_keys(["people"]),
            ..Default::default()
        };
        let text = r#"{"meta": [], "people": [{"string_list_data":[{"value":"x"}]}]}"#;
        let outcome = import_text("custom.json", text, &config).unwrap();
        assert_eq!(names(&outcome), vec!["x"]);
    }

    #[test]
    fn test_chunked_extraction_reports_each_slice() {
        let records: Vec<Value> = (0..5)
            .map(|i| serde_json::json!({"string_list_data": [{"value": format!("user{i}")}]}))
            .collect();
        let mut seen = Vec::new();
        let extraction = extract_usernames_chunked(&records, 2, |processed, total| {
            seen.push((processed, total));
            ControlFlow::Continue(())
        })
        .unwrap();
        assert_eq!(extraction.usernames.len(), 5);
        assert_eq!(seen, vec![(2, 5), (4, 5), (5, 5)]);
    }

    #[test]
    fn test_chunked_extraction_can_be_abandoned() {
        let records: Vec<Value> = (0..10)
            .map(|i| serde_json::json!({"string_list_data": [{"value": format!("u{i}")}]}))
            .collect();
        let result = extract_usernames_chunked(&records, 3, |processed, _| {
            if processed >= 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert!(result.is_none());
    }
}
