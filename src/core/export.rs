// FollowDiff - core/export.rs
//
// Plain text, CSV, and JSON export of the non-follower list.
// Core layer: produces strings; writing them anywhere is the caller's job.

use crate::core::model::{Statistics, Username};
use crate::util::constants::{AT_PREFIX, CSV_HEADER, EXPORT_FILE_STEM, JSON_OBJECT_KEY};
use crate::util::error::ExportError;
use std::str::FromStr;

/// Output format for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown export format \"{other}\" (expected text, csv or json)"
            )),
        }
    }
}

/// Shape of the JSON export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// `["@a", "@b"]`
    #[default]
    Array,
    /// `{ "nonFollowers": ["@a", "@b"] }`
    Object,
}

/// Options shared by every export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Emit bare usernames instead of `@username`.
    pub strip_at: bool,
    pub json_style: JsonStyle,
}

/// The name as it appears in every export format.
///
/// A single stored leading `@` is reused rather than doubled. Stripping
/// removes at most that one `@` and never leaves an empty name.
pub fn display_name(username: &Username, strip_at: bool) -> String {
    let name = username.as_str();
    match name.strip_prefix(AT_PREFIX) {
        Some(rest) if strip_at && !rest.is_empty() => rest.to_string(),
        Some(_) => name.to_string(),
        None if strip_at => name.to_string(),
        None => format!("{AT_PREFIX}{name}"),
    }
}

/// Export `list` in the requested format.
pub fn export<'a, I>(
    list: I,
    format: ExportFormat,
    options: ExportOptions,
) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a Username>,
{
    let names: Vec<String> = list
        .into_iter()
        .map(|u| display_name(u, options.strip_at))
        .collect();

    let output = match format {
        ExportFormat::Text => export_text(&names),
        ExportFormat::Csv => export_csv(&names)?,
        ExportFormat::Json => export_json(&names, options.json_style)?,
    };

    tracing::debug!(
        format = format.extension(),
        entries = names.len(),
        bytes = output.len(),
        "Export rendered"
    );
    Ok(output)
}

/// One name per line, no trailing newline.
pub fn export_text(names: &[String]) -> String {
    names.join("\n")
}

/// `Username` header followed by one name per row, no trailing newline.
pub fn export_csv(names: &[String]) -> Result<String, ExportError> {
    let mut bytes = Vec::new();
    {
        let mut csv_writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut bytes);

        csv_writer
            .write_record([CSV_HEADER])
            .map_err(|e| ExportError::Csv { source: e })?;
        for name in names {
            csv_writer
                .write_record([name])
                .map_err(|e| ExportError::Csv { source: e })?;
        }

        csv_writer.flush().map_err(|e| ExportError::Csv {
            source: csv::Error::from(e),
        })?;
    }

    let mut output = String::from_utf8(bytes).map_err(|e| ExportError::Encoding { source: e })?;
    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Pretty-printed JSON array, or an object wrapping it.
pub fn export_json(names: &[String], style: JsonStyle) -> Result<String, ExportError> {
    let result = match style {
        JsonStyle::Array => serde_json::to_string_pretty(names),
        JsonStyle::Object => {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(
                JSON_OBJECT_KEY.to_string(),
                serde_json::Value::from(names.to_vec()),
            );
            serde_json::to_string_pretty(&wrapper)
        }
    };
    result.map_err(|e| ExportError::Json { source: e })
}

/// Pretty-printed JSON of the session counts.
pub fn export_statistics(stats: &Statistics) -> Result<String, ExportError> {
    serde_json::to_string_pretty(stats).map_err(|e| ExportError::Json { source: e })
}

/// Suggested file name for an export, e.g. `non_followers.csv`.
pub fn default_file_name(format: ExportFormat) -> String {
    format!("{EXPORT_FILE_STEM}.{}", format.extension())
}
