// FollowDiff - platform/fs.rs
//
// Filesystem helpers: whole-file reads for import (with transient-error
// retry and a size guard) and atomic writes for export.

use crate::util::constants::{READ_MAX_RETRIES, READ_RETRY_DELAYS_MS};
use crate::util::error::{ExportError, ImportError};
use std::io;
use std::path::Path;
use std::time::Duration;

/// Short name used in user-facing messages: the file name when there is one,
/// otherwise the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read the full content of an import file as UTF-8 text.
///
/// Rejects files larger than `max_size` before reading them. Transient I/O
/// errors (WouldBlock, Interrupted, TimedOut) are retried with capped
/// backoff; permanent errors are returned immediately.
pub fn read_import_file(path: &Path, max_size: u64) -> Result<String, ImportError> {
    let file = display_name(path);

    let size = std::fs::metadata(path)
        .map_err(|e| ImportError::Read {
            file: file.clone(),
            source: e,
        })?
        .len();
    if size > max_size {
        return Err(ImportError::FileTooLarge {
            file,
            size,
            max_size,
        });
    }

    read_with_retry(path).map_err(|e| ImportError::Read { file, source: e })
}

fn read_with_retry(path: &Path) -> io::Result<String> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..READ_MAX_RETRIES {
        match std::fs::read_to_string(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(READ_RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::other("Unknown read error")))
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

/// Write `contents` to `path` atomically (write temp, then rename).
///
/// A crash between write and rename leaves any previous file intact.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp_name);

    std::fs::write(&tmp, contents.as_bytes())?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "File written");
    Ok(())
}

/// Write a rendered export to `path` atomically, naming the path on failure.
pub fn write_export(path: &Path, contents: &str) -> Result<(), ExportError> {
    write_atomic(path, contents).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
