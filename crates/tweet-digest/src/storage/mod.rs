//! Digest storage module.
//!
//! Persists the seen-tweet set and the digest report as JSON files.

mod seen;

pub use seen::SeenTweetStore;

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::DigestResult;

/// Timestamp format used in every persisted file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Write `value` as pretty JSON to `path`.
///
/// The content goes to a temporary file in the same directory which is then renamed
/// over `path`, so readers never observe a half-written file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> DigestResult<()> {
    let content = serde_json::to_string_pretty(value)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
