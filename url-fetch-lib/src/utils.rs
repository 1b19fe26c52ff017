//! Helpers for reading lists of resource identifiers.

use crate::error::FetchError;
use std::path::Path;

/// Parse a list of resource identifiers, one per line.
///
/// Empty lines and lines starting with `#` are skipped; surrounding
/// whitespace is trimmed. Order is preserved.
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read a list of resource identifiers from a file.
///
/// # Errors
///
/// Returns `FileError` if the file cannot be read.
pub async fn read_url_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>, FetchError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        FetchError::file_error(path.to_string_lossy(), format!("Failed to read URL list: {}", e))
    })?;
    Ok(parse_url_list(&content))
}
