//! Extraction of Drive IDs from pasted URLs.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DriveError, Result};

/// URL forms that embed a Drive ID as their first capture group.
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://drive\.google\.com/drive/(?:u/\d+/)?folders/([a-zA-Z0-9_-]+)",
        r"^https?://drive\.google\.com/file/d/([a-zA-Z0-9_-]+)",
        r"^https?://drive\.google\.com/open\?id=([a-zA-Z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid URL pattern"))
    .collect()
});

/// A bare Drive ID: alphanumeric, underscore, hyphen.
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("invalid ID pattern"));

/// Extract a Drive ID from a URL, or validate a raw ID.
///
/// Accepts folder URLs (`/drive/folders/<id>`, with or without the
/// `/u/N/` account segment), file URLs (`/file/d/<id>/...`), `open?id=`
/// links, and bare IDs.
pub fn extract_id(input: &str) -> Result<String> {
    let input = input.trim();

    for pattern in URL_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(input) {
            return Ok(captures[1].to_string());
        }
    }

    if ID_PATTERN.is_match(input) {
        return Ok(input.to_string());
    }

    Err(DriveError::InvalidUrlOrId(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_id() {
        assert_eq!(extract_id("1A2b3C_d-4").unwrap(), "1A2b3C_d-4");
    }

    #[test]
    fn test_folder_url() {
        let id = extract_id("https://drive.google.com/drive/folders/1AbCdEf").unwrap();
        assert_eq!(id, "1AbCdEf");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(extract_id("not a url, not an id").is_err());
    }
}
