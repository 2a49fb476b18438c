//! Input validation for user-supplied paper ids and generated filenames.
//!
//! Paper ids arrive from MCP clients and end up both in URLs and on disk, so
//! they are screened for path traversal and shell metacharacters first.

use thiserror::Error;

/// Longest file stem produced by [`sanitize_filename`], in UTF-8 bytes
pub const MAX_FILENAME_BYTES: usize = 200;

/// Validation error types
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid paper ID: {0}")]
    InvalidPaperId(String),

    #[error("Path traversal detected: {0}")]
    PathTraversal(String),
}

/// Validate a paper ID to prevent injection attacks
///
/// arXiv ids only need alphanumerics, dots, dashes, slashes (old-style
/// `hep-th/9901001`) and the colon of an `arXiv:` prefix or URL.
pub fn sanitize_paper_id(id: &str) -> Result<String, ValidationError> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::InvalidPaperId("empty ID".to_string()));
    }

    if id.contains("..") || id.contains("./") || id.contains(".\\") {
        return Err(ValidationError::PathTraversal(id.to_string()));
    }

    if id.chars().any(char::is_control) {
        return Err(ValidationError::InvalidPaperId(
            "contains control characters".to_string(),
        ));
    }

    let dangerous_chars = [
        ';', '|', '&', '$', '`', '(', ')', '{', '}', '[', ']', '<', '>', '*', '?', '!', '\\',
        '"', '\'',
    ];
    if let Some(ch) = id.chars().find(|c| dangerous_chars.contains(c)) {
        return Err(ValidationError::InvalidPaperId(format!(
            "contains dangerous character: {}",
            ch
        )));
    }

    Ok(id.to_string())
}

/// Turn arbitrary text into a safe file stem
///
/// Drops `<>:"/\|?*` and control characters, turns spaces into underscores
/// and caps the UTF-8 length at [`MAX_FILENAME_BYTES`] on a character
/// boundary. Never returns an empty string.
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len().min(MAX_FILENAME_BYTES));
    let kept = name
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .map(|c| if c.is_whitespace() { '_' } else { c });
    for c in kept {
        if sanitized.len() + c.len_utf8() > MAX_FILENAME_BYTES {
            break;
        }
        sanitized.push(c);
    }

    // A stem made only of dots would resolve to the directory itself or its parent
    if sanitized.chars().all(|c| c == '.' || c == '_') {
        "untitled".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_paper_id_valid() {
        assert!(sanitize_paper_id("2301.12345").is_ok());
        assert!(sanitize_paper_id("2301.12345v2").is_ok());
        assert!(sanitize_paper_id("arXiv:2301.12345").is_ok());
        assert!(sanitize_paper_id("hep-th/9901001").is_ok());
        assert_eq!(sanitize_paper_id("  2301.12345 ").unwrap(), "2301.12345");
    }

    #[test]
    fn test_sanitize_paper_id_empty() {
        assert!(sanitize_paper_id("").is_err());
        assert!(sanitize_paper_id("   ").is_err());
    }

    #[test]
    fn test_sanitize_paper_id_path_traversal() {
        assert!(matches!(
            sanitize_paper_id("../etc/passwd"),
            Err(ValidationError::PathTraversal(_))
        ));
        assert!(sanitize_paper_id("foo/../../bar").is_err());
    }

    #[test]
    fn test_sanitize_paper_id_dangerous_chars() {
        assert!(sanitize_paper_id("foo;rm -rf /").is_err());
        assert!(sanitize_paper_id("foo|whoami").is_err());
        assert!(sanitize_paper_id("foo`ls`").is_err());
        assert!(sanitize_paper_id("foo$(whoami)").is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("2301.12345v1_Attention: Is It All?"),
            "2301.12345v1_Attention_Is_It_All"
        );
        assert_eq!(sanitize_filename("hep-th/9901001_A/B"), "hep-th9901001_AB");
    }

    #[test]
    fn test_sanitize_filename_caps_length() {
        let long = "a".repeat(500);
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_BYTES);
    }

    #[test]
    fn test_sanitize_filename_caps_multibyte_titles_by_bytes() {
        // Three bytes per character
        let title = format!("2401.00001v1_{}", "\u{91cf}\u{5b50}".repeat(150));
        let stem = sanitize_filename(&title);
        assert!(stem.len() <= MAX_FILENAME_BYTES);
        assert!(stem.len() > MAX_FILENAME_BYTES - 4);
        assert!(stem.starts_with("2401.00001v1_\u{91cf}"));
        // Room for ".pdf" within the usual 255-byte name limit
        assert!(format!("{}.pdf", stem).len() <= 255);
    }

    #[test]
    fn test_sanitize_filename_never_empty() {
        assert_eq!(sanitize_filename("???"), "untitled");
        assert_eq!(sanitize_filename(".."), "untitled");
    }
}
