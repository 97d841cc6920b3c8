//! Utility functions for the webhook schema crate.

use crate::errors::InitError;

/// Validate a dotted field path used as an index key.
///
/// A path is a non-empty, `.`-separated list of non-empty segments. Segments
/// may not start with `$` (reserved for operators) and the path may not
/// contain a NUL byte. Hyphens are allowed, so `headers.x-signature` is valid.
///
/// # Example
///
/// ```
/// use webhook_schema::validate_field_path;
///
/// assert!(validate_field_path("headers.x-signature").is_ok());
/// assert!(validate_field_path("headers..x").is_err());
/// ```
pub fn validate_field_path(path: &str) -> Result<(), InitError> {
    if path.is_empty() {
        return Err(InitError::validation("Field path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(InitError::validation(format!(
            "Field path '{}' contains a NUL byte",
            path.escape_default()
        )));
    }
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(InitError::validation(format!(
                "Field path '{}' has an empty segment",
                path
            )));
        }
        if segment.starts_with('$') {
            return Err(InitError::validation(format!(
                "Field path '{}' has a segment starting with '$'",
                path
            )));
        }
    }
    Ok(())
}
