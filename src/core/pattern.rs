//! Regular-expression matching helper for the command layer.
//!
//! The CLI grammar uses this to check user input against command patterns.
//! An invalid pattern is treated as a non-match rather than an error, so a
//! malformed grammar entry degrades to "command not recognized" instead of
//! failing the whole session.

use regex::Regex;

/// Check whether `input` matches `pattern`.
///
/// Returns false for an invalid pattern (logged at warn).
pub fn matches(pattern: &str, input: &str) -> bool {
    match Regex::new(pattern) {
        Ok(regex) => regex.is_match(input),
        Err(error) => {
            tracing::warn!(pattern, %error, "could not compile pattern");
            false
        }
    }
}
