//! Input validation for the enrollment steps.

use std::sync::LazyLock;

use regex::Regex;

/// local-part `@` domain `.` tld, no second `@`, no whitespace.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Whether `candidate` looks like an e-mail address. Surrounding
/// whitespace is ignored.
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate.trim())
}
