//! Not-found detection from error text.
//!
//! Older API versions report a missing resource as a plain error message,
//! `Managed identity with ID <id> not found`, without a 404 status. This is
//! the only place that pattern is recognized; everything else asks
//! [`ApiError::is_not_found`](crate::ApiError::is_not_found).

use std::sync::LazyLock;

use regex::Regex;

// The leading word's case varies between endpoints, hence the case-insensitive match.
static NOT_FOUND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z][a-z ]* with id \S+ not found").expect("Invalid not-found regex")
});

/// Returns `true` if `message` reports a missing resource.
pub fn is_not_found_message(message: &str) -> bool {
    NOT_FOUND_REGEX.is_match(message)
}

/// Builds the message the API uses for a missing resource of `kind`.
pub fn not_found_message(kind: &str, id: &str) -> String {
    format!("{kind} with ID {id} not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_identity_and_rule_messages() {
        assert!(is_not_found_message("Managed identity with ID abc not found"));
        assert!(is_not_found_message(
            "managed identity access rule with ID X not found"
        ));
        assert!(is_not_found_message(
            "deleting rule: anaged identity access rule with ID X not found"
        ));
    }

    #[test]
    fn test_ignores_unrelated_messages() {
        assert!(!is_not_found_message("permission denied"));
        assert!(!is_not_found_message("group not found"));
        assert!(!is_not_found_message("Managed identity with ID abc is in use"));
    }

    #[test]
    fn test_message_builder_round_trips() {
        let message = not_found_message("Managed identity access rule", "r-1");
        assert_eq!(message, "Managed identity access rule with ID r-1 not found");
        assert!(is_not_found_message(&message));
    }
}
