//! Test helpers for generating unique test data
//!
//! Player identities and display names built from ULIDs keep tests isolated
//! from each other when they share one process-wide game registry.

use ulid::Ulid;

/// Generate a unique string with the given prefix
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let id1 = unique_str("user");
/// let id2 = unique_str("user");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("user-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a unique numeric player id.
///
/// Player ids are opaque strings, but the login surface mirrors the numeric
/// identifiers handed out by external identity providers.
///
/// # Examples
/// ```
/// use backend_test_support::unique_helpers::unique_player_id;
///
/// let a = unique_player_id();
/// let b = unique_player_id();
/// assert_ne!(a, b);
/// assert!(a.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn unique_player_id() -> String {
    let ulid = Ulid::new();
    // 128-bit ULIDs render as at most 39 decimal digits.
    format!("{}", u128::from(ulid))
}
