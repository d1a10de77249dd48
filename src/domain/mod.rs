//! Pure domain rules shared by the services.
//!
//! Nothing in here touches storage or the network, so every rule can be
//! evaluated against an explicit `now` and tested in isolation.

pub mod lifecycle;

pub use lifecycle::{JamView, MysteryBypassDenied, present_jam};

/// Derives a URL slug from a jam name.
///
/// ASCII letters and digits are kept (lowercased); every run of other
/// characters collapses to a single `-`; leading and trailing dashes are
/// dropped. Returns an empty string when the name has no usable characters.
///
/// ```rust
/// use jamhub::domain::slugify;
///
/// assert_eq!(slugify("Winter Jam 2026!"), "winter-jam-2026");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Lookup key for case-insensitive user names.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Hello,   World  "), "hello-world");
        assert_eq!(slugify("a--b__c"), "a-b-c");
        assert_eq!(slugify("Jam #3"), "jam-3");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Jam"), "caf-jam");
        assert_eq!(slugify("★★★"), "");
    }

    #[test]
    fn name_key_is_case_insensitive() {
        assert_eq!(name_key("GriffPatch"), name_key("griffpatch"));
        assert_eq!(name_key(" Alice "), "alice");
    }
}
