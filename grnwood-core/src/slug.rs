//! Slug derivation for display names.
//!
//! Slugs are lower-case ASCII letters, digits and single hyphens. Accented
//! letters are folded to their base letter, separators collapse into one
//! hyphen, and any other punctuation is dropped.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Derive a URL-safe slug from `name`.
///
/// May return an empty string when `name` has no ASCII-foldable characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.nfd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    slug
}
