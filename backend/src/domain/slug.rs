//! Slug generation and validation shared by every content entity.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, and single hyphens. They are derived from a title once, at
//! construction time, and never rewritten afterwards.

/// Derive a URL-safe slug from a human-readable title.
///
/// The title is lowercased, characters outside `[a-z0-9]`, whitespace, and
/// `-` are dropped, whitespace runs become a single hyphen, repeated hyphens
/// collapse, and leading or trailing hyphens are trimmed. The result may be
/// empty when the title has no usable characters; constructors treat that as
/// a validation failure.
///
/// # Examples
/// ```
/// use content_backend::domain::generate_slug;
///
/// assert_eq!(generate_slug("Denial Management 101!!"), "denial-management-101");
/// assert_eq!(generate_slug("  A -- B  "), "a-b");
/// ```
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
        }
    }

    slug
}

/// Return `true` when `value` is a valid content slug.
pub fn is_valid_slug(value: &str) -> bool {
    is_trimmed_non_empty(value)
        && has_allowed_slug_chars(value)
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--")
}

fn is_trimmed_non_empty(value: &str) -> bool {
    !value.is_empty() && value.trim() == value
}

fn has_allowed_slug_chars(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

/// Turn a `snake_case` or `kebab-case` identifier into capitalised words.
///
/// # Examples
/// ```
/// use content_backend::domain::humanize;
///
/// assert_eq!(humanize("revenue_cycle-audit"), "Revenue Cycle Audit");
/// assert_eq!(humanize("full_time"), "Full Time");
/// ```
pub fn humanize(text: &str) -> String {
    text.split(|ch: char| ch == '_' || ch == '-' || ch.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalise)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
