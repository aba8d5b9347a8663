//! Display-name sanitization.
//!
//! Names come straight from build definitions and may contain tabs,
//! newlines or terminal escapes. They are cleaned once, at merge time.

/// Strip control characters and hard-truncate to `width` characters.
pub fn sanitize_name(name: &str, width: usize) -> String {
    name.chars().filter(|c| !c.is_control()).take(width).collect()
}

/// Build the tree label from an already sanitized name.
///
/// The cached prefix is applied after truncation and does not count
/// against the width.
pub fn compose_label(sanitized: &str, cached: bool, cached_prefix: &str) -> String {
    if cached {
        format!("{}{}", cached_prefix, sanitized)
    } else {
        sanitized.to_string()
    }
}
