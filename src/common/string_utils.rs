//! String utility functions for resource naming and path text.

/// Convert a display name into a resource key
///
/// Every character that is not a word character becomes `_`, the result is
/// lowercased, runs of `_` collapse to one and leading/trailing `_` are removed.
///
/// # Examples
/// ```
/// use wfexport::common::string_utils::slugify;
/// assert_eq!(slugify("Daily ETL - Sales"), "daily_etl_sales");
/// assert_eq!(slugify("__x__"), "x");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let mut collapsed = String::with_capacity(slug.len());
    for c in slug.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }

    collapsed.trim_matches('_').to_string()
}

/// Final segment of a `/`-separated path
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Final segment of a `/`-separated path without its extension
pub fn file_stem(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Lowercased extension of the final segment, if any
pub fn extension(path: &str) -> Option<String> {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(name[idx + 1..].to_ascii_lowercase()),
    }
}

/// Truncate long text from the left for single-line display
pub fn truncate_left(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars || max_chars < 4 {
        return text.to_string();
    }
    let keep: String = text.chars().skip(count - (max_chars - 3)).collect();
    format!("...{keep}")
}
