//! Lexical path helpers
//!
//! Paths produced by mapping rules are relative to the `resources/` directory
//! and may contain `..` segments that must be resolved without touching the
//! file system (the destination does not exist yet).

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components lexically
///
/// Returns `None` when a `..` would climb above the start of a relative path.
pub fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => return None,
            },
            other => parts.push(other),
        }
    }
    Some(parts.iter().collect())
}

/// Express `target` relative to the directory `base`, both lexically normalized
///
/// # Examples
/// ```
/// use std::path::Path;
/// use wfexport::common::path_utils::relative_to;
/// assert_eq!(
///     relative_to(Path::new("/ws/.stage/src/etl.py"), Path::new("/ws/resources")),
///     Some("../.stage/src/etl.py".to_string())
/// );
/// ```
pub fn relative_to(target: &Path, base: &Path) -> Option<String> {
    let target = normalize_lexically(target)?;
    let base = normalize_lexically(base)?;

    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        segments.push("..".to_string());
    }
    for part in &target_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().into_owned());
    }
    Some(segments.join("/"))
}

/// Render a path with forward slashes
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
        .replacen("//", "/", 1)
}

/// Resolve a mapped, `resources/`-relative path to its on-disk location
///
/// Absolute or scheme-qualified mapped paths (pass-through values) have no
/// local location.
pub fn resolve_mapped(resources_dir: &Path, mapped: &str) -> Option<PathBuf> {
    if mapped.starts_with('/') || mapped.contains(":/") {
        return None;
    }
    normalize_lexically(&resources_dir.join(mapped))
}
