//! Workspace path to bundle path mapping
//!
//! Rules are tried in configured order and the first one whose pattern matches
//! the start of the path wins. A path no rule matches is returned unchanged.

use std::collections::HashMap;

use regex::{NoExpand, Regex};

use crate::common::string_utils::{basename, file_stem};
use crate::error::Result;

/// Generator-emitted file names keyed by file stem (`etl` -> `etl.py`)
pub type RenameTable = HashMap<String, String>;

/// One compiled prefix rule
#[derive(Debug, Clone)]
pub struct PathRule {
    pattern: Regex,
    replacement: String,
}

impl PathRule {
    /// Compile a rule; patterns are anchored to the start of the path
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let anchored = if pattern.starts_with('^') {
            pattern.to_string()
        } else {
            format!("^(?:{pattern})")
        };
        Ok(Self {
            pattern: Regex::new(&anchored)?,
            replacement: replacement.into(),
        })
    }

    fn apply(&self, path: &str) -> Option<String> {
        if self.pattern.is_match(path) {
            Some(
                self.pattern
                    .replace(path, NoExpand(&self.replacement))
                    .into_owned(),
            )
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathMapper {
    rules: Vec<PathRule>,
}

impl PathMapper {
    pub fn new(rules: &[(String, String)]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|(pattern, replacement)| PathRule::new(pattern, replacement.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Apply the first matching prefix rule only
    pub fn map_prefix(&self, path: &str) -> String {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(path))
            .unwrap_or_else(|| path.to_string())
    }

    /// Map a workspace path, then swap the final segment for its generated name
    ///
    /// # Examples
    /// ```
    /// use wfexport::path_mapper::{PathMapper, RenameTable};
    /// let mapper = PathMapper::new(&[("^/Workspace/".to_string(), "../src/".to_string())]).unwrap();
    /// let mut renames = RenameTable::new();
    /// renames.insert("etl".to_string(), "etl.py".to_string());
    /// assert_eq!(mapper.map("/Workspace/Users/a/etl", &renames), "../src/Users/a/etl.py");
    /// ```
    pub fn map(&self, path: &str, rename_table: &RenameTable) -> String {
        let mapped = self.map_prefix(path);
        if rename_table.is_empty() {
            return mapped;
        }

        let stem = file_stem(&mapped);
        let Some(renamed) = rename_table.get(stem) else {
            return mapped;
        };

        let name = basename(&mapped);
        let dir_len = mapped.len() - name.len();
        format!("{}{}", &mapped[..dir_len], renamed)
    }
}

/// Build a rename table from generator-emitted file paths
pub fn rename_table_from<'a>(emitted: impl IntoIterator<Item = &'a str>) -> RenameTable {
    emitted
        .into_iter()
        .filter(|path| !path.ends_with(".yml") && !path.ends_with(".yaml"))
        .map(|path| (file_stem(path).to_string(), basename(path).to_string()))
        .collect()
}
