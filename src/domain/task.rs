//! Task domain types
//!
//! A [`TaskDescriptor`] is decided once at discovery time. Everything
//! downstream switches on [`TaskKind`] and never probes the raw settings again.

use crate::common::string_utils::extension;

/// Kind of a task or pipeline library entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Notebook,
    SparkPython,
    PythonWheel,
    Sql,
    Environment,
    Library,
    Glob,
}

/// Kind-specific fields of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPayload {
    Notebook { notebook_path: String },
    SparkPython { python_file: String },
    PythonWheel {
        package_name: Option<String>,
        entry_point: Option<String>,
    },
    Sql { sql_file: String },
    /// Serverless dependency set
    Environment { dependencies: Vec<String> },
    /// Task carrying only library references
    Library,
    /// Pipeline source glob
    Glob { include: String },
}

/// Packaged library kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibraryKind {
    Wheel,
    Jar,
}

impl LibraryKind {
    /// Document key the library path is stored under
    pub fn field(self) -> &'static str {
        match self {
            LibraryKind::Wheel => "whl",
            LibraryKind::Jar => "jar",
        }
    }

    /// Infer from a file name; `None` for anything that is not a packaged library
    pub fn from_path(path: &str) -> Option<Self> {
        match extension(path).as_deref() {
            Some("whl") => Some(LibraryKind::Wheel),
            Some("jar") => Some(LibraryKind::Jar),
            _ => None,
        }
    }
}

/// A library reference owned by a task (or floating at resource level)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRef {
    pub kind: LibraryKind,
    pub path: String,
}

impl LibraryRef {
    pub fn new(kind: LibraryKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// Task key for jobs, `libraries[i]` / `environment` for pipelines
    pub task_key: String,
    pub payload: TaskPayload,
    pub libraries: Vec<LibraryRef>,
    pub environment_key: Option<String>,
}

impl TaskDescriptor {
    pub fn new(task_key: impl Into<String>, payload: TaskPayload) -> Self {
        Self {
            task_key: task_key.into(),
            payload,
            libraries: Vec::new(),
            environment_key: None,
        }
    }

    #[must_use]
    pub fn with_libraries(mut self, libraries: Vec<LibraryRef>) -> Self {
        self.libraries = libraries;
        self
    }

    #[must_use]
    pub fn with_environment_key(mut self, key: Option<String>) -> Self {
        self.environment_key = key;
        self
    }

    pub fn kind(&self) -> TaskKind {
        match self.payload {
            TaskPayload::Notebook { .. } => TaskKind::Notebook,
            TaskPayload::SparkPython { .. } => TaskKind::SparkPython,
            TaskPayload::PythonWheel { .. } => TaskKind::PythonWheel,
            TaskPayload::Sql { .. } => TaskKind::Sql,
            TaskPayload::Environment { .. } => TaskKind::Environment,
            TaskPayload::Library => TaskKind::Library,
            TaskPayload::Glob { .. } => TaskKind::Glob,
        }
    }

    /// Workspace path of the notebook this task runs, if it is a notebook task
    pub fn notebook_path(&self) -> Option<&str> {
        match &self.payload {
            TaskPayload::Notebook { notebook_path } => Some(notebook_path),
            _ => None,
        }
    }
}
