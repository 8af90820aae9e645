use crate::classify::FileRole;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal problems found while compiling a route tree.
///
/// Any of these stops the build: no route table or manifest is produced.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("directory '{dir}' has more than one {role} file: {first}, {second}")]
    ConflictingFiles { dir: String, role: FileRole, first: String, second: String },

    #[error("route '{pattern}' is declared by both {first} and {second}")]
    DuplicateRoute { pattern: String, first: String, second: String },

    #[error("routes {first} and {second} differ only by parameter names at '{pattern}'")]
    AmbiguousRoute { pattern: String, first: String, second: String },

    #[error("directory '{dir}' has more than one catch-all child: {first}, {second}")]
    AmbiguousCatchAll { dir: String, first: String, second: String },

    #[error("catch-all segment '{param}' must be the last segment of '{pattern}'")]
    CatchAllNotTerminal { pattern: String, param: String },

    #[error("parameter '{param}' is bound more than once in route '{pattern}' declared by {handler}")]
    DuplicateParam { pattern: String, param: String, handler: String },

    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid ignore pattern: {source}")]
    InvalidIgnorePattern {
        #[from]
        source: regex::Error,
    },

    #[error("failed to serialize manifest: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl BuildError {
    pub fn read_dir<P: AsRef<Path>, E: Into<io::Error>>(path: P, e: E) -> Self {
        Self::ReadDir { path: path.as_ref().to_path_buf(), source: e.into() }
    }

    pub fn read_file<P: AsRef<Path>, E: Into<io::Error>>(path: P, e: E) -> Self {
        Self::ReadFile { path: path.as_ref().to_path_buf(), source: e.into() }
    }

    pub fn invalid_pattern<P: ToString, S: ToString>(pattern: P, reason: S) -> Self {
        Self::InvalidPattern { pattern: pattern.to_string(), reason: reason.to_string() }
    }

    pub fn config<S: ToString>(reason: S) -> Self {
        Self::Config { reason: reason.to_string() }
    }
}
