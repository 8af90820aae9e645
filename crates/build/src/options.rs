//! Build configuration.
//!
//! Options are usually read from an `arbor.toml` next to the routes directory:
//!
//! ```toml
//! extensions = ["ts", "tsx"]
//! ignore = '\.test\.[a-z]+$'
//! dynamic-tie-break = "reject"
//! ```

use crate::error::BuildError;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Source extensions recognized when no configuration says otherwise.
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["ts", "tsx", "js", "jsx", "mjs"];

/// Excludes test and spec files by default.
pub const DEFAULT_IGNORE: &str = r"(_test|\.test|\.spec)\.[A-Za-z0-9]+$";

/// How two dynamic siblings reaching the same pattern shape are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DynamicTieBreak {
    /// The lexically first directory name wins, the build only warns.
    #[default]
    Lexical,
    /// The build fails with [`BuildError::AmbiguousRoute`].
    Reject,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildOptions {
    pub extensions: Vec<String>,
    pub ignore: Option<String>,
    pub dynamic_tie_break: DynamicTieBreak,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| (*ext).to_string()).collect(),
            ignore: Some(DEFAULT_IGNORE.to_string()),
            dynamic_tie_break: DynamicTieBreak::default(),
        }
    }
}

impl BuildOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, BuildError> {
        toml::from_str(content).map_err(BuildError::config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BuildError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore(mut self, ignore: Option<String>) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_dynamic_tie_break(mut self, tie_break: DynamicTieBreak) -> Self {
        self.dynamic_tie_break = tie_break;
        self
    }

    /// Returns true if `extension` (without the leading dot) is a source extension.
    pub fn is_source_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }

    pub(crate) fn compile_ignore(&self) -> Result<Option<Regex>, BuildError> {
        self.ignore.as_deref().map(Regex::new).transpose().map_err(BuildError::from)
    }
}
