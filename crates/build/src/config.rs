//! Per-route override descriptors.
//!
//! The flattener asks a [`ConfigSource`] once per handler. A descriptor can replace the
//! derived pattern and opt the route out of the root layout or of inherited layouts.
//!
//! [`StaticRouteConfigs`] reads a map keyed by handler path:
//!
//! ```json
//! {
//!   "books/[id]/index.ts": { "routeOverride": "/books/:id(\\d+)" },
//!   "login/index.ts": { "skipAppWrapper": true }
//! }
//! ```

use crate::classify::FileEntry;
use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteConfig {
    pub route_override: Option<String>,
    pub skip_app_wrapper: bool,
    pub skip_inherited_layouts: bool,
}

impl RouteConfig {
    pub fn with_route_override<S: Into<String>>(mut self, pattern: S) -> Self {
        self.route_override = Some(pattern.into());
        self
    }

    pub fn with_skip_app_wrapper(mut self, skip: bool) -> Self {
        self.skip_app_wrapper = skip;
        self
    }

    pub fn with_skip_inherited_layouts(mut self, skip: bool) -> Self {
        self.skip_inherited_layouts = skip;
        self
    }
}

/// Supplies the override descriptor of a handler file.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigSource {
    fn route_config(&self, handler: &FileEntry) -> Option<RouteConfig>;
}

/// Every route uses its derived pattern and the full layout chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouteConfigs;

impl ConfigSource for NoRouteConfigs {
    fn route_config(&self, _handler: &FileEntry) -> Option<RouteConfig> {
        None
    }
}

/// Descriptors keyed by the handler's relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticRouteConfigs {
    configs: BTreeMap<String, RouteConfig>,
}

impl StaticRouteConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, handler_path: S, config: RouteConfig) -> Option<RouteConfig> {
        self.configs.insert(handler_path.into(), config)
    }

    pub fn get(&self, handler_path: &str) -> Option<&RouteConfig> {
        self.configs.get(handler_path)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn from_json_str(content: &str) -> Result<Self, BuildError> {
        serde_json::from_str(content).map_err(BuildError::config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, BuildError> {
        toml::from_str(content).map_err(BuildError::config)
    }

    /// Loads a `.toml` file as TOML and anything else as JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BuildError::read_file(path, e))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }
}

impl<S: Into<String>> FromIterator<(S, RouteConfig)> for StaticRouteConfigs {
    fn from_iter<T: IntoIterator<Item = (S, RouteConfig)>>(iter: T) -> Self {
        Self { configs: iter.into_iter().map(|(path, config)| (path.into(), config)).collect() }
    }
}

impl ConfigSource for StaticRouteConfigs {
    fn route_config(&self, handler: &FileEntry) -> Option<RouteConfig> {
        self.configs.get(handler.relative_path()).cloned()
    }
}
