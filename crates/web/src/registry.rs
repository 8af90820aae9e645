use crate::layer::Layer;
use arbor_build::{ConfigSource, FileEntry, RouteConfig, StaticRouteConfigs};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Binds route files to the layers that serve them.
///
/// Keys are paths relative to the routes root, exactly as the classifier reports them
/// (`books/[id]/index.ts`). Route configs registered here are handed to the build as
/// its [`ConfigSource`].
#[derive(Clone, Default)]
pub struct LayerRegistry {
    layers: BTreeMap<String, Arc<dyn Layer>>,
    configs: StaticRouteConfigs,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<S, L>(mut self, path: S, layer: L) -> Self
    where
        S: Into<String>,
        L: Layer + 'static,
    {
        self.layers.insert(path.into(), Arc::new(layer));
        self
    }

    /// Registers the override descriptor of a handler file.
    pub fn config<S: Into<String>>(mut self, path: S, config: RouteConfig) -> Self {
        self.configs.insert(path, config);
        self
    }

    pub fn bind_with_config<S, L>(self, path: S, layer: L, config: RouteConfig) -> Self
    where
        S: Into<String>,
        L: Layer + 'static,
    {
        let path = path.into();
        self.bind(path.clone(), layer).config(path, config)
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn Layer>> {
        self.layers.get(path).map(Arc::clone)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.layers.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl ConfigSource for LayerRegistry {
    fn route_config(&self, handler: &FileEntry) -> Option<RouteConfig> {
        self.configs.route_config(handler)
    }
}

impl Debug for LayerRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .field("configs", &self.configs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler_fn;
    use arbor_build::FileRole;

    #[test]
    fn test_bind_and_config() {
        let registry = LayerRegistry::new()
            .bind("index.ts", handler_fn(|_ctx| Box::pin(async move { Ok("home") })))
            .bind_with_config(
                "login/index.ts",
                handler_fn(|_ctx| Box::pin(async move { Ok("login") })),
                RouteConfig::default().with_skip_app_wrapper(true),
            );

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("login/index.ts"));
        assert!(registry.get("missing.ts").is_none());

        let login = FileEntry::new("login/index.ts", FileRole::Handler, "ts");
        assert_eq!(registry.route_config(&login), Some(RouteConfig::default().with_skip_app_wrapper(true)));

        let home = FileEntry::new("index.ts", FileRole::Handler, "ts");
        assert_eq!(registry.route_config(&home), None);
    }
}
