//! A build bound to layers.
//!
//! Binding resolves every file a request could reach (route chains, error pages and
//! not-found pages) to its registered layer up front, so a request never meets an unbound
//! file.

use crate::layer::ChainLayer;
use crate::registry::LayerRegistry;
use crate::resolve::{ChainResolver, Resolution};
use arbor_build::{Build, BuildError, DirectoryTree, FileId, FileRole, PathPattern};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BindError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("no layer is bound to {role} file {path}")]
    Unbound { path: String, role: FileRole },
}

/// Layers in dispatch order and the error page guarding them.
#[derive(Debug, Clone)]
pub struct BoundChain {
    layers: Vec<ChainLayer>,
    error_page: Option<ChainLayer>,
}

impl BoundChain {
    pub fn layers(&self) -> &[ChainLayer] {
        &self.layers
    }

    pub fn error_page(&self) -> Option<&ChainLayer> {
        self.error_page.as_ref()
    }

    /// The last layer of the chain, the one that answers.
    pub fn endpoint(&self) -> Option<&ChainLayer> {
        self.layers.last()
    }
}

#[derive(Debug, Clone)]
pub struct BoundRoute {
    pattern: PathPattern,
    chain: BoundChain,
}

impl BoundRoute {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn chain(&self) -> &BoundChain {
        &self.chain
    }
}

/// The immutable request-time view of one build.
#[derive(Debug, Clone)]
pub struct RouteTable {
    pub(crate) routes: Vec<BoundRoute>,
    pub(crate) tree: DirectoryTree,
    /// Nearest not-found page of every directory, indexed by node.
    pub(crate) not_found: Vec<Option<Arc<BoundChain>>>,
}

impl RouteTable {
    pub fn bind(build: &Build, registry: &LayerRegistry) -> Result<Self, BindError> {
        let binder = Binder { build, registry };

        let routes = build
            .routes()
            .iter()
            .map(|route| {
                let mut layers = Vec::with_capacity(route.middleware().len() + route.layouts().len() + 1);
                for link in route.middleware().iter().chain(route.effective_layouts().iter()) {
                    layers.push(binder.layer(link.file)?);
                }
                layers.push(binder.layer(route.handler())?);
                let error_page = route.error_page().map(|page| binder.layer(page)).transpose()?;
                Ok(BoundRoute { pattern: route.pattern().clone(), chain: BoundChain { layers, error_page } })
            })
            .collect::<Result<Vec<_>, BindError>>()?;

        let tree = build.tree();
        let mut pages: HashMap<FileId, Arc<BoundChain>> = HashMap::new();
        let mut not_found = Vec::with_capacity(tree.node_count());
        for node in tree.node_ids() {
            let Some(page) = tree.nearest_file(node, FileRole::NotFound) else {
                not_found.push(None);
                continue;
            };
            let chain = match pages.get(&page) {
                Some(chain) => Arc::clone(chain),
                None => {
                    let chain = Arc::new(binder.not_found_chain(page)?);
                    pages.insert(page, Arc::clone(&chain));
                    chain
                }
            };
            not_found.push(Some(chain));
        }

        debug!(routes = routes.len(), not_found_pages = pages.len(), "route table bound");
        Ok(Self { routes, tree: tree.clone(), not_found })
    }

    /// Bound routes in match order.
    pub fn routes(&self) -> &[BoundRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn resolver(&self) -> ChainResolver<'_> {
        ChainResolver::new(self)
    }

    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        self.resolver().resolve(path)
    }
}

struct Binder<'a> {
    build: &'a Build,
    registry: &'a LayerRegistry,
}

impl Binder<'_> {
    fn layer(&self, file: FileId) -> Result<ChainLayer, BindError> {
        let entry = self.build.file(file);
        let path = entry.relative_path();
        match self.registry.get(path) {
            Some(layer) => Ok(ChainLayer::new(path, layer)),
            None => Err(BindError::Unbound { path: path.to_string(), role: entry.role() }),
        }
    }

    /// Middleware and layouts of the page's own directory lineage wrap the not-found page.
    fn not_found_chain(&self, page: FileId) -> Result<BoundChain, BindError> {
        let tree = self.build.tree();
        let owner = tree.owner_of(page);
        let lineage = tree.lineage(owner);

        let mut layers = Vec::new();
        for role in [FileRole::Middleware, FileRole::Layout] {
            for node in &lineage {
                if let Some(file) = tree.node(*node).files().first(role) {
                    layers.push(self.layer(file)?);
                }
            }
        }
        layers.push(self.layer(page)?);

        let error_page = tree.nearest_file(owner, FileRole::ErrorPage).map(|file| self.layer(file)).transpose()?;
        Ok(BoundChain { layers, error_page })
    }
}
