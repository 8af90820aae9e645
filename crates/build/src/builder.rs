use crate::classify::{Classifier, FileEntry};
use crate::config::{ConfigSource, NoRouteConfigs};
use crate::error::BuildError;
use crate::exports::{ExportScanner, NoExports};
use crate::flatten::{RouteEntry, flatten};
use crate::ident::IdentifierGenerator;
use crate::manifest::{Manifest, file_order};
use crate::options::BuildOptions;
use crate::sort::sort_tree;
use crate::tree::{DirectoryTree, FileId};
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs one build cycle: classify, sort, flatten, name, and assemble the manifest.
#[derive(Clone, Copy)]
pub struct Builder<'a> {
    options: &'a BuildOptions,
    configs: &'a dyn ConfigSource,
    exports: &'a dyn ExportScanner,
}

impl std::fmt::Debug for Builder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder").field("options", self.options).finish_non_exhaustive()
    }
}

impl<'a> Builder<'a> {
    pub fn new(options: &'a BuildOptions) -> Self {
        Self { options, configs: &NoRouteConfigs, exports: &NoExports }
    }

    pub fn with_configs(mut self, configs: &'a dyn ConfigSource) -> Self {
        self.configs = configs;
        self
    }

    pub fn with_exports(mut self, exports: &'a dyn ExportScanner) -> Self {
        self.exports = exports;
        self
    }

    pub fn build<P: AsRef<Path>>(&self, root: P) -> Result<Build, BuildError> {
        let root = root.as_ref();

        let mut tree = Classifier::new(self.options)?.classify(root)?;
        sort_tree(&mut tree);
        let routes = flatten(&tree, self.options, self.configs)?;

        let order = file_order(&tree);
        let mut generator = IdentifierGenerator::new();
        let mut identifiers = vec![String::new(); tree.file_count()];
        let mut exports = Vec::with_capacity(order.len());
        for id in &order {
            let entry = tree.file(*id);
            identifiers[id.index()] = generator.assign(entry.relative_path());
            exports.push(self.exports.exports(root, entry)?);
        }

        let manifest = Manifest::assemble(&tree, &routes, &order, &identifiers, exports);
        info!(root = %root.display(), files = order.len(), routes = routes.len(), "route tree built");

        Ok(Build { root: root.to_path_buf(), tree, routes, identifiers, manifest })
    }
}

/// The immutable result of one build cycle.
#[derive(Debug, Clone)]
pub struct Build {
    root: PathBuf,
    tree: DirectoryTree,
    routes: Vec<RouteEntry>,
    identifiers: Vec<String>,
    manifest: Manifest,
}

impl Build {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    /// Routes in match order.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn identifier(&self, id: FileId) -> &str {
        &self.identifiers[id.index()]
    }

    pub fn file(&self, id: FileId) -> &FileEntry {
        self.tree.file(id)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn into_manifest(self) -> Manifest {
        self.manifest
    }
}
