//! The generated manifest.
//!
//! Two byte-stable renderings exist: pretty JSON ([`Manifest::to_json`]) and an import
//! module ([`Manifest::render_module`]) that binds every file to its identifier and lists
//! the route table in match order.

use crate::classify::FileRole;
use crate::error::BuildError;
use crate::flatten::RouteEntry;
use crate::tree::{DirectoryTree, FileId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    pub path: String,
    pub identifier: String,
    pub role: FileRole,
    pub exports: Vec<String>,
}

/// One route, every file referenced by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRoute {
    pub pattern: String,
    pub handler: String,
    pub middleware: Vec<String>,
    /// Layouts after the override flags were applied.
    pub layouts: Vec<String>,
    pub error_page: Option<String>,
    pub skip_app_wrapper: bool,
    pub skip_inherited_layouts: bool,
    pub route_override: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub files: Vec<ManifestFile>,
    pub routes: Vec<ManifestRoute>,
}

/// Files in manifest order: directories depth-first in sorted order, files by name within a
/// directory.
pub fn file_order(tree: &DirectoryTree) -> Vec<FileId> {
    let mut order = Vec::with_capacity(tree.file_count());
    for node in tree.depth_first() {
        let mut files: Vec<FileId> = tree.node(node).files().iter().flat_map(|(_, ids)| ids.iter().copied()).collect();
        files.sort_by(|a, b| tree.file(*a).file_name().cmp(tree.file(*b).file_name()));
        order.extend(files);
    }
    order
}

impl Manifest {
    /// Assembles the manifest; `identifiers` is indexed by file id, `exports` follows `order`.
    pub(crate) fn assemble(
        tree: &DirectoryTree,
        routes: &[RouteEntry],
        order: &[FileId],
        identifiers: &[String],
        exports: Vec<Vec<String>>,
    ) -> Self {
        let ident = |id: FileId| identifiers[id.index()].clone();

        let files = order
            .iter()
            .zip(exports)
            .map(|(id, exports)| {
                let entry = tree.file(*id);
                ManifestFile {
                    path: entry.relative_path().to_string(),
                    identifier: ident(*id),
                    role: entry.role(),
                    exports,
                }
            })
            .collect();

        let routes = routes
            .iter()
            .map(|route| ManifestRoute {
                pattern: route.pattern().to_string(),
                handler: ident(route.handler()),
                middleware: route.middleware().iter().map(|link| ident(link.file)).collect(),
                layouts: route.effective_layouts().iter().map(|link| ident(link.file)).collect(),
                error_page: route.error_page().map(ident),
                skip_app_wrapper: route.flags().skip_app_wrapper,
                skip_inherited_layouts: route.flags().skip_inherited_layouts,
                route_override: route.pattern_override().map(str::to_string),
            })
            .collect();

        Self { files, routes }
    }

    pub fn file(&self, path: &str) -> Option<&ManifestFile> {
        self.files.iter().find(|file| file.path == path)
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, BuildError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// An ES module importing every non-asset file and exporting the route table.
    pub fn render_module(&self) -> Result<String, BuildError> {
        let mut out = String::new();
        for file in self.files.iter().filter(|file| file.role != FileRole::Asset) {
            let specifier = serde_json::to_string(&format!("./{}", file.path))?;
            out.push_str(&format!("import * as {} from {specifier};\n", file.identifier));
        }

        out.push_str("\nexport const routes = [\n");
        for route in &self.routes {
            let error_page = route.error_page.as_deref().unwrap_or("null");
            out.push_str(&format!(
                "  {{ pattern: {}, handler: {}, middleware: [{}], layouts: [{}], errorPage: {error_page}, \
                 skipAppWrapper: {}, skipInheritedLayouts: {} }},\n",
                serde_json::to_string(&route.pattern)?,
                route.handler,
                route.middleware.join(", "),
                route.layouts.join(", "),
                route.skip_app_wrapper,
                route.skip_inherited_layouts,
            ));
        }
        out.push_str("];\n");
        Ok(out)
    }
}
