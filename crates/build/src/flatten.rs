//! Route flattening.
//!
//! The sorted tree is walked depth-first. Every directory owning a handler emits one
//! [`RouteEntry`] before any of its descendants do, so the order of the returned routes is
//! the order in which a request path is tried. Nothing below a catch-all directory is
//! routable.

use crate::classify::{FileEntry, FileRole};
use crate::config::ConfigSource;
use crate::error::BuildError;
use crate::options::{BuildOptions, DynamicTieBreak};
use crate::pattern::{PathPattern, PatternSegment};
use crate::tree::{DirectoryTree, FileId, NodeId};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideFlags {
    pub skip_app_wrapper: bool,
    pub skip_inherited_layouts: bool,
}

/// A middleware or layout file together with the directory that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLink {
    pub node: NodeId,
    pub file: FileId,
}

impl ChainLink {
    /// The root directory's layout wraps the whole application.
    #[inline]
    pub fn is_app_wrapper(&self) -> bool {
        self.node == NodeId::ROOT
    }
}

#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: PathPattern,
    owner: NodeId,
    handler: FileId,
    middleware: Vec<ChainLink>,
    layouts: Vec<ChainLink>,
    flags: OverrideFlags,
    pattern_override: Option<String>,
    error_page: Option<FileId>,
}

impl RouteEntry {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn handler(&self) -> FileId {
        self.handler
    }

    /// Middleware of the owner and all its ancestors, root first.
    pub fn middleware(&self) -> &[ChainLink] {
        &self.middleware
    }

    /// Layouts of the owner and all its ancestors, root first, before any flag is applied.
    pub fn layouts(&self) -> &[ChainLink] {
        &self.layouts
    }

    pub fn flags(&self) -> OverrideFlags {
        self.flags
    }

    /// The `routeOverride` text this route was declared with, if any.
    pub fn pattern_override(&self) -> Option<&str> {
        self.pattern_override.as_deref()
    }

    /// Nearest `_500` page of the owner directory.
    pub fn error_page(&self) -> Option<FileId> {
        self.error_page
    }

    /// Layouts that actually wrap the handler.
    ///
    /// `skip_inherited_layouts` keeps only the nearest layout, `skip_app_wrapper` then drops
    /// the root layout wherever it is in the chain.
    pub fn effective_layouts(&self) -> Vec<ChainLink> {
        let layouts = if self.flags.skip_inherited_layouts {
            self.layouts.last().map(std::slice::from_ref).unwrap_or_default()
        } else {
            self.layouts.as_slice()
        };

        layouts.iter().filter(|link| !(self.flags.skip_app_wrapper && link.is_app_wrapper())).copied().collect()
    }
}

/// Flattens a sorted tree into the ordered route table.
pub fn flatten(
    tree: &DirectoryTree,
    options: &BuildOptions,
    configs: &dyn ConfigSource,
) -> Result<Vec<RouteEntry>, BuildError> {
    let mut flattener = Flattener { tree, configs, routes: vec![] };
    flattener.visit(NodeId::ROOT, &PathPattern::root(), &[], &[])?;

    let routes = flattener.routes;
    check_duplicates(tree, &routes, options.dynamic_tie_break)?;
    Ok(routes)
}

struct Flattener<'a> {
    tree: &'a DirectoryTree,
    configs: &'a dyn ConfigSource,
    routes: Vec<RouteEntry>,
}

impl Flattener<'_> {
    fn visit(
        &mut self,
        id: NodeId,
        pattern: &PathPattern,
        middleware: &[ChainLink],
        layouts: &[ChainLink],
    ) -> Result<(), BuildError> {
        let tree = self.tree;
        let node = tree.node(id);
        let middleware = extend_chain(middleware, id, node.files().first(FileRole::Middleware));
        let layouts = extend_chain(layouts, id, node.files().first(FileRole::Layout));

        if let Some(handler) = node.files().first(FileRole::Handler) {
            let entry = self.route_entry(id, handler, pattern, middleware.clone(), layouts.clone())?;
            debug!(pattern = %entry.pattern, handler = tree.file(handler).relative_path(), "flattened route");
            self.routes.push(entry);
        }

        if node.segment().swallows_rest() {
            for child in node.children() {
                if tree.has_handler_within(*child) {
                    warn!(
                        dir = %tree.path_of(*child),
                        catch_all = node.name(),
                        "handlers below a catch-all directory are unreachable"
                    );
                }
            }
            return Ok(());
        }

        for child in node.children() {
            let child_node = tree.node(*child);
            let child_pattern = pattern.child(PatternSegment::from_directory(child_node.name(), child_node.segment()));
            self.visit(*child, &child_pattern, &middleware, &layouts)?;
        }
        Ok(())
    }

    fn route_entry(
        &self,
        owner: NodeId,
        handler: FileId,
        derived: &PathPattern,
        middleware: Vec<ChainLink>,
        layouts: Vec<ChainLink>,
    ) -> Result<RouteEntry, BuildError> {
        let handler_entry = self.tree.file(handler);
        let config = self.configs.route_config(handler_entry).unwrap_or_default();

        let pattern = match config.route_override.as_deref() {
            Some(raw) => PathPattern::parse(raw)?,
            None => derived.clone(),
        };
        check_params(&pattern, handler_entry)?;

        Ok(RouteEntry {
            pattern,
            owner,
            handler,
            middleware,
            layouts,
            flags: OverrideFlags {
                skip_app_wrapper: config.skip_app_wrapper,
                skip_inherited_layouts: config.skip_inherited_layouts,
            },
            pattern_override: config.route_override,
            error_page: self.tree.nearest_file(owner, FileRole::ErrorPage),
        })
    }
}

fn extend_chain(chain: &[ChainLink], node: NodeId, file: Option<FileId>) -> Vec<ChainLink> {
    let mut extended = chain.to_vec();
    extended.extend(file.map(|file| ChainLink { node, file }));
    extended
}

fn check_params(pattern: &PathPattern, handler: &FileEntry) -> Result<(), BuildError> {
    let mut seen = Vec::new();
    for name in pattern.param_names() {
        if seen.contains(&name) {
            return Err(BuildError::DuplicateParam {
                pattern: pattern.to_string(),
                param: name.to_string(),
                handler: handler.relative_path().to_string(),
            });
        }
        seen.push(name);
    }
    Ok(())
}

fn check_duplicates(tree: &DirectoryTree, routes: &[RouteEntry], tie_break: DynamicTieBreak) -> Result<(), BuildError> {
    let mut by_shape: HashMap<String, &RouteEntry> = HashMap::with_capacity(routes.len());

    for route in routes {
        let Some(first) = by_shape.get(&route.pattern.canonical()).copied() else {
            by_shape.insert(route.pattern.canonical(), route);
            continue;
        };

        let first_path = tree.file(first.handler).relative_path().to_string();
        let second_path = tree.file(route.handler).relative_path().to_string();

        if first.pattern == route.pattern {
            return Err(BuildError::DuplicateRoute {
                pattern: route.pattern.to_string(),
                first: first_path,
                second: second_path,
            });
        }

        match tie_break {
            DynamicTieBreak::Reject => {
                return Err(BuildError::AmbiguousRoute {
                    pattern: route.pattern.canonical(),
                    first: first_path,
                    second: second_path,
                });
            }
            DynamicTieBreak::Lexical => {
                warn!(
                    winner = %first_path,
                    shadowed = %second_path,
                    pattern = %route.pattern,
                    "route differs only by parameter names and is never matched"
                );
            }
        }
    }
    Ok(())
}
