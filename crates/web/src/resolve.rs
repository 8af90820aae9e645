//! Request path resolution.
//!
//! Routes are tried in table order and the first full match wins; there is no
//! backtracking into later routes once one matched. When nothing matches, the resolver walks
//! the directory tree as far as the request path allows and picks the nearest not-found page
//! from there.

use crate::request::Params;
use crate::table::{BoundChain, BoundRoute, RouteTable};
use arbor_build::{DirectoryTree, NodeId};
use std::borrow::Cow;

#[derive(Debug)]
pub enum Resolution<'t> {
    Matched { route: &'t BoundRoute, params: Params },
    NotFound { page: Option<&'t BoundChain> },
}

#[derive(Debug, Clone, Copy)]
pub struct ChainResolver<'t> {
    table: &'t RouteTable,
}

impl<'t> ChainResolver<'t> {
    pub fn new(table: &'t RouteTable) -> Self {
        Self { table }
    }

    pub fn resolve(&self, path: &str) -> Resolution<'t> {
        let segments = split_path(path);

        for route in &self.table.routes {
            if let Some(bindings) = route.pattern().matches(&segments) {
                return Resolution::Matched { route, params: Params::from(bindings) };
            }
        }

        let node = deepest_node(&self.table.tree, &segments);
        let page = self.table.not_found.get(node.index()).and_then(|page| page.as_deref());
        Resolution::NotFound { page }
    }
}

/// Splits a request path into percent-decoded segments, ignoring empty ones.
///
/// A segment that does not decode to UTF-8 is kept as sent.
pub fn split_path(path: &str) -> Vec<Cow<'_, str>> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment)))
        .collect()
}

/// Follows literal names, then dynamic names, and stops inside a catch-all.
fn deepest_node<S: AsRef<str>>(tree: &DirectoryTree, segments: &[S]) -> NodeId {
    let mut current = NodeId::ROOT;
    for segment in segments {
        let children = tree.node(current).children();
        let literal = children.iter().find(|child| {
            let node = tree.node(**child);
            !node.is_dynamic() && node.name() == segment.as_ref()
        });
        let dynamic = || children.iter().find(|child| tree.node(**child).is_dynamic() && !tree.node(**child).segment().swallows_rest());

        match literal.or_else(dynamic) {
            Some(child) => current = *child,
            None => {
                if let Some(catch_all) = children.iter().find(|child| tree.node(**child).segment().swallows_rest()) {
                    current = *catch_all;
                }
                break;
            }
        }
    }
    current
}
