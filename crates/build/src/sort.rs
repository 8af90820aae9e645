//! Specificity ordering of sibling directories.
//!
//! Literal names come first, then dynamic names, then catch-all names; within one tier names
//! compare case-sensitively byte by byte. Filesystem order never leaks into match order.

use crate::segment::SegmentKind;
use crate::tree::{DirectoryTree, NodeId};
use std::cmp::Ordering;

/// Total order of two sibling segments, more specific first.
pub fn compare_segments(a_name: &str, a_kind: &SegmentKind, b_name: &str, b_kind: &SegmentKind) -> Ordering {
    a_kind.rank().cmp(&b_kind.rank()).then_with(|| a_name.cmp(b_name))
}

/// Sorts directory names by specificity.
pub fn sort_names<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by_cached_key(|name| {
        let name = name.as_ref();
        (SegmentKind::parse(name).rank(), name.to_string())
    });
}

/// Reorders the children of every node in place. Node ids are untouched.
pub fn sort_tree(tree: &mut DirectoryTree) {
    for id in tree.depth_first() {
        sort_children(tree, id);
    }
}

/// Reorders the children of one node in place.
pub fn sort_children(tree: &mut DirectoryTree, id: NodeId) {
    let mut children = std::mem::take(tree.children_mut(id));
    children.sort_by(|a, b| {
        let (a, b) = (tree.node(*a), tree.node(*b));
        compare_segments(a.name(), a.segment(), b.name(), b.segment())
    });
    *tree.children_mut(id) = children;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_then_lexical() {
        let mut names = vec!["[...rest]", "[id]", "new", "[[all]]", "Archive", "edit", "[slug]"];
        sort_names(&mut names);
        assert_eq!(names, vec!["Archive", "edit", "new", "[id]", "[slug]", "[...rest]", "[[all]]"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut names = vec!["b", "[x]", "a", "[...y]"];
        sort_names(&mut names);
        let once = names.clone();
        sort_names(&mut names);
        assert_eq!(names, once);
    }

    #[test]
    fn test_sort_ignores_input_order() {
        let mut forward = vec!["new", "[id]", "[...all]", "edit"];
        let mut backward: Vec<_> = forward.iter().rev().copied().collect();
        sort_names(&mut forward);
        sort_names(&mut backward);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_sort_tree_keeps_identity() {
        let mut tree = DirectoryTree::new();
        let dynamic = tree.add_directory(NodeId::ROOT, "[id]");
        let literal = tree.add_directory(NodeId::ROOT, "new");
        let nested_catch_all = tree.add_directory(literal, "[...rest]");
        let nested_literal = tree.add_directory(literal, "b");

        sort_tree(&mut tree);

        assert_eq!(tree.node(NodeId::ROOT).children(), [literal, dynamic]);
        assert_eq!(tree.node(literal).children(), [nested_literal, nested_catch_all]);
        assert_eq!(tree.node(dynamic).name(), "[id]");
    }
}
