//! Arena storage for the classified directory tree.
//!
//! Nodes and files are stored by value in two vectors and referenced by [`NodeId`] and
//! [`FileId`]. Every node except the root has exactly one parent, so the arena is a plain
//! tree: parents own their children through the ordered `children` id list.

use crate::classify::{FileEntry, FileRole};
use crate::segment::SegmentKind;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

impl FileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The files of one directory, grouped by role in classification order.
#[derive(Debug, Clone, Default)]
pub struct FileGroups {
    by_role: BTreeMap<FileRole, Vec<FileId>>,
}

impl FileGroups {
    pub fn get(&self, role: FileRole) -> &[FileId] {
        self.by_role.get(&role).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn first(&self, role: FileRole) -> Option<FileId> {
        self.get(role).first().copied()
    }

    pub fn contains(&self, role: FileRole) -> bool {
        !self.get(role).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileRole, &[FileId])> {
        self.by_role.iter().map(|(role, ids)| (*role, ids.as_slice()))
    }

    fn push(&mut self, role: FileRole, id: FileId) {
        self.by_role.entry(role).or_default().push(id);
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryNode {
    name: String,
    segment: SegmentKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    files: FileGroups,
}

impl DirectoryNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segment(&self) -> &SegmentKind {
        &self.segment
    }

    pub fn is_dynamic(&self) -> bool {
        self.segment.is_dynamic()
    }

    pub fn is_catch_all(&self) -> bool {
        self.segment.is_catch_all()
    }

    pub fn is_optional_catch_all(&self) -> bool {
        self.segment.is_optional_catch_all()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn files(&self) -> &FileGroups {
        &self.files
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryTree {
    nodes: Vec<DirectoryNode>,
    files: Vec<FileEntry>,
    owners: Vec<NodeId>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryTree {
    /// Creates a tree holding only the (unnamed) root directory.
    pub fn new() -> Self {
        let root = DirectoryNode {
            name: String::new(),
            segment: SegmentKind::Literal,
            parent: None,
            children: vec![],
            files: FileGroups::default(),
        };
        Self { nodes: vec![root], files: vec![], owners: vec![] }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Appends a child directory, its segment kind is derived from `name`.
    pub fn add_directory(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DirectoryNode {
            name: name.to_string(),
            segment: SegmentKind::parse(name),
            parent: Some(parent),
            children: vec![],
            files: FileGroups::default(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn add_file(&mut self, node: NodeId, entry: FileEntry) -> FileId {
        let id = FileId(self.files.len());
        self.nodes[node.0].files.push(entry.role(), id);
        self.files.push(entry);
        self.owners.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &DirectoryNode {
        &self.nodes[id.0]
    }

    pub fn file(&self, id: FileId) -> &FileEntry {
        &self.files[id.0]
    }

    /// The directory holding a file.
    pub fn owner_of(&self, id: FileId) -> NodeId {
        self.owners[id.0]
    }

    /// All node ids in creation order, the root first.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn children_mut(&mut self, id: NodeId) -> &mut Vec<NodeId> {
        &mut self.nodes[id.0].children
    }

    /// Ids of `id` and all of its ancestors, root first.
    pub fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut lineage = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            lineage.push(parent);
            current = parent;
        }
        lineage.reverse();
        lineage
    }

    /// The relative directory path of a node, `""` for the root.
    pub fn path_of(&self, id: NodeId) -> String {
        self.lineage(id)
            .into_iter()
            .filter(|node| *node != NodeId::ROOT)
            .map(|node| self.nodes[node.0].name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Searches `from` and then its ancestors for the first file with `role`.
    pub fn nearest_file(&self, from: NodeId, role: FileRole) -> Option<FileId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            if let Some(file) = node.files.first(role) {
                return Some(file);
            }
            current = node.parent;
        }
        None
    }

    /// Node ids in depth-first pre-order, following the current child order.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        order
    }

    /// True if `id` or any directory below it owns a handler.
    pub fn has_handler_within(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        node.files.contains(FileRole::Handler) || node.children.iter().any(|child| self.has_handler_within(*child))
    }
}
