//! In-memory projection tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]; parents are
//! stored as indices and children as a map from case-folded name to index,
//! so sibling names are unique under case-insensitive comparison. A
//! directory's `size` field counts its direct directory children and is
//! kept in lockstep with insertion/removal; the FUSE layer turns it into a
//! link count.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use common::TrackId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    RegularFile,
}

#[derive(Debug)]
pub struct Node {
    /// Display name, interned. The case-folded form keys the parent's
    /// child map.
    pub name: Arc<str>,
    pub kind: NodeKind,
    /// Permission bits only; the file-type bits come from `kind`.
    pub perm: u16,
    /// Files: byte length. Directories: count of direct directory children.
    pub size: u64,
    /// Present only on regular files that represent a database track.
    pub track: Option<TrackId>,
    /// Pinned nodes survive [`Tree::prune_empty_ancestors`]: the root, the
    /// view roots, and the reserved directories.
    pub pinned: bool,
    parent: Option<NodeId>,
    children: BTreeMap<String, NodeId>,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::RegularFile
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Case-insensitive name cache; the first spelling seen wins, later
/// lookups under any casing share it.
#[derive(Default)]
struct NameInterner {
    names: HashMap<String, Arc<str>>,
}

impl NameInterner {
    fn intern(&mut self, name: &str) -> Arc<str> {
        let key = fold(name);
        self.names
            .entry(key)
            .or_insert_with(|| Arc::from(name))
            .clone()
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

pub struct Tree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
    names: NameInterner,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            names: NameInterner::default(),
        };
        let root = Node {
            name: Arc::from(""),
            kind: NodeKind::Directory,
            perm: 0o555,
            size: 0,
            track: None,
            pinned: true,
            parent: None,
            children: BTreeMap::new(),
        };
        tree.root = tree.alloc(root);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Resolves a slash-separated path from the root, comparing each
    /// segment case-insensitively. Empty segments are skipped, so `/`,
    /// `//` and a trailing slash all behave.
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        let mut cur = self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            cur = self.child(cur, segment)?;
        }
        Some(cur)
    }

    /// Finds a direct child by (case-insensitive) name.
    pub fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.get(dir)?.children.get(&fold(name)).copied()
    }

    /// Iterates a directory's children as (display name, id).
    pub fn children(&self, dir: NodeId) -> impl Iterator<Item = (Arc<str>, NodeId)> + '_ {
        self.get(dir)
            .into_iter()
            .flat_map(|n| n.children.values())
            .filter_map(|id| self.get(*id).map(|n| (n.name.clone(), *id)))
    }

    /// Inserts a directory child, or returns the existing same-named child.
    /// Idempotent by design: projection re-runs freely.
    pub fn insert_dir(&mut self, parent: NodeId, name: &str, perm: u16) -> NodeId {
        self.insert_child(parent, name, NodeKind::Directory, perm, 0, None)
    }

    /// Inserts a regular-file child, or returns the existing same-named
    /// child unchanged (path collisions keep the first writer).
    pub fn insert_file(
        &mut self,
        parent: NodeId,
        name: &str,
        perm: u16,
        size: u64,
        track: Option<TrackId>,
    ) -> NodeId {
        self.insert_child(parent, name, NodeKind::RegularFile, perm, size, track)
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        perm: u16,
        size: u64,
        track: Option<TrackId>,
    ) -> NodeId {
        if let Some(existing) = self.child(parent, name) {
            return existing;
        }

        let interned = self.names.intern(name);
        let node = Node {
            name: interned,
            kind,
            perm,
            size,
            track,
            pinned: false,
            parent: Some(parent),
            children: BTreeMap::new(),
        };
        let id = self.alloc(node);

        if let Some(p) = self.get_mut(parent) {
            p.children.insert(fold(name), id);
            if kind == NodeKind::Directory {
                p.size += 1;
            }
        }
        id
    }

    /// Marks a node as unprunable.
    pub fn pin(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.pinned = true;
        }
    }

    /// Unlinks a node from its parent and discards it. The caller removes
    /// children first; directories go bottom-up.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        debug_assert!(node.children.is_empty(), "removed node still has children");

        if let Some(parent) = node.parent {
            let key = fold(&node.name);
            if let Some(p) = self.get_mut(parent) {
                p.children.remove(&key);
                if node.kind == NodeKind::Directory {
                    p.size = p.size.saturating_sub(1);
                }
            }
        }
        self.free.push(id.0);
    }

    /// Removes a node and everything below it.
    pub fn remove_subtree(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self
            .get(id)
            .map(|n| n.children.values().copied().collect())
            .unwrap_or_default();
        for child in children {
            self.remove_subtree(child);
        }
        self.remove(id);
    }

    /// Starting at a directory, removes every ancestor that has become
    /// childless, stopping at the first one that still has children or is
    /// pinned. Used after unprojecting a track so empty Artist/Album
    /// directories do not linger.
    pub fn prune_empty_ancestors(&mut self, from: NodeId) {
        let mut cur = from;
        loop {
            let Some(node) = self.get(cur) else { return };
            if node.pinned || !node.is_dir() || !node.children.is_empty() {
                return;
            }
            let parent = node.parent;
            self.remove(cur);
            match parent {
                Some(p) => cur = p,
                None => return,
            }
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }
}
