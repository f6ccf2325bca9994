//! Inode ↔ path mapping.
//!
//! The kernel addresses everything by 64-bit inode; the projection engine
//! is path-keyed. This table bridges the two. Keys are case-folded to
//! match the namespace's case-insensitive lookup, so `/All` and `/all`
//! resolve to the same inode; the spelling first registered is the one
//! handed back out.

use std::collections::HashMap;

#[derive(Debug)]
pub struct InodeTable {
    path_to_inode: HashMap<String, u64>,
    inode_to_path: HashMap<u64, String>,
    next_inode: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    /// FUSE fixes the root at inode 1.
    pub const ROOT_INODE: u64 = 1;

    pub fn new() -> Self {
        let mut table = Self {
            path_to_inode: HashMap::new(),
            inode_to_path: HashMap::new(),
            next_inode: 2,
        };
        table.path_to_inode.insert("/".to_owned(), Self::ROOT_INODE);
        table.inode_to_path.insert(Self::ROOT_INODE, "/".to_owned());
        table
    }

    pub fn get_or_create(&mut self, path: &str) -> u64 {
        let normalized = normalize(path);
        if let Some(&inode) = self.path_to_inode.get(&fold(&normalized)) {
            return inode;
        }
        let inode = self.next_inode;
        self.next_inode += 1;
        self.path_to_inode.insert(fold(&normalized), inode);
        self.inode_to_path.insert(inode, normalized);
        inode
    }

    pub fn get_inode(&self, path: &str) -> Option<u64> {
        self.path_to_inode.get(&fold(&normalize(path))).copied()
    }

    pub fn get_path(&self, inode: u64) -> Option<&str> {
        self.inode_to_path.get(&inode).map(String::as_str)
    }

    /// Drops the mapping for a path, returning its inode.
    pub fn remove_by_path(&mut self, path: &str) -> Option<u64> {
        let inode = self.path_to_inode.remove(&fold(&normalize(path)))?;
        self.inode_to_path.remove(&inode);
        Some(inode)
    }

    /// Drops every mapping under a directory, the directory included.
    pub fn remove_subtree(&mut self, path: &str) {
        let prefix = format!("{}/", fold(&normalize(path)));
        let doomed: Vec<String> = self
            .path_to_inode
            .keys()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect();
        for path in doomed {
            if let Some(inode) = self.path_to_inode.remove(&path) {
                self.inode_to_path.remove(&inode);
            }
        }
        self.remove_by_path(path);
    }
}

fn fold(path: &str) -> String {
    path.to_lowercase()
}

/// Leading slash, no trailing slash, `/` for the root.
pub fn normalize(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }
    let mut normalized = if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Joins a directory path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// The directory part of a normalized path.
pub fn parent_path(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_owned(),
        Some(pos) => normalized[..pos].to_owned(),
    }
}

/// The final component of a path.
pub fn filename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_preregistered() {
        let table = InodeTable::new();
        assert_eq!(table.get_inode("/"), Some(InodeTable::ROOT_INODE));
        assert_eq!(table.get_path(InodeTable::ROOT_INODE), Some("/"));
    }

    #[test]
    fn test_case_insensitive_reuse() {
        let mut table = InodeTable::new();
        let a = table.get_or_create("/All/Bowie - Low.mp3");
        let b = table.get_or_create("/all/bowie - low.mp3");
        assert_eq!(a, b);
        // First spelling wins.
        assert_eq!(table.get_path(a), Some("/All/Bowie - Low.mp3"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("foo"), "/foo");
        assert_eq!(normalize("/foo/"), "/foo");
        assert_eq!(normalize("/foo/bar"), "/foo/bar");
    }

    #[test]
    fn test_parent_and_filename() {
        assert_eq!(parent_path("/"), "/");
        assert_eq!(parent_path("/foo"), "/");
        assert_eq!(parent_path("/foo/bar"), "/foo");
        assert_eq!(filename("/foo/bar.mp3"), "bar.mp3");
        assert_eq!(filename("/"), "");
        assert_eq!(join("/", "foo"), "/foo");
        assert_eq!(join("/foo", "bar"), "/foo/bar");
    }

    #[test]
    fn test_remove_subtree() {
        let mut table = InodeTable::new();
        table.get_or_create("/Artists/Bowie");
        table.get_or_create("/Artists/Bowie/Low");
        table.get_or_create("/Artists/Bowie/Low/01.mp3");
        let other = table.get_or_create("/Artists/Eno");

        table.remove_subtree("/Artists/Bowie");
        assert_eq!(table.get_inode("/Artists/Bowie"), None);
        assert_eq!(table.get_inode("/Artists/Bowie/Low/01.mp3"), None);
        assert_eq!(table.get_inode("/Artists/Eno"), Some(other));
    }
}
