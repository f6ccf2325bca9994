//! Drives the path templates over the database to populate the tree.
//!
//! Each configured template contributes one browsing view; on top of those
//! the builder maintains the `Playlists` collection, whose entries are
//! numbered so the playlist's own ordering survives directory listing.

use common::{Database, Playlist, Track};

use crate::fuse::classify::PLAYLISTS_DIR;
use crate::vfs::template::{sanitize, PathTemplate, TemplateError};
use crate::vfs::tree::Tree;

/// How a playlist entry file is named, before the ordinal prefix.
const PLAYLIST_ENTRY_TEMPLATE: &str = "/%a - %t.%e";

const DIR_PERM: u16 = 0o555;
const FILE_PERM: u16 = 0o444;

pub struct ViewBuilder {
    templates: Vec<PathTemplate>,
    playlist_entry: PathTemplate,
}

impl ViewBuilder {
    pub fn new(templates: Vec<PathTemplate>) -> Result<Self, TemplateError> {
        Ok(Self {
            templates,
            playlist_entry: PathTemplate::parse(PLAYLIST_ENTRY_TEMPLATE)?,
        })
    }

    pub fn templates(&self) -> &[PathTemplate] {
        &self.templates
    }

    /// Creates and pins the top-level view directories so they survive
    /// pruning even when the database is empty.
    pub fn pin_roots(&self, tree: &mut Tree) {
        for template in &self.templates {
            if let Some(name) = template.fixed_root() {
                let id = tree.insert_dir(tree.root(), name, DIR_PERM);
                tree.pin(id);
            }
        }
        let playlists = tree.insert_dir(tree.root(), PLAYLISTS_DIR, DIR_PERM);
        tree.pin(playlists);
    }

    /// Places one track into every view. Existing same-named nodes are
    /// left alone, so on collision the first projected track owns the path.
    pub fn project(&self, tree: &mut Tree, track: &Track) {
        for template in &self.templates {
            let segments = template.expand(track);
            let Some((file_name, dirs)) = segments.split_last() else {
                continue;
            };
            let mut cur = tree.root();
            for dir in dirs {
                cur = tree.insert_dir(cur, dir, DIR_PERM);
            }
            tree.insert_file(cur, file_name, FILE_PERM, track.size, Some(track.id));
        }
    }

    /// Removes a track from every view and prunes directories it emptied.
    /// Paths owned by a different (colliding) track are left untouched.
    pub fn unproject(&self, tree: &mut Tree, track: &Track) {
        for template in &self.templates {
            let segments = template.expand(track);
            let path = segments.join("/");
            let Some(id) = tree.lookup(&path) else {
                continue;
            };
            let Some(node) = tree.get(id) else { continue };
            if !node.is_file() || node.track != Some(track.id) {
                continue;
            }
            let parent = node.parent();
            tree.remove(id);
            if let Some(parent) = parent {
                tree.prune_empty_ancestors(parent);
            }
        }
    }

    /// Rebuilds the `Playlists` subtree from scratch. Entry files carry a
    /// zero-padded ordinal prefix so `readdir` order matches playlist order.
    pub fn rebuild_playlists(&self, tree: &mut Tree, db: &dyn Database) {
        let Some(root) = tree.lookup(PLAYLISTS_DIR) else {
            return;
        };
        let children: Vec<_> = tree.children(root).map(|(_, id)| id).collect();
        for child in children {
            tree.remove_subtree(child);
        }

        for playlist in db.playlists() {
            if playlist.master {
                continue;
            }
            self.project_playlist(tree, db, &playlist);
        }
    }

    fn project_playlist(&self, tree: &mut Tree, db: &dyn Database, playlist: &Playlist) {
        let root = match tree.lookup(PLAYLISTS_DIR) {
            Some(id) => id,
            None => return,
        };
        let dir = tree.insert_dir(root, &sanitize(&playlist.name), DIR_PERM);

        let width = digits(playlist.members.len());
        for (idx, member) in playlist.members.iter().enumerate() {
            let Some(track) = db.track(*member) else {
                tracing::warn!(playlist = %playlist.name, track = member, "playlist references missing track");
                continue;
            };
            let entry = self
                .playlist_entry
                .expand(&track)
                .pop()
                .unwrap_or_else(|| "Unknown".to_owned());
            let name = format!("{:0width$} - {}", idx + 1, entry, width = width);
            tree.insert_file(dir, &name, FILE_PERM, track.size, Some(track.id));
        }
    }

    /// Full projection: view roots, every track, every playlist.
    pub fn rebuild_all(&self, tree: &mut Tree, db: &dyn Database) {
        self.pin_roots(tree);
        for track in db.tracks() {
            self.project(tree, &track);
        }
        self.rebuild_playlists(tree, db);
    }
}

fn digits(n: usize) -> usize {
    n.max(1).to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::JsonDatabase;
    use tempfile::TempDir;

    fn builder() -> ViewBuilder {
        let templates = vec![
            PathTemplate::parse("/All/%a - %t.%e").unwrap(),
            PathTemplate::parse("/Artists/%a/%A/%T - %t.%e").unwrap(),
        ];
        ViewBuilder::new(templates).unwrap()
    }

    fn track(id: u64, artist: &str, title: &str) -> Track {
        Track {
            id,
            artist: Some(artist.to_owned()),
            title: Some(title.to_owned()),
            album: Some("Low".to_owned()),
            track_number: 3,
            size: 1000,
            device_path: format!("iPod_Control/Music/F00/podfuse{id:06}.mp3"),
            ..Track::default()
        }
    }

    #[test]
    fn test_project_and_unproject_round_trip() {
        let mut tree = Tree::new();
        let b = builder();
        b.pin_roots(&mut tree);
        let t = track(1, "Bowie", "Breaking Glass");

        b.project(&mut tree, &t);
        assert!(tree.lookup("/All/Bowie - Breaking Glass.mp3").is_some());
        let file = tree
            .lookup("/Artists/Bowie/Low/03 - Breaking Glass.mp3")
            .unwrap();
        assert_eq!(tree.get(file).unwrap().size, 1000);
        assert_eq!(tree.get(file).unwrap().track, Some(1));

        b.unproject(&mut tree, &t);
        assert_eq!(tree.lookup("/Artists/Bowie"), None);
        // Pinned view roots stay, even empty.
        assert!(tree.lookup("/Artists").is_some());
        assert!(tree.lookup("/All").is_some());
        assert_eq!(tree.get(tree.lookup("/All").unwrap()).unwrap().child_count(), 0);
    }

    #[test]
    fn test_collision_keeps_first_track() {
        let mut tree = Tree::new();
        let b = builder();
        b.pin_roots(&mut tree);
        let first = track(1, "Bowie", "Breaking Glass");
        let second = track(2, "Bowie", "Breaking Glass");

        b.project(&mut tree, &first);
        b.project(&mut tree, &second);
        let file = tree.lookup("/All/Bowie - Breaking Glass.mp3").unwrap();
        assert_eq!(tree.get(file).unwrap().track, Some(1));

        // Unprojecting the loser leaves the winner's node alone.
        b.unproject(&mut tree, &second);
        assert!(tree.lookup("/All/Bowie - Breaking Glass.mp3").is_some());

        b.unproject(&mut tree, &first);
        assert_eq!(tree.lookup("/All/Bowie - Breaking Glass.mp3"), None);
    }

    #[test]
    fn test_playlist_entries_are_ordered_and_padded() {
        let dir = TempDir::new().unwrap();
        let mut db = JsonDatabase::open(dir.path()).unwrap();
        let mut ids = Vec::new();
        for i in 0..12 {
            ids.push(db.insert_track(track(0, "Bowie", &format!("Song {i}"))));
        }

        let mut tree = Tree::new();
        let b = builder();
        b.pin_roots(&mut tree);

        // A playlist listing tracks in reverse insertion order.
        let mut members = ids.clone();
        members.reverse();
        let playlist = Playlist {
            name: "Road Trip".to_owned(),
            master: false,
            members,
        };
        b.project_playlist(&mut tree, &db, &playlist);

        let dir_id = tree.lookup("/Playlists/Road Trip").unwrap();
        let names: Vec<String> = tree
            .children(tree.lookup("/Playlists/Road Trip").unwrap())
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(names.len(), 12);
        // Two-digit padding for 12 members; lexicographic == playlist order.
        assert_eq!(names[0], "01 - Bowie - Song 11.mp3");
        assert_eq!(names[11], "12 - Bowie - Song 0.mp3");
        assert_eq!(tree.get(dir_id).unwrap().child_count(), 12);
    }

    #[test]
    fn test_rebuild_playlists_skips_master() {
        let dir = TempDir::new().unwrap();
        let mut db = JsonDatabase::open(dir.path()).unwrap();
        db.insert_track(track(0, "Bowie", "Breaking Glass"));

        let mut tree = Tree::new();
        let b = builder();
        b.pin_roots(&mut tree);
        b.rebuild_playlists(&mut tree, &db);

        let root = tree.lookup(PLAYLISTS_DIR).unwrap();
        assert_eq!(tree.get(root).unwrap().child_count(), 0);
    }
}
