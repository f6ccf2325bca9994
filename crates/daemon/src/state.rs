//! Shared daemon state.
//!
//! One [`AppState`] is built at mount time and handed to the FUSE layer
//! behind an `Arc`. The database and the projection tree sit behind their
//! own mutexes; everything else is immutable after construction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use common::{Database, StorageAllocator, TagExtractor};

use crate::fuse::classify::{
    ADD_FILES_SCRIPT, STATISTICS_FILE, SYNC_SCRIPT, TRANSFER_DIR, UPLOAD_LIST_FILE,
};
use crate::scripts;
use crate::staging::StagingArea;
use crate::sync::SyncController;
use crate::vfs::{Tree, ViewBuilder};

pub struct AppState {
    pub db: Mutex<Box<dyn Database>>,
    pub tree: Mutex<Tree>,
    pub views: ViewBuilder,
    pub staging: StagingArea,
    pub sync: SyncController,
    pub storage: StorageAllocator,
    pub tags: Box<dyn TagExtractor + Sync>,
    pub device_root: PathBuf,
    pub sync_script: String,
    pub add_files_script: String,
    /// Host-side scratch file backing `add_songs`.
    upload_list: NamedTempFile,
}

impl AppState {
    pub fn new(
        db: Box<dyn Database>,
        views: ViewBuilder,
        tags: Box<dyn TagExtractor + Sync>,
        device_root: PathBuf,
        fuse_mount: &Path,
    ) -> io::Result<Self> {
        let staging = StagingArea::new(&device_root);
        staging.ensure()?;
        let upload_list = NamedTempFile::new()?;

        let mount = fuse_mount.display().to_string();
        let sync_script = scripts::sync_script(&mount);
        let add_files_script = scripts::add_files_script(&mount);

        let mut tree = Tree::new();
        bootstrap_reserved(&mut tree, &sync_script, &add_files_script);
        views.rebuild_all(&mut tree, db.as_ref());

        Ok(Self {
            storage: StorageAllocator::new(&device_root),
            db: Mutex::new(db),
            tree: Mutex::new(tree),
            views,
            staging,
            sync: SyncController::new(),
            tags,
            device_root,
            sync_script,
            add_files_script,
            upload_list,
        })
    }

    pub fn upload_list_path(&self) -> &Path {
        self.upload_list.path()
    }

    /// Current byte length of the upload list.
    pub fn upload_list_size(&self) -> u64 {
        fs::metadata(self.upload_list.path())
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

/// Creates the fixed root-level namespace: the upload queue, the two
/// helper scripts, the statistics report, and the staging directory.
fn bootstrap_reserved(tree: &mut Tree, sync_script: &str, add_files_script: &str) {
    let root = tree.root();
    tree.insert_file(root, UPLOAD_LIST_FILE, 0o666, 0, None);
    tree.insert_file(root, SYNC_SCRIPT, 0o555, sync_script.len() as u64, None);
    tree.insert_file(
        root,
        ADD_FILES_SCRIPT,
        0o555,
        add_files_script.len() as u64,
        None,
    );
    tree.insert_file(root, STATISTICS_FILE, 0o444, 0, None);
    let transfer = tree.insert_dir(root, TRANSFER_DIR, 0o777);
    tree.pin(transfer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ExtractedTags, JsonDatabase, TagError, Track};
    use tempfile::TempDir;

    use crate::vfs::PathTemplate;

    struct NoTags;

    impl TagExtractor for NoTags {
        fn extract(&self, path: &Path) -> Result<ExtractedTags, TagError> {
            Err(TagError::NoTags(path.display().to_string()))
        }
    }

    fn state_with(tracks: Vec<Track>) -> (TempDir, AppState) {
        let device = TempDir::new().unwrap();
        let mut db = JsonDatabase::open(device.path()).unwrap();
        for track in tracks {
            db.insert_track(track);
        }
        let views = ViewBuilder::new(vec![
            PathTemplate::parse("/All/%a - %t.%e").unwrap(),
        ])
        .unwrap();
        let state = AppState::new(
            Box::new(db),
            views,
            Box::new(NoTags),
            device.path().to_path_buf(),
            Path::new("/mnt/player"),
        )
        .unwrap();
        (device, state)
    }

    #[test]
    fn test_bootstrap_namespace() {
        let (_device, state) = state_with(vec![Track {
            artist: Some("Bowie".to_owned()),
            title: Some("Heroes".to_owned()),
            ..Track::default()
        }]);

        let tree = state.tree.lock();
        assert!(tree.lookup("/add_songs").is_some());
        assert!(tree.lookup("/sync_ipod.sh").is_some());
        assert!(tree.lookup("/add_files.sh").is_some());
        assert!(tree.lookup("/statistics").is_some());
        assert!(tree.lookup("/Transfer").is_some());
        assert!(tree.lookup("/Playlists").is_some());
        assert!(tree.lookup("/All/Bowie - Heroes.mp3").is_some());

        let script = tree.lookup("/sync_ipod.sh").unwrap();
        assert_eq!(
            tree.get(script).unwrap().size,
            state.sync_script.len() as u64
        );
    }

    #[test]
    fn test_upload_list_starts_empty() {
        let (_device, state) = state_with(Vec::new());
        assert_eq!(state.upload_list_size(), 0);
        fs::write(state.upload_list_path(), b"/home/x/a.mp3\n").unwrap();
        assert_eq!(state.upload_list_size(), 14);
    }
}
