//! Backing store for the `Transfer` subtree.
//!
//! Files dropped into `Transfer` are written to a scratch directory on
//! the device itself, so the final move into the music shards stays on
//! one filesystem. The scratch directory is hidden from the player.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SCRATCH_DIR: &str = ".podfuse_tmp";

#[derive(Debug)]
pub struct StagingArea {
    scratch: PathBuf,
}

impl StagingArea {
    pub fn new(device_root: impl AsRef<Path>) -> Self {
        Self {
            scratch: device_root.as_ref().join(SCRATCH_DIR),
        }
    }

    /// Creates the scratch directory; leftovers from a previous run are
    /// discarded first.
    pub fn ensure(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.scratch) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        fs::create_dir_all(&self.scratch)
    }

    /// The on-disk path backing a `Transfer`-relative path.
    pub fn real_path(&self, relative: &str) -> PathBuf {
        let mut path = self.scratch.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }
}
