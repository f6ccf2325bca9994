//! Physical placement of media files on the device.
//!
//! Devices keep their media under `iPod_Control/Music/F00..F19`. The
//! allocator probes a random shard, scans forward (with wraparound) for one
//! that exists, then picks a randomized `podfuse%06d.<ext>` name that is not
//! taken and moves or copies the source bytes there.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;

/// Number of shard directories on a freshly laid-out device.
pub const SHARD_COUNT: u32 = 20;

const MUSIC_DIR: &str = "iPod_Control/Music";
const FILENAME_SPACE: u32 = 1_000_000;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no shard directory exists under {0}")]
    NoShards(PathBuf),

    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Whether ingestion consumes the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Delete the source after the bytes land on the device. Used for
    /// staged uploads, whose scratch file lives on the device already.
    Move,
    /// Leave the source untouched. Used for batch sync from host paths.
    Copy,
}

/// Allocates device-resident paths and relocates bytes into them.
pub struct StorageAllocator {
    mount_point: PathBuf,
}

impl StorageAllocator {
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            mount_point: mount_point.into(),
        }
    }

    /// Creates the device directory layout (control dir, database dir, and
    /// all shard directories). Safe to call on an already-initialized device.
    pub fn create_layout(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.mount_point.join("iPod_Control/iTunes"))?;
        for shard in 0..SHARD_COUNT {
            fs::create_dir_all(self.shard_dir(shard))?;
        }
        Ok(())
    }

    /// Relocates `source` into device storage and returns the new path
    /// relative to the mount point.
    pub fn allocate(
        &self,
        source: &Path,
        extension: &str,
        mode: TransferMode,
    ) -> Result<String, StorageError> {
        let shard = self.pick_shard()?;
        let (relative, target) = self.pick_filename(shard, extension);

        match mode {
            TransferMode::Copy => {
                fs::copy(source, &target)?;
            }
            TransferMode::Move => {
                // Staged files live on the same filesystem, so rename is the
                // common case; fall back to copy+unlink across devices.
                if fs::rename(source, &target).is_err() {
                    fs::copy(source, &target)?;
                    fs::remove_file(source)?;
                }
            }
        }

        tracing::debug!(source = %source.display(), target = %relative, "relocated media file");
        Ok(relative)
    }

    fn shard_dir(&self, shard: u32) -> PathBuf {
        self.mount_point.join(format!("{MUSIC_DIR}/F{shard:02}"))
    }

    /// Random probe, forward scan, wraparound; only existing directories
    /// qualify (a device may have fewer than [`SHARD_COUNT`] shards).
    fn pick_shard(&self) -> Result<u32, StorageError> {
        let start = rand::rng().random_range(0..SHARD_COUNT);
        for offset in 0..SHARD_COUNT {
            let shard = (start + offset) % SHARD_COUNT;
            if self.shard_dir(shard).is_dir() {
                return Ok(shard);
            }
        }
        Err(StorageError::NoShards(self.mount_point.join(MUSIC_DIR)))
    }

    fn pick_filename(&self, shard: u32, extension: &str) -> (String, PathBuf) {
        let mut rng = rand::rng();
        loop {
            let n = rng.random_range(0..FILENAME_SPACE);
            let relative = format!("{MUSIC_DIR}/F{shard:02}/podfuse{n:06}.{extension}");
            let absolute = self.mount_point.join(&relative);
            if !absolute.exists() {
                return (relative, absolute);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_layout() {
        let dir = TempDir::new().unwrap();
        let alloc = StorageAllocator::new(dir.path());
        alloc.create_layout().unwrap();

        assert!(dir.path().join("iPod_Control/iTunes").is_dir());
        assert!(dir.path().join("iPod_Control/Music/F00").is_dir());
        assert!(dir.path().join("iPod_Control/Music/F19").is_dir());
    }

    #[test]
    fn test_allocate_move_consumes_source() {
        let dir = TempDir::new().unwrap();
        let alloc = StorageAllocator::new(dir.path());
        alloc.create_layout().unwrap();

        let source = dir.path().join("song.mp3");
        fs::write(&source, b"bytes").unwrap();

        let relative = alloc.allocate(&source, "mp3", TransferMode::Move).unwrap();
        assert!(!source.exists());
        assert!(relative.starts_with("iPod_Control/Music/F"));
        assert!(relative.ends_with(".mp3"));
        assert_eq!(fs::read(dir.path().join(&relative)).unwrap(), b"bytes");
    }

    #[test]
    fn test_allocate_copy_keeps_source() {
        let dir = TempDir::new().unwrap();
        let alloc = StorageAllocator::new(dir.path());
        alloc.create_layout().unwrap();

        let source = dir.path().join("song.wav");
        fs::write(&source, b"bytes").unwrap();

        let relative = alloc.allocate(&source, "wav", TransferMode::Copy).unwrap();
        assert!(source.exists());
        assert_eq!(fs::read(dir.path().join(&relative)).unwrap(), b"bytes");
    }

    #[test]
    fn test_allocate_without_shards_fails() {
        let dir = TempDir::new().unwrap();
        let alloc = StorageAllocator::new(dir.path());

        let source = dir.path().join("song.mp3");
        fs::write(&source, b"bytes").unwrap();

        let err = alloc.allocate(&source, "mp3", TransferMode::Copy);
        assert!(matches!(err, Err(StorageError::NoShards(_))));
        assert!(source.exists());
    }

    #[test]
    fn test_allocate_uses_any_existing_shard() {
        let dir = TempDir::new().unwrap();
        let alloc = StorageAllocator::new(dir.path());
        // Only one shard exists; the wraparound scan must find it.
        fs::create_dir_all(dir.path().join("iPod_Control/Music/F07")).unwrap();

        let source = dir.path().join("song.mp3");
        fs::write(&source, b"bytes").unwrap();

        let relative = alloc.allocate(&source, "mp3", TransferMode::Copy).unwrap();
        assert!(relative.starts_with("iPod_Control/Music/F07/"));
    }
}
