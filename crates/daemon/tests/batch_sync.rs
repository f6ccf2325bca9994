//! End-to-end ingestion tests over the daemon state, no kernel mount.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use common::{
    Database, ExtractedTags, JsonDatabase, StorageAllocator, TagError, TagExtractor, TransferMode,
};
use podfuse_daemon::state::AppState;
use podfuse_daemon::sync::{self, SyncStatus};
use podfuse_daemon::vfs::{PathTemplate, ViewBuilder};

/// Derives tags from the file name: `Artist - Title.ext`.
struct StubTags;

impl TagExtractor for StubTags {
    fn extract(&self, path: &Path) -> Result<ExtractedTags, TagError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| TagError::NoTags(path.display().to_string()))?;
        let (artist, title) = stem
            .split_once(" - ")
            .ok_or_else(|| TagError::NoTags(path.display().to_string()))?;
        Ok(ExtractedTags {
            artist: Some(artist.to_owned()),
            title: Some(title.to_owned()),
            album: Some("Test Album".to_owned()),
            ..ExtractedTags::default()
        })
    }
}

fn test_state(device: &TempDir) -> AppState {
    StorageAllocator::new(device.path()).create_layout().unwrap();
    let db = JsonDatabase::open(device.path()).unwrap();
    let views = ViewBuilder::new(vec![
        PathTemplate::parse("/All/%a - %t.%e").unwrap(),
        PathTemplate::parse("/Artists/%a/%A/%T - %t.%e").unwrap(),
    ])
    .unwrap();
    AppState::new(
        Box::new(db),
        views,
        Box::new(StubTags),
        device.path().to_path_buf(),
        Path::new("/mnt/player"),
    )
    .unwrap()
}

#[test]
fn test_batch_ingests_queue_and_truncates_it() {
    let device = TempDir::new().unwrap();
    let host = TempDir::new().unwrap();
    let state = test_state(&device);

    let good = host.path().join("Bowie - Heroes.mp3");
    fs::write(&good, b"pretend mpeg bytes").unwrap();
    let also_good = host.path().join("Eno - Discreet Music.m4a");
    fs::write(&also_good, b"pretend aac bytes").unwrap();

    fs::write(
        state.upload_list_path(),
        format!(
            "{}\n/nonexistent/file.mp3\n\n{}\n",
            good.display(),
            also_good.display()
        ),
    )
    .unwrap();

    sync::run_batch(&state);

    assert_eq!(state.sync.status(), SyncStatus::Idle);
    assert_eq!(state.db.lock().track_count(), 2);
    // The queue is drained even though one entry failed.
    assert_eq!(state.upload_list_size(), 0);
    // Copy mode leaves the host files alone.
    assert!(good.exists());

    let tree = state.tree.lock();
    assert!(tree.lookup("/All/Bowie - Heroes.mp3").is_some());
    assert!(tree
        .lookup("/Artists/Eno/Test Album/00 - Discreet Music.m4a")
        .is_some());
}

#[test]
fn test_batch_skips_unsupported_extension() {
    let device = TempDir::new().unwrap();
    let host = TempDir::new().unwrap();
    let state = test_state(&device);

    let bad = host.path().join("Bowie - Heroes.ogg");
    fs::write(&bad, b"ogg bytes").unwrap();
    let good = host.path().join("Bowie - Heroes.mp3");
    fs::write(&good, b"mpeg bytes").unwrap();

    fs::write(
        state.upload_list_path(),
        format!("{}\n{}\n", bad.display(), good.display()),
    )
    .unwrap();

    sync::run_batch(&state);

    // The unsupported item is skipped, the one after it still lands.
    assert_eq!(state.db.lock().track_count(), 1);
    let db = state.db.lock();
    let track = &db.tracks()[0];
    assert_eq!(track.title.as_deref(), Some("Heroes"));
    assert_eq!(track.file_type.as_deref(), Some("mpeg"));
    assert!(track.device_path.starts_with("iPod_Control/Music/F"));
    assert!(device.path().join(&track.device_path).is_file());
}

#[test]
fn test_second_trigger_is_a_no_op() {
    let device = TempDir::new().unwrap();
    let host = TempDir::new().unwrap();
    let state = test_state(&device);

    let song = host.path().join("Bowie - Heroes.mp3");
    fs::write(&song, b"mpeg bytes").unwrap();
    fs::write(state.upload_list_path(), format!("{}\n", song.display())).unwrap();

    // A batch is already claimed; the trigger must do nothing.
    assert!(state.sync.try_begin_batch());
    sync::run_batch(&state);

    assert_eq!(state.db.lock().track_count(), 0);
    assert_ne!(state.upload_list_size(), 0);
    assert_eq!(state.sync.status(), SyncStatus::Batch);
}

#[test]
fn test_batch_persists_database() {
    let device = TempDir::new().unwrap();
    let host = TempDir::new().unwrap();
    let state = test_state(&device);

    let song = host.path().join("Bowie - Heroes.mp3");
    fs::write(&song, b"mpeg bytes").unwrap();
    fs::write(state.upload_list_path(), format!("{}\n", song.display())).unwrap();

    sync::run_batch(&state);
    drop(state);

    let reopened = JsonDatabase::open(device.path()).unwrap();
    assert_eq!(reopened.track_count(), 1);
}

#[test]
fn test_staged_ingest_moves_the_scratch_file() {
    let device = TempDir::new().unwrap();
    let state = test_state(&device);

    let staged = state.staging.real_path("Bowie - Sound and Vision.mp3");
    fs::write(&staged, b"mpeg bytes").unwrap();

    let guard = state.sync.ingest_guard();
    let track = sync::ingest_file(&state, &staged, TransferMode::Move).unwrap();
    drop(guard);

    // Move mode consumes the scratch file.
    assert!(!staged.exists());
    assert!(device.path().join(&track.device_path).is_file());
    assert_eq!(track.title.as_deref(), Some("Sound and Vision"));
    assert_eq!(state.db.lock().track_count(), 1);
    assert!(state
        .tree
        .lock()
        .lookup("/All/Bowie - Sound and Vision.mp3")
        .is_some());
}
