//! Ingestion pipeline and batch sync.
//!
//! Two roads lead into the database: a staged file released under
//! `Transfer`, and a batch sync consuming the upload list. Both funnel
//! through [`ingest_file`], and the controller's ingest mutex serializes
//! them so shard allocation and database updates never interleave.

use std::fs;
use std::io;
use std::path::Path;

use parking_lot::{Mutex, MutexGuard};

use common::{
    file_type_for_extension, DatabaseError, StorageError, TagError, Track, TransferMode,
};

use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    /// A batch sync is running but between items.
    Batch,
    /// A file is being copied in; the payload is shown in the statistics
    /// report as `Currently Syncing`.
    Uploading(String),
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unrecognized media extension {0:?}")]
    UnsupportedExtension(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Shared sync state: what the daemon is doing right now, plus the mutex
/// every ingestion path must hold.
#[derive(Default)]
pub struct SyncController {
    status: Mutex<SyncStatus>,
    ingest: Mutex<()>,
}

impl SyncController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SyncStatus {
        self.status.lock().clone()
    }

    fn set_status(&self, status: SyncStatus) {
        *self.status.lock() = status;
    }

    /// Claims the batch slot. Returns false when a batch is already
    /// running, in which case the caller must do nothing.
    pub fn try_begin_batch(&self) -> bool {
        let mut status = self.status.lock();
        if *status == SyncStatus::Idle {
            *status = SyncStatus::Batch;
            true
        } else {
            false
        }
    }

    fn finish_batch(&self) {
        self.set_status(SyncStatus::Idle);
    }

    /// Serializes ingestion across batch items and staged releases.
    pub fn ingest_guard(&self) -> MutexGuard<'_, ()> {
        self.ingest.lock()
    }

    /// Marks a single staged upload as in flight.
    pub fn set_uploading(&self, description: String) {
        self.set_status(SyncStatus::Uploading(description));
    }

    pub fn set_idle(&self) {
        self.set_status(SyncStatus::Idle);
    }
}

/// Pulls one media file into the database: validate the extension, read
/// tags, allocate device storage, insert, project. Returns the inserted
/// track. The caller holds the controller's ingest guard.
pub fn ingest_file(
    state: &AppState,
    source: &Path,
    mode: TransferMode,
) -> Result<Track, IngestError> {
    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let file_type = file_type_for_extension(&extension)
        .ok_or_else(|| IngestError::UnsupportedExtension(extension.clone()))?;

    let size = fs::metadata(source)?.len();
    let tags = state.tags.extract(source)?;
    let device_path = state.storage.allocate(source, &extension, mode)?;

    let mut track = Track {
        title: tags.title,
        artist: tags.artist,
        album: tags.album,
        genre: tags.genre,
        comment: tags.comment,
        track_number: tags.track_number,
        year: tags.year,
        bitrate: tags.bitrate,
        sample_rate: tags.sample_rate,
        duration_ms: tags.duration_ms,
        size,
        device_path,
        file_type: Some(file_type.to_owned()),
        ..Track::default()
    };
    track.id = state.db.lock().insert_track(track.clone());

    state.views.project(&mut state.tree.lock(), &track);
    tracing::info!(id = track.id, source = %source.display(), "track ingested");
    Ok(track)
}

/// Runs a batch sync over the upload list. A second trigger while one is
/// running is a silent no-op. Individual failures are logged and skipped;
/// the batch keeps going.
pub fn run_batch(state: &AppState) {
    if !state.sync.try_begin_batch() {
        tracing::debug!("batch sync already running, trigger ignored");
        return;
    }
    let guard = state.sync.ingest_guard();

    let queue = match fs::read_to_string(state.upload_list_path()) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(error = %err, "cannot read upload list");
            state.sync.finish_batch();
            return;
        }
    };

    let mut ingested = 0usize;
    for line in queue.lines() {
        let path = line.trim();
        if path.is_empty() {
            continue;
        }
        let source = Path::new(path);
        if !source.is_file() {
            tracing::warn!(path, "upload list entry is not a regular file, skipped");
            continue;
        }

        state.sync.set_status(SyncStatus::Uploading(path.to_owned()));
        match ingest_file(state, source, TransferMode::Copy) {
            Ok(_) => ingested += 1,
            Err(err) => tracing::warn!(path, error = %err, "upload failed, skipped"),
        }
    }

    if let Err(err) = fs::write(state.upload_list_path(), b"") {
        tracing::warn!(error = %err, "cannot truncate upload list");
    }
    state.sync.set_status(SyncStatus::Uploading("database".to_owned()));
    if let Err(err) = state.db.lock().persist() {
        tracing::warn!(error = %err, "cannot persist database after batch");
    }

    drop(guard);
    state.sync.finish_batch();
    tracing::info!(ingested, "batch sync finished");
}
