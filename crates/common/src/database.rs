//! The track database behind the projected filesystem.
//!
//! The daemon only talks to the [`Database`] trait: enumerate tracks and
//! playlists, insert/remove, persist. [`JsonDatabase`] is the shipped
//! implementation, keeping a serde snapshot on the device itself. The
//! player's native binary format is intentionally not implemented here.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::track::{Playlist, Track, TrackId};

/// Snapshot location relative to the device mount point.
pub const DATABASE_RELATIVE_PATH: &str = "iPod_Control/iTunes/podfuse.json";

/// Current snapshot format version.
const DATABASE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("no such track: {0}")]
    NoSuchTrack(TrackId),

    #[error("database I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("database snapshot is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Operations the projection engine needs from a track database.
pub trait Database: Send {
    /// Snapshot/schema version, surfaced in the statistics file.
    fn version(&self) -> u32;

    /// Name of the device, taken from the master playlist.
    fn device_name(&self) -> Option<String>;

    /// The device mount point this database belongs to.
    fn mount_point(&self) -> &Path;

    fn tracks(&self) -> Vec<Track>;

    fn track(&self, id: TrackId) -> Option<Track>;

    fn playlists(&self) -> Vec<Playlist>;

    /// Inserts a track, assigning its id, and appends it to the master
    /// playlist (created on first insert). Returns the assigned id.
    fn insert_track(&mut self, track: Track) -> TrackId;

    /// Removes a track and every playlist membership it has.
    fn remove_track(&mut self, id: TrackId) -> Result<Track, DatabaseError>;

    /// Removes a non-master playlist by name. Returns false if absent.
    fn remove_playlist(&mut self, name: &str) -> bool;

    /// Writes the database back to its backing store.
    fn persist(&mut self) -> Result<(), DatabaseError>;

    fn track_count(&self) -> usize;

    /// Number of playlists excluding the master playlist.
    fn playlist_count(&self) -> usize;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    next_id: TrackId,
    tracks: BTreeMap<TrackId, Track>,
    playlists: Vec<Playlist>,
}

/// JSON-snapshot database stored at [`DATABASE_RELATIVE_PATH`] on the device.
pub struct JsonDatabase {
    mount_point: PathBuf,
    snapshot: Snapshot,
}

impl JsonDatabase {
    /// Opens the database on a device, or starts an empty one when no
    /// snapshot exists yet.
    pub fn open(mount_point: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let mount_point = mount_point.into();
        let path = mount_point.join(DATABASE_RELATIVE_PATH);

        let snapshot = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no database snapshot, starting empty");
                Snapshot {
                    version: DATABASE_VERSION,
                    next_id: 1,
                    ..Snapshot::default()
                }
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            mount_point,
            snapshot,
        })
    }

    /// Registers a playlist, e.g. when importing from another source.
    pub fn add_playlist(&mut self, playlist: Playlist) {
        self.snapshot.playlists.push(playlist);
    }

    fn master_playlist_mut(&mut self) -> &mut Playlist {
        if !self.snapshot.playlists.iter().any(|p| p.master) {
            self.snapshot
                .playlists
                .insert(0, Playlist::new("podfuse", true));
        }
        self.snapshot
            .playlists
            .iter_mut()
            .find(|p| p.master)
            .unwrap()
    }
}

impl Database for JsonDatabase {
    fn version(&self) -> u32 {
        self.snapshot.version
    }

    fn device_name(&self) -> Option<String> {
        self.snapshot
            .playlists
            .iter()
            .find(|p| p.master)
            .map(|p| p.name.clone())
    }

    fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn tracks(&self) -> Vec<Track> {
        self.snapshot.tracks.values().cloned().collect()
    }

    fn track(&self, id: TrackId) -> Option<Track> {
        self.snapshot.tracks.get(&id).cloned()
    }

    fn playlists(&self) -> Vec<Playlist> {
        self.snapshot.playlists.clone()
    }

    fn insert_track(&mut self, mut track: Track) -> TrackId {
        let id = self.snapshot.next_id;
        self.snapshot.next_id += 1;
        track.id = id;
        self.snapshot.tracks.insert(id, track);
        self.master_playlist_mut().members.push(id);
        id
    }

    fn remove_track(&mut self, id: TrackId) -> Result<Track, DatabaseError> {
        let track = self
            .snapshot
            .tracks
            .remove(&id)
            .ok_or(DatabaseError::NoSuchTrack(id))?;
        for playlist in &mut self.snapshot.playlists {
            playlist.members.retain(|m| *m != id);
        }
        Ok(track)
    }

    fn remove_playlist(&mut self, name: &str) -> bool {
        let before = self.snapshot.playlists.len();
        self.snapshot
            .playlists
            .retain(|p| p.master || p.name != name);
        self.snapshot.playlists.len() != before
    }

    fn persist(&mut self) -> Result<(), DatabaseError> {
        let path = self.mount_point.join(DATABASE_RELATIVE_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(&self.snapshot)?;
        fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), "database persisted");
        Ok(())
    }

    fn track_count(&self) -> usize {
        self.snapshot.tracks.len()
    }

    fn playlist_count(&self) -> usize {
        self.snapshot.playlists.iter().filter(|p| !p.master).count()
    }
}
