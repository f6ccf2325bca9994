//! The `statistics` report.
//!
//! Rendered on every read so it always reflects the live database and
//! sync state. The helper scripts grep this file, so the label text is
//! part of the interface.

use common::{discover::REAL_MOUNTPOINT_PREFIX, Database};

use crate::sync::SyncStatus;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn render(db: &dyn Database, status: &SyncStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("PodFuse Version: {VERSION}\n"));
    out.push_str(&format!("Database Version: {}\n", db.version()));
    out.push_str(&format!(
        "{}{}\n",
        REAL_MOUNTPOINT_PREFIX,
        db.mount_point().display()
    ));
    out.push_str(&format!(
        "Device Name: {}\n",
        db.device_name().unwrap_or_else(|| "Unknown".to_owned())
    ));
    out.push_str(&format!("Track Count: {}\n", db.track_count()));
    out.push_str(&format!("Playlist Count: {}\n", db.playlist_count()));

    if let SyncStatus::Uploading(path) = status {
        out.push_str(&format!("Currently Syncing: {path}\n"));
    }
    out
}
