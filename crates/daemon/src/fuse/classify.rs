//! Path classification.
//!
//! Every kernel operation starts by classifying its path exactly once;
//! the handlers then branch on the class instead of re-matching name
//! strings. Reserved names are matched case-sensitively, unlike the rest
//! of the namespace.

pub const UPLOAD_LIST_FILE: &str = "add_songs";
pub const ADD_FILES_SCRIPT: &str = "add_files.sh";
pub const SYNC_SCRIPT: &str = "sync_ipod.sh";
pub const SYNC_TRIGGER_FILE: &str = "sync-ipod-now";
pub const STATISTICS_FILE: &str = "statistics";
pub const TRANSFER_DIR: &str = "Transfer";
pub const PLAYLISTS_DIR: &str = "Playlists";

/// Root-level reserved files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedFile {
    /// `add_songs`: writable queue of host paths for the next batch sync.
    UploadList,
    /// `sync_ipod.sh`: generated helper script.
    SyncScript,
    /// `add_files.sh`: generated helper script.
    AddFilesScript,
    /// `statistics`: read-only status report.
    Statistics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathClass {
    Reserved(ReservedFile),
    /// Inside `Transfer`; the payload is the path relative to it, empty
    /// for the staging root itself.
    Staging(String),
    /// A direct child of `Playlists` (depth exactly two).
    PlaylistDir(String),
    /// Anything else: template views, intermediate directories, the root.
    Regular,
}

/// Classifies a normalized absolute path.
pub fn classify(path: &str) -> PathClass {
    let trimmed = path.trim_start_matches('/');
    let mut segments = trimmed.split('/').filter(|s| !s.is_empty());
    let Some(first) = segments.next() else {
        return PathClass::Regular;
    };
    let rest: Vec<&str> = segments.collect();

    if rest.is_empty() {
        match first {
            UPLOAD_LIST_FILE => return PathClass::Reserved(ReservedFile::UploadList),
            SYNC_SCRIPT => return PathClass::Reserved(ReservedFile::SyncScript),
            ADD_FILES_SCRIPT => return PathClass::Reserved(ReservedFile::AddFilesScript),
            STATISTICS_FILE => return PathClass::Reserved(ReservedFile::Statistics),
            _ => {}
        }
    }

    if first == TRANSFER_DIR {
        return PathClass::Staging(rest.join("/"));
    }

    if first == PLAYLISTS_DIR && rest.len() == 1 {
        return PathClass::PlaylistDir(rest[0].to_owned());
    }

    PathClass::Regular
}
