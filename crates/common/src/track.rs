//! Track and playlist records.
//!
//! These are the fields the projection layer reads. They mirror what a
//! portable player's database keeps per track; the database itself lives
//! behind the [`crate::Database`] trait.

use serde::{Deserialize, Serialize};

/// Stable handle into the database. Never reused within one database.
pub type TrackId = u64;

/// Ratings are stored in device units; one star equals this many units.
pub const RATING_STEP: u32 = 20;

/// Recognized upload extensions, mapped to the device-side file type tag.
pub const FILE_TYPES: [(&str, &str); 7] = [
    ("wav", "wav"),
    ("mp3", "mpeg"),
    ("mpeg", "mpeg"),
    ("mp4", "mp4"),
    ("aac", "mp4"),
    ("m4a", "mp4"),
    ("m4p", "mp4"),
];

/// Returns the device file-type tag for an extension, if recognized.
/// Matching is case-insensitive.
pub fn file_type_for_extension(ext: &str) -> Option<&'static str> {
    FILE_TYPES
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, t)| *t)
}

/// One track record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub comment: Option<String>,
    pub composer: Option<String>,
    pub description: Option<String>,
    pub podcast_url: Option<String>,
    pub podcast_rss: Option<String>,
    /// Position within the album, 0 when unknown.
    pub track_number: u32,
    /// Duration in milliseconds.
    pub duration_ms: u32,
    pub year: u32,
    pub play_count: u32,
    /// Device units; divide by [`RATING_STEP`] for stars.
    pub rating: u32,
    pub compilation: bool,
    /// Byte size of the device-resident file.
    pub size: u64,
    /// Path of the media file relative to the device mount point.
    pub device_path: String,
    pub bitrate: u32,
    pub sample_rate: u32,
    /// Device file-type tag, see [`FILE_TYPES`].
    pub file_type: Option<String>,
}

impl Track {
    /// File extension taken from the device-side path. Tracks always have
    /// one in practice; "mp3" is the historical fallback.
    pub fn extension(&self) -> &str {
        match self.device_path.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "mp3",
        }
    }

    /// Rating in stars.
    pub fn rating_stars(&self) -> u32 {
        self.rating / RATING_STEP
    }
}

/// A playlist: named, ordered list of track ids. Exactly one playlist per
/// database is the master playlist holding every track; it doubles as the
/// device name and is hidden from the Playlists view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub master: bool,
    pub members: Vec<TrackId>,
}

impl Playlist {
    pub fn new(name: impl Into<String>, master: bool) -> Self {
        Self {
            name: name.into(),
            master,
            members: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_device_path() {
        let track = Track {
            device_path: "iPod_Control/Music/F03/podfuse000123.m4a".to_string(),
            ..Track::default()
        };
        assert_eq!(track.extension(), "m4a");
    }

    #[test]
    fn test_extension_fallback() {
        let track = Track::default();
        assert_eq!(track.extension(), "mp3");

        let dotless = Track {
            device_path: "iPod_Control/Music/F00/noext".to_string(),
            ..Track::default()
        };
        assert_eq!(dotless.extension(), "mp3");
    }

    #[test]
    fn test_file_type_lookup() {
        assert_eq!(file_type_for_extension("mp3"), Some("mpeg"));
        assert_eq!(file_type_for_extension("MP3"), Some("mpeg"));
        assert_eq!(file_type_for_extension("m4a"), Some("mp4"));
        assert_eq!(file_type_for_extension("ogg"), None);
    }

    #[test]
    fn test_rating_stars() {
        let track = Track {
            rating: 60,
            ..Track::default()
        };
        assert_eq!(track.rating_stars(), 3);
    }
}
