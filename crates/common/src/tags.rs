//! Audio tag extraction.
//!
//! Parsing real tag formats is out of scope; the ingestion pipeline only
//! depends on the [`TagExtractor`] trait so a proper reader can be plugged
//! in. [`BasenameTags`] is the shipped fallback: title from the file stem,
//! everything else empty.

use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("cannot read media file: {0}")]
    Io(#[from] io::Error),

    #[error("no usable tags in {0}")]
    NoTags(String),
}

/// Tags read from a media file during ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub comment: Option<String>,
    pub genre: Option<String>,
    pub year: u32,
    pub track_number: u32,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub duration_ms: u32,
}

pub trait TagExtractor: Send {
    fn extract(&self, path: &Path) -> Result<ExtractedTags, TagError>;
}

/// Fallback extractor: the file must exist and be readable, and its stem
/// becomes the title.
#[derive(Debug, Default)]
pub struct BasenameTags;

impl TagExtractor for BasenameTags {
    fn extract(&self, path: &Path) -> Result<ExtractedTags, TagError> {
        std::fs::metadata(path)?;

        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TagError::NoTags(path.display().to_string()))?;

        Ok(ExtractedTags {
            title: Some(title),
            ..ExtractedTags::default()
        })
    }
}
