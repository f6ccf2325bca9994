//! Extended-attribute projection of track metadata.
//!
//! Every track-backed file exposes a fixed table of `tag.*` attributes.
//! String attributes appear only when the track carries the field;
//! numeric attributes are always present. Values and listed names are
//! NUL-terminated, and reported lengths include the terminator.
//!
//! Both calls follow the two-phase xattr protocol: a zero `size` asks for
//! the required buffer length, a non-zero `size` asks for the bytes and
//! fails with `ERANGE` when they do not fit.

use common::Track;

use crate::error::{FsError, FsResult};

/// Outcome of an xattr call, mirroring the kernel reply split.
#[derive(Debug, PartialEq, Eq)]
pub enum XattrOut {
    /// Required buffer length, for the size-probe phase.
    Size(u32),
    /// The attribute bytes themselves.
    Data(Vec<u8>),
}

enum Value {
    Text(Option<String>),
    Number(u32),
}

fn table(track: &Track) -> Vec<(&'static str, Value)> {
    vec![
        ("tag.title", Value::Text(track.title.clone())),
        ("tag.artist", Value::Text(track.artist.clone())),
        ("tag.album", Value::Text(track.album.clone())),
        ("tag.genre", Value::Text(track.genre.clone())),
        ("tag.comment", Value::Text(track.comment.clone())),
        ("tag.composer", Value::Text(track.composer.clone())),
        ("tag.description", Value::Text(track.description.clone())),
        ("tag.podcasturl", Value::Text(track.podcast_url.clone())),
        ("tag.podcastrss", Value::Text(track.podcast_rss.clone())),
        ("tag.track", Value::Number(track.track_number)),
        ("tag.length", Value::Number(track.duration_ms)),
        ("tag.year", Value::Number(track.year)),
        ("tag.playcount", Value::Number(track.play_count)),
        ("tag.rating", Value::Number(track.rating_stars())),
    ]
}

/// Lists attribute names. Files that do not represent a track have none.
pub fn list(track: Option<&Track>, size: u32) -> FsResult<XattrOut> {
    let Some(track) = track else {
        return Ok(empty(size));
    };

    let mut bytes = Vec::new();
    for (name, value) in table(track) {
        if matches!(value, Value::Text(None)) {
            continue;
        }
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
    }
    finish(bytes, size)
}

/// Reads one attribute. Absent string attributes and unknown names both
/// report `EACCES`, matching what tag tools expect from this namespace.
pub fn get(track: Option<&Track>, name: &str, size: u32) -> FsResult<XattrOut> {
    let Some(track) = track else {
        return Ok(empty(size));
    };

    for (attr, value) in table(track) {
        if attr != name {
            continue;
        }
        let rendered = match value {
            Value::Text(Some(text)) => text,
            Value::Text(None) => return Err(FsError::AccessDenied),
            Value::Number(n) => n.to_string(),
        };
        let mut bytes = rendered.into_bytes();
        bytes.push(0);
        return finish(bytes, size);
    }

    Err(FsError::AccessDenied)
}

fn empty(size: u32) -> XattrOut {
    if size == 0 {
        XattrOut::Size(0)
    } else {
        XattrOut::Data(Vec::new())
    }
}

fn finish(bytes: Vec<u8>, size: u32) -> FsResult<XattrOut> {
    if size == 0 {
        Ok(XattrOut::Size(bytes.len() as u32))
    } else if bytes.len() as u32 > size {
        Err(FsError::Range)
    } else {
        Ok(XattrOut::Data(bytes))
    }
}
