//! `%`-placeholder path templates.
//!
//! A template like `/Artists/%a/%A/%T - %t.%e` is parsed once at startup
//! and expanded per track into the path segments that place the track in
//! the namespace. Every expanded field is sanitized so it cannot escape
//! its segment.

use common::Track;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown placeholder %{0} in template {1:?}")]
    UnknownPlaceholder(char, String),

    #[error("template {0:?} has no path segments")]
    Empty(String),

    #[error("template {0:?} ends with a bare %")]
    TrailingPercent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field(FieldKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKey {
    /// `%a`
    Artist,
    /// `%c`: artist, or the literal `Compilations` for compilation tracks.
    ArtistOrCompilation,
    /// `%A`
    Album,
    /// `%t`: title, prefixed with the artist for compilation tracks.
    Title,
    /// `%g`
    Genre,
    /// `%T`: track number, zero-padded to two digits.
    TrackNumber,
    /// `%y`
    Year,
    /// `%r`: rating in stars (0-5).
    Rating,
    /// `%e`: filename extension.
    Extension,
}

impl FieldKey {
    fn parse(c: char) -> Option<Self> {
        Some(match c {
            'a' => FieldKey::Artist,
            'c' => FieldKey::ArtistOrCompilation,
            'A' => FieldKey::Album,
            't' => FieldKey::Title,
            'g' => FieldKey::Genre,
            'T' => FieldKey::TrackNumber,
            'y' => FieldKey::Year,
            'r' => FieldKey::Rating,
            'e' => FieldKey::Extension,
            _ => return None,
        })
    }

    fn expand(self, track: &Track) -> String {
        match self {
            FieldKey::Artist => text(track.artist.as_deref()),
            FieldKey::ArtistOrCompilation => {
                if track.compilation {
                    "Compilations".to_owned()
                } else {
                    text(track.artist.as_deref())
                }
            }
            FieldKey::Album => text(track.album.as_deref()),
            FieldKey::Title => {
                if track.compilation {
                    format!(
                        "{} - {}",
                        text(track.artist.as_deref()),
                        text(track.title.as_deref())
                    )
                } else {
                    text(track.title.as_deref())
                }
            }
            FieldKey::Genre => text(track.genre.as_deref()),
            FieldKey::TrackNumber => format!("{:02}", track.track_number),
            FieldKey::Year => track.year.to_string(),
            FieldKey::Rating => track.rating_stars().to_string(),
            FieldKey::Extension => track.extension().to_owned(),
        }
    }
}

fn text(value: Option<&str>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.to_owned(),
        _ => "Unknown".to_owned(),
    }
}

/// Replaces characters that would break a path segment and falls back to
/// `Unknown` when nothing printable remains.
pub fn sanitize(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '~' { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "Unknown".to_owned()
    } else {
        cleaned
    }
}

#[derive(Debug, Clone)]
struct Segment {
    pieces: Vec<Piece>,
}

impl Segment {
    fn expand(&self, track: &Track) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Field(key) => out.push_str(&key.expand(track)),
            }
        }
        sanitize(&out)
    }
}

/// A parsed view template. Expansion yields one string per path segment;
/// the final segment names the projected file.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        for raw in source.split('/').filter(|s| !s.is_empty()) {
            segments.push(parse_segment(raw, source)?);
        }
        if segments.is_empty() {
            return Err(TemplateError::Empty(source.to_owned()));
        }
        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The fixed first segment, if the template starts with a literal
    /// (e.g. `Artists` in `/Artists/%a/...`). View roots come from here.
    pub fn fixed_root(&self) -> Option<&str> {
        match self.segments.first()?.pieces.as_slice() {
            [Piece::Literal(name)] => Some(name),
            _ => None,
        }
    }

    /// Expands the template for one track into sanitized path segments.
    pub fn expand(&self, track: &Track) -> Vec<String> {
        self.segments.iter().map(|s| s.expand(track)).collect()
    }
}

fn parse_segment(raw: &str, source: &str) -> Result<Segment, TemplateError> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        let Some(key) = chars.next() else {
            return Err(TemplateError::TrailingPercent(source.to_owned()));
        };
        if key == '%' {
            literal.push('%');
            continue;
        }
        let field = FieldKey::parse(key)
            .ok_or_else(|| TemplateError::UnknownPlaceholder(key, source.to_owned()))?;
        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        pieces.push(Piece::Field(field));
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(Segment { pieces })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            title: Some("Breaking Glass".to_owned()),
            artist: Some("Bowie".to_owned()),
            album: Some("Low".to_owned()),
            genre: Some("Rock".to_owned()),
            track_number: 3,
            year: 1977,
            rating: 80,
            file_type: Some("mp3".to_owned()),
            ..Track::default()
        }
    }

    #[test]
    fn test_expand_artist_view() {
        let tpl = PathTemplate::parse("/Artists/%a/%A/%T - %t.%e").unwrap();
        assert_eq!(
            tpl.expand(&track()),
            vec!["Artists", "Bowie", "Low", "03 - Breaking Glass.mp3"]
        );
        assert_eq!(tpl.fixed_root(), Some("Artists"));
    }

    #[test]
    fn test_missing_fields_become_unknown() {
        let tpl = PathTemplate::parse("/Genre/%g/%a - %t.%e").unwrap();
        let t = Track::default();
        assert_eq!(
            tpl.expand(&t),
            vec!["Genre", "Unknown", "Unknown - Unknown.mp3"]
        );
    }

    #[test]
    fn test_compilation_fields() {
        let tpl = PathTemplate::parse("/%c/%t.%e").unwrap();
        let mut t = track();
        t.compilation = true;
        assert_eq!(
            tpl.expand(&t),
            vec!["Compilations", "Bowie - Breaking Glass.mp3"]
        );
    }

    #[test]
    fn test_sanitize_slashes_and_tildes() {
        let tpl = PathTemplate::parse("/All/%a - %t.%e").unwrap();
        let mut t = track();
        t.artist = Some("AC/DC".to_owned());
        t.title = Some("T.N.T~".to_owned());
        assert_eq!(tpl.expand(&t), vec!["All", "AC_DC - T.N.T_.mp3"]);
    }

    #[test]
    fn test_sanitize_whitespace_only_is_unknown() {
        assert_eq!(sanitize("   "), "Unknown");
        assert_eq!(sanitize(" a "), "a");
    }

    #[test]
    fn test_parse_rejects_unknown_placeholder() {
        assert!(matches!(
            PathTemplate::parse("/x/%q"),
            Err(TemplateError::UnknownPlaceholder('q', _))
        ));
        assert!(matches!(
            PathTemplate::parse("/x/abc%"),
            Err(TemplateError::TrailingPercent(_))
        ));
        assert!(matches!(PathTemplate::parse("//"), Err(TemplateError::Empty(_))));
    }

    #[test]
    fn test_escaped_percent_is_literal() {
        let tpl = PathTemplate::parse("/All/100%% - %t.%e").unwrap();
        assert_eq!(tpl.expand(&track()), vec!["All", "100% - Breaking Glass.mp3"]);
    }

    #[test]
    fn test_rating_in_stars() {
        let tpl = PathTemplate::parse("/Rated/%r/%t.%e").unwrap();
        let segs = tpl.expand(&track());
        assert_eq!(segs[1], "4");
    }
}
