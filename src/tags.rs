//! Tag container access via `lofty`.
//!
//! The pipeline does one full read before any network work (the idempotency
//! gate) and at most one full overwrite-write on the success path. There is
//! no incremental field patching at the container level.

use std::path::Path;

use lofty::config::{ParseOptions, ParsingMode, WriteOptions};
use lofty::picture::{Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};

use crate::itunes::Candidate;

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// lofty open/read/write failures.
    #[error("{0}")]
    Io(String),
    /// File doesn't support the tag type.
    #[error("{0}")]
    Unsupported(String),
}

/// The editable tag fields of one file. `None` means the field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<String>,
}

impl TagSet {
    /// A file bearing both a title and an artist is considered already
    /// tagged and skipped before any network call.
    pub fn is_tagged(&self) -> bool {
        let has = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
        has(&self.title) && has(&self.artist)
    }

    /// Map a chosen candidate onto tag fields. Absent candidate fields map
    /// to absent tags: the committer replaces wholesale, it never merges
    /// with prior values.
    pub fn from_candidate(candidate: &Candidate) -> Self {
        TagSet {
            title: candidate.track_name.clone(),
            artist: candidate.artist_name.clone(),
            album: candidate.collection_name.clone(),
            year: candidate
                .release_date
                .as_deref()
                .and_then(year_from_release_date),
            genre: candidate.primary_genre_name.clone(),
            track_number: candidate.track_number.map(|n| n.to_string()),
        }
    }
}

/// Extract a 4-digit year from a release date like `1965-08-06T07:00:00Z`:
/// the first 4 characters of the segment before the first `-`.
fn year_from_release_date(date: &str) -> Option<String> {
    let year: String = date
        .split('-')
        .next()
        .unwrap_or("")
        .chars()
        .take(4)
        .collect();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}

/// Build `ParseOptions` with sensible defaults.
fn parse_options(read_cover_art: bool) -> ParseOptions {
    ParseOptions::new()
        .read_cover_art(read_cover_art)
        .parsing_mode(ParsingMode::BestAttempt)
}

/// Read the tag fields of `path`. A file with no tag container at all reads
/// as an empty [`TagSet`], not an error.
pub fn read_tag_set(path: &Path) -> Result<TagSet, TagError> {
    let tagged_file = Probe::open(path)
        .map_err(|e| TagError::Io(format!("Failed to open: {e}")))?
        .options(parse_options(false))
        .read()
        .map_err(|e| TagError::Io(format!("Failed to read: {e}")))?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok(TagSet::default());
    };

    let get = |key: ItemKey| tag.get_string(key).map(|s| s.to_string());
    Ok(TagSet {
        title: get(ItemKey::TrackTitle),
        artist: get(ItemKey::TrackArtist),
        album: get(ItemKey::AlbumTitle),
        // Year lives under two keys depending on format.
        year: get(ItemKey::RecordingDate).or_else(|| get(ItemKey::Year)),
        genre: get(ItemKey::Genre),
        track_number: get(ItemKey::TrackNumber),
    })
}

/// Overwrite the file's tags with `set`, embedding `artwork` as the front
/// cover when provided.
///
/// Every field is applied unconditionally: `Some` overwrites, `None` removes
/// any prior value. The idempotency gate already confirmed the file lacked
/// complete tags, so there is nothing worth merging with.
pub fn write_tag_set(path: &Path, set: &TagSet, artwork: Option<Vec<u8>>) -> Result<(), TagError> {
    // Must read cover art so unrelated pictures survive the round-trip.
    let mut tagged_file = Probe::open(path)
        .map_err(|e| TagError::Io(format!("Failed to open: {e}")))?
        .options(parse_options(true))
        .read()
        .map_err(|e| TagError::Io(format!("Failed to read: {e}")))?;

    let primary_type = tagged_file.file_type().primary_tag_type();
    let tag = match tagged_file.tag_mut(primary_type) {
        Some(t) => t,
        None => {
            tagged_file.insert_tag(Tag::new(primary_type));
            tagged_file.tag_mut(primary_type).ok_or_else(|| {
                TagError::Unsupported(format!("File does not support {primary_type:?} tags"))
            })?
        }
    };

    set_or_remove(tag, ItemKey::TrackTitle, set.title.as_deref());
    set_or_remove(tag, ItemKey::TrackArtist, set.artist.as_deref());
    set_or_remove(tag, ItemKey::AlbumTitle, set.album.as_deref());
    // Keep both year keys in sync for format compatibility.
    set_or_remove(tag, ItemKey::RecordingDate, set.year.as_deref());
    set_or_remove(tag, ItemKey::Year, set.year.as_deref());
    set_or_remove(tag, ItemKey::Genre, set.genre.as_deref());
    set_or_remove(tag, ItemKey::TrackNumber, set.track_number.as_deref());

    if let Some(picture) = artwork.and_then(build_cover_picture) {
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(picture);
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| TagError::Io(format!("Failed to write tag: {e}")))
}

/// Build a front-cover picture from downloaded bytes, detecting the MIME
/// type from the data. Bytes that don't parse as an image are not embedded.
fn build_cover_picture(data: Vec<u8>) -> Option<Picture> {
    let mut cursor = std::io::Cursor::new(&data);
    let detected = match Picture::from_reader(&mut cursor) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("skipping artwork that does not parse as an image: {e}");
            return None;
        }
    };

    let mut builder = Picture::unchecked(data).pic_type(PictureType::CoverFront);
    if let Some(mime) = detected.mime_type() {
        builder = builder.mime_type(mime.clone());
    }
    Some(builder.build())
}

/// Apply one field: `Some` overwrites, `None` or empty removes.
fn set_or_remove(tag: &mut Tag, key: ItemKey, value: Option<&str>) {
    match value {
        Some(v) if !v.is_empty() => {
            tag.insert_text(key, v.to_string());
        }
        _ => {
            tag.remove_key(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::tag::TagType;
    use std::io::Write as _;

    fn candidate() -> Candidate {
        Candidate {
            track_name: Some("Yesterday".to_string()),
            artist_name: Some("The Beatles".to_string()),
            collection_name: Some("Help!".to_string()),
            artwork_url: Some("https://example.com/art.jpg".to_string()),
            release_date: Some("1965-08-06T07:00:00Z".to_string()),
            track_number: Some(13),
            primary_genre_name: Some("Rock".to_string()),
        }
    }

    #[test]
    fn is_tagged_requires_title_and_artist() {
        let mut set = TagSet {
            title: Some("Yesterday".to_string()),
            artist: Some("The Beatles".to_string()),
            ..TagSet::default()
        };
        assert!(set.is_tagged());

        set.artist = Some("   ".to_string());
        assert!(!set.is_tagged());

        set.artist = None;
        assert!(!set.is_tagged());
        assert!(!TagSet::default().is_tagged());
    }

    #[test]
    fn candidate_maps_onto_all_fields() {
        let set = TagSet::from_candidate(&candidate());
        assert_eq!(set.title.as_deref(), Some("Yesterday"));
        assert_eq!(set.artist.as_deref(), Some("The Beatles"));
        assert_eq!(set.album.as_deref(), Some("Help!"));
        assert_eq!(set.year.as_deref(), Some("1965"));
        assert_eq!(set.genre.as_deref(), Some("Rock"));
        assert_eq!(set.track_number.as_deref(), Some("13"));
    }

    #[test]
    fn sparse_candidate_maps_to_absent_fields() {
        let mut sparse = candidate();
        sparse.collection_name = None;
        sparse.release_date = None;
        sparse.track_number = None;
        sparse.primary_genre_name = None;

        let set = TagSet::from_candidate(&sparse);
        assert_eq!(set.album, None);
        assert_eq!(set.year, None);
        assert_eq!(set.genre, None);
        assert_eq!(set.track_number, None);
    }

    #[test]
    fn year_extraction_takes_segment_before_first_dash() {
        assert_eq!(
            year_from_release_date("1965-08-06T07:00:00Z").as_deref(),
            Some("1965")
        );
        assert_eq!(year_from_release_date("1965").as_deref(), Some("1965"));
        assert_eq!(year_from_release_date(""), None);
        assert_eq!(year_from_release_date("196"), None);
        assert_eq!(year_from_release_date("soon-ish"), None);
    }

    #[test]
    fn set_or_remove_replaces_wholesale() {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.insert_text(ItemKey::Genre, "Polka".to_string());
        tag.insert_text(ItemKey::TrackTitle, "Old Title".to_string());

        set_or_remove(&mut tag, ItemKey::TrackTitle, Some("Yesterday"));
        set_or_remove(&mut tag, ItemKey::Genre, None);

        assert_eq!(tag.get_string(ItemKey::TrackTitle), Some("Yesterday"));
        assert_eq!(tag.get_string(ItemKey::Genre), None);
    }

    #[test]
    fn cover_picture_detects_mime_from_the_data() {
        use lofty::picture::MimeType;

        // PNG signature followed by filler; detection only needs the magic.
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend_from_slice(&[0u8; 16]);

        let picture = build_cover_picture(data).unwrap();
        assert_eq!(picture.pic_type(), PictureType::CoverFront);
        assert_eq!(picture.mime_type(), Some(&MimeType::Png));
    }

    #[test]
    fn junk_artwork_is_not_embedded() {
        assert!(build_cover_picture(b"not an image".to_vec()).is_none());
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.mp3");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"this is not an mp3").unwrap();

        assert!(matches!(read_tag_set(&path), Err(TagError::Io(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            read_tag_set(Path::new("/nonexistent/file.mp3")),
            Err(TagError::Io(_))
        ));
    }
}
