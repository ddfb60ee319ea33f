//! Filename convention parsing.
//!
//! Files are expected to be named `"<title> - <artist>.<ext>"`. The pair
//! extracted here is the query key for the catalog lookup. The whole folder
//! is assumed to follow the convention uniformly, so one malformed filename
//! aborts the run before any network work.

#[derive(Debug, thiserror::Error)]
pub enum FilenameError {
    #[error("\"{0}\" does not follow the \"<title> - <artist>.<ext>\" naming convention")]
    Malformed(String),
}

/// The (title, artist) pair derived from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub title: String,
    pub artist: String,
}

/// Parse `"<title> - <artist>.<ext>"` into an [`Identity`].
///
/// Splits on the first `-` between title and artist-plus-extension and trims
/// both segments. Missing separator, missing extension delimiter, or an
/// empty segment after trimming is a [`FilenameError::Malformed`].
pub fn parse_identity(file_name: &str) -> Result<Identity, FilenameError> {
    let malformed = || FilenameError::Malformed(file_name.to_string());

    let (title, rest) = file_name.split_once('-').ok_or_else(malformed)?;
    let (artist, _ext) = rest.rsplit_once('.').ok_or_else(malformed)?;

    let title = title.trim();
    let artist = artist.trim();
    if title.is_empty() || artist.is_empty() {
        return Err(malformed());
    }

    Ok(Identity {
        title: title.to_string(),
        artist: artist.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_and_artist() {
        let id = parse_identity("Yesterday - The Beatles.mp3").unwrap();
        assert_eq!(id.title, "Yesterday");
        assert_eq!(id.artist, "The Beatles");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let id = parse_identity("  Yesterday  -  The Beatles .mp3").unwrap();
        assert_eq!(id.title, "Yesterday");
        assert_eq!(id.artist, "The Beatles");
    }

    #[test]
    fn missing_separator_is_malformed() {
        assert!(parse_identity("Yesterday.mp3").is_err());
    }

    #[test]
    fn missing_extension_is_malformed() {
        assert!(parse_identity("Yesterday - The Beatles").is_err());
    }

    #[test]
    fn empty_title_is_malformed() {
        assert!(parse_identity(" - The Beatles.mp3").is_err());
    }

    #[test]
    fn empty_artist_is_malformed() {
        assert!(parse_identity("Yesterday - .mp3").is_err());
    }

    #[test]
    fn error_carries_the_offending_name() {
        let err = parse_identity("broken.mp3").unwrap_err();
        assert!(err.to_string().contains("broken.mp3"));
    }
}
