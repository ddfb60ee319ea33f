//! Candidate matching: normalization plus exact-match selection.
//!
//! Exact match after normalization tags the common case (typographic
//! variation between filenames and catalog entries) without guessing when
//! the catalog has no unambiguous hit. No fuzzy scoring.

use crate::filename::Identity;
use crate::itunes::{self, Candidate};

/// Punctuation stripped from titles before comparison: periods, commas,
/// parentheses, brackets, straight and curly quotes.
const TITLE_PUNCTUATION: &[char] = &[
    '.', ',', '(', ')', '[', ']', '"', '\'', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
];

/// Normalize a title for matching: strip punctuation, lowercase, trim.
pub fn normalize_title(input: &str) -> String {
    input
        .chars()
        .filter(|c| !TITLE_PUNCTUATION.contains(c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Normalize an artist name for matching: lowercase and trim only, no
/// punctuation stripping.
pub fn normalize_artist(input: &str) -> String {
    input.to_lowercase().trim().to_string()
}

/// Index of the first candidate whose normalized track name and artist name
/// both equal the normalized identity, or `None` when nothing matches.
///
/// Multiple exact matches tie-break to result order, first wins.
pub fn find_exact_match(results: &[Candidate], identity: &Identity) -> Option<usize> {
    let want_title = normalize_title(&identity.title);
    let want_artist = normalize_artist(&identity.artist);

    results.iter().position(|candidate| {
        itunes::candidate_is_usable(candidate)
            && normalize_title(candidate.track_name.as_deref().unwrap_or("")) == want_title
            && normalize_artist(candidate.artist_name.as_deref().unwrap_or("")) == want_artist
    })
}
