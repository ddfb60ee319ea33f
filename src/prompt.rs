//! Interactive disambiguation.
//!
//! When no candidate matches exactly, a bounded shortlist is shown and the
//! pipeline blocks on one line of stdin. This is the only point where the
//! batch waits on a human; no other file is processed while a prompt is
//! outstanding.

use std::io::{self, BufRead, Write};

use crate::itunes::Candidate;

/// Maximum number of candidates shown in the shortlist.
pub const SHORTLIST_LIMIT: usize = 5;

/// Render the shortlist: index, track name, artist name, one per line.
/// Indices address the original (unsliced) result sequence.
pub fn render_shortlist(results: &[Candidate]) -> String {
    results
        .iter()
        .take(SHORTLIST_LIMIT)
        .enumerate()
        .map(|(index, candidate)| {
            format!(
                "  {index}. {} - {}",
                candidate.track_name.as_deref().unwrap_or("<unknown>"),
                candidate.artist_name.as_deref().unwrap_or("<unknown>"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a line of input into a shortlist index.
///
/// Valid iff the trimmed input parses as an integer in
/// `[0, min(SHORTLIST_LIMIT, available))`. Anything else means no candidate
/// was chosen and the file must not be tagged.
pub fn parse_choice(input: &str, available: usize) -> Option<usize> {
    let index: usize = input.trim().parse().ok()?;
    (index < SHORTLIST_LIMIT.min(available)).then_some(index)
}

/// Show the shortlist and block for a choice on stdin.
pub fn choose_from(results: &[Candidate]) -> io::Result<Option<usize>> {
    println!("No exact match. Candidates:");
    println!("{}", render_shortlist(results));
    print!("Enter an index to tag with (anything else skips): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(parse_choice(&line, results.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(track: &str, artist: &str) -> Candidate {
        Candidate {
            track_name: Some(track.to_string()),
            artist_name: Some(artist.to_string()),
            collection_name: None,
            artwork_url: None,
            release_date: None,
            track_number: None,
            primary_genre_name: None,
        }
    }

    #[test]
    fn accepts_an_in_range_index() {
        assert_eq!(parse_choice("2", 3), Some(2));
        assert_eq!(parse_choice(" 0 \n", 1), Some(0));
    }

    #[test]
    fn rejects_out_of_range_indices() {
        assert_eq!(parse_choice("3", 3), None);
        assert_eq!(parse_choice("7", 3), None);
    }

    #[test]
    fn shortlist_limit_caps_the_valid_range() {
        // 10 results available, but only the first 5 are shown.
        assert_eq!(parse_choice("4", 10), Some(4));
        assert_eq!(parse_choice("5", 10), None);
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_eq!(parse_choice("", 3), None);
        assert_eq!(parse_choice("two", 3), None);
        assert_eq!(parse_choice("-1", 3), None);
        assert_eq!(parse_choice("1.5", 3), None);
    }

    #[test]
    fn shortlist_shows_at_most_five_entries() {
        let results: Vec<Candidate> = (0..8)
            .map(|i| candidate(&format!("Track {i}"), "Artist"))
            .collect();
        let rendered = render_shortlist(&results);
        assert_eq!(rendered.lines().count(), 5);
        assert!(rendered.contains("0. Track 0"));
        assert!(rendered.contains("4. Track 4"));
        assert!(!rendered.contains("Track 5"));
    }

    #[test]
    fn shortlist_marks_missing_names() {
        let mut broken = candidate("", "");
        broken.track_name = None;
        broken.artist_name = None;
        let rendered = render_shortlist(&[broken]);
        assert_eq!(rendered, "  0. <unknown> - <unknown>");
    }
}
