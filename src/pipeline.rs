//! Batch orchestration: drives every file through the resolution pipeline,
//! strictly one at a time.
//!
//! Per file: idempotency gate, catalog query, validation, exact match,
//! interactive fallback, commit. A per-file failure is logged and contained;
//! only a filename-convention violation aborts the run, and it does so
//! before a single network call is made.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use reqwest::Client;

use crate::filename::{self, FilenameError, Identity};
use crate::itunes::{self, Candidate, CatalogError, SearchResponse};
use crate::matching;
use crate::prompt;
use crate::tags::{self, TagError, TagSet};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The file set does not follow the naming convention. Fatal.
    #[error(transparent)]
    Filename(#[from] FilenameError),
    /// The root directory could not be listed. Fatal.
    #[error("failed to list {0}: {1}")]
    ListDir(PathBuf, std::io::Error),
}

/// How a single file left the pipeline. Every variant is a terminal state;
/// only `Failed` keeps the file out of the processed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Tags were written from a resolved candidate.
    Tagged,
    /// File already carried a title and artist; skipped before any query.
    AlreadyTagged,
    /// No exact match and no valid human selection; file left unmodified.
    NoSelection,
    /// Transport, validation, or tag I/O failure; logged and contained.
    Failed,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
}

/// List `.mp3` files under `root` in directory-listing order. No sorting
/// is imposed.
pub fn scan_root(root: &Path) -> Result<Vec<PathBuf>, RunError> {
    let list_err = |e| RunError::ListDir(root.to_path_buf(), e);

    let mut files = Vec::new();
    for entry in fs::read_dir(root).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();
        let is_mp3 = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".mp3"));
        if is_mp3 && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Parse every filename up front. The file set is assumed to follow one
/// naming convention uniformly, so any violation aborts before any query.
fn extract_identities(files: &[PathBuf]) -> Result<Vec<Identity>, FilenameError> {
    files
        .iter()
        .map(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            filename::parse_identity(name)
        })
        .collect()
}

/// Pick a candidate from a validated response: the first exact match, or
/// whatever `choose` returns for the ambiguous case.
///
/// The returned candidate has passed the usability check; `None` means no
/// candidate was chosen and nothing gets written.
fn select_candidate<'a>(
    response: &'a SearchResponse,
    identity: &Identity,
    choose: impl FnOnce(&[Candidate]) -> Option<usize>,
) -> Option<&'a Candidate> {
    let index = match matching::find_exact_match(&response.results, identity) {
        Some(index) => index,
        None => choose(&response.results)?,
    };
    let candidate = response.results.get(index)?;
    itunes::candidate_is_usable(candidate).then_some(candidate)
}

/// Per-file pipeline with the suspending collaborators injected: the tag
/// read, the catalog search, and the interactive choice. [`process_file`]
/// wires in the real ones; tests substitute canned ones to pin down the
/// short-circuit and no-write paths.
async fn resolve_file<SFut>(
    client: &Client,
    path: &Path,
    identity: &Identity,
    read_tags: impl FnOnce(&Path) -> Result<TagSet, TagError>,
    search: impl FnOnce() -> SFut,
    choose: impl FnOnce(&[Candidate]) -> Option<usize>,
) -> FileOutcome
where
    SFut: Future<Output = Result<SearchResponse, CatalogError>>,
{
    // Idempotency gate: a file bearing both title and artist is done, no
    // network call, no write.
    match read_tags(path) {
        Ok(existing) if existing.is_tagged() => {
            println!("  already tagged, skipping");
            return FileOutcome::AlreadyTagged;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("{}: {e}", path.display());
            return FileOutcome::Failed;
        }
    }

    let response = match search().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("{}: {e}", path.display());
            return FileOutcome::Failed;
        }
    };

    let Some(candidate) = select_candidate(&response, identity, choose) else {
        println!("  no candidate chosen, leaving file untouched");
        return FileOutcome::NoSelection;
    };

    let set = TagSet::from_candidate(candidate);

    // A failed artwork download degrades to a text-only write.
    let artwork = match candidate.artwork_url.as_deref() {
        Some(url) => match itunes::fetch_artwork(client, url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("artwork fetch failed for {}: {e}", path.display());
                None
            }
        },
        None => None,
    };

    match tags::write_tag_set(path, &set, artwork) {
        Ok(()) => {
            println!(
                "  tagged as \"{}\" by \"{}\"",
                set.title.as_deref().unwrap_or(""),
                set.artist.as_deref().unwrap_or(""),
            );
            FileOutcome::Tagged
        }
        Err(e) => {
            tracing::warn!("{}: {e}", path.display());
            FileOutcome::Failed
        }
    }
}

async fn process_file(client: &Client, path: &Path, identity: &Identity) -> FileOutcome {
    resolve_file(
        client,
        path,
        identity,
        tags::read_tag_set,
        || itunes::search(client, identity),
        |results| {
            if results.is_empty() {
                println!(
                    "  no catalog results for \"{} - {}\"",
                    identity.title, identity.artist
                );
                return None;
            }
            match prompt::choose_from(results) {
                Ok(choice) => choice,
                Err(e) => {
                    tracing::warn!("prompt failed: {e}");
                    None
                }
            }
        },
    )
    .await
}

/// Run the whole batch. Files are resolved in directory-listing order, one
/// in flight at a time; the interactive prompt blocks the loop by design.
pub async fn run(root: &Path) -> Result<RunSummary, RunError> {
    let files = scan_root(root)?;

    if files.is_empty() {
        println!("No files found!");
        return Ok(RunSummary::default());
    }

    let identities = extract_identities(&files)?;

    let client = Client::new();
    let mut summary = RunSummary {
        total: files.len(),
        processed: 0,
    };

    for (count, (path, identity)) in files.iter().zip(&identities).enumerate() {
        println!("Processing {} - {} {count}...", identity.title, identity.artist);
        if process_file(&client, path, identity).await != FileOutcome::Failed {
            summary.processed += 1;
        }
    }

    Ok(summary)
}
