//! Commit ranges, merge expansion and commit metadata.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::Repo;
use crate::error::{Result, UpsintError};

/// Full hash of a single commit.
///
/// Only valid for the repository state it was read from: do not keep these
/// across checkouts, resets or rebases.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Subject and cleaned-up body of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    /// First line of the commit message
    pub message: String,
    /// Rest of the message without the `Reviewed-by:` trailer block
    pub body: String,
}

/// First-parent history in `lower_bound..upper_bound`, newest first.
///
/// Side-branch commits brought in by merges are not listed; expand them with
/// [`get_commits_in_a_merge`].
pub fn get_commits_in_range(
    repo: &Repo,
    lower_bound: &str,
    upper_bound: &str,
) -> Result<Vec<CommitId>> {
    let range = format!("{}..{}", lower_bound, upper_bound);
    let output = repo
        .capture(&["log", "--pretty=format:%H", "--first-parent", &range, "--"])
        .map_err(UpsintError::RangeQuery)?;
    Ok(parse_commit_ids(&output))
}

/// Commits brought in by `merge_commit`, newest first, without the merge itself.
///
/// This is the history of `merge^..merge` with its first entry (the merge)
/// dropped. Fails for unknown ids and for root commits, which have no parent.
pub fn get_commits_in_a_merge(repo: &Repo, merge_commit: &str) -> Result<Vec<CommitId>> {
    let range = format!("{0}^..{0}", merge_commit);
    let output = repo
        .capture(&["log", "--pretty=format:%H", &range, "--"])
        .map_err(UpsintError::RangeQuery)?;
    Ok(parse_commit_ids(&output).into_iter().skip(1).collect())
}

/// Subject and body of `commit`, with the review trailer removed from the body.
pub fn get_commit_metadata(repo: &Repo, commit: &str) -> Result<CommitMetadata> {
    let message = repo
        .capture(&["show", "--quiet", "--format=%s", commit, "--"])
        .map_err(UpsintError::RangeQuery)?;
    let body = repo
        .capture(&["show", "--quiet", "--format=%b", commit, "--"])
        .map_err(UpsintError::RangeQuery)?;

    Ok(CommitMetadata {
        message: message.trim().to_string(),
        body: strip_review_trailers(&body),
    })
}

fn parse_commit_ids(output: &str) -> Vec<CommitId> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| CommitId(l.to_string()))
        .collect()
}

fn review_trailer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // (?s): the match runs from the first trailer to the end of the body
    RE.get_or_init(|| Regex::new(r"(?s)Reviewed-by:.*").expect("valid regex"))
}

/// Drop everything from the first `Reviewed-by:` to the end, then trim.
///
/// Greedy on purpose: text following the trailer block is discarded too.
pub fn strip_review_trailers(body: &str) -> String {
    review_trailer_re().replace(body, "").trim().to_string()
}
