//! Local branch metadata and merged-branch selection.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};

use super::Repo;
use crate::error::{Result, UpsintError};

/// Fields requested from `git for-each-ref`, NUL separated because branch
/// names may contain any printable separator.
///
/// `lstrip=2` rather than `short`: the latter turns into `heads/<name>` when a
/// tag of the same name exists.
const BRANCH_FORMAT: &str =
    "%(refname:lstrip=2)%00%(upstream:short)%00%(authordate:iso-strict)%00%(upstream:track)";
const BRANCH_NAME_FORMAT: &str = "--format=%(refname:lstrip=2)";
const BRANCH_FIELDS: usize = 4;

/// One local branch with its tracking and merge metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRecord {
    /// Short branch name
    pub name: String,
    /// Short name of the upstream ref, empty if untracked
    pub remote_tracking: String,
    /// Author date of the branch tip
    pub last_commit_date: DateTime<FixedOffset>,
    /// Ahead/behind summary such as `[ahead 1, behind 2]`, empty if none
    pub tracking_status: String,
    /// The tip is an ancestor of (or equal to) the reference branch
    pub merged: bool,
}

/// List local branches, newest tip first, with `merged` computed against
/// `reference_branch`.
///
/// Both underlying queries must succeed and every line must parse; otherwise
/// the whole listing fails with [`UpsintError::RepositoryQuery`].
pub fn list_local_branches(repo: &Repo, reference_branch: &str) -> Result<Vec<BranchRecord>> {
    let format = format!("--format={}", BRANCH_FORMAT);
    let refs = repo
        .capture(&["for-each-ref", &format, "refs/heads/"])
        .map_err(UpsintError::RepositoryQuery)?;

    let merged = repo
        .capture(&["branch", "--merged", reference_branch, BRANCH_NAME_FORMAT])
        .map_err(UpsintError::RepositoryQuery)?;
    let merged: HashSet<&str> = merged
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut records = parse_branch_refs(&refs, &merged)?;
    // stable: equal dates keep the for-each-ref order
    records.sort_by(|a, b| b.last_commit_date.cmp(&a.last_commit_date));
    Ok(records)
}

/// Parse `for-each-ref` output produced with [`BRANCH_FORMAT`].
fn parse_branch_refs(output: &str, merged: &HashSet<&str>) -> Result<Vec<BranchRecord>> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| parse_branch_line(line, merged))
        .collect()
}

fn parse_branch_line(line: &str, merged: &HashSet<&str>) -> Result<BranchRecord> {
    let fields: Vec<&str> = line.split('\0').collect();
    if fields.len() != BRANCH_FIELDS || fields[0].is_empty() {
        return Err(UpsintError::RepositoryQuery(format!(
            "unexpected branch listing line: {:?}",
            line
        )));
    }

    let last_commit_date = parse_author_date(fields[2]).map_err(|e| {
        UpsintError::RepositoryQuery(format!(
            "invalid author date '{}' on branch '{}': {}",
            fields[2], fields[0], e
        ))
    })?;

    Ok(BranchRecord {
        name: fields[0].to_string(),
        remote_tracking: fields[1].to_string(),
        last_commit_date,
        tracking_status: fields[3].to_string(),
        merged: merged.contains(fields[0]),
    })
}

/// Parse a strict ISO-8601 author date, keeping its offset.
///
/// Accepts both `Z` and `±HH:MM` suffixes, so UTC and non-UTC dates compare
/// as the instants they denote.
pub fn parse_author_date(
    value: &str,
) -> std::result::Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim())
}

/// Names of merged branches that are safe to delete.
///
/// Never yields `reference_branch` itself, nor a branch whose name equals
/// its own upstream (a local mirror of a remote branch).
pub fn select_removable_branches(
    records: &[BranchRecord],
    reference_branch: &str,
) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.merged)
        .filter(|r| r.name != reference_branch && r.name != r.remote_tracking)
        .map(|r| r.name.clone())
        .collect()
}

/// Delete a local branch. Never forces: unmerged or checked-out branches are refused.
pub fn remove_branch(repo: &Repo, name: &str) -> Result<()> {
    repo.capture(&["branch", "--delete", name])
        .map_err(|message| UpsintError::BranchDeletion {
            branch: name.to_string(),
            message,
        })?;
    log::info!("deleted branch {}", name);
    Ok(())
}
