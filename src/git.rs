//! Thin wrapper around the local `git` binary.
//!
//! - [`branches`] - local branch metadata and merged-branch selection
//! - [`commits`] - commit ranges, merge expansion and commit metadata
//! - [`remote`] - cloning, remote setup and pull request checkout

pub mod branches;
pub mod commits;
pub mod remote;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::{Result, UpsintError};

pub use branches::{
    list_local_branches, remove_branch, select_removable_branches, BranchRecord,
};
pub use commits::{
    get_commit_metadata, get_commits_in_a_merge, get_commits_in_range, CommitId, CommitMetadata,
};
pub use remote::{
    checkout_pr, clone_into, fetch_all, set_origin_remote, set_upstream_remote, ReviewRefs,
};

/// Remote tried when the requested one is not configured.
pub const FALLBACK_REMOTE: &str = "origin";

/// A git working directory. Every command runs with `root` as its cwd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    root: PathBuf,
}

impl Repo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn output(&self, args: &[&str]) -> std::io::Result<Output> {
        log::debug!("$ git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
    }

    /// Run git and return stdout, or the failure message.
    ///
    /// The error side is a plain string so each caller can wrap it in the
    /// error kind that fits the query (range, repository, deletion).
    pub(crate) fn capture(&self, args: &[&str]) -> std::result::Result<String, String> {
        let output = self
            .output(args)
            .map_err(|e| format!("failed to execute git {}: {}", args.join(" "), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(format!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                detail
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run git, mapping failures to [`UpsintError::Git`].
    pub(crate) fn run_checked(&self, args: &[&str]) -> Result<String> {
        self.capture(args).map_err(UpsintError::Git)
    }

    /// Check if the directory is inside a git repository
    pub fn is_git_repo(&self) -> bool {
        self.output(&["rev-parse", "--git-dir"])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Get the current branch name
    pub fn current_branch(&self) -> Result<String> {
        Ok(self
            .run_checked(&["rev-parse", "--abbrev-ref", "HEAD"])?
            .trim()
            .to_string())
    }

    /// Get the URL of `remote`, falling back to `origin` when it is not configured.
    pub fn remote_url(&self, remote: &str) -> Result<String> {
        match self.capture(&["remote", "get-url", remote]) {
            Ok(url) => Ok(url.trim().to_string()),
            Err(e) if remote != FALLBACK_REMOTE => {
                log::warn!(
                    "remote '{}' is not usable ({}), falling back to {}",
                    remote,
                    e,
                    FALLBACK_REMOTE
                );
                Ok(self
                    .run_checked(&["remote", "get-url", FALLBACK_REMOTE])?
                    .trim()
                    .to_string())
            }
            Err(e) => Err(UpsintError::Git(e)),
        }
    }

    /// Push `branch` to `remote` and set it as the upstream.
    pub fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_checked(&["push", "--quiet", "--set-upstream", remote, branch])?;
        Ok(())
    }

    /// Full messages of commits in `base..HEAD`, separated by blank lines.
    pub fn commit_messages_since(&self, base: &str) -> Result<String> {
        let range = format!("{}..HEAD", base);
        Ok(self
            .run_checked(&["log", "--pretty=format:%B%n%n", &range, "--"])?
            .trim()
            .to_string())
    }
}
