//! Cloning, remote setup and pull request checkout.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use super::Repo;
use crate::error::{Result, UpsintError};

/// How many times a clone is attempted while a fresh fork is still being created.
pub const CLONE_ATTEMPTS: u32 = 20;
const CLONE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Where a hosting service publishes pull request heads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewRefs {
    /// `refs/pull/<id>/head` (GitHub)
    Pull,
    /// `refs/merge-requests/<id>/head` (GitLab)
    MergeRequests,
}

impl ReviewRefs {
    pub fn namespace(&self) -> &'static str {
        match self {
            ReviewRefs::Pull => "pull",
            ReviewRefs::MergeRequests => "merge-requests",
        }
    }

    /// Prefix of the local remote-tracking refs: `pr` or `mr`
    pub fn local_prefix(&self) -> &'static str {
        match self {
            ReviewRefs::Pull => "pr",
            ReviewRefs::MergeRequests => "mr",
        }
    }

    /// Fetch refspec mirroring every review head under `refs/remotes/<remote>/<pr|mr>/`
    pub fn fetch_refspec(&self, remote: &str) -> String {
        format!(
            "+refs/{}/*/head:refs/remotes/{}/{}/*",
            self.namespace(),
            remote,
            self.local_prefix()
        )
    }
}

/// Clone `url` into `parent_dir/dir_name` and return the repository.
///
/// A freshly created fork can take a moment to become clonable, so the clone
/// is retried while the server says the repository "does not exist yet". An
/// existing checkout at the destination is reused.
pub fn clone_into(parent_dir: &Path, url: &str, dir_name: &str) -> Result<Repo> {
    std::fs::create_dir_all(parent_dir)?;
    let destination: PathBuf = parent_dir.join(dir_name);

    if destination.join(".git").exists() {
        log::info!("{} is already cloned, reusing it", destination.display());
        return Ok(Repo::new(destination));
    }

    for attempt in 1..=CLONE_ATTEMPTS {
        log::debug!("$ git clone {} {} (attempt {})", url, dir_name, attempt);
        let output = Command::new("git")
            .args(["clone", url, dir_name])
            .current_dir(parent_dir)
            .output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::debug!("clone exited with {} and output: {}", output.status, stderr.trim());

        if output.status.success() {
            return Ok(Repo::new(destination));
        }
        if !stderr.contains("does not exist yet") {
            return Err(UpsintError::Git(format!(
                "failed to clone {}: {}",
                url,
                stderr.trim()
            )));
        }
        thread::sleep(CLONE_RETRY_DELAY);
    }

    Err(UpsintError::Git(format!(
        "failed to clone {}: repository still missing after {} attempts",
        url, CLONE_ATTEMPTS
    )))
}

/// Add `name` pointing at `url`, or re-point it if it already exists.
fn add_or_set_remote(repo: &Repo, name: &str, url: &str) -> Result<()> {
    if repo.capture(&["remote", "add", name, url]).is_err() {
        repo.run_checked(&["remote", "set-url", name, url])?;
    }
    Ok(())
}

/// Add `refspec` to the remote's fetch list unless it is already there.
fn add_fetch_refspec(repo: &Repo, remote: &str, refspec: &str) -> Result<()> {
    let key = format!("remote.{}.fetch", remote);
    let existing = repo.capture(&["config", "--local", "--get-all", &key]).unwrap_or_default();
    if existing.lines().any(|l| l.trim() == refspec) {
        return Ok(());
    }
    repo.run_checked(&["config", "--local", "--add", &key, refspec])?;
    Ok(())
}

/// Point `upstream` (read) and `upstream-w` (write) at the parent project and
/// fetch its review heads too.
pub fn set_upstream_remote(
    repo: &Repo,
    clone_url: &str,
    ssh_url: &str,
    review_refs: ReviewRefs,
) -> Result<()> {
    log::debug!("set remote upstream to {}", clone_url);
    add_or_set_remote(repo, "upstream", clone_url)?;
    add_or_set_remote(repo, "upstream-w", ssh_url)?;
    add_fetch_refspec(repo, "upstream", &review_refs.fetch_refspec("upstream"))
}

/// Point `origin` at the fork over SSH and fetch its review heads too.
pub fn set_origin_remote(repo: &Repo, ssh_url: &str, review_refs: ReviewRefs) -> Result<()> {
    log::debug!("set remote origin to {}", ssh_url);
    add_or_set_remote(repo, "origin", ssh_url)?;
    add_fetch_refspec(repo, "origin", &review_refs.fetch_refspec("origin"))
}

pub fn fetch_all(repo: &Repo) -> Result<()> {
    repo.run_checked(&["fetch", "--all", "--quiet"])?;
    Ok(())
}

/// Fetch a single pull request head from `remote` and check it out as `pr/<id>`.
///
/// Uses `checkout -B`, so running it again resets the local branch to the
/// current head of the pull request.
pub fn checkout_pr(repo: &Repo, remote: &str, id: u64, review_refs: ReviewRefs) -> Result<String> {
    let local_ref = format!("{}/pr/{}", remote, id);
    let refspec = format!(
        "+refs/{}/{}/head:refs/remotes/{}",
        review_refs.namespace(),
        id,
        local_ref
    );
    repo.run_checked(&["fetch", remote, &refspec])?;

    let branch = format!("pr/{}", id);
    repo.run_checked(&["checkout", "-B", &branch, &local_ref])?;
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRepo;

    #[test]
    fn test_review_refs_refspec() {
        assert_eq!(
            ReviewRefs::Pull.fetch_refspec("upstream"),
            "+refs/pull/*/head:refs/remotes/upstream/pr/*"
        );
        assert_eq!(
            ReviewRefs::MergeRequests.fetch_refspec("origin"),
            "+refs/merge-requests/*/head:refs/remotes/origin/mr/*"
        );
    }

    #[test]
    fn test_set_upstream_remote_is_idempotent() {
        let repo = TestRepo::new();
        let r = repo.repo();

        set_upstream_remote(
            r,
            "https://github.com/org/p",
            "git@github.com:org/p.git",
            ReviewRefs::Pull,
        )
        .unwrap();
        set_upstream_remote(
            r,
            "https://github.com/org/p2",
            "git@github.com:org/p2.git",
            ReviewRefs::Pull,
        )
        .unwrap();

        assert_eq!(repo.git(&["remote", "get-url", "upstream"]), "https://github.com/org/p2");
        assert_eq!(repo.git(&["remote", "get-url", "upstream-w"]), "git@github.com:org/p2.git");

        let fetch = repo.git(&["config", "--get-all", "remote.upstream.fetch"]);
        let pr_specs = fetch
            .lines()
            .filter(|l| l.contains("refs/pull/"))
            .count();
        assert_eq!(pr_specs, 1);
    }

    #[test]
    fn test_set_origin_remote() {
        let repo = TestRepo::new();
        repo.git(&["remote", "add", "origin", "https://github.com/me/p"]);

        set_origin_remote(
            repo.repo(),
            "git@github.com:me/p.git",
            ReviewRefs::MergeRequests,
        )
        .unwrap();

        assert_eq!(repo.git(&["remote", "get-url", "origin"]), "git@github.com:me/p.git");
        let fetch = repo.git(&["config", "--get-all", "remote.origin.fetch"]);
        assert!(fetch.contains("+refs/merge-requests/*/head:refs/remotes/origin/mr/*"));
    }

    /// A bare "server" whose refs/pull/1/head points at a side commit.
    fn server_with_pull_request() -> (TestRepo, String) {
        let server = TestRepo::new();
        server.commit("initial commit", "2020-01-01T10:00:00+00:00");
        server.git(&["checkout", "-b", "contribution"]);
        let head = server.commit("contributed change", "2020-01-02T10:00:00+00:00");
        server.git(&["update-ref", "refs/pull/1/head", &head]);
        server.git(&["checkout", "master"]);
        (server, head)
    }

    #[test]
    fn test_clone_and_checkout_pr() {
        let (server, pr_head) = server_with_pull_request();
        let workspace = tempfile::TempDir::new().unwrap();
        let url = server.path().to_string_lossy().to_string();

        let repo = clone_into(&workspace.path().join("org"), &url, "project").unwrap();
        assert!(repo.root().join(".git").exists());
        repo.run_checked(&["remote", "rename", "origin", "upstream"]).unwrap();

        let branch = checkout_pr(&repo, "upstream", 1, ReviewRefs::Pull).unwrap();
        assert_eq!(branch, "pr/1");
        assert_eq!(repo.current_branch().unwrap(), "pr/1");
        assert_eq!(repo.run_checked(&["rev-parse", "HEAD"]).unwrap().trim(), pr_head);

        // moving the local branch away and checking out again restores the PR head
        repo.run_checked(&["reset", "--hard", "HEAD^"]).unwrap();
        checkout_pr(&repo, "upstream", 1, ReviewRefs::Pull).unwrap();
        assert_eq!(repo.run_checked(&["rev-parse", "HEAD"]).unwrap().trim(), pr_head);
    }

    #[test]
    fn test_clone_into_reuses_existing_checkout() {
        let (server, _) = server_with_pull_request();
        let workspace = tempfile::TempDir::new().unwrap();
        let url = server.path().to_string_lossy().to_string();

        let first = clone_into(workspace.path(), &url, "project").unwrap();
        let second = clone_into(workspace.path(), &url, "project").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_clone_into_missing_repository_fails() {
        let workspace = tempfile::TempDir::new().unwrap();
        let missing = workspace.path().join("nowhere");

        let result = clone_into(workspace.path(), &missing.to_string_lossy(), "project");
        assert!(matches!(result, Err(UpsintError::Git(_))));
    }

    #[test]
    fn test_fetch_all() {
        let (server, _) = server_with_pull_request();
        let workspace = tempfile::TempDir::new().unwrap();
        let url = server.path().to_string_lossy().to_string();

        let repo = clone_into(workspace.path(), &url, "project").unwrap();
        set_origin_remote(&repo, &url, ReviewRefs::Pull).unwrap();
        fetch_all(&repo).unwrap();

        let refs = repo
            .run_checked(&["for-each-ref", "--format=%(refname)", "refs/remotes/origin/pr/"])
            .unwrap();
        assert!(refs.contains("refs/remotes/origin/pr/1"));
    }
}
