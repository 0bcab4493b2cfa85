//! Test utilities shared across modules.
//!
//! [`TestRepo`] builds throwaway repositories in a temp directory with pinned
//! author and committer dates, so ordering by date is deterministic.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use crate::git::Repo;

const TRACKED_FILE: &str = "README";

/// Tag marking the start of the history built by [`TestRepo::with_merged_pull_request`]
pub const RELEASE_TAG: &str = "0.1.0";

/// Message of the merge commit built by [`TestRepo::with_merged_pull_request`]
pub const MERGE_MESSAGE: &str = "Merge pull request #760 from jpopelka/specfile-add_patches\n\
    \n\
    More Specfile.add_patches() changes\n\
    \n\
    Reviewed-by: Tomas Tomecek <tomas@tomecek.net>\n\
    \x20            https://github.com/TomasTomecek\n";

/// A git repository living in a temp directory, removed on drop.
pub struct TestRepo {
    _dir: TempDir,
    repo: Repo,
}

impl TestRepo {
    /// Initialize an empty repository whose default branch is `master`.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repo::new(dir.path());
        let test_repo = Self { _dir: dir, repo };

        test_repo.git(&["init", "--initial-branch=master", "."]);
        test_repo.git(&["config", "user.email", "test@test.com"]);
        test_repo.git(&["config", "user.name", "Test"]);
        test_repo.git(&["config", "commit.gpgsign", "false"]);
        test_repo.git(&["config", "tag.gpgsign", "false"]);

        test_repo
    }

    /// tag 0.1.0 -> "line 1" -> branch with two commits -> `--no-ff` merge
    /// into master with a pull request merge message.
    pub fn with_merged_pull_request() -> Self {
        let repo = Self::new();
        repo.commit("initial commit", "2020-01-01T10:00:00+00:00");
        repo.git_at(
            &["tag", "-a", "-m", "tag 0.1.0, tests", RELEASE_TAG],
            "2020-01-01T10:00:00+00:00",
        );
        repo.commit("line 1", "2020-01-02T10:00:00+00:00");

        repo.git(&["checkout", "-b", "branch"]);
        repo.commit("branch change", "2020-01-03T10:00:00+00:00");
        repo.commit("branch change #2", "2020-01-04T10:00:00+00:00");

        repo.git(&["checkout", "master"]);
        repo.git_at(
            &["merge", "--no-ff", "-m", MERGE_MESSAGE, "branch"],
            "2020-01-05T10:00:00+00:00",
        );
        repo
    }

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    pub fn path(&self) -> &Path {
        self.repo.root()
    }

    /// Run git in the repository, panicking on failure. Returns trimmed stdout.
    pub fn git(&self, args: &[&str]) -> String {
        self.git_with_env(args, &[])
    }

    /// Run git with both author and committer date pinned to `date`.
    pub fn git_at(&self, args: &[&str], date: &str) -> String {
        self.git_with_env(
            args,
            &[("GIT_AUTHOR_DATE", date), ("GIT_COMMITTER_DATE", date)],
        )
    }

    fn git_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> String {
        let output = Command::new("git")
            .args(args)
            .envs(envs.iter().copied())
            .current_dir(self.path())
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Commit a change to the tracked file and return the new commit hash.
    pub fn commit(&self, message: &str, date: &str) -> String {
        let file = self.path().join(TRACKED_FILE);
        let mut content = fs::read_to_string(&file).unwrap_or_default();
        content.push_str(message);
        content.push('\n');
        fs::write(&file, content).unwrap();

        self.git(&["add", TRACKED_FILE]);
        self.git_at(&["commit", "-m", message], date);
        self.rev_parse("HEAD")
    }

    pub fn rev_parse(&self, rev: &str) -> String {
        self.git(&["rev-parse", rev])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_repo_is_empty_master() {
        let repo = TestRepo::new();
        assert!(repo.path().join(".git").exists());
        assert_eq!(
            repo.git(&["symbolic-ref", "--short", "HEAD"]),
            "master"
        );
    }

    #[test]
    fn test_commit_pins_author_date() {
        let repo = TestRepo::new();
        let hash = repo.commit("initial commit", "2021-06-01T12:00:00+00:00");

        assert_eq!(hash.len(), 40);
        let date = repo.git(&["show", "--quiet", "--format=%aI", &hash]);
        // Newer git prints `Z` for UTC, older git prints `+00:00`.
        assert!(date.starts_with("2021-06-01T12:00:00"));
    }
}
