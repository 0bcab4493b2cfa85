//! CLI command handlers for upsint.
//!
//! Each command has its own module with a `*_command` entry point taking the
//! shared [`Context`].
//!
//! # Commands
//!
//! - [`fork`] - Fork a project and clone it with remotes set up
//! - [`create_pr`] - Open a pull request from the current branch
//! - [`list`] - List pull requests, labels and tags of a project
//! - [`branches`] - List local branches and remove merged ones
//! - [`update_labels`] - Copy labels to other projects
//! - [`checkout_pr`] - Check out a pull request locally
//! - [`get_changes`] - Changelog of a commit range
//! - [`status`] - Pull request of the current branch, or a project overview

mod branches;
mod checkout_pr;
mod create_pr;
mod fork;
mod get_changes;
mod list;
mod status;
mod update_labels;

pub use branches::{
    list_branches_command, remove_merged_branches_command, remove_merged_branches_with,
};
pub use checkout_pr::checkout_pr_command;
pub use create_pr::{assemble_pr_body, create_pr_command, create_pr_with, CreatePrOptions};
pub use fork::fork_command;
pub use get_changes::get_changes_command;
pub use list::{list_labels_command, list_prs_command, list_tags_command};
pub use status::{gather_status, render_status, status_command, StatusReport};
pub use update_labels::{parse_destinations, update_labels_command};

use crate::config::Config;
use crate::error::{Result, UpsintError};
use crate::git::Repo;
use crate::service::{resolve_service, GitService, ProjectRef, ServiceKind};

/// Everything a command needs: the working repository and the configuration.
#[derive(Debug, Clone)]
pub struct Context {
    pub repo: Repo,
    pub config: Config,
}

impl Context {
    pub fn new(repo: Repo, config: Config) -> Self {
        Self { repo, config }
    }

    /// Fail early with a clear message outside of a git checkout.
    pub fn require_git_repo(&self) -> Result<()> {
        if self.repo.is_git_repo() {
            Ok(())
        } else {
            Err(UpsintError::Git(format!(
                "{} is not a git repository",
                self.repo.root().display()
            )))
        }
    }

    /// The project behind `remote`, or behind the configured default remote.
    pub fn project_for_remote(&self, remote: Option<&str>) -> Result<ProjectRef> {
        self.require_git_repo()?;
        let remote = remote.unwrap_or(self.config.default_remote.as_str());
        let url = self.repo.remote_url(remote)?;
        ProjectRef::from_remote_url(&url)
    }

    /// The project named on the command line, or the one of the current checkout.
    ///
    /// `owner/name` without a host means GitHub.
    pub fn project_for_arg(&self, arg: Option<&str>) -> Result<ProjectRef> {
        match arg {
            Some(arg) => ProjectRef::from_arg(arg, ServiceKind::GitHub.default_host()),
            None => self.project_for_remote(None),
        }
    }

    pub fn service(&self, project: ProjectRef) -> Result<Box<dyn GitService>> {
        resolve_service(project, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRepo;

    fn context(repo: &TestRepo) -> Context {
        Context::new(repo.repo().clone(), Config::default())
    }

    #[test]
    fn test_project_for_remote_uses_default_remote() {
        let repo = TestRepo::new();
        repo.git(&["remote", "add", "origin", "git@github.com:me/ogr.git"]);
        repo.git(&["remote", "add", "upstream", "https://github.com/packit/ogr.git"]);

        let ctx = context(&repo);
        assert_eq!(
            ctx.project_for_remote(None).unwrap(),
            ProjectRef::new("github.com", "packit", "ogr")
        );
        assert_eq!(
            ctx.project_for_remote(Some("origin")).unwrap(),
            ProjectRef::new("github.com", "me", "ogr")
        );
    }

    #[test]
    fn test_project_for_arg() {
        let repo = TestRepo::new();
        repo.git(&["remote", "add", "origin", "https://gitlab.com/group/project.git"]);
        let ctx = context(&repo);

        assert_eq!(
            ctx.project_for_arg(Some("packit/upsint")).unwrap(),
            ProjectRef::new("github.com", "packit", "upsint")
        );
        // no upstream remote: falls back to origin
        assert_eq!(
            ctx.project_for_arg(None).unwrap(),
            ProjectRef::new("gitlab.com", "group", "project")
        );
    }

    #[test]
    fn test_require_git_repo() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = Context::new(Repo::new(dir.path()), Config::default());
        assert!(matches!(ctx.require_git_repo(), Err(UpsintError::Git(_))));
        assert!(ctx.project_for_remote(None).is_err());
    }
}
