//! Hosting service integration (GitHub, GitLab).
//!
//! Every service operation goes through the provider's own command line tool
//! (`gh` or `glab`), which owns HTTP access and authentication.
//!
//! # Modules
//!
//! - [`types`] - Projects, pull requests, labels and tags
//! - [`github`] - GitHub through the `gh` CLI
//! - [`gitlab`] - GitLab through the `glab` CLI

pub mod github;
pub mod gitlab;
pub mod types;

use std::collections::HashSet;
use std::io::ErrorKind;
use std::process::Command;

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{Result, UpsintError};

pub use github::GitHubService;
pub use gitlab::GitLabService;
pub use types::{
    normalize_color, Comment, CommitState, CommitStatus, Label, NewPullRequest, ProjectRef,
    PullRequest, Release, ServiceKind, Tag,
};

/// Looks up a pull request by number
pub trait PullRequestLookup {
    fn get_pr(&self, id: u64) -> Result<PullRequest>;
}

/// Operations a hosting service offers for one project
pub trait GitService: PullRequestLookup {
    fn kind(&self) -> ServiceKind;

    /// The project this service instance operates on
    fn project(&self) -> &ProjectRef;

    /// Login of the authenticated user
    fn current_user(&self) -> Result<String>;

    fn default_branch(&self) -> Result<String>;

    /// Fork the project into the user's namespace, returning the fork.
    /// Forking an already forked project returns the existing fork.
    fn fork(&self) -> Result<ProjectRef>;

    /// Open a pull request and return its URL
    fn create_pull_request(&self, request: &NewPullRequest) -> Result<String>;

    /// Open pull requests, most recently updated first
    fn list_pull_requests(&self) -> Result<Vec<PullRequest>>;

    fn list_labels(&self) -> Result<Vec<Label>>;

    fn create_label(&self, label: &Label) -> Result<()>;

    fn list_tags(&self) -> Result<Vec<Tag>>;

    /// The project's pull request template, if it has one
    fn pull_request_template(&self) -> Result<Option<String>>;

    /// The open pull request whose source branch is `branch`, if any
    fn pull_request_for_branch(&self, branch: &str) -> Result<Option<PullRequest>>;

    /// Statuses reported for the head commit of `pr`, newest first.
    /// A context may appear more than once.
    fn commit_statuses(&self, pr: &PullRequest) -> Result<Vec<CommitStatus>>;

    /// Comments on `pr`, oldest first
    fn pull_request_comments(&self, pr: &PullRequest) -> Result<Vec<Comment>>;

    /// Number of open issues (pull requests excluded)
    fn open_issue_count(&self) -> Result<usize>;

    /// Most recent published release
    fn latest_release(&self) -> Result<Option<Release>>;
}

/// Figure out which service hosts `host`.
///
/// Configured instances win; otherwise `github.com` is GitHub and any host
/// mentioning `gitlab` is GitLab.
pub fn detect_kind(host: &str, config: &Config) -> Option<ServiceKind> {
    if let Some(instance) = config
        .instances
        .iter()
        .find(|i| i.host().as_deref() == Some(host))
    {
        return Some(instance.service);
    }

    if host == "github.com" || host.ends_with(".github.com") {
        Some(ServiceKind::GitHub)
    } else if host.contains("gitlab") {
        Some(ServiceKind::GitLab)
    } else {
        None
    }
}

/// Build the service implementation for `kind`.
pub fn service_for(kind: ServiceKind, project: ProjectRef) -> Box<dyn GitService> {
    match kind {
        ServiceKind::GitHub => Box::new(GitHubService::new(project)),
        ServiceKind::GitLab => Box::new(GitLabService::new(project)),
    }
}

/// Pick the service implementation for `project` based on its host.
pub fn resolve_service(project: ProjectRef, config: &Config) -> Result<Box<dyn GitService>> {
    let kind = detect_kind(&project.host, config)
        .ok_or_else(|| UpsintError::UnsupportedService(project.host.clone()))?;
    log::debug!("{} is served by {}", project, kind);
    Ok(service_for(kind, project))
}

/// Create the labels of `labels` that `destination` does not have yet.
///
/// Labels are matched by name; existing labels are never modified or
/// deleted. Returns how many labels were created.
pub fn copy_labels(labels: &[Label], destination: &dyn GitService) -> Result<usize> {
    let existing: HashSet<String> = destination
        .list_labels()?
        .into_iter()
        .map(|l| l.name)
        .collect();

    let mut created = 0;
    for label in labels.iter().filter(|l| !existing.contains(&l.name)) {
        let label = Label::new(label.name.clone(), &label.color, label.description.clone());
        destination.create_label(&label)?;
        created += 1;
    }
    Ok(created)
}

/// Run a provider CLI and return its stdout.
pub(crate) fn run_tool(program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<String> {
    log::debug!("$ {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .envs(envs.iter().copied())
        .output()
        .map_err(|e| {
            let message = if e.kind() == ErrorKind::NotFound {
                format!("`{}` is not installed or not in PATH", program)
            } else {
                format!("failed to run {}: {}", program, e)
            };
            UpsintError::Service {
                service: program.to_string(),
                message,
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(UpsintError::Service {
            service: program.to_string(),
            message: format!(
                "`{} {}` failed: {}",
                program,
                args.first().unwrap_or(&""),
                stderr.trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse paginated API output: one JSON array per page, concatenated.
pub(crate) fn parse_json_pages<T: DeserializeOwned>(json: &str) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for page in serde_json::Deserializer::from_str(json).into_iter::<Vec<T>>() {
        items.extend(page?);
    }
    Ok(items)
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory [`GitService`] for exercising code that talks to a service.

    use std::cell::RefCell;

    use super::*;

    pub struct FakeService {
        pub project: ProjectRef,
        pub user: String,
        pub labels: RefCell<Vec<Label>>,
        pub pull_requests: Vec<PullRequest>,
        pub tags: Vec<Tag>,
        pub created_prs: RefCell<Vec<NewPullRequest>>,
        pub template: Option<String>,
        pub statuses: Vec<CommitStatus>,
        pub comments: Vec<Comment>,
        pub open_issues: usize,
        pub releases: Vec<Release>,
    }

    impl FakeService {
        pub fn new(project: ProjectRef) -> Self {
            Self {
                project,
                user: "me".to_string(),
                labels: RefCell::new(Vec::new()),
                pull_requests: Vec::new(),
                tags: Vec::new(),
                created_prs: RefCell::new(Vec::new()),
                template: None,
                statuses: Vec::new(),
                comments: Vec::new(),
                open_issues: 0,
                releases: Vec::new(),
            }
        }
    }

    impl PullRequestLookup for FakeService {
        fn get_pr(&self, id: u64) -> Result<PullRequest> {
            self.pull_requests
                .iter()
                .find(|pr| pr.id == id)
                .cloned()
                .ok_or_else(|| UpsintError::Service {
                    service: "fake".to_string(),
                    message: format!("no pull request #{}", id),
                })
        }
    }

    impl GitService for FakeService {
        fn kind(&self) -> ServiceKind {
            ServiceKind::GitHub
        }

        fn project(&self) -> &ProjectRef {
            &self.project
        }

        fn current_user(&self) -> Result<String> {
            Ok(self.user.clone())
        }

        fn default_branch(&self) -> Result<String> {
            Ok("main".to_string())
        }

        fn fork(&self) -> Result<ProjectRef> {
            Ok(self.project.with_namespace(self.user.clone()))
        }

        fn create_pull_request(&self, request: &NewPullRequest) -> Result<String> {
            let mut created = self.created_prs.borrow_mut();
            created.push(request.clone());
            Ok(format!("{}/pull/{}", self.project.web_url(), created.len()))
        }

        fn list_pull_requests(&self) -> Result<Vec<PullRequest>> {
            Ok(self.pull_requests.clone())
        }

        fn list_labels(&self) -> Result<Vec<Label>> {
            Ok(self.labels.borrow().clone())
        }

        fn create_label(&self, label: &Label) -> Result<()> {
            self.labels.borrow_mut().push(label.clone());
            Ok(())
        }

        fn list_tags(&self) -> Result<Vec<Tag>> {
            Ok(self.tags.clone())
        }

        fn pull_request_template(&self) -> Result<Option<String>> {
            Ok(self.template.clone())
        }

        fn pull_request_for_branch(&self, branch: &str) -> Result<Option<PullRequest>> {
            Ok(self
                .pull_requests
                .iter()
                .find(|pr| pr.source_branch == branch)
                .cloned())
        }

        fn commit_statuses(&self, _pr: &PullRequest) -> Result<Vec<CommitStatus>> {
            Ok(self.statuses.clone())
        }

        fn pull_request_comments(&self, _pr: &PullRequest) -> Result<Vec<Comment>> {
            Ok(self.comments.clone())
        }

        fn open_issue_count(&self) -> Result<usize> {
            Ok(self.open_issues)
        }

        fn latest_release(&self) -> Result<Option<Release>> {
            Ok(self.releases.first().cloned())
        }
    }
}
