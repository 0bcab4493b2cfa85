//! Core types shared by the hosting service implementations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UpsintError};
use crate::git::ReviewRefs;

/// Which hosting service a project lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    #[value(name = "github")]
    GitHub,
    #[value(name = "gitlab")]
    GitLab,
}

impl ServiceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::GitHub => "github",
            ServiceKind::GitLab => "gitlab",
        }
    }

    /// Host used when a repository is given without one
    pub fn default_host(&self) -> &'static str {
        match self {
            ServiceKind::GitHub => "github.com",
            ServiceKind::GitLab => "gitlab.com",
        }
    }

    pub fn review_refs(&self) -> ReviewRefs {
        match self {
            ServiceKind::GitHub => ReviewRefs::Pull,
            ServiceKind::GitLab => ReviewRefs::MergeRequests,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A project on a hosting service: `host/namespace/name`.
///
/// `namespace` may contain slashes (GitLab subgroups).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef {
    pub host: String,
    pub namespace: String,
    pub name: String,
}

impl ProjectRef {
    pub fn new(
        host: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a git remote URL.
    ///
    /// Supports `https://host/ns/repo(.git)`, `ssh://[user@]host[:port]/ns/repo(.git)`
    /// and scp-like `[user@]host:ns/repo(.git)`.
    pub fn from_remote_url(url: &str) -> Result<Self> {
        let invalid = || UpsintError::InvalidRepository(url.to_string());
        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let (host, path) = if let Some((_, rest)) = trimmed.split_once("://") {
            let (authority, path) = rest.split_once('/').ok_or_else(invalid)?;
            let authority = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
            let host = authority.split_once(':').map_or(authority, |(h, _)| h);
            (host, path)
        } else {
            let (authority, path) = trimmed.split_once(':').ok_or_else(invalid)?;
            let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
            (host, path)
        };

        let path = path.trim_matches('/');
        let (namespace, name) = path.rsplit_once('/').ok_or_else(invalid)?;
        if host.is_empty() || namespace.is_empty() || name.is_empty() {
            return Err(invalid());
        }

        Ok(Self::new(host, namespace, name))
    }

    /// Parse a repository given on the command line.
    ///
    /// Accepts a remote URL, `host/namespace/name`, or `owner/name`, which
    /// resolves against `default_host`.
    pub fn from_arg(arg: &str, default_host: &str) -> Result<Self> {
        let arg = arg.trim();
        if arg.contains("://") || arg.contains('@') || arg.contains(':') {
            return Self::from_remote_url(arg);
        }

        let arg = arg.trim_matches('/');
        let arg = arg.strip_suffix(".git").unwrap_or(arg);
        let segments: Vec<&str> = arg.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(UpsintError::InvalidRepository(arg.to_string()));
        }

        match segments.as_slice() {
            [owner, name] => Ok(Self::new(default_host, *owner, *name)),
            [host, namespace @ .., name] if !namespace.is_empty() => {
                Ok(Self::new(*host, namespace.join("/"), *name))
            }
            _ => Err(UpsintError::InvalidRepository(arg.to_string())),
        }
    }

    /// `namespace/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn web_url(&self) -> String {
        format!("https://{}/{}", self.host, self.full_name())
    }

    pub fn https_url(&self) -> String {
        format!("{}.git", self.web_url())
    }

    pub fn ssh_url(&self) -> String {
        format!("git@{}:{}.git", self.host, self.full_name())
    }

    /// The same project name under another namespace (a fork)
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self::new(self.host.clone(), namespace, self.name.clone())
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.full_name())
    }
}

/// An open pull (or merge) request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub url: String,
    pub description: String,
    /// Branch the changes come from
    pub source_branch: String,
}

/// Parameters for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Branch in the target project the changes go into
    pub target_branch: String,
    /// Branch carrying the changes
    pub source_branch: String,
    /// Namespace owning `source_branch` (the fork)
    pub source_owner: String,
}

/// A repository label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    /// Hex color, without a leading `#`
    pub color: String,
    pub description: String,
}

impl Label {
    pub fn new(name: impl Into<String>, color: &str, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: normalize_color(color),
            description: description.into(),
        }
    }
}

/// Strip the leading `#` services disagree about.
pub fn normalize_color(color: &str) -> String {
    color.trim().trim_start_matches('#').to_string()
}

/// A repository tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit_sha: String,
}

/// State of a CI check or commit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitState {
    Pending,
    Running,
    Success,
    Failure,
    Error,
    Canceled,
    /// A state neither service is known to report
    Unknown(String),
}

impl CommitState {
    /// Map a state as GitHub or GitLab spells it, ignoring case.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pending" | "expected" | "queued" | "waiting" | "requested" | "created"
            | "scheduled" | "preparing" | "waiting_for_resource" => CommitState::Pending,
            "running" | "in_progress" => CommitState::Running,
            "success" => CommitState::Success,
            "failure" | "failed" | "timed_out" | "action_required" | "startup_failure" => {
                CommitState::Failure
            }
            "error" => CommitState::Error,
            "canceled" | "cancelled" => CommitState::Canceled,
            _ => CommitState::Unknown(name.to_string()),
        }
    }
}

/// One status reported for a commit by a CI system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    /// Name of the check, unique per reporting system
    pub context: String,
    pub state: CommitState,
    pub description: String,
    pub url: String,
}

/// A comment on a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    /// Creation time as reported by the service
    pub created: String,
    pub body: String,
}

/// A published release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub name: String,
    pub tag_name: String,
}

impl Release {
    /// The release name, or its tag for unnamed releases
    pub fn title(&self) -> &str {
        if self.name.is_empty() {
            &self.tag_name
        } else {
            &self.name
        }
    }
}
