//! GitLab through the `glab` CLI.

use serde::Deserialize;

use super::github::last_url;
use super::types::{
    Comment, CommitState, CommitStatus, Label, NewPullRequest, ProjectRef, PullRequest, Release,
    ServiceKind, Tag,
};
use super::{parse_json_pages, run_tool, GitService, PullRequestLookup};
use crate::error::{Result, UpsintError};

const GLAB: &str = "glab";
const TEMPLATE_PATH: &str = ".gitlab/merge_request_templates/Default.md";

#[derive(Debug, Deserialize)]
struct GlUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct GlProject {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlMergeRequest {
    iid: u64,
    title: String,
    author: GlUser,
    web_url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source_branch: String,
    #[serde(default)]
    sha: Option<String>,
}

impl From<GlMergeRequest> for PullRequest {
    fn from(mr: GlMergeRequest) -> Self {
        PullRequest {
            id: mr.iid,
            title: mr.title,
            author: mr.author.username,
            url: mr.web_url,
            description: mr.description.unwrap_or_default(),
            source_branch: mr.source_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlLabel {
    name: String,
    color: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlCommit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GlTag {
    name: String,
    commit: GlCommit,
}

#[derive(Debug, Deserialize)]
struct GlStatus {
    id: u64,
    name: String,
    status: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    target_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlNote {
    author: GlUser,
    #[serde(default)]
    body: String,
    #[serde(default)]
    created_at: String,
    /// Notes generated by GitLab itself ("added 1 commit", ...)
    #[serde(default)]
    system: bool,
}

#[derive(Debug, Deserialize)]
struct GlIssueCounts {
    #[serde(default)]
    opened: usize,
}

#[derive(Debug, Deserialize)]
struct GlIssueStatistics {
    counts: GlIssueCounts,
}

#[derive(Debug, Deserialize)]
struct GlIssueStatisticsResponse {
    statistics: GlIssueStatistics,
}

#[derive(Debug, Deserialize)]
struct GlRelease {
    #[serde(default)]
    name: Option<String>,
    tag_name: String,
}

/// A GitLab project driven through `glab`
#[derive(Debug, Clone)]
pub struct GitLabService {
    project: ProjectRef,
}

impl GitLabService {
    pub fn new(project: ProjectRef) -> Self {
        Self { project }
    }

    /// URL-encoded `namespace/name`, the project id accepted by the API
    fn project_id(&self) -> String {
        encode_path(&self.project.full_name())
    }

    fn repo_arg(&self) -> String {
        self.project.to_string()
    }

    fn glab(&self, args: &[&str]) -> Result<String> {
        run_tool(GLAB, args, &[("GITLAB_HOST", self.project.host.as_str())])
    }

    fn api(&self, endpoint: &str, extra: &[&str]) -> Result<String> {
        let mut args = vec!["api", "--hostname", self.project.host.as_str(), endpoint];
        args.extend_from_slice(extra);
        self.glab(&args)
    }

    fn project_endpoint(&self, suffix: &str) -> String {
        format!("projects/{}{}", self.project_id(), suffix)
    }
}

impl PullRequestLookup for GitLabService {
    fn get_pr(&self, id: u64) -> Result<PullRequest> {
        let endpoint = self.project_endpoint(&format!("/merge_requests/{}", id));
        let output = self.api(&endpoint, &[])?;
        let mr: GlMergeRequest = serde_json::from_str(output.trim())?;
        Ok(mr.into())
    }
}

impl GitService for GitLabService {
    fn kind(&self) -> ServiceKind {
        ServiceKind::GitLab
    }

    fn project(&self) -> &ProjectRef {
        &self.project
    }

    fn current_user(&self) -> Result<String> {
        let output = self.api("user", &[])?;
        let user: GlUser = serde_json::from_str(output.trim())?;
        Ok(user.username)
    }

    fn default_branch(&self) -> Result<String> {
        let output = self.api(&self.project_endpoint(""), &[])?;
        parse_default_branch(&output)
    }

    fn fork(&self) -> Result<ProjectRef> {
        let user = self.current_user()?;
        let repo = self.repo_arg();
        self.glab(&["repo", "fork", &repo, "--clone=false", "--remote=false"])?;
        Ok(self.project.with_namespace(user))
    }

    fn create_pull_request(&self, request: &NewPullRequest) -> Result<String> {
        let repo = self.repo_arg();
        let head = format!("{}/{}", request.source_owner, self.project.name);
        let mut args = vec![
            "mr",
            "create",
            "--repo",
            repo.as_str(),
            "--source-branch",
            request.source_branch.as_str(),
            "--target-branch",
            request.target_branch.as_str(),
            "--title",
            request.title.as_str(),
            "--description",
            request.body.as_str(),
            "--yes",
        ];

        if request.source_owner != self.project.namespace {
            args.extend_from_slice(&["--head", head.as_str()]);
        }

        let output = self.glab(&args)?;
        last_url(&output).ok_or_else(|| service_error("mr create printed no URL"))
    }

    fn list_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let endpoint = self.project_endpoint("/merge_requests?state=opened&order_by=updated_at");
        let output = self.api(&endpoint, &[])?;
        parse_merge_requests(&output)
    }

    fn list_labels(&self) -> Result<Vec<Label>> {
        let output = self.api(&self.project_endpoint("/labels"), &["--paginate"])?;
        parse_labels(&output)
    }

    fn create_label(&self, label: &Label) -> Result<()> {
        let name = format!("name={}", label.name);
        let color = format!("color=#{}", label.color);
        let description = format!("description={}", label.description);
        self.api(
            &self.project_endpoint("/labels"),
            &["-X", "POST", "-f", &name, "-f", &color, "-f", &description],
        )?;
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        let output = self.api(&self.project_endpoint("/repository/tags"), &["--paginate"])?;
        parse_tags(&output)
    }

    fn pull_request_template(&self) -> Result<Option<String>> {
        let branch = self.default_branch()?;
        let endpoint = self.project_endpoint(&format!(
            "/repository/files/{}/raw?ref={}",
            encode_path(TEMPLATE_PATH),
            branch
        ));
        match self.api(&endpoint, &[]) {
            Ok(template) => Ok(Some(template)),
            Err(e) => {
                log::debug!("no merge request template: {}", e);
                Ok(None)
            }
        }
    }

    fn pull_request_for_branch(&self, branch: &str) -> Result<Option<PullRequest>> {
        let endpoint = self.project_endpoint(&format!(
            "/merge_requests?state=opened&source_branch={}",
            encode_query(branch)
        ));
        let output = self.api(&endpoint, &[])?;
        Ok(parse_merge_requests(&output)?.into_iter().next())
    }

    fn commit_statuses(&self, pr: &PullRequest) -> Result<Vec<CommitStatus>> {
        let endpoint = self.project_endpoint(&format!("/merge_requests/{}", pr.id));
        let output = self.api(&endpoint, &[])?;
        let mr: GlMergeRequest = serde_json::from_str(output.trim())?;
        let sha = match mr.sha.filter(|sha| !sha.is_empty()) {
            Some(sha) => sha,
            None => return Ok(Vec::new()),
        };

        let endpoint = self.project_endpoint(&format!("/repository/commits/{}/statuses", sha));
        let output = self.api(&endpoint, &["--paginate"])?;
        parse_statuses(&output)
    }

    fn pull_request_comments(&self, pr: &PullRequest) -> Result<Vec<Comment>> {
        let endpoint = self.project_endpoint(&format!(
            "/merge_requests/{}/notes?sort=asc&order_by=created_at",
            pr.id
        ));
        let output = self.api(&endpoint, &["--paginate"])?;
        parse_notes(&output)
    }

    fn open_issue_count(&self) -> Result<usize> {
        let endpoint = self.project_endpoint("/issues_statistics?state=opened");
        let output = self.api(&endpoint, &[])?;
        let response: GlIssueStatisticsResponse = serde_json::from_str(output.trim())?;
        Ok(response.statistics.counts.opened)
    }

    fn latest_release(&self) -> Result<Option<Release>> {
        let output = self.api(&self.project_endpoint("/releases?per_page=1"), &[])?;
        parse_latest_release(&output)
    }
}

fn service_error(message: impl Into<String>) -> UpsintError {
    UpsintError::Service {
        service: GLAB.to_string(),
        message: message.into(),
    }
}

/// Encode a repository path for use as a single API path segment
fn encode_path(path: &str) -> String {
    path.replace('/', "%2F")
}

/// Escape a value for a query string parameter
fn encode_query(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => encoded.push_str("%25"),
            '&' => encoded.push_str("%26"),
            '#' => encoded.push_str("%23"),
            '+' => encoded.push_str("%2B"),
            ' ' => encoded.push_str("%20"),
            _ => encoded.push(c),
        }
    }
    encoded
}

fn parse_default_branch(json: &str) -> Result<String> {
    let project: GlProject = serde_json::from_str(json.trim())?;
    project
        .default_branch
        .filter(|b| !b.is_empty())
        .ok_or_else(|| service_error("repository has no default branch"))
}

fn parse_merge_requests(json: &str) -> Result<Vec<PullRequest>> {
    let mrs: Vec<GlMergeRequest> = parse_json_pages(json)?;
    Ok(mrs.into_iter().map(PullRequest::from).collect())
}

fn parse_labels(json: &str) -> Result<Vec<Label>> {
    let labels: Vec<GlLabel> = parse_json_pages(json)?;
    Ok(labels
        .into_iter()
        .map(|l| Label::new(l.name, &l.color, l.description.unwrap_or_default()))
        .collect())
}

/// Statuses newest first: a retried job reports again under the same name.
fn parse_statuses(json: &str) -> Result<Vec<CommitStatus>> {
    let mut statuses: Vec<GlStatus> = parse_json_pages(json)?;
    statuses.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(statuses
        .into_iter()
        .map(|s| CommitStatus {
            context: s.name,
            state: CommitState::from_name(&s.status),
            description: s.description.unwrap_or_default(),
            url: s.target_url.unwrap_or_default(),
        })
        .collect())
}

fn parse_notes(json: &str) -> Result<Vec<Comment>> {
    let notes: Vec<GlNote> = parse_json_pages(json)?;
    Ok(notes
        .into_iter()
        .filter(|n| !n.system)
        .map(|n| Comment {
            author: n.author.username,
            created: n.created_at,
            body: n.body,
        })
        .collect())
}

fn parse_latest_release(json: &str) -> Result<Option<Release>> {
    let releases: Vec<GlRelease> = serde_json::from_str(json.trim())?;
    Ok(releases.into_iter().next().map(|r| Release {
        name: r.name.unwrap_or_default(),
        tag_name: r.tag_name,
    }))
}

fn parse_tags(json: &str) -> Result<Vec<Tag>> {
    let tags: Vec<GlTag> = parse_json_pages(json)?;
    Ok(tags
        .into_iter()
        .map(|t| Tag {
            name: t.name,
            commit_sha: t.commit.id,
        })
        .collect())
}
