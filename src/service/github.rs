//! GitHub through the `gh` CLI.

use serde::Deserialize;

use super::{parse_json_pages, run_tool, GitService, PullRequestLookup};
use super::types::{
    Comment, CommitState, CommitStatus, Label, NewPullRequest, ProjectRef, PullRequest, Release,
    ServiceKind, Tag,
};
use crate::error::{Result, UpsintError};

const GH: &str = "gh";
const PR_FIELDS: &str = "number,title,author,url,body,headRefName";
/// Upper bound for `gh` list commands, which default to 30 items
const LIST_LIMIT: &str = "1000";
const TEMPLATE_PATH: &str = ".github/PULL_REQUEST_TEMPLATE.md";

#[derive(Debug, Deserialize)]
struct GhAuthor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: u64,
    title: String,
    author: GhAuthor,
    url: String,
    #[serde(default)]
    body: String,
    #[serde(default, rename = "headRefName")]
    head_ref_name: String,
}

impl From<GhPullRequest> for PullRequest {
    fn from(pr: GhPullRequest) -> Self {
        PullRequest {
            id: pr.number,
            title: pr.title,
            author: pr.author.login,
            url: pr.url,
            description: pr.body,
            source_branch: pr.head_ref_name,
        }
    }
}

/// One entry of `statusCheckRollup`: a check run (Actions, apps) or a
/// legacy commit status.
#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum GhCheck {
    CheckRun {
        name: String,
        #[serde(default)]
        status: String,
        #[serde(default)]
        conclusion: Option<String>,
        #[serde(default, rename = "workflowName")]
        workflow_name: Option<String>,
        #[serde(default, rename = "detailsUrl")]
        details_url: Option<String>,
    },
    StatusContext {
        context: String,
        state: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default, rename = "targetUrl")]
        target_url: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct GhStatusRollup {
    #[serde(default, rename = "statusCheckRollup")]
    checks: Vec<GhCheck>,
}

#[derive(Debug, Deserialize)]
struct GhComment {
    author: GhAuthor,
    #[serde(default)]
    body: String,
    #[serde(default, rename = "createdAt")]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct GhComments {
    #[serde(default)]
    comments: Vec<GhComment>,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    #[serde(default)]
    name: String,
    #[serde(rename = "tagName")]
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
    color: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhCommit {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GhTag {
    name: String,
    commit: GhCommit,
}

/// A GitHub project driven through `gh`
#[derive(Debug, Clone)]
pub struct GitHubService {
    project: ProjectRef,
}

impl GitHubService {
    pub fn new(project: ProjectRef) -> Self {
        Self { project }
    }

    /// `--repo` argument: `host/owner/name`
    fn repo_arg(&self) -> String {
        self.project.to_string()
    }

    fn gh(&self, args: &[&str]) -> Result<String> {
        run_tool(GH, args, &[])
    }

    /// `gh api` against the project's host
    fn api(&self, args: &[&str]) -> Result<String> {
        let mut full = vec!["api", "--hostname", self.project.host.as_str()];
        full.extend_from_slice(args);
        self.gh(&full)
    }

    fn repos_endpoint(&self, suffix: &str) -> String {
        format!("repos/{}{}", self.project.full_name(), suffix)
    }
}

impl PullRequestLookup for GitHubService {
    fn get_pr(&self, id: u64) -> Result<PullRequest> {
        let repo = self.repo_arg();
        let id = id.to_string();
        let output = self.gh(&["pr", "view", &id, "--repo", &repo, "--json", PR_FIELDS])?;
        parse_pull_request(&output)
    }
}

impl GitService for GitHubService {
    fn kind(&self) -> ServiceKind {
        ServiceKind::GitHub
    }

    fn project(&self) -> &ProjectRef {
        &self.project
    }

    fn current_user(&self) -> Result<String> {
        let output = self.api(&["user", "--jq", ".login"])?;
        non_empty(output.trim(), "could not determine the authenticated user")
    }

    fn default_branch(&self) -> Result<String> {
        let repo = self.repo_arg();
        let output = self.gh(&[
            "repo",
            "view",
            &repo,
            "--json",
            "defaultBranchRef",
            "--jq",
            ".defaultBranchRef.name",
        ])?;
        non_empty(output.trim(), "repository has no default branch")
    }

    fn fork(&self) -> Result<ProjectRef> {
        let user = self.current_user()?;
        let repo = self.repo_arg();
        // succeeds with a notice when the fork already exists
        self.gh(&["repo", "fork", &repo, "--clone=false", "--remote=false"])?;
        Ok(self.project.with_namespace(user))
    }

    fn create_pull_request(&self, request: &NewPullRequest) -> Result<String> {
        let repo = self.repo_arg();
        let head = format!("{}:{}", request.source_owner, request.source_branch);
        let output = self.gh(&[
            "pr",
            "create",
            "--repo",
            &repo,
            "--base",
            &request.target_branch,
            "--head",
            &head,
            "--title",
            &request.title,
            "--body",
            &request.body,
        ])?;
        last_url(&output).ok_or_else(|| service_error("pr create printed no URL"))
    }

    fn list_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let repo = self.repo_arg();
        let output = self.gh(&[
            "pr", "list", "--repo", &repo, "--state", "open", "--json", PR_FIELDS, "--limit",
            LIST_LIMIT,
        ])?;
        parse_pull_requests(&output)
    }

    fn list_labels(&self) -> Result<Vec<Label>> {
        let repo = self.repo_arg();
        let output = self.gh(&[
            "label",
            "list",
            "--repo",
            &repo,
            "--json",
            "name,color,description",
            "--limit",
            LIST_LIMIT,
        ])?;
        parse_labels(&output)
    }

    fn create_label(&self, label: &Label) -> Result<()> {
        let repo = self.repo_arg();
        self.gh(&[
            "label",
            "create",
            &label.name,
            "--repo",
            &repo,
            "--color",
            &label.color,
            "--description",
            &label.description,
        ])?;
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        let endpoint = self.repos_endpoint("/tags");
        let output = self.api(&[&endpoint, "--paginate"])?;
        parse_tags(&output)
    }

    fn pull_request_template(&self) -> Result<Option<String>> {
        let endpoint = self.repos_endpoint(&format!("/contents/{}", TEMPLATE_PATH));
        match self.api(&[&endpoint, "-H", "Accept: application/vnd.github.raw"]) {
            Ok(template) => Ok(Some(template)),
            Err(e) => {
                log::debug!("no pull request template: {}", e);
                Ok(None)
            }
        }
    }

    fn pull_request_for_branch(&self, branch: &str) -> Result<Option<PullRequest>> {
        let repo = self.repo_arg();
        let output = self.gh(&[
            "pr", "list", "--repo", &repo, "--state", "open", "--head", branch, "--json",
            PR_FIELDS,
        ])?;
        Ok(parse_pull_requests(&output)?
            .into_iter()
            .find(|pr| pr.source_branch == branch))
    }

    fn commit_statuses(&self, pr: &PullRequest) -> Result<Vec<CommitStatus>> {
        let repo = self.repo_arg();
        let id = pr.id.to_string();
        let output = self.gh(&[
            "pr",
            "view",
            &id,
            "--repo",
            &repo,
            "--json",
            "statusCheckRollup",
        ])?;
        parse_status_rollup(&output)
    }

    fn pull_request_comments(&self, pr: &PullRequest) -> Result<Vec<Comment>> {
        let repo = self.repo_arg();
        let id = pr.id.to_string();
        let output = self.gh(&["pr", "view", &id, "--repo", &repo, "--json", "comments"])?;
        parse_comments(&output)
    }

    fn open_issue_count(&self) -> Result<usize> {
        let query = format!("q=repo:{} type:issue state:open", self.project.full_name());
        let output = self.api(&[
            "-X",
            "GET",
            "search/issues",
            "-f",
            &query,
            "--jq",
            ".total_count",
        ])?;
        output
            .trim()
            .parse()
            .map_err(|_| service_error(format!("unexpected issue count '{}'", output.trim())))
    }

    fn latest_release(&self) -> Result<Option<Release>> {
        let repo = self.repo_arg();
        let output = self.gh(&[
            "release",
            "list",
            "--repo",
            &repo,
            "--exclude-drafts",
            "--limit",
            "1",
            "--json",
            "name,tagName",
        ])?;
        parse_latest_release(&output)
    }
}

fn service_error(message: impl Into<String>) -> UpsintError {
    UpsintError::Service {
        service: GH.to_string(),
        message: message.into(),
    }
}

fn non_empty(value: &str, message: &str) -> Result<String> {
    if value.is_empty() || value == "null" {
        return Err(service_error(message));
    }
    Ok(value.to_string())
}

/// The last line of `output` that looks like a URL
pub(crate) fn last_url(output: &str) -> Option<String> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("https://") || l.starts_with("http://"))
        .map(str::to_string)
}

fn parse_pull_request(json: &str) -> Result<PullRequest> {
    let pr: GhPullRequest = serde_json::from_str(json.trim())?;
    Ok(pr.into())
}

fn parse_pull_requests(json: &str) -> Result<Vec<PullRequest>> {
    let prs: Vec<GhPullRequest> = serde_json::from_str(json.trim())?;
    Ok(prs.into_iter().map(PullRequest::from).collect())
}

fn parse_labels(json: &str) -> Result<Vec<Label>> {
    let labels: Vec<GhLabel> = serde_json::from_str(json.trim())?;
    Ok(labels
        .into_iter()
        .map(|l| Label::new(l.name, &l.color, l.description.unwrap_or_default()))
        .collect())
}

fn parse_status_rollup(json: &str) -> Result<Vec<CommitStatus>> {
    let rollup: GhStatusRollup = serde_json::from_str(json.trim())?;
    Ok(rollup
        .checks
        .into_iter()
        .filter_map(|check| match check {
            GhCheck::CheckRun {
                name,
                status,
                conclusion,
                workflow_name,
                details_url,
            } => {
                // a check run only has a conclusion once it is completed
                let state = match conclusion.filter(|c| !c.is_empty()) {
                    Some(conclusion) if status.eq_ignore_ascii_case("completed") => {
                        CommitState::from_name(&conclusion)
                    }
                    _ => CommitState::from_name(&status),
                };
                Some(CommitStatus {
                    context: name,
                    state,
                    description: workflow_name.unwrap_or_default(),
                    url: details_url.unwrap_or_default(),
                })
            }
            GhCheck::StatusContext {
                context,
                state,
                description,
                target_url,
            } => Some(CommitStatus {
                context,
                state: CommitState::from_name(&state),
                description: description.unwrap_or_default(),
                url: target_url.unwrap_or_default(),
            }),
            GhCheck::Other => None,
        })
        .collect())
}

fn parse_comments(json: &str) -> Result<Vec<Comment>> {
    let comments: GhComments = serde_json::from_str(json.trim())?;
    Ok(comments
        .comments
        .into_iter()
        .map(|c| Comment {
            author: c.author.login,
            created: c.created_at,
            body: c.body,
        })
        .collect())
}

fn parse_latest_release(json: &str) -> Result<Option<Release>> {
    let releases: Vec<GhRelease> = serde_json::from_str(json.trim())?;
    Ok(releases.into_iter().next().map(|r| Release {
        name: r.name,
        tag_name: r.tag_name,
    }))
}

fn parse_tags(json: &str) -> Result<Vec<Tag>> {
    let tags: Vec<GhTag> = parse_json_pages(json)?;
    Ok(tags
        .into_iter()
        .map(|t| Tag {
            name: t.name,
            commit_sha: t.commit.sha,
        })
        .collect())
}
