//! `status`: the pull request of the current branch with its CI results, or
//! an overview of the project when the branch has none.

use std::collections::HashSet;

use crate::error::Result;
use crate::output::colors::*;
use crate::service::{Comment, CommitState, CommitStatus, GitService, PullRequest, Release};

use super::Context;

/// Descriptions longer than this many characters are cut.
const DESCRIPTION_LIMIT: usize = 255;
const COMMENT_SEPARATOR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    PullRequest {
        pr: PullRequest,
        /// Latest status per context
        statuses: Vec<CommitStatus>,
        /// Only fetched when asked for
        comments: Option<Vec<Comment>>,
    },
    Project {
        open_issues: usize,
        open_prs: usize,
        latest_release: Option<Release>,
    },
}

/// Keep the first (newest) status of each context. States neither service
/// documents are dropped.
pub fn latest_per_context(statuses: Vec<CommitStatus>) -> Vec<CommitStatus> {
    let mut seen = HashSet::new();
    statuses
        .into_iter()
        .filter(|status| {
            if let CommitState::Unknown(state) = &status.state {
                log::warn!("Ignoring {} with unknown state '{}'", status.context, state);
                return false;
            }
            seen.insert(status.context.clone())
        })
        .collect()
}

pub fn truncate_description(description: &str) -> String {
    let description = description.trim();
    if description.chars().count() <= DESCRIPTION_LIMIT {
        return description.to_string();
    }
    let cut: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    format!("{}...", cut.trim_end())
}

pub fn gather_status(
    service: &dyn GitService,
    branch: &str,
    with_comments: bool,
) -> Result<StatusReport> {
    match service.pull_request_for_branch(branch)? {
        Some(pr) => {
            let statuses = latest_per_context(service.commit_statuses(&pr)?);
            let comments = if with_comments {
                Some(service.pull_request_comments(&pr)?)
            } else {
                None
            };
            Ok(StatusReport::PullRequest {
                pr,
                statuses,
                comments,
            })
        }
        None => {
            log::debug!("No pull request for {}", branch);
            Ok(StatusReport::Project {
                open_issues: service.open_issue_count()?,
                open_prs: service.list_pull_requests()?.len(),
                latest_release: service.latest_release()?,
            })
        }
    }
}

fn paint(text: &str, style: &str, color: bool) -> String {
    if color {
        format!("{}{}{}", style, text, RESET)
    } else {
        text.to_string()
    }
}

fn state_style(state: &CommitState) -> (&'static str, &'static str) {
    match state {
        CommitState::Success => ("✓", GREEN),
        CommitState::Failure | CommitState::Error => ("✗", RED),
        CommitState::Pending | CommitState::Running => ("•", YELLOW),
        CommitState::Canceled | CommitState::Unknown(_) => ("-", GRAY),
    }
}

fn render_status_line(status: &CommitStatus, color: bool) -> String {
    let (symbol, style) = state_style(&status.state);
    let mut line = format!("{} {}", paint(symbol, style, color), status.context);
    if !status.description.is_empty() {
        line.push_str(&format!(" - {}", status.description));
    }
    if !status.url.is_empty() {
        line.push_str(&format!(" {}", paint(&status.url, GRAY, color)));
    }
    line
}

pub fn render_status(report: &StatusReport, color: bool) -> String {
    let mut out = String::new();
    match report {
        StatusReport::PullRequest {
            pr,
            statuses,
            comments,
        } => {
            let author = format!("@{}", pr.author);
            out.push_str(&format!(
                "#{} {}, by {}\n",
                pr.id,
                pr.title,
                paint(&author, BOLD, color)
            ));
            out.push_str(&format!("{}\n", paint(&pr.url, CYAN, color)));

            let description = truncate_description(&pr.description);
            if !description.is_empty() {
                out.push_str(&format!("\n{}\n", paint(&description, YELLOW, color)));
            }

            out.push('\n');
            if statuses.is_empty() {
                out.push_str(&format!("{}\n", paint("No CI statuses.", GRAY, color)));
            }
            for status in statuses {
                out.push_str(&render_status_line(status, color));
                out.push('\n');
            }

            if let Some(comments) = comments {
                out.push('\n');
                if comments.is_empty() {
                    out.push_str(&format!("{}\n", paint("No comments.", GRAY, color)));
                }
                for comment in comments {
                    let header = format!("{} ({})", comment.author, comment.created);
                    out.push_str(&format!("{}\n", paint(&header, BOLD, color)));
                    out.push_str(comment.body.trim_end());
                    out.push('\n');
                    out.push_str(&"-".repeat(COMMENT_SEPARATOR_WIDTH));
                    out.push('\n');
                }
            }
        }
        StatusReport::Project {
            open_issues,
            open_prs,
            latest_release,
        } => {
            out.push_str(&format!("Open issues: {}\n", open_issues));
            out.push_str(&format!("Open PRs: {}\n", open_prs));
            let release = latest_release
                .as_ref()
                .map(Release::title)
                .unwrap_or("none");
            out.push_str(&format!("Latest release: {}\n", release));
        }
    }
    out
}

pub fn status_command(ctx: &Context, with_pr_comments: bool) -> Result<()> {
    let project = ctx.project_for_remote(None)?;
    let service = ctx.service(project)?;
    let branch = ctx.repo.current_branch()?;

    let report = gather_status(service.as_ref(), &branch, with_pr_comments)?;
    print!("{}", render_status(&report, true));
    Ok(())
}
