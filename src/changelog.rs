//! Changelog-like summaries of a commit range.
//!
//! Walks the first-parent history of a range; pull request merges are
//! expanded into the commits they brought in and annotated with the pull
//! request's description, everything else is listed by its subject.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;
use crate::git::{get_commit_metadata, get_commits_in_a_merge, get_commits_in_range, Repo};
use crate::service::{ProjectRef, PullRequestLookup};

/// One top-level changelog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogEntry {
    /// A merged pull request
    Merge {
        pr_id: u64,
        /// Who the merged branch belonged to
        author: String,
        /// Body of the merge commit, without review trailers
        summary: String,
        description: String,
        url: String,
        /// Subjects of the merged-in commits, newest first
        commits: Vec<String>,
    },
    /// A commit made directly on the mainline
    Commit { subject: String },
}

fn merge_subject_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Merge pull request #(\d+) from ([\w-]+)/").expect("valid regex")
    })
}

/// Pull request number and author from a GitHub merge commit subject.
pub fn parse_merge_subject(subject: &str) -> Option<(u64, String)> {
    let captures = merge_subject_re().captures(subject)?;
    let pr_id = captures[1].parse().ok()?;
    Some((pr_id, captures[2].to_string()))
}

/// Build the changelog of `lower_bound..upper_bound`, newest first.
pub fn synthesize<L: PullRequestLookup + ?Sized>(
    repo: &Repo,
    lookup: &L,
    lower_bound: &str,
    upper_bound: &str,
) -> Result<Vec<ChangelogEntry>> {
    let mut entries = Vec::new();

    for commit in get_commits_in_range(repo, lower_bound, upper_bound)? {
        let metadata = get_commit_metadata(repo, commit.as_str())?;

        let Some((pr_id, author)) = parse_merge_subject(&metadata.message) else {
            entries.push(ChangelogEntry::Commit {
                subject: metadata.message,
            });
            continue;
        };

        let pr = lookup.get_pr(pr_id)?;
        let commits = get_commits_in_a_merge(repo, commit.as_str())?
            .iter()
            .map(|c| get_commit_metadata(repo, c.as_str()).map(|m| m.message))
            .collect::<Result<Vec<_>>>()?;

        entries.push(ChangelogEntry::Merge {
            pr_id,
            author,
            summary: metadata.body,
            description: pr.description,
            url: pr.url,
            commits,
        });
    }

    Ok(entries)
}

/// Render entries as a markdown list. Author links point at `project`'s host.
pub fn render(entries: &[ChangelogEntry], project: &ProjectRef) -> String {
    let mut out = String::new();
    for entry in entries {
        match entry {
            ChangelogEntry::Merge {
                pr_id,
                author,
                summary,
                description,
                url,
                commits,
            } => {
                out.push_str(&format!(
                    "* {}, by [@{}](https://{}/{}), [#{}]({})\n",
                    summary, author, project.host, author, pr_id, url
                ));
                out.push_str(&format!("  * description: {:?}\n", description));
                for subject in commits {
                    out.push_str(&format!("  * commit: {}\n", subject));
                }
            }
            ChangelogEntry::Commit { subject } => {
                out.push_str(&format!("* {}\n", subject));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpsintError;
    use crate::service::fake::FakeService;
    use crate::service::PullRequest;
    use crate::test_utils::{TestRepo, RELEASE_TAG};

    fn project() -> ProjectRef {
        ProjectRef::new("github.com", "packit", "ogr")
    }

    fn lookup_with_pr_760() -> FakeService {
        let mut service = FakeService::new(project());
        service.pull_requests.push(PullRequest {
            id: 760,
            title: "More Specfile.add_patches() changes".to_string(),
            author: "jpopelka".to_string(),
            url: "https://github.com/packit/ogr/pull/760".to_string(),
            description: "Follow-up to #752".to_string(),
            source_branch: "specfile-add_patches".to_string(),
        });
        service
    }

    #[test]
    fn test_parse_merge_subject() {
        assert_eq!(
            parse_merge_subject("Merge pull request #760 from jpopelka/specfile-add_patches"),
            Some((760, "jpopelka".to_string()))
        );
        assert_eq!(
            parse_merge_subject("Merge pull request #1 from some-user/x"),
            Some((1, "some-user".to_string()))
        );
        assert_eq!(parse_merge_subject("Merge branch 'main' into feature"), None);
        assert_eq!(parse_merge_subject("Revert \"Merge pull request #3 from a/b\""), None);
    }

    #[test]
    fn test_synthesize_expands_pull_request_merge() {
        let repo = TestRepo::with_merged_pull_request();
        let lookup = lookup_with_pr_760();

        let entries = synthesize(repo.repo(), &lookup, RELEASE_TAG, "HEAD").unwrap();
        assert_eq!(
            entries,
            vec![
                ChangelogEntry::Merge {
                    pr_id: 760,
                    author: "jpopelka".to_string(),
                    summary: "More Specfile.add_patches() changes".to_string(),
                    description: "Follow-up to #752".to_string(),
                    url: "https://github.com/packit/ogr/pull/760".to_string(),
                    commits: vec!["branch change #2".to_string(), "branch change".to_string()],
                },
                ChangelogEntry::Commit {
                    subject: "line 1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_synthesize_empty_range() {
        let repo = TestRepo::with_merged_pull_request();
        let entries = synthesize(repo.repo(), &lookup_with_pr_760(), "HEAD", "HEAD").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_synthesize_unknown_pull_request_fails() {
        let repo = TestRepo::with_merged_pull_request();
        let lookup = FakeService::new(project());

        let result = synthesize(repo.repo(), &lookup, RELEASE_TAG, "HEAD");
        assert!(matches!(result, Err(UpsintError::Service { .. })));
    }

    #[test]
    fn test_synthesize_invalid_range() {
        let repo = TestRepo::with_merged_pull_request();
        let result = synthesize(repo.repo(), &lookup_with_pr_760(), "nope", "HEAD");
        assert!(matches!(result, Err(UpsintError::RangeQuery(_))));
    }

    #[test]
    fn test_render() {
        let entries = vec![
            ChangelogEntry::Merge {
                pr_id: 760,
                author: "jpopelka".to_string(),
                summary: "More Specfile.add_patches() changes".to_string(),
                description: "Follow-up to \"patches\"".to_string(),
                url: "https://github.com/packit/ogr/pull/760".to_string(),
                commits: vec!["branch change #2".to_string()],
            },
            ChangelogEntry::Commit {
                subject: "line 1".to_string(),
            },
        ];

        let expected = "* More Specfile.add_patches() changes, by [@jpopelka](https://github.com/jpopelka), \
                        [#760](https://github.com/packit/ogr/pull/760)\n\
                        \x20 * description: \"Follow-up to \\\"patches\\\"\"\n\
                        \x20 * commit: branch change #2\n\
                        * line 1\n";
        assert_eq!(render(&entries, &project()), expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[], &project()), "");
    }
}
