//! `create-pr`: open a pull request from the current branch of the fork.

use crate::error::{Result, UpsintError};
use crate::git::FALLBACK_REMOTE;
use crate::service::{GitService, NewPullRequest};

use super::Context;

/// What the command line can override when opening a pull request.
#[derive(Debug, Clone, Default)]
pub struct CreatePrOptions {
    /// Remote of the project receiving the pull request
    pub target_remote: Option<String>,
    /// Branch the changes go into, the project's default branch if unset
    pub target_branch: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Pull request description: the project's template (if any) followed by
/// the messages of the commits being proposed.
pub fn assemble_pr_body(commit_msgs: &str, template: Option<&str>) -> String {
    match template.map(str::trim_end).filter(|t| !t.is_empty()) {
        Some(template) => format!("{}\n\n{}", template, commit_msgs),
        None => commit_msgs.to_string(),
    }
}

/// Open the pull request through `service` and return its URL.
pub fn create_pr_with(
    ctx: &Context,
    service: &dyn GitService,
    opts: &CreatePrOptions,
) -> Result<String> {
    let user = service.current_user()?;

    let target_branch = match &opts.target_branch {
        Some(branch) => branch.clone(),
        None => {
            let branch = service.default_branch()?;
            log::info!("Branch not specified, using {}.", branch);
            branch
        }
    };
    let target_remote = opts
        .target_remote
        .as_deref()
        .unwrap_or(ctx.config.default_remote.as_str());

    let source_branch = ctx.repo.current_branch()?;
    if ctx.config.push_when_creating_pr {
        ctx.repo.push_branch(FALLBACK_REMOTE, &source_branch)?;
    }

    let base = format!("{}/{}", target_remote, target_branch);
    let commit_msgs = ctx.repo.commit_messages_since(&base)?;
    if commit_msgs.is_empty() {
        return Err(UpsintError::Git(format!(
            "no commits between {} and {}",
            base, source_branch
        )));
    }

    let title = match &opts.title {
        Some(title) => title.clone(),
        None => commit_msgs.lines().next().unwrap_or_default().trim().to_string(),
    };
    let body = match &opts.body {
        Some(body) => body.clone(),
        None => {
            let template = service.pull_request_template()?;
            if template.is_none() {
                log::debug!("No PR template found.");
            }
            assemble_pr_body(&commit_msgs, template.as_deref())
        }
    };

    service.create_pull_request(&NewPullRequest {
        title,
        body,
        target_branch,
        source_branch,
        source_owner: user,
    })
}

pub fn create_pr_command(ctx: &Context, opts: &CreatePrOptions) -> Result<()> {
    let project = ctx.project_for_remote(opts.target_remote.as_deref())?;
    let service = ctx.service(project)?;

    let url = create_pr_with(ctx, service.as_ref(), opts)?;
    log::info!("PR link: {}", url);
    println!("{}", url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::service::fake::FakeService;
    use crate::service::ProjectRef;
    use crate::test_utils::TestRepo;

    fn feature_branch_repo() -> TestRepo {
        let repo = TestRepo::new();
        let base = repo.commit("initial commit", "2020-01-01T10:00:00+00:00");
        repo.git(&["update-ref", "refs/remotes/upstream/main", &base]);
        repo.git(&["checkout", "-b", "feature"]);
        repo.commit("Add the thing\n\nIt was missing.", "2020-01-02T10:00:00+00:00");
        repo
    }

    fn context(repo: &TestRepo) -> Context {
        let config = Config {
            push_when_creating_pr: false,
            ..Config::default()
        };
        Context::new(repo.repo().clone(), config)
    }

    fn service() -> FakeService {
        FakeService::new(ProjectRef::new("github.com", "packit", "upsint"))
    }

    #[test]
    fn test_assemble_pr_body() {
        assert_eq!(assemble_pr_body("fix it", None), "fix it");
        assert_eq!(assemble_pr_body("fix it", Some("  \n")), "fix it");
        assert_eq!(
            assemble_pr_body("fix it", Some("## Checklist\n- [ ] tests\n")),
            "## Checklist\n- [ ] tests\n\nfix it"
        );
    }

    #[test]
    fn test_create_pr_from_commit_messages() {
        let repo = feature_branch_repo();
        let ctx = context(&repo);
        let mut service = service();
        service.template = Some("Template".to_string());

        let url = create_pr_with(&ctx, &service, &CreatePrOptions::default()).unwrap();
        assert_eq!(url, "https://github.com/packit/upsint/pull/1");

        let created = service.created_prs.borrow();
        assert_eq!(created.len(), 1);
        let pr = &created[0];
        assert_eq!(pr.title, "Add the thing");
        assert_eq!(pr.body, "Template\n\nAdd the thing\n\nIt was missing.");
        assert_eq!(pr.target_branch, "main");
        assert_eq!(pr.source_branch, "feature");
        assert_eq!(pr.source_owner, "me");
    }

    #[test]
    fn test_create_pr_with_explicit_text() {
        let repo = feature_branch_repo();
        let ctx = context(&repo);
        let service = service();

        let opts = CreatePrOptions {
            title: Some("Custom title".to_string()),
            body: Some("Custom body".to_string()),
            ..CreatePrOptions::default()
        };
        create_pr_with(&ctx, &service, &opts).unwrap();

        let created = service.created_prs.borrow();
        assert_eq!(created[0].title, "Custom title");
        assert_eq!(created[0].body, "Custom body");
    }

    #[test]
    fn test_create_pr_without_commits_fails() {
        let repo = feature_branch_repo();
        repo.git(&["update-ref", "refs/remotes/upstream/main", "HEAD"]);
        let ctx = context(&repo);
        let service = service();

        let result = create_pr_with(&ctx, &service, &CreatePrOptions::default());
        assert!(matches!(result, Err(UpsintError::Git(_))));
        assert!(service.created_prs.borrow().is_empty());
    }

    #[test]
    fn test_create_pr_unknown_target_branch_fails() {
        let repo = feature_branch_repo();
        let ctx = context(&repo);
        let opts = CreatePrOptions {
            target_branch: Some("nope".to_string()),
            ..CreatePrOptions::default()
        };
        assert!(create_pr_with(&ctx, &service(), &opts).is_err());
    }
}
