//! `checkout-pr`: fetch a single pull request head and check it out.

use crate::error::Result;
use crate::git::{checkout_pr, ReviewRefs};
use crate::output::print_success;
use crate::service::detect_kind;

use super::Context;

pub fn checkout_pr_command(ctx: &Context, remote: Option<&str>, id: u64) -> Result<()> {
    ctx.require_git_repo()?;
    let remote = remote.unwrap_or(ctx.config.default_remote.as_str());

    // GitLab publishes merge requests elsewhere; unknown hosts get GitHub's layout
    let review_refs = ctx
        .project_for_remote(Some(remote))
        .ok()
        .and_then(|project| detect_kind(&project.host, &ctx.config))
        .map_or(ReviewRefs::Pull, |kind| kind.review_refs());

    let branch = checkout_pr(&ctx.repo, remote, id, review_refs)?;
    print_success(&format!("Switched to {}", branch));
    Ok(())
}
