//! `get-changes`: changelog-like summary of a commit range.

use crate::changelog;
use crate::error::Result;

use super::Context;

pub fn get_changes_command(ctx: &Context, lower_bound: &str, upper_bound: &str) -> Result<()> {
    let project = ctx.project_for_remote(None)?;
    let service = ctx.service(project.clone())?;

    let entries = changelog::synthesize(&ctx.repo, service.as_ref(), lower_bound, upper_bound)?;
    print!("{}", changelog::render(&entries, &project));
    Ok(())
}
