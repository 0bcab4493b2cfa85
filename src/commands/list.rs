//! `list-prs`, `list-labels` and `list-tags`.

use crate::error::Result;
use crate::output::{print_labels, print_pull_requests, print_tags};

use super::Context;

pub fn list_prs_command(ctx: &Context, repo: Option<&str>) -> Result<()> {
    let service = ctx.service(ctx.project_for_arg(repo)?)?;
    print_pull_requests(&service.list_pull_requests()?);
    Ok(())
}

pub fn list_labels_command(ctx: &Context, repo: Option<&str>) -> Result<()> {
    let service = ctx.service(ctx.project_for_arg(repo)?)?;
    print_labels(&service.list_labels()?);
    Ok(())
}

pub fn list_tags_command(ctx: &Context, repo: Option<&str>) -> Result<()> {
    let service = ctx.service(ctx.project_for_arg(repo)?)?;
    print_tags(&service.list_tags()?);
    Ok(())
}
