//! `list-branches` and `remove-merged-branches`.

use crate::error::Result;
use crate::git::{list_local_branches, remove_branch, select_removable_branches, Repo};
use crate::output::{print_branches, print_info, GRAY, GREEN, RESET};
use crate::prompt;

use super::Context;

pub fn list_branches_command(ctx: &Context, merged_with: &str) -> Result<()> {
    ctx.require_git_repo()?;
    let records = list_local_branches(&ctx.repo, merged_with)?;
    print_branches(&records);
    Ok(())
}

/// Delete the local branches merged into `merged_with` once `confirm`
/// approves the candidate list. Returns the deleted branches.
///
/// Nothing is deleted when there are no candidates or `confirm` says no.
pub fn remove_merged_branches_with<F>(
    repo: &Repo,
    merged_with: &str,
    confirm: F,
) -> Result<Vec<String>>
where
    F: FnOnce(&[String]) -> std::io::Result<bool>,
{
    let records = list_local_branches(repo, merged_with)?;
    let candidates = select_removable_branches(&records, merged_with);
    if candidates.is_empty() || !confirm(&candidates)? {
        return Ok(Vec::new());
    }

    for branch in &candidates {
        remove_branch(repo, branch)?;
    }
    Ok(candidates)
}

pub fn remove_merged_branches_command(
    ctx: &Context,
    merged_with: &str,
    assume_yes: bool,
) -> Result<()> {
    ctx.require_git_repo()?;

    let mut had_candidates = false;
    let mut declined = false;
    let removed = remove_merged_branches_with(&ctx.repo, merged_with, |candidates| {
        had_candidates = true;
        let approved = assume_yes || prompt::confirm_removal(candidates)?;
        declined = !approved;
        Ok(approved)
    })?;

    if !had_candidates {
        print_info("Nothing to remove.");
    } else if declined {
        println!("{GRAY}Doing nothing, stay safe my friend.{RESET}");
    } else {
        for branch in &removed {
            println!("{GREEN}Removed{RESET} {}", branch);
        }
    }
    Ok(())
}
