//! `fork`: fork a project, clone the fork and wire up remotes.

use crate::error::Result;
use crate::git::{clone_into, fetch_all, set_origin_remote, set_upstream_remote, Repo};
use crate::output::{print_success, print_warning};
use crate::service::{GitService, ProjectRef, ServiceKind};

use super::Context;

/// The fork to clone: the project itself when the user owns it, a (possibly
/// freshly created) fork otherwise.
pub(crate) fn fork_target(service: &dyn GitService) -> Result<ProjectRef> {
    let user = service.current_user()?;
    let project = service.project();
    if project.namespace == user {
        print_warning(&format!("{} is your own project, cloning it without forking", project));
        return Ok(project.clone());
    }

    // Services name the fork after the parent; only the namespace changes.
    let fork = service.fork()?;
    Ok(fork.with_namespace(user))
}

/// Clone `fork` under `<parent namespace>/<name>` and point `upstream` at
/// `parent`, `origin` at the fork.
pub(crate) fn clone_fork(
    workdir: &Repo,
    parent: &ProjectRef,
    fork: &ProjectRef,
    kind: ServiceKind,
) -> Result<Repo> {
    let parent_dir = workdir.root().join(&parent.namespace);
    let repo = clone_into(&parent_dir, &fork.ssh_url(), &parent.name)?;

    set_upstream_remote(&repo, &parent.https_url(), &parent.ssh_url(), kind.review_refs())?;
    set_origin_remote(&repo, &fork.ssh_url(), kind.review_refs())?;
    fetch_all(&repo)?;
    Ok(repo)
}

pub fn fork_command(ctx: &Context, repo: &str) -> Result<()> {
    let parent = ProjectRef::from_arg(repo, ServiceKind::GitHub.default_host())?;
    let service = ctx.service(parent.clone())?;

    let fork = fork_target(service.as_ref())?;
    let cloned = clone_fork(&ctx.repo, &parent, &fork, service.kind())?;

    print_success(&format!(
        "Cloned {} into {}",
        fork,
        cloned.root().display()
    ));
    Ok(())
}
