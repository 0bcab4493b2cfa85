//! upsint CLI entry point.
//!
//! Parses command-line arguments, sets up logging and configuration, and
//! dispatches to the appropriate command handler.

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use env_logger::Env;

use upsint::commands::{
    checkout_pr_command, create_pr_command, fork_command, get_changes_command,
    list_branches_command, list_labels_command, list_prs_command, list_tags_command,
    remove_merged_branches_command, status_command, update_labels_command, Context,
    CreatePrOptions,
};
use upsint::config::{load_config, validate_config};
use upsint::git::Repo;
use upsint::output::print_error;
use upsint::service::ServiceKind;
use upsint::{Result, UpsintError};

#[derive(Parser)]
#[command(name = "upsint")]
#[command(
    version,
    about = "Helper for common upstream workflows on GitHub and GitLab",
    after_help = "EXAMPLES:
    # Fork a project and clone the fork with remotes set up
    upsint fork packit/ogr

    # Open a pull request from the current branch
    upsint create-pr

    # CI results of the pull request for the current branch
    upsint status

    # Clean up after merged pull requests
    upsint remove-merged-branches

    # Changelog between the last release and HEAD
    upsint get-changes 0.1.0"
)]
struct Cli {
    /// Print debug logs, including every git/gh/glab invocation
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this configuration file instead of ~/.config/upsint/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fork a repository and clone the fork
    #[command(after_help = "EXAMPLES:
    upsint fork packit/ogr                          # github.com is implied
    upsint fork gitlab.com/group/project

The fork is cloned into <owner>/<repo>; `upstream` points at the parent
project and `origin` at the fork. Pull request heads of both are fetched.")]
    Fork {
        /// Repository to fork: owner/repo, host/namespace/repo or a git URL
        repo: String,
    },

    /// Create a pull request from the current branch
    #[command(after_help = "EXAMPLES:
    upsint create-pr                                # against upstream's default branch
    upsint create-pr upstream release-1.x
    upsint create-pr --title \"Fix typo\" --body \"Found by spellcheck\"

Without --title the subject of the newest commit is used. Without --body the
project's pull request template and the commit messages are used.")]
    CreatePr {
        /// Remote of the project receiving the pull request [default: config `default_remote`]
        target_remote: Option<String>,

        /// Branch to merge into [default: the project's default branch]
        target_branch: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        body: Option<String>,
    },

    /// List open pull requests
    ListPrs {
        /// Repository to query [default: the one behind the default remote]
        repo: Option<String>,
    },

    /// List local branches with their upstream, date and merge status
    ListBranches {
        /// Branch to check merge status against
        #[arg(long, default_value = "master")]
        merged_with: String,
    },

    /// List labels of a repository
    ListLabels {
        /// Repository to query [default: the one behind the default remote]
        repo: Option<String>,
    },

    /// List tags of a repository
    ListTags {
        /// Repository to query [default: the one behind the default remote]
        repo: Option<String>,
    },

    /// Copy labels of a repository to other repositories
    #[command(after_help = "EXAMPLES:
    upsint update-labels packit/ogr packit/upsint
    upsint update-labels --source-repo packit/ogr \"packit/a;packit/b\"
    upsint update-labels --service gitlab group/project

Labels missing in a destination are created; existing ones are left alone.")]
    UpdateLabels {
        /// Repository to copy labels from [default: the one behind the default remote]
        #[arg(long)]
        source_repo: Option<String>,

        /// Service hosting the destinations
        #[arg(short, long, value_enum, default_value_t = ServiceKind::GitHub)]
        service: ServiceKind,

        /// Destination repositories
        #[arg(required = true)]
        destination: Vec<String>,
    },

    /// Remove local branches already merged into a branch
    #[command(after_help = "EXAMPLES:
    upsint remove-merged-branches                   # merged into master
    upsint remove-merged-branches main --yes

Candidates are listed first. Answer y, Y or yolo to delete them; anything
else deletes nothing.")]
    RemoveMergedBranches {
        /// Branch the removed branches were merged into
        #[arg(default_value = "master")]
        merged_with: String,

        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Check out a pull request as pr/<id>
    CheckoutPr {
        /// Remote to fetch the pull request from [default: config `default_remote`]
        #[arg(short, long)]
        remote: Option<String>,

        /// Pull request number
        id: u64,
    },

    /// Print a changelog of a commit range
    #[command(after_help = "EXAMPLES:
    upsint get-changes 0.1.0
    upsint get-changes 0.1.0 0.2.0

Merged pull requests are shown with their author, description and commits.")]
    GetChanges {
        /// Exclusive start of the range
        lower_bound: String,

        /// Inclusive end of the range
        #[arg(default_value = "HEAD")]
        upper_bound: String,
    },

    /// Show the pull request of the current branch and its CI statuses
    #[command(after_help = "EXAMPLES:
    upsint status
    upsint status --with-pr-comments

On a branch without an open pull request, the number of open issues and
pull requests and the latest release are shown instead.")]
    Status {
        /// Also print the comments of the pull request
        #[arg(long)]
        with_pr_comments: bool,
    },

    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Logs go to stderr at `warn`, or `debug` for upsint with `-v`.
/// `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "warn,upsint=debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn context(cli: &Cli) -> Result<Context> {
    let config = load_config(cli.config.as_deref())?;
    validate_config(&config).map_err(|e| UpsintError::Config(e.to_string()))?;

    let root = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    Ok(Context::new(Repo::new(root), config))
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "upsint", &mut io::stdout());
        return Ok(());
    }

    let ctx = context(&cli)?;
    match cli.command {
        Commands::Fork { repo } => fork_command(&ctx, &repo),
        Commands::CreatePr {
            target_remote,
            target_branch,
            title,
            body,
        } => create_pr_command(
            &ctx,
            &CreatePrOptions {
                target_remote,
                target_branch,
                title,
                body,
            },
        ),
        Commands::ListPrs { repo } => list_prs_command(&ctx, repo.as_deref()),
        Commands::ListBranches { merged_with } => list_branches_command(&ctx, &merged_with),
        Commands::ListLabels { repo } => list_labels_command(&ctx, repo.as_deref()),
        Commands::ListTags { repo } => list_tags_command(&ctx, repo.as_deref()),
        Commands::UpdateLabels {
            source_repo,
            service,
            destination,
        } => update_labels_command(&ctx, source_repo.as_deref(), service, &destination),
        Commands::RemoveMergedBranches { merged_with, yes } => {
            remove_merged_branches_command(&ctx, &merged_with, yes)
        }
        Commands::CheckoutPr { remote, id } => checkout_pr_command(&ctx, remote.as_deref(), id),
        Commands::GetChanges {
            lower_bound,
            upper_bound,
        } => get_changes_command(&ctx, &lower_bound, &upper_bound),
        Commands::Status { with_pr_comments } => status_command(&ctx, with_pr_comments),
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}
