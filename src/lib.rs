pub mod changelog;
pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod output;
pub mod prompt;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

pub use changelog::ChangelogEntry;
pub use config::Config;
pub use error::{Result, UpsintError};
pub use git::{BranchRecord, CommitId, CommitMetadata, Repo};
