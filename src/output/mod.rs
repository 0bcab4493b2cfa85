//! Terminal output formatting for upsint.
//!
//! - [`messages`] - Error, warning, info and success messages
//! - [`table`] - Column-aligned plain text tables
//! - [`listing`] - Tables for branches, pull requests, labels and tags

pub mod listing;
pub mod messages;
pub mod table;

/// ANSI color codes for terminal output.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    pub const GRAY: &str = "\x1b[90m";
}

pub use colors::*;

pub use listing::{
    branch_table, label_table, print_branches, print_labels, print_pull_requests, print_tags,
    pull_request_table, tag_table,
};
pub use messages::{print_error, print_info, print_success, print_warning};
pub use table::Table;
