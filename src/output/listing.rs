//! Tables for the `list-*` commands.

use super::colors::*;
use super::table::Table;
use crate::git::BranchRecord;
use crate::service::{Label, PullRequest, Tag};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M %:z";

pub fn branch_table(records: &[BranchRecord]) -> Table {
    let mut table = Table::new(["Branch", "Upstream", "Last commit", "Tracking", "Merged"]);
    for record in records {
        table.add_row([
            record.name.clone(),
            record.remote_tracking.clone(),
            record.last_commit_date.format(DATE_FORMAT).to_string(),
            record.tracking_status.clone(),
            if record.merged { "yes" } else { "" }.to_string(),
        ]);
    }
    table
}

pub fn pull_request_table(prs: &[PullRequest]) -> Table {
    let mut table = Table::new(["#", "Title", "Author", "URL"]);
    for pr in prs {
        table.add_row([
            format!("#{}", pr.id),
            pr.title.clone(),
            format!("@{}", pr.author),
            pr.url.clone(),
        ]);
    }
    table
}

pub fn label_table(labels: &[Label]) -> Table {
    let mut table = Table::new(["Name", "Color", "Description"]);
    for label in labels {
        table.add_row([
            label.name.clone(),
            format!("#{}", label.color),
            label.description.clone(),
        ]);
    }
    table
}

pub fn tag_table(tags: &[Tag]) -> Table {
    let mut table = Table::new(["Tag", "Commit"]);
    for tag in tags {
        table.add_row([tag.name.clone(), tag.commit_sha.clone()]);
    }
    table
}

fn print_table_or(table: &Table, empty_message: &str) {
    if table.is_empty() {
        println!("{GRAY}{}{RESET}", empty_message);
    } else {
        print!("{}", table.render(true));
    }
}

pub fn print_branches(records: &[BranchRecord]) {
    print_table_or(&branch_table(records), "No local branches.");
}

pub fn print_pull_requests(prs: &[PullRequest]) {
    print_table_or(&pull_request_table(prs), "No open pull requests.");
}

pub fn print_labels(labels: &[Label]) {
    print_table_or(&label_table(labels), "No labels.");
}

pub fn print_tags(tags: &[Tag]) {
    print_table_or(&tag_table(tags), "No tags.");
}
