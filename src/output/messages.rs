//! Basic message output functions.

use super::colors::*;

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{RED}{BOLD}Error:{RESET} {}", msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    println!("{YELLOW}Warning:{RESET} {}", msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{CYAN}Info:{RESET} {}", msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{GREEN}{}{RESET}", msg);
}
