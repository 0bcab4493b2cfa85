use std::io::{self, BufRead, Write};

use crate::output::{BOLD, CYAN, GRAY, RESET};

/// Whether a confirmation answer means "go ahead".
///
/// Only `y`, `Y` and `yolo` do; anything else, including an empty answer,
/// is a no.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yolo")
}

/// Ask a yes/no question on `output` and read the answer from `input`.
///
/// End of input counts as a no.
pub fn confirm_with<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{CYAN}?{RESET} {} {GRAY}[y/N]{RESET} ", question)?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(is_affirmative(&answer))
}

/// List the branches about to be deleted and ask for confirmation on the terminal.
pub fn confirm_removal(branches: &[String]) -> io::Result<bool> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Branches to be removed:")?;
    for branch in branches {
        writeln!(out, "  {BOLD}{}{RESET}", branch)?;
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    confirm_with("Do you want to continue?", &mut input, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y\n"));
        assert!(is_affirmative("yolo"));

        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative("YOLO"));
    }

    #[test]
    fn test_confirm_with_reads_one_answer() {
        let mut input = Cursor::new("yolo\nn\n");
        let mut output = Vec::new();

        assert!(confirm_with("Delete?", &mut input, &mut output).unwrap());
        assert!(!confirm_with("Delete?", &mut input, &mut output).unwrap());

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Delete?"));
    }

    #[test]
    fn test_confirm_with_eof_is_no() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert!(!confirm_with("Delete?", &mut input, &mut output).unwrap());
    }
}
