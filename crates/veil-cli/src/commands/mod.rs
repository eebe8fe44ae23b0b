//! CLI commands.

use std::io::Read;
use std::sync::atomic::{AtomicU8, Ordering};

pub mod model;
pub mod prompt;
pub mod redact;
pub mod status;

/// Use `text` if given, otherwise read all of stdin.
pub(crate) fn read_input(text: Option<&str>) -> miette::Result<String> {
    match text {
        Some(text) => non_blank(text.to_string()),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| miette::miette!("Failed to read stdin: {}", e))?;
            non_blank(buf)
        }
    }
}

/// Reject whitespace-only input; anything else is passed through untouched.
fn non_blank(input: String) -> miette::Result<String> {
    if input.trim().is_empty() {
        return Err(miette::miette!("No input given"));
    }
    Ok(input)
}

/// Prints a download line to stderr each time the percentage changes.
pub(crate) struct ProgressPrinter {
    last: AtomicU8,
}

impl ProgressPrinter {
    pub(crate) fn new() -> Self {
        Self {
            last: AtomicU8::new(u8::MAX),
        }
    }

    pub(crate) fn report(&self, percent: u8) {
        if self.last.swap(percent, Ordering::Relaxed) != percent {
            eprintln!("Downloading model... {}%", percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kept_verbatim() {
        let input = read_input(Some("  indented\nprompt \n")).unwrap();
        assert_eq!(input, "  indented\nprompt \n");
    }

    #[test]
    fn test_blank_input_rejected() {
        assert!(read_input(Some("")).is_err());
        assert!(read_input(Some(" \n\t")).is_err());
    }
}
