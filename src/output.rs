use std::cell::RefCell;
use std::path::Path;
use std::str::Chars;

use colored::{ColoredString, Colorize};

/// Where terminal text is sent.
///
/// Program output (`PRN`) is written by the runtime to its own sink, so both
/// channels here go to stderr and never interleave with what the program prints.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Status lines such as `Loading` or `Halted`
    Status(MsgColor),
    /// Trace lines and other debugging text
    Diagnostic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match (self, Self::is_minimal()) {
            // Status lines are noise for blackbox tests
            (Self::Status(_), true) => (),
            (Self::Status(_), false) => eprint!("{}", string),
            (Self::Diagnostic, false) => eprint!("{}", ColoredString::from(string).blue()),
            // Always remove color if `--minimal`
            (Self::Diagnostic, true) => eprint_colorless(string),
        }
    }

    /// Print a right-aligned colored verb followed by a description.
    pub fn message(&self, left: &str, right: &str) {
        let left = match self {
            Self::Status(MsgColor::Green) => left.green(),
            Self::Status(MsgColor::Cyan) => left.cyan(),
            Self::Status(MsgColor::Red) => left.red(),
            Self::Diagnostic => left.blue(),
        };
        self.print_str(&format!("{left:>12} {right}\n"));
    }

    pub fn file_message(&self, left: &str, path: &Path) {
        self.message(left, &format!("target {}", path.display()));
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl Iterator for Decolored<'_> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    let string: String = Decolored::new(string).collect();
    eprint!("{}", string);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decolored() {
        assert_eq!(Decolored::new("TRACE: 00").collect::<String>(), "TRACE: 00");
        assert_eq!(
            Decolored::new("\x1b[34mTRACE: 00 |\x1b[0m").collect::<String>(),
            "TRACE: 00 |"
        );
        assert_eq!(Decolored::new("R0 08\x1b[0xyz").collect::<String>(), "R0 08");
    }

    #[test]
    fn minimal_is_per_thread() {
        assert!(!Output::is_minimal());
        assert!(!Output::set_minimal(true));
        assert!(Output::is_minimal());
        assert!(Output::set_minimal(false));
    }
}
