use std::fmt;
use std::ops::Range;

use strum_macros::IntoStaticStr;

use crate::path::Path;

/// Represents a problem found while reading LaTeX.
///
/// None of these stop the parse: the parser recovers and records the error next to the tree it
/// produced.
#[derive(Debug, Clone, PartialEq)]
pub struct LatexError(pub Range<usize>, pub LatexErrKind);

#[derive(Debug, Clone, PartialEq)]
pub enum LatexErrKind {
    UnclosedGroup,
    UnmatchedClose,
    DisallowedChar(char),
    UnknownCommand(Box<str>),
    InvalidArgumentCount {
        command: Box<str>,
        expected: u8,
        found: u8,
    },
    ExpectedArgument,
    DuplicateSubOrSup,
    UnknownEnvironment(Box<str>),
    MismatchedEnvironment {
        expected: Box<str>,
        got: Box<str>,
    },
    UnclosedEnvironment(Box<str>),
    InvalidShortcut(Box<str>),
}

/// The broad kind of a [`LatexError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCategory {
    /// The source text is malformed at the character level.
    LexError,
    /// A control sequence is not in the command table.
    UnknownCommand,
    /// A command is missing some of its arguments.
    InvalidArgumentCount,
    /// Scripts, environments or configuration are structured incorrectly.
    Structure,
}

impl LatexErrKind {
    /// Returns the error message as a string.
    pub fn string(&self) -> String {
        match self {
            LatexErrKind::UnclosedGroup => "Expected token \"}\", but not found.".to_string(),
            LatexErrKind::UnmatchedClose => "Unmatched closing token.".to_string(),
            LatexErrKind::DisallowedChar(got) => {
                let mut text = "Disallowed character: '".to_string();
                text.extend(got.escape_debug());
                text += "'.";
                text
            }
            LatexErrKind::UnknownCommand(cmd) => "Unknown command \"".to_string() + cmd + "\".",
            LatexErrKind::InvalidArgumentCount {
                command,
                expected,
                found,
            } => format!("\"{command}\" expects {expected} argument(s), but got {found}."),
            LatexErrKind::ExpectedArgument => "Expected argument but found none.".to_string(),
            LatexErrKind::DuplicateSubOrSup => "Duplicate subscript or superscript.".to_string(),
            LatexErrKind::UnknownEnvironment(environment) => {
                "Unknown environment \"".to_string() + environment + "\"."
            }
            LatexErrKind::MismatchedEnvironment { expected, got } => {
                "Expected \"\\end{".to_string() + expected + "}\", but got \"\\end{" + got + "}\"."
            }
            LatexErrKind::UnclosedEnvironment(environment) => {
                "Environment \"".to_string() + environment + "\" is never closed."
            }
            LatexErrKind::InvalidShortcut(trigger) => {
                "Invalid inline shortcut \"".to_string() + trigger + "\"."
            }
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LatexErrKind::UnclosedGroup
            | LatexErrKind::UnmatchedClose
            | LatexErrKind::DisallowedChar(_) => ErrorCategory::LexError,
            LatexErrKind::UnknownCommand(_) => ErrorCategory::UnknownCommand,
            LatexErrKind::InvalidArgumentCount { .. } | LatexErrKind::ExpectedArgument => {
                ErrorCategory::InvalidArgumentCount
            }
            LatexErrKind::DuplicateSubOrSup
            | LatexErrKind::UnknownEnvironment(_)
            | LatexErrKind::MismatchedEnvironment { .. }
            | LatexErrKind::UnclosedEnvironment(_)
            | LatexErrKind::InvalidShortcut(_) => ErrorCategory::Structure,
        }
    }
}

impl LatexError {
    pub fn error_message(&self) -> String {
        self.1.string()
    }

    #[inline]
    pub fn kind(&self) -> &LatexErrKind {
        &self.1
    }

    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.1.category()
    }
}

#[cfg(feature = "ariadne")]
impl LatexError {
    /// Convert this error into an [`ariadne::Report`] for pretty-printing.
    pub fn to_report<'name>(
        &self,
        source_name: &'name str,
        with_color: bool,
    ) -> ariadne::Report<'static, (&'name str, Range<usize>)> {
        use ariadne::{Label, Report, ReportKind};

        let label_msg = match &self.1 {
            LatexErrKind::UnclosedGroup => "this group is never closed".to_string(),
            LatexErrKind::UnmatchedClose => "unmatched \"}\"".to_string(),
            LatexErrKind::DisallowedChar(_) => "disallowed character".to_string(),
            LatexErrKind::UnknownCommand(_) => "unknown command".to_string(),
            LatexErrKind::InvalidArgumentCount { expected, .. } => {
                format!("expected {expected} argument(s) after this")
            }
            LatexErrKind::ExpectedArgument => "expected an argument here".to_string(),
            LatexErrKind::DuplicateSubOrSup => "duplicate".to_string(),
            LatexErrKind::UnknownEnvironment(_) => "unknown environment".to_string(),
            LatexErrKind::MismatchedEnvironment { expected, .. } => {
                format!("expected \"\\end{{{expected}}}\" here")
            }
            LatexErrKind::UnclosedEnvironment(_) => "this environment is never closed".to_string(),
            LatexErrKind::InvalidShortcut(_) => "invalid shortcut".to_string(),
        };

        let mut config = ariadne::Config::default().with_index_type(ariadne::IndexType::Byte);
        if !with_color {
            config = config.with_color(false);
        }
        Report::build(ReportKind::Error, (source_name, self.0.start..self.0.start))
            .with_config(config)
            .with_message(self.1.string())
            .with_label(Label::new((source_name, self.0.clone())).with_message(label_msg))
            .finish()
    }
}

impl fmt::Display for LatexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0.start, self.1.string())
    }
}

impl std::error::Error for LatexError {}

/// Why an editor operation was refused. The tree is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The path does not resolve in the current tree.
    InvalidPath(Path),
    /// The command name is not known.
    UnknownCommand(Box<str>),
    /// An argument given to a named command could not be interpreted.
    InvalidArgument {
        command: Box<str>,
        argument: Box<str>,
    },
    /// There is nothing to undo or redo.
    EmptyHistory,
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::InvalidPath(path) => write!(f, "Path \"{path}\" does not resolve."),
            EditError::UnknownCommand(name) => write!(f, "Unknown editor command \"{name}\"."),
            EditError::InvalidArgument { command, argument } => {
                write!(f, "Invalid argument \"{argument}\" for \"{command}\".")
            }
            EditError::EmptyHistory => f.write_str("Nothing to undo or redo."),
        }
    }
}

impl std::error::Error for EditError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        let err = LatexError(0..1, LatexErrKind::UnclosedGroup);
        assert_eq!(err.category(), ErrorCategory::LexError);
        let err = LatexError(
            0..5,
            LatexErrKind::InvalidArgumentCount {
                command: r"\frac".into(),
                expected: 2,
                found: 1,
            },
        );
        assert_eq!(err.category(), ErrorCategory::InvalidArgumentCount);
        assert_eq!(
            err.to_string(),
            r#"0: "\frac" expects 2 argument(s), but got 1."#
        );
        assert_eq!(<&str>::from(ErrorCategory::LexError), "lex-error");
    }

    #[test]
    fn disallowed_char_is_escaped() {
        let err = LatexError(3..4, LatexErrKind::DisallowedChar('\0'));
        assert_eq!(err.error_message(), r"Disallowed character: '\0'.");
    }
}
