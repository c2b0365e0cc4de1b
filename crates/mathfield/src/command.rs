//! The closed set of operations a mathfield performs.
//!
//! Key bindings, menus and scripted input all end up as a [`Command`]. Commands can also be
//! named by a selector string with positional arguments, see [`Command::from_selector`].

use strum_macros::{EnumString, IntoStaticStr};

use crate::editor::{Direction, InsertFormat, InsertOptions, SelectionMode};
use crate::error::EditError;
use crate::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum Command<'a> {
    MoveToNextChar,
    MoveToPreviousChar,
    MoveToNextPlaceholder,
    MoveToPreviousPlaceholder,
    MoveToSuperscript,
    MoveToSubscript,
    MoveUp,
    MoveDown,
    MoveToGroupStart,
    MoveToGroupEnd,
    MoveToMathfieldStart,
    MoveToMathfieldEnd,
    SetRange {
        anchor: Path,
        focus: Path,
    },
    SelectAll,
    SelectGroup,
    ExtendToNextChar,
    ExtendToPreviousChar,
    Insert {
        text: &'a str,
        options: InsertOptions,
    },
    Delete {
        direction: Direction,
        count: usize,
    },
    PromoteToSuperscript,
    PromoteToSubscript,
    EnterCommandMode,
    CompleteCommand,
    ExitCommandMode,
    AcceptSuggestion,
    InsertSuggestion {
        text: &'a str,
        trim_from_end: usize,
    },
    RemoveSuggestion,
    CommitCommandString,
    DecorateCommandString {
        error: bool,
    },
    Undo,
    Redo,
    Snapshot,
}

/// Operation names accepted by [`Command::from_selector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
enum Selector {
    MoveToNextChar,
    MoveToPreviousChar,
    MoveToNextPlaceholder,
    MoveToPreviousPlaceholder,
    MoveToSuperscript,
    MoveToSubscript,
    MoveUp,
    MoveDown,
    MoveToGroupStart,
    MoveToGroupEnd,
    MoveToMathfieldStart,
    MoveToMathfieldEnd,
    SetRange,
    SelectAll,
    SelectGroup,
    ExtendToNextChar,
    ExtendToPreviousChar,
    Insert,
    Delete,
    DeleteBackward,
    DeleteForward,
    PromoteToSuperscript,
    PromoteToSubscript,
    EnterCommandMode,
    CompleteCommand,
    ExitCommandMode,
    AcceptSuggestion,
    InsertSuggestion,
    RemoveSuggestion,
    CommitCommandString,
    DecorateCommandString,
    Undo,
    Redo,
    Snapshot,
    /// Wraps the selection, or the implicit argument, in `\mathbb`.
    Blackboard,
}

impl<'a> Command<'a> {
    /// Builds a command from an operation name like `moveToNextChar` and its arguments.
    ///
    /// ```rust
    /// use mathfield::command::Command;
    /// use mathfield::editor::Direction;
    ///
    /// let command = Command::from_selector("delete", &["forward", "2"]).unwrap();
    /// assert_eq!(command, Command::Delete { direction: Direction::Forward, count: 2 });
    /// ```
    pub fn from_selector(name: &str, args: &[&'a str]) -> Result<Command<'a>, EditError> {
        let selector: Selector = name
            .parse()
            .map_err(|_| EditError::UnknownCommand(name.into()))?;
        let arguments = Arguments { name, args };
        let command = match selector {
            Selector::MoveToNextChar => Command::MoveToNextChar,
            Selector::MoveToPreviousChar => Command::MoveToPreviousChar,
            Selector::MoveToNextPlaceholder => Command::MoveToNextPlaceholder,
            Selector::MoveToPreviousPlaceholder => Command::MoveToPreviousPlaceholder,
            Selector::MoveToSuperscript => Command::MoveToSuperscript,
            Selector::MoveToSubscript => Command::MoveToSubscript,
            Selector::MoveUp => Command::MoveUp,
            Selector::MoveDown => Command::MoveDown,
            Selector::MoveToGroupStart => Command::MoveToGroupStart,
            Selector::MoveToGroupEnd => Command::MoveToGroupEnd,
            Selector::MoveToMathfieldStart => Command::MoveToMathfieldStart,
            Selector::MoveToMathfieldEnd => Command::MoveToMathfieldEnd,
            Selector::SetRange => {
                let anchor: Path = arguments.parse(0)?;
                let focus = match arguments.get(1) {
                    Some(_) => arguments.parse(1)?,
                    None => anchor.clone(),
                };
                Command::SetRange { anchor, focus }
            }
            Selector::SelectAll => Command::SelectAll,
            Selector::SelectGroup => Command::SelectGroup,
            Selector::ExtendToNextChar => Command::ExtendToNextChar,
            Selector::ExtendToPreviousChar => Command::ExtendToPreviousChar,
            Selector::Insert => Command::Insert {
                text: arguments.required(0)?,
                options: InsertOptions {
                    selection_mode: arguments.parse_or(1, SelectionMode::default())?,
                    format: arguments.parse_or(2, InsertFormat::default())?,
                },
            },
            Selector::Delete => Command::Delete {
                direction: arguments.parse_or(0, Direction::Backward)?,
                count: arguments.parse_or(1, 1)?,
            },
            Selector::DeleteBackward => Command::Delete {
                direction: Direction::Backward,
                count: arguments.parse_or(0, 1)?,
            },
            Selector::DeleteForward => Command::Delete {
                direction: Direction::Forward,
                count: arguments.parse_or(0, 1)?,
            },
            Selector::PromoteToSuperscript => Command::PromoteToSuperscript,
            Selector::PromoteToSubscript => Command::PromoteToSubscript,
            Selector::EnterCommandMode => Command::EnterCommandMode,
            Selector::CompleteCommand => Command::CompleteCommand,
            Selector::ExitCommandMode => Command::ExitCommandMode,
            Selector::AcceptSuggestion => Command::AcceptSuggestion,
            Selector::InsertSuggestion => Command::InsertSuggestion {
                text: arguments.required(0)?,
                trim_from_end: arguments.parse_or(1, 0)?,
            },
            Selector::RemoveSuggestion => Command::RemoveSuggestion,
            Selector::CommitCommandString => Command::CommitCommandString,
            Selector::DecorateCommandString => Command::DecorateCommandString {
                error: arguments.parse_or(0, true)?,
            },
            Selector::Undo => Command::Undo,
            Selector::Redo => Command::Redo,
            Selector::Snapshot => Command::Snapshot,
            Selector::Blackboard => Command::Insert {
                text: r"\mathbb{#@}",
                options: InsertOptions::latex(SelectionMode::Placeholder),
            },
        };
        Ok(command)
    }

    /// Whether the command may change the tree, so that an undo snapshot is taken first.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Insert { .. }
                | Command::Delete { .. }
                | Command::PromoteToSuperscript
                | Command::PromoteToSubscript
                | Command::MoveToSuperscript
                | Command::MoveToSubscript
                | Command::EnterCommandMode
                | Command::CompleteCommand
        )
    }
}

/// The positional arguments of a selector.
struct Arguments<'n, 'a> {
    name: &'n str,
    args: &'n [&'a str],
}

impl<'a> Arguments<'_, 'a> {
    fn get(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    fn invalid(&self, argument: &str) -> EditError {
        EditError::InvalidArgument {
            command: self.name.into(),
            argument: argument.into(),
        }
    }

    fn required(&self, index: usize) -> Result<&'a str, EditError> {
        self.get(index).ok_or_else(|| self.invalid(""))
    }

    fn parse<T: std::str::FromStr>(&self, index: usize) -> Result<T, EditError> {
        let arg = self.required(index)?;
        arg.parse().map_err(|_| self.invalid(arg))
    }

    fn parse_or<T: std::str::FromStr>(&self, index: usize, default: T) -> Result<T, EditError> {
        match self.get(index) {
            Some(_) => self.parse(index),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_selectors() {
        assert_eq!(
            Command::from_selector("moveToNextChar", &[]),
            Ok(Command::MoveToNextChar)
        );
        assert_eq!(
            Command::from_selector("selectGroup", &["ignored"]),
            Ok(Command::SelectGroup)
        );
        assert_eq!(<&str>::from(Selector::MoveToMathfieldEnd), "moveToMathfieldEnd");
    }

    #[test]
    fn selectors_with_arguments() {
        assert_eq!(
            Command::from_selector("insert", &[r"\frac{#@}{#?}", "item"]),
            Ok(Command::Insert {
                text: r"\frac{#@}{#?}",
                options: InsertOptions {
                    selection_mode: SelectionMode::Item,
                    format: InsertFormat::Auto,
                },
            })
        );
        assert_eq!(
            Command::from_selector("setRange", &["body:0", "body:2/numerator:-1"]),
            Ok(Command::SetRange {
                anchor: Path::in_root(0),
                focus: "body:2/numerator:-1".parse().unwrap(),
            })
        );
        assert_eq!(
            Command::from_selector("deleteBackward", &[]),
            Ok(Command::Delete {
                direction: Direction::Backward,
                count: 1,
            })
        );
        assert_eq!(
            Command::from_selector("decorateCommandString", &["false"]),
            Ok(Command::DecorateCommandString { error: false })
        );
    }

    #[test]
    fn blackboard_wraps_the_selection() {
        let command = Command::from_selector("blackboard", &[]).unwrap();
        assert!(command.is_mutation());
        assert!(matches!(
            command,
            Command::Insert {
                text: r"\mathbb{#@}",
                ..
            }
        ));
    }

    #[test]
    fn unknown_names_and_bad_arguments() {
        assert_eq!(
            Command::from_selector("moveToNowhere", &[]),
            Err(EditError::UnknownCommand("moveToNowhere".into()))
        );
        assert_eq!(
            Command::from_selector("delete", &["sideways"]),
            Err(EditError::InvalidArgument {
                command: "delete".into(),
                argument: "sideways".into(),
            })
        );
        assert_eq!(
            Command::from_selector("insert", &[]),
            Err(EditError::InvalidArgument {
                command: "insert".into(),
                argument: "".into(),
            })
        );
        assert!(Command::from_selector("setRange", &["body:x"]).is_err());
    }

    #[test]
    fn mutations() {
        assert!(!Command::MoveToNextChar.is_mutation());
        assert!(!Command::Undo.is_mutation());
        assert!(Command::CompleteCommand.is_mutation());
    }
}
