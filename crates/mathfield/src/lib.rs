//! Structural editing of math expressions.
//!
//! LaTeX is read into a tree of atoms, edited through path-addressed operations and written
//! back out. The tree can be laid out as TeX-style boxes or read out loud.
//!
//! # Usage
//!
//! The main struct of this library is [`Mathfield`]. It owns an [`editor::Editor`] together
//! with its undo history and inline shortcuts. The constructor expects a config object in the
//! form of an instance of [`MathfieldConfig`].
//!
//! ```rust
//! use mathfield::{Mathfield, MathfieldConfig};
//!
//! let mut field = Mathfield::new(MathfieldConfig::default()).unwrap();
//! field.type_str("x^2").unwrap();
//! field.perform(mathfield::command::Command::MoveToNextChar).unwrap();
//! field.type_str("+1").unwrap();
//! assert_eq!(field.latex(), "x^{2}+1");
//! assert_eq!(field.speakable_text(), "x squared plus one");
//! ```
//!
//! # Features
//!
//! - `serde`: With this feature, `MathfieldConfig` implements serde's `Deserialize`.
//! - `ariadne`: Adds [`LatexError::to_report`] for pretty-printing diagnostics.
//!
pub mod command;
pub mod commands;
pub mod editor;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod selection;
pub mod shortcuts;
pub mod speakable;
pub mod token;
pub mod undo;

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use box_renderer::atom::{Atom, AtomFlags, AtomId, AtomKind, Relation};
pub use box_renderer::latex::to_latex;
pub use box_renderer::layout::layout;
pub use box_renderer::mbox::MathBox;
pub use box_renderer::style::Style;

pub use self::error::{EditError, LatexError};
pub use self::parser::Parsed;
use self::command::Command;
use self::editor::{BoundaryHandler, Direction, EditMode, Editor, InsertOptions, SelectionMode};
use self::error::LatexErrKind;
use self::parser::ParseMode;
use self::shortcuts::{ShortcutTable, match_end_of, match_keystroke, suggest};
use self::speakable::to_speakable_text;
use self::undo::{Snapshot, UndoManager};

/// Parse a LaTeX math string into atoms.
///
/// Parsing never fails; the problems that were recovered from, including those of the lexer,
/// are in [`Parsed::diagnostics`].
pub fn parse_latex(source: &str) -> Parsed {
    let tokenized = lexer::tokenize(source);
    let parsed = parser::parse(&tokenized.tokens, ParseMode::Math, &[]);
    let mut diagnostics = tokenized.diagnostics;
    diagnostics.extend(parsed.diagnostics);
    for diagnostic in &diagnostics {
        debug!("parsing {source:?}: {diagnostic}");
    }
    Parsed {
        atoms: parsed.atoms,
        diagnostics,
    }
}

/// Configuration object for a [`Mathfield`].
///
/// # Example usage
///
/// ```rust
/// use mathfield::MathfieldConfig;
///
/// // Default values
/// let config = MathfieldConfig::default();
///
/// // Only use custom inline shortcuts
/// let shortcuts = vec![
///     ("RR".to_string(), r"\mathbb{R}".to_string()),
///     ("half".to_string(), r"\frac{1}{2}".to_string()),
/// ];
/// let config = MathfieldConfig {
///     override_default_inline_shortcuts: true,
///     inline_shortcuts: shortcuts,
/// };
/// ```
///
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct MathfieldConfig {
    /// If `true`, the built-in inline shortcuts like `pi` or `<=` are not used.
    pub override_default_inline_shortcuts: bool,
    /// A list of inline shortcuts; each tuple contains (typed_text, latex_substitute).
    #[cfg_attr(feature = "serde", serde(with = "tuple_vec_map"))]
    pub inline_shortcuts: Vec<(String, String)>,
}

/// An editable math expression with undo history and inline shortcuts.
#[derive(Debug)]
pub struct Mathfield {
    editor: Editor,
    undo: UndoManager,
    shortcuts: ShortcutTable,
    /// Characters typed in a row, for matching inline shortcuts.
    typed: String,
}

impl Mathfield {
    /// Create a new, empty mathfield with the given configuration.
    ///
    /// This function returns an error if an inline shortcut is invalid: the trigger is empty or
    /// contains characters that are never typed as symbols, or the substitute is not valid LaTeX.
    /// The error is returned as a tuple: the parsing error, the index of the problematic
    /// shortcut and its substitute.
    pub fn new(config: MathfieldConfig) -> Result<Self, (Box<LatexError>, usize, String)> {
        for (idx, (trigger, substitute)) in config.inline_shortcuts.iter().enumerate() {
            if trigger.is_empty()
                || trigger
                    .chars()
                    .any(|ch| ch.is_whitespace() || matches!(ch, '\\' | '^' | '_'))
            {
                return Err((
                    Box::new(LatexError(
                        0..0,
                        LatexErrKind::InvalidShortcut(trigger.as_str().into()),
                    )),
                    idx,
                    substitute.clone(),
                ));
            }
            if let Some(err) = parse_latex(substitute).diagnostics.into_iter().next() {
                return Err((Box::new(err), idx, substitute.clone()));
            }
        }
        Ok(Mathfield {
            editor: Editor::default(),
            undo: UndoManager::default(),
            shortcuts: ShortcutTable::new(
                &config.inline_shortcuts,
                config.override_default_inline_shortcuts,
            ),
            typed: String::new(),
        })
    }

    #[inline]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    #[inline]
    pub fn mode(&self) -> EditMode {
        self.editor.mode()
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Sets what happens when navigation runs past either end of the expression.
    pub fn set_boundary_handler(&mut self, handler: BoundaryHandler) {
        self.editor.set_boundary_handler(handler);
    }

    /// Performs one command. Commands that change the tree are recorded for undo first.
    pub fn perform(&mut self, command: Command<'_>) -> Result<(), EditError> {
        self.typed.clear();
        self.run(command)
    }

    fn run(&mut self, command: Command<'_>) -> Result<(), EditError> {
        debug!("perform {command:?}");
        if command.is_mutation() {
            self.undo.snapshot(&Snapshot::of(&self.editor));
        }
        let editor = &mut self.editor;
        match command {
            Command::MoveToNextChar => editor.move_to_next_char(),
            Command::MoveToPreviousChar => editor.move_to_previous_char(),
            Command::MoveToNextPlaceholder => editor.move_to_next_placeholder(),
            Command::MoveToPreviousPlaceholder => editor.move_to_previous_placeholder(),
            Command::MoveToSuperscript => editor.move_to_superscript(),
            Command::MoveToSubscript => editor.move_to_subscript(),
            Command::MoveUp => editor.move_up(),
            Command::MoveDown => editor.move_down(),
            Command::MoveToGroupStart => editor.move_to_group_start(),
            Command::MoveToGroupEnd => editor.move_to_group_end(),
            Command::MoveToMathfieldStart => editor.move_to_mathfield_start(),
            Command::MoveToMathfieldEnd => editor.move_to_mathfield_end(),
            Command::SetRange { anchor, focus } => editor.set_range(anchor, focus),
            Command::SelectAll => editor.select_all(),
            Command::SelectGroup => editor.select_group(),
            Command::ExtendToNextChar => editor.extend_to_next_char(),
            Command::ExtendToPreviousChar => editor.extend_to_previous_char(),
            Command::Insert { text, options } => editor.insert(text, options),
            Command::Delete { direction, count } => {
                editor.delete(direction, count)?;
                if editor.mode() == EditMode::Command {
                    self.update_suggestion();
                }
                Ok(())
            }
            Command::PromoteToSuperscript => editor.promote_to_superscript(),
            Command::PromoteToSubscript => editor.promote_to_subscript(),
            Command::EnterCommandMode => editor.enter_command_mode(),
            Command::CompleteCommand => editor.complete_command(),
            Command::ExitCommandMode => editor.exit_command_mode(),
            Command::AcceptSuggestion => {
                editor.accept_suggestion();
                Ok(())
            }
            Command::InsertSuggestion {
                text,
                trim_from_end,
            } => {
                editor.insert_suggestion(text, trim_from_end);
                Ok(())
            }
            Command::RemoveSuggestion => {
                editor.remove_suggestion();
                Ok(())
            }
            Command::CommitCommandString => {
                editor.commit_command_string_before_insertion_point();
                Ok(())
            }
            Command::DecorateCommandString { error } => {
                editor.decorate_command_string_around_insertion_point(error);
                Ok(())
            }
            Command::Undo => {
                let snapshot = self
                    .undo
                    .undo(&Snapshot::of(&self.editor))
                    .ok_or(EditError::EmptyHistory)?;
                snapshot.restore(&mut self.editor);
                Ok(())
            }
            Command::Redo => {
                let snapshot = self.undo.redo().ok_or(EditError::EmptyHistory)?;
                snapshot.restore(&mut self.editor);
                Ok(())
            }
            Command::Snapshot => {
                self.undo.snapshot(&Snapshot::of(&self.editor));
                Ok(())
            }
        }
    }

    /// Types one character, as from a keyboard.
    pub fn type_char(&mut self, ch: char) -> Result<(), EditError> {
        match self.editor.mode() {
            EditMode::Math => self.type_math_char(ch),
            EditMode::Command => self.type_command_char(ch),
        }
    }

    /// Types every character of `text` in turn.
    pub fn type_str(&mut self, text: &str) -> Result<(), EditError> {
        text.chars().try_for_each(|ch| self.type_char(ch))
    }

    fn type_math_char(&mut self, ch: char) -> Result<(), EditError> {
        let text_mode = self.editor.in_text_mode();
        let command = match ch {
            '\\' => Command::EnterCommandMode,
            '^' => Command::MoveToSuperscript,
            '_' => Command::MoveToSubscript,
            ' ' if !text_mode => {
                self.typed.clear();
                return Ok(());
            }
            _ => {
                let mut buf = [0; 4];
                self.run(Command::Insert {
                    text: ch.encode_utf8(&mut buf),
                    options: InsertOptions::default(),
                })?;
                // Inline shortcuts only apply to math.
                if text_mode {
                    self.typed.clear();
                    return Ok(());
                }
                self.typed.push(ch);
                return self.apply_inline_shortcut();
            }
        };
        self.perform(command)
    }

    /// Replaces the end of the typed characters by the substitute of a matching shortcut.
    fn apply_inline_shortcut(&mut self) -> Result<(), EditError> {
        let Some(found) = match_end_of(&self.typed, &self.shortcuts) else {
            return Ok(());
        };
        debug!("inline shortcut {:?} -> {:?}", found.trigger, found.substitute);
        // Undo restores the literal characters first.
        self.undo.snapshot(&Snapshot::of(&self.editor));
        self.editor
            .delete(Direction::Backward, found.trigger.chars().count())?;
        self.editor.insert(
            found.substitute,
            InsertOptions::latex(SelectionMode::Placeholder),
        )?;
        self.typed.clear();
        Ok(())
    }

    fn type_command_char(&mut self, ch: char) -> Result<(), EditError> {
        if ch.is_ascii_alphabetic() {
            self.editor.insert_command_char(ch)?;
            self.update_suggestion();
            return Ok(());
        }
        if self.editor.extract_command_string_around_insertion_point(true) == "\\" {
            // A single non-letter after the backslash, like `\{` or `\,`.
            self.editor.insert_command_char(ch)?;
            return self.perform(Command::CompleteCommand);
        }
        self.perform(Command::CompleteCommand)?;
        self.type_char(ch)
    }

    /// Shows the best completion of the typed command, or marks it as an error if there is none.
    fn update_suggestion(&mut self) {
        let typed = self
            .editor
            .extract_command_string_around_insertion_point(true);
        if typed.len() <= 1 {
            self.editor.remove_suggestion();
            self.editor
                .decorate_command_string_around_insertion_point(false);
            return;
        }
        match suggest(&typed).first() {
            Some(suggestion) => {
                let rest = suggestion.name.get(typed.len() - 1..).unwrap_or_default();
                self.editor.insert_suggestion(rest, 0);
                self.editor
                    .decorate_command_string_around_insertion_point(false);
            }
            None => {
                self.editor.remove_suggestion();
                self.editor
                    .decorate_command_string_around_insertion_point(true);
            }
        }
    }

    /// Handles a key like `"ArrowLeft"` or `"Ctrl-z"`. Returns whether the key is bound.
    pub fn keystroke(&mut self, keystroke: &str) -> Result<bool, EditError> {
        let Some(command) = match_keystroke(self.editor.mode(), keystroke) else {
            return Ok(false);
        };
        self.perform(command)?;
        Ok(true)
    }

    /// Lays out the expression, with the caret and selection marked.
    pub fn layout(&mut self, style: Style) -> MathBox {
        self.editor.layout(style)
    }

    /// The expression as LaTeX.
    pub fn latex(&self) -> String {
        to_latex(self.editor.atoms())
    }

    pub fn speakable_text(&self) -> String {
        to_speakable_text(self.editor.atoms())
    }

    /// Replaces the whole expression. The previous one can be restored with undo.
    ///
    /// Returns the problems the parser recovered from.
    pub fn set_latex(&mut self, source: &str) -> Vec<LatexError> {
        self.typed.clear();
        self.undo.snapshot(&Snapshot::of(&self.editor));
        let parsed = parse_latex(source);
        self.editor.set_atoms(parsed.atoms);
        parsed.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn field() -> Mathfield {
        Mathfield::new(MathfieldConfig::default()).unwrap()
    }

    #[test]
    fn parse_reports_lexer_problems_first() {
        let parsed = parse_latex(r"\frac{a}{\foo");
        let kinds: Vec<_> = parsed.diagnostics.iter().map(|d| d.kind().clone()).collect();
        assert_eq!(
            kinds,
            [
                LatexErrKind::UnclosedGroup,
                LatexErrKind::UnknownCommand(r"\foo".into())
            ]
        );
        assert_eq!(parsed.atoms.len(), 1);
    }

    #[test]
    fn typing_scripts() {
        let mut field = field();
        field.type_str("x^2").unwrap();
        assert_snapshot!(field.latex(), @"x^{2}");
        field.perform(Command::MoveToNextChar).unwrap();
        field.type_str("+y_i").unwrap();
        assert_snapshot!(field.latex(), @"x^{2}+y_{i}");
    }

    #[test]
    fn inline_shortcut_can_be_undone() {
        let mut field = field();
        field.type_str("2pi").unwrap();
        assert_snapshot!(field.latex(), @r"2\pi");
        field.perform(Command::Undo).unwrap();
        assert_snapshot!(field.latex(), @"2pi");
        field.perform(Command::Undo).unwrap();
        assert_snapshot!(field.latex(), @"2p");
        field.perform(Command::Redo).unwrap();
        field.perform(Command::Redo).unwrap();
        assert_snapshot!(field.latex(), @r"2\pi");
        assert_eq!(field.perform(Command::Redo), Err(EditError::EmptyHistory));
    }

    #[test]
    fn space_breaks_shortcuts() {
        let mut field = field();
        field.type_str("p i").unwrap();
        assert_snapshot!(field.latex(), @"pi");
    }

    #[test]
    fn text_takes_shortcut_triggers_literally() {
        let mut field = field();
        field.set_latex(r"\text{a}");
        field.perform(Command::MoveToPreviousChar).unwrap();
        field.type_str("pi sin").unwrap();
        assert_snapshot!(field.latex(), @r"\text{api sin}");
        let mut flagged = false;
        for atom in field.editor().atoms() {
            atom.walk(&mut |atom| flagged |= atom.flags.contains(AtomFlags::ERROR));
        }
        assert!(!flagged);
    }

    #[test]
    fn custom_shortcuts() {
        let config = MathfieldConfig {
            override_default_inline_shortcuts: true,
            inline_shortcuts: vec![("half".to_string(), r"\frac{1}{2}".to_string())],
        };
        let mut field = Mathfield::new(config).unwrap();
        field.type_str("pi+half").unwrap();
        assert_snapshot!(field.latex(), @r"pi+\frac{1}{2}");
    }

    #[test]
    fn invalid_shortcuts_are_rejected() {
        let config = MathfieldConfig {
            inline_shortcuts: vec![
                ("ok".to_string(), r"\alpha".to_string()),
                ("bad".to_string(), r"\frac{1}{".to_string()),
            ],
            ..Default::default()
        };
        let (err, idx, substitute) = Mathfield::new(config).unwrap_err();
        assert_eq!(err.kind(), &LatexErrKind::UnclosedGroup);
        assert_eq!(idx, 1);
        assert_eq!(substitute, r"\frac{1}{");

        let config = MathfieldConfig {
            inline_shortcuts: vec![("a b".to_string(), "c".to_string())],
            ..Default::default()
        };
        let (err, idx, _) = Mathfield::new(config).unwrap_err();
        assert_eq!(err.kind(), &LatexErrKind::InvalidShortcut("a b".into()));
        assert_eq!(idx, 0);
    }

    #[test]
    fn command_mode_completes_with_suggestion() {
        let mut field = field();
        field.type_str(r"\sq").unwrap();
        assert_eq!(field.mode(), EditMode::Command);
        // The suggested `rt` follows the caret but is not part of the typed command.
        assert_eq!(field.editor().atoms().len(), 5);
        assert_eq!(
            field
                .editor()
                .extract_command_string_around_insertion_point(false),
            r"\sq"
        );
        assert!(field.keystroke("Tab").unwrap());
        assert_eq!(field.mode(), EditMode::Math);
        field.type_char('x').unwrap();
        assert_snapshot!(field.latex(), @r"\sqrt{x}");
    }

    #[test]
    fn command_mode_ends_at_a_non_letter() {
        let mut field = field();
        field.type_str(r"\alpha+\{").unwrap();
        assert_eq!(field.mode(), EditMode::Math);
        assert_snapshot!(field.latex(), @r"\alpha+\{");
    }

    #[test]
    fn unknown_command_is_marked() {
        let mut field = field();
        field.type_str(r"\qqqz").unwrap();
        let atoms = field.editor().atoms();
        assert!(atoms.iter().all(|a| a.flags.contains(AtomFlags::ERROR)));
        field.type_char(' ').unwrap();
        assert_eq!(field.editor().atoms()[0].kind(), AtomKind::UnknownCommand);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let mut field = field();
        assert!(!field.keystroke("F13").unwrap());
        assert_eq!(field.keystroke("Ctrl-z"), Err(EditError::EmptyHistory));
    }

    #[test]
    fn set_latex_is_undoable() {
        let mut field = field();
        field.type_char('a').unwrap();
        let diagnostics = field.set_latex(r"\frac{1}{2}");
        assert!(diagnostics.is_empty());
        assert_snapshot!(field.latex(), @r"\frac{1}{2}");
        field.perform(Command::Undo).unwrap();
        assert_snapshot!(field.latex(), @"a");
    }
}
