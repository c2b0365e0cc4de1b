use std::ops::Range;

use box_renderer::atom::{Atom, AtomFlags, AtomKind};
use log::trace;

use super::{EditMode, Editor, InsertOptions, SelectionMode, is_placeholder_only, to_offset};
use crate::commands::{CommandAction, get_command};
use crate::error::EditError;
use crate::path::Path;

/// The contiguous command atoms around the caret.
#[derive(Debug)]
struct CommandRun {
    branch: Path,
    atoms: Range<usize>,
    /// Index of the first atom after the caret.
    caret: usize,
}

impl CommandRun {
    fn before_caret(&self) -> Range<usize> {
        self.atoms.start..self.caret
    }
}

/// The LaTeX a completed command expands to, with placeholders for its arguments.
fn command_latex(command: &str) -> Option<String> {
    let name = command.strip_prefix('\\').unwrap_or(command);
    if name.is_empty() {
        return None;
    }
    let latex = match get_command(name) {
        Some(spec) if spec.action == CommandAction::Begin => {
            r"\begin{matrix}#?\end{matrix}".to_string()
        }
        Some(spec) => {
            let mut latex = format!("\\{name}");
            for _ in 0..spec.arity {
                latex.push_str("{#?}");
            }
            latex
        }
        None => format!("\\{name}"),
    };
    Some(latex)
}

impl Editor {
    fn command_run(&self) -> Option<CommandRun> {
        let caret = self.caret();
        let branch = caret.branch(&self.root)?;
        let is_command = |i: usize| {
            branch
                .get(i)
                .is_some_and(|atom| atom.kind() == AtomKind::Command)
        };
        let at = usize::try_from(caret.offset() + 1)
            .unwrap_or(0)
            .min(branch.len());
        let mut start = at;
        while start > 0 && is_command(start - 1) {
            start -= 1;
        }
        let mut end = at;
        while is_command(end) {
            end += 1;
        }
        Some(CommandRun {
            branch: caret.clone(),
            atoms: start..end,
            caret: at,
        })
    }

    fn run_atoms_mut(&mut self, run: &CommandRun, atoms: Range<usize>) -> &mut [Atom] {
        run.branch
            .branch_mut(&mut self.root)
            .and_then(|branch| branch.get_mut(atoms))
            .unwrap_or_default()
    }

    /// Inserts atoms at the caret and puts the caret after them.
    fn insert_atoms_at_caret(&mut self, atoms: Vec<Atom>) {
        let caret = self.caret().clone();
        let Some(branch) = caret.branch_mut(&mut self.root) else {
            return;
        };
        let mut index = usize::try_from(caret.offset() + 1).unwrap_or(0);
        if is_placeholder_only(branch) {
            branch.clear();
            index = 0;
        }
        let count = atoms.len();
        branch.splice(index..index, atoms);
        self.set_caret(caret.with_offset(to_offset(index + count) - 1));
    }

    /// Replaces the selection with a `\` command atom and switches to command mode.
    pub fn enter_command_mode(&mut self) -> Result<(), EditError> {
        self.validate()?;
        self.delete_selection();
        self.insert_atoms_at_caret(vec![Atom::command_char('\\')]);
        self.mode = EditMode::Command;
        Ok(())
    }

    /// Types one character of a command name.
    pub fn insert_command_char(&mut self, ch: char) -> Result<(), EditError> {
        self.validate()?;
        self.delete_selection();
        self.insert_atoms_at_caret(vec![Atom::command_char(ch)]);
        Ok(())
    }

    /// The command typed so far, without pending suggestions.
    pub fn extract_command_string_around_insertion_point(&self, before_only: bool) -> String {
        let Some(run) = self.command_run() else {
            return String::new();
        };
        let range = if before_only {
            run.before_caret()
        } else {
            run.atoms.clone()
        };
        run.branch
            .branch(&self.root)
            .and_then(|branch| branch.get(range))
            .unwrap_or_default()
            .iter()
            .filter(|atom| !atom.flags.contains(AtomFlags::SUGGESTION))
            .filter_map(Atom::value)
            .collect()
    }

    /// Marks the command as an error, or clears the mark.
    pub fn decorate_command_string_around_insertion_point(&mut self, error: bool) {
        let Some(run) = self.command_run() else {
            return;
        };
        for atom in self.run_atoms_mut(&run, run.atoms.clone()) {
            atom.flags.set(AtomFlags::ERROR, error);
        }
    }

    /// Turns suggested characters before the caret into typed ones.
    pub fn commit_command_string_before_insertion_point(&mut self) {
        let Some(run) = self.command_run() else {
            return;
        };
        for atom in self.run_atoms_mut(&run, run.before_caret()) {
            atom.flags.remove(AtomFlags::SUGGESTION);
        }
    }

    /// Shows `text` as a suggestion after the caret, first removing `trim_from_end` typed
    /// characters before the caret.
    pub fn insert_suggestion(&mut self, text: &str, trim_from_end: usize) {
        self.remove_suggestion();
        let Some(run) = self.command_run() else {
            return;
        };
        let trim = trim_from_end.min(run.caret - run.atoms.start);
        let start = run.caret - trim;
        if let Some(branch) = run.branch.branch_mut(&mut self.root) {
            branch.drain(start..run.caret);
            let suggestion = text
                .chars()
                .map(|ch| Atom::command_char(ch).with_flags(AtomFlags::SUGGESTION));
            branch.splice(start..start, suggestion);
        }
        self.set_caret(run.branch.with_offset(to_offset(start) - 1));
        trace!("suggesting {text:?}");
    }

    /// Removes the suggested characters of the command.
    pub fn remove_suggestion(&mut self) {
        let Some(run) = self.command_run() else {
            return;
        };
        let Some(branch) = run.branch.branch_mut(&mut self.root) else {
            return;
        };
        let mut caret = run.caret;
        let mut index = run.atoms.start;
        for _ in run.atoms.clone() {
            let suggested = branch
                .get(index)
                .is_some_and(|atom| atom.flags.contains(AtomFlags::SUGGESTION));
            if suggested {
                branch.remove(index);
                if index < caret {
                    caret -= 1;
                }
            } else {
                index += 1;
            }
        }
        self.set_caret(run.branch.with_offset(to_offset(caret) - 1));
    }

    /// Accepts the suggestion and moves the caret after the command.
    pub fn accept_suggestion(&mut self) {
        let Some(run) = self.command_run() else {
            return;
        };
        for atom in self.run_atoms_mut(&run, run.atoms.clone()) {
            atom.flags.remove(AtomFlags::SUGGESTION);
        }
        self.set_caret(run.branch.with_offset(to_offset(run.atoms.end) - 1));
    }

    /// Removes the command atoms and returns to math mode. Returns the caret position.
    fn remove_command_run(&mut self) -> Path {
        self.mode = EditMode::Math;
        let Some(run) = self.command_run() else {
            return self.caret().clone();
        };
        if let Some(branch) = run.branch.branch_mut(&mut self.root) {
            branch.drain(run.atoms.clone());
        }
        let caret = self.settle(&run.branch, to_offset(run.atoms.start) - 1);
        self.set_caret(caret.clone());
        caret
    }

    /// Replaces the command with what it stands for and returns to math mode.
    ///
    /// A pending suggestion is accepted first. Unknown names become unknown-command atoms.
    pub fn complete_command(&mut self) -> Result<(), EditError> {
        self.validate()?;
        self.accept_suggestion();
        let command = self.extract_command_string_around_insertion_point(false);
        self.remove_command_run();
        let Some(latex) = command_latex(&command) else {
            return Ok(());
        };
        trace!("completing {command:?} as {latex:?}");
        self.insert(&latex, InsertOptions::latex(SelectionMode::Placeholder))
    }

    /// Discards the command and returns to math mode.
    pub fn exit_command_mode(&mut self) -> Result<(), EditError> {
        self.validate()?;
        self.remove_command_run();
        Ok(())
    }

    /// Returns to math mode once the last command character was deleted.
    pub(super) fn leave_empty_command_mode(&mut self) {
        if self.mode == EditMode::Command
            && self.command_run().is_none_or(|run| run.atoms.is_empty())
        {
            self.mode = EditMode::Math;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Direction;
    use super::super::tests::{editor_at, latex};
    use super::*;

    fn typed(editor: &mut Editor, name: &str) {
        for ch in name.chars() {
            editor.insert_command_char(ch).unwrap();
        }
    }

    #[test]
    fn completing_a_suggestion() {
        let mut editor = editor_at("x", "body:0");
        editor.enter_command_mode().unwrap();
        assert_eq!(editor.mode(), EditMode::Command);
        typed(&mut editor, "fr");
        assert_eq!(
            editor.extract_command_string_around_insertion_point(true),
            r"\fr"
        );

        editor.insert_suggestion("ac", 0);
        assert_eq!(editor.caret().to_string(), "body:3");
        assert_eq!(
            editor.extract_command_string_around_insertion_point(false),
            r"\fr"
        );
        // Command atoms are not serialized.
        assert_eq!(latex(&editor), "x");

        editor.complete_command().unwrap();
        assert_eq!(editor.mode(), EditMode::Math);
        assert_eq!(latex(&editor), r"x\frac{\placeholder{}}{\placeholder{}}");
        assert_eq!(editor.selection().focus.to_string(), "body:1/numerator:0");
    }

    #[test]
    fn suggestions_can_replace_typed_characters() {
        let mut editor = Editor::default();
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "sim");
        editor.insert_suggestion("qrt", 2);
        assert_eq!(
            editor.extract_command_string_around_insertion_point(false),
            r"\s"
        );
        editor.accept_suggestion();
        assert_eq!(
            editor.extract_command_string_around_insertion_point(true),
            r"\sqrt"
        );
        editor.remove_suggestion();
        assert_eq!(
            editor.extract_command_string_around_insertion_point(false),
            r"\sqrt"
        );
    }

    #[test]
    fn removing_a_suggestion_keeps_typed_characters() {
        let mut editor = Editor::default();
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "al");
        editor.insert_suggestion("pha", 0);
        editor.remove_suggestion();
        assert_eq!(editor.atoms().len(), 3);
        assert_eq!(editor.caret().to_string(), "body:2");
    }

    #[test]
    fn committing_clears_suggestions_before_the_caret() {
        let mut editor = Editor::default();
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "pi");
        editor.insert_suggestion("ck", 0);
        editor
            .set_range(Path::in_root(4), Path::in_root(4))
            .unwrap();
        editor.commit_command_string_before_insertion_point();
        assert_eq!(
            editor.extract_command_string_around_insertion_point(false),
            r"\pick"
        );
    }

    #[test]
    fn decorating_errors() {
        let mut editor = Editor::default();
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "zz");
        editor.decorate_command_string_around_insertion_point(true);
        assert!(editor
            .atoms()
            .iter()
            .all(|atom| atom.flags.contains(AtomFlags::ERROR)));
        editor.decorate_command_string_around_insertion_point(false);
        assert!(editor.atoms().iter().all(|atom| atom.flags.is_empty()));
    }

    #[test]
    fn unknown_commands_are_kept() {
        let mut editor = Editor::default();
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "foo");
        editor.complete_command().unwrap();
        assert_eq!(latex(&editor), r"\foo");
        assert_eq!(editor.atoms()[0].kind(), AtomKind::UnknownCommand);
    }

    #[test]
    fn environments_get_a_cell() {
        let mut editor = Editor::default();
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "begin");
        editor.complete_command().unwrap();
        assert_eq!(latex(&editor), r"\begin{matrix}\placeholder{}\end{matrix}");
        assert_eq!(
            editor.selection().focus.to_string(),
            "body:0/body:0/body:0/body:0"
        );
    }

    #[test]
    fn exiting_discards_the_command() {
        let mut editor = editor_at("x", "body:0");
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "al");
        editor.exit_command_mode().unwrap();
        assert_eq!(editor.mode(), EditMode::Math);
        assert_eq!(latex(&editor), "x");
        assert_eq!(editor.caret().to_string(), "body:0");
    }

    #[test]
    fn deleting_the_backslash_leaves_command_mode() {
        let mut editor = Editor::default();
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "a");
        editor.delete(Direction::Backward, 1).unwrap();
        assert_eq!(editor.mode(), EditMode::Command);
        editor.delete(Direction::Backward, 1).unwrap();
        assert_eq!(editor.mode(), EditMode::Math);
        assert!(editor.atoms().is_empty());
    }

    #[test]
    fn entering_inside_a_placeholder() {
        let mut editor = editor_at(r"\frac{\placeholder{}}{2}", "body:0/numerator:-1");
        editor.enter_command_mode().unwrap();
        typed(&mut editor, "pi");
        editor.complete_command().unwrap();
        assert_eq!(latex(&editor), r"\frac{\pi}{2}");
        assert_eq!(editor.caret().to_string(), "body:0/numerator:0");
    }
}
