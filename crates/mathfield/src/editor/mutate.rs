use box_renderer::atom::{Atom, AtomKind, Body, Relation};
use log::debug;

use super::{
    Direction, Editor, InsertFormat, InsertOptions, SelectionMode, is_placeholder_only,
    last_offset, to_offset,
};
use crate::commands::char_atom;
use crate::error::EditError;
use crate::lexer::tokenize;
use crate::parser::{ParseMode, parse};
use crate::path::Path;

/// Parses a LaTeX fragment, logging what the parser had to recover from.
fn parse_fragment(source: &str, mode: ParseMode, args: &[Vec<Atom>]) -> Vec<Atom> {
    let tokenized = tokenize(source);
    let parsed = parse(&tokenized.tokens, mode, args);
    for diagnostic in tokenized.diagnostics.iter().chain(&parsed.diagnostics) {
        debug!("inserting {source:?}: {diagnostic}");
    }
    parsed.atoms
}

/// Whether deleting next to `atom` removes it rather than entering it.
fn is_removable(atom: &Atom) -> bool {
    atom.is_leaf() || (!matches!(atom.body(), Body::Leaf) && atom.is_hollow())
}

/// Whether an implicit argument stops before `atom`.
#[inline]
fn ends_implicit_argument(atom: &Atom) -> bool {
    matches!(
        atom.kind(),
        AtomKind::Bin | AtomKind::Rel | AtomKind::Punct | AtomKind::Open
    )
}

impl Editor {
    /// Inserts a character or a LaTeX fragment at the caret, replacing the selection.
    ///
    /// In the fragment, `#0` and `#@` stand for the replaced selection. With a collapsed
    /// selection `#@` takes the atoms before the caret up to the nearest operator or opening
    /// delimiter.
    pub fn insert(&mut self, text: &str, options: InsertOptions) -> Result<(), EditError> {
        self.validate()?;
        let mut selection = self.take_selection();
        if selection.is_empty() && text.contains("#@") {
            selection = self.take_implicit_argument();
        }
        let caret = self.caret().clone();
        let mode = if self.in_text_mode() {
            ParseMode::Text
        } else {
            ParseMode::Math
        };
        let atoms = build_atoms(text, options.format, mode, &[selection]);

        let Some(branch) = caret.branch_mut(&mut self.root) else {
            return Err(EditError::InvalidPath(caret));
        };
        let mut index = usize::try_from(caret.offset() + 1).unwrap_or(0);
        if is_placeholder_only(branch) && !atoms.is_empty() {
            branch.clear();
            index = 0;
        }
        let count = atoms.len();
        branch.splice(index..index, atoms);
        if count == 0 {
            let caret = self.settle(&caret, caret.offset());
            self.set_caret(caret);
            return Ok(());
        }

        let last = index + count - 1;
        match options.selection_mode {
            SelectionMode::Placeholder => match self.placeholder_among(&caret, index..=last) {
                Some(placeholder) => self.select_atom(&placeholder),
                None => self.set_caret(caret.with_offset(to_offset(last))),
            },
            SelectionMode::After => self.set_caret(caret.with_offset(to_offset(last))),
            SelectionMode::Before => self.set_caret(caret.with_offset(to_offset(index) - 1)),
            SelectionMode::Item => self.select_indices(&caret, index, last),
        }
        Ok(())
    }

    /// The first placeholder in the atoms `indices` of the branch `branch` points into.
    fn placeholder_among(
        &self,
        branch: &Path,
        indices: std::ops::RangeInclusive<usize>,
    ) -> Option<Path> {
        let atoms = branch.branch(&self.root)?;
        indices.into_iter().find_map(|i| {
            let atom = atoms.get(i)?;
            Editor::first_placeholder(atom, &branch.with_offset(to_offset(i)))
        })
    }

    /// Removes the selected atoms and returns them, leaving the caret where they were.
    ///
    /// The branch is not settled: the caller is about to insert into it.
    fn take_selection(&mut self) -> Vec<Atom> {
        if self.selection.is_collapsed() {
            return Vec::new();
        }
        let start = self.selection.start_path();
        let indices = self.selection.indices();
        self.set_caret(start.clone());
        let Some(branch) = start.branch_mut(&mut self.root) else {
            return Vec::new();
        };
        if indices.end > branch.len() {
            return Vec::new();
        }
        let taken: Vec<Atom> = branch.drain(indices).collect();
        if taken.iter().all(Atom::is_placeholder) {
            Vec::new()
        } else {
            taken
        }
    }

    /// Removes the atoms before the caret which form the implicit argument of a fragment.
    fn take_implicit_argument(&mut self) -> Vec<Atom> {
        let caret = self.caret().clone();
        let Some(branch) = caret.branch_mut(&mut self.root) else {
            return Vec::new();
        };
        if is_placeholder_only(branch) {
            return Vec::new();
        }
        let end = usize::try_from(caret.offset() + 1).unwrap_or(0).min(branch.len());
        let mut start = end;
        while start > 0 && branch.get(start - 1).is_some_and(|atom| !ends_implicit_argument(atom)) {
            start -= 1;
        }
        let taken = branch.drain(start..end).collect();
        self.set_caret(caret.with_offset(to_offset(start) - 1));
        taken
    }

    /// Deletes `count` times in `direction`: the selection if there is one, otherwise the atom
    /// next to the caret.
    pub fn delete(&mut self, direction: Direction, count: usize) -> Result<(), EditError> {
        self.validate()?;
        for _ in 0..count {
            match direction {
                Direction::Backward => self.delete_backward(),
                Direction::Forward => self.delete_forward(),
            }
        }
        self.leave_empty_command_mode();
        Ok(())
    }

    /// Removes the selected atoms. Returns `false` if the selection is collapsed.
    pub(super) fn delete_selection(&mut self) -> bool {
        if self.selection.is_collapsed() {
            return false;
        }
        let start = self.selection.start_path();
        let indices = self.selection.indices();
        if let Some(branch) = start.branch_mut(&mut self.root)
            && indices.end <= branch.len()
        {
            branch.drain(indices);
        }
        let caret = self.settle(&start, start.offset());
        self.set_caret(caret);
        true
    }

    /// Removes the atom at `path` and settles its branch.
    fn remove_atom(&mut self, path: &Path) {
        let Some(index) = path.last().and_then(|step| step.index()) else {
            return;
        };
        if let Some(branch) = path.branch_mut(&mut self.root)
            && index < branch.len()
        {
            branch.remove(index);
        }
        let caret = self.settle(path, path.offset() - 1);
        self.set_caret(caret);
    }

    fn delete_backward(&mut self) {
        if self.delete_selection() {
            return;
        }
        let caret = self.caret().clone();
        match caret.atom(&self.root) {
            Some(atom) if is_removable(atom) => self.remove_atom(&caret),
            Some(_) => self.step_without_wrap(Direction::Backward),
            None => self.delete_at_branch_start(&caret),
        }
    }

    fn delete_forward(&mut self) {
        if self.delete_selection() {
            return;
        }
        let caret = self.caret().clone();
        let next = caret.with_offset(caret.offset() + 1);
        match next.atom(&self.root) {
            Some(atom) if is_removable(atom) => {
                self.remove_atom(&next);
                if let Some(branch) = caret.branch(&self.root)
                    && !branch.is_empty()
                {
                    let offset = caret.offset().min(last_offset(branch));
                    self.set_caret(caret.with_offset(offset));
                }
            }
            Some(_) => self.step_without_wrap(Direction::Forward),
            None if caret.depth() > 1 => self.step_without_wrap(Direction::Forward),
            None => {}
        }
    }

    /// Deleting backward at the start of a branch: scripts are hoisted next to their base and
    /// wrappers are unwrapped. Elsewhere the caret moves back.
    fn delete_at_branch_start(&mut self, caret: &Path) {
        let Some(relation) = caret.relation() else {
            return;
        };
        let owner = caret.parent();
        if owner.is_root() {
            return;
        }
        let Some(parent) = owner.atom(&self.root) else {
            return;
        };
        let has_scripts = parent.superscript().is_some() || parent.subscript().is_some();
        let unwraps = match relation {
            Relation::Superscript | Relation::Subscript => {
                self.hoist_script(&owner, relation);
                return;
            }
            Relation::Numerator | Relation::Radicand => !has_scripts,
            Relation::Body => {
                !has_scripts
                    && matches!(
                        parent.kind(),
                        AtomKind::Accent | AtomKind::Font | AtomKind::Text | AtomKind::Group
                    )
            }
            Relation::Denominator | Relation::Index => false,
        };
        if unwraps {
            self.unwrap_atom(&owner, relation);
        } else {
            self.step_without_wrap(Direction::Backward);
        }
    }

    /// Moves the content of a script after its base and removes the script.
    fn hoist_script(&mut self, base: &Path, relation: Relation) {
        let Some(index) = base.last().and_then(|step| step.index()) else {
            return;
        };
        let content: Vec<Atom> = base
            .atom_mut(&mut self.root)
            .and_then(|atom| atom.remove_branch(relation))
            .unwrap_or_default()
            .into_iter()
            .filter(|atom| !atom.is_placeholder())
            .collect();
        if let Some(branch) = base.branch_mut(&mut self.root) {
            branch.splice(index + 1..index + 1, content);
        }
        self.set_caret(base.clone());
    }

    /// Replaces the atom at `path` by the content of its branches, scripts excepted. The caret
    /// goes before the content that came from `from`.
    fn unwrap_atom(&mut self, path: &Path, from: Relation) {
        let Some(index) = path.last().and_then(|step| step.index()) else {
            return;
        };
        let Some(atom) = path.atom(&self.root) else {
            return;
        };
        let mut before = 0;
        let mut content = Vec::new();
        for relation in atom.relations() {
            if matches!(relation, Relation::Superscript | Relation::Subscript) {
                continue;
            }
            if relation == from {
                before = content.len();
            }
            if let Some(atoms) = atom.branch(relation) {
                content.extend(atoms.iter().filter(|atom| !atom.is_placeholder()).cloned());
            }
        }
        if let Some(branch) = path.branch_mut(&mut self.root) {
            branch.splice(index..=index, content);
        }
        let caret = self.settle(path, to_offset(index + before) - 1);
        self.set_caret(caret);
    }

    pub fn promote_to_superscript(&mut self) -> Result<(), EditError> {
        self.promote(Relation::Superscript)
    }

    pub fn promote_to_subscript(&mut self) -> Result<(), EditError> {
        self.promote(Relation::Subscript)
    }

    /// Moves the selection into a script of the atom before it.
    fn promote(&mut self, relation: Relation) -> Result<(), EditError> {
        self.validate()?;
        if self.selection.is_collapsed() {
            return self.move_to_script(relation);
        }
        let start = self.selection.start_path();
        let indices = self.selection.indices();
        let has_base = start
            .atom(&self.root)
            .is_some_and(|atom| atom.kind().allows_scripts());
        let Some(branch) = start.branch_mut(&mut self.root) else {
            return Err(EditError::InvalidPath(start));
        };
        let moved: Vec<Atom> = branch.drain(indices.clone()).collect();
        let base_path = if has_base {
            start
        } else {
            branch.insert(indices.start, Atom::placeholder());
            start.with_offset(to_offset(indices.start))
        };
        let Some(script) = base_path
            .atom_mut(&mut self.root)
            .and_then(|base| base.branch_or_insert(relation))
        else {
            return Err(EditError::InvalidPath(base_path));
        };
        if is_placeholder_only(script) {
            *script = moved;
        } else {
            script.extend(moved);
        }
        let offset = last_offset(script);
        self.set_caret(base_path.child(relation, offset));
        Ok(())
    }
}

/// Turns inserted text into atoms.
fn build_atoms(text: &str, format: InsertFormat, mode: ParseMode, args: &[Vec<Atom>]) -> Vec<Atom> {
    let mut chars = text.chars();
    if let (InsertFormat::Auto, Some(ch), None) = (format, chars.next(), chars.next()) {
        match ch {
            '\\' | '^' | '_' => {}
            '{' | '}' | '#' | '%' | '&' | '$' => {
                return parse_fragment(&format!("\\{ch}"), mode, args);
            }
            _ if mode == ParseMode::Text => return vec![Atom::char(AtomKind::Ord, ch)],
            // Spaces only separate tokens in math mode.
            _ if ch.is_whitespace() => return Vec::new(),
            _ => return vec![char_atom(ch)],
        }
    }
    parse_fragment(text, mode, args)
}
