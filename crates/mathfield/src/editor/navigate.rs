use box_renderer::atom::{Atom, Relation};

use super::{
    BoundaryAction, Direction, Editor, is_grid_body, is_placeholder_only, last_offset, to_offset,
};
use crate::error::EditError;
use crate::path::{PRE_COLLAPSED, Path};
use crate::selection::Range;

/// A position met by the document-order walk.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stop {
    /// A caret position.
    Caret(Path),
    /// A placeholder atom.
    Placeholder(Path),
}

/// Walks the branches of `atom` in document order.
///
/// Every branch yields its leading gap, then for each atom the stops inside it followed by the
/// gap after it. A branch holding only a placeholder has its leading gap as its single caret
/// stop. The gaps of grid bodies are skipped.
fn walk(atom: &Atom, path: &Path, out: &mut Vec<Stop>) {
    for relation in atom.relations() {
        let Some(branch) = atom.branch(relation) else {
            continue;
        };
        if is_grid_body(atom.kind(), relation) {
            for (i, child) in branch.iter().enumerate() {
                walk(child, &path.child(relation, to_offset(i)), out);
            }
            continue;
        }
        out.push(Stop::Caret(path.child(relation, PRE_COLLAPSED)));
        if is_placeholder_only(branch) {
            out.push(Stop::Placeholder(path.child(relation, 0)));
            continue;
        }
        for (i, child) in branch.iter().enumerate() {
            let child_path = path.child(relation, to_offset(i));
            if child.is_placeholder() {
                out.push(Stop::Placeholder(child_path.clone()));
            }
            walk(child, &child_path, out);
            out.push(Stop::Caret(child_path));
        }
    }
}

impl Editor {
    fn stops(&self) -> Vec<Stop> {
        let mut stops = Vec::new();
        walk(&self.root, &Path::root(), &mut stops);
        stops
    }

    /// The caret stops in document order.
    pub fn caret_stops(&self) -> Vec<Path> {
        self.stops()
            .into_iter()
            .filter_map(|stop| match stop {
                Stop::Caret(path) => Some(path),
                Stop::Placeholder(_) => None,
            })
            .collect()
    }

    /// Moves the caret to the next or previous stop, asking the boundary handler what to do at
    /// either end.
    fn step_caret(&mut self, direction: Direction, wrap: bool) {
        let stops = self.caret_stops();
        let current = stops.iter().position(|stop| stop == self.caret());
        let next = match (current, direction) {
            (None, _) => stops.first(),
            (Some(i), Direction::Forward) => match stops.get(i + 1) {
                Some(stop) => Some(stop),
                None if wrap && (self.boundary)(direction) == BoundaryAction::Wrap => {
                    stops.first()
                }
                None => None,
            },
            (Some(i), Direction::Backward) => match i.checked_sub(1) {
                Some(i) => stops.get(i),
                None if wrap && (self.boundary)(direction) == BoundaryAction::Wrap => {
                    stops.last()
                }
                None => None,
            },
        };
        if let Some(next) = next.cloned() {
            self.set_caret(next);
        }
    }

    /// Collapses a selection to its start or end. Returns `false` if it was collapsed already.
    fn collapse(&mut self, direction: Direction) -> bool {
        if self.selection.is_collapsed() {
            return false;
        }
        let edge = match direction {
            Direction::Forward => self.selection.end_path(),
            Direction::Backward => self.selection.start_path(),
        };
        let edge = match edge.branch(&self.root) {
            Some(branch) if is_placeholder_only(branch) => edge.with_offset(PRE_COLLAPSED),
            _ => edge,
        };
        self.set_caret(edge);
        true
    }

    pub fn move_to_next_char(&mut self) -> Result<(), EditError> {
        self.validate()?;
        if !self.collapse(Direction::Forward) {
            self.step_caret(Direction::Forward, true);
        }
        Ok(())
    }

    pub fn move_to_previous_char(&mut self) -> Result<(), EditError> {
        self.validate()?;
        if !self.collapse(Direction::Backward) {
            self.step_caret(Direction::Backward, true);
        }
        Ok(())
    }

    /// Moves to the adjacent stop without wrapping around.
    pub(super) fn step_without_wrap(&mut self, direction: Direction) {
        self.step_caret(direction, false);
    }

    pub fn move_to_next_placeholder(&mut self) -> Result<(), EditError> {
        self.move_to_placeholder(Direction::Forward)
    }

    pub fn move_to_previous_placeholder(&mut self) -> Result<(), EditError> {
        self.move_to_placeholder(Direction::Backward)
    }

    /// Selects the next placeholder in the given direction, skipping the one which is selected.
    fn move_to_placeholder(&mut self, direction: Direction) -> Result<(), EditError> {
        self.validate()?;
        let stops = self.stops();
        let selected = self.selected_placeholder();
        let current = stops.iter().position(|stop| match (stop, &selected) {
            (Stop::Placeholder(path), Some(selected)) => path == selected,
            (Stop::Caret(path), None) => path == self.caret(),
            _ => false,
        });
        let is_placeholder = |stop: &&Stop| matches!(stop, Stop::Placeholder(_));
        let found = match (direction, current) {
            (Direction::Forward, Some(i)) => stops.iter().skip(i + 1).find(is_placeholder),
            (Direction::Backward, Some(i)) => stops.iter().take(i).rev().find(is_placeholder),
            (_, None) => None,
        };
        let found = match found {
            Some(stop) => Some(stop),
            None if (self.boundary)(direction) == BoundaryAction::Wrap => match direction {
                Direction::Forward => stops.iter().find(is_placeholder),
                Direction::Backward => stops.iter().rev().find(is_placeholder),
            },
            None => None,
        };
        if let Some(Stop::Placeholder(path)) = found.cloned() {
            self.select_atom(&path);
        }
        Ok(())
    }

    /// The path of the placeholder which is the whole selection, if any.
    fn selected_placeholder(&self) -> Option<Path> {
        let indices = self.selection.indices();
        if indices.len() != 1 {
            return None;
        }
        let path = self.selection.end_path();
        path.atom(&self.root)
            .is_some_and(Atom::is_placeholder)
            .then_some(path)
    }

    /// Selects the atom `path` points at.
    pub(super) fn select_atom(&mut self, path: &Path) {
        self.selection = Range::new(path.with_offset(path.offset() - 1), path.clone());
    }

    pub fn move_to_superscript(&mut self) -> Result<(), EditError> {
        self.move_to_script(Relation::Superscript)
    }

    pub fn move_to_subscript(&mut self) -> Result<(), EditError> {
        self.move_to_script(Relation::Subscript)
    }

    /// Moves into a script of the atom before the caret, creating the script when it is absent.
    ///
    /// If no atom precedes the caret, a placeholder is inserted as the base.
    pub(super) fn move_to_script(&mut self, relation: Relation) -> Result<(), EditError> {
        self.validate()?;
        self.collapse(Direction::Forward);
        let caret = self.caret().clone();
        let base_path = self.script_base(&caret);
        let Some(base) = base_path.atom_mut(&mut self.root) else {
            return Err(EditError::InvalidPath(caret));
        };
        let Some(script) = base.branch_or_insert(relation) else {
            return Err(EditError::InvalidPath(caret));
        };
        let offset = last_offset(script);
        self.set_caret(base_path.child(relation, offset));
        Ok(())
    }

    /// Finds or makes the atom a script typed at `caret` attaches to.
    fn script_base(&mut self, caret: &Path) -> Path {
        let accepts_scripts = caret
            .atom(&self.root)
            .is_some_and(|atom| atom.kind().allows_scripts());
        if accepts_scripts {
            return caret.clone();
        }
        let Some(branch) = caret.branch_mut(&mut self.root) else {
            return caret.clone();
        };
        if is_placeholder_only(branch) {
            return caret.with_offset(0);
        }
        let index = usize::try_from(caret.offset() + 1).unwrap_or(0);
        branch.insert(index, Atom::placeholder());
        caret.with_offset(to_offset(index))
    }

    pub fn move_up(&mut self) -> Result<(), EditError> {
        self.move_vertically(Direction::Backward)
    }

    pub fn move_down(&mut self) -> Result<(), EditError> {
        self.move_vertically(Direction::Forward)
    }

    /// Moves between the numerator and denominator of the closest enclosing fraction, or between
    /// the scripts of an atom.
    fn move_vertically(&mut self, direction: Direction) -> Result<(), EditError> {
        self.validate()?;
        let caret = self.caret().clone();
        for depth in (1..=caret.depth()).rev() {
            let Some(step) = caret.steps().get(depth - 1) else {
                continue;
            };
            let target = match (direction, step.relation) {
                (Direction::Backward, Relation::Denominator) => Relation::Numerator,
                (Direction::Backward, Relation::Subscript) => Relation::Superscript,
                (Direction::Forward, Relation::Numerator) => Relation::Denominator,
                (Direction::Forward, Relation::Superscript) => Relation::Subscript,
                _ => continue,
            };
            let owner = caret.truncated(depth - 1);
            let Some(branch) = owner.atom(&self.root).and_then(|atom| atom.branch(target)) else {
                continue;
            };
            let offset = last_offset(branch);
            self.set_caret(owner.child(target, offset));
            return Ok(());
        }
        Ok(())
    }

    pub fn move_to_group_start(&mut self) -> Result<(), EditError> {
        self.validate()?;
        let start = self.caret().with_offset(PRE_COLLAPSED);
        self.set_caret(start);
        Ok(())
    }

    pub fn move_to_group_end(&mut self) -> Result<(), EditError> {
        self.validate()?;
        let end = self.end_of_branch(&self.caret().clone());
        self.set_caret(end);
        Ok(())
    }

    pub fn move_to_mathfield_start(&mut self) -> Result<(), EditError> {
        self.validate()?;
        self.set_caret(Path::in_root(PRE_COLLAPSED));
        Ok(())
    }

    pub fn move_to_mathfield_end(&mut self) -> Result<(), EditError> {
        self.validate()?;
        let end = self.end_of_mathfield();
        self.set_caret(end);
        Ok(())
    }
}
