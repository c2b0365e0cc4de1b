//! The structural editor.
//!
//! An [`Editor`] owns an expression tree and a selection in it. All operations address the tree
//! through [`Path`]s, which are revalidated before every operation: a stale selection makes the
//! operation fail with [`EditError::InvalidPath`] without touching the tree.

mod command_mode;
mod mutate;
mod navigate;
mod select;

use std::fmt;

use box_renderer::atom::{Atom, AtomFlags, AtomKind, Relation};
use box_renderer::layout::layout;
use box_renderer::mbox::MathBox;
use box_renderer::style::Style;
use strum_macros::EnumString;

use crate::error::EditError;
use crate::path::{PRE_COLLAPSED, Path};
use crate::selection::Range;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Math,
    /// A command name is being typed.
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Direction {
    Forward,
    Backward,
}

/// What to do when navigation runs past the first or last position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryAction {
    /// Continue at the other end.
    #[default]
    Wrap,
    Stay,
}

pub type BoundaryHandler = Box<dyn FnMut(Direction) -> BoundaryAction>;

/// Where the caret goes after an insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum SelectionMode {
    /// Select the first placeholder of the inserted atoms, or behave like `After`.
    #[default]
    Placeholder,
    After,
    Before,
    /// Select the inserted atoms.
    Item,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum InsertFormat {
    /// A single character is a symbol; anything else is LaTeX.
    #[default]
    Auto,
    Latex,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    pub selection_mode: SelectionMode,
    pub format: InsertFormat,
}

impl InsertOptions {
    pub const fn latex(selection_mode: SelectionMode) -> Self {
        InsertOptions {
            selection_mode,
            format: InsertFormat::Latex,
        }
    }
}

pub struct Editor {
    root: Atom,
    selection: Range,
    mode: EditMode,
    boundary: BoundaryHandler,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("root", &self.root)
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new(Atom::root(Vec::new()))
    }
}

impl Editor {
    /// Creates an editor for `root` with the caret at the end.
    pub fn new(root: Atom) -> Self {
        let mut editor = Editor {
            root,
            selection: Range::default(),
            mode: EditMode::Math,
            boundary: Box::new(|_| BoundaryAction::Wrap),
        };
        editor.selection = Range::collapsed(editor.end_of_mathfield());
        editor
    }

    #[inline]
    pub fn root(&self) -> &Atom {
        &self.root
    }

    #[inline]
    pub fn atoms(&self) -> &[Atom] {
        self.root.children().unwrap_or_default()
    }

    #[inline]
    pub fn selection(&self) -> &Range {
        &self.selection
    }

    #[inline]
    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// The position the caret is at: the focus of the selection.
    #[inline]
    pub fn caret(&self) -> &Path {
        &self.selection.focus
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.selection.is_collapsed()
    }

    pub fn set_boundary_handler(&mut self, handler: BoundaryHandler) {
        self.boundary = handler;
    }

    /// Replaces the whole state, as for undo and redo.
    pub fn restore(&mut self, root: Atom, selection: Range, mode: EditMode) {
        self.root = root;
        self.selection = selection;
        self.mode = mode;
        if self.validate().is_err() {
            self.selection = Range::collapsed(self.end_of_mathfield());
        }
    }

    /// Replaces the content with `atoms` and puts the caret at the end.
    pub fn set_atoms(&mut self, atoms: Vec<Atom>) {
        self.root = Atom::root(atoms);
        self.mode = EditMode::Math;
        self.selection = Range::collapsed(self.end_of_mathfield());
    }

    /// Whether the caret is inside `\text{...}`, where characters are taken literally.
    pub fn in_text_mode(&self) -> bool {
        self.is_inside(self.caret(), AtomKind::Text)
    }

    /// Checks that the selection resolves in the current tree.
    pub fn validate(&self) -> Result<(), EditError> {
        let Range { anchor, focus } = &self.selection;
        for path in [anchor, focus] {
            if path.is_root() {
                return Err(EditError::InvalidPath(path.clone()));
            }
            path.resolve(&self.root)?;
            if self.in_grid_body(path) {
                return Err(EditError::InvalidPath(path.clone()));
            }
        }
        if !anchor.same_branch(focus) {
            return Err(EditError::InvalidPath(focus.clone()));
        }
        Ok(())
    }

    /// Sets the presentation flags for the current selection and lays out the tree.
    pub fn layout(&mut self, style: Style) -> MathBox {
        self.prepare_for_layout();
        layout(&self.root, style)
    }

    /// Recomputes the caret and selection flags on the whole tree.
    pub fn prepare_for_layout(&mut self) {
        self.root.clear_transient_flags();
        if self.validate().is_err() {
            return;
        }
        let focus = self.selection.focus.clone();
        if !self.selection.is_collapsed() {
            let indices = self.selection.indices();
            if let Some(branch) = focus.branch_mut(&mut self.root) {
                for atom in branch.get_mut(indices).unwrap_or_default() {
                    atom.flags.insert(AtomFlags::SELECTED);
                }
            }
            return;
        }
        if let Some(atom) = focus.atom_mut(&mut self.root) {
            atom.flags.insert(AtomFlags::CARET_AFTER);
        } else if let Some(first) = focus.branch_mut(&mut self.root).and_then(|b| b.first_mut()) {
            first.flags.insert(AtomFlags::CARET_BEFORE);
        } else if let Some(parent) = focus.parent_atom_mut(&mut self.root) {
            parent.flags.insert(AtomFlags::CARET_INSIDE);
        }
    }

    fn set_caret(&mut self, path: Path) {
        self.selection = Range::collapsed(path);
    }

    /// Selects the atoms with indices `first..=last` of the branch `branch` points into.
    fn select_indices(&mut self, branch: &Path, first: usize, last: usize) {
        self.selection = Range::new(
            branch.with_offset(to_offset(first) - 1),
            branch.with_offset(to_offset(last)),
        );
    }

    fn end_of_mathfield(&self) -> Path {
        Path::in_root(last_offset(self.atoms()))
    }

    /// The caret position at the end of the branch `branch` points into.
    fn end_of_branch(&self, branch: &Path) -> Path {
        branch.with_offset(branch.branch(&self.root).map_or(PRE_COLLAPSED, |b| last_offset(b)))
    }

    /// Restores the invariants of a branch after atoms were removed from it.
    ///
    /// Returns where the caret should go: `offset` in the same branch if it still has atoms.
    /// An emptied optional branch is removed and the caret goes after the atom which carried
    /// it. An emptied required branch gets a placeholder.
    fn settle(&mut self, branch: &Path, offset: i32) -> Path {
        let Some(relation) = branch.relation() else {
            return self.end_of_mathfield();
        };
        let owner = branch.parent();
        let Some(parent) = owner.atom_mut(&mut self.root) else {
            return self.end_of_mathfield();
        };
        if parent.branch(relation).is_some_and(|atoms| !atoms.is_empty()) {
            return branch.with_offset(offset);
        }
        if relation.is_optional() {
            parent.remove_branch(relation);
            return owner;
        }
        // Refills required branches with a placeholder.
        parent.set_branch(relation, Vec::new());
        branch.with_offset(PRE_COLLAPSED)
    }

    /// The path of the first placeholder in `atom` or below it.
    fn first_placeholder(atom: &Atom, path: &Path) -> Option<Path> {
        if atom.is_placeholder() {
            return Some(path.clone());
        }
        atom.relations().find_map(|relation| {
            atom.branch(relation)?
                .iter()
                .enumerate()
                .find_map(|(i, child)| {
                    Editor::first_placeholder(child, &path.child(relation, to_offset(i)))
                })
        })
    }

    /// Whether `path` points into the rows of an array or the cells of a row, where only cell
    /// content may be edited.
    fn in_grid_body(&self, path: &Path) -> bool {
        path.relation().is_some_and(|relation| {
            path.parent_atom(&self.root)
                .is_some_and(|owner| is_grid_body(owner.kind(), relation))
        })
    }

    /// Whether the position `path` is inside an atom of the given kind, at any depth.
    fn is_inside(&self, path: &Path, kind: AtomKind) -> bool {
        (1..path.depth()).any(|depth| {
            path.truncated(depth)
                .atom(&self.root)
                .is_some_and(|atom| atom.kind() == kind)
        })
    }
}

/// Whether a branch holds nothing but one bare placeholder.
pub(crate) fn is_placeholder_only(branch: &[Atom]) -> bool {
    matches!(branch, [atom] if atom.is_placeholder() && atom.is_leaf())
}

#[inline]
pub(crate) fn to_offset(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// The offset of the caret at the end of `branch`.
///
/// This is the leading gap for a branch holding only a placeholder.
pub(crate) fn last_offset(branch: &[Atom]) -> i32 {
    if is_placeholder_only(branch) {
        PRE_COLLAPSED
    } else {
        to_offset(branch.len()) - 1
    }
}

/// Whether `relation` of an atom of kind `kind` is the body of a grid.
#[inline]
fn is_grid_body(kind: AtomKind, relation: Relation) -> bool {
    relation == Relation::Body && kind.is_grid()
}
