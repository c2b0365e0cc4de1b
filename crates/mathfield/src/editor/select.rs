use std::cmp::Ordering;

use box_renderer::atom::{Atom, AtomId, AtomKind};

use super::{Direction, Editor, is_placeholder_only, to_offset};
use crate::error::EditError;
use crate::path::{PRE_COLLAPSED, Path};
use crate::selection::Range;

/// Where a path lies relative to a branch it starts with.
#[derive(Debug, Clone, Copy)]
enum Position {
    /// At a gap of the branch.
    Gap(i32),
    /// Somewhere inside the atom at this offset.
    Inside(i32),
}

impl Position {
    fn of(path: &Path, depth: usize) -> Position {
        let offset = path
            .steps()
            .get(depth - 1)
            .map_or(PRE_COLLAPSED, |step| step.offset);
        if path.depth() > depth {
            Position::Inside(offset)
        } else {
            Position::Gap(offset)
        }
    }

    /// Orders gaps and atoms of the branch: gap -1, atom 0, gap 0, atom 1, …
    fn rank(self) -> i64 {
        match self {
            Position::Gap(offset) => 2 * i64::from(offset) + 2,
            Position::Inside(offset) => 2 * i64::from(offset) + 1,
        }
    }

    fn before(self) -> i32 {
        match self {
            Position::Gap(offset) => offset,
            Position::Inside(offset) => offset - 1,
        }
    }

    fn after(self) -> i32 {
        match self {
            Position::Gap(offset) | Position::Inside(offset) => offset,
        }
    }
}

/// The depth of the deepest branch both paths lie in.
fn common_depth(a: &Path, b: &Path) -> usize {
    let mut depth = 0;
    for (x, y) in a.steps().iter().zip(b.steps()) {
        if x.relation != y.relation {
            break;
        }
        depth += 1;
        if x.offset != y.offset {
            break;
        }
    }
    depth
}

#[inline]
fn is_separator(atom: &Atom) -> bool {
    matches!(atom.kind(), AtomKind::Rel | AtomKind::Punct)
}

impl Editor {
    /// Selects from `anchor` to `focus`.
    ///
    /// Paths in different branches are lifted to their deepest common branch. A path below that
    /// branch stands for the atom containing it, which is then fully selected. Selections
    /// spanning several cells of an array select the whole array.
    pub fn set_range(&mut self, anchor: Path, focus: Path) -> Result<(), EditError> {
        for path in [&anchor, &focus] {
            if path.is_root() {
                return Err(EditError::InvalidPath(path.clone()));
            }
            path.resolve(&self.root)?;
            if self.in_grid_body(path) {
                return Err(EditError::InvalidPath(path.clone()));
            }
        }
        if anchor == focus && focus.branch(&self.root).is_some_and(|b| is_placeholder_only(b)) {
            // A caret next to a lone placeholder sits in the leading gap.
            self.set_caret(focus.with_offset(PRE_COLLAPSED));
            return Ok(());
        }
        if anchor.same_branch(&focus) {
            self.selection = Range::new(anchor, focus);
            return Ok(());
        }
        let mut depth = common_depth(&anchor, &focus);
        while depth > 1
            && anchor
                .truncated(depth - 1)
                .atom(&self.root)
                .is_some_and(|atom| atom.kind().is_grid())
        {
            depth -= 1;
        }
        if depth == 0 {
            return Err(EditError::InvalidPath(focus));
        }
        let a = Position::of(&anchor, depth);
        let f = Position::of(&focus, depth);
        let (anchor_offset, focus_offset) = match a.rank().cmp(&f.rank()) {
            Ordering::Less => (a.before(), f.after()),
            Ordering::Greater => (a.after(), f.before()),
            Ordering::Equal => (a.before(), a.after()),
        };
        let branch = anchor.truncated(depth);
        self.selection = Range::new(
            branch.with_offset(anchor_offset),
            branch.with_offset(focus_offset),
        );
        Ok(())
    }

    pub fn select_all(&mut self) -> Result<(), EditError> {
        self.validate()?;
        let end = self.atoms().len();
        if end == 0 {
            self.set_caret(Path::in_root(PRE_COLLAPSED));
        } else {
            self.select_indices(&Path::in_root(PRE_COLLAPSED), 0, end - 1);
        }
        Ok(())
    }

    /// Grows the selection: first to the run between the nearest relations or punctuation,
    /// then to the whole branch, then to the atom owning the branch.
    pub fn select_group(&mut self) -> Result<(), EditError> {
        self.validate()?;
        let focus = self.selection.focus.clone();
        let indices = self.selection.indices();
        let Some(branch) = focus.branch(&self.root) else {
            return Err(EditError::InvalidPath(focus));
        };
        let len = branch.len();
        let mut start = indices.start;
        let mut end = indices.end;
        while start > 0 && branch.get(start - 1).is_some_and(|atom| !is_separator(atom)) {
            start -= 1;
        }
        while branch.get(end).is_some_and(|atom| !is_separator(atom)) {
            end += 1;
        }
        let run = if start < end && (start..end) != indices {
            Some(start..end)
        } else if len > 0 && indices != (0..len) {
            Some(0..len)
        } else {
            None
        };
        match run {
            Some(run) => self.select_indices(&focus, run.start, run.end - 1),
            None => self.select_owner(&focus, Direction::Forward),
        }
        Ok(())
    }

    /// Selects the atom owning the branch `branch` points into, passing over array rows and
    /// cells. At the top level everything is selected.
    fn select_owner(&mut self, branch: &Path, direction: Direction) {
        let mut owner = branch.parent();
        while owner
            .atom(&self.root)
            .is_some_and(|atom| matches!(atom.kind(), AtomKind::ArrayRow | AtomKind::ArrayCell))
        {
            owner = owner.parent();
        }
        if owner.is_root() {
            let end = self.atoms().len();
            if end > 0 {
                self.select_indices(&Path::in_root(PRE_COLLAPSED), 0, end - 1);
            }
            return;
        }
        let offset = owner.offset();
        self.selection = match direction {
            Direction::Forward => Range::new(owner.with_offset(offset - 1), owner),
            Direction::Backward => Range::new(owner.clone(), owner.with_offset(offset - 1)),
        };
    }

    pub fn extend_to_next_char(&mut self) -> Result<(), EditError> {
        self.extend(Direction::Forward)
    }

    pub fn extend_to_previous_char(&mut self) -> Result<(), EditError> {
        self.extend(Direction::Backward)
    }

    /// Moves the focus by one atom, keeping the anchor. Past either end of the branch the
    /// owning atom gets selected.
    fn extend(&mut self, direction: Direction) -> Result<(), EditError> {
        self.validate()?;
        let focus = self.selection.focus.clone();
        let len = focus.branch(&self.root).map_or(0, Vec::len);
        let offset = focus.offset();
        let next = match direction {
            Direction::Forward => offset + 1,
            Direction::Backward => offset - 1,
        };
        if (PRE_COLLAPSED..to_offset(len)).contains(&next) {
            self.selection.focus = focus.with_offset(next);
        } else {
            self.select_owner(&focus, direction);
        }
        Ok(())
    }

    /// Whether the atom with identity `id` is selected, directly or through an ancestor.
    pub fn contains(&self, id: AtomId) -> bool {
        let Some(branch) = self.selection.focus.branch(&self.root) else {
            return false;
        };
        branch
            .get(self.selection.indices())
            .unwrap_or_default()
            .iter()
            .any(|atom| atom.find(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use box_renderer::atom::Relation;

    use super::super::tests::editor_at;
    use super::*;

    fn range(editor: &Editor) -> (String, String) {
        let Range { anchor, focus } = editor.selection();
        (anchor.to_string(), focus.to_string())
    }

    fn path(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn deeper_paths_are_lifted() {
        let mut editor = editor_at(r"a+\frac{b}{c}+d", "body:-1");
        editor
            .set_range(path("body:0"), path("body:2/denominator:0"))
            .unwrap();
        assert_eq!(range(&editor), ("body:0".into(), "body:2".into()));

        editor
            .set_range(path("body:2/numerator:0"), path("body:-1"))
            .unwrap();
        assert_eq!(range(&editor), ("body:2".into(), "body:-1".into()));

        editor
            .set_range(path("body:2/numerator:0"), path("body:2/denominator:-1"))
            .unwrap();
        assert_eq!(range(&editor), ("body:1".into(), "body:2".into()));
    }

    #[test]
    fn cells_lift_to_the_array() {
        let mut editor = editor_at(r"x=\begin{matrix}a&b\end{matrix}", "body:-1");
        editor
            .set_range(
                path("body:2/body:0/body:0/body:0"),
                path("body:2/body:0/body:1/body:-1"),
            )
            .unwrap();
        assert_eq!(range(&editor), ("body:1".into(), "body:2".into()));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let mut editor = editor_at("ab", "body:1");
        assert!(editor.set_range(path("body:0"), path("body:5")).is_err());
        assert!(editor.set_range(Path::root(), path("body:0")).is_err());
        assert_eq!(range(&editor), ("body:1".into(), "body:1".into()));
    }

    #[test]
    fn grid_bodies_take_no_caret() {
        let mut editor = editor_at(r"\begin{matrix}a&b\end{matrix}", "body:0/body:0/body:0/body:0");
        assert!(editor.set_range(path("body:0/body:0"), path("body:0/body:0")).is_err());
        assert!(
            editor
                .set_range(path("body:0/body:0/body:1"), path("body:0/body:0/body:1"))
                .is_err()
        );
        assert!(editor.set_range(path("body:0/body:-1"), path("body:-1")).is_err());
        assert_eq!(
            range(&editor),
            (
                "body:0/body:0/body:0/body:0".into(),
                "body:0/body:0/body:0/body:0".into()
            )
        );
    }

    #[test]
    fn caret_beside_a_placeholder_is_leading() {
        let mut editor = editor_at(r"a\frac{\placeholder{}}{b}", "body:-1");
        editor
            .set_range(path("body:1/numerator:0"), path("body:1/numerator:0"))
            .unwrap();
        assert_eq!(
            range(&editor),
            ("body:1/numerator:-1".into(), "body:1/numerator:-1".into())
        );
        editor.move_to_next_char().unwrap();
        assert_eq!(
            range(&editor),
            ("body:1/denominator:-1".into(), "body:1/denominator:-1".into())
        );
    }

    #[test]
    fn select_group_grows() {
        let mut editor = editor_at("a+b=c", "body:0");
        editor.select_group().unwrap();
        assert_eq!(range(&editor), ("body:-1".into(), "body:2".into()));
        editor.select_group().unwrap();
        assert_eq!(range(&editor), ("body:-1".into(), "body:4".into()));

        let mut editor = editor_at(r"\sqrt{xy}", "body:0/radicand:0");
        editor.select_group().unwrap();
        assert_eq!(
            range(&editor),
            ("body:0/radicand:-1".into(), "body:0/radicand:1".into())
        );
        editor.select_group().unwrap();
        assert_eq!(range(&editor), ("body:-1".into(), "body:0".into()));
    }

    #[test]
    fn extending_by_chars() {
        let mut editor = editor_at(r"a\frac{b}{c}", "body:1/numerator:-1");
        editor.extend_to_next_char().unwrap();
        assert_eq!(
            range(&editor),
            ("body:1/numerator:-1".into(), "body:1/numerator:0".into())
        );
        editor.extend_to_next_char().unwrap();
        assert_eq!(range(&editor), ("body:0".into(), "body:1".into()));
        editor.extend_to_previous_char().unwrap();
        assert_eq!(range(&editor), ("body:0".into(), "body:0".into()));
        assert!(editor.is_collapsed());
        editor.extend_to_previous_char().unwrap();
        assert_eq!(range(&editor), ("body:0".into(), "body:-1".into()));
    }

    #[test]
    fn containment_covers_descendants() {
        let mut editor = editor_at(r"a+\frac{b}{c}", "body:-1");
        let frac = &editor.atoms()[2];
        let numer = frac.branch(Relation::Numerator).unwrap()[0].id();
        let a = editor.atoms()[0].id();
        let plus = editor.atoms()[1].id();
        editor.set_range(path("body:0"), path("body:2")).unwrap();
        assert!(editor.contains(numer));
        assert!(editor.contains(plus));
        assert!(!editor.contains(a));
        editor.select_all().unwrap();
        assert!(editor.contains(a));
    }
}
