use std::cmp::Ordering;

use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDirection {
    Forward,
    Backward,
    None,
}

/// A selection between two positions in the same branch.
///
/// The selected atoms are those with an offset greater than [`Range::start`] and at most
/// [`Range::end`], together with their descendants. A collapsed range is a caret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Range {
    pub anchor: Path,
    pub focus: Path,
}

impl Range {
    pub fn new(anchor: Path, focus: Path) -> Self {
        Range { anchor, focus }
    }

    /// A caret at `path`.
    pub fn collapsed(path: Path) -> Self {
        Range {
            anchor: path.clone(),
            focus: path,
        }
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn direction(&self) -> SelectionDirection {
        match self.anchor.cmp(&self.focus) {
            Ordering::Less => SelectionDirection::Forward,
            Ordering::Greater => SelectionDirection::Backward,
            Ordering::Equal => SelectionDirection::None,
        }
    }

    /// The offset of the gap where the selection starts.
    #[inline]
    pub fn start(&self) -> i32 {
        self.anchor.offset().min(self.focus.offset())
    }

    /// The offset of the last selected atom.
    #[inline]
    pub fn end(&self) -> i32 {
        self.anchor.offset().max(self.focus.offset())
    }

    /// The position before the selection.
    pub fn start_path(&self) -> Path {
        self.focus.with_offset(self.start())
    }

    /// The position after the selection.
    pub fn end_path(&self) -> Path {
        self.focus.with_offset(self.end())
    }

    /// The indices of the selected atoms in their branch.
    pub fn indices(&self) -> std::ops::Range<usize> {
        let start = usize::try_from(self.start() + 1).unwrap_or(0);
        let end = usize::try_from(self.end() + 1).unwrap_or(0);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use box_renderer::atom::Relation;

    use super::*;

    #[test]
    fn caret() {
        let range = Range::collapsed(Path::in_root(1));
        assert!(range.is_collapsed());
        assert_eq!(range.direction(), SelectionDirection::None);
        assert!(range.indices().is_empty());
    }

    #[test]
    fn offsets_and_direction() {
        let range = Range::new(Path::in_root(3), Path::in_root(-1));
        assert_eq!(range.direction(), SelectionDirection::Backward);
        assert_eq!((range.start(), range.end()), (-1, 3));
        assert_eq!(range.indices(), 0..4);
        assert_eq!(range.start_path(), Path::in_root(-1));

        let nested = Path::in_root(0).child(Relation::Numerator, 0);
        let range = Range::new(nested.with_offset(-1), nested.clone());
        assert_eq!(range.direction(), SelectionDirection::Forward);
        assert_eq!(range.indices(), 0..1);
        assert_eq!(range.end_path(), nested);
    }
}
