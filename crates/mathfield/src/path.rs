//! Positions in an expression tree.
//!
//! A [`Path`] is a value: it holds no reference into a tree and has to be resolved against one.
//! Two equal paths denote the same logical position in any tree.

use std::fmt;
use std::str::FromStr;

use box_renderer::atom::{Atom, Relation};
use tinyvec::TinyVec;

use crate::error::EditError;

/// The offset of the gap before the first atom of a branch.
pub const PRE_COLLAPSED: i32 = -1;

/// One level of a path: a branch of the current atom and a position in that branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Step {
    pub relation: Relation,
    pub offset: i32,
}

impl Step {
    #[inline]
    pub const fn new(relation: Relation, offset: i32) -> Self {
        Step { relation, offset }
    }

    /// The index of the addressed atom, or `None` for the leading gap.
    #[inline]
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.offset).ok()
    }
}

/// A sequence of steps from the root.
///
/// Every step but the last must address an atom. The last step addresses an atom (the caret
/// sits right after it) or, with [`PRE_COLLAPSED`], the gap before the first atom. The empty
/// path denotes the root atom itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    steps: TinyVec<[Step; 4]>,
}

/// What a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Atom(&'a Atom),
    /// The gap before the first atom of a branch.
    Gap { parent: &'a Atom, relation: Relation },
}

impl Path {
    #[inline]
    pub fn root() -> Self {
        Path::default()
    }

    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Path {
            steps: steps.into_iter().collect(),
        }
    }

    /// A position in the body of the root.
    pub fn in_root(offset: i32) -> Self {
        Path::root().child(Relation::Body, offset)
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn last(&self) -> Option<Step> {
        self.steps.last().copied()
    }

    /// The offset of the last step.
    #[inline]
    pub fn offset(&self) -> i32 {
        self.last().map_or(PRE_COLLAPSED, |step| step.offset)
    }

    /// The branch of the last step.
    #[inline]
    pub fn relation(&self) -> Option<Relation> {
        self.last().map(|step| step.relation)
    }

    /// The path of the atom owning the branch this path points into.
    #[must_use]
    pub fn parent(&self) -> Path {
        let mut steps = self.steps.clone();
        steps.pop();
        Path { steps }
    }

    /// The same branch at another offset.
    #[must_use]
    pub fn with_offset(&self, offset: i32) -> Path {
        let mut steps = self.steps.clone();
        if let Some(last) = steps.last_mut() {
            last.offset = offset;
        }
        Path { steps }
    }

    /// A position in a branch of the atom this path addresses.
    #[must_use]
    pub fn child(&self, relation: Relation, offset: i32) -> Path {
        let mut steps = self.steps.clone();
        steps.push(Step::new(relation, offset));
        Path { steps }
    }

    /// The first `depth` steps.
    #[must_use]
    pub fn truncated(&self, depth: usize) -> Path {
        Path {
            steps: self.steps.iter().take(depth).copied().collect(),
        }
    }

    /// Whether both paths point into the same branch.
    pub fn same_branch(&self, other: &Path) -> bool {
        let (Some((last, parent)), Some((other_last, other_parent))) =
            (self.steps.split_last(), other.steps.split_last())
        else {
            return false;
        };
        last.relation == other_last.relation && parent == other_parent
    }

    /// Whether `self` starts with all steps of `prefix`.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.steps.starts_with(&prefix.steps)
    }

    /// Resolves this path in the tree below `root`.
    pub fn resolve<'a>(&self, root: &'a Atom) -> Result<Resolved<'a>, EditError> {
        let invalid = || EditError::InvalidPath(self.clone());
        let Some((last, parents)) = self.steps.split_last() else {
            return Ok(Resolved::Atom(root));
        };
        let parent = descend(root, parents).ok_or_else(invalid)?;
        let branch = parent.branch(last.relation).ok_or_else(invalid)?;
        match last.index() {
            Some(index) => branch.get(index).map(Resolved::Atom).ok_or_else(invalid),
            None if last.offset == PRE_COLLAPSED => Ok(Resolved::Gap {
                parent,
                relation: last.relation,
            }),
            None => Err(invalid()),
        }
    }

    #[inline]
    pub fn is_valid(&self, root: &Atom) -> bool {
        self.resolve(root).is_ok()
    }

    /// The atom this path addresses, or `None` for a gap or an invalid path.
    pub fn atom<'a>(&self, root: &'a Atom) -> Option<&'a Atom> {
        descend(root, &self.steps)
    }

    pub fn atom_mut<'a>(&self, root: &'a mut Atom) -> Option<&'a mut Atom> {
        descend_mut(root, &self.steps)
    }

    /// The atom owning the branch this path points into.
    pub fn parent_atom<'a>(&self, root: &'a Atom) -> Option<&'a Atom> {
        let (_, parents) = self.steps.split_last()?;
        descend(root, parents)
    }

    pub fn parent_atom_mut<'a>(&self, root: &'a mut Atom) -> Option<&'a mut Atom> {
        let (_, parents) = self.steps.split_last()?;
        descend_mut(root, parents)
    }

    /// The branch this path points into.
    pub fn branch<'a>(&self, root: &'a Atom) -> Option<&'a Vec<Atom>> {
        let (last, parents) = self.steps.split_last()?;
        descend(root, parents)?.branch(last.relation)
    }

    pub fn branch_mut<'a>(&self, root: &'a mut Atom) -> Option<&'a mut Vec<Atom>> {
        let (last, parents) = self.steps.split_last()?;
        descend_mut(root, parents)?.branch_mut(last.relation)
    }
}

fn descend<'a>(root: &'a Atom, steps: &[Step]) -> Option<&'a Atom> {
    steps.iter().try_fold(root, |atom, step| {
        atom.branch(step.relation)?.get(step.index()?)
    })
}

fn descend_mut<'a>(root: &'a mut Atom, steps: &[Step]) -> Option<&'a mut Atom> {
    let mut atom = root;
    for step in steps {
        atom = atom.branch_mut(step.relation)?.get_mut(step.index()?)?;
    }
    Some(atom)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            let relation: &'static str = step.relation.into();
            write!(f, "{relation}:{}", step.offset)?;
        }
        Ok(())
    }
}

/// Parses paths written like `body:0/numerator:-1`.
impl FromStr for Path {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EditError::InvalidArgument {
            command: "path".into(),
            argument: s.into(),
        };
        if s.is_empty() {
            return Ok(Path::root());
        }
        s.split('/')
            .map(|step| {
                let (relation, offset) = step.split_once(':').ok_or_else(invalid)?;
                let relation = relation.parse::<Relation>().map_err(|_| invalid())?;
                let offset = offset.parse::<i32>().map_err(|_| invalid())?;
                if offset < PRE_COLLAPSED {
                    return Err(invalid());
                }
                Ok(Step::new(relation, offset))
            })
            .collect::<Result<TinyVec<[Step; 4]>, _>>()
            .map(|steps| Path { steps })
    }
}

#[cfg(test)]
mod tests {
    use box_renderer::atom::AtomKind;

    use super::*;

    fn tree() -> Atom {
        // x + \frac{1}{2}
        Atom::root(vec![
            Atom::char(AtomKind::Ord, 'x'),
            Atom::char(AtomKind::Bin, '+'),
            Atom::fraction(
                r"\frac",
                vec![Atom::char(AtomKind::Ord, '1')],
                vec![Atom::char(AtomKind::Ord, '2')],
            ),
        ])
    }

    #[test]
    fn resolves_atoms_and_gaps() {
        let root = tree();
        let path = Path::in_root(2).child(Relation::Denominator, 0);
        match path.resolve(&root) {
            Ok(Resolved::Atom(atom)) => assert_eq!(atom.value(), Some("2")),
            other => panic!("unexpected {other:?}"),
        }
        let gap = Path::in_root(2).child(Relation::Numerator, PRE_COLLAPSED);
        assert!(matches!(
            gap.resolve(&root),
            Ok(Resolved::Gap {
                relation: Relation::Numerator,
                ..
            })
        ));
        assert_eq!(gap.parent_atom(&root).map(Atom::kind), Some(AtomKind::Fraction));
    }

    #[test]
    fn stale_paths_are_rejected() {
        let root = tree();
        for path in [
            Path::in_root(3),
            Path::in_root(0).child(Relation::Superscript, 0),
            Path::in_root(2).child(Relation::Radicand, -1),
            Path::in_root(-2),
        ] {
            assert_eq!(
                path.resolve(&root),
                Err(EditError::InvalidPath(path.clone()))
            );
        }
    }

    #[test]
    fn display_and_parse() {
        let path = Path::in_root(2).child(Relation::Numerator, PRE_COLLAPSED);
        let text = path.to_string();
        assert_eq!(text, "body:2/numerator:-1");
        assert_eq!(text.parse::<Path>(), Ok(path));
        assert_eq!("".parse::<Path>(), Ok(Path::root()));
        assert!("body:2/numer:0".parse::<Path>().is_err());
        assert!("body:-3".parse::<Path>().is_err());
        assert!("body".parse::<Path>().is_err());
    }

    #[test]
    fn order_is_lexicographic() {
        let a = Path::in_root(0);
        let b = Path::in_root(1);
        let c = Path::in_root(0).child(Relation::Superscript, -1);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
        assert!(Path::in_root(-1) < a);
    }

    #[test]
    fn derived_paths() {
        let path = Path::in_root(2).child(Relation::Numerator, 0);
        assert_eq!(path.parent(), Path::in_root(2));
        assert_eq!(path.with_offset(-1).offset(), -1);
        assert!(path.same_branch(&path.with_offset(-1)));
        assert!(!path.same_branch(&Path::in_root(2).child(Relation::Denominator, 0)));
        assert!(path.starts_with(&Path::in_root(2)));
        assert_eq!(path.truncated(1), Path::in_root(2));
    }

    #[test]
    fn mutable_access() {
        let mut root = tree();
        let path = Path::in_root(2).child(Relation::Numerator, 0);
        if let Some(branch) = path.branch_mut(&mut root) {
            branch.push(Atom::char(AtomKind::Ord, '0'));
        }
        assert_eq!(path.branch(&root).map(Vec::len), Some(2));
    }
}
