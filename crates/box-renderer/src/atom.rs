use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use strum_macros::{EnumString, IntoStaticStr};

use crate::class::Class;

/// Stable identity of an atom.
///
/// Identities are minted from a process-wide counter and are never reused while the process
/// runs. Cloning an atom keeps its identity, so an undo snapshot refers to the same atoms as the
/// tree it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(NonZeroU32);

static_assertions::assert_eq_size!(AtomId, Option<AtomId>);

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

impl AtomId {
    pub fn fresh() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        AtomId(NonZeroU32::new(id).unwrap_or(NonZeroU32::MIN))
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum AtomKind {
    /// The single root of an expression tree.
    Root,
    /// A braced group, e.g. `{a+b}`.
    Group,
    /// An ordinary symbol: letters, digits, `\alpha`, `\infty`.
    Ord,
    /// A binary operator, e.g. `+` or `\times`.
    Bin,
    /// A relation, e.g. `=` or `\le`.
    Rel,
    /// Punctuation, e.g. `,`.
    Punct,
    /// An opening delimiter.
    Open,
    /// A closing delimiter.
    Close,
    /// A large operator (`\sum`) or a named function (`\sin`).
    Op,
    /// `\frac` and its variants.
    Fraction,
    /// `\sqrt`, optionally with an index.
    Radical,
    /// An accent over its body, e.g. `\hat{x}`.
    Accent,
    /// A font variant applied to its body, e.g. `\mathbb{R}`.
    Font,
    /// Text-mode content, e.g. `\text{if}`.
    Text,
    /// Fixed horizontal space, e.g. `\,` or `\quad`.
    Space,
    /// An empty slot waiting for content.
    Placeholder,
    /// A control sequence that could not be resolved.
    UnknownCommand,
    /// One character of a command being typed in command mode.
    Command,
    /// A matrix-like environment. Its children are rows.
    Array,
    /// One row of an array. Its children are cells.
    ArrayRow,
    /// One cell of an array row.
    ArrayCell,
}

/// The shape of the structural body an atom kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    Leaf,
    Children,
    Fraction,
    Radical,
}

impl AtomKind {
    pub const fn body_shape(self) -> BodyShape {
        match self {
            AtomKind::Root
            | AtomKind::Group
            | AtomKind::Accent
            | AtomKind::Font
            | AtomKind::Text
            | AtomKind::Array
            | AtomKind::ArrayRow
            | AtomKind::ArrayCell => BodyShape::Children,
            AtomKind::Fraction => BodyShape::Fraction,
            AtomKind::Radical => BodyShape::Radical,
            AtomKind::Ord
            | AtomKind::Bin
            | AtomKind::Rel
            | AtomKind::Punct
            | AtomKind::Open
            | AtomKind::Close
            | AtomKind::Op
            | AtomKind::Space
            | AtomKind::Placeholder
            | AtomKind::UnknownCommand
            | AtomKind::Command => BodyShape::Leaf,
        }
    }

    /// Whether superscripts and subscripts may be attached to atoms of this kind.
    pub const fn allows_scripts(self) -> bool {
        !matches!(
            self,
            AtomKind::Root | AtomKind::ArrayRow | AtomKind::ArrayCell | AtomKind::Command
        )
    }

    /// Whether an emptied body is refilled with a placeholder.
    pub const fn requires_body(self) -> bool {
        matches!(
            self,
            AtomKind::Accent | AtomKind::Font | AtomKind::ArrayCell
        )
    }

    /// Containers whose own body gaps are not editable positions.
    pub const fn is_grid(self) -> bool {
        matches!(self, AtomKind::Array | AtomKind::ArrayRow)
    }

    /// The spacing class of an atom of this kind, or `None` for atoms that are transparent to
    /// inter-atom spacing.
    pub const fn class(self) -> Option<Class> {
        match self {
            AtomKind::Bin => Some(Class::BinaryOp),
            AtomKind::Rel => Some(Class::Relation),
            AtomKind::Punct => Some(Class::Punctuation),
            AtomKind::Open => Some(Class::Open),
            AtomKind::Close => Some(Class::Close),
            AtomKind::Op => Some(Class::Operator),
            AtomKind::Fraction | AtomKind::Array => Some(Class::Inner),
            AtomKind::Space | AtomKind::Command | AtomKind::Root => None,
            AtomKind::Group
            | AtomKind::Ord
            | AtomKind::Radical
            | AtomKind::Accent
            | AtomKind::Font
            | AtomKind::Text
            | AtomKind::Placeholder
            | AtomKind::UnknownCommand
            | AtomKind::ArrayRow
            | AtomKind::ArrayCell => Some(Class::Default),
        }
    }
}

/// Names a branch of an atom.
///
/// The declaration order is document order, which navigation follows.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, IntoStaticStr, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[repr(u8)]
pub enum Relation {
    #[default]
    Body,
    Superscript,
    Subscript,
    Numerator,
    Denominator,
    Index,
    Radicand,
}

impl Relation {
    pub const ALL: [Relation; 7] = [
        Relation::Body,
        Relation::Superscript,
        Relation::Subscript,
        Relation::Numerator,
        Relation::Denominator,
        Relation::Index,
        Relation::Radicand,
    ];

    #[inline]
    pub const fn is_script(self) -> bool {
        matches!(self, Relation::Superscript | Relation::Subscript)
    }

    /// Optional branches disappear when they become empty.
    #[inline]
    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Relation::Superscript | Relation::Subscript | Relation::Index
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Leaf,
    Children(Vec<Atom>),
    Fraction {
        numer: Vec<Atom>,
        denom: Vec<Atom>,
    },
    Radical {
        radicand: Vec<Atom>,
        index: Option<Vec<Atom>>,
    },
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AtomFlags: u8 {
        /// The caret sits right after this atom.
        const CARET_AFTER = 1;
        /// The caret sits right before this atom.
        const CARET_BEFORE = 1 << 1;
        /// The caret sits inside this atom's empty body.
        const CARET_INSIDE = 1 << 2;
        const SELECTED = 1 << 3;
        /// Decoration for unresolved or invalid input.
        const ERROR = 1 << 4;
        /// Decoration for command-mode completions that have not been accepted.
        const SUGGESTION = 1 << 5;

        const TRANSIENT = Self::CARET_AFTER.bits()
            | Self::CARET_BEFORE.bits()
            | Self::CARET_INSIDE.bits()
            | Self::SELECTED.bits();
    }
}

/// A node of the expression tree.
///
/// Equality compares the structure only: identities and flags are ignored.
#[derive(Debug, Clone)]
pub struct Atom {
    id: AtomId,
    kind: AtomKind,
    value: Option<Box<str>>,
    glyph: Option<char>,
    body: Body,
    superscript: Option<Vec<Atom>>,
    subscript: Option<Vec<Atom>>,
    pub flags: AtomFlags,
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.value == other.value
            && self.glyph == other.glyph
            && self.body == other.body
            && self.superscript == other.superscript
            && self.subscript == other.subscript
    }
}

impl Atom {
    /// Creates an atom with an empty body of the right shape.
    ///
    /// Required branches of fractions and radicals start out holding a placeholder.
    pub fn new(kind: AtomKind) -> Self {
        let body = match kind.body_shape() {
            BodyShape::Leaf => Body::Leaf,
            BodyShape::Children => Body::Children(if kind.requires_body() {
                vec![Atom::placeholder()]
            } else {
                Vec::new()
            }),
            BodyShape::Fraction => Body::Fraction {
                numer: vec![Atom::placeholder()],
                denom: vec![Atom::placeholder()],
            },
            BodyShape::Radical => Body::Radical {
                radicand: vec![Atom::placeholder()],
                index: None,
            },
        };
        Atom {
            id: AtomId::fresh(),
            kind,
            value: None,
            glyph: None,
            body,
            superscript: None,
            subscript: None,
            flags: AtomFlags::empty(),
        }
    }

    pub fn root(children: Vec<Atom>) -> Self {
        Atom::new(AtomKind::Root).with_children(children)
    }

    pub fn placeholder() -> Self {
        Atom {
            id: AtomId::fresh(),
            kind: AtomKind::Placeholder,
            value: None,
            glyph: None,
            body: Body::Leaf,
            superscript: None,
            subscript: None,
            flags: AtomFlags::empty(),
        }
    }

    /// A leaf for a literal character, e.g. `x` or `+`.
    pub fn char(kind: AtomKind, ch: char) -> Self {
        let mut buf = [0u8; 4];
        Atom::new(kind)
            .with_value(ch.encode_utf8(&mut buf))
            .with_glyph(Some(ch))
    }

    /// A leaf produced by a control sequence, e.g. `\alpha` drawn as `α`.
    pub fn symbol(kind: AtomKind, command: &str, glyph: Option<char>) -> Self {
        Atom::new(kind).with_value(command).with_glyph(glyph)
    }

    pub fn fraction(command: &str, numer: Vec<Atom>, denom: Vec<Atom>) -> Self {
        let mut atom = Atom::new(AtomKind::Fraction).with_value(command);
        atom.body = Body::Fraction {
            numer: non_empty(numer),
            denom: non_empty(denom),
        };
        atom
    }

    pub fn radical(radicand: Vec<Atom>, index: Option<Vec<Atom>>) -> Self {
        let mut atom = Atom::new(AtomKind::Radical).with_value(r"\sqrt");
        atom.body = Body::Radical {
            radicand: non_empty(radicand),
            index: index.filter(|index| !index.is_empty()),
        };
        atom
    }

    /// An atom whose body is a plain sequence: groups, accents, fonts, text and arrays.
    pub fn wrapper(kind: AtomKind, command: Option<&str>, children: Vec<Atom>) -> Self {
        let atom = Atom::new(kind).with_children(children);
        match command {
            Some(command) => atom.with_value(command),
            None => atom,
        }
    }

    /// One character typed in command mode.
    pub fn command_char(ch: char) -> Self {
        Atom::char(AtomKind::Command, ch)
    }

    #[must_use]
    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_glyph(mut self, glyph: Option<char>) -> Self {
        self.glyph = glyph;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: AtomFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    fn with_children(mut self, children: Vec<Atom>) -> Self {
        if let Body::Children(body) = &mut self.body {
            *body = if children.is_empty() && self.kind.requires_body() {
                vec![Atom::placeholder()]
            } else {
                children
            };
        }
        self
    }

    #[inline]
    pub fn id(&self) -> AtomId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    /// The literal character, command name or environment name of this atom.
    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[inline]
    pub fn glyph(&self) -> Option<char> {
        self.glyph
    }

    #[inline]
    pub fn body(&self) -> &Body {
        &self.body
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.kind == AtomKind::Placeholder
    }

    /// Whether this is a `{...}` group without scripts.
    #[inline]
    pub fn is_bare_group(&self) -> bool {
        self.kind == AtomKind::Group && self.superscript.is_none() && self.subscript.is_none()
    }

    #[inline]
    pub fn children(&self) -> Option<&[Atom]> {
        match &self.body {
            Body::Children(children) => Some(children),
            _ => None,
        }
    }

    #[inline]
    pub fn superscript(&self) -> Option<&[Atom]> {
        self.superscript.as_deref()
    }

    #[inline]
    pub fn subscript(&self) -> Option<&[Atom]> {
        self.subscript.as_deref()
    }

    pub fn branch(&self, relation: Relation) -> Option<&Vec<Atom>> {
        match (relation, &self.body) {
            (Relation::Superscript, _) => self.superscript.as_ref(),
            (Relation::Subscript, _) => self.subscript.as_ref(),
            (Relation::Body, Body::Children(children)) => Some(children),
            (Relation::Numerator, Body::Fraction { numer, .. }) => Some(numer),
            (Relation::Denominator, Body::Fraction { denom, .. }) => Some(denom),
            (Relation::Radicand, Body::Radical { radicand, .. }) => Some(radicand),
            (Relation::Index, Body::Radical { index, .. }) => index.as_ref(),
            _ => None,
        }
    }

    pub fn branch_mut(&mut self, relation: Relation) -> Option<&mut Vec<Atom>> {
        match (relation, &mut self.body) {
            (Relation::Superscript, _) => self.superscript.as_mut(),
            (Relation::Subscript, _) => self.subscript.as_mut(),
            (Relation::Body, Body::Children(children)) => Some(children),
            (Relation::Numerator, Body::Fraction { numer, .. }) => Some(numer),
            (Relation::Denominator, Body::Fraction { denom, .. }) => Some(denom),
            (Relation::Radicand, Body::Radical { radicand, .. }) => Some(radicand),
            (Relation::Index, Body::Radical { index, .. }) => index.as_mut(),
            _ => None,
        }
    }

    /// The branches present on this atom, in document order.
    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        Relation::ALL
            .into_iter()
            .filter(|relation| self.branch(*relation).is_some())
    }

    /// Returns the optional branch `relation`, creating it with a placeholder when absent.
    ///
    /// Returns `None` if this kind of atom cannot carry the branch.
    pub fn branch_or_insert(&mut self, relation: Relation) -> Option<&mut Vec<Atom>> {
        let allowed = match relation {
            Relation::Superscript | Relation::Subscript => self.kind.allows_scripts(),
            Relation::Index => matches!(self.body, Body::Radical { .. }),
            _ => false,
        };
        if allowed && self.branch(relation).is_none() {
            self.set_branch(relation, vec![Atom::placeholder()]);
        }
        self.branch_mut(relation)
    }

    /// Replaces the content of a branch.
    ///
    /// An empty sequence removes optional branches and refills required ones with a placeholder.
    /// Returns `false` if the atom cannot carry the branch.
    pub fn set_branch(&mut self, relation: Relation, atoms: Vec<Atom>) -> bool {
        if atoms.is_empty() && relation.is_optional() {
            self.remove_branch(relation);
            return true;
        }
        match relation {
            Relation::Superscript if self.kind.allows_scripts() => {
                self.superscript = Some(atoms);
                true
            }
            Relation::Subscript if self.kind.allows_scripts() => {
                self.subscript = Some(atoms);
                true
            }
            Relation::Index => {
                if let Body::Radical { index, .. } = &mut self.body {
                    *index = Some(atoms);
                    true
                } else {
                    false
                }
            }
            Relation::Superscript | Relation::Subscript => false,
            _ => {
                let refill = self.branch_requires_content(relation);
                match self.branch_mut(relation) {
                    Some(branch) => {
                        *branch = if atoms.is_empty() && refill {
                            vec![Atom::placeholder()]
                        } else {
                            atoms
                        };
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Detaches an optional branch and returns its content.
    pub fn remove_branch(&mut self, relation: Relation) -> Option<Vec<Atom>> {
        match relation {
            Relation::Superscript => self.superscript.take(),
            Relation::Subscript => self.subscript.take(),
            Relation::Index => match &mut self.body {
                Body::Radical { index, .. } => index.take(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether an emptied branch must be refilled with a placeholder rather than left empty.
    pub fn branch_requires_content(&self, relation: Relation) -> bool {
        match relation {
            Relation::Numerator | Relation::Denominator | Relation::Radicand => true,
            Relation::Body => self.kind.requires_body(),
            Relation::Superscript | Relation::Subscript | Relation::Index => false,
        }
    }

    /// Whether every branch of this atom is empty or holds only a placeholder.
    pub fn is_hollow(&self) -> bool {
        self.relations().all(|relation| {
            self.branch(relation)
                .is_none_or(|branch| branch.iter().all(Atom::is_placeholder))
        })
    }

    /// Whether this atom has no branches at all.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, Body::Leaf) && self.superscript.is_none() && self.subscript.is_none()
    }

    /// Visits this atom and all its descendants in document order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Atom)) {
        f(self);
        for relation in self.relations() {
            if let Some(branch) = self.branch(relation) {
                for atom in branch {
                    atom.walk(f);
                }
            }
        }
    }

    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Atom)) {
        f(self);
        for relation in Relation::ALL {
            if let Some(branch) = self.branch_mut(relation) {
                for atom in branch {
                    atom.walk_mut(f);
                }
            }
        }
    }

    pub fn find(&self, id: AtomId) -> Option<&Atom> {
        let mut found = None;
        self.walk(&mut |atom| {
            if found.is_none() && atom.id == id {
                found = Some(atom);
            }
        });
        found
    }

    /// A deep copy of this subtree in which every atom has a new identity.
    #[must_use]
    pub fn with_fresh_ids(&self) -> Atom {
        let mut copy = self.clone();
        copy.walk_mut(&mut |atom| atom.id = AtomId::fresh());
        copy
    }

    /// Clears caret and selection flags on the whole subtree.
    pub fn clear_transient_flags(&mut self) {
        self.walk_mut(&mut |atom| atom.flags.remove(AtomFlags::TRANSIENT));
    }

    /// Checks the structural invariants on the whole subtree.
    pub fn is_well_formed(&self) -> bool {
        let shape_ok = matches!(
            (self.kind.body_shape(), &self.body),
            (BodyShape::Leaf, Body::Leaf)
                | (BodyShape::Children, Body::Children(_))
                | (BodyShape::Fraction, Body::Fraction { .. })
                | (BodyShape::Radical, Body::Radical { .. })
        );
        let scripts_ok = self.kind.allows_scripts()
            || (self.superscript.is_none() && self.subscript.is_none());
        let children_ok = match (self.kind, self.children()) {
            (AtomKind::Array, Some(rows)) => rows.iter().all(|row| row.kind == AtomKind::ArrayRow),
            (AtomKind::ArrayRow, Some(cells)) => {
                cells.iter().all(|cell| cell.kind == AtomKind::ArrayCell)
            }
            _ => true,
        };
        shape_ok
            && scripts_ok
            && children_ok
            && self.relations().all(|relation| {
                self.branch(relation).is_some_and(|branch| {
                    let filled = !branch.is_empty()
                        || !(relation.is_optional() || self.branch_requires_content(relation));
                    filled && branch.iter().all(Atom::is_well_formed)
                })
            })
    }
}

fn non_empty(atoms: Vec<Atom>) -> Vec<Atom> {
    if atoms.is_empty() {
        vec![Atom::placeholder()]
    } else {
        atoms
    }
}
