//! Internal library for the `mathfield` crate holding the expression tree and its layout.
//!
//! This library allows you to build a tree of atoms, serialize it to LaTeX and lay it out
//! as a tree of positioned boxes.
//!
//! # Example
//!
//! ```rust
//! use mathfield_renderer_internal::atom::{Atom, AtomKind, Relation};
//! use mathfield_renderer_internal::latex::to_latex;
//! use mathfield_renderer_internal::layout::layout;
//! use mathfield_renderer_internal::style::Style;
//!
//! let mut x = Atom::char(AtomKind::Ord, 'x');
//! x.set_branch(Relation::Superscript, vec![Atom::char(AtomKind::Ord, '2')]);
//! let root = Atom::root(vec![x]);
//!
//! assert_eq!(to_latex(root.children().unwrap_or_default()), "x^{2}");
//! let boxes = layout(&root, Style::TEXT);
//! assert!(boxes.height > 0.431);
//! ```
pub mod atom;
pub mod class;
pub mod latex;
pub mod layout;
pub mod mbox;
pub mod style;
pub mod symbol;
