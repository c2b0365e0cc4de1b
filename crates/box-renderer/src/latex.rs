//! Serialization of atom trees back to LaTeX.
//!
//! The output is normalized: arguments and scripts are always braced, the subscript comes
//! before the superscript and placeholders are written as `\placeholder{}`. Parsing the output
//! and serializing again gives the same string.

use std::fmt::Write;

use crate::atom::{Atom, AtomKind, Body};

pub fn to_latex(atoms: &[Atom]) -> String {
    let mut out = String::new();
    write_latex(&mut out, atoms);
    out
}

/// Appends the LaTeX for a sequence of atoms to `out`.
pub fn write_latex(out: &mut String, atoms: &[Atom]) {
    for atom in atoms {
        write_atom(out, atom);
    }
}

impl Atom {
    pub fn to_latex(&self) -> String {
        let mut out = String::new();
        write_atom(&mut out, self);
        out
    }
}

fn write_atom(out: &mut String, atom: &Atom) {
    let value = atom.value().unwrap_or_default();
    match (atom.kind(), atom.body()) {
        (AtomKind::Root | AtomKind::ArrayRow | AtomKind::ArrayCell, Body::Children(children)) => {
            write_latex(out, children);
        }
        (AtomKind::Group, Body::Children(children)) => write_group(out, children),
        (AtomKind::Command, _) => {}
        (AtomKind::Placeholder, _) => push_token(out, r"\placeholder{}"),
        (AtomKind::Fraction, Body::Fraction { numer, denom }) => {
            push_token(out, value);
            write_group(out, numer);
            write_group(out, denom);
        }
        (AtomKind::Radical, Body::Radical { radicand, index }) => {
            push_token(out, r"\sqrt");
            if let Some(index) = index {
                out.push('[');
                if needs_braced_index(index) {
                    write_group(out, index);
                } else {
                    write_latex(out, index);
                }
                out.push(']');
            }
            write_group(out, radicand);
        }
        (AtomKind::Array, Body::Children(rows)) => {
            // `write!` to a `String` cannot fail.
            let _ = write!(out, r"\begin{{{value}}}");
            for (i, row) in rows.iter().enumerate() {
                if i > 0 {
                    out.push_str(r"\\");
                }
                for (j, cell) in row.children().unwrap_or_default().iter().enumerate() {
                    if j > 0 {
                        out.push('&');
                    }
                    write_atom(out, cell);
                }
            }
            let _ = write!(out, r"\end{{{value}}}");
        }
        (_, Body::Children(children)) => {
            push_token(out, value);
            write_group(out, children);
        }
        _ => push_escaped(out, value),
    }

    if let Some(sub) = atom.subscript() {
        out.push('_');
        write_group(out, sub);
    }
    if let Some(sup) = atom.superscript() {
        out.push('^');
        write_group(out, sup);
    }
}

fn write_group(out: &mut String, atoms: &[Atom]) {
    out.push('{');
    write_latex(out, atoms);
    out.push('}');
}

/// Whether a radical index has to be written as `[{...}]` to be read back: a `]` would end it
/// early, and a lone group would lose its braces.
fn needs_braced_index(index: &[Atom]) -> bool {
    matches!(index, [atom] if atom.is_bare_group())
        || index.iter().any(|atom| atom.value() == Some("]"))
}

/// Single characters with a special meaning in LaTeX are escaped.
fn push_escaped(out: &mut String, text: &str) {
    match text {
        "#" | "$" | "%" | "&" | "_" | "{" | "}" => {
            out.push('\\');
            out.push_str(text);
        }
        _ => push_token(out, text),
    }
}

/// Appends `text`, separating it from a preceding control word if it starts with a letter.
fn push_token(out: &mut String, text: &str) {
    if text.starts_with(|ch: char| ch.is_ascii_alphabetic()) && ends_with_control_word(out) {
        out.push(' ');
    }
    out.push_str(text);
}

fn ends_with_control_word(out: &str) -> bool {
    let letters = out.trim_end_matches(|ch: char| ch.is_ascii_alphabetic());
    if letters.len() == out.len() {
        return false;
    }
    // An odd run of backslashes means the last one starts a control word; `\\` is a newline.
    let backslashes = letters.len() - letters.trim_end_matches('\\').len();
    backslashes % 2 == 1
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::atom::Relation;

    fn ord(ch: char) -> Atom {
        Atom::char(AtomKind::Ord, ch)
    }

    #[test]
    fn scripts_are_braced() {
        let mut x = ord('x');
        x.set_branch(Relation::Superscript, vec![ord('2')]);
        x.set_branch(Relation::Subscript, vec![ord('i')]);
        let atoms = vec![x, Atom::char(AtomKind::Bin, '+'), ord('1')];
        assert_snapshot!(to_latex(&atoms), @"x_{i}^{2}+1");
    }

    #[test]
    fn fractions_and_radicals() {
        let frac = Atom::fraction(r"\frac", vec![ord('1')], vec![ord('2')]);
        assert_snapshot!(frac.to_latex(), @r"\frac{1}{2}");
        let root = Atom::radical(vec![ord('x')], Some(vec![ord('3')]));
        assert_snapshot!(root.to_latex(), @r"\sqrt[3]{x}");
        let empty = Atom::fraction(r"\frac", Vec::new(), Vec::new());
        assert_snapshot!(empty.to_latex(), @r"\frac{\placeholder{}}{\placeholder{}}");
    }

    #[test]
    fn control_words_are_separated_from_letters() {
        let atoms = vec![
            Atom::symbol(AtomKind::Op, r"\sin", None),
            ord('x'),
            Atom::symbol(AtomKind::Ord, r"\pi", Some('π')),
            Atom::symbol(AtomKind::Punct, r"\,", None),
            ord('y'),
        ];
        assert_snapshot!(to_latex(&atoms), @r"\sin x\pi\,y");
    }

    #[test]
    fn wrappers() {
        let bb = Atom::wrapper(AtomKind::Font, Some(r"\mathbb"), vec![ord('A')]);
        assert_snapshot!(bb.to_latex(), @r"\mathbb{A}");
        let text = Atom::wrapper(
            AtomKind::Text,
            Some(r"\text"),
            vec![ord('i'), ord(' '), ord('&')],
        );
        assert_snapshot!(text.to_latex(), @r"\text{i \&}");
        let group = Atom::wrapper(AtomKind::Group, None, vec![ord('a')]);
        assert_snapshot!(group.to_latex(), @"{a}");
    }

    #[test]
    fn specials_are_escaped() {
        let atoms = vec![ord('%'), ord('#'), Atom::char(AtomKind::Open, '(')];
        assert_snapshot!(to_latex(&atoms), @r"\%\#(");
    }

    #[test]
    fn command_atoms_are_not_written() {
        let atoms = vec![ord('x'), Atom::command_char('\\'), Atom::command_char('f')];
        assert_eq!(to_latex(&atoms), "x");
    }

    #[test]
    fn arrays() {
        let cell = |ch| Atom::wrapper(AtomKind::ArrayCell, None, vec![ord(ch)]);
        let row = |a, b| Atom::wrapper(AtomKind::ArrayRow, None, vec![cell(a), cell(b)]);
        let matrix = Atom::wrapper(AtomKind::Array, None, vec![row('a', 'b'), row('c', 'd')])
            .with_value("pmatrix");
        assert_snapshot!(matrix.to_latex(), @r"\begin{pmatrix}a&b\\c&d\end{pmatrix}");
    }

    #[test]
    fn brackets_in_a_radical_index_are_braced() {
        let x = || vec![ord('x')];
        let plain = Atom::radical(x(), Some(vec![ord('n')]));
        assert_snapshot!(plain.to_latex(), @r"\sqrt[n]{x}");
        let bracket = Atom::radical(x(), Some(vec![ord('n'), Atom::char(AtomKind::Close, ']')]));
        assert_snapshot!(bracket.to_latex(), @r"\sqrt[{n]}]{x}");
        let group = Atom::wrapper(AtomKind::Group, None, vec![ord('n')]);
        let grouped = Atom::radical(x(), Some(vec![group]));
        assert_snapshot!(grouped.to_latex(), @r"\sqrt[{{n}}]{x}");
    }

    #[test]
    fn control_word_detection() {
        assert!(ends_with_control_word(r"x\alpha"));
        assert!(!ends_with_control_word(r"\\a"));
        assert!(!ends_with_control_word(r"\,"));
        assert!(!ends_with_control_word("ab"));
    }
}
