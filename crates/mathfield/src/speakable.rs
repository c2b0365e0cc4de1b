//! Spoken renderings of atom trees, e.g. `x^2+1` as "x squared plus one".

use box_renderer::atom::{Atom, AtomKind, Body};

use crate::commands::get_command;

const DIGITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

const ORDINALS: [&str; 10] = [
    "zeroth", "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
];

/// Reads a sequence of atoms out loud.
pub fn to_speakable_text(atoms: &[Atom]) -> String {
    let mut speech = Speech::default();
    speech.atoms(atoms);
    speech.out
}

fn char_name(ch: char) -> Option<&'static str> {
    Some(match ch {
        '+' => "plus",
        '-' | '−' => "minus",
        '=' => "equals",
        '<' => "is less than",
        '>' => "is greater than",
        '*' | '∗' => "times",
        '/' => "divided by",
        '(' => "open paren",
        ')' => "close paren",
        '[' => "open bracket",
        ']' => "close bracket",
        '|' => "vertical bar",
        ',' => "comma",
        ';' => "semicolon",
        ':' => "colon",
        '!' => "factorial",
        '?' => "question mark",
        '.' => "point",
        _ => return None,
    })
}

fn digit(atom: &Atom) -> Option<char> {
    if atom.kind() != AtomKind::Ord {
        return None;
    }
    let mut chars = atom.value()?.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_digit() => Some(ch),
        _ => None,
    }
}

#[derive(Default)]
struct Speech {
    out: String,
}

impl Speech {
    fn word(&mut self, word: &str) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }
        if !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(word);
    }

    fn atoms(&mut self, atoms: &[Atom]) {
        let mut i = 0;
        while let Some(atom) = atoms.get(i) {
            if digit(atom).is_some() {
                i = self.number(atoms, i);
            } else {
                self.atom(atom);
                i += 1;
            }
        }
    }

    /// Reads the digits starting at `start` as one number and returns the index after them.
    ///
    /// A digit carrying scripts ends the number.
    fn number(&mut self, atoms: &[Atom], start: usize) -> usize {
        let mut digits = String::new();
        let mut end = start;
        while let Some(atom) = atoms.get(end) {
            let Some(ch) = digit(atom) else {
                break;
            };
            digits.push(ch);
            end += 1;
            if !atom.is_leaf() {
                break;
            }
        }
        match digits.as_bytes() {
            [single] => self.word(DIGITS[usize::from(single - b'0')]),
            _ => self.word(&digits),
        }
        if let Some(last) = atoms.get(end - 1) {
            self.scripts(last);
        }
        end
    }

    fn atom(&mut self, atom: &Atom) {
        let value = atom.value().unwrap_or_default();
        let note = value
            .strip_prefix('\\')
            .and_then(get_command)
            .map(|spec| spec.note);
        match (atom.kind(), atom.body()) {
            (AtomKind::Command | AtomKind::Space, _) => {}
            (AtomKind::Placeholder, _) => self.word("placeholder"),
            (AtomKind::UnknownCommand, _) => {
                self.word("unknown command");
                self.word(value.trim_start_matches('\\'));
            }
            (AtomKind::Fraction, Body::Fraction { numer, denom }) => {
                self.word("the fraction");
                self.atoms(numer);
                self.word("over");
                self.atoms(denom);
                self.word("end fraction");
            }
            (AtomKind::Radical, Body::Radical { radicand, index }) => {
                match index {
                    Some(index) => {
                        self.word("the");
                        match index.as_slice() {
                            [n] if digit(n).is_some() && n.is_leaf() => {
                                let d = digit(n).map_or(0, |ch| ch as usize - '0' as usize);
                                self.word(ORDINALS[d]);
                            }
                            _ => {
                                self.atoms(index);
                                self.out.push_str("-th");
                            }
                        }
                        self.word("root of");
                    }
                    None => self.word("the square root of"),
                }
                self.atoms(radicand);
            }
            (AtomKind::Accent, Body::Children(body)) => {
                self.atoms(body);
                self.word(note.unwrap_or("accent"));
            }
            (AtomKind::Font, Body::Children(body)) => {
                if let Some(note) = note {
                    self.word(note);
                }
                self.atoms(body);
            }
            (AtomKind::Text, Body::Children(body)) => {
                let text: String = body.iter().filter_map(Atom::value).collect();
                self.word(&text);
            }
            (AtomKind::Array, Body::Children(rows)) => self.array(value, rows),
            (_, Body::Children(children)) => self.atoms(children),
            _ => match note {
                Some(note) => self.word(note),
                None => {
                    let mut chars = value.chars();
                    match (chars.next(), chars.next()) {
                        (Some(ch), None) => self.word(char_name(ch).unwrap_or(value)),
                        _ => self.word(value),
                    }
                }
            },
        }
        self.scripts(atom);
    }

    fn scripts(&mut self, atom: &Atom) {
        if let Some(sub) = atom.subscript() {
            self.word("sub");
            self.atoms(sub);
        }
        if let Some(sup) = atom.superscript() {
            match sup {
                [n] if n.is_leaf() && n.value() == Some("2") => self.word("squared"),
                [n] if n.is_leaf() && n.value() == Some("3") => self.word("cubed"),
                _ => {
                    self.word("to the power of");
                    self.atoms(sup);
                    self.word("end exponent");
                }
            }
        }
    }

    fn array(&mut self, name: &str, rows: &[Atom]) {
        self.word("the");
        self.word(name);
        for (i, row) in rows.iter().enumerate() {
            self.word(&format!("row {}", i + 1));
            for (j, cell) in row.children().unwrap_or_default().iter().enumerate() {
                if j > 0 {
                    self.out.push(',');
                }
                self.atoms(cell.children().unwrap_or_default());
            }
        }
        self.word("end");
        self.word(name);
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::parse_latex;

    fn speak(latex: &str) -> String {
        to_speakable_text(&parse_latex(latex).atoms)
    }

    #[test]
    fn scripts() {
        assert_snapshot!(speak("x^2+1"), @"x squared plus one");
        assert_snapshot!(speak("y^3-a_i"), @"y cubed minus a sub i");
        assert_snapshot!(speak("e^{n+1}"), @"e to the power of n plus one end exponent");
    }

    #[test]
    fn numbers_and_symbols() {
        assert_snapshot!(speak(r"12=\alpha\times b"), @"12 equals alpha times b");
        assert_snapshot!(speak(r"\sin x"), @"sine x");
    }

    #[test]
    fn structures() {
        assert_snapshot!(speak(r"\frac{1}{2}"), @"the fraction one over two end fraction");
        assert_snapshot!(speak(r"\sqrt{x}"), @"the square root of x");
        assert_snapshot!(speak(r"\sqrt[3]{x}"), @"the third root of x");
        assert_snapshot!(speak(r"\hat{x}"), @"x hat");
        assert_snapshot!(speak(r"\mathbb{R}"), @"blackboard R");
        assert_snapshot!(speak(r"\text{if}x"), @"if x");
    }

    #[test]
    fn incomplete_input() {
        assert_snapshot!(speak(r"\frac{\placeholder{}}{2}"), @"the fraction placeholder over two end fraction");
        assert_snapshot!(speak(r"\foo"), @"unknown command foo");
    }

    #[test]
    fn arrays() {
        assert_snapshot!(
            speak(r"\begin{pmatrix}a&b\\c&d\end{pmatrix}"),
            @"the pmatrix row 1 a, b row 2 c, d end pmatrix"
        );
    }
}
