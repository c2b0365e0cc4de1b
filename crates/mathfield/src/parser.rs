use std::mem;

use box_renderer::atom::{Atom, AtomFlags, AtomKind, Relation};

use crate::commands::{CommandAction, CommandSpec, char_atom, get_command, is_known_environment};
use crate::error::{LatexErrKind, LatexError};
use crate::token::{ArgRef, Span, TokSpan, Token};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Math,
    /// Characters are taken literally; only symbol and spacing commands are allowed.
    Text,
}

/// The atoms read from a token stream, together with the problems the parser recovered from.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub atoms: Vec<Atom>,
    pub diagnostics: Vec<LatexError>,
}

impl Parsed {
    #[inline]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse a token stream into a sequence of atoms.
///
/// `args` holds the substitutions for the argument tokens: `#0` to `#9` refer to the argument
/// with that index and `#@` refers to the first one. A missing or empty argument becomes a
/// placeholder, as does `#?`. The first use of an argument keeps the identities of its atoms;
/// later uses get fresh copies.
///
/// Parsing never fails. Malformed input is recovered from and reported in
/// [`Parsed::diagnostics`].
pub fn parse(tokens: &[TokSpan<'_>], mode: ParseMode, args: &[Vec<Atom>]) -> Parsed {
    let mut parser = Parser {
        tokens,
        pos: 0,
        args,
        used_args: 0,
        diagnostics: Vec::new(),
    };
    let atoms = parser.parse_sequence(End::Eoi, mode);
    Parsed {
        atoms,
        diagnostics: parser.diagnostics,
    }
}

/// Where a sequence of atoms ends. End of input always ends a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Eoi,
    Group,
    /// The optional index of `\sqrt`.
    Bracket,
    /// A cell of an array.
    Cell,
}

impl End {
    fn stops_at(self, tok: Token<'_>) -> bool {
        match self {
            End::Eoi => false,
            End::Group => matches!(tok, Token::GroupEnd),
            End::Bracket => matches!(tok, Token::GroupEnd | Token::Char(']')),
            End::Cell => matches!(
                tok,
                Token::GroupEnd | Token::Alignment | Token::ControlSequence("\\" | "end")
            ),
        }
    }
}

struct Parser<'a, 'source> {
    tokens: &'a [TokSpan<'source>],
    pos: usize,
    args: &'a [Vec<Atom>],
    /// Bit `i` is set once argument `i` has been substituted.
    used_args: u16,
    diagnostics: Vec<LatexError>,
}

impl<'source> Parser<'_, 'source> {
    #[inline]
    fn peek(&self) -> Token<'source> {
        self.peek_at(0)
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Token<'source> {
        self.tokens
            .get(self.pos + ahead)
            .map_or(Token::Eoi, |tok| *tok.token())
    }

    fn next(&mut self) -> (Token<'source>, Span) {
        match self.tokens.get(self.pos) {
            Some(tok) => {
                self.pos += 1;
                tok.into_parts()
            }
            None => {
                let end = self.tokens.last().map_or(0, |tok| tok.span().end());
                (Token::Eoi, Span::zero_width(end))
            }
        }
    }

    fn error(&mut self, span: Span, kind: LatexErrKind) {
        self.diagnostics.push(LatexError(span.into(), kind));
    }

    fn parse_sequence(&mut self, end: End, mode: ParseMode) -> Vec<Atom> {
        let mut list = Vec::new();
        loop {
            let tok = self.peek();
            if matches!(tok, Token::Eoi) || end.stops_at(tok) {
                break;
            }
            self.parse_into(&mut list, mode);
        }
        list
    }

    /// Reads one item and appends the resulting atoms to `list`.
    ///
    /// Scripts are attached to the last atom of `list` instead.
    fn parse_into(&mut self, list: &mut Vec<Atom>, mode: ParseMode) {
        let (tok, span) = self.next();
        match tok {
            Token::Eoi => {}
            Token::Superscript => self.parse_script(list, Relation::Superscript, span, mode),
            Token::Subscript => self.parse_script(list, Relation::Subscript, span, mode),
            Token::Char('\'') if mode == ParseMode::Math => self.attach_prime(list, span),
            Token::Char(ch) => list.push(match mode {
                ParseMode::Math => char_atom(ch),
                ParseMode::Text => Atom::char(AtomKind::Ord, ch),
            }),
            Token::GroupBegin => {
                let children = self.parse_group_rest(mode);
                list.push(Atom::wrapper(AtomKind::Group, None, children));
            }
            Token::GroupEnd => self.error(span, LatexErrKind::UnmatchedClose),
            Token::Alignment => {
                self.error(span, LatexErrKind::DisallowedChar('&'));
                list.push(Atom::char(AtomKind::Ord, '&').with_flags(AtomFlags::ERROR));
            }
            Token::Argument(arg) => list.extend(self.substitute(arg)),
            Token::ControlSequence(name) => self.parse_command(list, name, span, mode),
        }
    }

    /// Parses the rest of a group whose `{` was already consumed.
    fn parse_group_rest(&mut self, mode: ParseMode) -> Vec<Atom> {
        let children = self.parse_sequence(End::Group, mode);
        if matches!(self.peek(), Token::GroupEnd) {
            self.next();
        }
        children
    }

    /// Parses one argument: a braced group without its braces, or a single item.
    ///
    /// Returns `None` if the next token cannot start an argument.
    fn parse_argument(&mut self, mode: ParseMode) -> Option<Vec<Atom>> {
        match self.peek() {
            Token::GroupBegin => {
                self.next();
                Some(self.parse_group_rest(mode))
            }
            Token::Eoi
            | Token::GroupEnd
            | Token::Alignment
            | Token::Superscript
            | Token::Subscript
            | Token::ControlSequence("\\" | "end") => None,
            _ => {
                let mut item = Vec::new();
                self.parse_into(&mut item, mode);
                Some(item)
            }
        }
    }

    fn parse_script(
        &mut self,
        list: &mut Vec<Atom>,
        relation: Relation,
        span: Span,
        mode: ParseMode,
    ) {
        let content = match self.parse_argument(mode) {
            Some(content) => content,
            None => {
                self.error(span, LatexErrKind::ExpectedArgument);
                vec![Atom::placeholder()]
            }
        };
        let base = list
            .last()
            .map(|last| (last.kind().allows_scripts(), last.branch(relation).is_some()));
        match base {
            Some((true, false)) => {}
            Some((true, true)) => {
                self.error(span, LatexErrKind::DuplicateSubOrSup);
                list.push(Atom::placeholder().with_flags(AtomFlags::ERROR));
            }
            _ => list.push(Atom::placeholder()),
        }
        if let Some(base) = list.last_mut() {
            base.set_branch(relation, content);
        }
    }

    /// `'` adds a prime to the superscript of the previous atom.
    fn attach_prime(&mut self, list: &mut Vec<Atom>, span: Span) {
        let prime = Atom::symbol(AtomKind::Ord, r"\prime", Some('′'));
        let base = list.last().map(|last| {
            let primes_only = last
                .superscript()
                .map(|sup| sup.iter().all(|atom| atom.value() == Some(r"\prime")));
            (last.kind().allows_scripts(), primes_only)
        });
        match base {
            Some((true, None)) => {}
            Some((true, Some(true))) => {
                if let Some(sup) = list
                    .last_mut()
                    .and_then(|last| last.branch_mut(Relation::Superscript))
                {
                    sup.push(prime);
                }
                return;
            }
            Some((true, Some(false))) => {
                self.error(span, LatexErrKind::DuplicateSubOrSup);
                list.push(Atom::placeholder().with_flags(AtomFlags::ERROR));
            }
            _ => list.push(Atom::placeholder()),
        }
        if let Some(base) = list.last_mut() {
            base.set_branch(Relation::Superscript, vec![prime]);
        }
    }

    fn substitute(&mut self, arg: ArgRef) -> Vec<Atom> {
        let index = match arg {
            ArgRef::Index(index) => usize::from(index),
            ArgRef::Implicit => 0,
            ArgRef::Placeholder => return vec![Atom::placeholder()],
        };
        match self.args.get(index) {
            Some(atoms) if !atoms.is_empty() => {
                let bit = 1u16 << index;
                if self.used_args & bit == 0 {
                    self.used_args |= bit;
                    atoms.clone()
                } else {
                    atoms.iter().map(Atom::with_fresh_ids).collect()
                }
            }
            _ => vec![Atom::placeholder()],
        }
    }

    fn parse_command(
        &mut self,
        list: &mut Vec<Atom>,
        name: &'source str,
        span: Span,
        mode: ParseMode,
    ) {
        let command = command_string(name);
        let spec = match get_command(name) {
            Some(spec)
                if mode == ParseMode::Math
                    || matches!(spec.action, CommandAction::Symbol(..) | CommandAction::Space) =>
            {
                spec
            }
            _ => {
                self.error(span, LatexErrKind::UnknownCommand(command.as_str().into()));
                list.push(unknown_command(&command));
                return;
            }
        };
        let atom = match spec.action {
            CommandAction::Symbol(kind, ch) => Atom::symbol(kind, &command, Some(ch)),
            CommandAction::Function => Atom::symbol(AtomKind::Op, &command, None),
            CommandAction::Space => Atom::new(AtomKind::Space).with_value(&command),
            CommandAction::Placeholder => {
                if matches!(self.peek(), Token::GroupBegin)
                    && matches!(self.peek_at(1), Token::GroupEnd)
                {
                    self.pos += 2;
                }
                Atom::placeholder()
            }
            // Row separators outside of an environment are ignored.
            CommandAction::NewRow => return,
            CommandAction::End => {
                self.error(span, LatexErrKind::UnmatchedClose);
                self.parse_env_name();
                return;
            }
            CommandAction::Begin => {
                let checkpoint = self.pos;
                match self.parse_environment(span) {
                    Some(atom) => atom,
                    None => {
                        self.pos = checkpoint;
                        self.arity_error(list, &command, spec, 0, span);
                        return;
                    }
                }
            }
            CommandAction::Fraction
            | CommandAction::Sqrt
            | CommandAction::Accent(_)
            | CommandAction::Font
            | CommandAction::Text => {
                let checkpoint = (self.pos, self.diagnostics.len(), self.used_args);
                let index = if spec.action == CommandAction::Sqrt {
                    self.parse_optional_index()
                } else {
                    None
                };
                let arg_mode = if spec.action == CommandAction::Text {
                    ParseMode::Text
                } else {
                    ParseMode::Math
                };
                let mut args = Vec::with_capacity(usize::from(spec.arity));
                for found in 0..spec.arity {
                    match self.parse_argument(arg_mode) {
                        Some(arg) => args.push(arg),
                        None => {
                            // Rewind to just after the command.
                            (self.pos, _, self.used_args) = checkpoint;
                            self.diagnostics.truncate(checkpoint.1);
                            self.arity_error(list, &command, spec, found, span);
                            return;
                        }
                    }
                }
                let mut args = args.into_iter();
                let mut arg = || args.next().unwrap_or_default();
                match spec.action {
                    CommandAction::Fraction => Atom::fraction(&command, arg(), arg()),
                    CommandAction::Sqrt => Atom::radical(arg(), index),
                    CommandAction::Accent(mark) => {
                        Atom::wrapper(AtomKind::Accent, Some(&command), arg())
                            .with_glyph(Some(mark))
                    }
                    CommandAction::Font => Atom::wrapper(AtomKind::Font, Some(&command), arg()),
                    _ => Atom::wrapper(AtomKind::Text, Some(&command), arg()),
                }
            }
        };
        list.push(atom);
    }

    fn arity_error(
        &mut self,
        list: &mut Vec<Atom>,
        command: &str,
        spec: &CommandSpec,
        found: u8,
        span: Span,
    ) {
        self.error(
            span,
            LatexErrKind::InvalidArgumentCount {
                command: command.into(),
                expected: spec.arity,
                found,
            },
        );
        list.push(unknown_command(command));
    }

    fn parse_optional_index(&mut self) -> Option<Vec<Atom>> {
        if !matches!(self.peek(), Token::Char('[')) {
            return None;
        }
        self.next();
        let mut index = self.parse_sequence(End::Bracket, ParseMode::Math);
        if matches!(self.peek(), Token::Char(']')) {
            self.next();
        }
        // `[{...}]` protects a `]` inside the index; the braces are not part of it.
        if matches!(index.as_slice(), [group] if group.is_bare_group())
            && let Some(mut group) = index.pop()
            && let Some(children) = group.branch_mut(Relation::Body)
        {
            index = mem::take(children);
        }
        Some(index)
    }

    /// Reads the `{name}` following `\begin` or `\end`.
    fn parse_env_name(&mut self) -> Option<String> {
        if !matches!(self.peek(), Token::GroupBegin) {
            return None;
        }
        self.next();
        let mut name = String::new();
        loop {
            match self.next().0 {
                Token::Char(ch) => name.push(ch),
                Token::GroupEnd | Token::Eoi => break,
                _ => {}
            }
        }
        Some(name)
    }

    /// Parses an environment after its `\begin`.
    ///
    /// Known environments become arrays. The content of unknown environments is kept as a
    /// group.
    fn parse_environment(&mut self, span: Span) -> Option<Atom> {
        let name = self.parse_env_name()?;
        let known = is_known_environment(&name);
        if !known {
            self.error(span, LatexErrKind::UnknownEnvironment(name.as_str().into()));
        }
        let rows = self.parse_rows(&name, span);
        Some(if known {
            let rows = rows
                .into_iter()
                .map(|row| {
                    let cells = row
                        .into_iter()
                        .map(|cell| Atom::wrapper(AtomKind::ArrayCell, None, cell))
                        .collect();
                    Atom::wrapper(AtomKind::ArrayRow, None, cells)
                })
                .collect();
            Atom::wrapper(AtomKind::Array, None, rows).with_value(&name)
        } else {
            let content = rows.into_iter().flatten().flatten().collect();
            Atom::wrapper(AtomKind::Group, None, content)
        })
    }

    fn parse_rows(&mut self, name: &str, span: Span) -> Vec<Vec<Vec<Atom>>> {
        let mut rows = Vec::new();
        let mut cells = Vec::new();
        loop {
            cells.push(self.parse_sequence(End::Cell, ParseMode::Math));
            match self.peek() {
                Token::Alignment => {
                    self.next();
                }
                Token::ControlSequence("\\") => {
                    self.next();
                    rows.push(mem::take(&mut cells));
                }
                Token::ControlSequence("end") => {
                    let (_, end_span) = self.next();
                    let got = self.parse_env_name().unwrap_or_default();
                    if got != name {
                        self.error(
                            end_span,
                            LatexErrKind::MismatchedEnvironment {
                                expected: name.into(),
                                got: got.into(),
                            },
                        );
                    }
                    break;
                }
                _ => {
                    self.error(span, LatexErrKind::UnclosedEnvironment(name.into()));
                    break;
                }
            }
        }
        rows.push(cells);
        // A trailing `\\` leaves an empty last row.
        if rows.len() > 1
            && rows
                .last()
                .is_some_and(|row| matches!(row.as_slice(), [cell] if cell.is_empty()))
        {
            rows.pop();
        }
        rows
    }
}

fn command_string(name: &str) -> String {
    let mut command = String::with_capacity(name.len() + 1);
    command.push('\\');
    command.push_str(name);
    command
}

fn unknown_command(command: &str) -> Atom {
    Atom::new(AtomKind::UnknownCommand)
        .with_value(command)
        .with_flags(AtomFlags::ERROR)
}

#[cfg(test)]
mod tests {
    use box_renderer::latex::to_latex;
    use insta::assert_snapshot;

    use super::*;
    use crate::error::ErrorCategory;
    use crate::lexer::tokenize;

    fn parse_str(source: &str) -> Parsed {
        parse(&tokenize(source).tokens, ParseMode::Math, &[])
    }

    fn roundtrip(source: &str) -> String {
        to_latex(&parse_str(source).atoms)
    }

    #[test]
    fn superscript_attaches_to_previous_atom() {
        let parsed = parse_str("x^2+1");
        assert!(!parsed.has_errors());
        let atoms = &parsed.atoms;
        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[0].value(), Some("x"));
        let sup = atoms[0].superscript().unwrap();
        assert_eq!(sup[0].value(), Some("2"));
        assert_eq!(atoms[1].kind(), AtomKind::Bin);
        assert_snapshot!(to_latex(atoms), @"x^{2}+1");
    }

    #[test]
    fn commands_and_arguments() {
        assert_snapshot!(roundtrip(r"\frac12"), @r"\frac{1}{2}");
        assert_snapshot!(roundtrip(r"\sqrt[3]x+\sqrt2"), @r"\sqrt[3]{x}+\sqrt{2}");
        assert_snapshot!(roundtrip(r"\hat a \mathbb R"), @r"\hat{a}\mathbb{R}");
        assert_snapshot!(roundtrip(r"\sin x\cdot\alpha"), @r"\sin x\cdot\alpha");
        assert_snapshot!(roundtrip(r"x_i^2"), @"x_{i}^{2}");
        assert_snapshot!(roundtrip(r"x^2_i"), @"x_{i}^{2}");
        assert_snapshot!(roundtrip(r"a\,b\quad c"), @r"a\,b\quad c");
    }

    #[test]
    fn braced_radical_index() {
        assert_snapshot!(roundtrip(r"\sqrt[{n]}]{x}"), @r"\sqrt[{n]}]{x}");
        assert_snapshot!(roundtrip(r"\sqrt[{3}]{x}"), @r"\sqrt[3]{x}");
        let parsed = parse_str(r"\sqrt[{n]}]{x}");
        assert!(!parsed.has_errors());
        let index = parsed.atoms[0].branch(Relation::Index).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index[1].value(), Some("]"));
    }

    #[test]
    fn unknown_command_is_kept() {
        let parsed = parse_str(r"\foo x");
        assert_eq!(parsed.atoms[0].kind(), AtomKind::UnknownCommand);
        assert!(parsed.atoms[0].flags.contains(AtomFlags::ERROR));
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].category(),
            ErrorCategory::UnknownCommand
        );
        assert_snapshot!(to_latex(&parsed.atoms), @r"\foo x");
    }

    #[test]
    fn missing_arguments_rewind() {
        let parsed = parse_str(r"\frac{1}");
        assert_eq!(parsed.atoms.len(), 2);
        assert_eq!(parsed.atoms[0].kind(), AtomKind::UnknownCommand);
        assert_eq!(parsed.atoms[1].kind(), AtomKind::Group);
        assert_eq!(
            parsed.diagnostics[0].kind(),
            &LatexErrKind::InvalidArgumentCount {
                command: r"\frac".into(),
                expected: 2,
                found: 1
            }
        );
        assert_snapshot!(to_latex(&parsed.atoms), @r"\frac{1}");
    }

    #[test]
    fn script_recovery() {
        let parsed = parse_str("x^1^2");
        assert_eq!(
            parsed.diagnostics[0].kind(),
            &LatexErrKind::DuplicateSubOrSup
        );
        assert!(parsed.atoms[1].flags.contains(AtomFlags::ERROR));
        assert_snapshot!(to_latex(&parsed.atoms), @r"x^{1}\placeholder{}^{2}");

        let parsed = parse_str("x^");
        assert_eq!(parsed.diagnostics[0].kind(), &LatexErrKind::ExpectedArgument);
        assert_snapshot!(to_latex(&parsed.atoms), @r"x^{\placeholder{}}");

        assert_snapshot!(roundtrip("^2"), @r"\placeholder{}^{2}");
    }

    #[test]
    fn primes() {
        assert_snapshot!(roundtrip("f''(x)"), @r"f^{\prime\prime}(x)");
        assert_snapshot!(roundtrip("f^2'"), @r"f^{2}\placeholder{}^{\prime}");
    }

    #[test]
    fn placeholders() {
        let parsed = parse_str(r"\placeholder{}+\placeholder");
        assert_eq!(parsed.atoms.len(), 3);
        assert!(parsed.atoms[0].is_placeholder());
        assert!(parsed.atoms[2].is_placeholder());
    }

    #[test]
    fn environments() {
        let source = r"\begin{pmatrix}a&b\\c&d\end{pmatrix}";
        let parsed = parse_str(source);
        assert!(!parsed.has_errors());
        let matrix = &parsed.atoms[0];
        assert_eq!(matrix.kind(), AtomKind::Array);
        assert_eq!(matrix.value(), Some("pmatrix"));
        assert_eq!(matrix.children().unwrap().len(), 2);
        assert_eq!(to_latex(&parsed.atoms), source);

        assert_snapshot!(
            roundtrip(r"\begin{cases}x&y\\\end{cases}"),
            @r"\begin{cases}x&y\end{cases}"
        );
    }

    #[test]
    fn environment_errors() {
        let parsed = parse_str(r"\begin{foo}a&b\end{foo}");
        assert_eq!(
            parsed.diagnostics[0].kind(),
            &LatexErrKind::UnknownEnvironment("foo".into())
        );
        assert_snapshot!(to_latex(&parsed.atoms), @"{ab}");

        let parsed = parse_str(r"\begin{matrix}a\end{bmatrix}");
        assert!(matches!(
            parsed.diagnostics[0].kind(),
            LatexErrKind::MismatchedEnvironment { .. }
        ));
        assert_snapshot!(to_latex(&parsed.atoms), @r"\begin{matrix}a\end{matrix}");

        let parsed = parse_str(r"a\end{matrix}b");
        assert_eq!(parsed.diagnostics[0].kind(), &LatexErrKind::UnmatchedClose);
        assert_snapshot!(to_latex(&parsed.atoms), @"ab");
    }

    #[test]
    fn text_arguments() {
        let parsed = parse_str(r"\text{if } x");
        assert_eq!(parsed.atoms[0].kind(), AtomKind::Text);
        assert_eq!(parsed.atoms[0].children().unwrap().len(), 3);
        assert_snapshot!(to_latex(&parsed.atoms), @r"\text{if }x");

        let parsed = parse_str(r"\text{\frac}");
        assert_eq!(
            parsed.diagnostics[0].category(),
            ErrorCategory::UnknownCommand
        );
    }

    #[test]
    fn arguments_are_substituted() {
        let x = Atom::char(AtomKind::Ord, 'x');
        let id = x.id();
        let args = [vec![x]];
        let tokens = tokenize(r"\mathbb{#@}+#0+#?").tokens;
        let parsed = parse(&tokens, ParseMode::Math, &args);
        assert_snapshot!(to_latex(&parsed.atoms), @r"\mathbb{x}+x+\placeholder{}");
        let font = &parsed.atoms[0];
        assert_eq!(font.children().unwrap()[0].id(), id);
        assert_ne!(parsed.atoms[2].id(), id);
    }

    #[test]
    fn roundtrip_is_a_fixpoint() {
        let inputs = [
            r"x^2+1",
            r"\frac{a}{b}+\sqrt[n]{x^{2}}",
            r"\sum_{i=1}^n i^2",
            r"\alpha\beta x\to\infty",
            r"\mathbb{R}\times\mathcal L",
            r"\begin{bmatrix}1&0\\0&1\end{bmatrix}",
            r"\{x\mid x>0\}\%",
            r"\text{for all } x",
            r"{a+b}^2",
        ];
        for input in inputs {
            let once = roundtrip(input);
            let twice = roundtrip(&once);
            assert_eq!(once, twice, "input: {input}");
        }
    }
}
