use std::mem;
use std::str::CharIndices;

use crate::commands::{CommandAction, get_command};
use crate::error::{LatexErrKind, LatexError};
use crate::token::{ArgRef, Span, TokSpan, Token};

/// The whole token stream of a source string, together with the problems found while lexing.
///
/// The stream always ends with exactly one [`Token::Eoi`] and its groups are balanced.
#[derive(Debug, Clone)]
pub struct Tokenized<'source> {
    pub tokens: Vec<TokSpan<'source>>,
    pub diagnostics: Vec<LatexError>,
}

/// Tokenize a LaTeX source string.
///
/// This never fails: unterminated groups are closed implicitly, unmatched `}` and NUL
/// characters are dropped. Every such repair is recorded in [`Tokenized::diagnostics`].
pub fn tokenize(source: &str) -> Tokenized<'_> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token();
        let is_end = matches!(tok.token(), Token::Eoi);
        tokens.push(tok);
        if is_end {
            break;
        }
    }
    Tokenized {
        tokens,
        diagnostics: lexer.diagnostics,
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Mode {
    #[default]
    Math,
    /// A text command was read; the next group is text.
    TextStart,
    /// Inside a text group which was opened at the given nesting level.
    TextGroup { nesting: usize },
}

struct Lexer<'source> {
    input: CharIndices<'source>,
    peek: (usize, Option<char>),
    input_string: &'source str,
    input_length: usize,
    mode: Mode,
    /// Start offsets of the groups which are currently open.
    open_groups: Vec<usize>,
    /// Implicit group ends which still have to be emitted before `Eoi`.
    pending_closes: usize,
    diagnostics: Vec<LatexError>,
}

impl<'source> Lexer<'source> {
    fn new(input: &'source str) -> Self {
        let mut lexer = Lexer {
            input: input.char_indices(),
            peek: (0, None),
            input_string: input,
            input_length: input.len(),
            mode: Mode::default(),
            open_groups: Vec::new(),
            pending_closes: 0,
            diagnostics: Vec::new(),
        };
        lexer.read_char(); // Initialize `peek`.
        lexer
    }

    /// One character progresses.
    fn read_char(&mut self) -> (usize, Option<char>) {
        mem::replace(
            &mut self.peek,
            self.input
                .next()
                .map(|(idx, ch)| (idx, Some(ch)))
                .unwrap_or((self.input_length, None)),
        )
    }

    /// Skip whitespace characters.
    ///
    /// Returns the span of the first skipped whitespace character, or `None` if there are no
    /// whitespace characters to skip.
    fn skip_whitespace(&mut self) -> Option<Span> {
        let mut span: Option<Span> = None;
        while let (loc, Some(ch)) = self.peek
            && ch.is_whitespace()
        {
            self.read_char();
            if span.is_none() {
                span = Some(Span::new(loc, loc + ch.len_utf8()));
            }
        }
        span
    }

    /// Skip to the end of the current line.
    fn skip_comment(&mut self) {
        let start = self.peek.0;
        let rest = self.input_string.get(start..).unwrap_or_default();
        match memchr::memchr(b'\n', rest.as_bytes()) {
            Some(newline) => {
                let target = start + newline;
                while self.peek.1.is_some() && self.peek.0 <= target {
                    self.read_char();
                }
            }
            None => while self.read_char().1.is_some() {},
        }
    }

    /// Read one command name.
    ///
    /// This is either a run of ASCII letters or exactly one other character.
    #[inline]
    fn read_command(&mut self) -> (&'source str, usize) {
        let start = self.peek.0;

        while self.peek.1.is_some_and(|ch| ch.is_ascii_alphabetic()) {
            self.read_char();
        }

        if start == self.peek.0 {
            // Always read at least one character.
            self.read_char();
        }

        let end = self.peek.0;
        (self.input_string.get(start..end).unwrap_or_default(), end)
    }

    #[inline]
    fn in_text(&self) -> bool {
        matches!(self.mode, Mode::TextGroup { .. })
    }

    fn next_token(&mut self) -> TokSpan<'source> {
        if self.pending_closes > 0 {
            self.pending_closes -= 1;
            return TokSpan::new(Token::GroupEnd, Span::zero_width(self.input_length));
        }

        if let Some(span) = self.skip_whitespace()
            && self.in_text()
        {
            return TokSpan::new(Token::Char(' '), span);
        }

        let (loc, ch) = self.read_char();
        let Some(ch) = ch else {
            return self.end_of_input(loc);
        };
        let span = Span::new(loc, loc + ch.len_utf8());
        let tok = match ch {
            '\u{0}' => {
                self.diagnostics
                    .push(LatexError(span.into(), LatexErrKind::DisallowedChar(ch)));
                return self.next_token();
            }
            '%' => {
                self.skip_comment();
                return self.next_token();
            }
            '{' => {
                if matches!(self.mode, Mode::TextStart) {
                    self.mode = Mode::TextGroup {
                        nesting: self.open_groups.len(),
                    };
                }
                self.open_groups.push(loc);
                Token::GroupBegin
            }
            '}' => {
                if self.open_groups.pop().is_none() {
                    self.diagnostics
                        .push(LatexError(span.into(), LatexErrKind::UnmatchedClose));
                    return self.next_token();
                }
                if let Mode::TextGroup { nesting } = self.mode
                    && nesting == self.open_groups.len()
                {
                    self.mode = Mode::Math;
                }
                Token::GroupEnd
            }
            '\\' => {
                let (name, end) = self.read_command();
                // After a command, all whitespace is skipped, even in text mode.
                self.skip_whitespace();
                let is_text_command = get_command(name)
                    .is_some_and(|spec| matches!(spec.action, CommandAction::Text));
                let tok = TokSpan::new(Token::ControlSequence(name), Span::new(loc, end));
                if is_text_command {
                    self.mode = Mode::TextStart;
                } else if matches!(self.mode, Mode::TextStart) {
                    self.mode = Mode::Math;
                }
                return tok;
            }
            '#' => match self.peek.1 {
                Some(digit @ '0'..='9') => {
                    self.read_char();
                    let index = digit as u8 - b'0';
                    return self.finish(Token::Argument(ArgRef::Index(index)), span.with_length(2));
                }
                Some('@') => {
                    self.read_char();
                    return self.finish(Token::Argument(ArgRef::Implicit), span.with_length(2));
                }
                Some('?') => {
                    self.read_char();
                    return self.finish(Token::Argument(ArgRef::Placeholder), span.with_length(2));
                }
                _ => Token::Char('#'),
            },
            '^' if !self.in_text() => Token::Superscript,
            '_' if !self.in_text() => Token::Subscript,
            '&' if !self.in_text() => Token::Alignment,
            '~' if self.in_text() => Token::Char(' '),
            c => Token::Char(c),
        };
        self.finish(tok, span)
    }

    /// Leave `Mode::TextStart` if the token that was just read did not open a text group.
    #[inline]
    fn finish(&mut self, tok: Token<'source>, span: Span) -> TokSpan<'source> {
        if matches!(self.mode, Mode::TextStart) && !matches!(tok, Token::GroupBegin) {
            self.mode = Mode::Math;
        }
        TokSpan::new(tok, span)
    }

    fn end_of_input(&mut self, loc: usize) -> TokSpan<'source> {
        if !self.open_groups.is_empty() {
            // Innermost group first.
            for &start in self.open_groups.iter().rev() {
                self.diagnostics
                    .push(LatexError(start..start + 1, LatexErrKind::UnclosedGroup));
            }
            self.pending_closes = self.open_groups.len() - 1;
            self.open_groups.clear();
            self.mode = Mode::Math;
            return TokSpan::new(Token::GroupEnd, Span::zero_width(loc));
        }
        TokSpan::new(Token::Eoi, Span::zero_width(loc))
    }
}
