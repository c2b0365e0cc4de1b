use std::ops::Range;

/// A reference to an argument of a LaTeX fragment, as used by editor insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRef {
    /// `#0` to `#9`: the argument with this index.
    Index(u8),
    /// `#@`: the selection or, when nothing is selected, the atoms right before the caret.
    Implicit,
    /// `#?`: an empty placeholder.
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'source> {
    /// End of input.
    Eoi,
    /// A backslash followed by ASCII letters, or by a single other character.
    /// The name is stored without the backslash, e.g. `frac` for `\frac` and `,` for `\,`.
    ControlSequence(&'source str),
    /// Any other character. In text mode, this includes spaces and `^`, `_` and `&`.
    Char(char),
    /// The character `{`.
    GroupBegin,
    /// The character `}`, or an implicit close added for an unterminated group.
    GroupEnd,
    /// The character `^` for superscripts.
    Superscript,
    /// The character `_` for subscripts.
    Subscript,
    /// The character `&` separating array cells.
    Alignment,
    /// A fragment argument like `#0` or `#@`.
    Argument(ArgRef),
}

static_assertions::assert_eq_size!(Token<'_>, [usize; 3]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn zero_width(at: usize) -> Self {
        Span { start: at, end: at }
    }

    #[inline]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Returns a new `Span` with the same start position as `self`, but with the end position set
    /// to `self.start + length`.
    #[inline]
    pub const fn with_length(self, length: usize) -> Self {
        Span {
            start: self.start,
            end: self.start + length,
        }
    }
}

impl From<Span> for Range<usize> {
    #[inline]
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A token together with its span in the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokSpan<'source>(Token<'source>, Span);

impl<'source> TokSpan<'source> {
    #[inline]
    pub const fn new(token: Token<'source>, span: Span) -> Self {
        TokSpan(token, span)
    }

    #[inline]
    pub fn token(&self) -> &Token<'source> {
        &self.0
    }

    #[inline]
    pub fn into_token(self) -> Token<'source> {
        self.0
    }

    #[inline]
    pub fn into_parts(self) -> (Token<'source>, Span) {
        (self.0, self.1)
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.1
    }
}

impl<'source> From<Token<'source>> for TokSpan<'source> {
    #[inline]
    fn from(token: Token<'source>) -> Self {
        TokSpan(token, Span::default())
    }
}
