use box_renderer::atom::{Atom, AtomKind};

/// What the parser does with a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandAction {
    /// A leaf symbol of the given class.
    Symbol(AtomKind, char),
    /// A named function like `\sin`, drawn as its upright name.
    Function,
    /// `\frac` and its variants.
    Fraction,
    /// `\sqrt`, which takes an optional index in brackets.
    Sqrt,
    /// An accent drawn with the given mark.
    Accent(char),
    /// A font variant for its argument.
    Font,
    /// Its argument is text.
    Text,
    Space,
    /// `\placeholder`, optionally followed by an empty group.
    Placeholder,
    Begin,
    End,
    /// `\\`
    NewRow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandSpec {
    pub action: CommandAction,
    /// Number of required arguments.
    pub arity: u8,
    /// A short description, also used as the spoken name.
    pub note: &'static str,
    /// Example snippets for suggestion previews.
    pub examples: &'static [&'static str],
    /// Lower values are suggested first.
    pub priority: u8,
}

const fn spec(action: CommandAction, arity: u8, note: &'static str, priority: u8) -> CommandSpec {
    CommandSpec {
        action,
        arity,
        note,
        examples: &[],
        priority,
    }
}

const fn with_examples(mut spec: CommandSpec, examples: &'static [&'static str]) -> CommandSpec {
    spec.examples = examples;
    spec
}

const fn ord(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Ord, ch), 0, note, 3)
}

const fn greek(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Ord, ch), 0, note, 2)
}

const fn bin(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Bin, ch), 0, note, 3)
}

const fn rel(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Rel, ch), 0, note, 3)
}

const fn arrow(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Rel, ch), 0, note, 4)
}

const fn open(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Open, ch), 0, note, 4)
}

const fn close(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Close, ch), 0, note, 4)
}

const fn big_op(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Symbol(AtomKind::Op, ch), 0, note, 2)
}

const fn function(note: &'static str) -> CommandSpec {
    spec(CommandAction::Function, 0, note, 2)
}

const fn accent(ch: char, note: &'static str) -> CommandSpec {
    spec(CommandAction::Accent(ch), 1, note, 3)
}

const fn font(note: &'static str) -> CommandSpec {
    spec(CommandAction::Font, 1, note, 3)
}

const fn text(note: &'static str) -> CommandSpec {
    spec(CommandAction::Text, 1, note, 3)
}

const fn space(note: &'static str) -> CommandSpec {
    spec(CommandAction::Space, 0, note, 5)
}

/// Command names are stored without the leading backslash.
static COMMANDS: phf::Map<&'static str, CommandSpec> = phf::phf_map! {
    // Greek letters
    "alpha" => greek('α', "alpha"),
    "beta" => greek('β', "beta"),
    "gamma" => greek('γ', "gamma"),
    "delta" => greek('δ', "delta"),
    "epsilon" => greek('ϵ', "epsilon"),
    "varepsilon" => greek('ε', "epsilon"),
    "zeta" => greek('ζ', "zeta"),
    "eta" => greek('η', "eta"),
    "theta" => greek('θ', "theta"),
    "vartheta" => greek('ϑ', "theta"),
    "iota" => greek('ι', "iota"),
    "kappa" => greek('κ', "kappa"),
    "lambda" => greek('λ', "lambda"),
    "mu" => greek('μ', "mu"),
    "nu" => greek('ν', "nu"),
    "xi" => greek('ξ', "xi"),
    "pi" => greek('π', "pi"),
    "varpi" => greek('ϖ', "pi"),
    "rho" => greek('ρ', "rho"),
    "varrho" => greek('ϱ', "rho"),
    "sigma" => greek('σ', "sigma"),
    "varsigma" => greek('ς', "sigma"),
    "tau" => greek('τ', "tau"),
    "upsilon" => greek('υ', "upsilon"),
    "phi" => greek('ϕ', "phi"),
    "varphi" => greek('φ', "phi"),
    "chi" => greek('χ', "chi"),
    "psi" => greek('ψ', "psi"),
    "omega" => greek('ω', "omega"),
    "Gamma" => greek('Γ', "capital gamma"),
    "Delta" => greek('Δ', "capital delta"),
    "Theta" => greek('Θ', "capital theta"),
    "Lambda" => greek('Λ', "capital lambda"),
    "Xi" => greek('Ξ', "capital xi"),
    "Pi" => greek('Π', "capital pi"),
    "Sigma" => greek('Σ', "capital sigma"),
    "Upsilon" => greek('Υ', "capital upsilon"),
    "Phi" => greek('Φ', "capital phi"),
    "Psi" => greek('Ψ', "capital psi"),
    "Omega" => greek('Ω', "capital omega"),
    // Other ordinary symbols
    "infty" => greek('∞', "infinity"),
    "partial" => ord('∂', "partial"),
    "nabla" => ord('∇', "nabla"),
    "emptyset" => ord('∅', "empty set"),
    "forall" => ord('∀', "for all"),
    "exists" => ord('∃', "there exists"),
    "neg" => ord('¬', "not"),
    "lnot" => ord('¬', "not"),
    "ell" => ord('ℓ', "ell"),
    "hbar" => ord('ℏ', "h bar"),
    "Re" => ord('ℜ', "real part"),
    "Im" => ord('ℑ', "imaginary part"),
    "aleph" => ord('ℵ', "aleph"),
    "prime" => ord('′', "prime"),
    "angle" => ord('∠', "angle"),
    "triangle" => ord('△', "triangle"),
    "ldots" => ord('…', "dot dot dot"),
    "dots" => ord('…', "dot dot dot"),
    "cdots" => ord('⋯', "dot dot dot"),
    "vdots" => ord('⋮', "vertical dots"),
    "ddots" => ord('⋱', "diagonal dots"),
    "|" => ord('‖', "norm"),
    "#" => ord('#', "hash"),
    "$" => ord('$', "dollar"),
    "%" => ord('%', "percent"),
    "&" => ord('&', "and"),
    "_" => ord('_', "underscore"),
    // Binary operators
    "pm" => bin('±', "plus or minus"),
    "mp" => bin('∓', "minus or plus"),
    "times" => bin('×', "times"),
    "div" => bin('÷', "divided by"),
    "cdot" => bin('⋅', "times"),
    "ast" => bin('∗', "asterisk"),
    "star" => bin('⋆', "star"),
    "circ" => bin('∘', "composed with"),
    "bullet" => bin('∙', "bullet"),
    "oplus" => bin('⊕', "circle plus"),
    "otimes" => bin('⊗', "circle times"),
    "cup" => bin('∪', "union"),
    "cap" => bin('∩', "intersection"),
    "setminus" => bin('∖', "set minus"),
    "wedge" => bin('∧', "and"),
    "land" => bin('∧', "and"),
    "vee" => bin('∨', "or"),
    "lor" => bin('∨', "or"),
    // Relations
    "le" => rel('≤', "less than or equal to"),
    "leq" => rel('≤', "less than or equal to"),
    "ge" => rel('≥', "greater than or equal to"),
    "geq" => rel('≥', "greater than or equal to"),
    "ne" => rel('≠', "not equal to"),
    "neq" => rel('≠', "not equal to"),
    "approx" => rel('≈', "approximately equal to"),
    "equiv" => rel('≡', "is equivalent to"),
    "sim" => rel('∼', "is similar to"),
    "simeq" => rel('≃', "is asymptotically equal to"),
    "cong" => rel('≅', "is congruent to"),
    "propto" => rel('∝', "is proportional to"),
    "ll" => rel('≪', "much less than"),
    "gg" => rel('≫', "much greater than"),
    "in" => rel('∈', "is an element of"),
    "notin" => rel('∉', "is not an element of"),
    "ni" => rel('∋', "contains"),
    "subset" => rel('⊂', "is a subset of"),
    "supset" => rel('⊃', "is a superset of"),
    "subseteq" => rel('⊆', "is a subset of or equal to"),
    "supseteq" => rel('⊇', "is a superset of or equal to"),
    "perp" => rel('⊥', "is perpendicular to"),
    "parallel" => rel('∥', "is parallel to"),
    "mid" => rel('∣', "divides"),
    ":" => space("medium space"),
    // Arrows
    "to" => arrow('→', "to"),
    "rightarrow" => arrow('→', "right arrow"),
    "leftarrow" => arrow('←', "left arrow"),
    "gets" => arrow('←', "gets"),
    "leftrightarrow" => arrow('↔', "left right arrow"),
    "Rightarrow" => arrow('⇒', "implies"),
    "Leftarrow" => arrow('⇐', "is implied by"),
    "Leftrightarrow" => arrow('⇔', "if and only if"),
    "implies" => arrow('⟹', "implies"),
    "iff" => arrow('⟺', "if and only if"),
    "mapsto" => arrow('↦', "maps to"),
    "uparrow" => arrow('↑', "up arrow"),
    "downarrow" => arrow('↓', "down arrow"),
    // Fences
    "{" => open('{', "open brace"),
    "}" => close('}', "close brace"),
    "lbrace" => open('{', "open brace"),
    "rbrace" => close('}', "close brace"),
    "langle" => open('⟨', "open angle bracket"),
    "rangle" => close('⟩', "close angle bracket"),
    "lfloor" => open('⌊', "open floor"),
    "rfloor" => close('⌋', "close floor"),
    "lceil" => open('⌈', "open ceiling"),
    "rceil" => close('⌉', "close ceiling"),
    "lvert" => open('|', "open bar"),
    "rvert" => close('|', "close bar"),
    // Large operators
    "sum" => with_examples(big_op('∑', "the sum"), &[r"\sum_{i=1}^{n}"]),
    "prod" => with_examples(big_op('∏', "the product"), &[r"\prod_{i=1}^{n}"]),
    "coprod" => big_op('∐', "the coproduct"),
    "int" => with_examples(big_op('∫', "the integral"), &[r"\int_{0}^{1}"]),
    "iint" => big_op('∬', "the double integral"),
    "iiint" => big_op('∭', "the triple integral"),
    "oint" => big_op('∮', "the contour integral"),
    "bigcup" => big_op('⋃', "the union"),
    "bigcap" => big_op('⋂', "the intersection"),
    "bigoplus" => big_op('⨁', "the direct sum"),
    "bigotimes" => big_op('⨂', "the tensor product"),
    // Named functions
    "sin" => function("sine"),
    "cos" => function("cosine"),
    "tan" => function("tangent"),
    "cot" => function("cotangent"),
    "sec" => function("secant"),
    "csc" => function("cosecant"),
    "arcsin" => function("arc sine"),
    "arccos" => function("arc cosine"),
    "arctan" => function("arc tangent"),
    "sinh" => function("hyperbolic sine"),
    "cosh" => function("hyperbolic cosine"),
    "tanh" => function("hyperbolic tangent"),
    "log" => function("log"),
    "ln" => function("natural log"),
    "exp" => function("exponential"),
    "lim" => with_examples(function("the limit"), &[r"\lim_{x\to\infty}"]),
    "max" => function("the maximum"),
    "min" => function("the minimum"),
    "sup" => function("the supremum"),
    "inf" => function("the infimum"),
    "det" => function("the determinant"),
    "gcd" => function("the greatest common divisor"),
    "deg" => function("degree"),
    "dim" => function("dimension"),
    "ker" => function("kernel"),
    "arg" => function("argument"),
    "Pr" => function("probability"),
    // Fractions and radicals
    "frac" => with_examples(
        spec(CommandAction::Fraction, 2, "fraction", 1),
        &[r"\frac{1}{2}", r"\frac{a+b}{c}"],
    ),
    "dfrac" => with_examples(
        spec(CommandAction::Fraction, 2, "fraction", 3),
        &[r"\dfrac{1}{2}"],
    ),
    "tfrac" => with_examples(
        spec(CommandAction::Fraction, 2, "fraction", 3),
        &[r"\tfrac{1}{2}"],
    ),
    "sqrt" => with_examples(
        spec(CommandAction::Sqrt, 1, "square root", 1),
        &[r"\sqrt{2}", r"\sqrt[3]{x}"],
    ),
    // Accents
    "hat" => accent('ˆ', "hat"),
    "widehat" => accent('ˆ', "hat"),
    "check" => accent('ˇ', "check"),
    "tilde" => accent('˜', "tilde"),
    "widetilde" => accent('˜', "tilde"),
    "bar" => accent('¯', "bar"),
    "overline" => accent('¯', "bar"),
    "vec" => with_examples(accent('→', "vector"), &[r"\vec{v}"]),
    "dot" => accent('˙', "dot"),
    "ddot" => accent('¨', "double dot"),
    "breve" => accent('˘', "breve"),
    "acute" => accent('´', "acute"),
    "grave" => accent('`', "grave"),
    // Fonts
    "mathbb" => with_examples(font("blackboard"), &[r"\mathbb{R}"]),
    "mathbf" => font("bold"),
    "boldsymbol" => font("bold"),
    "mathrm" => font("roman"),
    "mathit" => font("italic"),
    "mathcal" => with_examples(font("calligraphic"), &[r"\mathcal{L}"]),
    "mathscr" => font("script"),
    "mathfrak" => font("fraktur"),
    "mathsf" => font("sans serif"),
    "mathtt" => font("monospace"),
    "operatorname" => with_examples(font("operator"), &[r"\operatorname{sgn}"]),
    // Text
    "text" => with_examples(text("text"), &[r"\text{if }"]),
    "textrm" => text("text"),
    "textit" => text("italic text"),
    "textbf" => text("bold text"),
    "mbox" => text("text"),
    // Spaces
    "," => space("thin space"),
    ">" => space("medium space"),
    ";" => space("thick space"),
    "!" => space("negative thin space"),
    " " => space("space"),
    "thinspace" => space("thin space"),
    "medspace" => space("medium space"),
    "thickspace" => space("thick space"),
    "negthinspace" => space("negative thin space"),
    "quad" => space("quad space"),
    "qquad" => space("double quad space"),
    // Structure
    "placeholder" => spec(CommandAction::Placeholder, 0, "placeholder", 6),
    "begin" => with_examples(
        spec(CommandAction::Begin, 1, "begin environment", 4),
        &[r"\begin{pmatrix}a&b\\c&d\end{pmatrix}"],
    ),
    "end" => spec(CommandAction::End, 1, "end environment", 6),
    "\\" => spec(CommandAction::NewRow, 0, "new row", 6),
};

/// Environments which produce arrays.
static ENVIRONMENTS: phf::Set<&'static str> = phf::phf_set! {
    "matrix",
    "pmatrix",
    "bmatrix",
    "Bmatrix",
    "vmatrix",
    "Vmatrix",
    "cases",
};

/// Look up a command by its name without the backslash.
#[inline]
pub fn get_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.get(name)
}

#[inline]
pub fn is_known_environment(name: &str) -> bool {
    ENVIRONMENTS.contains(name)
}

/// The atom kind and drawn glyph of a literal character in math mode.
pub fn char_atom_kind(ch: char) -> (AtomKind, char) {
    match ch {
        '+' => (AtomKind::Bin, '+'),
        '-' => (AtomKind::Bin, '−'),
        '*' => (AtomKind::Bin, '∗'),
        '=' | '<' | '>' | ':' => (AtomKind::Rel, ch),
        ',' | ';' => (AtomKind::Punct, ch),
        '(' | '[' => (AtomKind::Open, ch),
        ')' | ']' | '!' | '?' => (AtomKind::Close, ch),
        '~' => (AtomKind::Space, ' '),
        _ => (AtomKind::Ord, ch),
    }
}

/// The atom for a literal character in math mode.
pub fn char_atom(ch: char) -> Atom {
    match ch {
        '\'' => Atom::symbol(AtomKind::Ord, r"\prime", Some('′')),
        '~' => Atom::new(AtomKind::Space).with_value("~"),
        _ => {
            let (kind, glyph) = char_atom_kind(ch);
            Atom::char(kind, ch).with_glyph(Some(glyph))
        }
    }
}

/// A completion candidate for a partially typed command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suggestion {
    /// The command name without the backslash.
    pub name: &'static str,
    pub spec: &'static CommandSpec,
}

impl Suggestion {
    /// The command as it is written in LaTeX.
    pub fn latex(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 1);
        out.push('\\');
        out.push_str(self.name);
        out
    }
}

/// Commands whose name starts with `prefix`, most relevant first.
///
/// Only commands spelled with letters are suggested. The order is by priority, then by length
/// and finally alphabetical, so that the result is deterministic.
pub fn suggest(prefix: &str) -> Vec<Suggestion> {
    let prefix = prefix.strip_prefix('\\').unwrap_or(prefix);
    let mut found: Vec<Suggestion> = COMMANDS
        .entries()
        .filter(|(name, _)| {
            name.starts_with(prefix) && name.bytes().all(|b| b.is_ascii_alphabetic())
        })
        .map(|(name, spec)| Suggestion { name: *name, spec })
        .collect();
    found.sort_by(|a, b| {
        (a.spec.priority, a.name.len(), a.name).cmp(&(b.spec.priority, b.name.len(), b.name))
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        let frac = get_command("frac").unwrap();
        assert_eq!(frac.action, CommandAction::Fraction);
        assert_eq!(frac.arity, 2);
        assert!(get_command(r"\frac").is_none());
        assert!(get_command("fraction").is_none());
        assert!(matches!(
            get_command("alpha").unwrap().action,
            CommandAction::Symbol(AtomKind::Ord, 'α')
        ));
    }

    #[test]
    fn suggestions_are_ranked() {
        let names: Vec<_> = suggest("fr").iter().map(|s| s.name).collect();
        assert_eq!(names, ["frac"]);
        let names: Vec<_> = suggest("sq").iter().map(|s| s.name).collect();
        assert_eq!(names, ["sqrt"]);
        let names: Vec<_> = suggest("pi").iter().map(|s| s.name).collect();
        assert_eq!(names, ["pi"]);
        let names: Vec<_> = suggest(r"\le").iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["le", "leq", "leftarrow", "leftrightarrow"]
        );
    }

    #[test]
    fn control_symbols_are_not_suggested() {
        let all = suggest("");
        assert!(!all.is_empty());
        assert!(all.iter().all(|s| s.name.bytes().all(|b| b.is_ascii_alphabetic())));
        assert!(suggest("zz").is_empty());
    }

    #[test]
    fn suggestion_latex() {
        let s = suggest("alph")[0];
        assert_eq!(s.latex(), r"\alpha");
        assert_eq!(s.spec.note, "alpha");
    }

    #[test]
    fn character_classes() {
        assert_eq!(char_atom_kind('-'), (AtomKind::Bin, '−'));
        assert_eq!(char_atom_kind('='), (AtomKind::Rel, '='));
        assert_eq!(char_atom_kind('x'), (AtomKind::Ord, 'x'));
        let minus = char_atom('-');
        assert_eq!(minus.value(), Some("-"));
        assert_eq!(minus.glyph(), Some('−'));
        assert_eq!(char_atom('\'').value(), Some(r"\prime"));
    }

    #[test]
    fn environments() {
        assert!(is_known_environment("pmatrix"));
        assert!(!is_known_environment("align"));
    }
}
