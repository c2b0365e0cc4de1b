//! Approximate glyph metrics, in ems of the base size.
//!
//! The values follow Computer Modern as measured by KaTeX, grouped by character shape rather
//! than listed per glyph.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub height: f64,
    pub depth: f64,
    pub width: f64,
}

impl GlyphMetrics {
    const fn new(height: f64, depth: f64, width: f64) -> Self {
        GlyphMetrics {
            height,
            depth,
            width,
        }
    }

    #[must_use]
    pub fn scaled(self, k: f64) -> Self {
        GlyphMetrics {
            height: self.height * k,
            depth: self.depth * k,
            width: self.width * k,
        }
    }
}

const DIGIT: GlyphMetrics = GlyphMetrics::new(0.644, 0.0, 0.5);
const UPPER: GlyphMetrics = GlyphMetrics::new(0.683, 0.0, 0.75);
const OPERATOR: GlyphMetrics = GlyphMetrics::new(0.583, 0.083, 0.778);
const RELATION: GlyphMetrics = GlyphMetrics::new(0.54, 0.04, 0.778);
const FENCE: GlyphMetrics = GlyphMetrics::new(0.75, 0.25, 0.389);
const BIG_OP: GlyphMetrics = GlyphMetrics::new(0.75, 0.25, 1.0);
const INTEGRAL: GlyphMetrics = GlyphMetrics::new(0.805, 0.306, 0.417);
/// Accent marks include the space between the x-height and the mark, as in TeX fonts.
pub const ACCENT: GlyphMetrics = GlyphMetrics::new(0.694, 0.0, 0.5);
const OTHER: GlyphMetrics = GlyphMetrics::new(0.7, 0.2, 0.6);

/// The advance of the radical sign.
pub const SURD_WIDTH: f64 = 0.833;
/// Placeholder boxes are a hollow square a little taller than the x-height.
pub const PLACEHOLDER: GlyphMetrics = GlyphMetrics::new(0.6, 0.0, 0.55);
pub const PLACEHOLDER_CHAR: char = '⬚';

pub fn metrics(ch: char) -> GlyphMetrics {
    match ch {
        '0'..='9' => DIGIT,
        'b' | 'd' | 'f' | 'h' | 'k' | 'l' | 't' => GlyphMetrics::new(0.694, 0.0, 0.5),
        'g' | 'p' | 'q' | 'y' => GlyphMetrics::new(0.431, 0.194, 0.5),
        'j' => GlyphMetrics::new(0.66, 0.194, 0.35),
        'i' => GlyphMetrics::new(0.66, 0.0, 0.35),
        'm' | 'w' => GlyphMetrics::new(0.431, 0.0, 0.75),
        'a'..='z' => GlyphMetrics::new(0.431, 0.0, 0.5),
        'Q' => GlyphMetrics::new(0.683, 0.194, 0.778),
        'A'..='Z' => UPPER,
        'β' | 'ζ' | 'ξ' => GlyphMetrics::new(0.694, 0.194, 0.6),
        'δ' | 'θ' | 'λ' | 'ϑ' | 'ℓ' | '∂' => GlyphMetrics::new(0.694, 0.0, 0.6),
        'γ' | 'η' | 'μ' | 'ρ' | 'φ' | 'ϕ' | 'χ' | 'ψ' | 'ϱ' => {
            GlyphMetrics::new(0.431, 0.194, 0.6)
        }
        'α'..='ω' | 'ϵ' | 'ϖ' => GlyphMetrics::new(0.431, 0.0, 0.6),
        'Α'..='Ω' => UPPER,
        '+' | '-' | '−' | '×' | '÷' | '±' | '∓' | '·' | '⋅' | '∘' | '∗' | '∪' | '∩' | '∧'
        | '∨' | '⊕' | '⊗' => OPERATOR,
        '=' | '≡' | '≈' | '∼' | '≃' | '≅' => GlyphMetrics::new(0.367, 0.0, 0.778),
        '<' | '>' | '≤' | '≥' | '≠' | '≪' | '≫' | '∈' | '∉' | '∋' | '⊂' | '⊃' | '⊆' | '⊇' | '∝'
        | '∣' | '∥' | '⊥' => RELATION,
        '→' | '←' | '↔' | '⇒' | '⇐' | '⇔' | '↦' | '↑' | '↓' => {
            GlyphMetrics::new(0.511, 0.011, 1.0)
        }
        '(' | ')' | '[' | ']' | '{' | '}' | '⟨' | '⟩' | '⌊' | '⌋' | '⌈' | '⌉' => FENCE,
        '|' | '‖' => GlyphMetrics::new(0.75, 0.25, 0.278),
        ',' | ';' => GlyphMetrics::new(0.431, 0.194, 0.278),
        '.' => GlyphMetrics::new(0.12, 0.0, 0.278),
        ':' => GlyphMetrics::new(0.431, 0.0, 0.278),
        '!' | '?' => GlyphMetrics::new(0.694, 0.0, 0.278),
        '/' | '\\' => FENCE,
        '∑' | '∏' | '∐' | '⋃' | '⋂' | '⨁' | '⨂' => BIG_OP,
        '∫' | '∬' | '∭' | '∮' => INTEGRAL,
        '∞' => GlyphMetrics::new(0.431, 0.0, 1.0),
        '∅' | '∇' | '∀' | '∃' | '¬' => GlyphMetrics::new(0.694, 0.0, 0.556),
        '′' => GlyphMetrics::new(0.56, 0.0, 0.275),
        '…' | '⋯' => GlyphMetrics::new(0.31, 0.0, 1.172),
        'ˆ' | '˜' | '¯' | '˙' | '¨' | '˘' | 'ˇ' | '´' | '`' | '⃗' => ACCENT,
        ' ' => GlyphMetrics::new(0.0, 0.0, 0.25),
        _ => OTHER,
    }
}

/// Large operators grow in display style.
pub fn is_large_operator(ch: char) -> bool {
    matches!(
        ch,
        '∑' | '∏' | '∐' | '⋃' | '⋂' | '⨁' | '⨂' | '∫' | '∬' | '∭' | '∮'
    )
}

/// Width of a spacing command, in math units (1/18 em).
pub fn space_width_mu(command: &str) -> f64 {
    match command {
        r"\," | r"\thinspace" => 3.0,
        r"\:" | r"\>" | r"\medspace" => 4.0,
        r"\;" | r"\thickspace" => 5.0,
        r"\!" | r"\negthinspace" => -3.0,
        r"\ " | "~" => 6.0,
        r"\quad" => 18.0,
        r"\qquad" => 36.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descenders_have_depth() {
        assert!(metrics('y').depth > 0.0);
        assert_eq!(metrics('x').depth, 0.0);
        assert!(metrics('d').height > metrics('x').height);
    }

    #[test]
    fn scaled_metrics() {
        let m = metrics('1').scaled(0.5);
        assert_eq!(m.width, 0.25);
    }

    #[test]
    fn spaces() {
        assert_eq!(space_width_mu(r"\quad"), 18.0);
        assert!(space_width_mu(r"\!") < 0.0);
    }
}
