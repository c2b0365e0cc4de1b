//! TeX styles and the font parameters that go with them.
//!
//! A style is one of display, text, script and scriptscript, each either cramped or not.
//! Transitions between styles (for superscripts, fractions, ...) are table lookups.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Style {
    id: u8,
}

const D: u8 = 0;
const DC: u8 = 1;
const T: u8 = 2;
const TC: u8 = 3;
const S: u8 = 4;
const SC: u8 = 5;
const SS: u8 = 6;
const SSC: u8 = 7;

const SUP: [u8; 8] = [S, SC, S, SC, SS, SSC, SS, SSC];
const SUB: [u8; 8] = [SC, SC, SC, SC, SSC, SSC, SSC, SSC];
const FRAC_NUM: [u8; 8] = [T, TC, S, SC, SS, SSC, SS, SSC];
const FRAC_DEN: [u8; 8] = [TC, TC, SC, SC, SSC, SSC, SSC, SSC];
const CRAMP: [u8; 8] = [DC, DC, TC, TC, SC, SC, SSC, SSC];
const TEXT: [u8; 8] = [D, DC, T, TC, T, TC, T, TC];

/// Size class of a style: display and text share the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Text = 0,
    Script = 1,
    ScriptScript = 2,
}

impl Style {
    pub const DISPLAY: Style = Style { id: D };
    pub const TEXT: Style = Style { id: T };
    pub const SCRIPT: Style = Style { id: S };
    pub const SCRIPTSCRIPT: Style = Style { id: SS };

    #[inline]
    pub const fn sup(self) -> Style {
        Style { id: SUP[self.id as usize] }
    }

    #[inline]
    pub const fn sub(self) -> Style {
        Style { id: SUB[self.id as usize] }
    }

    #[inline]
    pub const fn frac_num(self) -> Style {
        Style { id: FRAC_NUM[self.id as usize] }
    }

    #[inline]
    pub const fn frac_den(self) -> Style {
        Style { id: FRAC_DEN[self.id as usize] }
    }

    #[inline]
    pub const fn cramp(self) -> Style {
        Style { id: CRAMP[self.id as usize] }
    }

    /// The text or display version of this style, used inside arrays.
    #[inline]
    pub const fn text(self) -> Style {
        Style { id: TEXT[self.id as usize] }
    }

    #[inline]
    pub const fn is_display(self) -> bool {
        self.id <= DC
    }

    #[inline]
    pub const fn is_cramped(self) -> bool {
        self.id % 2 == 1
    }

    /// Script styles drop most inter-atom spacing.
    #[inline]
    pub const fn is_tight(self) -> bool {
        self.id >= S
    }

    #[inline]
    pub const fn size(self) -> Size {
        match self.id {
            D | DC | T | TC => Size::Text,
            S | SC => Size::Script,
            _ => Size::ScriptScript,
        }
    }

    /// Font size relative to the base size.
    #[inline]
    pub const fn scale(self) -> f64 {
        match self.size() {
            Size::Text => 1.0,
            Size::Script => 0.7,
            Size::ScriptScript => 0.5,
        }
    }

    /// One math unit (1/18 em) at this style's size.
    #[inline]
    pub fn mu(self) -> f64 {
        self.scale() / 18.0
    }

    pub const fn name(self) -> &'static str {
        match self.id {
            D => "display",
            DC => "display-cramped",
            T => "text",
            TC => "text-cramped",
            S => "script",
            SC => "script-cramped",
            SS => "scriptscript",
            _ => "scriptscript-cramped",
        }
    }
}

/// TeX's σ and ξ font parameters, in ems of the size they belong to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontParams {
    pub x_height: f64,
    pub quad: f64,
    pub num1: f64,
    pub num2: f64,
    pub denom1: f64,
    pub denom2: f64,
    pub sup1: f64,
    pub sup2: f64,
    pub sup3: f64,
    pub sub1: f64,
    pub sub2: f64,
    pub sup_drop: f64,
    pub sub_drop: f64,
    pub axis_height: f64,
    pub default_rule_thickness: f64,
    pub sqrt_rule_thickness: f64,
}

const PARAMS: [FontParams; 3] = [
    FontParams {
        x_height: 0.431,
        quad: 1.0,
        num1: 0.677,
        num2: 0.394,
        denom1: 0.686,
        denom2: 0.345,
        sup1: 0.413,
        sup2: 0.363,
        sup3: 0.289,
        sub1: 0.150,
        sub2: 0.247,
        sup_drop: 0.386,
        sub_drop: 0.050,
        axis_height: 0.250,
        default_rule_thickness: 0.040,
        sqrt_rule_thickness: 0.040,
    },
    FontParams {
        x_height: 0.431,
        quad: 1.171,
        num1: 0.732,
        num2: 0.384,
        denom1: 0.752,
        denom2: 0.344,
        sup1: 0.503,
        sup2: 0.431,
        sup3: 0.286,
        sub1: 0.143,
        sub2: 0.286,
        sup_drop: 0.353,
        sub_drop: 0.071,
        axis_height: 0.250,
        default_rule_thickness: 0.049,
        sqrt_rule_thickness: 0.040,
    },
    FontParams {
        x_height: 0.431,
        quad: 1.472,
        num1: 0.925,
        num2: 0.387,
        denom1: 1.025,
        denom2: 0.532,
        sup1: 0.504,
        sup2: 0.404,
        sup3: 0.294,
        sub1: 0.200,
        sub2: 0.400,
        sup_drop: 0.494,
        sub_drop: 0.100,
        axis_height: 0.250,
        default_rule_thickness: 0.049,
        sqrt_rule_thickness: 0.040,
    },
];

/// Space after a script, independent of the font size.
pub const SCRIPT_SPACE: f64 = 0.05;
/// Horizontal padding on both sides of a fraction.
pub const NULL_DELIMITER_SPACE: f64 = 0.12;

impl FontParams {
    /// The parameters for `style`, converted to ems of the base size.
    pub fn for_style(style: Style) -> FontParams {
        let p = &PARAMS[style.size() as usize];
        let k = style.scale();
        FontParams {
            x_height: p.x_height * k,
            quad: p.quad * k,
            num1: p.num1 * k,
            num2: p.num2 * k,
            denom1: p.denom1 * k,
            denom2: p.denom2 * k,
            sup1: p.sup1 * k,
            sup2: p.sup2 * k,
            sup3: p.sup3 * k,
            sub1: p.sub1 * k,
            sub2: p.sub2 * k,
            sup_drop: p.sup_drop * k,
            sub_drop: p.sub_drop * k,
            axis_height: p.axis_height * k,
            default_rule_thickness: p.default_rule_thickness * k,
            sqrt_rule_thickness: p.sqrt_rule_thickness * k,
        }
    }
}
