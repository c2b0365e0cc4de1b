/// TeX's atom classes, which decide the spacing between neighbouring atoms.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// `mathord`
    #[default]
    Default = 0,
    /// `mathop`
    Operator,
    /// `mathbin`
    BinaryOp,
    /// `mathrel`
    Relation,
    /// `mathopen`
    Open,
    /// `mathclose`
    Close,
    /// `mathpunct`
    Punctuation,
    /// `mathinner`
    Inner,
}

/// Amount of glue inserted between two atoms, in math units (1/18 em).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    None,
    Thin,
    Medium,
    Thick,
}

impl Spacing {
    #[inline]
    pub const fn mu(self) -> f64 {
        match self {
            Spacing::None => 0.0,
            Spacing::Thin => 3.0,
            Spacing::Medium => 4.0,
            Spacing::Thick => 5.0,
        }
    }
}

use Spacing::{Medium as M, None as O, Thick as K, Thin as T};

// Rows are the left class and columns the right class, both in declaration order.
// `true` marks entries that only apply in display and text style.
const TABLE: [[(Spacing, bool); 8]; 8] = [
    // Ord
    [(O, false), (T, false), (M, true), (K, true), (O, false), (O, false), (O, false), (T, true)],
    // Op
    [(T, false), (T, false), (O, false), (K, true), (O, false), (O, false), (O, false), (T, true)],
    // Bin
    [(M, true), (M, true), (O, false), (O, false), (M, true), (O, false), (O, false), (M, true)],
    // Rel
    [(K, true), (K, true), (O, false), (O, false), (K, true), (O, false), (O, false), (K, true)],
    // Open
    [(O, false), (O, false), (O, false), (O, false), (O, false), (O, false), (O, false), (O, false)],
    // Close
    [(O, false), (T, false), (M, true), (K, true), (O, false), (O, false), (O, false), (T, true)],
    // Punct
    [(T, true), (T, true), (O, false), (T, true), (T, true), (T, true), (T, true), (T, true)],
    // Inner
    [(T, true), (T, false), (M, true), (K, true), (T, true), (O, false), (T, true), (T, true)],
];

/// The glue TeX puts between an atom of class `left` and one of class `right`.
pub fn spacing(left: Class, right: Class, tight: bool) -> Spacing {
    let (amount, loose_only) = TABLE[left as usize][right as usize];
    if loose_only && tight {
        Spacing::None
    } else {
        amount
    }
}

/// Applies TeX's rule that a binary operator without proper operands is an ordinary atom.
///
/// `classes` is rewritten in place; `None` entries are transparent for the purpose of this rule.
pub fn resolve_binary_operators(classes: &mut [Option<Class>]) {
    let mut prev: Option<Class> = None;
    for i in 0..classes.len() {
        let Some(class) = classes[i] else {
            continue;
        };
        if class == Class::BinaryOp
            && matches!(
                prev,
                None | Some(
                    Class::BinaryOp
                        | Class::Operator
                        | Class::Relation
                        | Class::Open
                        | Class::Punctuation
                )
            )
        {
            classes[i] = Some(Class::Default);
        }
        if matches!(
            classes[i],
            Some(Class::Relation | Class::Close | Class::Punctuation)
        ) && prev == Some(Class::BinaryOp)
            && let Some(prev_idx) = classes[..i].iter().rposition(Option::is_some)
        {
            classes[prev_idx] = Some(Class::Default);
        }
        prev = classes[i];
    }
    // A trailing binary operator has no right operand.
    if let Some(last) = classes.iter_mut().rev().find_map(Option::as_mut)
        && *last == Class::BinaryOp
    {
        *last = Class::Default;
    }
}
