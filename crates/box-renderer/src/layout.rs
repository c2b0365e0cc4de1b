//! Box layout following the TeXbook's appendix G, as implemented by KaTeX.
//!
//! Layout is a pure function of the tree and the starting style. The style is threaded through
//! the recursion; every nested branch is laid out in the style its container dictates.

use crate::atom::{Atom, AtomFlags, AtomKind, Body};
use crate::class::{self, Class, Spacing};
use crate::mbox::{BoxClass, BoxContent, MathBox};
use crate::style::{FontParams, NULL_DELIMITER_SPACE, SCRIPT_SPACE, Style};
use crate::symbol::{self, GlyphMetrics};

/// Lays out an expression tree, normally rooted at an [`AtomKind::Root`] atom.
pub fn layout(root: &Atom, style: Style) -> MathBox {
    match root.kind() {
        AtomKind::Root => {
            let caret_inside = root.flags.contains(AtomFlags::CARET_INSIDE);
            layout_list(root.children().unwrap_or_default(), style, caret_inside)
                .with_atom(root.id())
        }
        _ => layout_atom(root, style, None),
    }
}

/// Lays out a sequence of sibling atoms on a common baseline, with TeX's inter-atom glue.
fn layout_list(atoms: &[Atom], style: Style, caret_inside: bool) -> MathBox {
    let mut classes: Vec<Option<Class>> = atoms.iter().map(|atom| atom.kind().class()).collect();
    class::resolve_binary_operators(&mut classes);

    let mut boxes = Vec::with_capacity(atoms.len() * 2 + 1);
    if caret_inside {
        boxes.push(caret(style));
    }
    let mut prev: Option<Class> = None;
    for (atom, class) in atoms.iter().zip(classes) {
        if let (Some(left), Some(right)) = (prev, class) {
            let glue = class::spacing(left, right, style.is_tight());
            if glue != Spacing::None {
                boxes.push(MathBox::kern(glue.mu() * style.mu()));
            }
        }
        if atom.flags.contains(AtomFlags::CARET_BEFORE) {
            boxes.push(caret(style));
        }
        boxes.push(layout_atom(atom, style, class));
        if atom.flags.contains(AtomFlags::CARET_AFTER) {
            boxes.push(caret(style));
        }
        if class.is_some() {
            prev = class;
        }
    }
    MathBox::hlist(boxes)
}

fn layout_atom(atom: &Atom, style: Style, class: Option<Class>) -> MathBox {
    let nucleus = layout_nucleus(atom, style, class).with_atom(atom.id());
    let result = if atom.superscript().is_some() || atom.subscript().is_some() {
        attach_scripts(nucleus, atom, style).with_atom(atom.id())
    } else {
        nucleus
    };
    result.with_class(decorations(atom.flags))
}

fn decorations(flags: AtomFlags) -> BoxClass {
    let mut classes = BoxClass::empty();
    classes.set(BoxClass::SELECTED, flags.contains(AtomFlags::SELECTED));
    classes.set(BoxClass::ERROR, flags.contains(AtomFlags::ERROR));
    classes.set(BoxClass::SUGGESTION, flags.contains(AtomFlags::SUGGESTION));
    classes
}

fn layout_nucleus(atom: &Atom, style: Style, class: Option<Class>) -> MathBox {
    let caret_inside = atom.flags.contains(AtomFlags::CARET_INSIDE);
    match (atom.kind(), atom.body()) {
        (AtomKind::Op, _) => layout_operator(atom, style),
        (AtomKind::Space, _) => {
            MathBox::kern(symbol::space_width_mu(atom.value().unwrap_or_default()) * style.mu())
        }
        (AtomKind::Placeholder, _) => {
            let m = symbol::PLACEHOLDER.scaled(style.scale());
            MathBox::glyph(symbol::PLACEHOLDER_CHAR, m.width, m.height, m.depth)
                .with_class(BoxClass::PLACEHOLDER)
        }
        (AtomKind::UnknownCommand, _) => {
            text_run(atom.value().unwrap_or_default(), style).with_class(BoxClass::ERROR)
        }
        (AtomKind::Command, _) => {
            let b = atom.glyph().map_or_else(MathBox::empty, |ch| glyph(ch, style));
            b.with_class(BoxClass::COMMAND)
        }
        (AtomKind::Fraction, Body::Fraction { numer, denom }) => {
            layout_fraction(atom, numer, denom, style)
        }
        (AtomKind::Radical, Body::Radical { radicand, index }) => {
            layout_radical(radicand, index.as_deref(), style)
        }
        (AtomKind::Accent, Body::Children(body)) => layout_accent(atom, body, style),
        (AtomKind::Array, _) => layout_array(atom, style),
        (AtomKind::Font, Body::Children(body)) => {
            layout_list(body, style, caret_inside).with_class(font_class(atom.value()))
        }
        (AtomKind::Text, Body::Children(body)) => layout_list(body, style, caret_inside)
            .with_class(BoxClass::TEXT | BoxClass::UPRIGHT),
        (_, Body::Children(body)) => layout_list(body, style, caret_inside),
        _ => match atom.glyph() {
            Some(ch) => {
                let b = glyph(ch, style);
                // Upper-case Greek and other upright ordinary symbols are not slanted.
                if class == Some(Class::Default) && atom.value().is_some_and(is_upright_command) {
                    b.with_class(BoxClass::UPRIGHT)
                } else {
                    b
                }
            }
            None => text_run(atom.value().unwrap_or_default(), style),
        },
    }
}

fn is_upright_command(command: &str) -> bool {
    command.starts_with('\\')
        && command[1..].chars().next().is_some_and(|ch| ch.is_ascii_uppercase())
}

fn glyph(ch: char, style: Style) -> MathBox {
    let m = symbol::metrics(ch).scaled(style.scale());
    MathBox::glyph(ch, m.width, m.height, m.depth)
}

fn glyph_with(ch: char, m: GlyphMetrics) -> MathBox {
    MathBox::glyph(ch, m.width, m.height, m.depth)
}

fn caret(style: Style) -> MathBox {
    let k = style.scale();
    MathBox::caret(0.75 * k, 0.25 * k)
}

/// Draws a string glyph by glyph, without math spacing.
fn text_run(text: &str, style: Style) -> MathBox {
    MathBox::hlist(text.chars().map(|ch| glyph(ch, style)).collect())
}

fn font_class(command: Option<&str>) -> BoxClass {
    match command {
        Some(r"\mathbb") => BoxClass::BLACKBOARD,
        Some(r"\mathbf" | r"\boldsymbol") => BoxClass::BOLD,
        Some(r"\mathrm" | r"\operatorname") => BoxClass::UPRIGHT,
        Some(r"\mathcal" | r"\mathscr") => BoxClass::CALLIGRAPHIC,
        Some(r"\mathfrak") => BoxClass::FRAKTUR,
        Some(r"\mathsf") => BoxClass::SANS_SERIF,
        Some(r"\mathtt") => BoxClass::MONOSPACE,
        _ => BoxClass::empty(),
    }
}

fn layout_operator(atom: &Atom, style: Style) -> MathBox {
    match atom.glyph() {
        Some(ch) if symbol::is_large_operator(ch) => {
            let grow = if style.is_display() { 1.4 } else { 1.0 };
            let m = symbol::metrics(ch).scaled(grow * style.scale());
            let params = FontParams::for_style(style);
            // Large operators are centred on the math axis.
            let shift = params.axis_height - (m.height - m.depth) / 2.0;
            let mut op = MathBox::empty();
            op.place(0.0, shift, glyph_with(ch, m));
            op.width = m.width;
            op.with_class(BoxClass::LARGE_OP)
        }
        Some(ch) => glyph(ch, style),
        None => {
            let name = atom.value().unwrap_or_default();
            text_run(name.strip_prefix('\\').unwrap_or(name), style).with_class(BoxClass::UPRIGHT)
        }
    }
}

/// TeXbook rules 18a to 18f.
fn attach_scripts(base: MathBox, atom: &Atom, style: Style) -> MathBox {
    let params = FontParams::for_style(style);
    let is_character_box = matches!(base.content, BoxContent::Glyph(_));

    let sup_style = style.sup();
    let sub_style = style.sub();
    let sup = atom
        .superscript()
        .map(|branch| layout_list(branch, sup_style, false).with_class(BoxClass::SUPERSCRIPT));
    let sub = atom
        .subscript()
        .map(|branch| layout_list(branch, sub_style, false).with_class(BoxClass::SUBSCRIPT));

    // Rule 18a
    let mut sup_shift = 0.0;
    let mut sub_shift = 0.0;
    if !is_character_box {
        if sup.is_some() {
            sup_shift = base.height - FontParams::for_style(sup_style).sup_drop;
        }
        if sub.is_some() {
            sub_shift = base.depth + FontParams::for_style(sub_style).sub_drop;
        }
    }

    // Rule 18c
    let min_sup_shift = if style.is_display() && !style.is_cramped() {
        params.sup1
    } else if style.is_cramped() {
        params.sup3
    } else {
        params.sup2
    };

    match (&sup, &sub) {
        (Some(sup), None) => {
            sup_shift = f64::max(sup_shift, min_sup_shift)
                .max(sup.depth + 0.25 * params.x_height);
        }
        (None, Some(sub)) => {
            // Rule 18b
            sub_shift = f64::max(sub_shift, params.sub1)
                .max(sub.height - 0.8 * params.x_height);
        }
        (Some(sup), Some(sub)) => {
            sup_shift = f64::max(sup_shift, min_sup_shift)
                .max(sup.depth + 0.25 * params.x_height);
            sub_shift = f64::max(sub_shift, params.sub2);

            // Rule 18e
            let min_gap = 4.0 * params.default_rule_thickness;
            if (sup_shift - sup.depth) - (sub.height - sub_shift) < min_gap {
                sub_shift = min_gap - (sup_shift - sup.depth) + sub.height;
                let psi = 0.8 * params.x_height - (sup_shift - sup.depth);
                if psi > 0.0 {
                    sup_shift += psi;
                    sub_shift -= psi;
                }
            }
        }
        (None, None) => {}
    }

    let base_width = base.width;
    let mut scripts_width: f64 = 0.0;
    let mut result = MathBox::empty();
    result.place(0.0, 0.0, base);
    if let Some(sup) = sup {
        scripts_width = scripts_width.max(sup.width);
        result.place(base_width, sup_shift, sup);
    }
    if let Some(sub) = sub {
        scripts_width = scripts_width.max(sub.width);
        result.place(base_width, -sub_shift, sub);
    }
    result.width = base_width + scripts_width + SCRIPT_SPACE;
    result
}

/// TeXbook rule 15.
fn layout_fraction(atom: &Atom, numer: &[Atom], denom: &[Atom], style: Style) -> MathBox {
    let style = match atom.value() {
        Some(r"\dfrac") => Style::DISPLAY,
        Some(r"\tfrac") => Style::TEXT,
        _ => style,
    };
    let num = layout_list(numer, style.frac_num(), false).with_class(BoxClass::NUMERATOR);
    let den = layout_list(denom, style.frac_den(), false).with_class(BoxClass::DENOMINATOR);

    let params = FontParams::for_style(style);
    let rule = params.default_rule_thickness;
    let axis = params.axis_height;
    let (mut num_shift, clearance, mut den_shift) = if style.is_display() {
        (params.num1, 3.0 * rule, params.denom1)
    } else {
        (params.num2, rule, params.denom2)
    };

    let num_gap = (num_shift - num.depth) - (axis + 0.5 * rule);
    if num_gap < clearance {
        num_shift += clearance - num_gap;
    }
    let den_gap = (axis - 0.5 * rule) - (den.height - den_shift);
    if den_gap < clearance {
        den_shift += clearance - den_gap;
    }

    let inner = num.width.max(den.width);
    let (num_x, den_x) = (
        NULL_DELIMITER_SPACE + (inner - num.width) / 2.0,
        NULL_DELIMITER_SPACE + (inner - den.width) / 2.0,
    );
    let mut frac = MathBox::empty();
    frac.place(num_x, num_shift, num);
    frac.place(
        NULL_DELIMITER_SPACE,
        axis - 0.5 * rule,
        MathBox::rule(inner, rule).with_class(BoxClass::FRACTION_RULE),
    );
    frac.place(den_x, -den_shift, den);
    frac.width = inner + 2.0 * NULL_DELIMITER_SPACE;
    frac
}

/// TeXbook rule 11, plus `\root` placement for the index.
fn layout_radical(radicand: &[Atom], index: Option<&[Atom]>, style: Style) -> MathBox {
    let inner = layout_list(radicand, style.cramp(), false);
    let params = FontParams::for_style(style);
    let theta = params.default_rule_thickness;
    let phi = if style.is_display() {
        params.x_height
    } else {
        theta
    };
    let line_clearance = theta + phi / 4.0;
    let k = style.scale();

    let surd_height = inner.height + line_clearance + theta;
    let surd = MathBox::glyph('√', symbol::SURD_WIDTH * k, surd_height, inner.depth)
        .with_class(BoxClass::SURD);

    let mut radical = MathBox::empty();
    let mut x = 0.0;
    if let Some(index) = index {
        let index = layout_list(index, Style::SCRIPTSCRIPT, false);
        let lead = 5.0 * style.mu();
        let raise = 0.6 * (surd_height - inner.depth);
        let index_width = index.width;
        radical.place(lead, raise, index);
        x = (lead + index_width - 10.0 * style.mu()).max(0.0);
    }
    radical.place(x, 0.0, surd);
    x += symbol::SURD_WIDTH * k;
    let inner_width = inner.width;
    radical.place(
        x,
        inner.height + line_clearance,
        MathBox::rule(inner_width, theta).with_class(BoxClass::OVERLINE),
    );
    radical.place(x, 0.0, inner);
    radical.width = x + inner_width;
    radical
}

/// TeXbook rule 12.
fn layout_accent(atom: &Atom, body: &[Atom], style: Style) -> MathBox {
    let base = layout_list(body, style.cramp(), false);
    let params = FontParams::for_style(style);
    let mark = symbol::ACCENT.scaled(style.scale());
    let clearance = base.height.min(params.x_height);
    let shift = base.height - clearance;

    let base_width = base.width;
    let mut accent = MathBox::empty();
    accent.place(0.0, 0.0, base);
    accent.place(
        (base_width - mark.width) / 2.0,
        shift,
        glyph_with(atom.glyph().unwrap_or('ˆ'), mark).with_class(BoxClass::ACCENT),
    );
    accent.width = base_width.max(mark.width);
    accent
}

fn fences(env: Option<&str>) -> (Option<char>, Option<char>) {
    match env {
        Some("pmatrix") => (Some('('), Some(')')),
        Some("bmatrix") => (Some('['), Some(']')),
        Some("Bmatrix") => (Some('{'), Some('}')),
        Some("vmatrix") => (Some('|'), Some('|')),
        Some("Vmatrix") => (Some('‖'), Some('‖')),
        Some("cases") => (Some('{'), None),
        _ => (None, None),
    }
}

/// Cells are centred in their columns (left-aligned for `cases`), rows are stacked with a
/// strut and the whole grid is centred on the math axis.
fn layout_array(atom: &Atom, style: Style) -> MathBox {
    let cell_style = style.text();
    let k = style.scale();
    let rows: &[Atom] = atom.children().unwrap_or_default();

    let cells: Vec<Vec<MathBox>> = rows
        .iter()
        .map(|row| {
            row.children()
                .unwrap_or_default()
                .iter()
                .map(|cell| {
                    layout_list(
                        cell.children().unwrap_or_default(),
                        cell_style,
                        cell.flags.contains(AtomFlags::CARET_INSIDE),
                    )
                    .with_atom(cell.id())
                    .with_class(decorations(cell.flags))
                })
                .collect()
        })
        .collect();

    let columns = cells.iter().map(Vec::len).max().unwrap_or(0);
    let mut col_widths = vec![0.0f64; columns];
    for row in &cells {
        for (width, cell) in col_widths.iter_mut().zip(row) {
            *width = width.max(cell.width);
        }
    }
    let col_gap = k;
    let content_width =
        col_widths.iter().sum::<f64>() + col_gap * columns.saturating_sub(1) as f64;

    let (strut_height, strut_depth) = (0.84 * k, 0.36 * k);
    let row_metrics: Vec<(f64, f64)> = cells
        .iter()
        .map(|row| {
            row.iter().fold((strut_height, strut_depth), |(h, d), cell| {
                (h.max(cell.height), d.max(cell.depth))
            })
        })
        .collect();
    let total: f64 = row_metrics.iter().map(|(h, d)| h + d).sum();
    let offset = total / 2.0 + FontParams::for_style(style).axis_height;

    let left_align = atom.value() == Some("cases");
    let mut grid = MathBox::empty();
    let mut pos = 0.0;
    for ((row_atom, row), (height, depth)) in rows.iter().zip(cells).zip(row_metrics) {
        pos += height;
        let mut row_box = MathBox::empty();
        let mut x = 0.0;
        for (cell, width) in row.into_iter().zip(&col_widths) {
            let cell_x = if left_align {
                x
            } else {
                x + (width - cell.width) / 2.0
            };
            row_box.place(cell_x, 0.0, cell);
            x += width + col_gap;
        }
        row_box.width = content_width;
        row_box.height = row_box.height.max(height);
        row_box.depth = row_box.depth.max(depth);
        grid.place(0.0, offset - pos, row_box.with_atom(row_atom.id()));
        pos += depth;
    }
    grid.width = content_width;
    grid = grid.with_class(BoxClass::ARRAY);

    let (open, close) = fences(atom.value());
    if open.is_none() && close.is_none() {
        return grid;
    }
    let delimiter = |ch: char| {
        let width = symbol::metrics(ch).width * k;
        MathBox::glyph(ch, width, grid.height, grid.depth).with_class(BoxClass::DELIMITER)
    };
    let mut parts = Vec::with_capacity(5);
    if let Some(ch) = open {
        parts.push(delimiter(ch));
        parts.push(MathBox::kern(0.2 * k));
    }
    let closing = close.map(delimiter);
    parts.push(grid);
    if let Some(closing) = closing {
        parts.push(MathBox::kern(0.2 * k));
        parts.push(closing);
    }
    MathBox::hlist(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Relation;

    fn ord(ch: char) -> Atom {
        Atom::char(AtomKind::Ord, ch)
    }

    fn with_sup(mut base: Atom, sup: Vec<Atom>) -> Atom {
        base.set_branch(Relation::Superscript, sup);
        base
    }

    #[test]
    fn superscript_is_at_least_as_tall_as_base() {
        for style in [Style::DISPLAY, Style::TEXT, Style::SCRIPT] {
            let plain = layout(&Atom::root(vec![ord('x')]), style);
            let raised = layout(&Atom::root(vec![with_sup(ord('x'), vec![ord('2')])]), style);
            assert!(raised.height >= plain.height);
            assert!(raised.width > plain.width);
        }
    }

    #[test]
    fn superscript_is_smaller() {
        let x = with_sup(ord('x'), vec![ord('x')]);
        let b = layout(&x, Style::TEXT);
        let sup = b.find_class(BoxClass::SUPERSCRIPT).unwrap();
        assert!(sup.width < b.children[0].node.width);
    }

    #[test]
    fn both_scripts_keep_their_distance() {
        let mut x = with_sup(ord('x'), vec![ord('2')]);
        x.set_branch(Relation::Subscript, vec![ord('i')]);
        let b = layout(&x, Style::TEXT);
        let params = FontParams::for_style(Style::TEXT);
        let sup = &b.children[1];
        let sub = &b.children[2];
        let gap = (sup.shift - sup.node.depth) - (sub.node.height + sub.shift);
        assert!(gap >= 4.0 * params.default_rule_thickness - 1e-9);
    }

    #[test]
    fn fraction_clears_its_rule() {
        for style in [Style::DISPLAY, Style::TEXT, Style::SCRIPT, Style::SCRIPTSCRIPT] {
            let frac = Atom::fraction(r"\frac", vec![ord('1')], vec![ord('y')]);
            let b = layout(&frac, style);
            let num = b.find_class(BoxClass::NUMERATOR).unwrap();
            let den = b.find_class(BoxClass::DENOMINATOR).unwrap();
            let rule = FontParams::for_style(style).default_rule_thickness;
            assert!(b.total_height() >= num.height + den.depth + rule);
        }
    }

    #[test]
    fn display_fraction_is_taller_than_inline() {
        let frac = Atom::fraction(r"\frac", vec![ord('1')], vec![ord('2')]);
        let display = layout(&frac, Style::DISPLAY);
        let inline = layout(&frac, Style::TEXT);
        assert!(display.total_height() > inline.total_height());
        let forced = layout(
            &Atom::fraction(r"\dfrac", vec![ord('1')], vec![ord('2')]),
            Style::TEXT,
        );
        assert_eq!(forced.total_height(), display.total_height());
    }

    #[test]
    fn radical_covers_radicand() {
        let radical = Atom::radical(vec![ord('x')], None);
        let b = layout(&radical, Style::TEXT);
        let x = symbol::metrics('x');
        assert!(b.height > x.height);
        assert!(b.width > x.width);
        assert!(b.find_class(BoxClass::SURD).is_some());
        assert!(b.find_class(BoxClass::OVERLINE).is_some());
    }

    #[test]
    fn radical_index_widens() {
        let plain = layout(&Atom::radical(vec![ord('x')], None), Style::TEXT);
        let indexed = layout(&Atom::radical(vec![ord('x')], Some(vec![ord('3')])), Style::TEXT);
        assert!(indexed.width >= plain.width);
        assert!(indexed.height >= plain.height);
    }

    #[test]
    fn accent_sits_above_short_body() {
        let hat = Atom::wrapper(AtomKind::Accent, Some(r"\hat"), vec![ord('x')]).with_glyph(Some('ˆ'));
        let b = layout(&hat, Style::TEXT);
        assert!(b.height >= symbol::ACCENT.height);
        assert!(b.find_class(BoxClass::ACCENT).is_some());
    }

    #[test]
    fn binary_spacing_only_between_operands() {
        let plus = Atom::char(AtomKind::Bin, '+');
        let spaced = layout(&Atom::root(vec![ord('x'), plus.clone(), ord('y')]), Style::TEXT);
        let unary = layout(&Atom::root(vec![plus, ord('y')]), Style::TEXT);
        assert_eq!(spaced.children.len(), 5);
        assert_eq!(unary.children.len(), 2);
    }

    #[test]
    fn every_atom_has_a_box() {
        let root = Atom::root(vec![
            with_sup(ord('x'), vec![ord('2')]),
            Atom::char(AtomKind::Bin, '+'),
            Atom::fraction(r"\frac", vec![ord('1')], vec![Atom::radical(vec![ord('y')], None)]),
        ]);
        let b = layout(&root, Style::DISPLAY);
        root.walk(&mut |atom| {
            assert!(b.find_atom(atom.id()).is_some(), "{:?}", atom.kind());
        });
    }

    #[test]
    fn caret_and_selection_marks() {
        let mut x = ord('x');
        x.flags = AtomFlags::CARET_AFTER | AtomFlags::SELECTED;
        let id = x.id();
        let b = layout(&Atom::root(vec![x]), Style::TEXT);
        assert!(b.find_class(BoxClass::CARET).is_some());
        assert!(b.find_atom(id).unwrap().classes.contains(BoxClass::SELECTED));

        let mut empty = Atom::root(Vec::new());
        empty.flags = AtomFlags::CARET_INSIDE;
        let b = layout(&empty, Style::TEXT);
        assert_eq!(b.children.len(), 1);
        assert_eq!(b.children[0].node.content, BoxContent::Caret);
    }

    #[test]
    fn array_columns_align() {
        let cell = |atoms: Vec<Atom>| Atom::wrapper(AtomKind::ArrayCell, None, atoms);
        let row = |cells: Vec<Atom>| Atom::wrapper(AtomKind::ArrayRow, None, cells);
        let matrix = Atom::wrapper(
            AtomKind::Array,
            None,
            vec![
                row(vec![cell(vec![ord('a')]), cell(vec![ord('b'), ord('b')])]),
                row(vec![cell(vec![ord('c')]), cell(vec![ord('d')])]),
            ],
        )
        .with_value("pmatrix");
        let b = layout(&matrix, Style::TEXT);
        assert!(b.find_class(BoxClass::DELIMITER).is_some());
        let grid = b.find_class(BoxClass::ARRAY).unwrap();
        assert_eq!(grid.children.len(), 2);
        // Two rows are taller than one.
        assert!(grid.total_height() > 2.0 * 0.84);
        let first = &grid.children[0].node;
        let second = &grid.children[1].node;
        assert_eq!(first.width, second.width);
    }
}
