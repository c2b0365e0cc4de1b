use std::fmt;

use bitflags::bitflags;

use crate::atom::AtomId;

bitflags! {
    /// Presentation classes of a box, consumed by whatever draws the box tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BoxClass: u32 {
        const CARET = 1;
        const SELECTED = 1 << 1;
        const ERROR = 1 << 2;
        const SUGGESTION = 1 << 3;
        const PLACEHOLDER = 1 << 4;
        const COMMAND = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
        const SUBSCRIPT = 1 << 7;
        const NUMERATOR = 1 << 8;
        const DENOMINATOR = 1 << 9;
        const FRACTION_RULE = 1 << 10;
        const SURD = 1 << 11;
        const OVERLINE = 1 << 12;
        const ACCENT = 1 << 13;
        const DELIMITER = 1 << 14;
        const LARGE_OP = 1 << 15;
        const UPRIGHT = 1 << 16;
        const BOLD = 1 << 17;
        const BLACKBOARD = 1 << 18;
        const CALLIGRAPHIC = 1 << 19;
        const FRAKTUR = 1 << 20;
        const SANS_SERIF = 1 << 21;
        const MONOSPACE = 1 << 22;
        const TEXT = 1 << 23;
        const ARRAY = 1 << 24;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxContent {
    /// A horizontal list of positioned children.
    HList,
    Glyph(char),
    /// A filled rectangle, e.g. a fraction bar.
    Rule,
    /// Empty horizontal space.
    Kern,
    /// The zero-width insertion point.
    Caret,
}

/// A positioned, sized rectangle of the layout tree.
///
/// All dimensions are in ems of the base font size. `height` extends above the baseline and
/// `depth` below it.
#[derive(Debug, Clone, PartialEq)]
pub struct MathBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub content: BoxContent,
    pub children: Vec<Child>,
    pub classes: BoxClass,
    pub atom: Option<AtomId>,
}

/// A child box placed relative to its parent's left edge and baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub x: f64,
    /// Vertical raise; positive is up.
    pub shift: f64,
    pub node: MathBox,
}

impl MathBox {
    fn leaf(content: BoxContent, width: f64, height: f64, depth: f64) -> Self {
        MathBox {
            width,
            height,
            depth,
            content,
            children: Vec::new(),
            classes: BoxClass::empty(),
            atom: None,
        }
    }

    pub fn glyph(ch: char, width: f64, height: f64, depth: f64) -> Self {
        MathBox::leaf(BoxContent::Glyph(ch), width, height, depth)
    }

    pub fn kern(width: f64) -> Self {
        MathBox::leaf(BoxContent::Kern, width, 0.0, 0.0)
    }

    /// A rule of the given width, `thickness` tall, sitting on the baseline.
    pub fn rule(width: f64, thickness: f64) -> Self {
        MathBox::leaf(BoxContent::Rule, width, thickness, 0.0)
    }

    pub fn caret(height: f64, depth: f64) -> Self {
        let mut caret = MathBox::leaf(BoxContent::Caret, 0.0, height, depth);
        caret.classes = BoxClass::CARET;
        caret
    }

    /// An empty list, to be filled with [`MathBox::place`].
    pub fn empty() -> Self {
        MathBox::leaf(BoxContent::HList, 0.0, 0.0, 0.0)
    }

    /// Lays out `boxes` left to right on a common baseline.
    pub fn hlist(boxes: Vec<MathBox>) -> Self {
        let mut list = MathBox::empty();
        let mut x = 0.0;
        for node in boxes {
            let advance = node.width;
            list.place(x, 0.0, node);
            x += advance;
        }
        list.width = x;
        list
    }

    /// Adds a child and grows the height and depth to cover it.
    ///
    /// The width is left alone; callers set it once all children are placed.
    pub fn place(&mut self, x: f64, shift: f64, node: MathBox) {
        self.height = self.height.max(node.height + shift);
        self.depth = self.depth.max(node.depth - shift);
        self.children.push(Child { x, shift, node });
    }

    #[must_use]
    pub fn with_atom(mut self, id: AtomId) -> Self {
        self.atom = Some(id);
        self
    }

    #[must_use]
    pub fn with_class(mut self, classes: BoxClass) -> Self {
        self.classes |= classes;
        self
    }

    /// Total vertical extent.
    #[inline]
    pub fn total_height(&self) -> f64 {
        self.height + self.depth
    }

    /// Depth-first search for the outermost box produced for `id`.
    pub fn find_atom(&self, id: AtomId) -> Option<&MathBox> {
        if self.atom == Some(id) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.node.find_atom(id))
    }

    /// Depth-first search for the first box carrying all of `classes`.
    pub fn find_class(&self, classes: BoxClass) -> Option<&MathBox> {
        if self.classes.contains(classes) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.node.find_class(classes))
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize, x: f64, shift: f64) -> fmt::Result {
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        if depth > 0 {
            write!(f, "@({x:.3}, {shift:+.3}) ")?;
        }
        match self.content {
            BoxContent::HList => f.write_str("hlist")?,
            BoxContent::Glyph(ch) => write!(f, "glyph {ch:?}")?,
            BoxContent::Rule => f.write_str("rule")?,
            BoxContent::Kern => f.write_str("kern")?,
            BoxContent::Caret => f.write_str("caret")?,
        }
        write!(
            f,
            " w={:.3} h={:.3} d={:.3}",
            self.width, self.height, self.depth
        )?;
        if let Some(id) = self.atom {
            write!(f, " #{}", id.get())?;
        }
        if !self.classes.is_empty() {
            f.write_str(" [")?;
            let mut first = true;
            for (name, _) in self.classes.iter_names() {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                f.write_str(&name.to_ascii_lowercase())?;
            }
            f.write_str("]")?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.node.write_tree(f, depth + 1, child.x, child.shift)?;
        }
        Ok(())
    }
}

/// Prints the box tree one box per line, children indented below their parent.
impl fmt::Display for MathBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0, 0.0, 0.0)
    }
}
