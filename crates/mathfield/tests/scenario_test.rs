use insta::assert_snapshot;
use mathfield::command::Command;
use mathfield::editor::{Direction, InsertOptions, SelectionMode};
use mathfield::{
    Atom, AtomFlags, AtomKind, Mathfield, MathfieldConfig, Relation, Style, layout, parse_latex,
    to_latex,
};

fn field() -> Mathfield {
    Mathfield::new(MathfieldConfig::default()).unwrap()
}

#[test]
fn superscript_then_sum() {
    let parsed = parse_latex("x^2+1");
    assert!(parsed.diagnostics.is_empty());
    let atoms = &parsed.atoms;
    assert_eq!(atoms.len(), 3);
    assert_eq!(atoms[0].value(), Some("x"));
    let sup = atoms[0].superscript().unwrap();
    assert_eq!(sup.len(), 1);
    assert_eq!(sup[0].value(), Some("2"));
    assert_eq!(atoms[1].kind(), AtomKind::Bin);
    assert_eq!(atoms[2].value(), Some("1"));
    assert_snapshot!(to_latex(atoms), @"x^{2}+1");
}

#[test]
fn fraction_into_empty_document() {
    let mut field = field();
    field
        .perform(Command::Insert {
            text: r"\frac{1}{2}",
            options: InsertOptions::latex(SelectionMode::After),
        })
        .unwrap();
    let atoms = field.editor().atoms();
    assert_eq!(atoms.len(), 1);
    assert_eq!(atoms[0].kind(), AtomKind::Fraction);
    let numer = atoms[0].branch(Relation::Numerator).unwrap();
    let denom = atoms[0].branch(Relation::Denominator).unwrap();
    assert_eq!(numer[0].value(), Some("1"));
    assert_eq!(denom[0].value(), Some("2"));

    let one = layout(&Atom::root(parse_latex("1").atoms), Style::DISPLAY);
    let boxes = field.layout(Style::DISPLAY);
    assert!(boxes.height > one.height);
    assert!(boxes.depth > one.depth);
}

#[test]
fn pi_shortcut_with_undo() {
    let mut field = field();
    field.type_char('p').unwrap();
    field.type_char('i').unwrap();
    let atoms = field.editor().atoms();
    assert_eq!(atoms.len(), 1);
    assert_eq!(atoms[0].value(), Some(r"\pi"));
    assert_snapshot!(field.latex(), @r"\pi");

    field.perform(Command::Undo).unwrap();
    assert_snapshot!(field.latex(), @"pi");
    assert_eq!(field.editor().atoms().len(), 2);
}

#[test]
fn blackboard_wraps_selected_atom() {
    let mut field = field();
    field.type_char('A').unwrap();
    field.perform(Command::SelectAll).unwrap();
    let blackboard = Command::from_selector("blackboard", &[]).unwrap();
    field.perform(blackboard).unwrap();
    assert_snapshot!(field.latex(), @r"\mathbb{A}");

    // With nothing selected, the atom before the caret is taken.
    let mut field = self::field();
    field.type_str("x+B").unwrap();
    field
        .perform(Command::from_selector("blackboard", &[]).unwrap())
        .unwrap();
    assert_snapshot!(field.latex(), @r"x+\mathbb{B}");

    // In item mode the new atom ends up selected.
    let mut field = self::field();
    field.type_char('C').unwrap();
    field.perform(Command::SelectAll).unwrap();
    field
        .perform(Command::Insert {
            text: r"\mathbb{#@}",
            options: InsertOptions::latex(SelectionMode::Item),
        })
        .unwrap();
    assert!(!field.editor().is_collapsed());
    let id = field.editor().atoms()[0].id();
    assert!(field.editor().contains(id));
}

#[test]
fn emptied_numerator_gets_placeholder() {
    let mut field = field();
    field.set_latex(r"\frac{a}{b}");
    field
        .perform(Command::SetRange {
            anchor: "body:0/numerator:0".parse().unwrap(),
            focus: "body:0/numerator:0".parse().unwrap(),
        })
        .unwrap();
    field
        .perform(Command::Delete {
            direction: Direction::Backward,
            count: 1,
        })
        .unwrap();
    let fraction = &field.editor().atoms()[0];
    let numer = fraction.branch(Relation::Numerator).unwrap();
    assert_eq!(numer.len(), 1);
    assert!(numer[0].is_placeholder());
    assert!(fraction.is_well_formed());
    assert_snapshot!(field.latex(), @r"\frac{\placeholder{}}{b}");
    assert_eq!(field.editor().caret().to_string(), "body:0/numerator:-1");
}

#[test]
fn words_inside_text_stay_literal() {
    let mut field = field();
    field.set_latex(r"\text{a}");
    field.perform(Command::MoveToPreviousChar).unwrap();
    field.type_str("pi sin").unwrap();
    assert_snapshot!(field.latex(), @r"\text{api sin}");
    let text = &field.editor().atoms()[0];
    let mut kinds = Vec::new();
    text.walk(&mut |atom| kinds.push((atom.kind(), atom.flags.contains(AtomFlags::ERROR))));
    assert!(kinds.iter().all(|&(kind, error)| kind != AtomKind::UnknownCommand && !error));

    // Leaving the text brings the shortcuts back.
    field.perform(Command::MoveToNextChar).unwrap();
    field.type_str("pi").unwrap();
    assert_snapshot!(field.latex(), @r"\text{api sin}\pi");
}

#[test]
fn backspace_into_a_radical_keeps_its_index() {
    let mut field = field();
    field.set_latex(r"\sqrt[3]{x}");
    field
        .perform(Command::SetRange {
            anchor: "body:0/radicand:-1".parse().unwrap(),
            focus: "body:0/radicand:-1".parse().unwrap(),
        })
        .unwrap();
    field
        .perform(Command::Delete {
            direction: Direction::Backward,
            count: 1,
        })
        .unwrap();
    assert_snapshot!(field.latex(), @"3x");
    assert_eq!(field.editor().caret().to_string(), "body:0");
}

#[test]
fn typed_spaces_do_not_become_atoms() {
    let mut field = field();
    field.type_str("a b").unwrap();
    field
        .perform(Command::Insert {
            text: " ",
            options: InsertOptions::default(),
        })
        .unwrap();
    assert_snapshot!(field.latex(), @"ab");
    assert_eq!(field.editor().atoms().len(), 2);
    assert_eq!(parse_latex(&field.latex()).atoms.as_slice(), field.editor().atoms());
}
