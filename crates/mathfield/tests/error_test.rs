use mathfield::error::{ErrorCategory, LatexErrKind};
use mathfield::{AtomFlags, AtomKind, parse_latex, to_latex};

#[test]
fn problems_are_recovered_from() {
    let problems = [
        ("curly_close_without_open", "}", ErrorCategory::LexError),
        ("unclosed_group", r"\frac{a}{b", ErrorCategory::LexError),
        ("unsupported_command", r"\asdf", ErrorCategory::UnknownCommand),
        ("incomplete_frac", r"\frac{1}", ErrorCategory::InvalidArgumentCount),
        ("incomplete_sqrt", r"\sqrt", ErrorCategory::InvalidArgumentCount),
        ("sup_sup", "x^2^3", ErrorCategory::Structure),
        (
            "unsupported_environment",
            r"\begin{xmatrix}1\end{xmatrix}",
            ErrorCategory::Structure,
        ),
        (
            "mismatched_begin_end",
            r"\begin{matrix}1\end{bmatrix}",
            ErrorCategory::Structure,
        ),
        ("ampersand_outside_array", "x&y", ErrorCategory::LexError),
    ];
    for (name, problem, category) in problems {
        let parsed = parse_latex(problem);
        let Some(error) = parsed.diagnostics.first() else {
            panic!("problem `{name}` did not report an error");
        };
        assert_eq!(error.category(), category, "{name}");
        assert!(error.0.end <= problem.len(), "{name}");

        let report = error.to_report("<input>", false);
        let mut buf = Vec::new();
        report
            .write(("<input>", ariadne::Source::from(problem)), &mut buf)
            .expect("failed to write report");
        let output = String::from_utf8(buf).expect("report should be valid UTF-8");
        assert!(output.contains(&error.error_message()), "{name}: {output}");

        // Whatever was recovered serializes and parses again without new problems of the
        // same kind at the same place.
        let latex = to_latex(&parsed.atoms);
        let again = parse_latex(&latex);
        assert_eq!(to_latex(&again.atoms), latex, "{name}");
    }
}

#[test]
fn unknown_commands_stay_in_the_tree() {
    let parsed = parse_latex(r"a+\asdf{b}");
    assert_eq!(
        parsed.diagnostics[0].kind(),
        &LatexErrKind::UnknownCommand(r"\asdf".into())
    );
    let unknown = &parsed.atoms[2];
    assert_eq!(unknown.kind(), AtomKind::UnknownCommand);
    assert!(unknown.flags.contains(AtomFlags::ERROR));
    assert_eq!(to_latex(&parsed.atoms), r"a+\asdf{b}");
}
