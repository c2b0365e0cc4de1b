use std::{
    io::Read,
    path::{Path, PathBuf},
};

use clap::{Parser, ValueEnum};
use log::warn;

use mathfield::{LatexError, Mathfield, Style, lexer::tokenize};

mod config_file;
mod logger;

use config_file::{ConfigError, load_config};

/// What to print once the formula is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Output {
    /// The normalized LaTeX.
    #[default]
    Latex,
    /// The formula as spoken text.
    Speech,
    /// The laid out box tree.
    Boxes,
    /// The tokens of the normalized LaTeX.
    Tokens,
}

/// Parses, edits and lays out LaTeX math formulas
#[derive(Parser, Debug)]
#[command(version, about = "Parses, edits and lays out LaTeX math formulas", long_about = None)]
struct Args {
    /// Specifies a single LaTeX formula; read from stdin if neither this nor --type is given
    #[arg(short, long, conflicts_with = "keys")]
    formula: Option<String>,

    /// Types the given keys into an empty field. Named keys are written in braces, like
    /// `{ArrowRight}` or `{Ctrl-z}`; `{{` and `}}` type literal braces
    #[arg(short = 't', long = "type", value_name = "KEYS")]
    keys: Option<String>,

    /// What to print
    #[arg(short, long, value_enum, default_value_t)]
    output: Output,

    /// Lays out the formula in display style instead of text style
    #[arg(short, long)]
    display: bool,

    /// Reads inline shortcuts from a TOML file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Logs what the editor does to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// One step of typed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key<'keys> {
    Char(char),
    Named(&'keys str),
}

/// Splits typed input into characters and `{Named}` keys.
fn split_keys(keys: &str) -> Vec<Key<'_>> {
    let mut out = Vec::new();
    let mut chars = keys.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '{' | '}' if chars.peek().is_some_and(|&(_, next)| next == ch) => {
                chars.next();
                out.push(Key::Char(ch));
            }
            '{' => {
                let rest = &keys[i + 1..];
                match rest.find('}') {
                    Some(len) => {
                        out.push(Key::Named(&rest[..len]));
                        while chars.next_if(|&(j, _)| j <= i + len + 1).is_some() {}
                    }
                    None => out.push(Key::Char(ch)),
                }
            }
            _ => out.push(Key::Char(ch)),
        }
    }
    out
}

fn main() {
    let args = Args::parse();
    logger::init(args.verbose);

    let config_path = args.config.as_deref();
    let config = load_config(config_path).unwrap_or_else(|e| exit_config_error(&e, config_path));
    let display = args.display || config.display;
    let mut field = config
        .build_field()
        .unwrap_or_else(|e| exit_config_error(&e, config_path));

    if let Some(ref keys) = args.keys {
        replay(&mut field, keys);
    } else {
        let formula = match args.formula {
            Some(ref formula) => formula.clone(),
            None => read_stdin(),
        };
        let formula = formula.trim_end();
        for diagnostic in field.set_latex(formula) {
            print_report(&diagnostic, formula);
        }
    }

    let style = if display {
        Style::DISPLAY
    } else {
        Style::TEXT
    };
    match args.output {
        Output::Latex => println!("{}", field.latex()),
        Output::Speech => println!("{}", field.speakable_text()),
        Output::Boxes => print!("{}", field.layout(style)),
        Output::Tokens => {
            let latex = field.latex();
            for tok in tokenize(&latex).tokens {
                println!("{}..{} {:?}", tok.span().start(), tok.span().end(), tok.token());
            }
        }
    }
}

/// Types `keys` into `field`. Keys that fail are reported and skipped.
fn replay(field: &mut Mathfield, keys: &str) {
    for key in split_keys(keys) {
        let result = match key {
            Key::Char(ch) => field.type_char(ch),
            Key::Named(name) => match field.keystroke(name) {
                Ok(true) => Ok(()),
                Ok(false) => {
                    warn!("no binding for key {{{name}}}");
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };
        if let Err(e) = result {
            warn!("{key:?}: {e}");
        }
    }
}

fn read_stdin() -> String {
    let mut buffer = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut buffer) {
        exit_io_error(e);
    }
    buffer
}

fn print_report(error: &LatexError, source: &str) {
    let report = error.to_report("<input>", true);
    if report
        .eprint(("<input>", ariadne::Source::from(source)))
        .is_err()
    {
        eprintln!("{error}");
    }
}

fn exit_config_error(e: &ConfigError, path: Option<&Path>) -> ! {
    let name = path.map_or_else(|| "<default>".into(), |path| path.display().to_string());
    eprintln!("Configuration error in '{name}': {e}");
    if let ConfigError::Shortcut {
        substitute, error, ..
    } = e
    {
        print_report(error, substitute);
    }
    std::process::exit(1);
}

fn exit_io_error(e: std::io::Error) -> ! {
    eprintln!("IO Error: {e}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use mathfield::MathfieldConfig;

    use super::*;

    #[test]
    fn keys_and_named_keys() {
        assert_eq!(
            split_keys("x^2{ArrowRight}+1"),
            [
                Key::Char('x'),
                Key::Char('^'),
                Key::Char('2'),
                Key::Named("ArrowRight"),
                Key::Char('+'),
                Key::Char('1'),
            ]
        );
        assert_eq!(
            split_keys("{{a}}{"),
            [Key::Char('{'), Key::Char('a'), Key::Char('}'), Key::Char('{')]
        );
    }

    #[test]
    fn replay_types_into_the_field() {
        let mut field = Mathfield::new(MathfieldConfig::default()).unwrap();
        replay(&mut field, "x^2{ArrowRight}+1{Ctrl-z}{Ctrl-y}");
        assert_eq!(field.latex(), "x^{2}+1");
        assert_eq!(field.speakable_text(), "x squared plus one");
    }

    #[test]
    fn command_line_parses() {
        let args = Args::parse_from(["mathfield", "-f", r"\frac{1}{2}", "-o", "speech", "-d"]);
        assert_eq!(args.formula.as_deref(), Some(r"\frac{1}{2}"));
        assert_eq!(args.output, Output::Speech);
        assert!(args.display);
        assert!(Args::try_parse_from(["mathfield", "-f", "x", "-t", "y"]).is_err());
    }
}
