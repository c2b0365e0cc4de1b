//! Inline shortcuts and key bindings.

use phf::phf_map;
use rustc_hash::FxHashMap;

use crate::command::Command;
use crate::commands::Suggestion;
use crate::editor::{Direction, EditMode, InsertOptions, SelectionMode};

/// Typed text that is replaced by LaTeX as soon as it is complete.
static INLINE_SHORTCUTS: phf::Map<&'static str, &'static str> = phf_map! {
    "alpha" => r"\alpha",
    "beta" => r"\beta",
    "gamma" => r"\gamma",
    "Gamma" => r"\Gamma",
    "delta" => r"\delta",
    "Delta" => r"\Delta",
    "epsilon" => r"\epsilon",
    "theta" => r"\theta",
    "lambda" => r"\lambda",
    "mu" => r"\mu",
    "pi" => r"\pi",
    "Pi" => r"\Pi",
    "sigma" => r"\sigma",
    "Sigma" => r"\Sigma",
    "phi" => r"\phi",
    "omega" => r"\omega",
    "Omega" => r"\Omega",
    "oo" => r"\infty",
    "<=" => r"\le",
    ">=" => r"\ge",
    "!=" => r"\ne",
    "->" => r"\to",
    "<-" => r"\leftarrow",
    "=>" => r"\Rightarrow",
    "<=>" => r"\Leftrightarrow",
    "+-" => r"\pm",
    "-+" => r"\mp",
    "xx" => r"\times",
    "..." => r"\ldots",
    "sin" => r"\sin",
    "cos" => r"\cos",
    "tan" => r"\tan",
    "log" => r"\log",
    "ln" => r"\ln",
    "exp" => r"\exp",
    "lim" => r"\lim",
    "sum" => r"\sum",
    "prod" => r"\prod",
    "int" => r"\int",
    "sqrt" => r"\sqrt{#?}",
    "AA" => r"\forall",
    "EE" => r"\exists",
    "RR" => r"\mathbb{R}",
    "NN" => r"\mathbb{N}",
    "ZZ" => r"\mathbb{Z}",
    "QQ" => r"\mathbb{Q}",
    "CC" => r"\mathbb{C}",
};

static MATH_KEYSTROKES: phf::Map<&'static str, Command<'static>> = phf_map! {
    "ArrowRight" => Command::MoveToNextChar,
    "ArrowLeft" => Command::MoveToPreviousChar,
    "ArrowUp" => Command::MoveUp,
    "ArrowDown" => Command::MoveDown,
    "Shift-ArrowRight" => Command::ExtendToNextChar,
    "Shift-ArrowLeft" => Command::ExtendToPreviousChar,
    "Ctrl-ArrowRight" => Command::MoveToGroupEnd,
    "Ctrl-ArrowLeft" => Command::MoveToGroupStart,
    "Ctrl-ArrowUp" => Command::MoveToSuperscript,
    "Ctrl-ArrowDown" => Command::MoveToSubscript,
    "Tab" => Command::MoveToNextPlaceholder,
    "Shift-Tab" => Command::MoveToPreviousPlaceholder,
    "Home" => Command::MoveToMathfieldStart,
    "End" => Command::MoveToMathfieldEnd,
    "Ctrl-a" => Command::SelectAll,
    "Ctrl-Shift-a" => Command::SelectGroup,
    "Ctrl-z" => Command::Undo,
    "Ctrl-y" => Command::Redo,
    "Ctrl-Shift-z" => Command::Redo,
    "Backspace" => Command::Delete { direction: Direction::Backward, count: 1 },
    "Delete" => Command::Delete { direction: Direction::Forward, count: 1 },
    "Alt-6" => Command::PromoteToSuperscript,
    "Alt--" => Command::PromoteToSubscript,
    "Ctrl-/" => Command::Insert {
        text: r"\frac{#@}{#?}",
        options: InsertOptions::latex(SelectionMode::Placeholder),
    },
    "Alt-b" => Command::Insert {
        text: r"\mathbb{#@}",
        options: InsertOptions::latex(SelectionMode::Placeholder),
    },
};

static COMMAND_KEYSTROKES: phf::Map<&'static str, Command<'static>> = phf_map! {
    "ArrowRight" => Command::AcceptSuggestion,
    "Tab" => Command::CompleteCommand,
    "Enter" => Command::CompleteCommand,
    "Space" => Command::CompleteCommand,
    "Escape" => Command::ExitCommandMode,
    "Backspace" => Command::Delete { direction: Direction::Backward, count: 1 },
};

/// The inline shortcuts in effect: the configured ones, possibly followed by the built-in ones.
#[derive(Debug, Default)]
pub struct ShortcutTable {
    custom: FxHashMap<String, String>,
    override_default: bool,
}

impl ShortcutTable {
    pub fn new(custom: &[(String, String)], override_default: bool) -> Self {
        ShortcutTable {
            custom: custom.iter().cloned().collect(),
            override_default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutMatch<'table> {
    /// The typed text that triggered the shortcut.
    pub trigger: &'table str,
    /// The LaTeX replacing it.
    pub substitute: &'table str,
}

/// Finds the longest shortcut trigger `text` ends with.
///
/// Configured shortcuts are tried first. The built-in ones are only consulted when no configured
/// one matches and they are not overridden.
pub fn match_end_of<'table>(
    text: &str,
    table: &'table ShortcutTable,
) -> Option<ShortcutMatch<'table>> {
    let custom = table
        .custom
        .iter()
        .filter(|(trigger, _)| !trigger.is_empty() && text.ends_with(trigger.as_str()))
        .max_by_key(|(trigger, _)| trigger.len())
        .map(|(trigger, substitute)| ShortcutMatch {
            trigger: trigger.as_str(),
            substitute: substitute.as_str(),
        });
    if custom.is_some() || table.override_default {
        return custom;
    }
    INLINE_SHORTCUTS
        .entries()
        .filter(|(trigger, _)| text.ends_with(**trigger))
        .max_by_key(|(trigger, _)| trigger.len())
        .map(|(trigger, substitute)| ShortcutMatch {
            trigger,
            substitute,
        })
}

/// Candidates for completing a command name.
#[inline]
pub fn suggest(prefix: &str) -> Vec<Suggestion> {
    crate::commands::suggest(prefix)
}

/// The command bound to a key in the given mode.
///
/// Keys are written like `"Shift-ArrowRight"` or `"Ctrl-z"`, modifiers first.
pub fn match_keystroke(mode: EditMode, keystroke: &str) -> Option<Command<'static>> {
    let table = match mode {
        EditMode::Math => &MATH_KEYSTROKES,
        EditMode::Command => &COMMAND_KEYSTROKES,
    };
    table.get(keystroke).cloned()
}
