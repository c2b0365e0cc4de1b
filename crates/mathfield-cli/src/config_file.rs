use std::{fmt, fs, io, path::Path};

use mathfield::{LatexError, Mathfield, MathfieldConfig};
use serde::Deserialize;

/// The contents of a `mathfield.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Lays out in display style, as if `--display` was given.
    pub display: bool,
    #[serde(flatten)]
    pub mathfield: MathfieldConfig,
}

impl Config {
    /// Creates a field using the inline shortcuts of this configuration.
    pub fn build_field(self) -> Result<Mathfield, ConfigError> {
        Mathfield::new(self.mathfield).map_err(|(error, index, substitute)| {
            ConfigError::Shortcut {
                index,
                substitute,
                error,
            }
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    /// An inline shortcut with an unusable trigger, or a substitute that is not valid LaTeX.
    Shortcut {
        index: usize,
        substitute: String,
        error: Box<LatexError>,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "cannot read the file: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid TOML: {err}"),
            ConfigError::Shortcut {
                index, substitute, ..
            } => write!(f, "invalid inline shortcut #{index} ({substitute:?})"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Shortcut { error, .. } => Some(error.as_ref()),
        }
    }
}

/// Reads a configuration file. A missing `path` gives the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}
