use miette::Diagnostic;
use ffisig_types::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What the assembler does with top-level keys it does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownKeyPolicy {
    /// Skip the key together with its whole value.
    #[default]
    Skip,
    /// Fail with `CifError::UnknownKey`.
    Reject,
}

/// What the assembler does when `"argument types"` or `"return type"` is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MissingKeyPolicy {
    /// Fail with `CifError::MissingRequiredKey` before calling the backend.
    #[default]
    Reject,
    /// Hand zero arguments and/or no return type to the backend and let it decide.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildOptions {
    /// Number of token slots tried first. The buffer doubles until the
    /// whole input fits.
    #[serde(default = "default_initial_token_capacity")]
    pub initial_token_capacity: usize,

    #[serde(default)]
    pub unknown_keys: UnknownKeyPolicy,

    #[serde(default)]
    pub missing_keys: MissingKeyPolicy,

    /// Deepest aggregate nesting accepted in any one type.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            initial_token_capacity: default_initial_token_capacity(),
            unknown_keys: UnknownKeyPolicy::default(),
            missing_keys: MissingKeyPolicy::default(),
            max_depth: default_max_depth(),
        }
    }
}

pub fn default_initial_token_capacity() -> usize {
    64
}

pub fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Upper bound for `max-depth`. Parsing and releasing recurse once per
/// level, so the limit has to stay well inside a thread's stack.
pub const MAX_DEPTH_CEILING: usize = 1024;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Error reading build options from {path}: {source}")]
    #[diagnostic(code("CONFIG-001"), help("Check that the file exists and is readable"))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid build options: {0}")]
    #[diagnostic(code("CONFIG-002"), help("Check the TOML syntax and the option names"))]
    Parse(#[from] toml::de::Error),

    #[error("Invalid build options: {0}")]
    #[diagnostic(code("CONFIG-003"))]
    Invalid(String),
}

impl BuildOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: BuildOptions = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loading build options from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_token_capacity == 0 {
            return Err(ConfigError::Invalid(
                "initial-token-capacity must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_DEPTH_CEILING).contains(&self.max_depth) {
            return Err(ConfigError::Invalid(format!(
                "max-depth must be between 1 and {}",
                MAX_DEPTH_CEILING
            )));
        }
        Ok(())
    }
}
