use std::path::PathBuf;

use ffisig_cif::{CifError, ConfigError, TokenizeError};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// CLI-specific error type that provides rich diagnostics
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Invalid signature in {path}")]
    #[diagnostic(code(ffisig::cli::signature_error))]
    Signature {
        path: PathBuf,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
        #[source]
        #[diagnostic_source]
        source: CifError,
    },

    #[error("Failed to read file {path}")]
    #[diagnostic(code(ffisig::cli::io_error))]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Helper struct to provide context for error conversion
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub path: &'a std::path::Path,
    pub source: &'a str,
}

/// Attach the signature text to a build error so its span can be shown.
pub fn convert_cif_error(error: CifError, ctx: ErrorContext) -> CliError {
    let span = match &error {
        CifError::Tokenize(TokenizeError::Invalid { span, .. })
        | CifError::Tokenize(TokenizeError::Partial { span, .. })
        | CifError::UnknownTypeName { span, .. }
        | CifError::TooDeep { span, .. }
        | CifError::DuplicateOrMalformedKey { span, .. }
        | CifError::UnknownKey { span, .. } => Some(*span),
        CifError::UnexpectedToken { span, .. } => *span,
        _ => None,
    };

    CliError::Signature {
        path: ctx.path.to_path_buf(),
        src: NamedSource::new(ctx.path.display().to_string(), ctx.source.to_string()),
        span,
        message: error.to_string(),
        source: error,
    }
}

pub fn convert_io_error(error: std::io::Error, path: PathBuf) -> CliError {
    CliError::IoError { path, source: error }
}
