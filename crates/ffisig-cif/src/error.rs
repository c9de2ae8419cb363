use crate::backend::BackendError;
use crate::config::ConfigError;
use ffisig_syntax::TokenizeError;
use ffisig_types::ParseError;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

pub type CifResult<T> = Result<T, CifError>;

/// Everything that can stop a call descriptor from being built. None of
/// these leave anything allocated behind.
#[derive(Debug, Error, Diagnostic)]
pub enum CifError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("Unknown type name '{name}'")]
    #[diagnostic(
        code("CIF-001"),
        help("expected one of: void, ptr, uchar, char, ushort, short, uint, int, ulong, long, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, f128")
    )]
    UnknownTypeName {
        name: String,
        #[label("not a primitive type")]
        span: SourceSpan,
    },

    #[error("Unexpected token: found {found}")]
    #[diagnostic(code("CIF-002"))]
    UnexpectedToken {
        found: String,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("Type nested more than {limit} levels deep")]
    #[diagnostic(
        code("CIF-007"),
        help("raise max-depth in the build options if this nesting is intended")
    )]
    TooDeep {
        limit: usize,
        #[label("nesting limit reached here")]
        span: SourceSpan,
    },

    #[error("Duplicate or malformed key \"{key}\": {reason}")]
    #[diagnostic(code("CIF-003"))]
    DuplicateOrMalformedKey {
        key: String,
        reason: String,
        #[label("this key")]
        span: SourceSpan,
    },

    #[error("Missing required key \"{key}\"")]
    #[diagnostic(
        code("CIF-004"),
        help("a signature needs both \"argument types\" and \"return type\"")
    )]
    MissingRequiredKey { key: &'static str },

    #[error("Unknown key \"{key}\"")]
    #[diagnostic(
        code("CIF-005"),
        help("only \"argument types\" and \"return type\" are accepted with unknown-keys = \"reject\"")
    )]
    UnknownKey {
        key: String,
        #[label("not recognized")]
        span: SourceSpan,
    },

    #[error("Backend preparation failed")]
    #[diagnostic(code("CIF-006"))]
    BackendPrepareFailed(#[source] #[diagnostic_source] BackendError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl From<ParseError> for CifError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownTypeName { name, span } => CifError::UnknownTypeName { name, span },
            ParseError::UnexpectedToken { found, span } => {
                CifError::UnexpectedToken { found, span }
            }
            ParseError::TooDeep { limit, span } => CifError::TooDeep { limit, span },
            ParseError::Tokenize(err) => CifError::Tokenize(err),
        }
    }
}

impl From<BackendError> for CifError {
    fn from(err: BackendError) -> Self {
        CifError::BackendPrepareFailed(err)
    }
}
