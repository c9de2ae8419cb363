use thiserror::Error;
use miette::{Diagnostic, SourceSpan};

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum TokenizeError {
    /// The token buffer is full. Not fatal: grow the buffer (keeping the
    /// tokens already written) and call the same tokenizer again.
    #[error("Token buffer exhausted after {written} token(s)")]
    #[diagnostic(code(ffisig_syntax::insufficient_capacity))]
    InsufficientCapacity { written: usize },

    #[error("Invalid input: {message}")]
    #[diagnostic(code(ffisig_syntax::invalid))]
    Invalid {
        message: String,
        #[label("error occurred here")]
        span: SourceSpan,
    },

    #[error("Unexpected end of input: {message}")]
    #[diagnostic(
        code(ffisig_syntax::partial),
        help("every '{{' and '[' needs a matching '}}' or ']'")
    )]
    Partial {
        message: String,
        #[label("opened here")]
        span: SourceSpan,
    },
}

impl TokenizeError {
    pub fn is_insufficient_capacity(&self) -> bool {
        matches!(self, Self::InsufficientCapacity { .. })
    }
}
