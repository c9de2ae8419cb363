//! Tokenizer for ffisig signature descriptions.
//!
//! The input is a small JSON document. Rather than building a syntax tree,
//! the tokenizer produces a flat array of [`Token`]s in document order where
//! every container records how many immediate children it has. Consumers
//! walk the array with a cursor and use those counts to know where each
//! value ends.

pub mod error;
pub mod lexer;
pub mod tokenizer;

pub use error::TokenizeError;
pub use tokenizer::{tokenize_to_vec, Token, TokenKind, Tokenizer};
