pub mod token;
pub mod lexer;

pub use token::*;
pub use lexer::*;
