use logos::Logos;
use miette::SourceSpan;

/// A lexeme and where it sits in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub kind: LexemeKind,
    pub text: &'a str,
    pub span: SourceSpan,
}

/// Everything the signature grammar can contain at the character level.
#[derive(Debug, Logos, PartialEq, Eq, Clone, Copy)]
pub enum LexemeKind {
    // Punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    // String literal, quotes included. Escapes are validated, not decoded.
    #[regex(r#""([^"\\\x00-\x1F]|\\["\\/bfnrt]|\\u[0-9a-fA-F][0-9a-fA-F][0-9a-fA-F][0-9a-fA-F])*""#)]
    String,

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Whitespace (to be skipped)
    #[regex(r"[ \t\n\r]+", logos::skip)]
    Whitespace,

    // Catch-all for anything unexpected
    #[error]
    Error,
}
