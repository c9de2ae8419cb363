use crate::descriptor::{Aggregate, TypeDescriptor};
use crate::primitive::PrimitiveType;
use crate::release::release_aggregate;
use ffisig_syntax::{tokenize_to_vec, Token, TokenKind, TokenizeError};
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Deepest aggregate nesting accepted unless a parser is told otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown type name '{name}'")]
    #[diagnostic(
        code(ffisig_types::unknown_type_name),
        help("expected one of: void, ptr, uchar, char, ushort, short, uint, int, ulong, long, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64, f128")
    )]
    UnknownTypeName {
        name: String,
        #[label("not a primitive type")]
        span: SourceSpan,
    },

    #[error("Expected a type name or an array of types, found {found}")]
    #[diagnostic(code(ffisig_types::unexpected_token))]
    UnexpectedToken {
        found: String,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("Aggregates nested more than {limit} levels deep")]
    #[diagnostic(code(ffisig_types::too_deep))]
    TooDeep {
        limit: usize,
        #[label("this aggregate is too deep")]
        span: SourceSpan,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tokenize(#[from] TokenizeError),
}

/// Recursive-descent reader of type descriptors over a flat token slice.
///
/// The parser never looks ahead for closing brackets: an array token's
/// `size` says how many values follow it, and each of those values in
/// turn says how many tokens it spans.
pub struct TypeParser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    /// Aggregates currently open.
    depth: usize,
    max_depth: usize,
}

impl<'a> TypeParser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self::at(source, tokens, 0)
    }

    pub fn at(source: &'a str, tokens: &'a [Token], pos: usize) -> Self {
        Self {
            source,
            tokens,
            pos,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Index of the next unread token.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consume and return the current token.
    pub fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Parse one type descriptor starting at the current token.
    pub fn parse_type(&mut self) -> Result<TypeDescriptor, ParseError> {
        let Some(tok) = self.peek() else {
            return Err(ParseError::UnexpectedToken {
                found: "end of input".to_string(),
                span: None,
            });
        };

        match tok.kind {
            TokenKind::String => {
                self.pos += 1;
                let name = tok.text(self.source);
                match PrimitiveType::lookup(name) {
                    Some(primitive) => Ok(TypeDescriptor::Primitive(primitive)),
                    None => Err(ParseError::UnknownTypeName {
                        name: name.to_string(),
                        span: tok.span(),
                    }),
                }
            }

            TokenKind::Array => {
                if self.depth >= self.max_depth {
                    self.skip_value();
                    return Err(ParseError::TooDeep {
                        limit: self.max_depth,
                        span: SourceSpan::new(tok.start.into(), 1),
                    });
                }
                self.pos += 1;
                self.depth += 1;
                let mut aggregate = Box::new(Aggregate::with_capacity(tok.size));
                for _ in 0..tok.size {
                    match self.parse_type() {
                        Ok(child) => aggregate.children.push(child),
                        Err(err) => {
                            self.depth -= 1;
                            let released = release_aggregate(aggregate);
                            log::trace!("discarded partial aggregate ({} node(s))", released);
                            return Err(err);
                        }
                    }
                }
                self.depth -= 1;
                Ok(TypeDescriptor::Aggregate(aggregate))
            }

            kind => {
                let span = tok.span();
                let found = match kind {
                    TokenKind::Object => "an object".to_string(),
                    TokenKind::Primitive => format!("'{}'", tok.text(self.source)),
                    _ => "an empty token".to_string(),
                };
                self.skip_value();
                Err(ParseError::UnexpectedToken { found, span: Some(span) })
            }
        }
    }

    /// Advance past one complete value of any kind, using child counts.
    /// Works at any nesting depth.
    pub fn skip_value(&mut self) {
        let mut pending = 1usize;
        while pending > 0 {
            let Some(tok) = self.next() else {
                return;
            };
            pending = pending - 1 + tok.size;
        }
    }
}

/// Parses the type descriptor at `tokens[*cursor]`, leaving `cursor` just
/// past the tokens it consumed.
pub fn parse_type(
    source: &str,
    tokens: &[Token],
    cursor: &mut usize,
) -> Result<TypeDescriptor, ParseError> {
    let mut parser = TypeParser::at(source, tokens, *cursor);
    let result = parser.parse_type();
    *cursor = parser.position();
    result
}

/// Advances `cursor` past the value at `tokens[*cursor]`.
pub fn skip_value(tokens: &[Token], cursor: &mut usize) {
    let mut parser = TypeParser::at("", tokens, *cursor);
    parser.skip_value();
    *cursor = parser.position();
}

/// Tokenizes and parses a standalone type descriptor such as
/// `["i32", ["u8", "f64"]]`.
pub fn parse_type_str(source: &str) -> Result<TypeDescriptor, ParseError> {
    let tokens = tokenize_to_vec(source, 16)?;
    let mut parser = TypeParser::new(source, &tokens);
    let ty = parser.parse_type()?;
    if let Some(extra) = parser.peek() {
        let span = extra.span();
        return Err(ParseError::UnexpectedToken {
            found: "trailing input".to_string(),
            span: Some(span),
        });
    }
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> TypeDescriptor {
        parse_type_str(source).unwrap_or_else(|e| panic!("parse failed for {:?}: {:?}", source, e))
    }

    #[test]
    fn test_every_primitive_resolves_to_its_singleton() {
        for primitive in PrimitiveType::ALL {
            let source = format!("\"{}\"", primitive.name());
            let first = parse(&source);
            let second = parse(&source);
            match (first, second) {
                (TypeDescriptor::Primitive(a), TypeDescriptor::Primitive(b)) => {
                    assert!(std::ptr::eq(a, b));
                    assert!(std::ptr::eq(a, primitive.singleton()));
                }
                other => panic!("expected primitives, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_aggregate_children_in_order() {
        let ty = parse(r#"["i32", ["u8", "f64"], []]"#);
        assert_eq!(ty.to_string(), "struct { i32, struct { u8, f64 }, struct {} }");
        assert_eq!(ty.as_aggregate().map(|a| a.children.len()), Some(3));
    }

    #[test]
    fn test_unknown_name_reports_span() {
        let source = r#"["i32", "i23"]"#;
        match parse_type_str(source).unwrap_err() {
            ParseError::UnknownTypeName { name, span } => {
                assert_eq!(name, "i23");
                assert_eq!(span.offset(), 9);
                assert_eq!(span.len(), 3);
            }
            other => panic!("expected UnknownTypeName, got {:?}", other),
        }
    }

    #[test]
    fn test_object_and_literal_are_unexpected() {
        for source in [r#"{"a": "i32"}"#, "42", r#"["i32", true]"#] {
            let err = parse_type_str(source).unwrap_err();
            assert!(
                matches!(err, ParseError::UnexpectedToken { .. }),
                "{:?} gave {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_empty_input_is_unexpected() {
        match parse_type_str("  ").unwrap_err() {
            ParseError::UnexpectedToken { span, .. } => assert_eq!(span, None),
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_cursor_stops_after_value() {
        let source = r#"[["i32", ["u8"]], "ptr", "f32"]"#;
        let tokens = tokenize_to_vec(source, 16).unwrap();
        let mut cursor = 1;
        let first = parse_type(source, &tokens, &mut cursor).unwrap();
        assert_eq!(first.to_string(), "struct { i32, struct { u8 } }");
        assert_eq!(tokens[cursor].text(source), "ptr");

        skip_value(&tokens, &mut cursor);
        assert_eq!(tokens[cursor].text(source), "f32");
    }

    #[test]
    fn test_depth_limit_is_inclusive() {
        let source = r#"[[["i32"]]]"#;
        let tokens = tokenize_to_vec(source, 16).unwrap();

        let ty = TypeParser::new(source, &tokens).with_max_depth(3).parse_type().unwrap();
        assert_eq!(ty.depth(), 3);

        let mut parser = TypeParser::new(source, &tokens).with_max_depth(2);
        match parser.parse_type().unwrap_err() {
            ParseError::TooDeep { limit, span } => {
                assert_eq!(limit, 2);
                assert_eq!(span.offset(), 2);
            }
            other => panic!("expected TooDeep, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_value_handles_deep_nesting() {
        let source = format!("[{}\"i32\"{}, \"u8\"]", "[".repeat(5_000), "]".repeat(5_000));
        let tokens = tokenize_to_vec(&source, 64).unwrap();
        let mut cursor = 1;
        skip_value(&tokens, &mut cursor);
        assert_eq!(tokens[cursor].text(&source), "u8");
    }

    #[test]
    fn test_trailing_input_is_rejected() {
        match parse_type_str(r#""i32", "i64""#).unwrap_err() {
            ParseError::UnexpectedToken { found, span } => {
                assert_eq!(found, "trailing input");
                assert_eq!(span.map(|s| s.offset()), Some(8));
            }
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
    }
}
