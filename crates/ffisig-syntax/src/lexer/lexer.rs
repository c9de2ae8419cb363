use super::token::*;
use crate::error::TokenizeError;
use logos::Logos;
use miette::SourceSpan;

/// Lexes `input` starting at byte `offset`, returning lexemes whose spans
/// are relative to the whole of `input`.
///
/// Restarting in the middle of a document is only meaningful at a lexeme
/// boundary, which is where the tokenizer resumes after running out of
/// token slots.
pub fn lex_from(input: &str, offset: usize) -> impl Iterator<Item = Lexeme<'_>> + '_ {
    let rest = &input[offset..];
    let mut lexer = LexemeKind::lexer(rest);
    std::iter::from_fn(move || {
        let kind = lexer.next()?;
        let range = lexer.span();
        Some(Lexeme {
            kind,
            text: &rest[range.clone()],
            span: SourceSpan::new((offset + range.start).into(), range.len()),
        })
    })
}

/// Lexes the input string into a vector of lexemes.
pub fn lex(input: &str) -> Result<Vec<Lexeme<'_>>, TokenizeError> {
    let mut lexemes = Vec::new();

    for lexeme in lex_from(input, 0) {
        match lexeme.kind {
            LexemeKind::Error => {
                return Err(TokenizeError::Invalid {
                    message: format!("unrecognized input '{}'", lexeme.text),
                    span: lexeme.span,
                });
            }
            _ => lexemes.push(lexeme),
        }
    }

    Ok(lexemes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_with_unicode_escape() {
        let lexemes = lex(r#"["\u00e9t\u00C9", "a\"b"]"#).unwrap();
        let kinds: Vec<_> = lexemes.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LexemeKind::LBracket,
                LexemeKind::String,
                LexemeKind::Comma,
                LexemeKind::String,
                LexemeKind::RBracket,
            ]
        );
        assert_eq!(lexemes[1].text, r#""\u00e9t\u00C9""#);
    }

    #[test]
    fn test_short_unicode_escape_is_rejected() {
        let err = lex(r#"["\u12"]"#).unwrap_err();
        assert!(matches!(err, TokenizeError::Invalid { .. }), "got {:?}", err);
    }

    #[test]
    fn test_spans_are_absolute_when_resuming() {
        let input = r#"["i32", "u8"]"#;
        let lexemes: Vec<_> = lex_from(input, 8).collect();
        assert_eq!(lexemes[0].kind, LexemeKind::String);
        assert_eq!(lexemes[0].span.offset(), 8);
        assert_eq!(lexemes[0].text, r#""u8""#);
    }
}
