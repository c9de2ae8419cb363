use ffisig_syntax::{tokenize_to_vec, Token, TokenKind, TokenizeError};

// Helper to tokenize and panic with the error on failure
fn tokenize_expect_ok(source: &str) -> Vec<Token> {
    match tokenize_to_vec(source, 4) {
        Ok(tokens) => tokens,
        Err(e) => panic!("Expected successful tokenization, but got: {:?}", e),
    }
}

/// Number of tokens the value starting at `index` occupies.
fn subtree_len(tokens: &[Token], index: usize) -> usize {
    let mut end = index + 1;
    for _ in 0..tokens[index].size {
        end += subtree_len(tokens, end);
    }
    end - index
}

#[test]
fn test_signature_with_trailing_comma() {
    // Trailing commas are tolerated.
    let source = "{\n    \"argument types\": [\"int\", \"i32\"],\n    \"return type\": \"void\",\n}";
    let tokens = tokenize_expect_ok(source);

    assert_eq!(tokens.len(), 7);
    assert_eq!(tokens[0].kind, TokenKind::Object);
    assert_eq!(tokens[0].size, 2);
    assert_eq!(tokens[5].text(source), "return type");
    assert_eq!(tokens[6].text(source), "void");
    assert_eq!(tokens[6].parent, Some(5));
}

#[test]
fn test_child_counts_delimit_nested_values() {
    let source = r#"{"argument types": [[["i32", ["u8", "u16"]], "f64"], "ptr"], "return type": "void"}"#;
    let tokens = tokenize_expect_ok(source);

    // The whole document is one value.
    assert_eq!(subtree_len(&tokens, 0), tokens.len());

    // The argument list spans everything up to the second key.
    let args = 2;
    assert_eq!(tokens[args].kind, TokenKind::Array);
    let next_key = args + subtree_len(&tokens, args);
    assert_eq!(tokens[next_key].text(source), "return type");
}

#[test]
fn test_primitive_literals_are_tokens() {
    let source = r#"{"count": 3, "flags": [true, false, null]}"#;
    let tokens = tokenize_expect_ok(source);
    let primitives: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Primitive)
        .map(|t| t.text(source))
        .collect();
    assert_eq!(primitives, vec!["3", "true", "false", "null"]);
}

#[test]
fn test_unterminated_string_is_invalid() {
    let err = tokenize_to_vec(r#"{"argument types"#, 4).unwrap_err();
    assert!(matches!(err, TokenizeError::Invalid { .. }), "got {:?}", err);
}

#[test]
fn test_unmatched_closing_bracket() {
    let err = tokenize_to_vec("]", 4).unwrap_err();
    match err {
        TokenizeError::Invalid { message, .. } => assert!(message.contains("unmatched")),
        other => panic!("expected Invalid, got {:?}", other),
    }
}
