use crate::backend::Backend;
use crate::config::{BuildOptions, MissingKeyPolicy, UnknownKeyPolicy};
use crate::descriptor::CallDescriptor;
use crate::error::{CifError, CifResult};
use crate::native::LibffiBackend;
use ffisig_syntax::{tokenize_to_vec, Token, TokenKind};
use ffisig_types::{release_all, release_type, skip_value, TypeDescriptor, TypeParser};

pub const ARGUMENT_TYPES: &str = "argument types";
pub const RETURN_TYPE: &str = "return type";

/// Builds a prepared call descriptor for the libffi backend with default
/// options.
///
/// ```no_run
/// let text = r#"{"argument types": ["int", "i32"], "return type": "void"}"#;
/// let descriptor = ffisig_cif::build(text)?;
/// assert_eq!(descriptor.argument_count(), 2);
/// # Ok::<(), ffisig_cif::CifError>(())
/// ```
pub fn build(text: &str) -> CifResult<CallDescriptor> {
    build_with(text, &BuildOptions::default(), &LibffiBackend)
}

pub fn build_with<B: Backend>(
    text: &str,
    options: &BuildOptions,
    backend: &B,
) -> CifResult<CallDescriptor<B::Handle>> {
    options.validate()?;
    let tokens = tokenize_to_vec(text, options.initial_token_capacity)?;
    log::debug!("building call descriptor from {} token(s)", tokens.len());

    let mut builder = SignatureBuilder::new(text, &tokens, options);
    builder.scan()?;
    builder.finish(backend)
}

/// Collects the trees of one build call. Anything still held when the
/// builder is dropped is released, so every early return rolls back
/// exactly what was built so far.
struct SignatureBuilder<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    options: &'a BuildOptions,
    argument_types: Option<Vec<TypeDescriptor>>,
    return_type: Option<TypeDescriptor>,
}

impl<'a> SignatureBuilder<'a> {
    fn new(source: &'a str, tokens: &'a [Token], options: &'a BuildOptions) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            options,
            argument_types: None,
            return_type: None,
        }
    }

    fn next_token(&mut self) -> CifResult<Token> {
        let tok = self.tokens.get(self.pos).copied().ok_or_else(|| CifError::UnexpectedToken {
            found: "end of input".to_string(),
            span: None,
        })?;
        self.pos += 1;
        Ok(tok)
    }

    /// Parses the type at the cursor under the configured nesting limit.
    fn parse_type(&mut self) -> CifResult<TypeDescriptor> {
        let mut parser = TypeParser::at(self.source, self.tokens, self.pos)
            .with_max_depth(self.options.max_depth);
        let result = parser.parse_type();
        self.pos = parser.position();
        Ok(result?)
    }

    fn scan(&mut self) -> CifResult<()> {
        let root = self.next_token()?;
        if root.kind != TokenKind::Object {
            return Err(CifError::UnexpectedToken {
                found: format!("{:?} where the signature object should start", root.kind),
                span: Some(root.span()),
            });
        }

        for _ in 0..root.size {
            let key = self.next_token()?;
            match key.text(self.source) {
                ARGUMENT_TYPES => self.read_argument_types(&key)?,
                RETURN_TYPE => self.read_return_type(&key)?,
                other => match self.options.unknown_keys {
                    UnknownKeyPolicy::Skip => {
                        log::debug!("ignoring key \"{}\"", other);
                        for _ in 0..key.size {
                            skip_value(self.tokens, &mut self.pos);
                        }
                    }
                    UnknownKeyPolicy::Reject => {
                        return Err(CifError::UnknownKey {
                            key: other.to_string(),
                            span: key.span(),
                        })
                    }
                },
            }
        }

        if let Some(extra) = self.tokens.get(self.pos) {
            return Err(CifError::UnexpectedToken {
                found: "trailing input after the signature object".to_string(),
                span: Some(extra.span()),
            });
        }
        Ok(())
    }

    fn malformed(&self, key: &Token, reason: &str) -> CifError {
        CifError::DuplicateOrMalformedKey {
            key: key.text(self.source).to_string(),
            reason: reason.to_string(),
            span: key.span(),
        }
    }

    fn read_argument_types(&mut self, key: &Token) -> CifResult<()> {
        if self.argument_types.is_some() {
            return Err(self.malformed(key, "given more than once"));
        }
        if key.size != 1 {
            return Err(self.malformed(key, "expected exactly one value"));
        }
        let list = match self.tokens.get(self.pos) {
            Some(tok) if tok.kind == TokenKind::Array => *tok,
            _ => return Err(self.malformed(key, "the value must be an array of types")),
        };
        self.pos += 1;

        self.argument_types = Some(Vec::with_capacity(list.size));
        for _ in 0..list.size {
            let ty = self.parse_type()?;
            self.argument_types.get_or_insert_with(Vec::new).push(ty);
        }
        log::trace!("read {} argument type(s)", list.size);
        Ok(())
    }

    fn read_return_type(&mut self, key: &Token) -> CifResult<()> {
        if self.return_type.is_some() {
            return Err(self.malformed(key, "given more than once"));
        }
        if key.size != 1 {
            return Err(self.malformed(key, "expected exactly one value"));
        }
        self.return_type = Some(self.parse_type()?);
        Ok(())
    }

    fn finish<B: Backend>(mut self, backend: &B) -> CifResult<CallDescriptor<B::Handle>> {
        if self.options.missing_keys == MissingKeyPolicy::Reject {
            if self.argument_types.is_none() {
                return Err(CifError::MissingRequiredKey { key: ARGUMENT_TYPES });
            }
            if self.return_type.is_none() {
                return Err(CifError::MissingRequiredKey { key: RETURN_TYPE });
            }
        }

        let argument_types = self.argument_types.get_or_insert_with(Vec::new);
        let prepared = backend.prepare(self.return_type.as_mut(), argument_types.as_mut_slice())?;

        let argument_types = self.argument_types.take().unwrap_or_default();
        let return_type = self.return_type.take();
        log::debug!("prepared call descriptor with {} argument(s)", argument_types.len());
        Ok(CallDescriptor::new(return_type, argument_types, prepared))
    }
}

impl Drop for SignatureBuilder<'_> {
    fn drop(&mut self) {
        let mut released = 0;
        if let Some(return_type) = self.return_type.take() {
            released += release_type(return_type);
        }
        if let Some(argument_types) = self.argument_types.take() {
            released += release_all(argument_types);
        }
        if released > 0 {
            log::debug!("rolled back {} aggregate node(s)", released);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use ffisig_types::PrimitiveType;

    /// Accepts everything and hands back what it saw.
    struct Echo;

    impl Backend for Echo {
        type Handle = (Option<String>, usize);

        fn prepare(
            &self,
            return_type: Option<&mut TypeDescriptor>,
            argument_types: &mut [TypeDescriptor],
        ) -> Result<Self::Handle, BackendError> {
            Ok((return_type.map(|ty| ty.to_string()), argument_types.len()))
        }
    }

    type Echoed = CallDescriptor<(Option<String>, usize)>;

    fn echo(text: &str, options: &BuildOptions) -> CifResult<Echoed> {
        build_with(text, options, &Echo)
    }

    #[test]
    fn test_reads_both_keys() {
        let descriptor = echo(
            r#"{"return type": ["u8", "u8"], "argument types": ["ptr"]}"#,
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(descriptor.prepared(), &(Some("struct { u8, u8 }".to_string()), 1));
        assert_eq!(
            descriptor.argument_types()[0].as_primitive(),
            Some(PrimitiveType::Pointer)
        );
    }

    #[test]
    fn test_return_type_given_twice() {
        let err = echo(
            r#"{"return type": "void", "argument types": [], "return type": "i32"}"#,
            &BuildOptions::default(),
        )
        .unwrap_err();
        match err {
            CifError::DuplicateOrMalformedKey { key, reason, span } => {
                assert_eq!(key, "return type");
                assert_eq!(reason, "given more than once");
                assert_eq!(span.offset(), 47);
            }
            other => panic!("expected DuplicateOrMalformedKey, got {:?}", other),
        }
    }

    #[test]
    fn test_argument_types_must_be_an_array() {
        let text = r#"{"argument types": "i32", "return type": "void"}"#;
        let err = echo(text, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, CifError::DuplicateOrMalformedKey { .. }), "got {:?}", err);
    }

    #[test]
    fn test_key_without_value_is_malformed() {
        let err = echo(r#"{"argument types", "return type": "void"}"#, &BuildOptions::default())
            .unwrap_err();
        match err {
            CifError::DuplicateOrMalformedKey { reason, .. } => {
                assert_eq!(reason, "expected exactly one value")
            }
            other => panic!("expected DuplicateOrMalformedKey, got {:?}", other),
        }
    }

    #[test]
    fn test_root_must_be_an_object() {
        for text in [r#"["i32"]"#, r#""i32""#, ""] {
            let err = echo(text, &BuildOptions::default()).unwrap_err();
            assert!(matches!(err, CifError::UnexpectedToken { .. }), "{:?} gave {:?}", text, err);
        }
    }

    #[test]
    fn test_trailing_value_after_object() {
        let text = r#"{"argument types": [], "return type": "void"} "i32""#;
        let err = echo(text, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, CifError::UnexpectedToken { .. }), "got {:?}", err);
    }

    #[test]
    fn test_unknown_keys_with_reject_policy() {
        let options = BuildOptions {
            unknown_keys: UnknownKeyPolicy::Reject,
            ..BuildOptions::default()
        };
        let text = r#"{"argument types": [], "abi": "sysv", "return type": "void"}"#;
        let err = echo(text, &options).unwrap_err();
        match err {
            CifError::UnknownKey { key, .. } => assert_eq!(key, "abi"),
            other => panic!("expected UnknownKey, got {:?}", other),
        }
    }

    #[test]
    fn test_configured_depth_limit() {
        let options = BuildOptions {
            max_depth: 2,
            ..BuildOptions::default()
        };
        let shallow = r#"{"argument types": [[["i32"]]], "return type": "void"}"#;
        assert_eq!(echo(shallow, &options).unwrap().argument_count(), 1);

        let deep = r#"{"argument types": ["u8", [[["i32"]]]], "return type": "void"}"#;
        match echo(deep, &options).unwrap_err() {
            CifError::TooDeep { limit, span } => {
                assert_eq!(limit, 2);
                assert_eq!(span.offset(), 28);
            }
            other => panic!("expected TooDeep, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_unknown_value_is_skipped() {
        let text = format!(
            r#"{{"notes": {}0{}, "argument types": [], "return type": "void"}}"#,
            "[".repeat(5_000),
            "]".repeat(5_000)
        );
        let descriptor = echo(&text, &BuildOptions::default()).unwrap();
        assert_eq!(descriptor.argument_count(), 0);
    }

    #[test]
    fn test_zero_capacity_option_is_rejected() {
        let options = BuildOptions {
            initial_token_capacity: 0,
            ..BuildOptions::default()
        };
        let err = echo(r#"{"argument types": [], "return type": "void"}"#, &options).unwrap_err();
        assert!(matches!(err, CifError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_tiny_capacity_still_builds() {
        let options = BuildOptions {
            initial_token_capacity: 1,
            ..BuildOptions::default()
        };
        let descriptor = echo(
            r#"{"argument types": [["i32", ["u8", "u8"]], "f32", "f64"], "return type": "void"}"#,
            &options,
        )
        .unwrap();
        assert_eq!(descriptor.argument_count(), 3);
    }
}
