use crate::error::TokenizeError;
use crate::lexer::{lex_from, LexemeKind};
use miette::SourceSpan;

/// Kind of a structural token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    /// An unused slot in a token buffer.
    #[default]
    Undefined,
    Object,
    Array,
    /// A string literal, used either as an object key or as a value.
    String,
    /// A bare literal: number, `true`, `false` or `null`.
    Primitive,
}

/// One entry of the flat token stream.
///
/// Containers are followed by their children in document order, so a value
/// occupies a contiguous run of tokens whose length is only known by
/// walking the `size` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first byte. For strings, the byte after the opening quote.
    pub start: usize,
    /// Byte offset one past the last byte. For strings, the closing quote.
    pub end: usize,
    /// Number of immediate children. An object counts its keys, a key
    /// counts its value (so `1` once the value is seen), an array counts
    /// its elements.
    pub size: usize,
    pub parent: Option<usize>,
}

impl Token {
    /// The raw source text of this token. String escapes are not decoded.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::new(self.start.into(), self.end - self.start)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, TokenKind::Object | TokenKind::Array)
    }
}

/// Resumable, strict tokenizer producing a flat token stream with parent
/// links and child counts.
///
/// Tokens are written into a caller-provided buffer. When the buffer is
/// full the tokenizer stops at a lexeme boundary and returns
/// [`TokenizeError::InsufficientCapacity`]; calling it again with the same
/// source and a larger buffer that still holds the tokens written so far
/// picks up where it left off. Any other error leaves the tokenizer in an
/// unspecified state; call [`Tokenizer::reset`] before reusing it.
#[derive(Debug, Default)]
pub struct Tokenizer {
    /// Byte offset of the next lexeme to read.
    pos: usize,
    /// Index of the next free token slot.
    next: usize,
    /// The token new values attach to.
    parent: Option<usize>,
    /// Containers whose closing bracket has not been seen yet.
    open: Vec<usize>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Tokenizes `source` into `tokens`, returning the number of tokens used.
    pub fn tokenize(&mut self, source: &str, tokens: &mut [Token]) -> Result<usize, TokenizeError> {
        for lexeme in lex_from(source, self.pos) {
            let start = lexeme.span.offset();
            let end = start + lexeme.span.len();

            match lexeme.kind {
                LexemeKind::LBrace | LexemeKind::LBracket => {
                    self.check_value_slot(tokens, false, lexeme.span)?;
                    let index = self.alloc(tokens)?;
                    let kind = if lexeme.kind == LexemeKind::LBrace {
                        TokenKind::Object
                    } else {
                        TokenKind::Array
                    };
                    tokens[index] = Token { kind, start, end: start, size: 0, parent: self.parent };
                    self.attach_to_parent(tokens);
                    self.open.push(index);
                    self.parent = Some(index);
                }

                LexemeKind::RBrace | LexemeKind::RBracket => {
                    let expected = if lexeme.kind == LexemeKind::RBrace {
                        TokenKind::Object
                    } else {
                        TokenKind::Array
                    };
                    let index = self.open.pop().ok_or_else(|| TokenizeError::Invalid {
                        message: format!("unmatched '{}'", lexeme.text),
                        span: lexeme.span,
                    })?;
                    if tokens[index].kind != expected {
                        return Err(TokenizeError::Invalid {
                            message: format!(
                                "'{}' does not close the {:?} opened here",
                                lexeme.text, tokens[index].kind
                            ),
                            span: lexeme.span,
                        });
                    }
                    tokens[index].end = end;
                    self.parent = tokens[index].parent;
                }

                LexemeKind::String => {
                    self.check_value_slot(tokens, true, lexeme.span)?;
                    let index = self.alloc(tokens)?;
                    tokens[index] = Token {
                        kind: TokenKind::String,
                        start: start + 1,
                        end: end - 1,
                        size: 0,
                        parent: self.parent,
                    };
                    self.attach_to_parent(tokens);
                }

                LexemeKind::Colon => {
                    // The key is the most recent token and must sit directly in an object.
                    let key = self.next.checked_sub(1).filter(|&key| {
                        tokens[key].kind == TokenKind::String
                            && tokens[key].size == 0
                            && self.parent == tokens[key].parent
                            && self.parent.map_or(false, |p| tokens[p].kind == TokenKind::Object)
                    });
                    match key {
                        Some(key) => self.parent = Some(key),
                        None => {
                            return Err(TokenizeError::Invalid {
                                message: "':' must follow an object key".to_string(),
                                span: lexeme.span,
                            })
                        }
                    }
                }

                LexemeKind::Comma => {
                    if let Some(p) = self.parent {
                        if !tokens[p].is_container() {
                            self.parent = tokens[p].parent;
                        }
                    }
                }

                LexemeKind::Number | LexemeKind::True | LexemeKind::False | LexemeKind::Null => {
                    self.check_value_slot(tokens, false, lexeme.span)?;
                    let index = self.alloc(tokens)?;
                    tokens[index] = Token {
                        kind: TokenKind::Primitive,
                        start,
                        end,
                        size: 0,
                        parent: self.parent,
                    };
                    self.attach_to_parent(tokens);
                }

                LexemeKind::Whitespace => {}

                LexemeKind::Error => {
                    return Err(TokenizeError::Invalid {
                        message: format!("unrecognized input '{}'", lexeme.text),
                        span: lexeme.span,
                    });
                }
            }

            self.pos = end;
        }

        if let Some(&index) = self.open.last() {
            return Err(TokenizeError::Partial {
                message: format!("unterminated {:?}", tokens[index].kind),
                span: SourceSpan::new(tokens[index].start.into(), 1),
            });
        }

        log::trace!("tokenized {} byte(s) into {} token(s)", source.len(), self.next);
        Ok(self.next)
    }

    fn alloc(&mut self, tokens: &[Token]) -> Result<usize, TokenizeError> {
        if self.next >= tokens.len() {
            return Err(TokenizeError::InsufficientCapacity { written: self.next });
        }
        let index = self.next;
        self.next += 1;
        Ok(index)
    }

    fn attach_to_parent(&self, tokens: &mut [Token]) {
        if let Some(p) = self.parent {
            tokens[p].size += 1;
        }
    }

    /// Checks that a new value may start here. Only strings may appear in
    /// key position, and a key takes exactly one value.
    fn check_value_slot(
        &self,
        tokens: &[Token],
        is_string: bool,
        span: SourceSpan,
    ) -> Result<(), TokenizeError> {
        let Some(p) = self.parent else {
            return Ok(());
        };
        let parent = &tokens[p];
        if parent.kind == TokenKind::Object && !is_string {
            return Err(TokenizeError::Invalid {
                message: "object keys must be strings".to_string(),
                span,
            });
        }
        if parent.kind == TokenKind::String && parent.size != 0 {
            return Err(TokenizeError::Invalid {
                message: "expected ',' before the next value".to_string(),
                span,
            });
        }
        Ok(())
    }
}

/// Tokenizes `source`, doubling the token buffer until everything fits.
pub fn tokenize_to_vec(source: &str, initial_capacity: usize) -> Result<Vec<Token>, TokenizeError> {
    let mut tokenizer = Tokenizer::new();
    let mut tokens = vec![Token::default(); initial_capacity.max(1)];

    loop {
        match tokenizer.tokenize(source, &mut tokens) {
            Ok(count) => {
                tokens.truncate(count);
                return Ok(tokens);
            }
            Err(TokenizeError::InsufficientCapacity { written }) => {
                let grown = tokens.len() * 2;
                log::trace!("token buffer full after {} token(s), growing to {}", written, grown);
                tokens.resize(grown, Token::default());
            }
            Err(err) => return Err(err),
        }
    }
}
