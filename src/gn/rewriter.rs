//! Generic token rewriting engine.
//!
//! A [`Rewrite`] implementation pulls tokens from a [`TokenStream`] and
//! pushes the tokens it wants written to an [`Emitter`]. The traversal is a
//! single forward pass: a token is decided on once, in source order, and
//! lookahead is limited to what the transformation asks for via
//! [`TokenStream::peek`].

use crate::gn::errors::GnError;
use crate::gn::lexer::Lexer;
use crate::gn::token::{Token, TokenKind};

/// Pull side of a rewrite: a thin wrapper over the lexer.
pub struct TokenStream<'src> {
    lexer: Lexer<'src>,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'src>>, GnError> {
        self.lexer.next_token()
    }

    pub fn peek(&mut self) -> Result<Option<&Token<'src>>, GnError> {
        self.lexer.peek()
    }

    /// Consume the next token, requiring it to be of `kind`.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, GnError> {
        match self.next_token()? {
            Some(token) if token.is(kind) => Ok(token),
            Some(token) => Err(GnError::Structural {
                expected: kind.to_string(),
                found: token.describe(),
            }),
            None => Err(GnError::Structural {
                expected: kind.to_string(),
                found: "end of input".to_string(),
            }),
        }
    }

    /// Consume the next token, whatever it is, failing at end of input.
    pub fn expect_any(&mut self, expected: &str) -> Result<Token<'src>, GnError> {
        self.next_token()?.ok_or_else(|| GnError::Structural {
            expected: expected.to_string(),
            found: "end of input".to_string(),
        })
    }
}

/// Push side of a rewrite: serializes tokens as they are emitted.
#[derive(Debug, Default)]
pub struct Emitter {
    out: String,
    emitted: usize,
    synthesized: usize,
}

impl Emitter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn emit(&mut self, token: &Token<'_>) {
        if let Some(leading) = token.leading_whitespace() {
            self.out.push_str(leading);
        }
        match token.rendered_text() {
            Some(text) => self.out.push_str(text),
            None => unreachable!("{} token has neither text nor a canonical symbol", token.kind()),
        }
        if let Some(trailing) = token.trailing_whitespace() {
            self.out.push_str(trailing);
        }

        self.emitted += 1;
        if token.text().is_none() && !token.is(TokenKind::Whitespace) {
            self.synthesized += 1;
        }
    }

    pub fn emit_all<'a, 'src: 'a>(&mut self, tokens: impl IntoIterator<Item = &'a Token<'src>>) {
        for token in tokens {
            self.emit(token);
        }
    }

    /// Number of tokens emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Number of emitted tokens that were synthesized without source text.
    pub fn synthesized(&self) -> usize {
        self.synthesized
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// A token-level transformation.
pub trait Rewrite {
    /// Drain `input`, emitting the output token sequence to `output`.
    fn produce_tokens<'src>(
        &mut self,
        input: &mut TokenStream<'src>,
        output: &mut Emitter,
    ) -> Result<(), GnError>;
}

/// Run `rewriter` over `source` and return the rewritten text.
pub fn rewrite<R: Rewrite + ?Sized>(rewriter: &mut R, source: &str) -> Result<String, GnError> {
    let mut input = TokenStream::new(source);
    let mut output = Emitter::with_capacity(source.len());
    rewriter.produce_tokens(&mut input, &mut output)?;
    Ok(output.finish())
}

/// The identity transformation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Rewrite for Passthrough {
    fn produce_tokens<'src>(
        &mut self,
        input: &mut TokenStream<'src>,
        output: &mut Emitter,
    ) -> Result<(), GnError> {
        while let Some(token) = input.next_token()? {
            output.emit(&token);
        }
        Ok(())
    }
}
