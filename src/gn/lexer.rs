//! Whitespace-preserving GN lexer.
//!
//! Every token carries the whitespace and `#` comments around it, so the
//! token stream can be written back out without losing a byte. Insignificant
//! text between two tokens belongs to the first token as trailing
//! whitespace; only the first token of a file ever has leading whitespace.

use crate::gn::errors::GnError;
use crate::gn::token::{Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src str,
    offset: usize,
    peeked: Option<Token<'src>>,
    failed: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            peeked: None,
            failed: false,
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Result<Option<&Token<'src>>, GnError> {
        if self.peeked.is_none() {
            if self.offset >= self.source.len() {
                return Ok(None);
            }
            match self.parse_token() {
                Ok(token) => self.peeked = Some(token),
                Err(err) => {
                    self.failed = true;
                    return Err(err);
                }
            }
        }
        Ok(self.peeked.as_ref())
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Option<Token<'src>>, GnError> {
        self.peek()?;
        Ok(self.peeked.take())
    }

    fn parse_token(&mut self) -> Result<Token<'src>, GnError> {
        let source = self.source;
        let leading = self.skip_whitespace();
        let start = self.offset;

        let Some(kind) = self.parse_kind()? else {
            return Ok(Token::lexed(TokenKind::Whitespace, None, leading, None));
        };

        let text = &source[start..self.offset];
        let trailing = self.skip_whitespace();
        Ok(Token::lexed(kind, Some(text), leading, trailing))
    }

    fn parse_kind(&mut self) -> Result<Option<TokenKind>, GnError> {
        let start = self.offset;
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let kind = match c {
            '+' => self.either('=', TokenKind::PlusEquals, TokenKind::Plus),
            '-' => self.either('=', TokenKind::MinusEquals, TokenKind::Minus),
            '!' => self.either('=', TokenKind::NotEquals, TokenKind::Not),
            '=' => self.either('=', TokenKind::EqualsEquals, TokenKind::Equals),
            '<' => self.either('=', TokenKind::LessThanOrEquals, TokenKind::LessThan),
            '>' => self.either('=', TokenKind::GreaterThanOrEquals, TokenKind::GreaterThan),
            '&' => {
                if !self.eat('&') {
                    return Err(self.error_at(start, "expected '&&'"));
                }
                TokenKind::AmpersandAmpersand
            }
            '|' => {
                if !self.eat('|') {
                    return Err(self.error_at(start, "expected '||'"));
                }
                TokenKind::BarBar
            }
            '(' => TokenKind::ParenOpen,
            ')' => TokenKind::ParenClose,
            '{' => TokenKind::BraceOpen,
            '}' => TokenKind::BraceClose,
            '[' => TokenKind::BracketOpen,
            ']' => TokenKind::BracketClose,
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '"' => self.string(start)?,
            '0' if matches!(self.current(), Some('x' | 'X')) => {
                self.offset += 1;
                self.eat_while(|c| c.is_ascii_hexdigit());
                TokenKind::HexInteger
            }
            c if c.is_ascii_digit() => {
                self.eat_while(|c| c.is_ascii_digit());
                TokenKind::Integer
            }
            c if is_identifier_start(c) => {
                self.eat_while(is_identifier_continue);
                TokenKind::Identifier
            }
            other => {
                return Err(self.error_at(start, format!("unexpected character {other:?}")));
            }
        };

        Ok(Some(kind))
    }

    fn string(&mut self, start: usize) -> Result<TokenKind, GnError> {
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '"' => return Ok(TokenKind::String),
                _ => {}
            }
        }
        Err(self.error_at(start, "unterminated string literal"))
    }

    /// Skip whitespace and `#` comments, returning the skipped span.
    fn skip_whitespace(&mut self) -> Option<&'src str> {
        let source = self.source;
        let start = self.offset;

        loop {
            let before = self.offset;
            self.eat_while(char::is_whitespace);
            if self.current() == Some('#') {
                self.eat_while(|c| c != '\n');
            }
            if self.offset == before {
                break;
            }
        }

        (self.offset != start).then(|| &source[start..self.offset])
    }

    fn current(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.offset += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn either(&mut self, second: char, pair: TokenKind, single: TokenKind) -> TokenKind {
        if self.eat(second) {
            pair
        } else {
            single
        }
    }

    fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while let Some(c) = self.current() {
            if !predicate(c) {
                break;
            }
            self.offset += c.len_utf8();
        }
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> GnError {
        let consumed = &self.source[..offset];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |line| line.chars().count())
            + 1;
        GnError::Lexical {
            message: message.into(),
            line,
            column,
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, GnError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_token().transpose()
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
