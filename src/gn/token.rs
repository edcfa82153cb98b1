use std::borrow::Cow;
use std::fmt;

/// Lexical categories of GN source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    AmpersandAmpersand,
    BarBar,
    BraceClose,
    BraceOpen,
    BracketClose,
    BracketOpen,
    Comma,
    Dot,
    Equals,
    EqualsEquals,
    GreaterThan,
    GreaterThanOrEquals,
    HexInteger,
    Identifier,
    Integer,
    LessThan,
    LessThanOrEquals,
    Minus,
    MinusEquals,
    Not,
    NotEquals,
    ParenClose,
    ParenOpen,
    Plus,
    PlusEquals,
    String,
    Whitespace,
}

impl TokenKind {
    /// Canonical source text for kinds whose spelling is fixed.
    ///
    /// `Whitespace` renders as the empty string; literal kinds have no
    /// canonical spelling and return `None`.
    pub fn symbol(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::BarBar => "||",
            TokenKind::BraceClose => "}",
            TokenKind::BraceOpen => "{",
            TokenKind::BracketClose => "]",
            TokenKind::BracketOpen => "[",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Equals => "=",
            TokenKind::EqualsEquals => "==",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanOrEquals => ">=",
            TokenKind::LessThan => "<",
            TokenKind::LessThanOrEquals => "<=",
            TokenKind::Minus => "-",
            TokenKind::MinusEquals => "-=",
            TokenKind::Not => "!",
            TokenKind::NotEquals => "!=",
            TokenKind::ParenClose => ")",
            TokenKind::ParenOpen => "(",
            TokenKind::Plus => "+",
            TokenKind::PlusEquals => "+=",
            TokenKind::Whitespace => "",
            TokenKind::HexInteger
            | TokenKind::Identifier
            | TokenKind::Integer
            | TokenKind::String => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::HexInteger => write!(f, "hex integer"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Integer => write!(f, "integer"),
            TokenKind::String => write!(f, "string"),
            TokenKind::Whitespace => write!(f, "whitespace"),
            other => write!(f, "'{}'", other.symbol().unwrap_or_default()),
        }
    }
}

/// A token together with the insignificant text around it.
///
/// Tokens borrow from the source they were lexed from. Synthetic tokens
/// built by a rewriter own their text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    kind: TokenKind,
    text: Option<Cow<'src, str>>,
    leading_whitespace: Option<&'src str>,
    trailing_whitespace: Option<&'src str>,
}

impl<'src> Token<'src> {
    pub(crate) fn lexed(
        kind: TokenKind,
        text: Option<&'src str>,
        leading_whitespace: Option<&'src str>,
        trailing_whitespace: Option<&'src str>,
    ) -> Self {
        Self {
            kind,
            text: text.map(Cow::Borrowed),
            leading_whitespace,
            trailing_whitespace,
        }
    }

    /// Build a punctuation or operator token with no source text.
    ///
    /// # Panics
    ///
    /// Panics if `kind` has no canonical symbol.
    pub fn synthetic(kind: TokenKind) -> Self {
        assert!(
            kind.symbol().is_some(),
            "cannot synthesize a {kind} token without text"
        );
        Self {
            kind,
            text: None,
            leading_whitespace: None,
            trailing_whitespace: None,
        }
    }

    /// Build a token with explicit text and no surrounding whitespace.
    pub fn with_text(kind: TokenKind, text: impl Into<Cow<'src, str>>) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            leading_whitespace: None,
            trailing_whitespace: None,
        }
    }

    /// A GN string literal token for `value`, escaping `\` and `"`.
    pub fn string_literal(value: &str) -> Self {
        let mut quoted = String::with_capacity(value.len() + 2);
        quoted.push('"');
        for ch in value.chars() {
            if ch == '"' || ch == '\\' {
                quoted.push('\\');
            }
            quoted.push(ch);
        }
        quoted.push('"');
        Self::with_text(TokenKind::String, quoted)
    }

    /// A new token with the same kind and whitespace but different text.
    pub fn replaced_text(&self, text: impl Into<Cow<'src, str>>) -> Self {
        Self {
            kind: self.kind,
            text: Some(text.into()),
            leading_whitespace: self.leading_whitespace,
            trailing_whitespace: self.trailing_whitespace,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn leading_whitespace(&self) -> Option<&'src str> {
        self.leading_whitespace
    }

    pub fn trailing_whitespace(&self) -> Option<&'src str> {
        self.trailing_whitespace
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// True for an identifier spelled exactly `name`.
    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text() == Some(name)
    }

    /// Contents of a string literal with the surrounding quotes removed.
    ///
    /// Escapes are left as written.
    pub fn unquoted(&self) -> Option<&str> {
        if self.kind != TokenKind::String {
            return None;
        }
        let text = self.text()?;
        text.strip_prefix('"')?.strip_suffix('"')
    }

    /// Text the token renders as: its own text or the canonical symbol.
    pub fn rendered_text(&self) -> Option<&str> {
        self.text().or_else(|| self.kind.symbol())
    }

    /// Short human description, used in error messages.
    pub fn describe(&self) -> String {
        match (self.kind, self.text()) {
            (TokenKind::Identifier, Some(text)) => format!("identifier `{text}`"),
            (TokenKind::String, Some(text)) => format!("string {text}"),
            (TokenKind::Integer | TokenKind::HexInteger, Some(text)) => {
                format!("{} `{text}`", self.kind)
            }
            (kind, _) => kind.to_string(),
        }
    }
}
