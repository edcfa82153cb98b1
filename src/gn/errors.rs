use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GnError {
    #[error("lexical error at {line}:{column}: {message}")]
    Lexical {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("expected {expected}, found {found}")]
    Structural { expected: String, found: String },
}

impl GnError {
    pub fn is_lexical(&self) -> bool {
        matches!(self, GnError::Lexical { .. })
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, GnError::Structural { .. })
    }
}
