pub mod errors;
pub mod lexer;
pub mod rewriter;
pub mod token;

pub use errors::GnError;
pub use lexer::Lexer;
pub use rewriter::{rewrite, Emitter, Passthrough, Rewrite, TokenStream};
pub use token::{Token, TokenKind};
