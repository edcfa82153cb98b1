//! GN Patcher: format-preserving surgical edits to GN build scripts
//!
//! GN scripts (`BUILD.gn`) are lexed into tokens that carry their
//! surrounding whitespace and comments, so a rewrite pass can change a few
//! tokens and write everything else back byte for byte.
//!
//! # Architecture
//!
//! - [`gn`]: tokens, the lexer, and a generic pull/push rewriting engine.
//! - [`script`]: the build-script transformation. It recognizes
//!   `config("...")` blocks and a named `static_library("...")` target,
//!   appends values to list keys, and flips the target to `shared_library`.
//! - [`config`]: the [`EditSpec`] describing what to change, loadable from TOML.
//! - [`edit`]: reading a script from disk and writing the result atomically.
//!
//! # Example
//!
//! ```
//! use gn_patcher::{rewrite_script, EditSpec};
//!
//! let source = "static_library(\"pdfium\") {\n  sources = [ \"a.cc\" ]\n}\n";
//! let spec = EditSpec::pdfium(["contrib/x.cc"]);
//!
//! let rewritten = rewrite_script(source, &spec).unwrap();
//! assert_eq!(
//!     rewritten,
//!     "shared_library(\"pdfium\") {\n  sources = [ \"a.cc\" ,\"contrib/x.cc\"]\n}\n"
//! );
//! ```

pub mod config;
pub mod edit;
pub mod gn;
pub mod script;
pub mod sources;

// Re-exports
pub use config::{
    load_from_path, load_from_str, ConfigError, ConfigInjection, EditSpec, TargetEdit,
};
pub use edit::{plan_file, rewrite_file, EditError, RewriteOutcome, RewritePlan};
pub use gn::{GnError, Lexer, Token, TokenKind};
pub use script::{rewrite_script, rewrite_script_with_report, RewriteReport, ScriptRewriter};
pub use sources::{discover_sources, SourcesError};
