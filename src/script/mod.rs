//! Surgical edits to GN build scripts.
//!
//! [`rewrite_script`] runs a single pass over the token stream of one
//! script. It tracks brace depth and which `config("...")` or target block is
//! open, and only touches tokens inside the constructs named by the
//! [`EditSpec`]. Everything else, comments and formatting included, comes
//! out byte for byte.

pub mod rewriter;
pub mod scope;

pub use rewriter::{RewriteReport, ScriptRewriter};
pub use scope::{Scope, ScopeContext};

use crate::config::EditSpec;
use crate::gn::{rewrite, GnError};
use tracing::warn;

pub const CONFIG_KEYWORD: &str = "config";
pub const SOURCES_KEY: &str = "sources";
pub const STATIC_LIBRARY: &str = "static_library";
pub const SHARED_LIBRARY: &str = "shared_library";

/// Apply `spec` to the script `source`, returning the rewritten text.
pub fn rewrite_script(source: &str, spec: &EditSpec) -> Result<String, GnError> {
    rewrite_script_with_report(source, spec).map(|(text, _)| text)
}

/// Like [`rewrite_script`], also reporting what was changed.
pub fn rewrite_script_with_report(
    source: &str,
    spec: &EditSpec,
) -> Result<(String, RewriteReport), GnError> {
    let mut rewriter = ScriptRewriter::new(spec);
    let text = rewrite(&mut rewriter, source)?;
    let report = rewriter.into_report();

    if let Some(target) = &spec.target {
        if !report.target_renamed {
            warn!(name = %target.name, declaration = %target.declaration, "target declaration not found");
        }
    }
    for missed in &report.unmatched {
        warn!(key = %missed, "config key not rewritten");
    }

    Ok((text, report))
}
