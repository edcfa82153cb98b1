use crate::gn::GnError;

/// Which recognized top-level construct the rewriter is inside.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    Scanning,
    /// Inside `config("name") { ... }`.
    InConfig(String),
    /// Inside the declaration of the target being edited.
    InTarget,
}

/// Brace depth plus the open scope.
///
/// Any return to depth zero clears the scope, whichever block closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    depth: usize,
    scope: Scope,
}

impl ScopeContext {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn at_top_level(&self) -> bool {
        self.depth == 0
    }

    pub fn config_name(&self) -> Option<&str> {
        match &self.scope {
            Scope::InConfig(name) => Some(name),
            _ => None,
        }
    }

    pub fn in_target(&self) -> bool {
        self.scope == Scope::InTarget
    }

    pub fn enter(&mut self, scope: Scope) {
        self.scope = scope;
    }

    pub fn open_brace(&mut self) {
        self.depth += 1;
    }

    pub fn close_brace(&mut self) -> Result<(), GnError> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| GnError::Structural {
                expected: "a block to close".to_string(),
                found: "unbalanced '}'".to_string(),
            })?;
        if self.depth == 0 {
            self.scope = Scope::Scanning;
        }
        Ok(())
    }
}
