use crate::config::{EditSpec, TargetEdit};
use crate::gn::{Emitter, GnError, Rewrite, Token, TokenKind, TokenStream};
use crate::script::scope::{Scope, ScopeContext};
use crate::script::{CONFIG_KEYWORD, SOURCES_KEY, STATIC_LIBRARY};
use tracing::{debug, trace};

/// What a rewrite pass actually changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    /// Names of the `config("...")` blocks encountered, in order.
    pub configs_seen: Vec<String>,
    /// Values appended to config list keys.
    pub injected_values: usize,
    /// Whether the target declaration keyword was replaced.
    pub target_renamed: bool,
    /// Paths appended to the target's `sources`.
    pub injected_sources: usize,
    /// `config.key` pairs from the edit spec that were never rewritten.
    pub unmatched: Vec<String>,
}

impl RewriteReport {
    pub fn changed(&self) -> bool {
        self.target_renamed || self.injected_values > 0 || self.injected_sources > 0
    }
}

struct Injection<'spec> {
    config: &'spec str,
    key: &'spec str,
    values: Vec<Token<'static>>,
    ensure_absent: bool,
    applied: bool,
}

/// The build-script transformation driven by an [`EditSpec`].
pub struct ScriptRewriter<'spec> {
    injections: Vec<Injection<'spec>>,
    target: Option<&'spec TargetEdit>,
    extra_sources: Vec<Token<'static>>,
    context: ScopeContext,
    report: RewriteReport,
}

impl<'spec> ScriptRewriter<'spec> {
    pub fn new(spec: &'spec EditSpec) -> Self {
        let injections = spec
            .configs
            .iter()
            .map(|injection| Injection {
                config: &injection.config,
                key: &injection.key,
                values: injection
                    .values
                    .iter()
                    .map(|value| Token::string_literal(value))
                    .collect(),
                ensure_absent: injection.ensure_absent,
                applied: false,
            })
            .collect();

        let extra_sources = spec
            .target
            .iter()
            .flat_map(|target| &target.extra_sources)
            .map(|path| Token::string_literal(&normalize_separators(path)))
            .collect();

        Self {
            injections,
            target: spec.target.as_ref(),
            extra_sources,
            context: ScopeContext::default(),
            report: RewriteReport::default(),
        }
    }

    pub fn context(&self) -> &ScopeContext {
        &self.context
    }

    /// Consume the rewriter, returning what it changed.
    pub fn into_report(mut self) -> RewriteReport {
        self.report.unmatched = self
            .injections
            .iter()
            .filter(|injection| !injection.applied)
            .map(|injection| format!("{}.{}", injection.config, injection.key))
            .collect();
        self.report
    }

    fn declaration_keyword(&self) -> &str {
        self.target
            .map_or(STATIC_LIBRARY, |target| target.declaration.as_str())
    }

    fn identifier<'src>(
        &mut self,
        token: Token<'src>,
        input: &mut TokenStream<'src>,
        output: &mut Emitter,
    ) -> Result<(), GnError> {
        let top_level = self.context.at_top_level();

        if top_level && token.is_identifier(CONFIG_KEYWORD) {
            let header = read_header(input)?;
            let name = header[1].unquoted().unwrap_or_default().to_string();
            debug!(config = %name, "entering config");

            output.emit(&token);
            output.emit_all(&header);
            self.report.configs_seen.push(name.clone());
            self.context.enter(Scope::InConfig(name));
            return Ok(());
        }

        if let Some(index) = self.matching_injection(&token) {
            output.emit(&token);
            let next = input.expect_any("a token after a list key")?;
            output.emit(&next);

            if next.is(TokenKind::Equals) {
                let injection = &self.injections[index];
                let appended =
                    inject_list(input, output, &injection.values, injection.ensure_absent)?;
                debug!(
                    config = injection.config,
                    key = injection.key,
                    appended,
                    "injected config values"
                );
                self.injections[index].applied = true;
                self.report.injected_values += appended;
            }
            return Ok(());
        }

        if self.context.in_target()
            && token.is_identifier(SOURCES_KEY)
            && !self.extra_sources.is_empty()
        {
            output.emit(&token);
            let next = input.expect_any("a token after a list key")?;
            output.emit(&next);

            if next.is(TokenKind::Equals) {
                let appended = inject_list(input, output, &self.extra_sources, false)?;
                debug!(appended, "injected extra sources");
                self.report.injected_sources += appended;
            }
            return Ok(());
        }

        if top_level && token.is_identifier(self.declaration_keyword()) {
            let header = read_header(input)?;
            let target = self
                .target
                .filter(|target| header[1].unquoted() == Some(target.name.as_str()));

            match target {
                Some(target) => {
                    debug!(
                        name = %target.name,
                        replacement = %target.replacement,
                        "rewriting target declaration"
                    );
                    output.emit(&token.replaced_text(target.replacement.clone()));
                    self.report.target_renamed = true;
                    self.context.enter(Scope::InTarget);
                }
                None => {
                    output.emit(&token);
                    self.context.enter(Scope::Scanning);
                }
            }
            output.emit_all(&header);
            return Ok(());
        }

        trace!(identifier = token.text(), depth = self.context.depth(), "pass");
        output.emit(&token);
        Ok(())
    }

    fn matching_injection(&self, token: &Token<'_>) -> Option<usize> {
        let config = self.context.config_name()?;
        self.injections
            .iter()
            .position(|injection| injection.config == config && token.is_identifier(injection.key))
    }
}

impl Rewrite for ScriptRewriter<'_> {
    fn produce_tokens<'src>(
        &mut self,
        input: &mut TokenStream<'src>,
        output: &mut Emitter,
    ) -> Result<(), GnError> {
        while let Some(token) = input.next_token()? {
            match token.kind() {
                TokenKind::BraceOpen => {
                    output.emit(&token);
                    self.context.open_brace();
                }
                TokenKind::BraceClose => {
                    output.emit(&token);
                    self.context.close_brace()?;
                }
                TokenKind::Identifier => self.identifier(token, input, output)?,
                _ => output.emit(&token),
            }
        }
        Ok(())
    }
}

/// Read `( "name" )` following a declaration keyword.
fn read_header<'src>(input: &mut TokenStream<'src>) -> Result<[Token<'src>; 3], GnError> {
    Ok([
        input.expect(TokenKind::ParenOpen)?,
        input.expect(TokenKind::String)?,
        input.expect(TokenKind::ParenClose)?,
    ])
}

/// Append `entries` to the list literal that follows an emitted `=`.
///
/// Existing entries pass through untouched. A comma is synthesized between
/// the last existing entry and the first new one unless the list is empty
/// or already ends with a comma. Returns how many entries were appended.
pub(crate) fn inject_list(
    input: &mut TokenStream<'_>,
    output: &mut Emitter,
    entries: &[Token<'_>],
    ensure_absent: bool,
) -> Result<usize, GnError> {
    let open = input.expect(TokenKind::BracketOpen)?;
    output.emit(&open);

    let mut had_element = false;
    let mut last_comma = false;
    let mut existing = Vec::new();

    let close = loop {
        let token = input.expect_any("']'")?;
        if token.is(TokenKind::BracketClose) {
            break token;
        }

        if token.is(TokenKind::Comma) {
            last_comma = true;
        } else {
            had_element = true;
            last_comma = false;
            if ensure_absent && token.is(TokenKind::String) {
                existing.extend(token.text().map(str::to_string));
            }
        }
        output.emit(&token);
    };

    let pending: Vec<&Token<'_>> = entries
        .iter()
        .filter(|entry| !existing.iter().any(|text| entry.text() == Some(text.as_str())))
        .collect();

    if !pending.is_empty() {
        if had_element && !last_comma {
            output.emit(&Token::synthetic(TokenKind::Comma));
        }
        for (idx, entry) in pending.iter().enumerate() {
            if idx > 0 {
                output.emit(&Token::synthetic(TokenKind::Comma));
            }
            output.emit(entry);
        }
    }

    output.emit(&close);
    Ok(pending.len())
}

/// Rewrite host path separators to `/`.
fn normalize_separators(path: &str) -> String {
    path.chars()
        .map(|c| {
            if c == '\\' || c == std::path::MAIN_SEPARATOR {
                '/'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigInjection;
    use crate::gn::rewrite;

    fn inject(source: &str, entries: &[&str]) -> String {
        struct ListOnly(Vec<Token<'static>>);

        impl Rewrite for ListOnly {
            fn produce_tokens<'src>(
                &mut self,
                input: &mut TokenStream<'src>,
                output: &mut Emitter,
            ) -> Result<(), GnError> {
                let key = input.expect(TokenKind::Identifier)?;
                output.emit(&key);
                let eq = input.expect(TokenKind::Equals)?;
                output.emit(&eq);
                inject_list(input, output, &self.0, false)?;
                while let Some(token) = input.next_token()? {
                    output.emit(&token);
                }
                Ok(())
            }
        }

        let tokens = entries.iter().map(|e| Token::string_literal(e)).collect();
        rewrite(&mut ListOnly(tokens), source).unwrap()
    }

    fn squash(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn list_injection_shapes() {
        let cases = [
            ("l = []", r#"l=["x","y"]"#),
            (r#"l = [ "a" ]"#, r#"l=["a","x","y"]"#),
            (r#"l = [ "a", ]"#, r#"l=["a","x","y"]"#),
            (r#"l = [ "a", "b" ]"#, r#"l=["a","b","x","y"]"#),
        ];
        for (input, expected) in cases {
            assert_eq!(squash(&inject(input, &["x", "y"])), expected, "input: {input}");
        }
    }

    #[test]
    fn list_injection_keeps_existing_formatting() {
        let input = "l = [\n  \"a\",  # first\n  \"b\",\n]\n";
        assert_eq!(
            inject(input, &["x"]),
            "l = [\n  \"a\",  # first\n  \"b\",\n\"x\"]\n"
        );
    }

    #[test]
    fn list_injection_requires_bracket() {
        let spec = EditSpec {
            configs: vec![ConfigInjection::new("c", "defines", ["X"])],
            target: None,
        };
        let mut rewriter = ScriptRewriter::new(&spec);
        let err = rewrite(&mut rewriter, "config(\"c\") { defines = foo }").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn unterminated_list_is_structural_error() {
        let spec = EditSpec {
            configs: vec![ConfigInjection::new("c", "defines", ["X"])],
            target: None,
        };
        let mut rewriter = ScriptRewriter::new(&spec);
        let err = rewrite(&mut rewriter, "config(\"c\") { defines = [ \"A\"").unwrap_err();
        assert_eq!(
            err,
            GnError::Structural {
                expected: "']'".to_string(),
                found: "end of input".to_string(),
            }
        );
    }

    #[test]
    fn ensure_absent_skips_present_values() {
        let spec = EditSpec {
            configs: vec![ConfigInjection::new("c", "defines", ["A", "B"]).ensure_absent()],
            target: None,
        };
        let mut rewriter = ScriptRewriter::new(&spec);
        let out = rewrite(&mut rewriter, "config(\"c\") { defines = [ \"A\" ] }").unwrap();
        assert_eq!(out, "config(\"c\") { defines = [ \"A\" ,\"B\"] }");
        assert_eq!(rewriter.into_report().injected_values, 1);
    }

    #[test]
    fn ensure_absent_with_nothing_missing_changes_nothing() {
        let spec = EditSpec {
            configs: vec![ConfigInjection::new("c", "defines", ["A"]).ensure_absent()],
            target: None,
        };
        let source = "config(\"c\") { defines = [ \"A\" ] }";
        let mut rewriter = ScriptRewriter::new(&spec);
        assert_eq!(rewrite(&mut rewriter, source).unwrap(), source);
        let report = rewriter.into_report();
        assert!(!report.changed());
        assert!(report.unmatched.is_empty());
    }

    #[test]
    fn append_operator_is_left_alone() {
        let spec = EditSpec {
            configs: vec![ConfigInjection::new("c", "defines", ["X"])],
            target: None,
        };
        let source = "config(\"c\") { defines += [ \"A\" ] }";
        let mut rewriter = ScriptRewriter::new(&spec);
        assert_eq!(rewrite(&mut rewriter, source).unwrap(), source);
        assert_eq!(rewriter.into_report().unmatched, vec!["c.defines"]);
    }

    #[test]
    fn separators_are_normalized() {
        assert_eq!(normalize_separators(r"contrib\win\a.cc"), "contrib/win/a.cc");
        assert_eq!(normalize_separators("contrib/a.cc"), "contrib/a.cc");
    }

    #[test]
    fn custom_declaration_keywords() {
        let mut target = TargetEdit::new("core").with_sources(["extra.cc"]);
        target.declaration = "source_set".to_string();
        target.replacement = "component".to_string();
        let spec = EditSpec {
            configs: Vec::new(),
            target: Some(target),
        };
        let mut rewriter = ScriptRewriter::new(&spec);
        let out = rewrite(
            &mut rewriter,
            "source_set(\"core\") { sources = [] }\nstatic_library(\"core\") {}\n",
        )
        .unwrap();
        assert_eq!(
            out,
            "component(\"core\") { sources = [\"extra.cc\"] }\nstatic_library(\"core\") {}\n"
        );
    }
}
