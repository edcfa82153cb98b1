use crate::script::{SHARED_LIBRARY, STATIC_LIBRARY};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// What to change in a build script.
///
/// The default spec changes nothing: rewriting with it reproduces the input.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct EditSpec {
    #[serde(default)]
    pub configs: Vec<ConfigInjection>,
    #[serde(default)]
    pub target: Option<TargetEdit>,
}

/// Values appended to a list key inside a named `config("...")` block.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConfigInjection {
    pub config: String,
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
    /// Skip values already present as string entries of the list.
    #[serde(default)]
    pub ensure_absent: bool,
}

/// The build target whose declaration is flipped and whose sources grow.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TargetEdit {
    pub name: String,
    #[serde(default)]
    pub extra_sources: Vec<String>,
    #[serde(default = "default_declaration")]
    pub declaration: String,
    #[serde(default = "default_replacement")]
    pub replacement: String,
}

fn default_declaration() -> String {
    STATIC_LIBRARY.to_string()
}

fn default_replacement() -> String {
    SHARED_LIBRARY.to_string()
}

impl TargetEdit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra_sources: Vec::new(),
            declaration: default_declaration(),
            replacement: default_replacement(),
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_sources.extend(sources.into_iter().map(Into::into));
        self
    }
}

impl ConfigInjection {
    pub fn new<I, S>(config: impl Into<String>, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            config: config.into(),
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
            ensure_absent: false,
        }
    }

    pub fn ensure_absent(mut self) -> Self {
        self.ensure_absent = true;
        self
    }
}

impl EditSpec {
    /// The stock PDFium edit set: export symbols from a shared `pdfium`
    /// library and make the V8 headers visible.
    ///
    /// Config values already present are not added again, so applying the
    /// set to its own output changes nothing.
    pub fn pdfium<I, S>(extra_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            configs: vec![
                ConfigInjection::new("pdfium_common_config", "include_dirs", ["v8/include"])
                    .ensure_absent(),
                ConfigInjection::new("pdfium_common_config", "defines", ["FPDFSDK_EXPORTS"])
                    .ensure_absent(),
            ],
            target: Some(TargetEdit::new("pdfium").with_sources(extra_sources)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty() && self.target.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for injection in &self.configs {
            let location = format!("{}.{}", injection.config, injection.key);

            if injection.config.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    context: location.clone(),
                    field: "config",
                });
            }
            if injection.key.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    context: location.clone(),
                    field: "key",
                });
            } else if !is_identifier(&injection.key) {
                issues.push(ValidationIssue::NotAnIdentifier {
                    context: location.clone(),
                    value: injection.key.clone(),
                });
            }
            if injection.values.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    context: location.clone(),
                    field: "values",
                });
            }
            if !seen.insert((injection.config.as_str(), injection.key.as_str())) {
                issues.push(ValidationIssue::InvalidCombo {
                    context: location,
                    message: "config key listed more than once".to_string(),
                });
            }
        }

        if let Some(target) = &self.target {
            let context = format!("target {}", target.name);

            if target.name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    context: context.clone(),
                    field: "name",
                });
            }
            for (field, value) in [
                ("declaration", &target.declaration),
                ("replacement", &target.replacement),
            ] {
                if !is_identifier(value) {
                    issues.push(ValidationIssue::NotAnIdentifier {
                        context: format!("{context} {field}"),
                        value: value.clone(),
                    });
                }
            }
            if target.extra_sources.iter().any(|path| path.trim().is_empty()) {
                issues.push(ValidationIssue::MissingField {
                    context,
                    field: "extra_sources[]",
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        context: String,
        field: &'static str,
    },
    NotAnIdentifier {
        context: String,
        value: String,
    },
    InvalidCombo {
        context: String,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { context, field } => {
                write!(f, "{context}: missing required field '{field}'")
            }
            ValidationIssue::NotAnIdentifier { context, value } => {
                write!(f, "{context}: '{value}' is not a valid GN identifier")
            }
            ValidationIssue::InvalidCombo { context, message } => {
                write!(f, "{context}: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_is_empty_and_valid() {
        let spec = EditSpec::default();
        assert!(spec.is_empty());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn pdfium_spec_is_valid() {
        let spec = EditSpec::pdfium(["contrib/a.cc"]);
        assert!(spec.validate().is_ok());
        let target = spec.target.unwrap();
        assert_eq!(target.declaration, "static_library");
        assert_eq!(target.replacement, "shared_library");
        assert_eq!(target.extra_sources, vec!["contrib/a.cc"]);
        assert!(spec.configs.iter().all(|injection| injection.ensure_absent));
    }

    #[test]
    fn duplicate_config_keys_rejected() {
        let spec = EditSpec {
            configs: vec![
                ConfigInjection::new("c", "defines", ["A"]),
                ConfigInjection::new("c", "defines", ["B"]),
            ],
            target: None,
        };
        let err = spec.validate().unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn reports_every_issue() {
        let mut target = TargetEdit::new("");
        target.replacement = "shared-library".to_string();
        let spec = EditSpec {
            configs: vec![ConfigInjection::new("c", "1key", Vec::<String>::new())],
            target: Some(target),
        };
        let err = spec.validate().unwrap_err();
        assert_eq!(err.issues.len(), 4);
    }
}
