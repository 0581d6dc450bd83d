//! Specification engine: ordered tag definitions plus ordered path templates.
//!
//! A [`Specification`] answers three questions about a research-data tree:
//! which tags a path carries ([`Specification::extract_tags`]), what the
//! canonical path for a tag set is ([`Specification::build_path`]), and
//! whether an existing path already is canonical
//! ([`Specification::validate_path`]).
//!
//! Order matters in both lists: the first tag definition whose pattern
//! matches claims the tag, and the first path template that fully resolves
//! wins. This lets one specification describe many path shapes (with or
//! without an optional session level, say) without branching logic at the
//! call site.

pub mod definition;
pub mod error;
pub mod tokens;

pub use definition::SpecDefinition;
pub use error::SpecError;
pub use tokens::Token;

use regex::Regex;
use std::collections::{HashMap, HashSet};
use tokens::Tokenizer;
use tracing::{debug, warn};

/// One ordered tag definition of a specification
#[derive(Debug, Clone)]
pub struct TagDef {
    pub(crate) name: String,
    pub(crate) source: String,
    pub(crate) pattern: Regex,
    pub(crate) valid_values: Vec<String>,
    pub(crate) default: Option<String>,
}

impl TagDef {
    /// Compile a tag definition from its name and extraction regex.
    ///
    /// # Errors
    /// Returns [`SpecError::Pattern`] if the regex does not compile.
    pub fn new(name: &str, pattern: &str) -> Result<Self, SpecError> {
        let compiled = Regex::new(pattern).map_err(|e| SpecError::pattern(name, e))?;
        Ok(Self {
            name: name.to_string(),
            source: pattern.to_string(),
            pattern: compiled,
            valid_values: Vec::new(),
            default: None,
        })
    }

    /// Attach an allowed-value list to the definition.
    #[must_use]
    pub fn with_valid_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a default value to the definition.
    #[must_use]
    pub fn with_default<S: Into<String>>(mut self, default: S) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The regex source text this definition was compiled from
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.source
    }
}

/// Ordered tag definitions and path templates describing one layout standard
#[derive(Debug, Clone)]
pub struct Specification {
    name: String,
    tag_defs: Vec<TagDef>,
    path_templates: Vec<String>,
    tokenizer: Tokenizer,
}

impl Specification {
    /// Build a specification from already-compiled tag definitions.
    ///
    /// Templates are checked up front so that a structurally broken
    /// specification fails here and not in the middle of an indexing run.
    ///
    /// # Errors
    /// Returns [`SpecError::Template`] for unbalanced optional brackets or
    /// for an optional segment that does not contain exactly one tag token.
    pub fn new<S: Into<String>>(
        name: S,
        tag_defs: Vec<TagDef>,
        path_templates: Vec<String>,
    ) -> Result<Self, SpecError> {
        let tokenizer = Tokenizer::new();
        for template in &path_templates {
            check_brackets(template)?;
            if let Some(segment) = tokenizer.find_degenerate_segment(template) {
                return Err(SpecError::template(
                    template,
                    format!("optional segment '{segment}' must contain exactly one tag token"),
                ));
            }
        }
        Ok(Self {
            name: name.into(),
            tag_defs,
            path_templates,
            tokenizer,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared tag names, in definition order
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.tag_defs.iter().map(|d| d.name.as_str()).collect()
    }

    #[must_use]
    pub fn tag_defs(&self) -> &[TagDef] {
        &self.tag_defs
    }

    #[must_use]
    pub fn path_templates(&self) -> &[String] {
        &self.path_templates
    }

    /// Construct a path for a set of tags.
    ///
    /// Templates are tried in declared order and the first one that fully
    /// resolves wins. With `strict` set, a template is rejected outright
    /// when the caller supplies a tag it does not reference; without it,
    /// surplus tags are ignored and the first match is built from whatever
    /// the template needs.
    ///
    /// Returns `None` when no template resolves — callers must treat that
    /// as an ordinary outcome, not a failure.
    #[must_use]
    pub fn build_path(&self, tags: &HashMap<String, String>, strict: bool) -> Option<String> {
        debug!(spec = %self.name, ?tags, "building path");

        // Drop empty values so partial tag sets still resolve. A literal
        // "0" is a value like any other and stays.
        let mut tags: HashMap<String, String> = tags
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        // Work with extension with or without the leading dot
        if let Some(ext) = tags.get_mut("extension")
            && !ext.starts_with('.')
        {
            ext.insert(0, '.');
        }

        'templates: for template in &self.path_templates {
            let parsed = self.tokenizer.parse_tokens(template);

            // Leave the caller's tags untouched between templates
            let mut resolved = tags.clone();

            if strict {
                let referenced: HashSet<&str> = parsed.iter().map(|t| t.name.as_str()).collect();
                if resolved.keys().any(|name| !referenced.contains(name.as_str())) {
                    continue;
                }
            }

            for token in &parsed {
                if !token.valid.is_empty()
                    && let Some(value) = resolved.get(&token.name)
                    && !token.valid.contains(value)
                {
                    continue 'templates;
                }

                if let Some(default) = &token.default {
                    if !token.valid.is_empty() && !token.valid.contains(default) {
                        // Authoring mistake in the specification itself;
                        // the default is used regardless.
                        warn!(token = %token.raw, "default value is not in the token's valid values");
                    }
                    resolved
                        .entry(token.name.clone())
                        .or_insert_with(|| default.clone());
                }
            }

            let simplified = self.tokenizer.simplify(template);
            let path = self
                .tokenizer
                .resolve_optional_segments(&simplified, &resolved);

            if self
                .tokenizer
                .placeholders(&path)
                .iter()
                .any(|name| !resolved.contains_key(name))
            {
                continue;
            }

            let path = self.tokenizer.substitute(&path, &resolved);
            debug!(%path, "template resolved");
            return Some(path);
        }

        None
    }

    /// Extract tag name/value pairs from a path using the declared patterns.
    ///
    /// Tags whose pattern does not match are simply absent from the result.
    #[must_use]
    pub fn extract_tags(&self, path: &str) -> HashMap<String, String> {
        tokens::extract_tags(path, &self.tag_defs)
    }

    /// True when `path` is byte-identical to the canonical path built from
    /// its own extracted tags.
    ///
    /// Ambiguous, malformed or non-canonically padded paths fail this check
    /// even though tags can still be extracted from them.
    #[must_use]
    pub fn validate_path(&self, path: &str) -> bool {
        let tags = self.extract_tags(path);
        self.build_path(&tags, false).as_deref() == Some(path)
    }
}

/// Reject templates with nested or unbalanced optional brackets
fn check_brackets(template: &str) -> Result<(), SpecError> {
    let mut open = false;
    for c in template.chars() {
        match c {
            '[' if open => {
                return Err(SpecError::template(template, "nested optional brackets"));
            }
            '[' => open = true,
            ']' if !open => {
                return Err(SpecError::template(template, "unmatched closing bracket"));
            }
            ']' => open = false,
            _ => {}
        }
    }
    if open {
        return Err(SpecError::template(template, "unclosed optional bracket"));
    }
    Ok(())
}
