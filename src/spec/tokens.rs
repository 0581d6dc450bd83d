//! Tag-token grammar for path templates.
//!
//! Templates embed tokens of the form `{name}`, `{name<v1|v2>}`,
//! `{name|default}` or `{name<v1|v2>|default}`. Parsing is a single
//! immutable pass producing a token list; substitution happens later as a
//! pure pass over the simplified template, so no order-dependent string
//! mutation is involved.

use regex::Regex;

use super::TagDef;
use std::collections::HashMap;

/// One tag token as written in a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The full token text, e.g. `{session<01|02>|01}`
    pub raw: String,
    /// Tag name the token refers to
    pub name: String,
    /// Allowed values, empty when the token declares no `<...>` list
    pub valid: Vec<String>,
    /// Fallback value from the `|default` suffix
    pub default: Option<String>,
}

/// Compiled token grammar shared by all templates of a specification
#[derive(Debug, Clone)]
pub(crate) struct Tokenizer {
    token: Regex,
    optional: Regex,
    placeholder: Regex,
}

impl Tokenizer {
    /// # Panics
    /// The grammar regexes are fixed literals; compilation cannot fail.
    pub fn new() -> Self {
        Self {
            token: Regex::new(r"\{(\w*?)(?:<([^>]+)>)?(?:\|((?:\.?\w)+))?\}")
                .expect("token grammar regex is valid"),
            optional: Regex::new(r"\[.*?\]").expect("optional segment regex is valid"),
            placeholder: Regex::new(r"\{(\w+)\}").expect("placeholder regex is valid"),
        }
    }

    /// Parse all tag tokens of a template, left to right.
    ///
    /// Duplicate tag names are allowed; each occurrence is returned (and
    /// later substituted) independently.
    pub fn parse_tokens(&self, template: &str) -> Vec<Token> {
        self.token
            .captures_iter(template)
            .map(|caps| Token {
                raw: caps[0].to_string(),
                name: caps[1].to_string(),
                valid: caps
                    .get(2)
                    .map(|m| m.as_str().split('|').map(str::to_string).collect())
                    .unwrap_or_default(),
                default: caps.get(3).map(|m| m.as_str().to_string()),
            })
            .collect()
    }

    /// Replace every raw token with its normalized `{name}` placeholder.
    ///
    /// Single pure pass over the template; valid-value lists and defaults
    /// are judged against the parsed token list, not the template text.
    pub fn simplify(&self, template: &str) -> String {
        self.token
            .replace_all(template, |caps: &regex::Captures| format!("{{{}}}", &caps[1]))
            .into_owned()
    }

    /// Resolve bracket-delimited optional segments of a simplified template.
    ///
    /// A segment whose single placeholder is present in `resolved` keeps its
    /// content with the brackets stripped; otherwise the whole segment is
    /// removed.
    pub fn resolve_optional_segments(
        &self,
        simplified: &str,
        resolved: &HashMap<String, String>,
    ) -> String {
        let mut path = simplified.to_string();
        let segments: Vec<String> = self
            .optional
            .find_iter(&path)
            .map(|m| m.as_str().to_string())
            .collect();
        for segment in segments {
            let keep = self
                .placeholder
                .captures(&segment)
                .is_some_and(|caps| resolved.contains_key(&caps[1]));
            let replacement = if keep {
                segment[1..segment.len() - 1].to_string()
            } else {
                String::new()
            };
            path = path.replacen(&segment, &replacement, 1);
        }
        path
    }

    /// Collect the placeholder names remaining in a simplified template
    pub fn placeholders(&self, simplified: &str) -> Vec<String> {
        self.placeholder
            .captures_iter(simplified)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Substitute every placeholder with its resolved value.
    ///
    /// Callers must have checked that all placeholders resolve; unresolved
    /// names substitute to the empty string.
    pub fn substitute(&self, simplified: &str, resolved: &HashMap<String, String>) -> String {
        self.placeholder
            .replace_all(simplified, |caps: &regex::Captures| {
                resolved.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned()
    }

    /// True if the template contains an optional segment without exactly one
    /// placeholder, which the resolution pass cannot act on.
    pub fn find_degenerate_segment(&self, template: &str) -> Option<String> {
        self.optional
            .find_iter(template)
            .map(|m| m.as_str())
            .find(|seg| self.token.captures_iter(seg).count() != 1)
            .map(str::to_string)
    }
}

/// Extract tag values from a literal path using per-tag regexes.
///
/// Definitions are consulted in declared order; the first definition that
/// claims a tag name wins. Only the first capture group of the first match
/// is kept — a path matching a pattern in two places silently keeps the
/// first occurrence.
pub(crate) fn extract_tags(path: &str, defs: &[TagDef]) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    for def in defs {
        if tags.contains_key(&def.name) {
            continue;
        }
        if let Some(caps) = def.pattern.captures(path) {
            let value = caps.get(1).or_else(|| caps.get(0));
            if let Some(m) = value {
                tags.insert(def.name.clone(), m.as_str().to_string());
            }
        }
    }
    tags
}
