//! Tag-foraging rules for reorganizing unstructured source trees.
//!
//! Reorganization takes files that do not yet follow a specification,
//! forages a tag set for each one through a list of [`TagRule`]s, and asks
//! the specification for the canonical destination path. Only planning
//! happens here — the caller walks the source tree and copies files; this
//! module turns candidate paths into `(source, destination)` pairs.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::spec::Specification;

#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule or planner regex does not compile
    #[error("Invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A value-mapping file could not be read or parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The mapping file lacks a referenced column
    #[error("Column '{0}' not found in mapping file")]
    MissingColumn(String),

    /// I/O error while reading a mapping file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for cleaner function signatures
pub type Result<T> = std::result::Result<T, RuleError>;

/// Which side of the value a pad fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadDirection {
    Left,
    Right,
}

/// Fixed-width padding applied to a foraged value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadSpec {
    pub length: usize,
    pub fill: char,
    pub direction: PadDirection,
}

impl PadSpec {
    /// Left-pad to `length` with zeroes, the common case for run numbers
    #[must_use]
    pub const fn zeroes(length: usize) -> Self {
        Self {
            length,
            fill: '0',
            direction: PadDirection::Left,
        }
    }

    fn apply(&self, value: &str) -> String {
        if value.len() >= self.length {
            return value.to_string();
        }
        let fill = self.fill.to_string().repeat(self.length - value.len());
        match self.direction {
            PadDirection::Left => format!("{fill}{value}"),
            PadDirection::Right => format!("{value}{fill}"),
        }
    }
}

/// Case folding applied to a foraged value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFold {
    Lower,
    Upper,
}

/// CSV-backed translation table for foraged values
///
/// Built from a mapping file with named columns; lookups must be unique.
/// A value with no mapping or with several candidate rows yields `None` so
/// one bad row never derails a whole reorganization run.
#[derive(Debug, Clone)]
pub struct ValueMap {
    entries: HashMap<String, Vec<String>>,
}

impl ValueMap {
    /// Read a mapping from a CSV file, translating column `col` to column
    /// `with`.
    ///
    /// # Errors
    /// Returns `RuleError::Csv` for unreadable or malformed CSV and
    /// `RuleError::MissingColumn` when either column is absent.
    pub fn from_csv(path: &Path, col: &str, with: &str) -> Result<Self> {
        info!(path = %path.display(), "reading value mapping");
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let key_idx = headers
            .iter()
            .position(|h| h == col)
            .ok_or_else(|| RuleError::MissingColumn(col.to_string()))?;
        let value_idx = headers
            .iter()
            .position(|h| h == with)
            .ok_or_else(|| RuleError::MissingColumn(with.to_string()))?;

        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for record in reader.records() {
            let record = record?;
            if let (Some(key), Some(value)) = (record.get(key_idx), record.get(value_idx)) {
                entries
                    .entry(key.to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }
        Ok(Self { entries })
    }

    fn lookup(&self, value: &str) -> Option<String> {
        match self.entries.get(value).map(Vec::as_slice) {
            Some([mapped]) => Some(mapped.clone()),
            Some(_) => {
                warn!(value, "expected unique mapping, found many");
                None
            }
            None => {
                warn!(value, "no mapping found");
                None
            }
        }
    }
}

/// One foraging rule producing a value for a named tag
#[derive(Debug, Clone)]
pub struct TagRule {
    name: String,
    value: Option<String>,
    pattern: Option<Regex>,
    prepend: Option<String>,
    length: Option<usize>,
    iffy_prepend: Option<String>,
    pad: Option<PadSpec>,
    case: Option<CaseFold>,
    default: Option<String>,
    map: Option<ValueMap>,
}

impl TagRule {
    fn base(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            pattern: None,
            prepend: None,
            length: None,
            iffy_prepend: None,
            pad: None,
            case: None,
            default: None,
            map: None,
        }
    }

    /// Rule that marks every candidate with the same fixed value
    #[must_use]
    pub fn fixed(name: &str, value: &str) -> Self {
        let mut rule = Self::base(name);
        rule.value = Some(value.to_string());
        rule
    }

    /// Rule that forages the value from the candidate path with a regex.
    ///
    /// When the path matches in several places the **last** match is taken;
    /// foraging looks at messy source names where trailing components carry
    /// the signal.
    ///
    /// # Errors
    /// Returns `RuleError::Pattern` if the regex does not compile.
    pub fn from_pattern(name: &str, pattern: &str) -> Result<Self> {
        let mut rule = Self::base(name);
        rule.pattern = Some(Regex::new(pattern)?);
        Ok(rule)
    }

    /// Prefix the foraged value
    #[must_use]
    pub fn prepend(mut self, prefix: &str) -> Self {
        self.prepend = Some(prefix.to_string());
        self
    }

    /// Require an exact value length; a short value gets one rescue prefix
    /// before being discarded.
    #[must_use]
    pub fn expect_length(mut self, length: usize, iffy_prepend: Option<&str>) -> Self {
        self.length = Some(length);
        self.iffy_prepend = iffy_prepend.map(str::to_string);
        self
    }

    #[must_use]
    pub fn pad(mut self, pad: PadSpec) -> Self {
        self.pad = Some(pad);
        self
    }

    #[must_use]
    pub fn case(mut self, case: CaseFold) -> Self {
        self.case = Some(case);
        self
    }

    /// Fallback when foraging yields nothing
    #[must_use]
    pub fn default_value(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Translate the foraged value through a mapping table
    #[must_use]
    pub fn map(mut self, map: ValueMap) -> Self {
        self.map = Some(map);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forage a value for this rule's tag from a candidate path.
    ///
    /// Transformations apply in declared order: pattern match (last match
    /// wins), prepend, length check, pad, case fold, default, mapping.
    /// Returns `None` when nothing usable remains.
    #[must_use]
    pub fn forage(&self, path: &str) -> Option<String> {
        if let Some(value) = &self.value {
            debug!(tag = %self.name, %value, "rule sets fixed value");
            return Some(value.clone());
        }

        let mut value = self.pattern.as_ref().and_then(|re| {
            let matches: Vec<&str> = re
                .captures_iter(path)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
                .map(|m| m.as_str())
                .collect();
            if matches.len() > 1 {
                warn!(tag = %self.name, path, "expected single match, found more");
            }
            matches.last().map(|m| (*m).to_string())
        });

        if let (Some(prefix), Some(v)) = (&self.prepend, value.as_mut()) {
            v.insert_str(0, prefix);
        }

        if let Some(expected) = self.length
            && let Some(mut v) = value.take()
        {
            if v.len() != expected
                && let Some(iffy) = &self.iffy_prepend
            {
                debug!(tag = %self.name, "insufficient length, prepending");
                v.insert_str(0, iffy);
            }
            value = (v.len() == expected).then_some(v);
        }

        if let (Some(pad), Some(v)) = (&self.pad, value.as_mut()) {
            *v = pad.apply(v);
        }

        if let (Some(case), Some(v)) = (&self.case, value.as_mut()) {
            *v = match case {
                CaseFold::Lower => v.to_lowercase(),
                CaseFold::Upper => v.to_uppercase(),
            };
        }

        if value.is_none()
            && let Some(default) = &self.default
        {
            debug!(tag = %self.name, %default, "using default value");
            value = Some(default.clone());
        }

        if let Some(map) = &self.map {
            value = value.and_then(|v| map.lookup(&v));
        }

        if value.is_none() {
            warn!(tag = %self.name, path, "no value foraged");
        }
        value
    }
}

/// Re-tagging of fellow files whose name matches a target pattern
#[derive(Debug, Clone)]
pub struct RenameRule {
    target: Regex,
    suffix: String,
}

impl RenameRule {
    /// # Errors
    /// Returns `RuleError::Pattern` if the target regex does not compile.
    pub fn new(target: &str, suffix: &str) -> Result<Self> {
        Ok(Self {
            target: Regex::new(target)?,
            suffix: suffix.to_string(),
        })
    }
}

/// One planned relocation: where a candidate file should land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: String,
    pub destination: String,
    /// The foraged tags the destination was built from
    pub tags: HashMap<String, String>,
}

/// Plans destination paths for candidates against a specification
#[derive(Debug)]
pub struct OrganizePlanner<'a> {
    specification: &'a Specification,
    pattern: Regex,
    tag_rules: Vec<TagRule>,
    rename_rules: Vec<RenameRule>,
}

impl<'a> OrganizePlanner<'a> {
    /// Create a planner; `pattern` is matched against candidate file names
    /// from the start of the name.
    ///
    /// # Errors
    /// Returns `RuleError::Pattern` if the name pattern does not compile.
    pub fn new(specification: &'a Specification, pattern: &str) -> Result<Self> {
        Ok(Self {
            specification,
            pattern: Regex::new(pattern)?,
            tag_rules: Vec::new(),
            rename_rules: Vec::new(),
        })
    }

    #[must_use]
    pub fn tag_rules(mut self, rules: Vec<TagRule>) -> Self {
        self.tag_rules = rules;
        self
    }

    #[must_use]
    pub fn rename_rules(mut self, rules: Vec<RenameRule>) -> Self {
        self.rename_rules = rules;
        self
    }

    /// Plan destinations for every candidate whose file name matches.
    ///
    /// Candidates that forage no buildable tag set are skipped with a
    /// warning rather than failing the run.
    #[must_use]
    pub fn plan<I, S>(&self, candidates: I) -> Vec<PlannedMove>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut moves = Vec::new();
        for candidate in candidates {
            let source = candidate.as_ref();
            let name = Path::new(source)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let matched = self
                .pattern
                .find(&name)
                .is_some_and(|m| m.start() == 0);
            if !matched {
                continue;
            }
            info!(source, "found match with file");

            let mut tags = HashMap::new();
            for rule in &self.tag_rules {
                if let Some(value) = rule.forage(source) {
                    debug!(source, tag = rule.name(), %value, "file marked");
                    tags.insert(rule.name().to_string(), value);
                }
            }

            match self.specification.build_path(&tags, false) {
                Some(destination) => moves.push(PlannedMove {
                    source: source.to_string(),
                    destination,
                    tags,
                }),
                None => warn!(source, "unable to build destination path"),
            }
        }
        moves
    }

    /// Plan a fellow file that accompanies an already-planned move.
    ///
    /// The fellow inherits the base tags, takes its own extension, and has
    /// its `suffix` re-tagged by the first matching rename rule.
    #[must_use]
    pub fn plan_fellow(
        &self,
        fellow: &str,
        base_tags: &HashMap<String, String>,
    ) -> Option<PlannedMove> {
        let mut tags = base_tags.clone();
        let extension = Path::new(fellow)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        tags.insert("extension".to_string(), extension);

        for rule in &self.rename_rules {
            if rule.target.is_match(fellow) {
                debug!(fellow, suffix = %rule.suffix, "fellow re-tagged");
                tags.insert("suffix".to_string(), rule.suffix.clone());
            }
        }

        match self.specification.build_path(&tags, false) {
            Some(destination) => Some(PlannedMove {
                source: fellow.to_string(),
                destination,
                tags,
            }),
            None => {
                warn!(fellow, "unable to build destination path for fellow");
                None
            }
        }
    }
}
