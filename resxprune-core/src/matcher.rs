//! Reference matching: does a file's text mention a resource key?
//!
//! A reference format is a template such as `AppResources.%` where `%`
//! stands for the key. In literal mode the rendered template is searched as
//! a plain substring; in regex mode it is compiled (once per distinct
//! pattern, see [`RegexCache`]) and searched as a regular expression.
//!
//! Formats are tried in their configured order and the first hit wins.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::{ResxError, ResxResult};

/// Token in a reference format that stands for the key.
pub const PLACEHOLDER: &str = "%";

/// Key substituted into every format when validating regex formats.
pub const VALIDATION_TOKEN: &str = "Test";

/// A non-blank reference format template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceFormat {
    template: String,
}

impl ReferenceFormat {
    /// Wrap a template. Returns `None` for blank input.
    pub fn new(template: impl Into<String>) -> Option<Self> {
        let template = template.into();
        if template.trim().is_empty() {
            None
        } else {
            Some(Self { template })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `key` verbatim for every placeholder.
    pub fn render(&self, key: &str) -> String {
        self.template.replace(PLACEHOLDER, key)
    }

    /// Build the regex source for `key`. The key is escaped so it always
    /// matches itself, whatever characters it contains.
    pub fn render_pattern(&self, key: &str) -> String {
        self.template.replace(PLACEHOLDER, &regex::escape(key))
    }
}

impl fmt::Display for ReferenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Literal substring search or regular expression search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Literal,
    Regex,
}

/// Compiled patterns keyed by their fully substituted source text.
///
/// Lives for one scan only: keys and formats change between runs.
#[derive(Debug, Default)]
pub struct RegexCache {
    patterns: HashMap<String, Regex>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled form of `pattern`, compiling it on first use.
    pub fn get_or_compile(&mut self, pattern: String, format: &ReferenceFormat) -> ResxResult<&Regex> {
        match self.patterns.entry(pattern) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let regex = Regex::new(entry.key())
                    .map_err(|e| ResxError::pattern(format.as_str(), e.to_string()))?;
                Ok(&*entry.insert(regex))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Check that every format compiles once the placeholder is filled in.
///
/// Runs before any file is read so that a bad expression never aborts a
/// scan halfway through.
pub fn validate_formats(formats: &[ReferenceFormat]) -> ResxResult<()> {
    for format in formats {
        let test_pattern = format.render(VALIDATION_TOKEN);
        if let Err(e) = Regex::new(&test_pattern) {
            return Err(ResxError::pattern(format.as_str(), e.to_string()));
        }
    }
    Ok(())
}

/// Tests keys against file text using the configured formats.
#[derive(Debug)]
pub struct ReferenceMatcher {
    formats: Vec<ReferenceFormat>,
    mode: MatchMode,
    cache: RegexCache,
}

impl ReferenceMatcher {
    pub fn new(formats: &[ReferenceFormat], mode: MatchMode) -> Self {
        Self {
            formats: formats.to_vec(),
            mode,
            cache: RegexCache::new(),
        }
    }

    /// Validate the formats for the current mode. Literal formats always pass.
    pub fn validate(&self) -> ResxResult<()> {
        match self.mode {
            MatchMode::Literal => Ok(()),
            MatchMode::Regex => validate_formats(&self.formats),
        }
    }

    /// Whether `text` references `key` through any format.
    pub fn is_referenced(&mut self, key: &str, text: &str) -> ResxResult<bool> {
        for format in &self.formats {
            let found = match self.mode {
                MatchMode::Literal => text.contains(&format.render(key)),
                MatchMode::Regex => self
                    .cache
                    .get_or_compile(format.render_pattern(key), format)?
                    .is_match(text),
            };

            if found {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn cache(&self) -> &RegexCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats(templates: &[&str]) -> Vec<ReferenceFormat> {
        templates.iter().filter_map(|t| ReferenceFormat::new(*t)).collect()
    }

    #[test]
    fn test_blank_format_rejected() {
        assert!(ReferenceFormat::new("").is_none());
        assert!(ReferenceFormat::new("   ").is_none());
        assert!(ReferenceFormat::new("%").is_some());
    }

    #[test]
    fn test_render_replaces_placeholder() {
        let format = ReferenceFormat::new("AppResources.%").unwrap();
        assert_eq!(format.render("Greeting"), "AppResources.Greeting");
    }

    #[test]
    fn test_render_pattern_escapes_key() {
        let format = ReferenceFormat::new(r"Res\.%\b").unwrap();
        assert_eq!(format.render_pattern("a.b"), r"Res\.a\.b\b");
    }

    #[test]
    fn test_literal_match_is_case_sensitive_substring() {
        let mut matcher = ReferenceMatcher::new(&formats(&["AppResources.%"]), MatchMode::Literal);
        assert!(matcher.is_referenced("Greeting", "x = AppResources.Greeting;").unwrap());
        assert!(!matcher.is_referenced("Greeting", "x = appresources.greeting;").unwrap());
        assert!(!matcher.is_referenced("Farewell", "x = AppResources.Greeting;").unwrap());
    }

    #[test]
    fn test_literal_bare_key_format() {
        let mut matcher = ReferenceMatcher::new(&formats(&["%"]), MatchMode::Literal);
        assert!(matcher.is_referenced("Greeting", "show(Greeting)").unwrap());
    }

    #[test]
    fn test_any_format_matches() {
        let mut matcher = ReferenceMatcher::new(
            &formats(&["AppResources.%", "{x:Static res:AppResources.%}"]),
            MatchMode::Literal,
        );
        assert!(matcher
            .is_referenced("Title", r#"<Label Text="{x:Static res:AppResources.Title}" />"#)
            .unwrap());
    }

    #[test]
    fn test_regex_match() {
        let mut matcher = ReferenceMatcher::new(&formats(&[r"Res\.%"]), MatchMode::Regex);
        assert!(matcher.is_referenced("Farewell", "label = Res.Farewell;").unwrap());
        assert!(!matcher.is_referenced("Greeting", "label = Res.Farewell;").unwrap());
    }

    #[test]
    fn test_regex_key_is_literal() {
        let mut matcher = ReferenceMatcher::new(&formats(&["%"]), MatchMode::Regex);
        // An unescaped `.` would match `aXb`.
        assert!(!matcher.is_referenced("a.b", "aXb").unwrap());
        assert!(matcher.is_referenced("a.b", "a.b").unwrap());
        assert!(matcher.is_referenced("Key(1)", "Key(1)").unwrap());
    }

    #[test]
    fn test_regex_cache_reuse() {
        let mut matcher = ReferenceMatcher::new(&formats(&[r"Res\.%"]), MatchMode::Regex);
        matcher.is_referenced("A", "Res.A").unwrap();
        matcher.is_referenced("A", "other file").unwrap();
        matcher.is_referenced("B", "Res.B").unwrap();
        assert_eq!(matcher.cache().len(), 2);
    }

    #[test]
    fn test_literal_mode_never_compiles() {
        let mut matcher = ReferenceMatcher::new(&formats(&["Res.(%"]), MatchMode::Literal);
        assert!(matcher.validate().is_ok());
        assert!(matcher.is_referenced("A", "Res.(A").unwrap());
        assert!(matcher.cache().is_empty());
    }

    #[test]
    fn test_validate_rejects_unbalanced_group() {
        let matcher = ReferenceMatcher::new(&formats(&[r"Res\.%", r"Res\.(%"]), MatchMode::Regex);
        let err = matcher.validate().unwrap_err();
        match err {
            ResxError::Pattern { format, .. } => assert_eq!(format, r"Res\.(%"),
            other => panic!("Expected pattern error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_good_formats() {
        assert!(validate_formats(&formats(&[r"Res\.%\b", r#"GetString\("%"\)"#])).is_ok());
    }
}
