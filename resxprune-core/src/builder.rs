//! Fluent construction of the per-run scan configuration.
//!
//! A [`ScanConfig`] is an immutable snapshot: the finder reads it once at
//! the start of a scan and never looks at it again.
//!
//! ```rust,ignore
//! use resxprune_core::prelude::*;
//!
//! let config = ScanConfig::new("/path/to/project", "/path/to/Strings.resx")
//!     .with_extensions_csv(".cs,.xaml")
//!     .with_reference_formats(["AppResources.%", "{x:Static res:AppResources.%}"])
//!     .with_exclude_prefixes_csv("Legacy_,Generated")
//!     .use_regex(false);
//!
//! let unused = find_unused(&config)?;
//! ```

use std::path::{Path, PathBuf};

use crate::matcher::{MatchMode, ReferenceFormat};
use crate::scan::normalize_extension;

/// Extensions scanned when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".cs", ".xaml"];

/// Reference format used when none is configured.
pub const DEFAULT_REFERENCE_FORMAT: &str = "AppResources.%";

/// Everything a single scan needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Root of the source tree to search
    project_root: PathBuf,

    /// The `.resx` file whose keys are checked
    resource_file: PathBuf,

    /// File suffixes to scan, each starting with `.`
    extensions: Vec<String>,

    /// Templates tried in order for every key
    reference_formats: Vec<ReferenceFormat>,

    /// Keys starting with any of these are never reported
    exclude_prefixes: Vec<String>,

    /// Treat reference formats as regular expressions
    use_regex: bool,
}

impl ScanConfig {
    /// Create a configuration with the default extensions and format.
    pub fn new(project_root: impl Into<PathBuf>, resource_file: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            resource_file: resource_file.into(),
            extensions: default_extensions(),
            reference_formats: default_reference_formats(),
            exclude_prefixes: Vec::new(),
            use_regex: false,
        }
    }

    /// Replace the project root.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Replace the resource file.
    pub fn with_resource_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.resource_file = path.into();
        self
    }

    /// Set the scanned extensions. A missing leading `.` is added.
    ///
    /// An empty list falls back to [`DEFAULT_EXTENSIONS`].
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(Into::into)
            .filter(|e| !e.trim().is_empty())
            .map(|e| normalize_extension(e.trim()))
            .collect();

        self.extensions = if extensions.is_empty() {
            default_extensions()
        } else {
            extensions
        };
        self
    }

    /// Set the scanned extensions from a comma-separated list.
    pub fn with_extensions_csv(self, csv: &str) -> Self {
        self.with_extensions(split_list(csv))
    }

    /// Set the reference formats. Blank templates are dropped; if nothing
    /// remains the default format is used.
    pub fn with_reference_formats(
        mut self,
        formats: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let formats: Vec<ReferenceFormat> = formats
            .into_iter()
            .filter_map(ReferenceFormat::new)
            .collect();

        self.reference_formats = if formats.is_empty() {
            default_reference_formats()
        } else {
            formats
        };
        self
    }

    /// Set the excluded key prefixes.
    pub fn with_exclude_prefixes(
        mut self,
        prefixes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.exclude_prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Set the excluded key prefixes from a comma-separated list.
    pub fn with_exclude_prefixes_csv(self, csv: &str) -> Self {
        self.with_exclude_prefixes(split_list(csv))
    }

    /// Enable or disable regex reference formats.
    pub fn use_regex(mut self, enabled: bool) -> Self {
        self.use_regex = enabled;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn resource_file(&self) -> &Path {
        &self.resource_file
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn reference_formats(&self) -> &[ReferenceFormat] {
        &self.reference_formats
    }

    pub fn exclude_prefixes(&self) -> &[String] {
        &self.exclude_prefixes
    }

    pub fn uses_regex(&self) -> bool {
        self.use_regex
    }

    /// How reference formats are matched against file text.
    pub fn match_mode(&self) -> MatchMode {
        if self.use_regex {
            MatchMode::Regex
        } else {
            MatchMode::Literal
        }
    }
}

/// Split a comma-separated setting, trimming items and dropping empties.
pub fn split_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_reference_formats() -> Vec<ReferenceFormat> {
    ReferenceFormat::new(DEFAULT_REFERENCE_FORMAT)
        .into_iter()
        .collect()
}
