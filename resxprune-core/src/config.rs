//! Configuration loading from resxprune.toml.
//!
//! Every field is optional. List fields take either a TOML array or a
//! single comma-separated string:
//!
//! ```toml
//! resource_file = "Resources/AppResources.resx"
//! extensions = ".cs,.xaml"
//! reference_formats = ["AppResources.%", "{x:Static res:AppResources.%}"]
//! exclude_prefixes = ["Legacy_"]
//! use_regex = false
//! ```

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::builder::{split_list, ScanConfig};
use crate::error::{IoResultExt, ResxError, ResxResult};

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "resxprune.toml";

/// Main configuration structure for resxprune.toml.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResxPruneConfig {
    /// Resource file, relative to the config file's directory unless absolute.
    pub resource_file: Option<PathBuf>,
    pub extensions: Option<ListSetting>,
    pub reference_formats: Option<ListSetting>,
    pub exclude_prefixes: Option<ListSetting>,
    pub use_regex: Option<bool>,
}

/// A list given as an array or as one comma-separated string.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ListSetting {
    List(Vec<String>),
    Csv(String),
}

impl ListSetting {
    /// Items with surrounding whitespace removed and blanks dropped.
    pub fn into_items(self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Self::Csv(csv) => split_list(&csv),
        }
    }
}

impl ResxPruneConfig {
    /// The configured resource file resolved against `base_dir`.
    pub fn resource_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.resource_file.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                base_dir.join(p)
            }
        })
    }

    /// Layer the file's settings over `config`. Absent fields leave it as is.
    ///
    /// The resource file is not applied here since it needs a base directory;
    /// see [`resource_path`](Self::resource_path).
    pub fn apply_to(&self, mut config: ScanConfig) -> ScanConfig {
        if let Some(extensions) = &self.extensions {
            config = config.with_extensions(extensions.clone().into_items());
        }
        if let Some(formats) = &self.reference_formats {
            // Formats are templates; only blank ones are dropped.
            let formats = match formats.clone() {
                ListSetting::List(items) => items,
                ListSetting::Csv(csv) => split_list(&csv),
            };
            config = config.with_reference_formats(formats);
        }
        if let Some(prefixes) = &self.exclude_prefixes {
            config = config.with_exclude_prefixes(prefixes.clone().into_items());
        }
        if let Some(use_regex) = self.use_regex {
            config = config.use_regex(use_regex);
        }
        config
    }
}

/// Loads configuration from resxprune.toml in `root` if it exists.
pub fn load_config(root: &Path) -> ResxResult<Option<ResxPruneConfig>> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Loads configuration from an explicit path. The file must exist.
pub fn load_config_file(path: &Path) -> ResxResult<ResxPruneConfig> {
    let content = fs::read_to_string(path).with_path(path, "Could not read config file")?;
    toml::from_str(&content).map_err(|e| ResxError::config(path, format!("Invalid {}: {}", CONFIG_FILE_NAME, e)))
}
