//! resxprune-core: find and remove unused .resx localization entries
//!
//! A scan loads every key of a `.resx` resource file, drops keys with an
//! excluded prefix, and searches a project's source files for references
//! to the rest. References are described by templates such as
//! `AppResources.%`, where `%` stands for the key, matched either as plain
//! text or as regular expressions. Whatever is never found is reported as
//! unused and can be deleted from the resource file.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use resxprune_core::prelude::*;
//!
//! let config = ScanConfig::new("/path/to/project", "/path/to/Strings.resx")
//!     .with_reference_formats(["AppResources.%"]);
//!
//! let mut finder = UnusedFinder::new();
//! for result in finder.scan(&config)? {
//!     println!("Unused: {} = {}", result.key(), result.value());
//! }
//! finder.delete_all()?;
//! ```
//!
//! # Module Organization
//!
//! - [`resource`]: `.resx` loading, entry removal and atomic saving
//! - [`filter`]: key prefix exclusion
//! - [`scan`]: source file discovery
//! - [`matcher`]: reference formats and the per-scan regex cache
//! - [`finder`]: the scan state machine and its results
//! - [`delete`]: two-phase deletion from the resource file
//! - [`builder`]: fluent scan configuration
//! - [`config`]: `resxprune.toml` loading
//! - [`error`]: typed error handling
//!
//! # Cargo Features
//!
//! - `delete` (default): enable removal of entries from the resource file

pub mod builder;
pub mod config;
pub mod error;
pub mod filter;
pub mod finder;
pub mod logging;
pub mod matcher;
pub mod prelude;
pub mod report;
pub mod resource;
pub mod scan;

// Feature-gated modules
#[cfg(feature = "delete")]
pub mod delete;

// ============================================================================
// Explicit Re-exports
// ============================================================================

// Error types
pub use error::{IoResultExt, ResxError, ResxResult};

// Configuration
pub use builder::{split_list, ScanConfig, DEFAULT_EXTENSIONS, DEFAULT_REFERENCE_FORMAT};
pub use config::{load_config, load_config_file, ListSetting, ResxPruneConfig, CONFIG_FILE_NAME};

// Resource documents
pub use resource::{DataElement, ResourceDocument, ResourceEntry};

// Filtering, discovery and matching
pub use filter::{filter_excluded, is_excluded};
pub use matcher::{validate_formats, MatchMode, ReferenceFormat, ReferenceMatcher, RegexCache};
pub use scan::{gather_source_files, has_extension, normalize_extension};

// Scanning
pub use finder::{find_unused, CancelFlag, ScanPhase, ScanResult, ScanStats, UnusedFinder};

// Logging
pub use logging::{init_structured_logging, log_info, log_warn};

// Reporting
pub use report::{keys_text, print_json, print_plain, render_json, render_plain};

// Feature-gated re-exports
#[cfg(feature = "delete")]
pub use delete::delete_entries;
