//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use resxprune_core::prelude::*;
//! ```

// Errors
pub use crate::error::{ResxError, ResxResult};

// Resource documents
pub use crate::resource::{ResourceDocument, ResourceEntry};

// Configuration
pub use crate::builder::ScanConfig;
pub use crate::config::{load_config, load_config_file, ResxPruneConfig};

// Matching
pub use crate::matcher::{MatchMode, ReferenceFormat};

// Scanning
pub use crate::finder::{find_unused, CancelFlag, ScanPhase, ScanResult, ScanStats, UnusedFinder};

// Deletion
#[cfg(feature = "delete")]
pub use crate::delete::delete_entries;
