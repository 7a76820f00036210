//! Scan orchestration: from a resource file and a source tree to the list
//! of unused entries.
//!
//! A scan walks a fixed sequence of phases:
//!
//! `Idle -> ValidatingPatterns -> LoadingKeys -> EnumeratingFiles -> Matching
//! -> PopulatingValues -> Done`, or `Failed` from any of them.
//!
//! All work happens on local state; the finder's key set and result list
//! are replaced only once a scan reaches `Done`. A failed scan therefore
//! leaves the previous results exactly as they were.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::builder::ScanConfig;
use crate::error::{IoResultExt, ResxError, ResxResult};
use crate::filter::filter_excluded;
use crate::matcher::ReferenceMatcher;
use crate::resource::{ResourceDocument, ResourceEntry};
use crate::scan::gather_source_files;

/// Where a scan currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ScanPhase {
    #[default]
    Idle,
    ValidatingPatterns,
    LoadingKeys,
    EnumeratingFiles,
    Matching,
    PopulatingValues,
    Done,
    Failed,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ValidatingPatterns => write!(f, "validating patterns"),
            Self::LoadingKeys => write!(f, "populating search list"),
            Self::EnumeratingFiles => write!(f, "populating file list"),
            Self::Matching => write!(f, "finding unused keys"),
            Self::PopulatingValues => write!(f, "getting resource values"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// An unused entry plus caller-owned selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    #[serde(flatten)]
    pub entry: ResourceEntry,
    #[serde(skip)]
    pub selected: bool,
}

impl ScanResult {
    pub fn new(entry: ResourceEntry) -> Self {
        Self {
            entry,
            selected: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.entry.key
    }

    pub fn value(&self) -> &str {
        &self.entry.value
    }
}

/// Counters from the last successful scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Distinct keys in the resource file
    pub total_keys: usize,
    /// Keys dropped by the prefix filter
    pub excluded_keys: usize,
    /// Source files read
    pub files_scanned: usize,
    /// Keys found in at least one file
    pub referenced_keys: usize,
    /// Keys left over
    pub unused_keys: usize,
}

/// Cooperative cancellation, checked before each file is read.
///
/// Clones share the same flag, so one can be handed to another thread
/// while the scan runs. A raised flag stays raised: every scan fails with
/// [`ResxError::Cancelled`] until [`reset`](Self::reset) is called.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the running scan.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What a successful scan produced, before it is committed.
struct ScanOutcome {
    remaining: HashSet<String>,
    results: Vec<ScanResult>,
    stats: ScanStats,
}

/// Owns the unused-key set and result list between operations.
///
/// Scans and deletes take `&mut self`, so they can never overlap on the same
/// finder.
#[derive(Debug, Default)]
pub struct UnusedFinder {
    phase: ScanPhase,
    pub(crate) remaining: HashSet<String>,
    pub(crate) results: Vec<ScanResult>,
    stats: ScanStats,
    resource_file: Option<PathBuf>,
    cancel: CancelFlag,
}

impl UnusedFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally created cancellation flag, e.g. one shared by
    /// several finders.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    /// A handle that can cancel scans run by this finder.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    /// Unused entries from the last successful scan, in document order,
    /// minus anything deleted or excluded since.
    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    /// Keys still considered unused.
    pub fn remaining_keys(&self) -> &HashSet<String> {
        &self.remaining
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Resource file of the last successful scan.
    pub fn resource_file(&self) -> Option<&Path> {
        self.resource_file.as_deref()
    }

    /// Run a full scan with `config`.
    ///
    /// On success the new results replace the old ones. On failure the
    /// phase becomes [`ScanPhase::Failed`] and the previous results stay.
    /// The cancellation flag is not cleared here; see [`CancelFlag`].
    pub fn scan(&mut self, config: &ScanConfig) -> ResxResult<&[ScanResult]> {
        match self.run_scan(config) {
            Ok(outcome) => {
                self.remaining = outcome.remaining;
                self.results = outcome.results;
                self.stats = outcome.stats;
                self.resource_file = Some(config.resource_file().to_path_buf());
                self.enter(ScanPhase::Done);
                info!(
                    unused = self.results.len(),
                    "Found {} unused resource(s).",
                    self.results.len()
                );
                Ok(&self.results)
            }
            Err(e) => {
                self.enter(ScanPhase::Failed);
                warn!(error = %e, "scan failed");
                Err(e)
            }
        }
    }

    fn enter(&mut self, phase: ScanPhase) {
        debug!(from = %self.phase, to = %phase, "scan phase");
        self.phase = phase;
    }

    fn run_scan(&mut self, config: &ScanConfig) -> ResxResult<ScanOutcome> {
        let mut matcher = ReferenceMatcher::new(config.reference_formats(), config.match_mode());

        if config.uses_regex() {
            self.enter(ScanPhase::ValidatingPatterns);
            matcher.validate()?;
        }

        self.enter(ScanPhase::LoadingKeys);
        info!(resource_file = %config.resource_file().display(), "Populating search list...");
        let document = ResourceDocument::load(config.resource_file())?;
        let all_keys: HashSet<String> = document.keys().map(String::from).collect();
        let total_keys = all_keys.len();
        let mut remaining = filter_excluded(all_keys, config.exclude_prefixes());
        let excluded_keys = total_keys - remaining.len();

        self.enter(ScanPhase::EnumeratingFiles);
        info!(root = %config.project_root().display(), "Populating file list...");
        let files = gather_source_files(config.project_root(), config.extensions())?;

        self.enter(ScanPhase::Matching);
        info!(files = files.len(), keys = remaining.len(), "Finding unused keys...");
        let candidates = remaining.len();
        let mut files_scanned = 0;
        for file in &files {
            if self.cancel.is_cancelled() {
                return Err(ResxError::Cancelled);
            }
            if remaining.is_empty() {
                break;
            }
            let found = remove_found_keys(&mut matcher, &mut remaining, file)?;
            files_scanned += 1;
            if found > 0 {
                debug!(file = %file.display(), found, left = remaining.len(), "references found");
            }
        }

        self.enter(ScanPhase::PopulatingValues);
        info!("Getting resource values...");
        let results = collect_results(&document, &remaining);

        let stats = ScanStats {
            total_keys,
            excluded_keys,
            files_scanned,
            referenced_keys: candidates - remaining.len(),
            unused_keys: remaining.len(),
        };

        Ok(ScanOutcome {
            remaining,
            results,
            stats,
        })
    }

    /// Mark a result as selected or not. Returns `false` if `key` is not in
    /// the result list.
    pub fn set_selected(&mut self, key: &str, selected: bool) -> bool {
        match self.results.iter_mut().find(|r| r.key() == key) {
            Some(result) => {
                result.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Keys of all selected results.
    pub fn selected_keys(&self) -> HashSet<String> {
        self.results
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.key().to_string())
            .collect()
    }

    /// Drop keys from the unused set and result list without touching the
    /// resource file. Returns how many results were dropped.
    pub fn exclude(&mut self, keys: &HashSet<String>) -> usize {
        let count = self.forget(keys);
        info!(count, "Excluded {} item(s).", count);
        count
    }

    /// [`exclude`](Self::exclude) every selected result.
    pub fn exclude_selected(&mut self) -> usize {
        let keys = self.selected_keys();
        self.exclude(&keys)
    }

    /// Remove `keys` from the in-memory view. Returns how many results went.
    pub(crate) fn forget(&mut self, keys: &HashSet<String>) -> usize {
        for key in keys {
            self.remaining.remove(key);
        }
        let before = self.results.len();
        self.results.retain(|r| !keys.contains(r.key()));
        before - self.results.len()
    }
}

/// Scan once with a fresh finder and return the unused entries.
pub fn find_unused(config: &ScanConfig) -> ResxResult<Vec<ScanResult>> {
    let mut finder = UnusedFinder::new();
    Ok(finder.scan(config)?.to_vec())
}

/// Test every remaining key against one file, dropping the ones it
/// references. Returns how many were dropped.
fn remove_found_keys(
    matcher: &mut ReferenceMatcher,
    keys: &mut HashSet<String>,
    file: &Path,
) -> ResxResult<usize> {
    let bytes = fs::read(file).with_path(file, "Could not read source file")?;
    let text = String::from_utf8_lossy(&bytes);

    let mut found = Vec::new();
    for key in keys.iter() {
        if matcher.is_referenced(key, &text)? {
            found.push(key.clone());
        }
    }

    for key in &found {
        keys.remove(key);
    }
    Ok(found.len())
}

/// Unused entries in document order, each key once.
fn collect_results(document: &ResourceDocument, unused: &HashSet<String>) -> Vec<ScanResult> {
    let mut seen = HashSet::new();
    document
        .entries()
        .filter(|element| unused.contains(element.key()))
        .filter(|element| seen.insert(element.key().to_string()))
        .map(|element| ScanResult::new(element.to_entry()))
        .collect()
}
