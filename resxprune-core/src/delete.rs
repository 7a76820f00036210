//! Removal of unused entries from the resource file.
//!
//! Deletion is two-phase. The resource file is re-read from disk, the keys
//! are removed from that working copy and the copy is saved; only then are
//! the keys dropped from the finder's unused set and result list. A failed
//! load or save leaves the finder exactly as it was.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ResxError, ResxResult};
use crate::finder::UnusedFinder;
use crate::resource::ResourceDocument;

/// Remove every entry whose key is in `keys` from the file at `path`.
///
/// Returns the number of `<data>` elements removed. Keys that are not in
/// the file are ignored; if none are present the file is not rewritten.
pub fn delete_entries(path: &Path, keys: &HashSet<String>) -> ResxResult<usize> {
    if keys.is_empty() {
        return Ok(0);
    }

    let mut document = ResourceDocument::load(path)?;
    let removed = document.remove_entries(keys);
    if removed == 0 {
        debug!(path = %path.display(), "no matching entries on disk");
        return Ok(0);
    }

    document.save(path)?;
    debug!(path = %path.display(), removed, "resource file saved");
    Ok(removed)
}

impl UnusedFinder {
    /// Delete `keys` from the resource file of the last scan, then forget
    /// them. Returns how many entries left the file.
    pub fn delete(&mut self, keys: &HashSet<String>) -> ResxResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }

        let path = self
            .resource_file()
            .ok_or_else(|| ResxError::invalid_argument("no scan has been run, nothing to delete"))?
            .to_path_buf();

        let removed = delete_entries(&path, keys)?;
        self.forget(keys);

        info!(removed, "Deleted {} unused resource(s).", removed);
        Ok(removed)
    }

    /// Delete every selected result.
    pub fn delete_selected(&mut self) -> ResxResult<usize> {
        let keys = self.selected_keys();
        self.delete(&keys)
    }

    /// Delete every key still in the unused set.
    pub fn delete_all(&mut self) -> ResxResult<usize> {
        let keys = self.remaining_keys().clone();
        self.delete(&keys)
    }
}
