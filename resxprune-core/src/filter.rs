//! Prefix exclusion applied to the freshly loaded key set.
//!
//! A plain string-prefix test: not case-insensitive, not aware of `.` or `_`
//! boundaries, so `App` also excludes `Apple_Key`.

use std::collections::HashSet;

/// Whether `key` starts with any of `prefixes`.
pub fn is_excluded(key: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
}

/// Keep only the keys that no prefix excludes. An empty prefix list keeps
/// everything.
pub fn filter_excluded(keys: impl IntoIterator<Item = String>, prefixes: &[String]) -> HashSet<String> {
    keys.into_iter()
        .filter(|key| !is_excluded(key, prefixes))
        .collect()
}
