//! Source file discovery.
//!
//! Walks the project tree depth-first, files of a directory before its
//! subdirectories, each level in name order, and keeps every file whose
//! name ends with one of the configured extensions.
//!
//! Any unreadable directory aborts the walk: a partial file list would turn
//! referenced keys into false "unused" reports.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{IoResultExt, ResxError, ResxResult};

const WALK_ERROR: &str = "Could not populate file list";

/// Ensure an extension starts with `.`.
pub fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}

/// Whether the file name ends with any of `extensions` (case-sensitive).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| extensions.iter().any(|ext| name.ends_with(ext.as_str())))
}

/// Files first, then directories, each group by name.
fn files_then_dirs(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn walk_error(root: &Path, err: walkdir::Error) -> ResxError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    match err.into_io_error() {
        Some(io) => ResxError::file(path, WALK_ERROR, io),
        None => ResxError::file_msg(path, format!("{}: {}", WALK_ERROR, message)),
    }
}

/// Gathers every file under `root` matching `extensions`, recursively.
///
/// `extensions` are expected in normalized form (see [`normalize_extension`]).
pub fn gather_source_files(root: &Path, extensions: &[String]) -> ResxResult<Vec<PathBuf>> {
    let meta = fs::metadata(root).with_path(root, WALK_ERROR)?;
    if !meta.is_dir() {
        return Err(ResxError::file_msg(
            root,
            format!("{}: not a directory", WALK_ERROR),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by(files_then_dirs) {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        let path = entry.path();
        if path.is_file() && has_extension(path, extensions) {
            files.push(path.to_path_buf());
        }
    }

    debug!(root = %root.display(), count = files.len(), "gathered source files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, AtomicOrdering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("resxprune_scan_test")
            .join(format!("{}_{}", name, id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn write_file(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn exts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("cs"), ".cs");
        assert_eq!(normalize_extension(".cs"), ".cs");
        assert_eq!(normalize_extension("Designer.cs"), ".Designer.cs");
    }

    #[test]
    fn test_has_extension() {
        let e = exts(&[".cs", ".xaml"]);
        assert!(has_extension(Path::new("/a/Page.xaml"), &e));
        assert!(has_extension(Path::new("/a/Program.cs"), &e));
        assert!(!has_extension(Path::new("/a/Program.CS"), &e));
        assert!(!has_extension(Path::new("/a/readme.md"), &e));
    }

    #[test]
    fn test_gather_recursive_with_filter() {
        let dir = create_temp_dir("recursive");
        write_file(&dir.join("App.cs"));
        write_file(&dir.join("notes.txt"));
        write_file(&dir.join("Views/Main.xaml"));
        write_file(&dir.join("Views/Deep/Nested/Item.cs"));
        write_file(&dir.join("Views/Deep/image.png"));

        let files = gather_source_files(&dir, &exts(&[".cs", ".xaml"])).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(&dir).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["App.cs", "Views/Main.xaml", "Views/Deep/Nested/Item.cs"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_files_before_subdirectories() {
        let dir = create_temp_dir("order");
        write_file(&dir.join("a/inner.cs"));
        write_file(&dir.join("z.cs"));

        let files = gather_source_files(&dir, &exts(&[".cs"])).unwrap();
        assert!(files[0].ends_with("z.cs"));
        assert!(files[1].ends_with("a/inner.cs"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_root_is_file_error() {
        let dir = create_temp_dir("missing_root");
        let err = gather_source_files(&dir.join("nope"), &exts(&[".cs"])).unwrap_err();
        assert!(matches!(err, ResxError::File { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_root_is_file_is_error() {
        let dir = create_temp_dir("root_file");
        let file = dir.join("App.cs");
        write_file(&file);
        let err = gather_source_files(&file, &exts(&[".cs"])).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_tree() {
        let dir = create_temp_dir("empty");
        let files = gather_source_files(&dir, &exts(&[".cs"])).unwrap();
        assert!(files.is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}
