//! Loading, querying, editing and saving `.resx` resource documents.
//!
//! A `.resx` file is XML: a root element whose `<data name="...">` children
//! are the entries, each with an optional `<value>` child. Everything else
//! (`xsd:schema`, `resheader`, comments) is carried along untouched.
//!
//! The document keeps the original text and the byte span of every entry.
//! Removing entries splices those spans out, so a save rewrites only what
//! changed and leaves the rest of the file byte-for-byte identical.

use std::collections::HashSet;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IoResultExt, ResxError, ResxResult};

/// Element name of a resource entry.
pub const ENTRY_ELEMENT: &[u8] = b"data";

/// Attribute holding the entry key.
pub const NAME_ATTRIBUTE: &[u8] = b"name";

/// Child element holding the entry value.
pub const VALUE_ELEMENT: &[u8] = b"value";

const UTF8_BOM: char = '\u{feff}';

/// A key and its value, detached from any document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub key: String,
    pub value: String,
}

/// One `<data>` element as found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataElement {
    key: String,
    value: Option<String>,
    span: Range<usize>,
}

impl DataElement {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The text of the `<value>` child, if there is one.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Byte range of the element within the document text.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Snapshot as a [`ResourceEntry`]; a missing value becomes empty.
    pub fn to_entry(&self) -> ResourceEntry {
        ResourceEntry {
            key: self.key.clone(),
            value: self.value.clone().unwrap_or_default(),
        }
    }
}

/// An in-memory `.resx` document.
#[derive(Debug, Clone)]
pub struct ResourceDocument {
    path: PathBuf,
    text: String,
    has_bom: bool,
    root: String,
    elements: Vec<DataElement>,
}

impl ResourceDocument {
    /// Read and parse the resource file at `path`.
    pub fn load(path: &Path) -> ResxResult<Self> {
        let bytes = fs::read(path).with_path(path, "Could not read resource file")?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ResxError::parse(path, format!("Resource file is not valid UTF-8: {}", e)))?;
        Self::parse(path, text)
    }

    /// Parse resource XML. `path` is only used for error messages and as
    /// the default save location.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> ResxResult<Self> {
        let path = path.into();
        let mut text = text.into();

        let has_bom = text.starts_with(UTF8_BOM);
        if has_bom {
            text.replace_range(..UTF8_BOM.len_utf8(), "");
        }

        let (root, elements) = scan_document(&path, &text)?;

        Ok(Self {
            path,
            text,
            has_bom,
            root,
            elements,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the root element.
    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// All entries in document order. Calling it again restarts the walk.
    pub fn entries(&self) -> std::slice::Iter<'_, DataElement> {
        self.elements.iter()
    }

    /// All keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(DataElement::key)
    }

    /// First entry with the given key.
    pub fn get(&self, key: &str) -> Option<&DataElement> {
        self.elements.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Drop every entry whose key is in `keys`. Returns how many elements
    /// were removed. Only the in-memory document changes.
    pub fn remove_entries(&mut self, keys: &HashSet<String>) -> usize {
        let elements = std::mem::take(&mut self.elements);
        let mut text = String::with_capacity(self.text.len());
        let mut kept = Vec::with_capacity(elements.len());
        let mut cursor = 0;
        let mut removed = 0;

        for mut element in elements {
            if keys.contains(&element.key) {
                let range = removal_range(&self.text, &element.span);
                text.push_str(&self.text[cursor..range.start]);
                cursor = range.end;
                removed += 1;
            } else {
                // bytes dropped so far
                let shift = cursor - text.len();
                element.span = (element.span.start - shift)..(element.span.end - shift);
                kept.push(element);
            }
        }

        text.push_str(&self.text[cursor..]);
        self.text = text;
        self.elements = kept;
        removed
    }

    /// The document as it would be written to disk.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + UTF8_BOM.len_utf8());
        if self.has_bom {
            out.push(UTF8_BOM);
        }
        out.push_str(&self.text);
        out
    }

    /// Write the document to `path`.
    ///
    /// Uses atomic write pattern (temp file + rename) so an interrupted save
    /// never leaves a truncated resource file behind. A symlinked target is
    /// resolved first, so the file it points to is replaced and the link
    /// stays. A read-only target is refused, as the rename would otherwise
    /// silently replace it.
    pub fn save(&self, path: &Path) -> ResxResult<()> {
        const SAVE_ERROR: &str = "Error saving resource file";

        let existing = match fs::metadata(path) {
            Ok(meta) => Some(meta),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(ResxError::file(path, SAVE_ERROR, e)),
        };

        if let Some(meta) = &existing {
            if meta.permissions().readonly() {
                return Err(ResxError::file(
                    path,
                    SAVE_ERROR,
                    std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        "resource file is read-only",
                    ),
                ));
            }
        }

        let target = match &existing {
            Some(_) => fs::canonicalize(path).with_path(path, SAVE_ERROR)?,
            None => path.to_path_buf(),
        };

        let file_name = target
            .file_name()
            .ok_or_else(|| ResxError::file_msg(path, format!("{}: not a file path", SAVE_ERROR)))?;
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let temp_path = dir.join(format!(
            ".{}.{}.{}.tmp",
            file_name.to_string_lossy(),
            std::process::id(),
            nanos
        ));

        fs::write(&temp_path, self.to_xml_string()).with_path(&temp_path, SAVE_ERROR)?;

        if let Some(meta) = &existing {
            if let Err(e) = fs::set_permissions(&temp_path, meta.permissions()) {
                warn!(path = %target.display(), error = %e, "could not copy permissions to saved resource file");
            }
        }

        if let Err(e) = fs::rename(&temp_path, &target) {
            let _ = fs::remove_file(&temp_path);
            return Err(ResxError::file(path, SAVE_ERROR, e));
        }

        debug!(path = %target.display(), "resource file written");

        Ok(())
    }
}

/// `<data>` element currently being read.
struct OpenEntry {
    key: String,
    start: usize,
    value: Option<String>,
    in_value: bool,
}

/// Walk the XML once, returning the root name and every root-level entry.
fn scan_document(path: &Path, text: &str) -> ResxResult<(String, Vec<DataElement>)> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    let mut root: Option<String> = None;
    let mut root_closed = false;
    let mut open: Option<OpenEntry> = None;
    let mut elements = Vec::new();

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| ResxError::parse(path, format!("Invalid XML: {}", e)))?;
        let end = reader.buffer_position() as usize;
        let in_root = depth == 1 && !root_closed;

        match event {
            Event::Start(e) => {
                if depth == 0 && root.is_none() {
                    root = Some(element_name(&e));
                } else if in_root && e.name().as_ref() == ENTRY_ELEMENT {
                    open = Some(OpenEntry {
                        key: entry_key(path, &e)?,
                        start,
                        value: None,
                        in_value: false,
                    });
                } else if depth == 2 && e.name().as_ref() == VALUE_ELEMENT {
                    if let Some(entry) = open.as_mut() {
                        entry.value.get_or_insert_with(String::new);
                        entry.in_value = true;
                    }
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 0 && root.is_none() {
                    root = Some(element_name(&e));
                    root_closed = true;
                } else if in_root && e.name().as_ref() == ENTRY_ELEMENT {
                    elements.push(DataElement {
                        key: entry_key(path, &e)?,
                        value: None,
                        span: start..end,
                    });
                } else if depth == 2 && e.name().as_ref() == VALUE_ELEMENT {
                    if let Some(entry) = open.as_mut() {
                        entry.value.get_or_insert_with(String::new);
                    }
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                match depth {
                    0 => root_closed = true,
                    1 => {
                        if let Some(entry) = open.take() {
                            elements.push(DataElement {
                                key: entry.key,
                                value: entry.value,
                                span: entry.start..end,
                            });
                        }
                    }
                    2 => {
                        if let Some(entry) = open.as_mut() {
                            entry.in_value = false;
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let Some(entry) = open.as_mut().filter(|entry| entry.in_value) {
                    let content = t
                        .unescape()
                        .map_err(|e| ResxError::parse(path, format!("Invalid XML text: {}", e)))?;
                    entry.value.get_or_insert_with(String::new).push_str(&content);
                }
            }
            Event::CData(c) => {
                if let Some(entry) = open.as_mut().filter(|entry| entry.in_value) {
                    entry
                        .value
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let root = root.ok_or_else(|| ResxError::parse(path, "No root element found."))?;
    Ok((root, elements))
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// The required `name` attribute of a `<data>` element.
fn entry_key(path: &Path, e: &BytesStart) -> ResxResult<String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ResxError::parse(path, format!("Invalid attribute: {}", err)))?;
        if attr.key.as_ref() == NAME_ATTRIBUTE {
            let value = attr
                .unescape_value()
                .map_err(|err| ResxError::parse(path, format!("Invalid name attribute: {}", err)))?;
            return Ok(value.into_owned());
        }
    }
    Err(ResxError::parse(path, "Name attribute missing on data."))
}

/// Span to cut when removing an element: the element itself plus the
/// indentation and line break in front of it, when it sits on its own line.
fn removal_range(text: &str, span: &Range<usize>) -> Range<usize> {
    let bytes = text.as_bytes();
    let mut start = span.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }

    if start > 0 && bytes[start - 1] == b'\n' {
        start -= 1;
        if start > 0 && bytes[start - 1] == b'\r' {
            start -= 1;
        }
        start..span.end
    } else {
        span.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <resheader name="resmimetype">
    <value>text/microsoft-resx</value>
  </resheader>
  <data name="Greeting" xml:space="preserve">
    <value>Hello &amp; welcome</value>
  </data>
  <data name="Farewell" xml:space="preserve">
    <value>Goodbye</value>
    <comment>shown on exit</comment>
  </data>
  <data name="NoValue" />
  <data name="Unused1"><value><![CDATA[<b>bold</b>]]></value></data>
</root>
"#;

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("resxprune_resource_test")
            .join(format!("{}_{}", name, id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn keys_of(doc: &ResourceDocument) -> Vec<&str> {
        doc.keys().collect()
    }

    #[test]
    fn test_parse_entries_in_order() {
        let doc = ResourceDocument::parse("Strings.resx", SAMPLE).unwrap();
        assert_eq!(doc.root_name(), "root");
        assert_eq!(keys_of(&doc), vec!["Greeting", "Farewell", "NoValue", "Unused1"]);
    }

    #[test]
    fn test_values() {
        let doc = ResourceDocument::parse("Strings.resx", SAMPLE).unwrap();
        assert_eq!(doc.get("Greeting").unwrap().value(), Some("Hello & welcome"));
        assert_eq!(doc.get("Farewell").unwrap().value(), Some("Goodbye"));
        assert_eq!(doc.get("NoValue").unwrap().value(), None);
        assert_eq!(doc.get("Unused1").unwrap().value(), Some("<b>bold</b>"));
        assert_eq!(doc.get("NoValue").unwrap().to_entry().value, "");
    }

    #[test]
    fn test_resheader_is_not_an_entry() {
        let doc = ResourceDocument::parse("Strings.resx", SAMPLE).unwrap();
        assert!(doc.get("resmimetype").is_none());
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_entries_restartable() {
        let doc = ResourceDocument::parse("Strings.resx", SAMPLE).unwrap();
        let first: Vec<_> = doc.entries().map(|e| e.key().to_string()).collect();
        let second: Vec<_> = doc.entries().map(|e| e.key().to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_root() {
        let doc = ResourceDocument::parse("Strings.resx", "<root/>").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_missing_root_is_parse_error() {
        let err = ResourceDocument::parse("Strings.resx", "<?xml version=\"1.0\"?>\n").unwrap_err();
        assert!(matches!(err, ResxError::Parse { .. }));
        assert!(err.to_string().contains("No root element found."));
    }

    #[test]
    fn test_missing_name_is_parse_error() {
        let xml = "<root><data name=\"A\"><value>a</value></data><data><value>b</value></data></root>";
        let err = ResourceDocument::parse("Strings.resx", xml).unwrap_err();
        assert!(err.to_string().contains("Name attribute missing on data."));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = ResourceDocument::parse("Strings.resx", "<root><data name=\"A\"></root>").unwrap_err();
        assert!(matches!(err, ResxError::Parse { .. }));
    }

    #[test]
    fn test_nested_data_is_not_an_entry() {
        let xml = "<root><group><data name=\"Inner\"/></group><data name=\"Outer\"/></root>";
        let doc = ResourceDocument::parse("Strings.resx", xml).unwrap();
        assert_eq!(keys_of(&doc), vec!["Outer"]);
    }

    #[test]
    fn test_remove_entries() {
        let mut doc = ResourceDocument::parse("Strings.resx", SAMPLE).unwrap();
        let keys: HashSet<String> = ["Farewell", "NoValue", "Missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let removed = doc.remove_entries(&keys);
        assert_eq!(removed, 2);
        assert_eq!(keys_of(&doc), vec!["Greeting", "Unused1"]);

        let xml = doc.to_xml_string();
        assert!(!xml.contains("Farewell"));
        assert!(!xml.contains("NoValue"));
        assert!(xml.contains("<resheader name=\"resmimetype\">"));
        assert!(xml.contains("  <data name=\"Greeting\" xml:space=\"preserve\">"));
        assert!(!xml.contains("\n\n"));

        // Spans of the kept entries still point at their elements.
        for element in doc.entries() {
            let slice = &xml[element.span()];
            assert!(slice.starts_with("<data"));
            assert!(slice.contains(element.key()));
        }

        let reparsed = ResourceDocument::parse("Strings.resx", xml).unwrap();
        assert_eq!(keys_of(&reparsed), vec!["Greeting", "Unused1"]);
    }

    #[test]
    fn test_remove_adjacent_entries() {
        let xml = "<root>\r\n  <data name=\"A\"/>\r\n  <data name=\"B\"/>\r\n  <data name=\"C\"/>\r\n</root>\r\n";
        let mut doc = ResourceDocument::parse("Strings.resx", xml).unwrap();
        let keys: HashSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
        assert_eq!(doc.remove_entries(&keys), 2);
        assert_eq!(doc.to_xml_string(), "<root>\r\n  <data name=\"C\"/>\r\n</root>\r\n");
    }

    #[test]
    fn test_remove_inline_entry() {
        let xml = "<root><data name=\"A\"/><data name=\"B\"/></root>";
        let mut doc = ResourceDocument::parse("Strings.resx", xml).unwrap();
        let keys: HashSet<String> = ["A".to_string()].into_iter().collect();
        assert_eq!(doc.remove_entries(&keys), 1);
        assert_eq!(doc.to_xml_string(), "<root><data name=\"B\"/></root>");
    }

    #[test]
    fn test_remove_nothing_keeps_text() {
        let mut doc = ResourceDocument::parse("Strings.resx", SAMPLE).unwrap();
        assert_eq!(doc.remove_entries(&HashSet::new()), 0);
        assert_eq!(doc.to_xml_string(), SAMPLE);
    }

    #[test]
    fn test_bom_preserved() {
        let xml = format!("{}<root><data name=\"A\"/></root>", UTF8_BOM);
        let doc = ResourceDocument::parse("Strings.resx", xml.clone()).unwrap();
        assert_eq!(keys_of(&doc), vec!["A"]);
        assert_eq!(doc.to_xml_string(), xml);
    }

    #[test]
    fn test_save_and_load() {
        let dir = create_temp_dir("save_load");
        let path = dir.join("Strings.resx");
        fs::write(&path, SAMPLE).unwrap();

        let mut doc = ResourceDocument::load(&path).unwrap();
        let keys: HashSet<String> = ["Greeting".to_string()].into_iter().collect();
        doc.remove_entries(&keys);
        doc.save(&path).unwrap();

        let reloaded = ResourceDocument::load(&path).unwrap();
        assert_eq!(keys_of(&reloaded), vec!["Farewell", "NoValue", "Unused1"]);

        // No temp files left behind
        for entry in fs::read_dir(&dir).unwrap().flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "Temp file left behind: {}", name);
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_is_file_error() {
        let dir = create_temp_dir("load_missing");
        let err = ResourceDocument::load(&dir.join("Missing.resx")).unwrap_err();
        assert!(matches!(err, ResxError::File { .. }));
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_permissions_and_symlink() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_temp_dir("save_perms");
        let real = dir.join("real.resx");
        fs::write(&real, SAMPLE).unwrap();
        fs::set_permissions(&real, fs::Permissions::from_mode(0o640)).unwrap();
        let link = dir.join("Strings.resx");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut doc = ResourceDocument::load(&link).unwrap();
        doc.remove_entries(&["NoValue".to_string()].into_iter().collect());
        doc.save(&link).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::metadata(&real).unwrap().permissions().mode() & 0o777, 0o640);
        assert!(!fs::read_to_string(&real).unwrap().contains("NoValue"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_read_only_is_file_error() {
        let dir = create_temp_dir("save_readonly");
        let path = dir.join("Strings.resx");
        fs::write(&path, SAMPLE).unwrap();

        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let doc = ResourceDocument::load(&path).unwrap();
        let err = doc.save(&path).unwrap_err();
        assert!(matches!(err, ResxError::File { .. }));
        assert!(err.to_string().contains("Error saving resource file"));

        let mut perms = fs::metadata(&path).unwrap().permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
        fs::set_permissions(&path, perms).unwrap();
        fs::remove_dir_all(&dir).ok();
    }
}
