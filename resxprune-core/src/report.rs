//! Output formatting - plaintext, key list and JSON.

use serde_json::json;

use crate::finder::ScanResult;

/// Plain text report: a header line, then `- key: value` per entry.
pub fn render_plain(results: &[ScanResult]) -> String {
    if results.is_empty() {
        return "No unused resources found.\n".to_string();
    }

    let mut out = format!("UNUSED RESOURCES ({}):\n", results.len());
    for result in results {
        if result.value().is_empty() {
            out.push_str(&format!("- {}\n", result.key()));
        } else {
            out.push_str(&format!("- {}: {}\n", result.key(), result.value()));
        }
    }
    out
}

/// Just the keys, one per line.
pub fn keys_text(results: &[ScanResult]) -> String {
    results
        .iter()
        .map(|r| format!("{}\n", r.key()))
        .collect()
}

/// JSON report: `{"unused": [{"key", "value"}], "count": N}`.
pub fn render_json(results: &[ScanResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "unused": results,
        "count": results.len(),
    }))
}

/// Prints unused resources in plain text format.
pub fn print_plain(results: &[ScanResult]) {
    print!("{}", render_plain(results));
}

/// Prints unused resources in JSON format.
///
/// Falls back to a key-only list if serialization fails.
pub fn print_json(results: &[ScanResult]) {
    match render_json(results) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            let keys: Vec<&str> = results.iter().map(|r| r.key()).collect();
            println!("{{\"unused\": {:?}}}", keys);
        }
    }
}
