//! `key=value` line codec.
//!
//! One pair per line. Carriage returns are skipped, the key ends at the
//! first `=`, the value ends at the newline. A final line without a
//! terminating newline is discarded; lines without `=` are ignored.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use tracing::debug;

/// Parse pairs from a reader.
pub fn parse(reader: impl BufRead) -> std::io::Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    let mut field = String::new();
    let mut key: Option<String> = None;

    for byte in reader.bytes() {
        match byte? as char {
            '\r' => {}
            '=' if key.is_none() => {
                key = Some(std::mem::take(&mut field));
            }
            '\n' => {
                if let Some(k) = key.take() {
                    map.insert(k, std::mem::take(&mut field));
                } else if !field.is_empty() {
                    debug!(line = %field, "skipping line without separator");
                    field.clear();
                }
            }
            c => field.push(c),
        }
    }
    // Anything still buffered had no newline and is dropped.
    Ok(map)
}

/// Parse pairs from an in-memory string.
pub fn parse_str(text: &str) -> BTreeMap<String, String> {
    // Reading from a byte slice cannot fail.
    parse(text.as_bytes()).unwrap_or_default()
}

/// Write pairs as terminated `key=value` lines, in key order.
pub fn write(mut writer: impl Write, map: &BTreeMap<String, String>) -> std::io::Result<()> {
    for (key, value) in map {
        writeln!(writer, "{key}={value}")?;
    }
    Ok(())
}
