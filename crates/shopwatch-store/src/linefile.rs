//! Line-record text files.
//!
//! A record file holds one record per line. On every read and write the
//! same processing order applies: trim, drop blank lines, drop `#` comment
//! lines, then dedupe exact duplicates keeping the first occurrence.
//! Format-specific validation (proxy grammar, URL prefixes) is left to the
//! callers.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::StoreError;

/// Loads the valid record set of a file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read.
pub fn read_records(path: &Path) -> Result<Vec<String>, StoreError> {
    let content = fs::read_to_string(path)?;
    let records = process(content.lines());
    tracing::debug!(path = %path.display(), count = records.len(), "records loaded from file");
    Ok(records)
}

/// Overwrites the file with the given records, newline-separated.
///
/// The records pass through the same cleanup/filter/dedupe pipeline as a
/// read, so a load → save → load round-trip is idempotent.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be written.
pub fn write_records(path: &Path, records: &[String]) -> Result<(), StoreError> {
    let cleaned = process(records.iter().map(String::as_str));
    let mut body = cleaned.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    fs::write(path, body)?;
    tracing::debug!(path = %path.display(), count = cleaned.len(), "records written to file");
    Ok(())
}

/// Appends records after the last line; duplicates are silently not
/// written a second time.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read or written.
pub fn append_records(path: &Path, new_records: &[String]) -> Result<(), StoreError> {
    let mut records = read_records(path)?;
    records.extend(new_records.iter().cloned());
    write_records(path, &records)
}

fn process<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for line in lines {
        let record = line.trim();
        if record.is_empty() || record.starts_with('#') {
            continue;
        }
        if seen.insert(record.to_owned()) {
            records.push(record.to_owned());
        }
    }
    records
}

#[cfg(test)]
#[path = "linefile_test.rs"]
mod tests;
