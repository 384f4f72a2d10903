use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::errors::IngestError;
use crate::model::{MalformedRecordPolicy, RawRecord, RawTable, SkippedRecord};

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub malformed_records: MalformedRecordPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            malformed_records: MalformedRecordPolicy::Abort,
        }
    }
}

pub fn read_path(path: &Path, options: &ReaderOptions) -> Result<RawTable, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "opened tabular source");
    read_from(file, options)
}

pub fn read_str(content: &str, options: &ReaderOptions) -> Result<RawTable, IngestError> {
    read_from(content.as_bytes(), options)
}

/// Reads a header row followed by data rows, preserving source order.
pub fn read_from<R: Read>(source: R, options: &ReaderOptions) -> Result<RawTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(source);

    let mut records = reader.records();

    let header = records.next().ok_or(IngestError::MissingHeader)??;
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = if idx == 0 {
                name.trim_start_matches(BOM)
            } else {
                name
            };
            name.trim().to_string()
        })
        .collect();

    let mut table = RawTable::new(name_unnamed_columns(headers))?;
    let expected = table.headers().len();

    for (row_idx, record) in records.enumerate() {
        let record = record?;
        let line_index = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(row_idx + 2);

        if record.len() != expected {
            match options.malformed_records {
                MalformedRecordPolicy::Abort => {
                    return Err(IngestError::MalformedRecord {
                        line_index,
                        expected,
                        found: record.len(),
                    });
                }
                MalformedRecordPolicy::Skip => {
                    warn!(
                        line_index,
                        expected,
                        found = record.len(),
                        "skipping malformed record"
                    );
                    table.push_skipped(SkippedRecord {
                        line_index,
                        expected,
                        found: record.len(),
                    });
                    continue;
                }
            }
        }

        table.push(RawRecord::new(line_index, record));
    }

    debug!(
        rows = table.len(),
        skipped = table.skipped().len(),
        "finished reading tabular source"
    );
    Ok(table)
}

/// Blank header cells (a trailing delimiter, a spacer column) are named
/// `Unnamed: {position}`, suffixed with `.N` if a real header already uses
/// that name.
fn name_unnamed_columns(mut headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = headers
        .iter()
        .filter(|name| !name.is_empty())
        .cloned()
        .collect();

    for (position, name) in headers.iter_mut().enumerate() {
        if !name.is_empty() {
            continue;
        }
        let base = format!("Unnamed: {position}");
        let mut candidate = base.clone();
        let mut suffix = 1;
        while taken.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        debug!(position, name = %candidate, "named blank header cell");
        taken.insert(candidate.clone());
        *name = candidate;
    }

    headers
}
