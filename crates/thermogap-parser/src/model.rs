use std::collections::HashMap;
use std::fmt;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::errors::IngestError;

/// What to do with a data row whose field count disagrees with the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRecordPolicy {
    /// Fail the whole read on the first malformed row.
    #[default]
    Abort,
    /// Drop the row, log it, and keep reading.
    Skip,
}

impl MalformedRecordPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MalformedRecordPolicy::Abort => "abort",
            MalformedRecordPolicy::Skip => "skip",
        }
    }
}

impl fmt::Display for MalformedRecordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data row as read from the source. Fields are positional and named by
/// the owning [`RawTable`]'s header.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub line_index: usize,
    fields: StringRecord,
}

impl RawRecord {
    pub(crate) fn new(line_index: usize, fields: StringRecord) -> Self {
        Self { line_index, fields }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub line_index: usize,
    pub expected: usize,
    pub found: usize,
}

#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<RawRecord>,
    skipped: Vec<SkippedRecord>,
}

impl RawTable {
    pub(crate) fn new(headers: Vec<String>) -> Result<Self, IngestError> {
        let mut index = HashMap::with_capacity(headers.len());
        for (position, name) in headers.iter().enumerate() {
            if index.insert(name.clone(), position).is_some() {
                return Err(IngestError::InvalidHeader {
                    message: format!("duplicate column name '{name}'"),
                });
            }
        }
        Ok(Self {
            headers,
            index,
            records: Vec::new(),
            skipped: Vec::new(),
        })
    }

    pub(crate) fn push(&mut self, record: RawRecord) {
        self.records.push(record);
    }

    pub(crate) fn push_skipped(&mut self, skipped: SkippedRecord) {
        self.skipped.push(skipped);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize, IngestError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| IngestError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Raw text of one column, in row order.
    pub fn column_text(&self, name: &str) -> Result<Vec<&str>, IngestError> {
        let idx = self.column_index(name)?;
        Ok(self
            .records
            .iter()
            .map(|record| record.get(idx).unwrap_or(""))
            .collect())
    }

    /// `(header, value)` pairs for the record at `position`.
    pub fn named_fields(&self, position: usize) -> Option<Vec<(&str, &str)>> {
        let record = self.records.get(position)?;
        Some(
            self.headers
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.as_str(), record.get(idx).unwrap_or("")))
                .collect(),
        )
    }
}
