use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source {} could not be opened: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("header row invalid: {message}")]
    InvalidHeader { message: String },

    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("data row {line_index} malformed: expected {expected} fields but found {found}")]
    MalformedRecord {
        line_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("source did not contain a header row")]
    MissingHeader,

    #[error("column '{column}' is not present in the header")]
    MissingColumn { column: String },
}

impl From<csv::Error> for IngestError {
    fn from(source: csv::Error) -> Self {
        IngestError::Csv { source }
    }
}
