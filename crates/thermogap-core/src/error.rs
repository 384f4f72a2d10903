// crates/thermogap-core/src/error.rs

use std::path::PathBuf;

use thermogap_parser::IngestError;
use thiserror::Error;

use crate::interpolate::InterpolationError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source {} could not be opened: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data row {line_index} malformed: expected {expected} fields but found {found}")]
    MalformedRecord {
        line_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("ingestion failed: {0}")]
    Ingest(#[source] IngestError),

    #[error("timestamps must be strictly ascending (position {position})")]
    UnorderedTimeline { position: usize },

    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
}

impl From<IngestError> for PipelineError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::SourceUnavailable { path, source } => {
                PipelineError::SourceUnavailable { path, source }
            }
            IngestError::MalformedRecord {
                line_index,
                expected,
                found,
            } => PipelineError::MalformedRecord {
                line_index,
                expected,
                found,
            },
            IngestError::MissingColumn { column } => PipelineError::InvalidConfig(format!(
                "column '{column}' is not present in the input header"
            )),
            other => PipelineError::Ingest(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
