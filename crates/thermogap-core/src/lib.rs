pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod gaps;
pub mod interpolate;
pub mod pipeline;
pub mod timeline;

pub use config::{ColumnBindings, PipelineConfig, ValidatedConfig};
pub use dataset::{Sample, TimeIndexedDataset};
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineOutput, PipelineWarning, RunReport};
