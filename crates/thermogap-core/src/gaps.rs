use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::TimeIndexedDataset;
use crate::error::{PipelineError, Result};

/// A derived `measured - reference` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapPair {
    pub name: String,
    pub measured: String,
    pub reference: String,
}

impl GapPair {
    pub fn new(
        name: impl Into<String>,
        measured: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            measured: measured.into(),
            reference: reference.into(),
        }
    }
}

/// Elementwise `measured[i] - reference[i]`, absent where either side is.
pub fn derive_gap(measured: &[Option<f64>], reference: &[Option<f64>]) -> Vec<Option<f64>> {
    measured
        .iter()
        .zip(reference)
        .map(|(m, r)| match (m, r) {
            (Some(m), Some(r)) => Some(m - r),
            _ => None,
        })
        .collect()
}

/// Computes the gap for `pair` and stores it in the dataset under `pair.name`.
/// Returns the number of absent positions in the new column.
pub fn apply_gap(dataset: &mut TimeIndexedDataset, pair: &GapPair) -> Result<usize> {
    let measured = dataset
        .column(&pair.measured)
        .ok_or_else(|| PipelineError::UnknownColumn(pair.measured.clone()))?;
    let reference = dataset
        .column(&pair.reference)
        .ok_or_else(|| PipelineError::UnknownColumn(pair.reference.clone()))?;

    let gap = derive_gap(measured, reference);
    let absent = gap.iter().filter(|v| v.is_none()).count();
    debug!(
        gap = %pair.name,
        measured = %pair.measured,
        reference = %pair.reference,
        absent,
        "derived gap column"
    );

    dataset.insert_column(pair.name.clone(), gap)?;
    Ok(absent)
}
