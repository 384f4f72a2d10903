use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::dataset::TimeIndexedDataset;
use crate::error::{PipelineError, Result};

#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("time axis has {times} points but the series has {values}")]
    LengthMismatch { times: usize, values: usize },
}

/// A point on a time axis, reduced to microseconds since an arbitrary epoch.
pub trait TimeAxis {
    fn axis_micros(&self) -> i64;
}

impl TimeAxis for NaiveDateTime {
    fn axis_micros(&self) -> i64 {
        self.and_utc().timestamp_micros()
    }
}

impl<Tz: TimeZone> TimeAxis for DateTime<Tz> {
    fn axis_micros(&self) -> i64 {
        self.timestamp_micros()
    }
}

impl TimeAxis for i64 {
    fn axis_micros(&self) -> i64 {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Complete,
    /// No known value to anchor on; the series is returned unchanged.
    EmptySeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GapFill {
    pub values: Vec<Option<f64>>,
    pub filled: usize,
    pub status: FillStatus,
}

/// Fills absent values by linear interpolation in elapsed time.
///
/// Interior gaps between known `(t0, v0)` and `(t1, v1)` become
/// `v0 + (v1 - v0) * (t - t0) / (t1 - t0)`. Leading gaps take the first known
/// value and trailing gaps the last one. `times` is expected in ascending
/// order; a non-increasing span falls back to its left value.
pub fn fill_time_weighted<T: TimeAxis>(
    times: &[T],
    values: &[Option<f64>],
) -> std::result::Result<GapFill, InterpolationError> {
    if times.len() != values.len() {
        return Err(InterpolationError::LengthMismatch {
            times: times.len(),
            values: values.len(),
        });
    }

    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| value.map(|v| (idx, v)))
        .collect();

    let (Some(&(first_idx, first_value)), Some(&(last_idx, last_value))) =
        (known.first(), known.last())
    else {
        return Ok(GapFill {
            values: values.to_vec(),
            filled: 0,
            status: FillStatus::EmptySeries,
        });
    };

    let mut output = values.to_vec();
    let mut filled = 0usize;

    for slot in &mut output[..first_idx] {
        *slot = Some(first_value);
        filled += 1;
    }
    for slot in &mut output[last_idx + 1..] {
        *slot = Some(last_value);
        filled += 1;
    }

    for window in known.windows(2) {
        let (left_idx, v0) = window[0];
        let (right_idx, v1) = window[1];
        if right_idx == left_idx + 1 {
            continue;
        }

        let t0 = times[left_idx].axis_micros() as i128;
        let t1 = times[right_idx].axis_micros() as i128;
        let span = (t1 - t0) as f64;

        for idx in left_idx + 1..right_idx {
            let value = if span > 0.0 {
                let elapsed = (times[idx].axis_micros() as i128 - t0) as f64;
                v0 + (v1 - v0) * elapsed / span
            } else {
                v0
            };
            output[idx] = Some(value);
            filled += 1;
        }
    }

    Ok(GapFill {
        values: output,
        filled,
        status: FillStatus::Complete,
    })
}

/// Interpolates one dataset column in place.
pub fn fill_column(dataset: &mut TimeIndexedDataset, column: &str) -> Result<GapFill> {
    let values = dataset
        .column(column)
        .ok_or_else(|| PipelineError::UnknownColumn(column.to_string()))?;
    let fill = fill_time_weighted(dataset.timestamps(), values)?;

    match fill.status {
        FillStatus::Complete => {
            debug!(column, filled = fill.filled, "interpolated column");
        }
        FillStatus::EmptySeries => {
            warn!(
                column,
                rows = dataset.len(),
                "column has no known values; left absent"
            );
        }
    }

    dataset.replace_column(column, fill.values.clone())?;
    Ok(fill)
}
