use chrono::NaiveDateTime;
use indexmap::IndexMap;
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsResult, Series, TimeUnit};
use serde::Serialize;

use crate::error::{PipelineError, Result};

/// One row of the working dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub values: IndexMap<String, Option<f64>>,
}

impl Sample {
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }
}

/// Column-oriented samples keyed by a strictly ascending timestamp axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeIndexedDataset {
    timestamps: Vec<NaiveDateTime>,
    columns: IndexMap<String, Vec<Option<f64>>>,
}

impl TimeIndexedDataset {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Result<Self> {
        if let Some(position) = timestamps
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(PipelineError::UnorderedTimeline {
                position: position + 1,
            });
        }
        Ok(Self {
            timestamps,
            columns: IndexMap::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn absent_count(&self, name: &str) -> Option<usize> {
        self.column(name)
            .map(|values| values.iter().filter(|v| v.is_none()).count())
    }

    /// A single column as `(timestamp, value)` pairs in time order.
    pub fn series(&self, name: &str) -> Result<Vec<(NaiveDateTime, Option<f64>)>> {
        let values = self
            .column(name)
            .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))?;
        Ok(self
            .timestamps
            .iter()
            .copied()
            .zip(values.iter().copied())
            .collect())
    }

    /// Adds a column, or overwrites it in place if the name already exists.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        self.check_length(&name, values.len())?;
        self.columns.insert(name, values);
        Ok(())
    }

    /// Swaps the series of an existing column, returning the previous one.
    pub fn replace_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<Vec<Option<f64>>> {
        self.check_length(name, values.len())?;
        let slot = self
            .columns
            .get_mut(name)
            .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))?;
        Ok(std::mem::replace(slot, values))
    }

    pub fn sample(&self, position: usize) -> Option<Sample> {
        let timestamp = *self.timestamps.get(position)?;
        let values = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values[position]))
            .collect();
        Some(Sample { timestamp, values })
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(move |position| self.sample(position))
    }

    /// Builds a DataFrame with a microsecond `Datetime` column followed by every
    /// numeric column in insertion order.
    pub fn to_dataframe(&self, timestamp_column: &str) -> PolarsResult<DataFrame> {
        let micros: Vec<i64> = self
            .timestamps
            .iter()
            .map(|ts| ts.and_utc().timestamp_micros())
            .collect();
        let ts_series = Series::new(timestamp_column.into(), micros)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

        let mut cols: Vec<Column> = Vec::with_capacity(self.columns.len() + 1);
        cols.push(ts_series.into());
        for (name, values) in &self.columns {
            cols.push(Series::new(name.as_str().into(), values.clone()).into());
        }

        DataFrame::new(cols)
    }

    fn check_length(&self, name: &str, found: usize) -> Result<()> {
        if found != self.len() {
            return Err(PipelineError::LengthMismatch {
                column: name.to_string(),
                expected: self.len(),
                found,
            });
        }
        Ok(())
    }
}
