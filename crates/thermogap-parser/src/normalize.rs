use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::IngestError;
use crate::model::RawTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// Values carry a trailing `%` that must be stripped before parsing.
    #[serde(default)]
    pub percent: bool,
}

impl ColumnSpec {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            percent: false,
        }
    }

    pub fn percent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            percent: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl NumericColumn {
    pub fn absent_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_none()).count()
    }
}

/// Coerces one raw cell into a number. Anything that does not parse as a
/// finite decimal is absent.
pub fn coerce_numeric(raw: &str, percent: bool) -> Option<f64> {
    let mut text = raw.trim();
    if percent {
        if let Some(stripped) = text.strip_suffix('%') {
            text = stripped.trim_end();
        }
    }
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn normalize_column(table: &RawTable, spec: &ColumnSpec) -> Result<NumericColumn, IngestError> {
    let values: Vec<Option<f64>> = table
        .column_text(&spec.name)?
        .into_iter()
        .map(|raw| coerce_numeric(raw, spec.percent))
        .collect();
    let column = NumericColumn {
        name: spec.name.clone(),
        values,
    };
    debug!(
        column = %column.name,
        percent = spec.percent,
        absent = column.absent_count(),
        "normalized column"
    );
    Ok(column)
}

/// Normalizes every configured column. Fails only when a column is missing
/// from the header; unparseable cells become absent.
pub fn normalize_columns(
    table: &RawTable,
    specs: &[ColumnSpec],
) -> Result<Vec<NumericColumn>, IngestError> {
    specs
        .iter()
        .map(|spec| normalize_column(table, spec))
        .collect()
}
