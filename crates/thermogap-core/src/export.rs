use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use polars::prelude::{CsvWriter, ParquetWriter, PolarsError, SerWriter};
use rust_xlsxwriter::{Chart, ChartLegendPosition, ChartType, Format, Workbook, XlsxError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::dataset::TimeIndexedDataset;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const EXCEL_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DATA_SHEET: &str = "Data";
const EXCEL_MAX_ROWS: usize = 1_048_576;
const EXCEL_MAX_COLUMNS: usize = 16_384;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export target '{0}' (expected .csv, .parquet, .json or .xlsx)")]
    UnsupportedFormat(String),
    #[error("dataset of {rows} rows and {columns} columns does not fit in one worksheet")]
    SheetLimit { rows: usize, columns: usize },
    #[error("Spreadsheet write failed: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Parquet,
    Json,
    Xlsx,
}

impl ExportFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            "json" => Ok(ExportFormat::Json),
            "xlsx" => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// Which dataset columns the spreadsheet charts plot. An empty list leaves
/// that chart out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartLayout {
    /// Plotted together on a line chart.
    pub temperatures: Vec<String>,
    /// Plotted together on a column chart.
    pub gaps: Vec<String>,
}

pub fn write_csv<W: Write>(
    dataset: &TimeIndexedDataset,
    timestamp_column: &str,
    writer: W,
) -> Result<(), ExportError> {
    let mut df = dataset.to_dataframe(timestamp_column)?;
    CsvWriter::new(writer)
        .include_header(true)
        .with_datetime_format(Some(DATETIME_FORMAT.to_string()))
        .finish(&mut df)?;
    Ok(())
}

pub fn write_parquet<W: Write>(
    dataset: &TimeIndexedDataset,
    timestamp_column: &str,
    writer: W,
) -> Result<(), ExportError> {
    let mut df = dataset.to_dataframe(timestamp_column)?;
    ParquetWriter::new(writer).finish(&mut df)?;
    Ok(())
}

/// Writes a JSON array with one flat object per sample; absent values are `null`.
pub fn write_json<W: Write>(
    dataset: &TimeIndexedDataset,
    timestamp_column: &str,
    writer: W,
) -> Result<(), ExportError> {
    let records: Vec<Value> = dataset
        .samples()
        .map(|sample| {
            let mut record = Map::with_capacity(sample.values.len() + 1);
            record.insert(
                timestamp_column.to_string(),
                Value::String(sample.timestamp.format(DATETIME_FORMAT).to_string()),
            );
            for (name, value) in sample.values {
                record.insert(name, value.map_or(Value::Null, Value::from));
            }
            Value::Object(record)
        })
        .collect();
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

/// Writes a workbook with one `Data` sheet (timestamp column first, absent
/// values left blank) and the charts named by `charts`, both keyed on the
/// timestamp column.
pub fn write_xlsx<W: Write>(
    dataset: &TimeIndexedDataset,
    timestamp_column: &str,
    charts: &ChartLayout,
    mut writer: W,
) -> Result<(), ExportError> {
    let names: Vec<&str> = dataset.column_names().collect();
    let rows = dataset.len();
    if rows + 1 > EXCEL_MAX_ROWS || names.len() + 1 > EXCEL_MAX_COLUMNS {
        return Err(ExportError::SheetLimit {
            rows,
            columns: names.len() + 1,
        });
    }

    let mut workbook = Workbook::new();
    let datetime_format = Format::new().set_num_format(EXCEL_DATETIME_FORMAT);
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DATA_SHEET)?;
    worksheet.set_column_width(0, 20)?;
    worksheet.write_string_with_format(0, 0, timestamp_column, &header_format)?;
    for (idx, name) in names.iter().enumerate() {
        worksheet.write_string_with_format(0, (idx + 1) as u16, *name, &header_format)?;
    }

    for (pos, timestamp) in dataset.timestamps().iter().enumerate() {
        let row = (pos + 1) as u32;
        worksheet.write_datetime_with_format(row, 0, timestamp, &datetime_format)?;
        for (idx, name) in names.iter().enumerate() {
            if let Some(value) = dataset.column(name).and_then(|values| values[pos]) {
                worksheet.write_number(row, (idx + 1) as u16, value)?;
            }
        }
    }

    if rows > 0 {
        let anchor_col = (names.len() + 2) as u16;
        let last_row = rows as u32;
        let placements = [
            (
                ChartType::Line,
                &charts.temperatures,
                "Container vs Ambient Temperature",
                "Temperature (°C)",
                1,
            ),
            (
                ChartType::Column,
                &charts.gaps,
                "Temperature Gap",
                "Δ Temp (°C)",
                24,
            ),
        ];

        for (chart_type, columns, title, y_axis, anchor_row) in placements {
            let plotted: Vec<(u16, &str)> = columns
                .iter()
                .filter_map(|column| {
                    names
                        .iter()
                        .position(|name| *name == column.as_str())
                        .map(|idx| ((idx + 1) as u16, column.as_str()))
                })
                .collect();
            if plotted.is_empty() {
                continue;
            }

            let mut chart = Chart::new(chart_type);
            for (col, name) in plotted {
                chart
                    .add_series()
                    .set_name(name)
                    .set_categories((DATA_SHEET, 1, 0, last_row, 0))
                    .set_values((DATA_SHEET, 1, col, last_row, col));
            }
            chart.title().set_name(title);
            chart.x_axis().set_name(timestamp_column);
            chart.y_axis().set_name(y_axis);
            chart.legend().set_position(ChartLegendPosition::Top);
            worksheet.insert_chart(anchor_row, anchor_col, &chart)?;
        }
    }

    writer.write_all(&workbook.save_to_buffer()?)?;
    Ok(())
}

pub fn export_to_path(
    dataset: &TimeIndexedDataset,
    timestamp_column: &str,
    charts: &ChartLayout,
    path: &Path,
) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::from_path(path)?;
    let mut writer = BufWriter::new(File::create(path)?);

    match format {
        ExportFormat::Csv => write_csv(dataset, timestamp_column, &mut writer)?,
        ExportFormat::Parquet => write_parquet(dataset, timestamp_column, &mut writer)?,
        ExportFormat::Json => write_json(dataset, timestamp_column, &mut writer)?,
        ExportFormat::Xlsx => write_xlsx(dataset, timestamp_column, charts, &mut writer)?,
    }
    writer.flush()?;

    info!(
        path = %path.display(),
        format = format.as_str(),
        rows = dataset.len(),
        "exported dataset"
    );
    Ok(format)
}
