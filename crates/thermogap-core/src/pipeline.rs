use std::path::Path;

use serde::Serialize;
use thermogap_parser::{normalize_columns, read_from, read_path, RawTable, SkippedRecord};
use tracing::{info, warn};

use crate::config::{PipelineConfig, ValidatedConfig};
use crate::dataset::TimeIndexedDataset;
use crate::error::Result;
use crate::gaps::apply_gap;
use crate::interpolate::{fill_column, FillStatus};
use crate::timeline::{audit_source_timestamps, TimestampAudit};

/// Non-fatal conditions encountered during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// An interpolation target had no known value at all.
    EmptySeries { column: String },
    SkippedRecord {
        line_index: usize,
        expected: usize,
        found: usize,
    },
    TimestampMismatch {
        column: String,
        mismatched: usize,
        unparseable: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub absent_before: usize,
    pub absent_after: usize,
    pub interpolated: bool,
    pub derived: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub rows: usize,
    pub columns: Vec<ColumnReport>,
    pub timestamp_audit: Option<TimestampAudit>,
    pub warnings: Vec<PipelineWarning>,
}

impl RunReport {
    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|report| report.name == name)
    }

    pub fn has_empty_series(&self) -> bool {
        self.warnings
            .iter()
            .any(|warning| matches!(warning, PipelineWarning::EmptySeries { .. }))
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub dataset: TimeIndexedDataset,
    pub report: RunReport,
}

/// The normalize → interpolate → derive pipeline, parameterized entirely by
/// its configuration. One instance can be run over any number of sources.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ValidatedConfig,
}

impl Pipeline {
    pub fn new(config: ValidatedConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(config.validate()?))
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn run_path(&self, path: &Path) -> Result<PipelineOutput> {
        info!(path = %path.display(), "reading sensor log");
        let table = read_path(path, &self.config.reader)?;
        self.run_table(&table)
    }

    pub fn run_str(&self, content: &str) -> Result<PipelineOutput> {
        let table = read_from(content.as_bytes(), &self.config.reader)?;
        self.run_table(&table)
    }

    pub fn run_table(&self, table: &RawTable) -> Result<PipelineOutput> {
        let config = &self.config;
        config.check_header(table)?;

        let mut report = RunReport {
            rows: table.len(),
            ..RunReport::default()
        };
        report
            .warnings
            .extend(table.skipped().iter().map(skipped_warning));

        let timestamps = config.grid.synthesize(table.len())?;
        info!(
            rows = table.len(),
            start = %config.grid.start(),
            interval = %config.grid.interval(),
            "synthesized sampling grid"
        );

        if let Some(column) = config.source_timestamp_column.as_deref() {
            let raw = table.column_text(column)?;
            let audit = audit_source_timestamps(column, &timestamps, &raw);
            if !audit.is_clean() {
                report.warnings.push(PipelineWarning::TimestampMismatch {
                    column: column.to_string(),
                    mismatched: audit.mismatched,
                    unparseable: audit.unparseable,
                });
            }
            report.timestamp_audit = Some(audit);
        }

        let mut dataset = TimeIndexedDataset::new(timestamps)?;
        for column in normalize_columns(table, &config.columns)? {
            let absent = column.absent_count();
            report.columns.push(ColumnReport {
                name: column.name.clone(),
                absent_before: absent,
                absent_after: absent,
                interpolated: false,
                derived: false,
            });
            dataset.insert_column(column.name, column.values)?;
        }

        for target in &config.interpolate {
            let fill = fill_column(&mut dataset, target)?;
            if fill.status == FillStatus::EmptySeries {
                report.warnings.push(PipelineWarning::EmptySeries {
                    column: target.clone(),
                });
            }
            if let Some(entry) = report.columns.iter_mut().find(|c| &c.name == target) {
                entry.absent_after = dataset.absent_count(target).unwrap_or(entry.absent_before);
                entry.interpolated = true;
            }
        }

        for pair in &config.gaps {
            let absent = apply_gap(&mut dataset, pair)?;
            report.columns.push(ColumnReport {
                name: pair.name.clone(),
                absent_before: absent,
                absent_after: absent,
                interpolated: false,
                derived: true,
            });
        }

        if report.has_empty_series() {
            warn!("run finished with empty interpolation targets");
        }
        info!(
            rows = dataset.len(),
            columns = report.columns.len(),
            warnings = report.warnings.len(),
            "pipeline run complete"
        );

        Ok(PipelineOutput { dataset, report })
    }
}

fn skipped_warning(skipped: &SkippedRecord) -> PipelineWarning {
    PipelineWarning::SkippedRecord {
        line_index: skipped.line_index,
        expected: skipped.expected,
        found: skipped.found,
    }
}
