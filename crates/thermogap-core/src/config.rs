use std::collections::HashSet;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thermogap_parser::{ColumnSpec, MalformedRecordPolicy, RawTable, ReaderOptions};

use crate::error::{PipelineError, Result};
use crate::export::ChartLayout;
use crate::gaps::GapPair;
use crate::timeline::{parse_instant, SamplingGrid};

pub const DEFAULT_TIMESTAMP_COLUMN: &str = "timestamp";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub input: InputConfig,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub interpolation: InterpolationConfig,
    #[serde(default)]
    pub gaps: Vec<GapPair>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<i64>,
    /// Raw time column to audit against the synthesized grid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_timestamp_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub malformed_records: MalformedRecordPolicy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            malformed_records: MalformedRecordPolicy::default(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolationConfig {
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timestamp_column: default_timestamp_column(),
        }
    }
}

fn default_timestamp_column() -> String {
    DEFAULT_TIMESTAMP_COLUMN.to_string()
}

/// Column names for the two-container / ambient logger layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBindings {
    pub measured_1: String,
    pub measured_2: String,
    pub ambient: String,
    pub diff_1: String,
    pub diff_2: String,
}

impl Default for ColumnBindings {
    fn default() -> Self {
        Self {
            measured_1: "中央 Recorded Tmp（℃）".to_string(),
            measured_2: "間口 Recorded Tmp（℃）".to_string(),
            ambient: "Air tmp（℃）".to_string(),
            diff_1: "中央 Diff".to_string(),
            diff_2: "間口 Diff".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|err| PipelineError::InvalidConfig(format!("failed to parse TOML: {err}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| PipelineError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| {
            PipelineError::InvalidConfig(format!("failed to serialize configuration: {err}"))
        })
    }

    /// Two measured temperatures and two percent differences against an
    /// interpolated ambient reference, with one gap column per measurement.
    pub fn container_ambient(
        bindings: &ColumnBindings,
        start: NaiveDateTime,
        interval_minutes: i64,
    ) -> Self {
        Self {
            timeline: TimelineConfig {
                start: start.format("%Y-%m-%d %H:%M:%S").to_string(),
                interval_minutes: Some(interval_minutes),
                interval_seconds: None,
                source_timestamp_column: None,
            },
            input: InputConfig::default(),
            columns: vec![
                ColumnSpec::plain(&bindings.measured_1),
                ColumnSpec::plain(&bindings.measured_2),
                ColumnSpec::plain(&bindings.ambient),
                ColumnSpec::percent(&bindings.diff_1),
                ColumnSpec::percent(&bindings.diff_2),
            ],
            interpolation: InterpolationConfig {
                columns: vec![bindings.ambient.clone()],
            },
            gaps: vec![
                GapPair::new("Gap1_C1-Air", &bindings.measured_1, &bindings.ambient),
                GapPair::new("Gap2_C2-Air", &bindings.measured_2, &bindings.ambient),
            ],
            output: OutputConfig {
                timestamp_column: "Timestamp_fixed".to_string(),
            },
        }
    }

    pub fn validate(&self) -> Result<ValidatedConfig> {
        let start = parse_instant(&self.timeline.start).ok_or_else(|| {
            PipelineError::InvalidConfig(format!(
                "timeline.start '{}' is not a recognised date-time",
                self.timeline.start
            ))
        })?;
        let grid = SamplingGrid::new(start, self.interval()?)?;

        if !self.input.delimiter.is_ascii() {
            return Err(PipelineError::InvalidConfig(format!(
                "input.delimiter '{}' must be a single ASCII character",
                self.input.delimiter
            )));
        }

        if self.columns.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one column must be configured".to_string(),
            ));
        }

        let mut names: HashSet<&str> = HashSet::new();
        for spec in &self.columns {
            if spec.name.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "column names must not be empty".to_string(),
                ));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "column '{}' is configured more than once",
                    spec.name
                )));
            }
        }

        let mut targets: HashSet<&str> = HashSet::new();
        for target in &self.interpolation.columns {
            if !names.contains(target.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "interpolation target '{target}' is not a configured column"
                )));
            }
            if !targets.insert(target.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "interpolation target '{target}' is listed more than once"
                )));
            }
        }

        let mut derived: HashSet<&str> = HashSet::new();
        for pair in &self.gaps {
            for source in [&pair.measured, &pair.reference] {
                if !names.contains(source.as_str()) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "gap '{}' refers to unconfigured column '{source}'",
                        pair.name
                    )));
                }
            }
            if pair.name.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "gap names must not be empty".to_string(),
                ));
            }
            if names.contains(pair.name.as_str()) || !derived.insert(pair.name.as_str()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "gap name '{}' collides with another column",
                    pair.name
                )));
            }
        }

        let timestamp_column = self.output.timestamp_column.trim();
        if timestamp_column.is_empty()
            || names.contains(timestamp_column)
            || derived.contains(timestamp_column)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "output.timestamp_column '{timestamp_column}' must be non-empty and unique"
            )));
        }

        Ok(ValidatedConfig {
            grid,
            reader: ReaderOptions {
                delimiter: self.input.delimiter as u8,
                malformed_records: self.input.malformed_records,
            },
            columns: self.columns.clone(),
            interpolate: self.interpolation.columns.clone(),
            gaps: self.gaps.clone(),
            source_timestamp_column: self.timeline.source_timestamp_column.clone(),
            timestamp_column: timestamp_column.to_string(),
        })
    }

    fn interval(&self) -> Result<Duration> {
        let interval = match (self.timeline.interval_minutes, self.timeline.interval_seconds) {
            (Some(minutes), None) => Duration::try_minutes(minutes),
            (None, Some(seconds)) => Duration::try_seconds(seconds),
            (None, None) => {
                return Err(PipelineError::InvalidConfig(
                    "timeline needs interval_minutes or interval_seconds".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(PipelineError::InvalidConfig(
                    "timeline.interval_minutes and timeline.interval_seconds are mutually exclusive"
                        .to_string(),
                ))
            }
        };
        interval.ok_or_else(|| {
            PipelineError::InvalidConfig("timeline interval is out of range".to_string())
        })
    }
}

/// Configuration that has passed [`PipelineConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub grid: SamplingGrid,
    pub reader: ReaderOptions,
    pub columns: Vec<ColumnSpec>,
    pub interpolate: Vec<String>,
    pub gaps: Vec<GapPair>,
    pub source_timestamp_column: Option<String>,
    pub timestamp_column: String,
}

impl ValidatedConfig {
    /// Gap sources go on the temperature chart in column order; derived gaps
    /// go on the gap chart.
    pub fn chart_layout(&self) -> ChartLayout {
        let sources: HashSet<&str> = self
            .gaps
            .iter()
            .flat_map(|pair| [pair.measured.as_str(), pair.reference.as_str()])
            .collect();
        ChartLayout {
            temperatures: self
                .columns
                .iter()
                .filter(|spec| sources.contains(spec.name.as_str()))
                .map(|spec| spec.name.clone())
                .collect(),
            gaps: self.gaps.iter().map(|pair| pair.name.clone()).collect(),
        }
    }

    /// Every configured column (and the audited time column) must exist in
    /// the input header.
    pub fn check_header(&self, table: &RawTable) -> Result<()> {
        let missing: Vec<&str> = self
            .columns
            .iter()
            .map(|spec| spec.name.as_str())
            .chain(self.source_timestamp_column.as_deref())
            .filter(|name| !table.has_column(name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::InvalidConfig(format!(
                "input header is missing configured columns: {}",
                missing.join(", ")
            )))
        }
    }
}
