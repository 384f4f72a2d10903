use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

use crate::error::{PipelineError, Result};

static INSTANT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parses a wall-clock instant in any of the accepted layouts.
pub fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    INSTANT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// A fixed-interval time grid anchored at `start`.
///
/// The grid is authoritative: sample `i` sits at `start + i * interval`
/// regardless of any time column the source may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingGrid {
    start: NaiveDateTime,
    interval: Duration,
    interval_micros: i64,
}

impl SamplingGrid {
    pub fn new(start: NaiveDateTime, interval: Duration) -> Result<Self> {
        if interval <= Duration::zero() {
            return Err(PipelineError::InvalidConfig(format!(
                "sampling interval must be positive, got {interval}"
            )));
        }
        let interval_micros = interval.num_microseconds().ok_or_else(|| {
            PipelineError::InvalidConfig(format!("sampling interval {interval} is too large"))
        })?;
        Ok(Self {
            start,
            interval,
            interval_micros,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn instant(&self, position: usize) -> Result<NaiveDateTime> {
        let offset = i64::try_from(position)
            .ok()
            .and_then(|pos| pos.checked_mul(self.interval_micros))
            .and_then(|micros| self.start.checked_add_signed(Duration::microseconds(micros)));
        offset.ok_or_else(|| {
            PipelineError::InvalidConfig(format!(
                "sampling grid from {} overflows the calendar at position {position}",
                self.start
            ))
        })
    }

    pub fn synthesize(&self, count: usize) -> Result<Vec<NaiveDateTime>> {
        (0..count).map(|position| self.instant(position)).collect()
    }
}

/// How far a source time column strays from the synthesized grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimestampAudit {
    pub column: String,
    pub compared: usize,
    pub mismatched: usize,
    pub unparseable: usize,
    pub first_mismatch: Option<usize>,
}

impl TimestampAudit {
    pub fn is_clean(&self) -> bool {
        self.mismatched == 0 && self.unparseable == 0
    }
}

/// Compares raw source timestamps against the grid without changing either.
pub fn audit_source_timestamps(
    column: &str,
    grid: &[NaiveDateTime],
    raw: &[&str],
) -> TimestampAudit {
    let mut audit = TimestampAudit {
        column: column.to_string(),
        ..TimestampAudit::default()
    };

    for (position, (expected, value)) in grid.iter().zip(raw).enumerate() {
        audit.compared += 1;
        match parse_instant(value) {
            Some(parsed) if parsed == *expected => {}
            Some(_) => {
                audit.mismatched += 1;
                audit.first_mismatch.get_or_insert(position);
            }
            None => audit.unparseable += 1,
        }
    }

    if !audit.is_clean() {
        warn!(
            column,
            mismatched = audit.mismatched,
            unparseable = audit.unparseable,
            first_mismatch = audit.first_mismatch,
            "source timestamps disagree with the synthesized grid; the grid is kept"
        );
    }

    audit
}
