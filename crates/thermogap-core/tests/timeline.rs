use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

use thermogap_core::timeline::{audit_source_timestamps, parse_instant, SamplingGrid};
use thermogap_core::PipelineError;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 28)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

proptest! {
    #[test]
    fn grid_has_requested_length_and_constant_spacing(
        count in 0usize..500,
        minutes in 1i64..1440,
    ) {
        let interval = Duration::minutes(minutes);
        let grid = SamplingGrid::new(start(), interval).unwrap();
        let instants = grid.synthesize(count).unwrap();

        prop_assert_eq!(instants.len(), count);
        if let Some(first) = instants.first() {
            prop_assert_eq!(*first, start());
        }
        for pair in instants.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], interval);
        }
    }
}

#[test]
fn thirty_minute_grid_matches_logger_schedule() {
    let grid = SamplingGrid::new(start(), Duration::minutes(30)).unwrap();
    let instants = grid.synthesize(4).unwrap();

    let expected: Vec<NaiveDateTime> = ["10:30:00", "11:00:00", "11:30:00", "12:00:00"]
        .iter()
        .map(|t| parse_instant(&format!("2025-08-28 {t}")).unwrap())
        .collect();
    assert_eq!(instants, expected);
}

#[test]
fn grid_crosses_midnight() {
    let late = parse_instant("2025-08-28 23:30:00").unwrap();
    let grid = SamplingGrid::new(late, Duration::minutes(30)).unwrap();
    assert_eq!(
        grid.instant(2).unwrap(),
        parse_instant("2025-08-29 00:30:00").unwrap()
    );
}

#[test]
fn zero_or_negative_interval_is_invalid_config() {
    for interval in [Duration::zero(), Duration::minutes(-30)] {
        let err = SamplingGrid::new(start(), interval).expect_err("interval must be rejected");
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }
}

#[test]
fn grid_overflow_is_reported() {
    let grid = SamplingGrid::new(NaiveDateTime::MAX - Duration::days(1), Duration::hours(12))
        .unwrap();
    assert!(grid.instant(1).is_ok());
    assert!(matches!(
        grid.instant(3),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn parse_instant_accepts_logger_layouts() {
    let expected = start();
    for raw in [
        "2025-08-28 10:30:00",
        "2025-08-28T10:30:00",
        "2025-08-28 10:30",
        "2025/08/28 10:30",
        " 2025/08/28 10:30:00 ",
        "2025-08-28 10:30:00.000",
    ] {
        assert_eq!(parse_instant(raw), Some(expected), "layout {raw}");
    }
    assert_eq!(parse_instant("28.08.2025"), None);
}

#[test]
fn audit_flags_irregular_source_times_without_changing_grid() {
    let grid = SamplingGrid::new(start(), Duration::minutes(30))
        .unwrap()
        .synthesize(4)
        .unwrap();
    let raw = [
        "2025/08/28 10:30",
        "2025/08/28 11:00",
        "2025/08/28 11:47",
        "garbled",
    ];

    let audit = audit_source_timestamps("Timestamp", &grid, &raw);

    assert_eq!(audit.column, "Timestamp");
    assert_eq!(audit.compared, 4);
    assert_eq!(audit.mismatched, 1);
    assert_eq!(audit.unparseable, 1);
    assert_eq!(audit.first_mismatch, Some(2));
    assert!(!audit.is_clean());
}

#[test]
fn audit_of_matching_times_is_clean() {
    let grid = SamplingGrid::new(start(), Duration::minutes(30))
        .unwrap()
        .synthesize(2)
        .unwrap();
    let audit =
        audit_source_timestamps("Timestamp", &grid, &["2025-08-28 10:30", "2025-08-28 11:00"]);
    assert!(audit.is_clean());
    assert_eq!(audit.first_mismatch, None);
}
