use approx::assert_relative_eq;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use thermogap_core::interpolate::{fill_column, fill_time_weighted, FillStatus, InterpolationError};
use thermogap_core::timeline::SamplingGrid;
use thermogap_core::{PipelineError, TimeIndexedDataset};

fn half_hourly(count: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2025, 8, 28)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    SamplingGrid::new(start, Duration::minutes(30))
        .unwrap()
        .synthesize(count)
        .unwrap()
}

#[test]
fn interior_gap_is_linear_in_time() {
    let times = half_hourly(4);
    let fill = fill_time_weighted(&times, &[Some(5.0), None, None, Some(11.0)]).unwrap();

    assert_eq!(fill.status, FillStatus::Complete);
    assert_eq!(fill.filled, 2);
    assert_eq!(fill.values, vec![Some(5.0), Some(7.0), Some(9.0), Some(11.0)]);
}

#[test]
fn leading_gap_takes_first_known_value() {
    let times = half_hourly(4);
    let fill = fill_time_weighted(&times, &[None, None, Some(3.0), Some(4.0)]).unwrap();
    assert_eq!(fill.values, vec![Some(3.0), Some(3.0), Some(3.0), Some(4.0)]);
    assert_eq!(fill.filled, 2);
}

#[test]
fn trailing_gap_takes_last_known_value() {
    let times = half_hourly(4);
    let fill = fill_time_weighted(&times, &[Some(3.0), Some(4.0), None, None]).unwrap();
    assert_eq!(fill.values, vec![Some(3.0), Some(4.0), Some(4.0), Some(4.0)]);
}

#[test]
fn all_absent_series_is_left_absent() {
    let times = half_hourly(5);
    let fill = fill_time_weighted(&times, &[None; 5]).unwrap();

    assert_eq!(fill.status, FillStatus::EmptySeries);
    assert_eq!(fill.filled, 0);
    assert_eq!(fill.values, vec![None; 5]);
}

#[test]
fn empty_input_is_an_empty_series() {
    let times: Vec<NaiveDateTime> = Vec::new();
    let fill = fill_time_weighted(&times, &[]).unwrap();
    assert_eq!(fill.status, FillStatus::EmptySeries);
    assert!(fill.values.is_empty());
}

#[test]
fn single_known_value_fills_everything() {
    let times = half_hourly(3);
    let fill = fill_time_weighted(&times, &[None, Some(21.5), None]).unwrap();
    assert_eq!(fill.values, vec![Some(21.5); 3]);
}

#[test]
fn uneven_spacing_weights_by_elapsed_time() {
    // Known at t=0 and t=100, gaps at t=10 and t=60.
    let times: Vec<i64> = vec![0, 10, 60, 100];
    let fill = fill_time_weighted(&times, &[Some(0.0), None, None, Some(50.0)]).unwrap();

    assert_relative_eq!(fill.values[1].unwrap(), 5.0);
    assert_relative_eq!(fill.values[2].unwrap(), 30.0);
}

#[test]
fn zoned_timestamps_weight_by_elapsed_time() {
    let base = Utc.with_ymd_and_hms(2025, 8, 28, 10, 30, 0).unwrap();
    // Known at 10:30 and 12:30, gaps at 10:40 and 12:00.
    let times: Vec<DateTime<Utc>> = [0, 10, 90, 120]
        .iter()
        .map(|minutes| base + Duration::minutes(*minutes))
        .collect();
    let fill = fill_time_weighted(&times, &[Some(20.0), None, None, Some(26.0)]).unwrap();

    assert_eq!(fill.status, FillStatus::Complete);
    assert_relative_eq!(fill.values[1].unwrap(), 20.5);
    assert_relative_eq!(fill.values[2].unwrap(), 24.5);
}

#[test]
fn known_values_are_never_altered() {
    let times = half_hourly(6);
    let input = [Some(1.0), None, Some(-2.0), Some(8.5), None, Some(4.0)];
    let fill = fill_time_weighted(&times, &input).unwrap();

    for (before, after) in input.iter().zip(&fill.values) {
        if let Some(value) = before {
            assert_eq!(after, &Some(*value));
        }
    }
    assert_relative_eq!(fill.values[1].unwrap(), -0.5);
    assert_relative_eq!(fill.values[4].unwrap(), 6.25);
}

#[test]
fn length_mismatch_is_rejected() {
    let times = half_hourly(3);
    let err = fill_time_weighted(&times, &[Some(1.0)]).expect_err("mismatch");
    assert!(matches!(
        err,
        InterpolationError::LengthMismatch { times: 3, values: 1 }
    ));
}

#[test]
fn fill_column_updates_dataset_in_place() {
    let mut dataset = TimeIndexedDataset::new(half_hourly(4)).unwrap();
    dataset
        .insert_column("air", vec![Some(20.0), None, None, Some(23.0)])
        .unwrap();

    let fill = fill_column(&mut dataset, "air").unwrap();

    assert_eq!(fill.filled, 2);
    assert_eq!(
        dataset.column("air").unwrap(),
        &[Some(20.0), Some(21.0), Some(22.0), Some(23.0)]
    );
}

#[test]
fn fill_column_rejects_unknown_column() {
    let mut dataset = TimeIndexedDataset::new(half_hourly(2)).unwrap();
    let err = fill_column(&mut dataset, "air").expect_err("unknown column");
    assert!(matches!(err, PipelineError::UnknownColumn(name) if name == "air"));
}
