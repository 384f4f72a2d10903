use chrono::{Duration, NaiveDate, NaiveDateTime};

use thermogap_core::gaps::{apply_gap, derive_gap, GapPair};
use thermogap_core::timeline::SamplingGrid;
use thermogap_core::{PipelineError, TimeIndexedDataset};

fn grid(count: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2025, 8, 28)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    SamplingGrid::new(start, Duration::minutes(30))
        .unwrap()
        .synthesize(count)
        .unwrap()
}

fn sample_dataset() -> TimeIndexedDataset {
    let mut dataset = TimeIndexedDataset::new(grid(3)).unwrap();
    dataset
        .insert_column("center", vec![Some(25.0), Some(26.5), None])
        .unwrap();
    dataset
        .insert_column("air", vec![Some(20.0), Some(21.0), Some(22.0)])
        .unwrap();
    dataset
}

#[test]
fn rejects_unordered_timestamps() {
    let mut times = grid(3);
    times.swap(1, 2);
    let err = TimeIndexedDataset::new(times).expect_err("unordered");
    assert!(matches!(err, PipelineError::UnorderedTimeline { position: 2 }));
}

#[test]
fn rejects_duplicate_timestamps() {
    let mut times = grid(2);
    times[1] = times[0];
    assert!(TimeIndexedDataset::new(times).is_err());
}

#[test]
fn columns_keep_insertion_order() {
    let dataset = sample_dataset();
    let names: Vec<&str> = dataset.column_names().collect();
    assert_eq!(names, vec!["center", "air"]);
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset.absent_count("center"), Some(1));
    assert_eq!(dataset.absent_count("missing"), None);
}

#[test]
fn series_pairs_values_with_timestamps() {
    let dataset = sample_dataset();
    let series = dataset.series("center").unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series[1], (dataset.timestamps()[1], Some(26.5)));
    assert!(matches!(
        dataset.series("nope"),
        Err(PipelineError::UnknownColumn(_))
    ));
}

#[test]
fn sample_lookup_by_position() {
    let dataset = sample_dataset();
    let sample = dataset.sample(2).unwrap();
    assert_eq!(sample.timestamp, dataset.timestamps()[2]);
    assert_eq!(sample.value("center"), None);
    assert_eq!(sample.value("air"), Some(22.0));
    assert!(dataset.sample(3).is_none());
    assert_eq!(dataset.samples().count(), 3);
}

#[test]
fn replace_column_checks_length_and_existence() {
    let mut dataset = sample_dataset();

    let previous = dataset
        .replace_column("air", vec![Some(1.0), Some(2.0), Some(3.0)])
        .unwrap();
    assert_eq!(previous, vec![Some(20.0), Some(21.0), Some(22.0)]);

    assert!(matches!(
        dataset.replace_column("air", vec![Some(1.0)]),
        Err(PipelineError::LengthMismatch { expected: 3, found: 1, .. })
    ));
    assert!(matches!(
        dataset.replace_column("ghost", vec![None; 3]),
        Err(PipelineError::UnknownColumn(_))
    ));
}

#[test]
fn gap_is_elementwise_difference() {
    let gap = derive_gap(
        &[Some(25.0), Some(26.0), None, Some(28.0)],
        &[Some(20.0), None, Some(22.0), Some(23.0)],
    );
    assert_eq!(gap, vec![Some(5.0), None, None, Some(5.0)]);
}

#[test]
fn apply_gap_appends_derived_column() {
    let mut dataset = sample_dataset();
    let pair = GapPair::new("Gap1_C1-Air", "center", "air");

    let absent = apply_gap(&mut dataset, &pair).unwrap();

    assert_eq!(absent, 1);
    assert_eq!(
        dataset.column("Gap1_C1-Air").unwrap(),
        &[Some(5.0), Some(5.5), None]
    );
    assert_eq!(dataset.column_names().last(), Some("Gap1_C1-Air"));
}

#[test]
fn apply_gap_requires_both_columns() {
    let mut dataset = sample_dataset();
    let pair = GapPair::new("gap", "center", "ambient");
    assert!(matches!(
        apply_gap(&mut dataset, &pair),
        Err(PipelineError::UnknownColumn(name)) if name == "ambient"
    ));
}

#[test]
fn dataframe_has_datetime_axis_and_numeric_columns() {
    let dataset = sample_dataset();
    let df = dataset.to_dataframe("Timestamp_fixed").unwrap();

    assert_eq!(df.height(), 3);
    assert_eq!(df.get_column_names(), vec!["Timestamp_fixed", "center", "air"]);
    let center = df.column("center").unwrap().f64().unwrap();
    assert_eq!(center.get(0), Some(25.0));
    assert_eq!(center.get(2), None);
    assert!(df.column("Timestamp_fixed").unwrap().datetime().is_ok());
}
