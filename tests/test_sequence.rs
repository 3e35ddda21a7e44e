use chrono::{Duration, NaiveDate};
use forecast_pangan::data::Observation;
use forecast_pangan::{ForecastError, SequenceAssembler, SEQ_LENGTH};
use pretty_assertions::assert_eq;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn constant_observations(series: &str, days: usize, price: f64) -> Vec<Observation> {
    let start = date(2024, 1, 1);
    (0..days)
        .map(|offset| Observation {
            date: start + Duration::days(offset as i64),
            series: series.to_string(),
            price,
        })
        .collect()
}

fn egg_targets() -> Vec<String> {
    vec!["Telur Ayam Ras Segar".to_string()]
}

#[test]
fn assembles_the_last_thirty_valid_rows() {
    let targets = egg_targets();
    let observations = constant_observations(&targets[0], 90, 10_000.0);

    let sequence = SequenceAssembler::assemble(&observations, &targets).unwrap();

    assert_eq!(sequence.len(), SEQ_LENGTH);
    // 2 scalar + 7 weekday + 12 month calendar columns, 5 lags + 2 windows
    assert_eq!(sequence.feature_columns().len(), 21 + 7);
    assert_eq!(sequence.last_date(), date(2024, 1, 1) + Duration::days(89));
    assert_eq!(sequence.start_date(), date(2024, 1, 1) + Duration::days(60));

    // Window dates are consecutive
    for pair in sequence.dates().windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::days(1));
    }
}

#[test]
fn column_order_is_targets_then_calendar_then_lag_rolling() {
    let targets = egg_targets();
    let observations = constant_observations(&targets[0], 90, 10_000.0);

    let sequence = SequenceAssembler::assemble(&observations, &targets).unwrap();
    let features = sequence.feature_columns();

    assert_eq!(features[0], "is_weekend");
    assert_eq!(features[1], "trend");
    assert_eq!(features[2], "day_of_week_0");
    assert_eq!(features[9], "month_1");
    assert_eq!(features[21], "Telur Ayam Ras Segar_lag_1");
    assert_eq!(features[25], "Telur Ayam Ras Segar_lag_30");
    assert_eq!(features[26], "Telur Ayam Ras Segar_rolling_mean_7");
    assert_eq!(features[27], "Telur Ayam Ras Segar_rolling_mean_30");

    // Target values lead every row
    assert_eq!(sequence.target_row(0), &[10_000.0]);
    assert_eq!(sequence.row(0)[0], 10_000.0);
}

#[test]
fn assembly_is_idempotent() {
    let targets = egg_targets();
    let observations = constant_observations(&targets[0], 75, 12_500.0);

    let first = SequenceAssembler::assemble(&observations, &targets).unwrap();
    let second = SequenceAssembler::assemble(&observations, &targets).unwrap();

    assert_eq!(first, second);
}

#[test]
fn insufficient_history_reports_counts() {
    let targets = egg_targets();
    // 40 calendar days leave only 10 rows with full 30-day lookback
    let observations = constant_observations(&targets[0], 40, 10_000.0);

    let result = SequenceAssembler::assemble(&observations, &targets);
    match result {
        Err(ForecastError::InsufficientHistory {
            required,
            available,
        }) => {
            assert_eq!(required, SEQ_LENGTH);
            assert_eq!(available, 10);
        }
        other => panic!("Expected InsufficientHistory, got {:?}", other),
    }
}

#[test]
fn configured_target_without_data_never_pads() {
    // Observations only cover eggs; rice is injected as all-missing, so no
    // row survives the drop and assembly must fail rather than guess
    let mut targets = egg_targets();
    targets.push("Beras Kualitas Super I".to_string());
    let observations = constant_observations(&targets[0], 90, 10_000.0);

    let result = SequenceAssembler::assemble(&observations, &targets);
    match result {
        Err(ForecastError::InsufficientHistory {
            required,
            available,
        }) => {
            assert_eq!(required, SEQ_LENGTH);
            assert_eq!(available, 0);
        }
        other => panic!("Expected InsufficientHistory, got {:?}", other),
    }
}

#[test]
fn lag_features_match_shifted_prices_in_the_sequence() {
    let targets = egg_targets();
    let start = date(2024, 1, 1);
    let observations: Vec<Observation> = (0..90)
        .map(|offset| Observation {
            date: start + Duration::days(offset),
            series: targets[0].clone(),
            price: 10_000.0 + offset as f64 * 10.0,
        })
        .collect();

    let sequence = SequenceAssembler::assemble(&observations, &targets).unwrap();

    // Row dates run from day 60 to day 89; lag_7 looks back seven days
    let lag_7 = sequence
        .feature_columns()
        .iter()
        .position(|c| c == "Telur Ayam Ras Segar_lag_7")
        .unwrap();
    for row in 0..sequence.len() {
        let day = 60.0 + row as f64;
        assert_eq!(sequence.target_row(row)[0], 10_000.0 + day * 10.0);
        assert_eq!(
            sequence.feature_row(row)[lag_7],
            10_000.0 + (day - 7.0) * 10.0
        );
    }
}
