use chrono::{Duration, NaiveDate};
use forecast_pangan::data::Observation;
use forecast_pangan::{
    ForecastError, IterativeForecaster, MinMaxScaler, ModelInput, PredictionSequence, Result,
    SequenceAssembler, SequencePredictor, SEQ_LENGTH,
};
use pretty_assertions::assert_eq;
use std::sync::Mutex;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn egg_targets() -> Vec<String> {
    vec!["Telur Ayam Ras Segar".to_string()]
}

fn constant_seed(days: usize, price: f64) -> PredictionSequence {
    let targets = egg_targets();
    let start = date(2024, 1, 1);
    let observations: Vec<Observation> = (0..days)
        .map(|offset| Observation {
            date: start + Duration::days(offset as i64),
            series: targets[0].clone(),
            price,
        })
        .collect();
    SequenceAssembler::assemble(&observations, &targets).unwrap()
}

/// Identity scaler: min-max over [0, 1] leaves values untouched
fn identity_scaler(width: usize) -> MinMaxScaler {
    MinMaxScaler::new(vec![0.0; width], vec![1.0; width]).unwrap()
}

/// Predictor that echoes one feature of the newest window row
#[derive(Debug)]
struct EchoPredictor {
    feature_index: usize,
}

impl SequencePredictor for EchoPredictor {
    fn predict(&self, input: &ModelInput) -> Result<Vec<f64>> {
        let last_row = input.row(input.seq_len() - 1);
        Ok(vec![last_row[self.feature_index]])
    }

    fn target_count(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "feature echo"
    }
}

/// Predictor that records the shape of every input it sees
#[derive(Debug)]
struct ProbePredictor {
    shapes: Mutex<Vec<(usize, usize)>>,
    value: f64,
}

impl SequencePredictor for ProbePredictor {
    fn predict(&self, input: &ModelInput) -> Result<Vec<f64>> {
        self.shapes
            .lock()
            .unwrap()
            .push((input.seq_len(), input.feature_count()));
        Ok(vec![self.value])
    }

    fn target_count(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "shape probe"
    }
}

/// Predictor whose declared target count disagrees with its output
#[derive(Debug)]
struct LyingPredictor;

impl SequencePredictor for LyingPredictor {
    fn predict(&self, _input: &ModelInput) -> Result<Vec<f64>> {
        Ok(vec![1.0, 2.0])
    }

    fn target_count(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "lying predictor"
    }
}

#[test]
fn constant_history_forecasts_constant_prices() {
    let seed = constant_seed(90, 10_000.0);
    let feature_count = seed.feature_columns().len();

    // A predictor that returns its rolling-mean input unchanged must keep
    // reproducing the constant history
    let rolling_mean_30 = seed
        .feature_columns()
        .iter()
        .position(|c| c == "Telur Ayam Ras Segar_rolling_mean_30")
        .unwrap();
    let predictor = EchoPredictor {
        feature_index: rolling_mean_30,
    };
    let scaler_x = identity_scaler(feature_count);
    let scaler_y = identity_scaler(1);

    let forecaster = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y);
    let forecast = forecaster.forecast(&seed, 5).unwrap();

    assert_eq!(forecast.len(), 5);
    // Seed covers days 1..=90; forecasts are dated days 91..=95
    assert_eq!(forecast.start_date(), date(2024, 1, 1) + Duration::days(90));
    for row in 0..forecast.len() {
        assert_eq!(forecast.date_at(row), date(2024, 1, 1) + Duration::days(90 + row as i64));
        assert_eq!(forecast.rows()[row], vec![10_000.0]);
    }
}

#[test]
fn window_stays_fixed_size_through_the_rollout() {
    let seed = constant_seed(90, 10_000.0);
    let feature_count = seed.feature_columns().len();
    let predictor = ProbePredictor {
        shapes: Mutex::new(Vec::new()),
        value: 10_000.0,
    };
    let scaler_x = identity_scaler(feature_count);
    let scaler_y = identity_scaler(1);

    let forecaster = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y);
    let forecast = forecaster.forecast(&seed, 12).unwrap();
    assert_eq!(forecast.len(), 12);

    let shapes = predictor.shapes.lock().unwrap();
    assert_eq!(shapes.len(), 12);
    for shape in shapes.iter() {
        assert_eq!(*shape, (SEQ_LENGTH, feature_count));
    }
}

#[test]
fn seed_sequence_is_not_mutated() {
    let seed = constant_seed(90, 10_000.0);
    let before = seed.clone();
    let predictor = EchoPredictor { feature_index: 0 };
    let scaler_x = identity_scaler(seed.feature_columns().len());
    let scaler_y = identity_scaler(1);

    IterativeForecaster::new(&predictor, &scaler_x, &scaler_y)
        .forecast(&seed, 3)
        .unwrap();

    assert_eq!(seed, before);
}

/// Predictor that returns a fixed value while recording one feature of the
/// newest window row
#[derive(Debug)]
struct RecordingPredictor {
    feature_index: usize,
    seen: Mutex<Vec<f64>>,
    value: f64,
}

impl SequencePredictor for RecordingPredictor {
    fn predict(&self, input: &ModelInput) -> Result<Vec<f64>> {
        let last_row = input.row(input.seq_len() - 1);
        self.seen.lock().unwrap().push(last_row[self.feature_index]);
        Ok(vec![self.value])
    }

    fn target_count(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "recording predictor"
    }
}

#[test]
fn predictions_are_fed_back_without_clamping() {
    // An implausible negative prediction must flow into the next step's lag
    // features unmodified
    let seed = constant_seed(90, 10_000.0);
    let lag_1 = seed
        .feature_columns()
        .iter()
        .position(|c| c == "Telur Ayam Ras Segar_lag_1")
        .unwrap();
    let predictor = RecordingPredictor {
        feature_index: lag_1,
        seen: Mutex::new(Vec::new()),
        value: -500.0,
    };
    let scaler_x = identity_scaler(seed.feature_columns().len());
    let scaler_y = identity_scaler(1);

    let forecaster = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y);
    let forecast = forecaster.forecast(&seed, 3).unwrap();
    assert_eq!(forecast.rows()[0], vec![-500.0]);

    // The synthetic row appended after step one is dated one day ahead, so
    // its lag_1 still points at real history; the row appended after step
    // two is the first whose lag_1 carries the negative synthetic price
    let seen = predictor.seen.lock().unwrap();
    assert_eq!(*seen, vec![10_000.0, 10_000.0, -500.0]);
}

#[test]
fn feature_scaler_width_is_checked_up_front() {
    let seed = constant_seed(90, 10_000.0);
    let predictor = EchoPredictor { feature_index: 0 };
    let scaler_x = identity_scaler(3);
    let scaler_y = identity_scaler(1);

    let result = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y).forecast(&seed, 5);
    assert!(matches!(result, Err(ForecastError::ScalerMismatch(_))));
}

#[test]
fn predictor_output_width_aborts_the_whole_forecast() {
    let seed = constant_seed(90, 10_000.0);
    let predictor = LyingPredictor;
    let scaler_x = identity_scaler(seed.feature_columns().len());
    let scaler_y = identity_scaler(1);

    let result = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y).forecast(&seed, 5);
    assert!(matches!(result, Err(ForecastError::ShapeMismatch(_))));
}

#[test]
fn zero_horizon_is_rejected() {
    let seed = constant_seed(90, 10_000.0);
    let predictor = EchoPredictor { feature_index: 0 };
    let scaler_x = identity_scaler(seed.feature_columns().len());
    let scaler_y = identity_scaler(1);

    let result = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y).forecast(&seed, 0);
    assert!(matches!(result, Err(ForecastError::InvalidParameter(_))));
}

#[test]
fn forecast_matrix_converts_to_dataframe() {
    let seed = constant_seed(90, 10_000.0);
    let predictor = EchoPredictor { feature_index: 0 };
    let scaler_x = identity_scaler(seed.feature_columns().len());
    let scaler_y = identity_scaler(1);

    let forecast = IterativeForecaster::new(&predictor, &scaler_x, &scaler_y)
        .forecast(&seed, 4)
        .unwrap();
    let df = forecast.to_dataframe().unwrap();

    assert_eq!(df.height(), 4);
    assert_eq!(df.width(), 2);
    assert_eq!(df.get_column_names(), &["date", "Telur Ayam Ras Segar"]);
}
