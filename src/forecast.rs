//! Iterative (autoregressive) multi-step forecasting
//!
//! Each step predicts one day, materializes the prediction as a synthetic
//! observation, regenerates calendar and lag/rolling features over the
//! extended history, and slides the fixed-length window forward, so the
//! model always sees an input shaped like its training distribution.

use crate::data::PriceTable;
use crate::error::{ForecastError, Result};
use crate::features::sequence::PredictionSequence;
use crate::features::{date, lag};
use crate::model::{ModelInput, Scaler, SequencePredictor};
use chrono::{Duration, NaiveDate};
use log::debug;
use polars::prelude::*;

/// Default number of future days to forecast
pub const DEFAULT_HORIZON: usize = 30;

/// Dated matrix of predicted prices, one row per future day
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastMatrix {
    start: NaiveDate,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ForecastMatrix {
    /// Date of the first forecast row
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Date of the given row
    pub fn date_at(&self, row: usize) -> NaiveDate {
        self.start + Duration::days(row as i64)
    }

    /// Target column names, in configuration order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Predicted rows in chronological order, prices in original units
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of forecast days
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the matrix holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Predicted value at (row, named column)
    pub fn value(&self, row: usize, column: &str) -> Result<f64> {
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!("Unknown target column '{}'", column))
            })?;
        Ok(self.rows[row][index])
    }

    /// Convert to a polars DataFrame with a `date` column, for chart and
    /// export layers
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = Vec::with_capacity(self.columns.len() + 1);
        let dates: Vec<String> = (0..self.len()).map(|i| self.date_at(i).to_string()).collect();
        series.push(Series::new("date", dates));
        for (index, name) in self.columns.iter().enumerate() {
            let values: Vec<f64> = self.rows.iter().map(|row| row[index]).collect();
            series.push(Series::new(name.as_str(), values));
        }
        Ok(DataFrame::new(series)?)
    }
}

/// Iterative forecaster feeding each prediction back as a synthetic
/// observation.
///
/// The predictor and scalers are read-only during inference and may be
/// shared across concurrent requests; the working window is private to each
/// [`forecast`](IterativeForecaster::forecast) call.
#[derive(Debug)]
pub struct IterativeForecaster<'a> {
    predictor: &'a dyn SequencePredictor,
    scaler_x: &'a dyn Scaler,
    scaler_y: &'a dyn Scaler,
}

impl<'a> IterativeForecaster<'a> {
    /// Create a forecaster over a trained predictor and its fitted scalers
    pub fn new(
        predictor: &'a dyn SequencePredictor,
        scaler_x: &'a dyn Scaler,
        scaler_y: &'a dyn Scaler,
    ) -> Self {
        Self {
            predictor,
            scaler_x,
            scaler_y,
        }
    }

    /// Produce `horizon` predicted rows, one per consecutive future day
    /// starting the day after the seed's last date.
    ///
    /// The seed is not mutated; the loop works on its own copy. Predictions
    /// are never clamped or bounded before being fed back, matching the
    /// training-time feature distribution. Any predictor or scaler failure
    /// aborts the whole forecast: every step depends on every prior step's
    /// synthetic data, so there is no valid partial result.
    pub fn forecast(
        &self,
        seed: &PredictionSequence,
        horizon: usize,
    ) -> Result<ForecastMatrix> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }

        let targets = seed.target_columns().to_vec();
        let feature_count = seed.feature_columns().len();
        if self.scaler_x.width() != feature_count {
            return Err(ForecastError::ScalerMismatch(format!(
                "Feature scaler was fitted on {} columns, sequence has {}",
                self.scaler_x.width(),
                feature_count
            )));
        }
        if self.scaler_y.width() != targets.len() {
            return Err(ForecastError::ScalerMismatch(format!(
                "Target scaler was fitted on {} columns, sequence has {}",
                self.scaler_y.width(),
                targets.len()
            )));
        }
        if self.predictor.target_count() != targets.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "Predictor produces {} target values, sequence has {} target columns",
                self.predictor.target_count(),
                targets.len()
            )));
        }

        let mut window = seed.clone();
        let seed_rows: Vec<Vec<f64>> = (0..seed.len())
            .map(|row| seed.target_row(row).to_vec())
            .collect();
        let mut history = PriceTable::from_rows(seed.start_date(), &targets, &seed_rows)?;

        debug!(
            "Forecasting {} days for {:?} from seed ending {}",
            horizon,
            targets,
            seed.last_date()
        );

        let mut rows = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            // Scale the current window and predict one step
            let mut scaled = Vec::with_capacity(window.len() * feature_count);
            for row in 0..window.len() {
                scaled.extend(self.scaler_x.transform(window.feature_row(row))?);
            }
            let input = ModelInput::new(window.len(), feature_count, scaled)?;
            let predicted_scaled = self.predictor.predict(&input)?;
            if predicted_scaled.len() != targets.len() {
                return Err(ForecastError::ShapeMismatch(format!(
                    "Predictor returned {} values for {} target columns",
                    predicted_scaled.len(),
                    targets.len()
                )));
            }
            let prices = self.scaler_y.inverse_transform(&predicted_scaled)?;

            // Materialize the prediction as a synthetic observation and
            // regenerate its features over the full accumulated history
            let next_date = window.last_date() + Duration::days(1);
            history.push_row(next_date, &prices)?;

            let date_block = date::build_date_features(next_date, next_date)?;
            let lag_block = lag::build_lag_rolling(&history, &targets)?;
            let lag_row = lag_block.last_row().ok_or_else(|| {
                ForecastError::ShapeMismatch("Lag builder returned no rows".to_string())
            })?;

            let mut full_row =
                Vec::with_capacity(targets.len() + date_block.columns().len() + lag_row.len());
            full_row.extend_from_slice(&prices);
            full_row.extend_from_slice(date_block.row(0));
            full_row.extend_from_slice(lag_row);
            window.slide(next_date, full_row)?;

            rows.push(prices);
        }

        Ok(ForecastMatrix {
            start: seed.last_date() + Duration::days(1),
            columns: targets,
            rows,
        })
    }
}
