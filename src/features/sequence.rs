//! Fixed-length model-input sequence assembly

use crate::data::{Observation, PriceTable};
use crate::error::{ForecastError, Result};
use crate::features::{date, lag, SEQ_LENGTH};
use chrono::{Duration, NaiveDate};
use log::debug;

/// The most recent [`SEQ_LENGTH`] valid feature rows, in model column order.
///
/// Rows hold the target values first, then every non-target feature column.
/// That ordering was fixed when the model was trained and is load-bearing:
/// reordering columns silently changes what the predictor sees, so it is
/// carried explicitly here and checked by
/// [`FeatureSchema::validate`](crate::model::FeatureSchema::validate).
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSequence {
    dates: Vec<NaiveDate>,
    target_columns: Vec<String>,
    feature_columns: Vec<String>,
    /// Row-major: target values followed by feature values
    rows: Vec<Vec<f64>>,
}

impl PredictionSequence {
    /// Number of rows in the window
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the window holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dates of the window rows, oldest first
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Date of the oldest row
    pub fn start_date(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Date of the most recent row
    pub fn last_date(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Target column names, in training order
    pub fn target_columns(&self) -> &[String] {
        &self.target_columns
    }

    /// Non-target feature column names, in training order
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// One full row: target values followed by feature values
    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    /// The target-value part of one row
    pub fn target_row(&self, index: usize) -> &[f64] {
        &self.rows[index][..self.target_columns.len()]
    }

    /// The feature-value part of one row
    pub fn feature_row(&self, index: usize) -> &[f64] {
        &self.rows[index][self.target_columns.len()..]
    }

    /// Append a row for the next calendar day and drop the oldest, keeping
    /// the window length fixed.
    pub(crate) fn slide(&mut self, date: NaiveDate, row: Vec<f64>) -> Result<()> {
        let width = self.target_columns.len() + self.feature_columns.len();
        if row.len() != width {
            return Err(ForecastError::ShapeMismatch(format!(
                "New row has {} values, the window carries {} columns",
                row.len(),
                width
            )));
        }
        let expected = self.last_date() + Duration::days(1);
        if date != expected {
            return Err(ForecastError::InvalidParameter(format!(
                "Expected next calendar day {}, got {}",
                expected, date
            )));
        }

        self.dates.push(date);
        self.rows.push(row);
        self.dates.remove(0);
        self.rows.remove(0);
        Ok(())
    }
}

/// Assembles cleaned observations into the model's input sequence
#[derive(Debug)]
pub struct SequenceAssembler;

impl SequenceAssembler {
    /// Run the full preparation pipeline over cleaned observations.
    ///
    /// Pivots to a daily price table, injects configured targets absent from
    /// the data, interpolates gaps, derives calendar and lag/rolling
    /// features, drops rows with undefined values, and returns the last
    /// [`SEQ_LENGTH`] rows. Fails with
    /// [`InsufficientHistory`](ForecastError::InsufficientHistory) rather
    /// than padding when fewer valid rows remain; a padded sequence would
    /// corrupt every downstream forecast.
    pub fn assemble(
        observations: &[Observation],
        targets: &[String],
    ) -> Result<PredictionSequence> {
        let mut prices = PriceTable::from_observations(observations, targets)?;
        prices.interpolate();

        let date_block = date::build_date_features(prices.start_date(), prices.last_date())?;
        let lag_block = lag::build_lag_rolling(&prices, targets)?;

        let mut feature_columns =
            Vec::with_capacity(date_block.columns().len() + lag_block.columns().len());
        feature_columns.extend_from_slice(date_block.columns());
        feature_columns.extend_from_slice(lag_block.columns());

        let width = targets.len() + feature_columns.len();
        let mut dates = Vec::with_capacity(prices.len());
        let mut rows = Vec::with_capacity(prices.len());
        for day in 0..prices.len() {
            let mut row = Vec::with_capacity(width);
            for column in 0..targets.len() {
                row.push(prices.value(day, column));
            }
            row.extend_from_slice(date_block.row(day));
            row.extend_from_slice(lag_block.row(day));

            if row.iter().any(|v| v.is_nan()) {
                continue;
            }
            dates.push(prices.date_at(day));
            rows.push(row);
        }

        debug!(
            "Assembled {} valid feature rows of width {} from {} calendar days",
            rows.len(),
            width,
            prices.len()
        );

        if rows.len() < SEQ_LENGTH {
            return Err(ForecastError::InsufficientHistory {
                required: SEQ_LENGTH,
                available: rows.len(),
            });
        }

        let keep_from = rows.len() - SEQ_LENGTH;
        Ok(PredictionSequence {
            dates: dates.split_off(keep_from),
            target_columns: targets.to_vec(),
            feature_columns,
            rows: rows.split_off(keep_from),
        })
    }
}
