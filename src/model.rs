//! Trained-model and scaler capabilities
//!
//! The trained sequence model and its fitted scalers live outside this
//! crate; the forecasting core only sees the capability traits defined here
//! and relies on nothing beyond their shape contracts. Concrete scaler
//! implementations are provided because they are pure parameter maps, which
//! keeps the core usable against models trained elsewhere.

use crate::error::{ForecastError, Result};
use crate::features::sequence::PredictionSequence;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::io::Read;

/// Scaled model input: `seq_len` rows of `feature_count` values, with an
/// implicit batch size of one
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    seq_len: usize,
    feature_count: usize,
    /// Row-major scaled feature values
    values: Vec<f64>,
}

impl ModelInput {
    /// Create an input tensor, validating the value count against the shape
    pub fn new(seq_len: usize, feature_count: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != seq_len * feature_count {
            return Err(ForecastError::ShapeMismatch(format!(
                "Expected {} x {} = {} values, got {}",
                seq_len,
                feature_count,
                seq_len * feature_count,
                values.len()
            )));
        }

        Ok(Self {
            seq_len,
            feature_count,
            values,
        })
    }

    /// Number of rows in the window
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Number of feature columns per row
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// All values, row-major
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// One row of scaled features
    pub fn row(&self, index: usize) -> &[f64] {
        let offset = index * self.feature_count;
        &self.values[offset..offset + self.feature_count]
    }
}

/// A pre-trained one-step sequence predictor.
///
/// Implementations wrap whatever model-serving backend is in use. Given a
/// scaled `(seq_len, feature_count)` window the predictor returns one scaled
/// row with a value per target series, in training target order.
pub trait SequencePredictor: Debug + Send + Sync {
    /// Predict one scaled target row from a scaled input window
    fn predict(&self, input: &ModelInput) -> Result<Vec<f64>>;

    /// Number of target series the model was trained on
    fn target_count(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;
}

/// A fitted, elementwise-linear scaler over fixed-width rows.
///
/// Fitted once outside the core and immutable within it; transforms must be
/// bit-reproducible given the same parameters.
pub trait Scaler: Debug + Send + Sync {
    /// Map one raw row into model space
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>>;

    /// Map one model-space row back into raw units
    fn inverse_transform(&self, row: &[f64]) -> Result<Vec<f64>>;

    /// Width of the rows this scaler was fitted on
    fn width(&self) -> usize;
}

fn check_width(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ForecastError::ScalerMismatch(format!(
            "Scaler was fitted on {} columns, row has {}",
            expected, actual
        )));
    }
    Ok(())
}

/// Min-max scaler mapping each column's fitted `[min, max]` onto `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Vec<f64>,
    data_max: Vec<f64>,
}

impl MinMaxScaler {
    /// Create a scaler from fitted per-column minima and maxima
    pub fn new(data_min: Vec<f64>, data_max: Vec<f64>) -> Result<Self> {
        if data_min.is_empty() || data_min.len() != data_max.len() {
            return Err(ForecastError::InvalidParameter(
                "Min-max scaler needs matching, non-empty min and max vectors".to_string(),
            ));
        }
        Ok(Self { data_min, data_max })
    }

    /// Fit a scaler on row-major raw data
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let (data_min, data_max) = fit_bounds(rows)?;
        Self::new(data_min, data_max)
    }

    /// Load fitted parameters from a JSON reader
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let scaler: MinMaxScaler = serde_json::from_reader(reader)?;
        Self::new(scaler.data_min, scaler.data_max)
    }

    // Columns with zero range scale by 1, so they round-trip unchanged
    fn scale(&self, column: usize) -> f64 {
        let range = self.data_max[column] - self.data_min[column];
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }
}

impl Scaler for MinMaxScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.width(), row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(column, value)| (value - self.data_min[column]) / self.scale(column))
            .collect())
    }

    fn inverse_transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.width(), row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(column, value)| value * self.scale(column) + self.data_min[column])
            .collect())
    }

    fn width(&self) -> usize {
        self.data_min.len()
    }
}

/// Standardizing scaler mapping each column to zero mean and unit variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl StandardScaler {
    /// Create a scaler from fitted per-column means and standard deviations
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        if mean.is_empty() || mean.len() != std.len() {
            return Err(ForecastError::InvalidParameter(
                "Standard scaler needs matching, non-empty mean and std vectors".to_string(),
            ));
        }
        Ok(Self { mean, std })
    }

    /// Fit a scaler on row-major raw data
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Cannot fit a scaler on no rows".to_string(),
            ));
        }
        let width = rows[0].len();
        let count = rows.len() as f64;

        let mut mean = vec![0.0; width];
        for row in rows {
            check_width(width, row.len())?;
            for (column, value) in row.iter().enumerate() {
                mean[column] += value;
            }
        }
        for value in &mut mean {
            *value /= count;
        }

        let mut std = vec![0.0; width];
        for row in rows {
            for (column, value) in row.iter().enumerate() {
                std[column] += (value - mean[column]).powi(2);
            }
        }
        for value in &mut std {
            *value = (*value / count).sqrt();
        }

        Self::new(mean, std)
    }

    /// Load fitted parameters from a JSON reader
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let scaler: StandardScaler = serde_json::from_reader(reader)?;
        Self::new(scaler.mean, scaler.std)
    }

    fn deviation(&self, column: usize) -> f64 {
        if self.std[column] == 0.0 {
            1.0
        } else {
            self.std[column]
        }
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.width(), row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(column, value)| (value - self.mean[column]) / self.deviation(column))
            .collect())
    }

    fn inverse_transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_width(self.width(), row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(column, value)| value * self.deviation(column) + self.mean[column])
            .collect())
    }

    fn width(&self) -> usize {
        self.mean.len()
    }
}

fn fit_bounds(rows: &[Vec<f64>]) -> Result<(Vec<f64>, Vec<f64>)> {
    if rows.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Cannot fit a scaler on no rows".to_string(),
        ));
    }

    let width = rows[0].len();
    let mut data_min = vec![f64::INFINITY; width];
    let mut data_max = vec![f64::NEG_INFINITY; width];
    for row in rows {
        check_width(width, row.len())?;
        for (column, &value) in row.iter().enumerate() {
            data_min[column] = data_min[column].min(value);
            data_max[column] = data_max[column].max(value);
        }
    }
    Ok((data_min, data_max))
}

/// Ordered column layout fixed when the model was trained.
///
/// Column order is invisible to the type system but load-bearing for the
/// predictor; validating an assembled sequence against the training schema
/// turns silent drift into a hard error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    targets: Vec<String>,
    features: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema from ordered target and feature column lists
    pub fn new(targets: Vec<String>, features: Vec<String>) -> Result<Self> {
        if targets.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Schema needs at least one target column".to_string(),
            ));
        }
        Ok(Self { targets, features })
    }

    /// Capture the column layout of an assembled sequence
    pub fn of(sequence: &PredictionSequence) -> Self {
        Self {
            targets: sequence.target_columns().to_vec(),
            features: sequence.feature_columns().to_vec(),
        }
    }

    /// Load a schema from a JSON reader
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let schema: FeatureSchema = serde_json::from_reader(reader)?;
        Self::new(schema.targets, schema.features)
    }

    /// Target column names, in training order
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Feature column names, in training order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Check an assembled sequence against this schema, failing fast on the
    /// first disagreement.
    pub fn validate(&self, sequence: &PredictionSequence) -> Result<()> {
        compare_columns("target", &self.targets, sequence.target_columns())?;
        compare_columns("feature", &self.features, sequence.feature_columns())
    }
}

fn compare_columns(kind: &str, expected: &[String], actual: &[String]) -> Result<()> {
    if expected.len() != actual.len() {
        return Err(ForecastError::ShapeMismatch(format!(
            "Schema expects {} {} columns, sequence has {}",
            expected.len(),
            kind,
            actual.len()
        )));
    }
    for (index, (want, got)) in expected.iter().zip(actual).enumerate() {
        if want != got {
            return Err(ForecastError::ShapeMismatch(format!(
                "{} column {} is '{}', schema expects '{}'",
                kind, index, got, want
            )));
        }
    }
    Ok(())
}
