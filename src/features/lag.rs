//! Lag and trailing rolling-mean feature derivation

use crate::data::PriceTable;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureBlock, LAGS, WINDOWS};

/// The lag/rolling column set for the given targets, in emission order
pub fn lag_rolling_columns(targets: &[String]) -> Vec<String> {
    let mut columns = Vec::with_capacity(targets.len() * (LAGS.len() + WINDOWS.len()));
    for target in targets {
        for lag in LAGS {
            columns.push(format!("{}_lag_{}", target, lag));
        }
        for window in WINDOWS {
            columns.push(format!("{}_rolling_mean_{}", target, window));
        }
    }
    columns
}

/// Derive lag and rolling-mean features for every row of `prices`.
///
/// `{col}_lag_{k}` at day `t` is the target value at day `t - k`;
/// `{col}_rolling_mean_{w}` is the mean over the closed window
/// `[t - w + 1, t]`. Rows without full lookback carry `NaN` by construction.
/// Inside the rollout loop this is invoked on the full accumulated history
/// and only the last row is kept, which keeps the lag-30 and rolling-30
/// columns correct after every synthetic step.
pub fn build_lag_rolling(prices: &PriceTable, targets: &[String]) -> Result<FeatureBlock> {
    let columns = lag_rolling_columns(targets);

    let mut series = Vec::with_capacity(targets.len());
    for target in targets {
        let values = prices.column(target).ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "Target series '{}' is missing from the price table",
                target
            ))
        })?;
        series.push(values);
    }

    let days = prices.len();
    let mut rows = Vec::with_capacity(days);
    for t in 0..days {
        let mut row = Vec::with_capacity(columns.len());
        for values in &series {
            for lag in LAGS {
                row.push(if t >= lag { values[t - lag] } else { f64::NAN });
            }
            for window in WINDOWS {
                if t + 1 >= window {
                    let sum: f64 = values[t + 1 - window..=t].iter().sum();
                    row.push(sum / window as f64);
                } else {
                    row.push(f64::NAN);
                }
            }
        }
        rows.push(row);
    }

    Ok(FeatureBlock::new(columns, rows))
}
