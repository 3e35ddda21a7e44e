//! Calendar feature derivation with fixed-width one-hot encodings

use crate::error::{ForecastError, Result};
use crate::features::FeatureBlock;
use chrono::{Datelike, Duration, NaiveDate};

/// Number of weekday indicator columns, always emitted in full
pub const WEEKDAY_CARDINALITY: usize = 7;

/// Number of month indicator columns, always emitted in full
pub const MONTH_CARDINALITY: usize = 12;

/// The fixed calendar feature column set, in emission order
pub fn date_feature_columns() -> Vec<String> {
    let mut columns = Vec::with_capacity(2 + WEEKDAY_CARDINALITY + MONTH_CARDINALITY);
    columns.push("is_weekend".to_string());
    columns.push("trend".to_string());
    for day in 0..WEEKDAY_CARDINALITY {
        columns.push(format!("day_of_week_{}", day));
    }
    for month in 1..=MONTH_CARDINALITY {
        columns.push(format!("month_{}", month));
    }
    columns
}

/// Build one feature row per calendar day in `[start, end]`, inclusive.
///
/// Weekday and month indicators always expand to all 7 and 12 categories, so
/// the column set is identical for every date range; the sequence assembler
/// and the single-step rollout both rely on that stability. The `trend`
/// counter starts at 0 for `start`. Monday is weekday 0.
pub fn build_date_features(start: NaiveDate, end: NaiveDate) -> Result<FeatureBlock> {
    if start > end {
        return Err(ForecastError::InvalidParameter(format!(
            "Date range start {} is after end {}",
            start, end
        )));
    }

    let columns = date_feature_columns();
    let days = (end - start).num_days() as usize + 1;
    let mut rows = Vec::with_capacity(days);

    for trend in 0..days {
        let date = start + Duration::days(trend as i64);
        let weekday = date.weekday().num_days_from_monday() as usize;
        let month = date.month() as usize;

        let mut row = Vec::with_capacity(columns.len());
        row.push(if weekday >= 5 { 1.0 } else { 0.0 });
        row.push(trend as f64);
        for day in 0..WEEKDAY_CARDINALITY {
            row.push(if day == weekday { 1.0 } else { 0.0 });
        }
        for candidate in 1..=MONTH_CARDINALITY {
            row.push(if candidate == month { 1.0 } else { 0.0 });
        }
        rows.push(row);
    }

    Ok(FeatureBlock::new(columns, rows))
}
