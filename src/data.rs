//! Market report interpretation and the gap-free daily price table
//!
//! Raw price reports arrive either as a long table (one row per series/day
//! pair) or in the upstream report format (identity columns plus one
//! `dd/mm/yyyy` column per day). Both are reduced to cleaned [`Observation`]s
//! here, and pivoted into a [`PriceTable`] with a complete daily calendar
//! index.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use log::{debug, warn};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// A single cleaned price report: one series, one day
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Calendar day the price was reported for
    pub date: NaiveDate,
    /// Sub-commodity series name, exactly as configured
    pub series: String,
    /// Price in original units
    pub price: f64,
}

/// Coerce a raw price string to a number.
///
/// Thousands separators are stripped before parsing; empty cells, `-`
/// placeholders and anything else unparsable yield `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Parse a report date in `dd/mm/yyyy` form
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()
}

/// Loader that turns raw market report tables into cleaned observations
#[derive(Debug)]
pub struct ReportLoader;

impl ReportLoader {
    /// Load a long-format report from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, targets: &[String]) -> Result<Vec<Observation>> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_long_dataframe(&df, targets)
    }

    /// Clean a long-format table: one row per (series, date, price) triple.
    ///
    /// Rows whose price or date fails to parse are dropped individually; rows
    /// for series outside `targets` are ignored.
    pub fn from_long_dataframe(df: &DataFrame, targets: &[String]) -> Result<Vec<Observation>> {
        if targets.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one target series is required".to_string(),
            ));
        }

        let series_column = Self::detect_column(df, &["series", "komoditas", "name"])?;
        let date_column = Self::detect_column(df, &["date", "tanggal"])?;
        let price_column = Self::detect_column(df, &["price", "harga", "value"])?;

        let names = Self::string_values(df, &series_column)?;
        let dates = Self::string_values(df, &date_column)?;
        let prices = Self::price_values(df, &price_column)?;

        let mut observations = Vec::with_capacity(df.height());
        let mut dropped = 0usize;
        let mut seen_series: Vec<String> = Vec::new();

        for i in 0..df.height() {
            let series = match &names[i] {
                Some(name) => name.clone(),
                None => {
                    dropped += 1;
                    continue;
                }
            };
            if !seen_series.contains(&series) {
                seen_series.push(series.clone());
            }
            if !targets.contains(&series) {
                continue;
            }

            let date = dates[i].as_deref().and_then(parse_report_date);
            let price = prices[i];
            match (date, price) {
                (Some(date), Some(price)) => observations.push(Observation {
                    date,
                    series,
                    price,
                }),
                _ => dropped += 1,
            }
        }

        Self::finish(observations, dropped, targets, &seen_series)
    }

    /// Melt the upstream wide report into cleaned observations.
    ///
    /// Columns whose header parses as `dd/mm/yyyy` are date columns; among
    /// the remaining identity columns one must name the series.
    pub fn from_wide_dataframe(df: &DataFrame, targets: &[String]) -> Result<Vec<Observation>> {
        if targets.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one target series is required".to_string(),
            ));
        }

        let date_columns: Vec<(String, NaiveDate)> = df
            .get_column_names()
            .iter()
            .filter_map(|name| parse_report_date(name).map(|date| (name.to_string(), date)))
            .collect();
        if date_columns.is_empty() {
            return Err(ForecastError::DataUnavailable(
                "Report has no dd/mm/yyyy date columns to melt".to_string(),
            ));
        }

        let series_column = Self::detect_column(df, &["series", "komoditas", "name"])?;
        let names = Self::string_values(df, &series_column)?;

        let mut observations = Vec::with_capacity(df.height() * date_columns.len());
        let mut dropped = 0usize;
        let mut seen_series: Vec<String> = Vec::new();

        for (column, date) in &date_columns {
            let prices = Self::price_values(df, column)?;
            for i in 0..df.height() {
                let series = match &names[i] {
                    Some(name) => name.clone(),
                    None => continue,
                };
                if !seen_series.contains(&series) {
                    seen_series.push(series.clone());
                }
                if !targets.contains(&series) {
                    continue;
                }
                match prices[i] {
                    Some(price) => observations.push(Observation {
                        date: *date,
                        series,
                        price,
                    }),
                    None => dropped += 1,
                }
            }
        }

        Self::finish(observations, dropped, targets, &seen_series)
    }

    fn finish(
        mut observations: Vec<Observation>,
        dropped: usize,
        targets: &[String],
        seen_series: &[String],
    ) -> Result<Vec<Observation>> {
        if dropped > 0 {
            warn!("Dropped {} report rows with unparsable values", dropped);
        }

        if observations.is_empty() {
            return Err(ForecastError::DataUnavailable(format!(
                "No rows matched the configured target series {:?}; source reported {:?}",
                targets, seen_series
            )));
        }

        observations.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.series.cmp(&b.series)));
        debug!("Cleaned {} observations", observations.len());
        Ok(observations)
    }

    /// Find a column whose name contains one of the given fragments
    fn detect_column(df: &DataFrame, fragments: &[&str]) -> Result<String> {
        for name in df.get_column_names() {
            let lower = name.to_lowercase();
            if fragments.iter().any(|fragment| lower.contains(fragment)) {
                return Ok(name.to_string());
            }
        }

        Err(ForecastError::DataUnavailable(format!(
            "No column matching {:?} found in report",
            fragments
        )))
    }

    fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
        let col = df.column(column)?;
        match col.dtype() {
            DataType::Utf8 => Ok(col
                .utf8()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()),
            _ => Err(ForecastError::DataUnavailable(format!(
                "Column '{}' is not a string column",
                column
            ))),
        }
    }

    fn price_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
        let col = df.column(column)?;
        match col.dtype() {
            DataType::Utf8 => Ok(col
                .utf8()?
                .into_iter()
                .map(|v| v.and_then(parse_price))
                .collect()),
            DataType::Float64 => Ok(col.f64()?.into_iter().collect()),
            DataType::Float32 => Ok(col
                .f32()?
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect()),
            DataType::Int64 => Ok(col
                .i64()?
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect()),
            DataType::Int32 => Ok(col
                .i32()?
                .into_iter()
                .map(|v| v.map(|v| v as f64))
                .collect()),
            _ => Err(ForecastError::NumericCoercion(format!(
                "Column '{}' cannot be read as prices",
                column
            ))),
        }
    }
}

/// Calendar-day-indexed price table: one row per consecutive day, one column
/// per target series.
///
/// Values are `NaN` where no price is known; [`PriceTable::interpolate`]
/// fills interior gaps linearly and holds boundary values constant outward.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    start: NaiveDate,
    columns: Vec<String>,
    /// Column-major values, one entry per calendar day
    values: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Pivot observations into a daily table over `[min(date), max(date)]`.
    ///
    /// Every configured target gets a column even when no observation carries
    /// it, so the downstream shape is stable. Duplicate (date, series) pairs
    /// are averaged.
    pub fn from_observations(observations: &[Observation], targets: &[String]) -> Result<Self> {
        if targets.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one target series is required".to_string(),
            ));
        }
        if observations.is_empty() {
            return Err(ForecastError::DataUnavailable(
                "No observations to pivot".to_string(),
            ));
        }

        let mut start = observations[0].date;
        let mut end = observations[0].date;
        for observation in observations {
            start = start.min(observation.date);
            end = end.max(observation.date);
        }
        let days = (end - start).num_days() as usize + 1;

        let column_index: HashMap<&str, usize> = targets
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut sums = vec![vec![0.0f64; days]; targets.len()];
        let mut counts = vec![vec![0u32; days]; targets.len()];
        for observation in observations {
            if let Some(&column) = column_index.get(observation.series.as_str()) {
                let day = (observation.date - start).num_days() as usize;
                sums[column][day] += observation.price;
                counts[column][day] += 1;
            }
        }

        let values = sums
            .into_iter()
            .zip(counts)
            .map(|(sums, counts)| {
                sums.into_iter()
                    .zip(counts)
                    .map(|(sum, count)| if count > 0 { sum / count as f64 } else { f64::NAN })
                    .collect()
            })
            .collect();

        Ok(Self {
            start,
            columns: targets.to_vec(),
            values,
        })
    }

    /// Build a table from row-major values starting at `start`
    pub fn from_rows(start: NaiveDate, columns: &[String], rows: &[Vec<f64>]) -> Result<Self> {
        if columns.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Price table needs at least one column".to_string(),
            ));
        }
        if rows.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Price table needs at least one row".to_string(),
            ));
        }

        let mut values = vec![Vec::with_capacity(rows.len()); columns.len()];
        for row in rows {
            if row.len() != columns.len() {
                return Err(ForecastError::InvalidParameter(format!(
                    "Row width {} does not match {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            for (column, &value) in row.iter().enumerate() {
                values[column].push(value);
            }
        }

        Ok(Self {
            start,
            columns: columns.to_vec(),
            values,
        })
    }

    /// Fill gaps per column: linear interpolation between known neighbors,
    /// with boundary values held constant outward. Columns with no known
    /// value at all are left untouched.
    pub fn interpolate(&mut self) {
        for column in &mut self.values {
            interpolate_column(column);
        }
    }

    /// Append one day of prices. The date must extend the calendar by
    /// exactly one day.
    pub fn push_row(&mut self, date: NaiveDate, prices: &[f64]) -> Result<()> {
        if prices.len() != self.columns.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "Row width {} does not match {} columns",
                prices.len(),
                self.columns.len()
            )));
        }
        let expected = self.last_date() + Duration::days(1);
        if date != expected {
            return Err(ForecastError::InvalidParameter(format!(
                "Expected next calendar day {}, got {}",
                expected, date
            )));
        }

        for (column, &price) in prices.iter().enumerate() {
            self.values[column].push(price);
        }
        Ok(())
    }

    /// Number of calendar days covered
    pub fn len(&self) -> usize {
        self.values[0].len()
    }

    /// Whether the table covers no days
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First day of the calendar index
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the calendar index
    pub fn last_date(&self) -> NaiveDate {
        self.start + Duration::days(self.len() as i64 - 1)
    }

    /// Date of the given row
    pub fn date_at(&self, row: usize) -> NaiveDate {
        self.start + Duration::days(row as i64)
    }

    /// Column names, in configuration order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All values of one named column
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(&self.values[index])
    }

    /// Value at (row, column index)
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values[column][row]
    }
}

fn interpolate_column(column: &mut [f64]) {
    let known: Vec<usize> = column
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, _)| i)
        .collect();
    let (first, last) = match (known.first(), known.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return,
    };

    // Boundaries: nearest known value, not an extrapolated trend
    for i in 0..first {
        column[i] = column[first];
    }
    for i in last + 1..column.len() {
        column[i] = column[last];
    }

    for pair in known.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        if right - left < 2 {
            continue;
        }
        let step = (column[right] - column[left]) / (right - left) as f64;
        for i in left + 1..right {
            column[i] = column[left] + step * (i - left) as f64;
        }
    }
}
