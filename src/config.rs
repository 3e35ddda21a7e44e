//! Commodity group configuration
//!
//! A commodity group names the target sub-commodity series that are forecast
//! together by one trained model, plus the artifact paths a caller's loader
//! uses to locate that model and its fitted scalers. The paths are opaque to
//! this crate.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;

/// One forecastable commodity group and its trained-model artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityGroup {
    /// Display name of the group, e.g. "Beras"
    pub name: String,
    /// Target sub-commodity series, in training column order
    pub targets: Vec<String>,
    /// Path to the trained model artifact
    pub model_path: String,
    /// Path to the fitted feature-space scaler parameters
    pub scaler_x_path: String,
    /// Path to the fitted target-space scaler parameters
    pub scaler_y_path: String,
}

/// The full set of configured commodity groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityConfig {
    groups: Vec<CommodityGroup>,
}

impl CommodityConfig {
    /// Create a configuration from a list of groups
    pub fn new(groups: Vec<CommodityGroup>) -> Result<Self> {
        if groups.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Configuration must contain at least one commodity group".to_string(),
            ));
        }

        for group in &groups {
            if group.targets.is_empty() {
                return Err(ForecastError::InvalidParameter(format!(
                    "Commodity group '{}' has no target series",
                    group.name
                )));
            }
        }

        let mut names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != groups.len() {
            return Err(ForecastError::InvalidParameter(
                "Commodity group names must be unique".to_string(),
            ));
        }

        Ok(Self { groups })
    }

    /// The group set of the reference deployment (West Java market reports)
    pub fn bundled() -> Self {
        let groups = vec![
            CommodityGroup {
                name: "Beras".to_string(),
                targets: vec![
                    "Beras Kualitas Bawah I".to_string(),
                    "Beras Kualitas Bawah II".to_string(),
                    "Beras Kualitas Medium I".to_string(),
                    "Beras Kualitas Medium II".to_string(),
                    "Beras Kualitas Super I".to_string(),
                    "Beras Kualitas Super II".to_string(),
                ],
                model_path: "models/beras_model.bin".to_string(),
                scaler_x_path: "models/beras_scaler_x.json".to_string(),
                scaler_y_path: "models/beras_scaler_y.json".to_string(),
            },
            CommodityGroup {
                name: "Telur Ayam".to_string(),
                targets: vec!["Telur Ayam Ras Segar".to_string()],
                model_path: "models/telur_ayam_model.bin".to_string(),
                scaler_x_path: "models/telur_ayam_scaler_x.json".to_string(),
                scaler_y_path: "models/telur_ayam_scaler_y.json".to_string(),
            },
            CommodityGroup {
                name: "Minyak Goreng".to_string(),
                targets: vec![
                    "Minyak Goreng Curah".to_string(),
                    "Minyak Goreng Kemasan Bermerk 1".to_string(),
                    "Minyak Goreng Kemasan Bermerk 2".to_string(),
                ],
                model_path: "models/minyak_goreng_model.bin".to_string(),
                scaler_x_path: "models/minyak_goreng_scaler_x.json".to_string(),
                scaler_y_path: "models/minyak_goreng_scaler_y.json".to_string(),
            },
        ];

        Self { groups }
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CommodityConfig = serde_json::from_str(json)?;
        Self::new(config.groups)
    }

    /// Parse a configuration from a JSON reader
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let config: CommodityConfig = serde_json::from_reader(reader)?;
        Self::new(config.groups)
    }

    /// Serialize the configuration to JSON text
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a group by its exact name
    pub fn group(&self, name: &str) -> Option<&CommodityGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// All configured groups
    pub fn groups(&self) -> &[CommodityGroup] {
        &self.groups
    }
}
