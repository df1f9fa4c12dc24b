//! Process configuration: an optional JSON file with environment overrides.

use serde::Deserialize;
use std::fs;

use crate::error::{PredictorError, Result};
use crate::record::REFERENCE_YEAR;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub model_path: String,
    pub meta_path: String,
    pub encoders_path: String,
    pub port: u16,
    pub reference_year: i64,
    /// Log a summary of every assembled feature vector.
    pub log_pred: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            model_path: "artifacts/car_price_model.json".to_string(),
            meta_path: "artifacts/model_features.json".to_string(),
            encoders_path: "artifacts/label_encoders.json".to_string(),
            port: 8080,
            reference_year: REFERENCE_YEAR,
            log_pred: false,
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            PredictorError::config(format!("Failed to read config file {}: {}", path, e))
        })?;
        serde_json::from_str(&data)
            .map_err(|e| PredictorError::config(format!("Invalid config JSON: {}", e)))
    }

    /// `CONFIG_PATH` file (if set) with env var overrides on top.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::load(&path)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = var("MODEL_PATH") {
            self.model_path = v;
        }
        if let Some(v) = var("META_PATH") {
            self.meta_path = v;
        }
        if let Some(v) = var("ENCODERS_PATH") {
            self.encoders_path = v;
        }
        if let Some(v) = var("PORT") {
            self.port = v
                .parse()
                .map_err(|_| PredictorError::config(format!("PORT is not a port: {:?}", v)))?;
        }
        if let Some(v) = var("REFERENCE_YEAR") {
            self.reference_year = v.parse().map_err(|_| {
                PredictorError::config(format!("REFERENCE_YEAR is not a year: {:?}", v))
            })?;
        }
        if let Some(v) = var("LOG_PRED") {
            self.log_pred = v == "1";
        }
        Ok(self)
    }
}
