//! Feature assembly and prediction.
//!
//! Turns a raw input record into the numeric row the model was trained on:
//! categorical columns go through their label encoder (unseen values become
//! the sentinel), columns the record lacks are zero-filled, and the result is
//! laid out in feature order. Any failure fails the whole prediction.

use serde::Serialize;
use std::sync::Arc;

use crate::artifacts::{Artifacts, FeatureOrder};
use crate::encoder::{safe_encode, Encoded, EncoderSet};
use crate::error::{AssemblyFault, PredictionAssemblyFailure};
use crate::model::Regressor;
use crate::record::{RawRecord, RawValue};

/// The row handed to the model, with the encoder outcome of each
/// categorical column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedRecord {
    pub features: Vec<String>,
    pub values: Vec<f64>,
    pub categorical: Vec<(String, Encoded)>,
}

impl EncodedRecord {
    pub fn get(&self, feature: &str) -> Option<f64> {
        let i = self.features.iter().position(|f| f == feature)?;
        self.values.get(i).copied()
    }

    pub fn encoding(&self, column: &str) -> Option<Encoded> {
        self.categorical
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, e)| *e)
    }

    /// Categorical columns that fell back to the sentinel.
    pub fn unknown_categories(&self) -> Vec<String> {
        self.categorical
            .iter()
            .filter(|(_, e)| e.is_unknown())
            .map(|(c, _)| c.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A successful prediction together with what produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub input: RawRecord,
    pub encoded: EncodedRecord,
    pub price: f64,
    pub unknown_categories: Vec<String>,
}

/// Runs the assembly pipeline against injected, read-only artifacts.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn Regressor>,
    features: Arc<FeatureOrder>,
    encoders: Arc<EncoderSet>,
    log_pred: bool,
}

impl Predictor {
    pub fn new(model: Arc<dyn Regressor>, features: Arc<FeatureOrder>, encoders: Arc<EncoderSet>) -> Self {
        Predictor {
            model,
            features,
            encoders,
            log_pred: false,
        }
    }

    pub fn from_artifacts(artifacts: &Artifacts) -> Self {
        Self::new(
            artifacts.model.clone(),
            artifacts.features.clone(),
            artifacts.encoders.clone(),
        )
    }

    /// Log a summary of every assembled row.
    pub fn with_logging(mut self, log_pred: bool) -> Self {
        self.log_pred = log_pred;
        self
    }

    pub fn features(&self) -> &FeatureOrder {
        &self.features
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    fn failure(
        &self,
        record: &RawRecord,
        fault: AssemblyFault,
        encoded_features: Option<Vec<String>>,
    ) -> PredictionAssemblyFailure {
        PredictionAssemblyFailure {
            fault,
            input_features: record.columns(),
            model_features: self.features.names().to_vec(),
            encoded_features,
        }
    }

    /// Encode, zero-fill and order `record` into the model's input row.
    pub fn assemble(&self, record: &RawRecord) -> Result<EncodedRecord, PredictionAssemblyFailure> {
        let mut working = record.clone();
        let mut categorical = Vec::new();

        for (column, value) in record.iter() {
            let Some(encoder) = self.encoders.get(column) else {
                continue;
            };
            // a non-string value is never one of the known classes
            let encoded = match value.as_str() {
                Some(s) => safe_encode(encoder, s),
                None => Encoded::Unknown,
            };
            working.insert(column, encoded.code());
            categorical.push((column.to_string(), encoded));
        }

        for name in self.features.names() {
            if working.get(name).is_none() {
                working.insert(name.as_str(), 0i64);
            }
        }

        let mut values = Vec::with_capacity(self.features.len());
        for name in self.features.names() {
            let value = working.get(name).and_then(RawValue::as_f64);
            match value {
                Some(v) => values.push(v),
                None => {
                    let raw = working.get(name).map(|v| v.to_string()).unwrap_or_default();
                    return Err(self.failure(
                        record,
                        AssemblyFault::NonNumeric {
                            feature: name.clone(),
                            value: raw,
                        },
                        Some(working.columns()),
                    ));
                }
            }
        }

        Ok(EncodedRecord {
            features: self.features.names().to_vec(),
            values,
            categorical,
        })
    }

    /// Assemble `record` and score it. Either a full report or a failure;
    /// never a partial result.
    pub fn predict(&self, record: &RawRecord) -> Result<PredictionReport, PredictionAssemblyFailure> {
        let encoded = self.assemble(record)?;
        let encoded_columns = || Some(encoded.features.clone());

        if let Some(width) = self.model.input_width() {
            if width != encoded.len() {
                return Err(self.failure(
                    record,
                    AssemblyFault::WidthMismatch {
                        got: encoded.len(),
                        expected: width,
                    },
                    encoded_columns(),
                ));
            }
        }

        if self.log_pred {
            log_row(&encoded);
        }

        let out = self
            .model
            .predict(std::slice::from_ref(&encoded.values))
            .map_err(|e| {
                self.failure(record, AssemblyFault::Model(format!("{:#}", e)), encoded_columns())
            })?;
        let price = *out
            .first()
            .ok_or_else(|| self.failure(record, AssemblyFault::EmptyPrediction, encoded_columns()))?;
        if !price.is_finite() {
            return Err(self.failure(record, AssemblyFault::NonFinite(price), encoded_columns()));
        }

        let unknown_categories = encoded.unknown_categories();
        if !unknown_categories.is_empty() {
            tracing::warn!(
                "unseen categories {:?} encoded as sentinel; prediction may be unreliable",
                unknown_categories
            );
        }

        Ok(PredictionReport {
            input: record.clone(),
            encoded,
            price,
            unknown_categories,
        })
    }
}

fn log_row(encoded: &EncodedRecord) {
    let vec = &encoded.values;
    let nz = vec.iter().filter(|x| **x != 0.0).count();
    let mean = if vec.is_empty() { 0.0 } else { vec.iter().sum::<f64>() / (vec.len() as f64) };
    let std = if vec.len() < 2 {
        0.0
    } else {
        (vec.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (vec.len() as f64)).sqrt()
    };
    let sample: Vec<String> = encoded
        .features
        .iter()
        .zip(vec)
        .take(6)
        .map(|(name, v)| format!("{}={:.3}", name, v))
        .collect();
    tracing::info!(
        "assembled in_dim={} nonzero={} mean={:.3} std={:.3} sample=[{}]",
        vec.len(),
        nz,
        mean,
        std,
        sample.join(", ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{LabelEncoder, UNKNOWN_CATEGORY};
    use crate::model::LinearRegressor;
    use anyhow::bail;

    fn predictor_with(model: Arc<dyn Regressor>, features: &[&str]) -> Predictor {
        let encoders = EncoderSet::new()
            .with("Manufacturer", LabelEncoder::new(["BMW", "Toyota", "Audi"]).unwrap())
            .with("Wheel", LabelEncoder::new(["Left wheel", "Right wheel"]).unwrap());
        Predictor::new(model, Arc::new(FeatureOrder::new(features.iter().copied())), Arc::new(encoders))
    }

    fn predictor(features: &[&str]) -> Predictor {
        let model = Arc::new(LinearRegressor::new(100.0, vec![1.0; features.len()]));
        predictor_with(model, features)
    }

    fn record() -> RawRecord {
        RawRecord::new()
            .with("ID", 0)
            .with("Manufacturer", "Toyota")
            .with("Wheel", "Right wheel")
            .with("Doors", "04")
            .with("Mileage", 50000)
            .with("Engine_volume", 2.0)
    }

    #[test]
    fn test_encodes_categorical_columns() {
        let p = predictor(&["Manufacturer", "Wheel"]);
        let enc = p.assemble(&record()).unwrap();
        // codes follow the encoder's class order
        assert_eq!(enc.encoding("Manufacturer"), Some(Encoded::Known(1)));
        assert_eq!(enc.get("Manufacturer"), Some(1.0));
        assert_eq!(enc.get("Wheel"), Some(1.0));
    }

    #[test]
    fn test_unseen_category_becomes_sentinel() {
        let p = predictor(&["Manufacturer", "Mileage"]);
        let rec = record().with("Manufacturer", "Zzyzx");
        let enc = p.assemble(&rec).unwrap();
        assert_eq!(enc.encoding("Manufacturer"), Some(Encoded::Unknown));
        assert_eq!(enc.get("Manufacturer"), Some(UNKNOWN_CATEGORY as f64));
        assert_eq!(enc.unknown_categories(), vec!["Manufacturer".to_string()]);
    }

    #[test]
    fn test_known_code_zero_is_not_unknown() {
        let p = predictor(&["Manufacturer"]);
        let enc = p.assemble(&record().with("Manufacturer", "BMW")).unwrap();
        assert_eq!(enc.encoding("Manufacturer"), Some(Encoded::Known(0)));
        assert!(enc.unknown_categories().is_empty());
    }

    #[test]
    fn test_numeric_value_in_categorical_column_is_unknown() {
        let p = predictor(&["Manufacturer"]);
        let enc = p.assemble(&record().with("Manufacturer", 3)).unwrap();
        assert_eq!(enc.encoding("Manufacturer"), Some(Encoded::Unknown));
    }

    #[test]
    fn test_order_follows_feature_list_and_drops_extras() {
        let p = predictor(&["Mileage", "Wheel", "Doors"]);
        let enc = p.assemble(&record()).unwrap();
        assert_eq!(enc.features, vec!["Mileage", "Wheel", "Doors"]);
        assert_eq!(enc.values, vec![50000.0, 1.0, 4.0]);
    }

    #[test]
    fn test_missing_feature_is_zero_filled() {
        let p = predictor(&["Mileage", "Turbo", "Engine_volume"]);
        let enc = p.assemble(&record()).unwrap();
        assert_eq!(enc.len(), 3);
        assert_eq!(enc.get("Turbo"), Some(0.0));
        assert_eq!(enc.get("Engine_volume"), Some(2.0));
    }

    #[test]
    fn test_non_numeric_feature_fails_with_diagnostics() {
        let p = predictor(&["Mileage", "Model"]);
        let rec = record().with("Model", "Camry");
        let err = p.assemble(&rec).unwrap_err();
        assert_eq!(
            err.fault,
            AssemblyFault::NonNumeric {
                feature: "Model".into(),
                value: "Camry".into()
            }
        );
        assert_eq!(err.input_features, rec.columns());
        assert_eq!(err.model_features, vec!["Mileage", "Model"]);
        assert!(err.encoded_features.unwrap().contains(&"Model".to_string()));
    }

    #[test]
    fn test_predict_adds_intercept_and_is_repeatable() {
        let p = predictor(&["Mileage", "Manufacturer"]);
        let first = p.predict(&record()).unwrap();
        assert_eq!(first.price, 100.0 + 50000.0 + 1.0);
        let second = p.predict(&record()).unwrap();
        assert_eq!(first.price, second.price);
        assert_eq!(first.encoded, second.encoded);
    }

    #[test]
    fn test_width_mismatch_fails() {
        let model = Arc::new(LinearRegressor::new(0.0, vec![1.0; 5]));
        let p = predictor_with(model, &["Mileage"]);
        let err = p.predict(&record()).unwrap_err();
        assert_eq!(err.fault, AssemblyFault::WidthMismatch { got: 1, expected: 5 });
        assert_eq!(err.encoded_features, Some(vec!["Mileage".to_string()]));
    }

    struct Broken;

    impl Regressor for Broken {
        fn predict(&self, _rows: &[Vec<f64>]) -> anyhow::Result<Vec<f64>> {
            bail!("tensor shape mismatch")
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    struct Silent;

    impl Regressor for Silent {
        fn predict(&self, _rows: &[Vec<f64>]) -> anyhow::Result<Vec<f64>> {
            Ok(vec![])
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    #[test]
    fn test_model_errors_fail_as_a_unit() {
        let p = predictor_with(Arc::new(Broken), &["Mileage"]);
        let err = p.predict(&record()).unwrap_err();
        assert!(matches!(&err.fault, AssemblyFault::Model(m) if m.contains("tensor shape")));
        assert!(err.to_string().starts_with("Prediction failed"));

        let p = predictor_with(Arc::new(Silent), &["Mileage"]);
        let err = p.predict(&record()).unwrap_err();
        assert_eq!(err.fault, AssemblyFault::EmptyPrediction);
    }
}
