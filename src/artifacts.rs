//! One-time loading of the model, the feature order list and the encoders.

use serde::Deserialize;
use std::{fs, path::Path, sync::Arc};

use crate::config::AppConfig;
use crate::encoder::EncoderSet;
use crate::error::{PredictorError, Result};
use crate::model::{self, Regressor};

#[derive(Deserialize)]
struct MetaJson {
    feat_list: Vec<String>,
    in_dim: Option<usize>,
}

/// Columns the model expects, in the order it expects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureOrder {
    names: Vec<String>,
}

impl FeatureOrder {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FeatureOrder {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Read `{"feat_list": [...], "in_dim": n}`; the list length wins over `in_dim`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path)
            .map_err(|e| PredictorError::artifact(path.display().to_string(), e))?;
        let meta: MetaJson = serde_json::from_str(&txt)
            .map_err(|e| PredictorError::artifact(path.display().to_string(), e))?;

        if let Some(in_dim) = meta.in_dim {
            if in_dim != meta.feat_list.len() {
                tracing::warn!(
                    "meta.in_dim ({}) != feat_list.len() ({}); using feat_list.len()",
                    in_dim,
                    meta.feat_list.len()
                );
            }
        }
        Ok(Self::new(meta.feat_list))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Everything loaded at startup. Read-only afterwards.
#[derive(Clone)]
pub struct Artifacts {
    pub model: Arc<dyn Regressor>,
    pub features: Arc<FeatureOrder>,
    pub encoders: Arc<EncoderSet>,
}

impl Artifacts {
    pub fn new(model: Arc<dyn Regressor>, features: FeatureOrder, encoders: EncoderSet) -> Self {
        Artifacts {
            model,
            features: Arc::new(features),
            encoders: Arc::new(encoders),
        }
    }

    pub fn load(config: &AppConfig) -> Result<Self> {
        let features = FeatureOrder::load(&config.meta_path)?;
        let encoders = EncoderSet::load(&config.encoders_path)?;
        let mdl = model::load(&config.model_path, features.names())
            .map_err(|e| PredictorError::artifact(config.model_path.clone(), format!("{:#}", e)))?;

        tracing::info!(
            "loaded {} model; feat_list[{}]: {:?}",
            mdl.name(),
            features.len(),
            features.names()
        );
        tracing::info!(
            "loaded encoders for {:?}",
            encoders.columns().collect::<Vec<_>>()
        );

        let artifacts = Self::new(Arc::from(mdl), features, encoders);
        artifacts.warmup()?;
        Ok(artifacts)
    }

    /// Run an all-zero row through the model to check it takes our width.
    pub fn warmup(&self) -> Result<()> {
        if let Some(width) = self.model.input_width() {
            if width != self.features.len() {
                return Err(PredictorError::model(format!(
                    "model takes {} inputs but feat_list has {}",
                    width,
                    self.features.len()
                )));
            }
        }
        let out = self
            .model
            .predict(&[vec![0.0; self.features.len()]])
            .map_err(|e| PredictorError::model(format!("warmup failed: {:#}", e)))?;
        if out.len() != 1 {
            return Err(PredictorError::model(format!(
                "warmup returned {} values for one row",
                out.len()
            )));
        }
        tracing::info!("warmup forward ok");
        Ok(())
    }
}
