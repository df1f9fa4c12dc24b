use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// A trained regressor: one output per input row.
pub trait Regressor: Send + Sync {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Number of columns the model accepts, if it knows.
    fn input_width(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str;
}

#[derive(Deserialize)]
struct LinearJson {
    intercept: f64,
    coefficients: HashMap<String, f64>,
}

/// Linear model exported as JSON, with coefficients keyed by feature name.
pub struct LinearRegressor {
    intercept: f64,
    weights: Vec<f64>,
}

impl LinearRegressor {
    pub fn new(intercept: f64, weights: Vec<f64>) -> Self {
        Self { intercept, weights }
    }

    /// Load coefficients and lay them out in `feat_list` order.
    /// Features without a coefficient get weight 0.
    pub fn load(path: &Path, feat_list: &[String]) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read linear model at {}", path.display()))?;
        let mut json: LinearJson =
            serde_json::from_str(&txt).with_context(|| "failed to parse linear model json")?;

        let weights = feat_list
            .iter()
            .map(|f| json.coefficients.remove(f).unwrap_or(0.0))
            .collect();
        if !json.coefficients.is_empty() {
            let mut extra: Vec<_> = json.coefficients.into_keys().collect();
            extra.sort();
            bail!("coefficients for features not in feat_list: {:?}", extra);
        }
        Ok(Self::new(json.intercept, weights))
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.weights.len() {
                    bail!(
                        "feature length mismatch: got {}, expected {}",
                        row.len(),
                        self.weights.len()
                    );
                }
                let dot: f64 = row.iter().zip(&self.weights).map(|(x, w)| x * w).sum();
                Ok(self.intercept + dot)
            })
            .collect()
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[cfg(feature = "torch")]
pub use torch::TorchRegressor;

#[cfg(feature = "torch")]
mod torch {
    use anyhow::{bail, Context, Result};
    use tch::{kind::Kind, CModule, Device, Tensor};

    use super::Regressor;

    /// TorchScript regressor taking `[rows, in_dim]` and returning one value per row.
    pub struct TorchRegressor {
        model: CModule,
        device: Device,
        in_dim: usize,
    }

    impl TorchRegressor {
        pub fn load(model_path: &str, in_dim: usize) -> Result<Self> {
            let device = Device::Cpu;
            let model = CModule::load_on_device(model_path, device)
                .with_context(|| format!("failed to load TorchScript {}", model_path))?;

            // Check output shape with a dummy forward; expect [1] or [1, 1]
            let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
            let t = model.forward_ts(&[dummy])?;
            let sz = t.size();
            if sz.is_empty() || sz[0] != 1 || sz.iter().skip(1).any(|d| *d != 1) {
                bail!("unexpected model output size: {:?}", sz);
            }

            Ok(Self {
                model,
                device,
                in_dim,
            })
        }
    }

    impl Regressor for TorchRegressor {
        fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
            let mut flat = Vec::with_capacity(rows.len() * self.in_dim);
            for row in rows {
                if row.len() != self.in_dim {
                    bail!(
                        "feature length mismatch: got {}, expected {}",
                        row.len(),
                        self.in_dim
                    );
                }
                flat.extend(row.iter().map(|x| *x as f32));
            }

            let input = Tensor::from_slice(flat.as_slice())
                .reshape([rows.len() as i64, self.in_dim as i64])
                .to_device(self.device);
            let out = self.model.forward_ts(&[input])?.to_kind(Kind::Double).reshape([-1]);

            let n = out.size()[0];
            if n != rows.len() as i64 {
                bail!("model returned {} values for {} rows", n, rows.len());
            }
            Ok((0..n).map(|i| out.double_value(&[i])).collect())
        }

        fn input_width(&self) -> Option<usize> {
            Some(self.in_dim)
        }

        fn name(&self) -> &str {
            "torchscript"
        }
    }
}

/// Pick a regressor implementation from the model file's extension.
pub fn load(model_path: &str, feat_list: &[String]) -> Result<Box<dyn Regressor>> {
    let path = Path::new(model_path);
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Box::new(LinearRegressor::load(path, feat_list)?)),
        #[cfg(feature = "torch")]
        Some("pt") | Some("ts") => Ok(Box::new(TorchRegressor::load(model_path, feat_list.len())?)),
        #[cfg(not(feature = "torch"))]
        Some("pt") | Some("ts") => bail!("{} needs the `torch` feature", model_path),
        _ => bail!("unsupported model format: {}", model_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_linear_predicts_one_value_per_row() {
        let m = LinearRegressor::new(10.0, vec![2.0, -1.0]);
        let out = m.predict(&[vec![1.0, 1.0], vec![3.0, 0.0]]).unwrap();
        assert_eq!(out, vec![11.0, 16.0]);
        assert_eq!(m.input_width(), Some(2));
    }

    #[test]
    fn test_linear_rejects_wrong_width() {
        let m = LinearRegressor::new(0.0, vec![1.0, 1.0, 1.0]);
        let err = m.predict(&[vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("expected 3"));
    }

    #[test]
    fn test_linear_load_orders_by_feat_list() {
        let dir = std::env::temp_dir().join(format!("linear-model-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");
        fs::write(&path, r#"{"intercept": 1.0, "coefficients": {"b": 3.0, "a": 2.0}}"#).unwrap();

        let m = LinearRegressor::load(&path, &features(&["a", "b", "c"])).unwrap();
        assert_eq!(m.weights, vec![2.0, 3.0, 0.0]);

        let err = LinearRegressor::load(&path, &features(&["a"])).err().unwrap();
        assert!(err.to_string().contains("\"b\""));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_extension() {
        assert!(load("model.pkl", &features(&["a"])).is_err());
    }
}
