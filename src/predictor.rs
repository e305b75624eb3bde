use crate::errors::AppError;
use crate::models::{FeatureVector, PredictionResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Number of features the model was trained on.
pub const FEATURE_COUNT: usize = 10;

/// A single prediction: the class and the model's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// 1 = churn risk, 0 = no churn risk.
    pub label: u8,
    /// Confidence in the predicted label: P(class=1) when label is 1,
    /// P(class=0) otherwise.
    pub probability: f64,
}

/// Pre-trained churn classifier, deserialized from the model artifact.
///
/// Loaded once at startup and immutable thereafter. A missing or corrupt
/// artifact fails application startup; inference failures are surfaced as
/// result-level errors, never panics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnModel {
    pub model_id: String,
    /// Trained feature column names, in order.
    pub features: Vec<String>,
    /// Per-feature coefficients, same order as `features`.
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl ChurnModel {
    /// Loads the model artifact from disk, validating its shape.
    ///
    /// # Arguments
    ///
    /// * `path` - Filesystem path to the JSON artifact.
    ///
    /// # Returns
    ///
    /// * `anyhow::Result<ChurnModel>` - The loaded model, or a startup-fatal error.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("model artifact '{}' is missing or unreadable", path))?;
        let model: ChurnModel = serde_json::from_str(&raw)
            .with_context(|| format!("model artifact '{}' is not a valid model file", path))?;

        if model.weights.len() != FEATURE_COUNT {
            anyhow::bail!(
                "model artifact '{}' has {} weights, expected {}",
                path,
                model.weights.len(),
                FEATURE_COUNT
            );
        }
        if model.weights.iter().any(|w| !w.is_finite()) || !model.intercept.is_finite() {
            anyhow::bail!("model artifact '{}' contains non-finite parameters", path);
        }

        tracing::info!("Churn model '{}' loaded from {}", model.model_id, path);
        Ok(model)
    }

    /// Runs inference on an encoded feature vector.
    ///
    /// Malformed vectors (non-finite values) yield a `PredictionError`
    /// rather than propagating past the handler boundary. No retries.
    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction, AppError> {
        let features = vector.as_array();
        if features.iter().any(|f| !f.is_finite()) {
            return Err(AppError::PredictionError(
                "feature vector contains non-finite values".to_string(),
            ));
        }

        let score: f64 = self
            .weights
            .iter()
            .zip(features.iter())
            .map(|(w, f)| w * f)
            .sum::<f64>()
            + self.intercept;

        let p1 = sigmoid(score);
        if !p1.is_finite() {
            return Err(AppError::PredictionError(
                "model produced a non-finite probability".to_string(),
            ));
        }

        let label = if p1 >= 0.5 { 1 } else { 0 };
        let probability = if label == 1 { p1 } else { 1.0 - p1 };

        Ok(Prediction { label, probability })
    }
}

impl From<Prediction> for PredictionResult {
    fn from(p: Prediction) -> Self {
        PredictionResult::Ok {
            label: p.label,
            probability: p.probability,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
