use axum::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// What the vision endpoint returns for one captured photo. Macro fields are
/// optional on the wire; the record store defaults them to zero at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub name: String,
    pub confidence: f64,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
    #[serde(default)]
    pub serving_size: Option<String>,
}

/// The remote vision/LLM collaborator. Failures are opaque to the sync layer
/// and retried manually by the user, never automatically.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn analyze(&self, image: Bytes) -> Result<NutritionEstimate, SyncError>;
}

/// Canned estimate standing in for the real vision endpoint.
pub struct CannedInference;

#[async_trait]
impl InferenceClient for CannedInference {
    async fn analyze(&self, image: Bytes) -> Result<NutritionEstimate, SyncError> {
        if image.is_empty() {
            return Err(SyncError::Inference("empty image".into()));
        }
        Ok(NutritionEstimate {
            name: "Shrimp salad".into(),
            confidence: 0.93,
            calories: Some(245.0),
            protein_g: Some(18.0),
            carbs_g: Some(12.0),
            fat_g: Some(14.0),
            serving_size: Some("1 serving (200g)".into()),
        })
    }
}
