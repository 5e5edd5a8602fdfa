use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::inference::NutritionEstimate;

pub const DEFAULT_SERVING: &str = "1 serving";
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// One logged food item. Macro values are never null at rest; they are
/// defaulted to zero when the inference result omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub serving_size: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// False once soft-deleted. Only meaningful on the remote tier; local
    /// records are always visible (removal there is physical).
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// A completed analysis about to be persisted. Created atomically with the
/// inference result; ids and timestamps are assigned by the chosen tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAnalysis {
    pub name: String,
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
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl NewAnalysis {
    pub fn from_estimate(estimate: NutritionEstimate, image_ref: Option<String>) -> Self {
        Self {
            name: estimate.name,
            calories: estimate.calories,
            protein_g: estimate.protein_g,
            carbs_g: estimate.carbs_g,
            fat_g: estimate.fat_g,
            serving_size: estimate.serving_size,
            image_ref,
        }
    }

    /// Materializes a local-tier record: client-generated id, current UTC
    /// timestamp, missing macros pinned to zero.
    pub fn into_local_record(self, owner_id: Option<Uuid>) -> AnalysisRecord {
        AnalysisRecord {
            id: Uuid::new_v4(),
            owner_id,
            name: self.name,
            calories: self.calories.unwrap_or_default(),
            protein_g: self.protein_g.unwrap_or_default(),
            carbs_g: self.carbs_g.unwrap_or_default(),
            fat_g: self.fat_g.unwrap_or_default(),
            serving_size: self.serving_size.unwrap_or_else(|| DEFAULT_SERVING.into()),
            image_ref: self.image_ref,
            created_at: OffsetDateTime::now_utc(),
            visible: true,
        }
    }
}

/// Illustrative entry shown when the local tier is empty and no query is set.
pub fn placeholder_record() -> AnalysisRecord {
    AnalysisRecord {
        id: Uuid::new_v4(),
        owner_id: None,
        name: "Example item (clear history to remove)".into(),
        calories: 100.0,
        protein_g: 10.0,
        carbs_g: 10.0,
        fat_g: 2.0,
        serving_size: DEFAULT_SERVING.into(),
        image_ref: Some(PLACEHOLDER_IMAGE.into()),
        created_at: OffsetDateTime::now_utc(),
        visible: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate_without_macros() -> NutritionEstimate {
        NutritionEstimate {
            name: "Mystery soup".into(),
            confidence: 0.5,
            calories: None,
            protein_g: None,
            carbs_g: None,
            fat_g: None,
            serving_size: None,
        }
    }

    #[test]
    fn missing_macros_default_to_zero_at_rest() {
        let record =
            NewAnalysis::from_estimate(estimate_without_macros(), None).into_local_record(None);
        assert_eq!(record.calories, 0.0);
        assert_eq!(record.protein_g, 0.0);
        assert_eq!(record.carbs_g, 0.0);
        assert_eq!(record.fat_g, 0.0);
        assert_eq!(record.serving_size, DEFAULT_SERVING);
        assert!(record.visible);
    }

    #[test]
    fn record_serde_roundtrip_keeps_timestamp() {
        let record = NewAnalysis {
            name: "Apple".into(),
            calories: Some(52.0),
            ..Default::default()
        }
        .into_local_record(Some(Uuid::new_v4()));
        let json = serde_json::to_string(&record).expect("serialize");
        let back: AnalysisRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, record);
    }

    #[test]
    fn visible_defaults_to_true_for_legacy_blobs() {
        let json = r#"{
            "id": "6f2a1e4e-0000-4000-8000-000000000000",
            "name": "Toast",
            "calories": 80.0,
            "protein_g": 3.0,
            "carbs_g": 14.0,
            "fat_g": 1.0,
            "serving_size": "1 slice",
            "created_at": "2026-08-01T08:00:00Z"
        }"#;
        let record: AnalysisRecord = serde_json::from_str(json).expect("deserialize");
        assert!(record.visible);
    }
}
