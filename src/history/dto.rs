use serde::{Deserialize, Serialize};

use super::record::AnalysisRecord;
use super::store::StorageTier;
use crate::quota::QuotaDecision;

#[derive(Debug, Deserialize)]
pub struct CaptureRequest {
    /// Raw captured image bytes.
    pub image: serde_bytes::ByteBuf,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub record: AnalysisRecord,
    pub tier: StorageTier,
    /// False when persistence was skipped or failed; the client may keep the
    /// record itself (best-effort persistence, not an error).
    pub stored: bool,
    pub quota: QuotaDecision,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
    /// Rows newly hidden by the soft delete; absent for a local wipe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<u64>,
}
