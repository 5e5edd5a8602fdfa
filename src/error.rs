use axum::http::StatusCode;
use thiserror::Error;

/// Errors raised by the history/quota/sync layer.
///
/// Quota and persistence failures are recovered as close to the source as
/// possible (the capture flow downgrades a failed save to a notice); what
/// escapes here is mapped to an HTTP status by [`SyncError::http`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sign in required")]
    AuthRequired,

    #[error("daily analysis limit reached")]
    QuotaExceeded { remaining: u32 },

    /// The quota count query failed. The evaluator fails closed: the caller
    /// must treat this as "not allowed, retry later", never as an allow.
    #[error("quota check failed")]
    QuotaUnavailable(#[source] sqlx::Error),

    #[error("history persistence failed")]
    Persistence(#[source] sqlx::Error),

    #[error("local history store failed: {0}")]
    LocalStore(String),

    #[error("analysis failed: {0}")]
    Inference(String),

    #[error("image storage failed: {0}")]
    Storage(String),
}

impl SyncError {
    pub fn status(&self) -> StatusCode {
        match self {
            SyncError::AuthRequired => StatusCode::UNAUTHORIZED,
            SyncError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            SyncError::QuotaUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::Persistence(_) | SyncError::LocalStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SyncError::Inference(_) | SyncError::Storage(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn http(self) -> (StatusCode, String) {
        (self.status(), self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exceeded_maps_to_too_many_requests() {
        let (status, msg) = SyncError::QuotaExceeded { remaining: 0 }.http();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(!msg.is_empty());
    }

    #[test]
    fn auth_required_maps_to_unauthorized() {
        assert_eq!(SyncError::AuthRequired.status(), StatusCode::UNAUTHORIZED);
    }
}
