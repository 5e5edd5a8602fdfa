use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::SyncError;

/// Entitlement tier of the current caller. Determines both the daily quota and
/// which history backend a record lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Anonymous,
    Free,
    Entitled,
}

/// Supplies the current subscription tier. Passed explicitly into the quota
/// evaluator and history store so tier decisions stay testable; callers must
/// re-ask on login, after a payment flow, and before every gated action, since
/// entitlement can change mid-session.
#[async_trait]
pub trait EntitlementResolver: Send + Sync {
    async fn current_tier(&self, owner: Option<Uuid>) -> Result<Tier, SyncError>;
}

const PAID_PLANS: [&str; 2] = ["monthly", "annual"];

#[derive(Debug, Clone, FromRow)]
struct SubscriptionRow {
    plan_type: String,
    is_active: bool,
}

fn classify(row: Option<&SubscriptionRow>) -> Tier {
    match row {
        Some(sub) if sub.is_active && PAID_PLANS.contains(&sub.plan_type.as_str()) => {
            Tier::Entitled
        }
        _ => Tier::Free,
    }
}

/// Resolver backed by the `subscriptions` table.
pub struct DbEntitlements {
    db: PgPool,
}

impl DbEntitlements {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntitlementResolver for DbEntitlements {
    async fn current_tier(&self, owner: Option<Uuid>) -> Result<Tier, SyncError> {
        let Some(owner_id) = owner else {
            return Ok(Tier::Anonymous);
        };
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT plan_type, is_active
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .map_err(SyncError::Persistence)?;
        Ok(classify(row.as_ref()))
    }
}

/// Fixed-tier resolver for tests and offline use. Anonymous callers still
/// resolve to [`Tier::Anonymous`].
pub struct FixedTier(pub Tier);

#[async_trait]
impl EntitlementResolver for FixedTier {
    async fn current_tier(&self, owner: Option<Uuid>) -> Result<Tier, SyncError> {
        if owner.is_none() {
            return Ok(Tier::Anonymous);
        }
        Ok(self.0)
    }
}
