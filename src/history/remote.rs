use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::record::{AnalysisRecord, NewAnalysis, DEFAULT_SERVING};
use crate::error::SyncError;

const RECORD_COLUMNS: &str =
    "id, user_id, food_name, calories, protein, carbs, fat, serving_size, image_url, is_deleted, created_at";

#[derive(Debug, Clone, FromRow)]
struct FoodUploadRow {
    id: Uuid,
    user_id: Uuid,
    food_name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    serving_size: String,
    image_url: Option<String>,
    is_deleted: bool,
    created_at: OffsetDateTime,
}

impl From<FoodUploadRow> for AnalysisRecord {
    fn from(row: FoodUploadRow) -> Self {
        Self {
            id: row.id,
            owner_id: Some(row.user_id),
            name: row.food_name,
            calories: row.calories,
            protein_g: row.protein,
            carbs_g: row.carbs,
            fat_g: row.fat,
            serving_size: row.serving_size,
            image_ref: row.image_url,
            created_at: row.created_at,
            visible: !row.is_deleted,
        }
    }
}

/// Escapes `\`, `%` and `_` so user text matches literally inside an ILIKE
/// pattern.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Durable per-owner history rows with soft-delete. Row-level isolation and
/// cross-device consistency are the backend's job, not re-implemented here.
pub struct RemoteHistory {
    db: PgPool,
}

impl RemoteHistory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Server assigns id and timestamp.
    pub async fn save(
        &self,
        owner_id: Uuid,
        new: NewAnalysis,
    ) -> Result<AnalysisRecord, SyncError> {
        let row = sqlx::query_as::<_, FoodUploadRow>(&format!(
            r#"
            INSERT INTO food_uploads (user_id, food_name, calories, protein, carbs, fat, serving_size, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {RECORD_COLUMNS}
            "#,
        ))
        .bind(owner_id)
        .bind(&new.name)
        .bind(new.calories.unwrap_or_default())
        .bind(new.protein_g.unwrap_or_default())
        .bind(new.carbs_g.unwrap_or_default())
        .bind(new.fat_g.unwrap_or_default())
        .bind(new.serving_size.as_deref().unwrap_or(DEFAULT_SERVING))
        .bind(&new.image_ref)
        .fetch_one(&self.db)
        .await
        .map_err(SyncError::Persistence)?;
        Ok(row.into())
    }

    /// Visible rows only, newest first, with the substring filter pushed down
    /// as an escaped ILIKE pattern.
    pub async fn list(
        &self,
        owner_id: Uuid,
        filter: Option<&str>,
    ) -> Result<Vec<AnalysisRecord>, SyncError> {
        let rows = match filter.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let pattern = format!("%{}%", escape_like(query));
                sqlx::query_as::<_, FoodUploadRow>(&format!(
                    r#"
                    SELECT {RECORD_COLUMNS}
                    FROM food_uploads
                    WHERE user_id = $1 AND is_deleted = FALSE AND food_name ILIKE $2
                    ORDER BY created_at DESC
                    "#,
                ))
                .bind(owner_id)
                .bind(pattern)
                .fetch_all(&self.db)
                .await
            }
            None => {
                sqlx::query_as::<_, FoodUploadRow>(&format!(
                    r#"
                    SELECT {RECORD_COLUMNS}
                    FROM food_uploads
                    WHERE user_id = $1 AND is_deleted = FALSE
                    ORDER BY created_at DESC
                    "#,
                ))
                .bind(owner_id)
                .fetch_all(&self.db)
                .await
            }
        }
        .map_err(SyncError::Persistence)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Hides every currently-visible row for the owner; rows already hidden
    /// are untouched, so a second call affects zero rows. The count is for
    /// confirmation UX only.
    pub async fn soft_delete_all(&self, owner_id: Uuid) -> Result<u64, SyncError> {
        let result = sqlx::query(
            r#"
            UPDATE food_uploads
            SET is_deleted = TRUE
            WHERE user_id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(owner_id)
        .execute(&self.db)
        .await
        .map_err(SyncError::Persistence)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_passes_plain_text_through() {
        assert_eq!(escape_like("apple pie"), "apple pie");
    }

    #[test]
    fn escape_like_escapes_wildcards_and_backslash() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
    }

    fn new_item(name: &str) -> NewAnalysis {
        NewAnalysis {
            name: name.into(),
            calories: Some(100.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[ignore = "needs Postgres; set DATABASE_URL and run with --ignored"]
    async fn round_trip_lists_newest_first_and_soft_delete_is_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let db = PgPool::connect(&url).await.expect("connect");
        sqlx::migrate!("./migrations").run(&db).await.expect("migrate");
        let history = RemoteHistory::new(db);
        let owner = Uuid::new_v4();

        let first = history.save(owner, new_item("Banana")).await.expect("save");
        let second = history.save(owner, new_item("Apple")).await.expect("save");

        let listed = history.list(owner, None).await.expect("list");
        assert_eq!(
            listed.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        assert_eq!(history.soft_delete_all(owner).await.expect("clear"), 2);
        assert!(history.list(owner, None).await.expect("list").is_empty());
        // A second pass finds nothing left to hide.
        assert_eq!(history.soft_delete_all(owner).await.expect("clear again"), 0);
    }

    #[test]
    fn row_maps_soft_delete_flag_to_visibility() {
        let row = FoodUploadRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            food_name: "Toast".into(),
            calories: 80.0,
            protein: 3.0,
            carbs: 14.0,
            fat: 1.0,
            serving_size: "1 slice".into(),
            image_url: None,
            is_deleted: true,
            created_at: OffsetDateTime::now_utc(),
        };
        let record: AnalysisRecord = row.into();
        assert!(!record.visible);
        assert!(record.owner_id.is_some());
    }
}
