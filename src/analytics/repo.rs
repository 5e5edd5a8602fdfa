use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// One visible logged item, reduced to what the aggregate views need.
#[derive(Debug, Clone, FromRow)]
pub struct NutritionRow {
    pub created_at: OffsetDateTime,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Visible rows in the look-back window, oldest first. Soft-deleted rows are
/// excluded from every aggregate.
pub async fn visible_rows_since(
    db: &PgPool,
    owner_id: Uuid,
    since: OffsetDateTime,
) -> sqlx::Result<Vec<NutritionRow>> {
    sqlx::query_as::<_, NutritionRow>(
        r#"
        SELECT created_at, calories, protein, carbs, fat
        FROM food_uploads
        WHERE user_id = $1 AND is_deleted = FALSE AND created_at >= $2
        ORDER BY created_at
        "#,
    )
    .bind(owner_id)
    .bind(since)
    .fetch_all(db)
    .await
}

/// The user's single editable daily calorie goal, if set.
pub async fn daily_goal(db: &PgPool, owner_id: Uuid) -> sqlx::Result<Option<i32>> {
    let goal: Option<Option<i32>> = sqlx::query_scalar(
        r#"
        SELECT daily_calories_goal
        FROM profiles
        WHERE user_id = $1
        "#,
    )
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    Ok(goal.flatten())
}

pub async fn set_daily_goal(db: &PgPool, owner_id: Uuid, goal: i32) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, daily_calories_goal)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET daily_calories_goal = EXCLUDED.daily_calories_goal
        "#,
    )
    .bind(owner_id)
    .bind(goal)
    .execute(db)
    .await?;
    Ok(())
}
