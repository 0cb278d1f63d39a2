use sea_orm::ActiveEnum;
use uuid::Uuid;

use crate::{db::DbPool, entity::sea_orm_active_enums::ActivityType, error::AppResult};

pub async fn log_activity(
    pool: &DbPool,
    user_id: Uuid,
    event_type: ActivityType,
    description: &str,
    reference_id: Option<Uuid>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO activities (id, event_type, description, reference_id, user_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(event_type.to_value())
    .bind(description)
    .bind(reference_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Same as [`log_activity`] but never fails the caller: the primary write has
/// already been committed when this runs.
pub async fn record_activity(
    pool: &DbPool,
    user_id: Uuid,
    event_type: ActivityType,
    description: &str,
    reference_id: Option<Uuid>,
) {
    if let Err(err) = log_activity(pool, user_id, event_type, description, reference_id).await {
        tracing::warn!(error = %err, event = %event_type, "activity log failed");
    }
}
