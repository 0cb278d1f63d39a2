use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};

use crate::{
    entity::activities::{Column as ActivityCol, Entity as Activities},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Activity,
    response::{ApiResponse, Page},
    routes::params::Pagination,
    state::AppState,
};

/// Newest first. The log is append-only.
pub async fn list_activities(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Page<Activity>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Activities::find()
        .order_by_desc(ActivityCol::CreatedAt)
        .order_by_desc(ActivityCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Activity::from)
        .collect();

    Ok(ApiResponse::paged("Activities", Page::new(items, page, limit, total)))
}
