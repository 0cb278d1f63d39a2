use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    models::Activity,
    response::{ApiResponse, Page},
    routes::params::Pagination,
    services::activity_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_activities))
}

#[utoipa::path(
    get,
    path = "/actividades",
    params(
        ("pagina" = Option<i64>, Query, description = "Page number, default 1"),
        ("tamanio" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Activity log, newest first", body = ApiResponse<Page<Activity>>),
        (status = 403, description = "Administrators only")
    ),
    security(("bearer_auth" = [])),
    tag = "Activity"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Page<Activity>>>> {
    let resp = activity_service::list_activities(&state, &user, pagination).await?;
    Ok(Json(resp))
}
