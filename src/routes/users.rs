use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::users::{ChangePasswordRequest, ChangeRoleRequest, UpdateProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Page},
    routes::params::Pagination,
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me).put(update_profile))
        .route("/me/password", put(change_password))
        .route("/{id}/rol", put(change_role))
}

pub fn roles_router() -> Router<AppState> {
    Router::new().route("/", get(list_roles))
}

#[utoipa::path(
    get,
    path = "/usuarios",
    params(
        ("pagina" = Option<i64>, Query, description = "Page number, default 1"),
        ("tamanio" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List users", body = ApiResponse<Page<User>>),
        (status = 403, description = "Administrators only")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Page<User>>>> {
    let resp = user_service::list_users(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/usuarios/me",
    responses((status = 200, description = "Current user", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/usuarios/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Profile updated", body = ApiResponse<User>)),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/usuarios/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password does not match")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::change_password(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/usuarios/{id}/rol",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<User>),
        (status = 404, description = "User or role not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn change_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::change_role(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/roles",
    responses((status = 200, description = "List roles", body = ApiResponse<Vec<Role>>)),
    tag = "Users"
)]
pub async fn list_roles(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Role>>>> {
    let resp = user_service::list_roles(&state).await?;
    Ok(Json(resp))
}
