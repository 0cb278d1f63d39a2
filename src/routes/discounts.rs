use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CreateDiscountRequest, UpdateDiscountRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Discount,
    response::ApiResponse,
    routes::params::DiscountQuery,
    services::discount_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route("/{id}", put(update_discount).delete(delete_discount))
}

#[utoipa::path(
    get,
    path = "/descuentos",
    params(("only_active" = Option<bool>, Query, description = "Only discounts applicable now")),
    responses((status = 200, description = "List discounts", body = ApiResponse<Vec<Discount>>)),
    tag = "Discounts"
)]
pub async fn list_discounts(
    State(state): State<AppState>,
    Query(query): Query<DiscountQuery>,
) -> AppResult<Json<ApiResponse<Vec<Discount>>>> {
    let resp = discount_service::list_discounts(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/descuentos",
    request_body = CreateDiscountRequest,
    responses(
        (status = 201, description = "Create discount", body = ApiResponse<Discount>),
        (status = 400, description = "Invalid kind, value, window or scope")
    ),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn create_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDiscountRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Discount>>)> {
    let resp = discount_service::create_discount(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/descuentos/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    request_body = UpdateDiscountRequest,
    responses((status = 200, description = "Toggle discount", body = ApiResponse<Discount>)),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn update_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> AppResult<Json<ApiResponse<Discount>>> {
    let resp = discount_service::update_discount(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/descuentos/{id}",
    params(("id" = Uuid, Path, description = "Discount ID")),
    responses((status = 200, description = "Discount deleted")),
    security(("bearer_auth" = [])),
    tag = "Discounts"
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = discount_service::delete_discount(&state, &user, id).await?;
    Ok(Json(resp))
}
