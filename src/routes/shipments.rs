use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreatePaymentRequest, CreateShipmentRequest, UpdatePaymentStateRequest,
        UpdateShipmentStateRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Payment, Shipment},
    response::{ApiResponse, Page},
    routes::params::Pagination,
    services::{payment_service, shipment_service},
    state::AppState,
};

pub fn shipments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shipments).post(create_shipment))
        .route("/{id}", get(get_shipment))
        .route("/{id}/estado", put(update_shipment_state))
}

pub fn payments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/{id}", get(get_payment))
        .route("/{id}/estado", put(update_payment_state))
}

#[utoipa::path(
    get,
    path = "/envios",
    params(
        ("pagina" = Option<i64>, Query, description = "Page number, default 1"),
        ("tamanio" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses((status = 200, description = "List shipments", body = ApiResponse<Page<Shipment>>)),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn list_shipments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Page<Shipment>>>> {
    let resp = shipment_service::list_shipments(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/envios",
    request_body = CreateShipmentRequest,
    responses(
        (status = 201, description = "Shipment attached", body = ApiResponse<Shipment>),
        (status = 400, description = "Order already has a shipment")
    ),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn create_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateShipmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Shipment>>)> {
    let resp = shipment_service::attach_shipment(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/envios/{id}",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    responses((status = 200, description = "Get shipment", body = ApiResponse<Shipment>)),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn get_shipment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    let resp = shipment_service::get_shipment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/envios/{id}/estado",
    params(("id" = Uuid, Path, description = "Shipment ID")),
    request_body = UpdateShipmentStateRequest,
    responses((status = 200, description = "Shipment state changed", body = ApiResponse<Shipment>)),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn update_shipment_state(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentStateRequest>,
) -> AppResult<Json<ApiResponse<Shipment>>> {
    let resp = shipment_service::update_shipment_state(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/pagos",
    params(
        ("pagina" = Option<i64>, Query, description = "Page number, default 1"),
        ("tamanio" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses((status = 200, description = "List payments", body = ApiResponse<Page<Payment>>)),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<Page<Payment>>>> {
    let resp = payment_service::list_payments(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/pagos",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment registered", body = ApiResponse<Payment>),
        (status = 400, description = "Order already paid or cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Payment>>)> {
    let resp = payment_service::attach_payment(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/pagos/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses((status = 200, description = "Get payment", body = ApiResponse<Payment>)),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::get_payment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/pagos/{id}/estado",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = UpdatePaymentStateRequest,
    responses((status = 200, description = "Payment state changed", body = ApiResponse<Payment>)),
    security(("bearer_auth" = [])),
    tag = "Fulfilment"
)]
pub async fn update_payment_state(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentStateRequest>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::update_payment_state(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
