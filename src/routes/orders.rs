use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{AddOrderLineRequest, CreateOrderRequest, OrderWithLines, UpdateOrderStateRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderLine},
    response::{ApiResponse, Page},
    routes::params::{OrderLinesQuery, OrderListQuery},
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/todos", get(list_all_orders))
        .route("/checkout", post(checkout))
        .route("/{id}", get(get_order))
        .route("/{id}/estado", put(update_order_state))
        .route("/{id}/cancelar", post(cancel_order))
}

pub fn lines_router() -> Router<AppState> {
    Router::new().route("/", get(list_order_lines).post(add_order_line))
}

#[utoipa::path(
    get,
    path = "/pedidos",
    params(
        ("pagina" = Option<i64>, Query, description = "Page number, default 1"),
        ("tamanio" = Option<i64>, Query, description = "Items per page, default 20"),
        ("state" = Option<String>, Query, description = "PENDIENTE | ENVIADO | ENTREGADO | CANCELADO"),
        ("sort_order" = Option<String>, Query, description = "asc | desc"),
    ),
    responses((status = 200, description = "Orders of the caller", body = ApiResponse<Page<Order>>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<Page<Order>>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/pedidos/todos",
    params(
        ("pagina" = Option<i64>, Query, description = "Page number, default 1"),
        ("tamanio" = Option<i64>, Query, description = "Items per page, default 20"),
        ("state" = Option<String>, Query, description = "PENDIENTE | ENVIADO | ENTREGADO | CANCELADO"),
        ("sort_order" = Option<String>, Query, description = "asc | desc"),
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<Page<Order>>),
        (status = 403, description = "Administrators only")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<Page<Order>>>> {
    let resp = order_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/pedidos",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "No lines or invalid quantity"),
        (status = 404, description = "User or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithLines>>)> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/pedidos/checkout",
    responses(
        (status = 201, description = "Order created from the cart", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Empty cart or insufficient stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithLines>>)> {
    let resp = order_service::checkout(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/pedidos/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with lines", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/pedidos/{id}/estado",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStateRequest,
    responses(
        (status = 200, description = "State changed", body = ApiResponse<Order>),
        (status = 409, description = "Transition not allowed")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_state(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStateRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_state(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/pedidos/{id}/cancelar",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses((status = 200, description = "Order cancelled", body = ApiResponse<Order>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/pedido-detalles",
    params(("order_id" = Uuid, Query, description = "Order ID")),
    responses((status = 200, description = "Lines of an order", body = ApiResponse<Vec<OrderLine>>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_order_lines(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderLinesQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderLine>>>> {
    let resp = order_service::list_order_lines(&state, &user, query.order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/pedido-detalles",
    request_body = AddOrderLineRequest,
    responses(
        (status = 201, description = "Line added, total recomputed", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Order is no longer pending")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn add_order_line(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddOrderLineRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithLines>>)> {
    let resp = order_service::add_order_line(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
