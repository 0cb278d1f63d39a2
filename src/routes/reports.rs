use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::reports::{
        ActiveUser, CancellationMetrics, CostMarginRow, ProductSeasonality, SalesBucket,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::{CancellationQuery, CostMarginQuery, SalesByPeriodQuery, SeasonalityQuery},
    services::report_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ventas", get(sales_by_period))
        .route("/estacionalidad", get(seasonality))
        .route("/costos-margen", get(cost_margin))
        .route("/cancelaciones", get(cancellations))
        .route("/usuarios-activos", get(most_active_users))
}

#[utoipa::path(
    get,
    path = "/reportes/ventas",
    params(
        ("granularity" = String, Query, description = "diario | semanal | mensual"),
        ("start" = String, Query, description = "First day, YYYY-MM-DD (inclusive)"),
        ("end" = String, Query, description = "Last day, YYYY-MM-DD (exclusive)"),
    ),
    responses(
        (status = 200, description = "Delivered sales per period", body = ApiResponse<Vec<SalesBucket>>),
        (status = 400, description = "start must be before end")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn sales_by_period(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SalesByPeriodQuery>,
) -> AppResult<Json<ApiResponse<Vec<SalesBucket>>>> {
    let resp = report_service::sales_by_period(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reportes/estacionalidad",
    params(("year" = i32, Query, description = "Calendar year")),
    responses((status = 200, description = "Units sold per product and month", body = ApiResponse<Vec<ProductSeasonality>>)),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn seasonality(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SeasonalityQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSeasonality>>>> {
    let resp = report_service::product_seasonality(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reportes/costos-margen",
    params(
        ("product_id" = Option<String>, Query, description = "Single product"),
        ("category_id" = Option<String>, Query, description = "Products of a category"),
    ),
    responses((status = 200, description = "Cost, profit and margin per product", body = ApiResponse<Vec<CostMarginRow>>)),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn cost_margin(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CostMarginQuery>,
) -> AppResult<Json<ApiResponse<Vec<CostMarginRow>>>> {
    let resp = report_service::cost_margin(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reportes/cancelaciones",
    params(("months" = Option<u32>, Query, description = "Trailing months of history, 1 to 12, default 3")),
    responses(
        (status = 200, description = "Cancellation rate and monthly history", body = ApiResponse<CancellationMetrics>),
        (status = 400, description = "months out of range")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn cancellations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CancellationQuery>,
) -> AppResult<Json<ApiResponse<CancellationMetrics>>> {
    let resp = report_service::cancellation_metrics(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/reportes/usuarios-activos",
    responses((status = 200, description = "Top users by order count", body = ApiResponse<Vec<ActiveUser>>)),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn most_active_users(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<ActiveUser>>>> {
    let resp = report_service::most_active_users(&state, &user).await?;
    Ok(Json(resp))
}
