use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::reference::{CreatePaymentMethodRequest, CreateShippingCompanyRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{PaymentMethod, ShippingCompany},
    response::ApiResponse,
    services::reference_service,
    state::AppState,
};

pub fn payment_methods_router() -> Router<AppState> {
    Router::new().route("/", get(list_payment_methods).post(create_payment_method))
}

pub fn shipping_companies_router() -> Router<AppState> {
    Router::new().route("/", get(list_shipping_companies).post(create_shipping_company))
}

#[utoipa::path(
    get,
    path = "/metodos-pago",
    responses((status = 200, description = "List payment methods", body = ApiResponse<Vec<PaymentMethod>>)),
    tag = "Reference"
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<PaymentMethod>>>> {
    let resp = reference_service::list_payment_methods(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/metodos-pago",
    request_body = CreatePaymentMethodRequest,
    responses((status = 201, description = "Create payment method", body = ApiResponse<PaymentMethod>)),
    security(("bearer_auth" = [])),
    tag = "Reference"
)]
pub async fn create_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentMethodRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PaymentMethod>>)> {
    let resp = reference_service::create_payment_method(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/empresas",
    responses((status = 200, description = "List shipping companies", body = ApiResponse<Vec<ShippingCompany>>)),
    tag = "Reference"
)]
pub async fn list_shipping_companies(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ShippingCompany>>>> {
    let resp = reference_service::list_shipping_companies(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/empresas",
    request_body = CreateShippingCompanyRequest,
    responses((status = 201, description = "Create shipping company", body = ApiResponse<ShippingCompany>)),
    security(("bearer_auth" = [])),
    tag = "Reference"
)]
pub async fn create_shipping_company(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateShippingCompanyRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ShippingCompany>>)> {
    let resp = reference_service::create_shipping_company(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
