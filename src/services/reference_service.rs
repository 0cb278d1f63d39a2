use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::reference::{CreatePaymentMethodRequest, CreateShippingCompanyRequest},
    entity::{
        payment_methods::{
            ActiveModel as PaymentMethodActive, Column as PaymentMethodCol,
            Entity as PaymentMethods,
        },
        shipping_companies::{
            ActiveModel as ShippingCompanyActive, Column as ShippingCompanyCol,
            Entity as ShippingCompanies,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{PaymentMethod, ShippingCompany},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_payment_method(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentMethodRequest,
) -> AppResult<ApiResponse<PaymentMethod>> {
    ensure_admin(user)?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let method = PaymentMethodActive {
        id: Set(Uuid::new_v4()),
        kind: Set(payload.kind),
        name: Set(name.to_string()),
        image_url: Set(payload.image_url),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Payment method created",
        PaymentMethod::from(method),
        Some(Meta::empty()),
    ))
}

pub async fn list_payment_methods(state: &AppState) -> AppResult<ApiResponse<Vec<PaymentMethod>>> {
    let items = PaymentMethods::find()
        .order_by_asc(PaymentMethodCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PaymentMethod::from)
        .collect();
    Ok(ApiResponse::success("Payment methods", items, Some(Meta::empty())))
}

pub async fn create_shipping_company(
    state: &AppState,
    user: &AuthUser,
    payload: CreateShippingCompanyRequest,
) -> AppResult<ApiResponse<ShippingCompany>> {
    ensure_admin(user)?;
    if payload.name.trim().is_empty() || payload.address.trim().is_empty() {
        return Err(AppError::BadRequest("name and address are required".into()));
    }

    let company = ShippingCompanyActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        address: Set(payload.address.trim().to_string()),
        phone: Set(payload.phone),
        image_url: Set(payload.image_url),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Shipping company created",
        ShippingCompany::from(company),
        Some(Meta::empty()),
    ))
}

pub async fn list_shipping_companies(
    state: &AppState,
) -> AppResult<ApiResponse<Vec<ShippingCompany>>> {
    let items = ShippingCompanies::find()
        .order_by_asc(ShippingCompanyCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ShippingCompany::from)
        .collect();
    Ok(ApiResponse::success("Shipping companies", items, Some(Meta::empty())))
}
