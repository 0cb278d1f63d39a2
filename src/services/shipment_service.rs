use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    activity::record_activity,
    dto::orders::{CreateShipmentRequest, UpdateShipmentStateRequest},
    entity::{
        orders::Entity as Orders,
        sea_orm_active_enums::{ActivityType, ShipmentState},
        shipments::{ActiveModel as ShipmentActive, Column as ShipmentCol, Entity as Shipments},
        shipping_companies::Entity as ShippingCompanies,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner_or_admin},
    models::Shipment,
    response::{ApiResponse, Meta, Page},
    routes::params::Pagination,
    state::AppState,
};

fn generate_tracking_code() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("TRK-{}", raw[..8].to_ascii_uppercase())
}

/// Attaches the single shipment an order may have.
pub async fn attach_shipment(
    state: &AppState,
    user: &AuthUser,
    payload: CreateShipmentRequest,
) -> AppResult<ApiResponse<Shipment>> {
    ensure_admin(user)?;
    let address = payload.address.trim();
    if address.is_empty() {
        return Err(AppError::BadRequest("address is required".into()));
    }

    let order = Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if ShippingCompanies::find_by_id(payload.company_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let existing = Shipments::find()
        .filter(ShipmentCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "shipment already exists for this order".into(),
        ));
    }

    let tracking_code = payload
        .tracking_code
        .filter(|code| !code.trim().is_empty())
        .unwrap_or_else(generate_tracking_code);

    let shipment = ShipmentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        address: Set(address.to_string()),
        company_id: Set(payload.company_id),
        tracking_code: Set(tracking_code),
        state: Set(ShipmentState::Prepared),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::from_constraint(err, "shipment already exists for this order"))?;

    tracing::info!(order_id = %order.id, tracking = %shipment.tracking_code, "shipment attached");
    record_activity(
        &state.pool,
        user.user_id,
        ActivityType::ShipmentCreated,
        &format!("Envio {} para el pedido {}", shipment.tracking_code, order.id),
        Some(shipment.id),
    )
    .await;

    Ok(ApiResponse::success(
        "Shipment created",
        Shipment::from(shipment),
        Some(Meta::empty()),
    ))
}

pub async fn update_shipment_state(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateShipmentStateRequest,
) -> AppResult<ApiResponse<Shipment>> {
    ensure_admin(user)?;
    let shipment = Shipments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ShipmentActive = shipment.into();
    active.state = Set(payload.state);
    let shipment = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Shipment updated",
        Shipment::from(shipment),
        Some(Meta::empty()),
    ))
}

pub async fn get_shipment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Shipment>> {
    let shipment = Shipments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !user.is_admin() {
        let order = Orders::find_by_id(shipment.order_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_owner_or_admin(user, order.user_id)?;
    }
    Ok(ApiResponse::success(
        "OK",
        Shipment::from(shipment),
        Some(Meta::empty()),
    ))
}

pub async fn list_shipments(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Page<Shipment>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Shipments::find().order_by_desc(ShipmentCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Shipment::from)
        .collect();

    Ok(ApiResponse::paged("Shipments", Page::new(items, page, limit, total)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_codes_have_a_fixed_shape() {
        let code = generate_tracking_code();
        assert_eq!(code.len(), 12);
        assert!(code.starts_with("TRK-"));
        assert!(code[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
