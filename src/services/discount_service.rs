use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    dto::catalog::{CreateDiscountRequest, UpdateDiscountRequest},
    entity::{
        discounts::{ActiveModel as DiscountActive, Column as DiscountCol, Entity as Discounts},
        payment_methods::Entity as PaymentMethods,
        products::Entity as Products,
        sea_orm_active_enums::DiscountKind,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Discount,
    response::{ApiResponse, Meta},
    routes::params::DiscountQuery,
    services::pricing,
    state::AppState,
};

fn validate_discount(
    payload: &CreateDiscountRequest,
    starts_at: DateTime<Utc>,
) -> AppResult<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let value_ok = match payload.kind {
        DiscountKind::Percentage => payload.value > 0.0 && payload.value <= 100.0,
        DiscountKind::FixedAmount | DiscountKind::InterestFreeInstallments => payload.value > 0.0,
    };
    if !value_ok {
        return Err(AppError::BadRequest(format!(
            "invalid value {} for a {} discount",
            payload.value, payload.kind
        )));
    }
    if payload.ends_at.is_some_and(|ends_at| ends_at <= starts_at) {
        return Err(AppError::BadRequest("discount must end after it starts".into()));
    }
    if payload.product_id.is_some() && payload.payment_method_id.is_some() {
        return Err(AppError::BadRequest(
            "a discount targets either a product or a payment method".into(),
        ));
    }
    Ok(())
}

pub async fn create_discount(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;
    let starts_at = payload.starts_at.unwrap_or_else(Utc::now);
    validate_discount(&payload, starts_at)?;

    if let Some(product_id) = payload.product_id {
        if Products::find_by_id(product_id).one(&state.orm).await?.is_none() {
            return Err(AppError::NotFound);
        }
    }
    if let Some(payment_method_id) = payload.payment_method_id {
        if PaymentMethods::find_by_id(payment_method_id)
            .one(&state.orm)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound);
        }
    }

    let discount = DiscountActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        kind: Set(payload.kind),
        value: Set(payload.value),
        starts_at: Set(starts_at.into()),
        ends_at: Set(payload.ends_at.map(Into::into)),
        conditions: Set(payload.conditions),
        active: Set(true),
        product_id: Set(payload.product_id),
        payment_method_id: Set(payload.payment_method_id),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(discount_id = %discount.id, kind = %discount.kind, "discount created");
    Ok(ApiResponse::success(
        "Discount created",
        Discount::from(discount),
        Some(Meta::empty()),
    ))
}

pub async fn list_discounts(
    state: &AppState,
    query: DiscountQuery,
) -> AppResult<ApiResponse<Vec<Discount>>> {
    let rows = Discounts::find()
        .order_by_desc(DiscountCol::StartsAt)
        .all(&state.orm)
        .await?;

    let now = Utc::now();
    let only_active = query.only_active.unwrap_or(false);
    let items = rows
        .into_iter()
        .filter(|discount| !only_active || pricing::is_applicable(discount, now))
        .map(Discount::from)
        .collect();

    Ok(ApiResponse::success("Discounts", items, Some(Meta::empty())))
}

pub async fn list_product_discounts(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<Vec<Discount>>> {
    let items = Discounts::find()
        .filter(DiscountCol::ProductId.eq(product_id))
        .order_by_desc(DiscountCol::StartsAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Discount::from)
        .collect();
    Ok(ApiResponse::success("Discounts", items, Some(Meta::empty())))
}

pub async fn update_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDiscountRequest,
) -> AppResult<ApiResponse<Discount>> {
    ensure_admin(user)?;
    let existing = Discounts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: DiscountActive = existing.into();
    active.active = Set(payload.active);
    let discount = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        Discount::from(discount),
        Some(Meta::empty()),
    ))
}

pub async fn delete_discount(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Discounts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn request(kind: DiscountKind, value: f64) -> CreateDiscountRequest {
        CreateDiscountRequest {
            name: "Hot Sale".into(),
            description: None,
            kind,
            value,
            starts_at: None,
            ends_at: None,
            conditions: None,
            product_id: Some(Uuid::new_v4()),
            payment_method_id: None,
        }
    }

    #[test]
    fn percentage_must_be_within_bounds() {
        let now = Utc::now();
        assert!(validate_discount(&request(DiscountKind::Percentage, 15.0), now).is_ok());
        assert!(validate_discount(&request(DiscountKind::Percentage, 100.0), now).is_ok());
        assert!(validate_discount(&request(DiscountKind::Percentage, 0.0), now).is_err());
        assert!(validate_discount(&request(DiscountKind::Percentage, 120.0), now).is_err());
        assert!(validate_discount(&request(DiscountKind::FixedAmount, -10.0), now).is_err());
    }

    #[test]
    fn window_must_be_ordered() {
        let now = Utc::now();
        let mut payload = request(DiscountKind::FixedAmount, 100.0);
        payload.ends_at = Some(now - Duration::days(1));
        assert!(validate_discount(&payload, now).is_err());
        payload.ends_at = Some(now + Duration::days(1));
        assert!(validate_discount(&payload, now).is_ok());
    }

    #[test]
    fn scope_is_exclusive() {
        let mut payload = request(DiscountKind::Percentage, 10.0);
        payload.payment_method_id = Some(Uuid::new_v4());
        assert!(matches!(
            validate_discount(&payload, Utc::now()),
            Err(AppError::BadRequest(_))
        ));
    }
}
