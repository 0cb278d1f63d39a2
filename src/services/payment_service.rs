use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    activity::record_activity,
    dto::orders::{CreatePaymentRequest, UpdatePaymentStateRequest},
    entity::{
        orders::Entity as Orders,
        payment_methods::Entity as PaymentMethods,
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        sea_orm_active_enums::{ActivityType, OrderState, PaymentState},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner_or_admin},
    models::Payment,
    response::{ApiResponse, Meta, Page},
    routes::params::Pagination,
    services::pricing,
    state::AppState,
};

/// Registers the single payment of an order. The amount is the order total after
/// any discount attached to the chosen payment method.
pub async fn attach_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    let order = Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;
    if order.state == OrderState::Cancelled {
        return Err(AppError::BadRequest("cannot pay a cancelled order".into()));
    }

    if PaymentMethods::find_by_id(payload.payment_method_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let existing = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "payment already exists for this order".into(),
        ));
    }

    let amount =
        pricing::payment_amount(&state.orm, order.total, payload.payment_method_id, Utc::now())
            .await?;

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        amount: Set(amount),
        state: Set(PaymentState::Pending),
        payment_method_id: Set(payload.payment_method_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::from_constraint(err, "payment already exists for this order"))?;

    tracing::info!(order_id = %order.id, amount, "payment attached");
    record_activity(
        &state.pool,
        user.user_id,
        ActivityType::PaymentCreated,
        &format!("Pago de {amount} para el pedido {}", order.id),
        Some(payment.id),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment created",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

pub async fn update_payment_state(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePaymentStateRequest,
) -> AppResult<ApiResponse<Payment>> {
    ensure_admin(user)?;
    let payment = Payments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: PaymentActive = payment.into();
    active.state = Set(payload.state);
    let payment = active.update(&state.orm).await?;

    tracing::info!(payment_id = %id, state = %payload.state, "payment state changed");
    Ok(ApiResponse::success(
        "Payment updated",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

pub async fn get_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let payment = Payments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = Orders::find_by_id(payment.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;

    Ok(ApiResponse::success(
        "OK",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

pub async fn list_payments(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Page<Payment>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Payments::find().order_by_desc(PaymentCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Payment::from)
        .collect();

    Ok(ApiResponse::paged("Payments", Page::new(items, page, limit, total)))
}
