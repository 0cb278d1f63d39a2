use chrono::Utc;
use sea_orm::{ActiveEnum, ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateCartLineRequest},
    entity::{
        carts::{Column as CartCol, Entity as Carts},
        products::Entity as Products,
        sea_orm_active_enums::CartState,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartLine},
    response::{ApiResponse, Meta},
    services::pricing,
    state::AppState,
};

/// Returns the user's PENDIENTE cart, creating it when absent.
///
/// The insert relies on the partial unique index over `(user_id) WHERE state = 'PENDIENTE'`,
/// so two concurrent callers end up reading the same row.
pub async fn get_or_create_active_cart(state: &AppState, user_id: Uuid) -> AppResult<Cart> {
    sqlx::query(
        r#"
        INSERT INTO carts (id, user_id, state)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) WHERE state = 'PENDIENTE' DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(CartState::Pending.to_value())
    .execute(&state.pool)
    .await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::State.eq(CartState::Pending))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("pending cart vanished after upsert")))?;

    Ok(Cart::from(cart))
}

/// Takes a share lock on the cart row for the rest of the transaction.
///
/// Checkout holds the row `FOR UPDATE` while it confirms the cart, so a writer
/// waiting here observes the confirmed state instead of writing into it.
async fn lock_pending_cart(conn: &mut sqlx::PgConnection, cart_id: Uuid) -> AppResult<()> {
    let row: Option<(String,)> = sqlx::query_as("SELECT state FROM carts WHERE id = $1 FOR SHARE")
        .bind(cart_id)
        .fetch_optional(&mut *conn)
        .await?;
    let (cart_state,) = row.ok_or(AppError::NotFound)?;
    if cart_state != CartState::Pending.to_value() {
        return Err(AppError::BadRequest("cart is already confirmed".into()));
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Adds `quantity` units to the cart, merging into an existing line for the same product.
pub async fn add_line(
    state: &AppState,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<CartLine> {
    validate_quantity(quantity)?;

    let mut tx = state.pool.begin().await?;
    lock_pending_cart(&mut tx, cart_id).await?;

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let unit_price = pricing::unit_price(&state.orm, &product, Utc::now()).await?;
    let subtotal = unit_price * quantity as i64;

    let line = sqlx::query_as::<_, CartLine>(
        r#"
        INSERT INTO cart_lines (id, cart_id, product_id, quantity, subtotal)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (cart_id, product_id) DO UPDATE
        SET quantity = cart_lines.quantity + EXCLUDED.quantity,
            subtotal = cart_lines.subtotal + EXCLUDED.subtotal
        RETURNING id, cart_id, product_id, quantity, subtotal
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .bind(subtotal)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(line)
}

/// Overwrites the quantity of an existing line and reprices it.
pub async fn update_quantity(
    state: &AppState,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<CartLine> {
    validate_quantity(quantity)?;

    let mut tx = state.pool.begin().await?;
    lock_pending_cart(&mut tx, cart_id).await?;

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let unit_price = pricing::unit_price(&state.orm, &product, Utc::now()).await?;

    let line = sqlx::query_as::<_, CartLine>(
        r#"
        UPDATE cart_lines
        SET quantity = $3, subtotal = $4
        WHERE cart_id = $1 AND product_id = $2
        RETURNING id, cart_id, product_id, quantity, subtotal
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price * quantity as i64)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound)?;

    tx.commit().await?;
    Ok(line)
}

pub async fn remove_line(state: &AppState, cart_id: Uuid, product_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Removes every line. Clearing an empty cart is not an error.
pub async fn clear_cart(state: &AppState, cart_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&state.pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn cart_lines(state: &AppState, cart_id: Uuid) -> AppResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT id, cart_id, product_id, quantity, subtotal
        FROM cart_lines
        WHERE cart_id = $1
        ORDER BY product_id
        "#,
    )
    .bind(cart_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(lines)
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let cart = get_or_create_active_cart(state, user.user_id).await?;
    let lines = cart_lines(state, cart.id).await?;
    let total = lines.iter().map(|line| line.subtotal).sum();

    Ok(ApiResponse::success(
        "OK",
        CartView { cart, lines, total },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartLine>> {
    let cart = get_or_create_active_cart(state, user.user_id).await?;
    let line = add_line(state, cart.id, payload.product_id, payload.quantity).await?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %payload.product_id,
        quantity = line.quantity,
        "cart line merged"
    );
    Ok(ApiResponse::success("Added to cart", line, Some(Meta::empty())))
}

pub async fn change_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartLineRequest,
) -> AppResult<ApiResponse<CartLine>> {
    let cart = get_or_create_active_cart(state, user.user_id).await?;
    let line = update_quantity(state, cart.id, product_id, payload.quantity).await?;
    Ok(ApiResponse::success("Cart updated", line, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = get_or_create_active_cart(state, user.user_id).await?;
    remove_line(state, cart.id, product_id).await?;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn empty_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = get_or_create_active_cart(state, user.user_id).await?;
    let removed = clear_cart(state, cart.id).await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": removed }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(matches!(validate_quantity(0), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_quantity(-3), Err(AppError::BadRequest(_))));
    }
}
