use std::collections::HashSet;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    activity::record_activity,
    dto::orders::{
        AddOrderLineRequest, CreateOrderRequest, OrderLineInput, OrderWithLines,
        UpdateOrderStateRequest,
    },
    entity::{
        cart_lines::{self, Column as CartLineCol, Entity as CartLines},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        order_lines::{ActiveModel as OrderLineActive, Column as OrderLineCol, Entity as OrderLines},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        sea_orm_active_enums::{ActivityType, CartState, OrderState},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner_or_admin},
    models::{Order, OrderLine},
    response::{ApiResponse, Meta, Page},
    routes::params::{OrderListQuery, SortOrder},
    services::pricing,
    state::AppState,
};

fn validate_lines(lines: &[OrderLineInput]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("an order needs at least one line".into()));
    }
    if lines.iter().any(|line| line.quantity <= 0) {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Validates a requested state change against the transition table.
pub fn check_transition(current: OrderState, next: OrderState) -> AppResult<()> {
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: current.to_string(),
            to: next.to_string(),
        });
    }
    Ok(())
}

async fn load_lines<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
    let lines = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order_id))
        .order_by_asc(OrderLineCol::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderLine::from)
        .collect();
    Ok(lines)
}

async fn with_lines<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderWithLines> {
    let lines = load_lines(conn, order.id).await?;
    Ok(OrderWithLines {
        order: Order::from(order),
        lines,
    })
}

/// Creates a PENDIENTE order priced from the catalog at the time of the call.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let owner_id = payload.user_id.unwrap_or(user.user_id);
    ensure_owner_or_admin(user, owner_id)?;
    validate_lines(&payload.lines)?;

    if Users::find_by_id(owner_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let product_ids: Vec<Uuid> = payload
        .lines
        .iter()
        .map(|line| line.product_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let txn = state.orm.begin().await?;

    let products = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.iter().copied()))
        .all(&txn)
        .await?;
    if products.len() != product_ids.len() {
        return Err(AppError::NotFound);
    }
    let discounts = pricing::product_discounts(&txn, &product_ids).await?;
    let now = Utc::now();

    let order_id = Uuid::new_v4();
    let mut priced = Vec::with_capacity(payload.lines.len());
    for line in &payload.lines {
        let product = products
            .iter()
            .find(|product| product.id == line.product_id)
            .ok_or(AppError::NotFound)?;
        let unit_price = pricing::best_price(
            product.price,
            discounts.get(&product.id).into_iter().flatten(),
            now,
        );
        priced.push((line.product_id, line.quantity, unit_price));
    }
    let total: i64 = priced
        .iter()
        .map(|(_, quantity, unit_price)| unit_price * *quantity as i64)
        .sum();

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(owner_id),
        total: Set(total),
        state: Set(OrderState::Pending),
        stock_reserved: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines = Vec::with_capacity(priced.len());
    for (product_id, quantity, unit_price) in priced {
        let line = OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            subtotal: Set(unit_price * quantity as i64),
        }
        .insert(&txn)
        .await?;
        lines.push(OrderLine::from(line));
    }

    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %owner_id, total, "order created");
    record_activity(
        &state.pool,
        owner_id,
        ActivityType::OrderCreated,
        &format!("Pedido creado por {total}"),
        Some(order.id),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        OrderWithLines {
            order: Order::from(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Appends a line to a PENDIENTE order and recomputes its total from all lines.
pub async fn add_order_line(
    state: &AppState,
    user: &AuthUser,
    payload: AddOrderLineRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(payload.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;
    if order.state != OrderState::Pending {
        return Err(AppError::BadRequest(format!(
            "lines can only be added to {} orders",
            OrderState::Pending
        )));
    }

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let unit_price = pricing::unit_price(&txn, &product, Utc::now()).await?;

    if order.stock_reserved {
        let reserved = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(payload.quantity))
            .filter(ProdCol::Id.eq(product.id))
            .filter(ProdCol::Stock.gte(payload.quantity))
            .exec(&txn)
            .await?;
        if reserved.rows_affected == 0 {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                product.id
            )));
        }
    }

    OrderLineActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        product_id: Set(product.id),
        quantity: Set(payload.quantity),
        unit_price: Set(unit_price),
        subtotal: Set(unit_price * payload.quantity as i64),
    }
    .insert(&txn)
    .await?;

    let lines = load_lines(&txn, order.id).await?;
    let total = lines.iter().map(|line| line.subtotal).sum();

    let mut active: OrderActive = order.into();
    active.total = Set(total);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Order line added",
        OrderWithLines {
            order: Order::from(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_order_lines(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Vec<OrderLine>>> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;

    let lines = load_lines(&state.orm, order.id).await?;
    Ok(ApiResponse::success("OK", lines, Some(Meta::empty())))
}

async fn find_orders(
    state: &AppState,
    owner: Option<Uuid>,
    query: OrderListQuery,
) -> AppResult<ApiResponse<Page<Order>>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(owner) = owner {
        condition = condition.add(OrderCol::UserId.eq(owner));
    }
    if let Some(order_state) = query.state {
        condition = condition.add(OrderCol::State.eq(order_state));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::paged("Ok", Page::new(orders, page, limit, total)))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<Page<Order>>> {
    find_orders(state, Some(user.user_id), query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<Page<Order>>> {
    ensure_admin(user)?;
    find_orders(state, None, query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;

    Ok(ApiResponse::success(
        "OK",
        with_lines(&state.orm, order).await?,
        Some(Meta::empty()),
    ))
}

pub async fn update_state(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStateRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let from = order.state;
    check_transition(from, payload.state)?;

    let mut active: OrderActive = order.into();
    active.state = Set(payload.state);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %id, %from, to = %payload.state, "order state changed");
    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Whether cancelling an order in `state` hands its reserved units back to stock.
fn releases_stock(state: OrderState, stock_reserved: bool) -> bool {
    stock_reserved && !state.is_terminal()
}

/// Sets CANCELADO whatever the current state is.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;
    let from = order.state;

    let release = releases_stock(from, order.stock_reserved);
    if release {
        for line in load_lines(&txn, order.id).await? {
            Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(line.quantity))
                .filter(ProdCol::Id.eq(line.product_id))
                .exec(&txn)
                .await?;
        }
    }

    let mut active: OrderActive = order.into();
    active.state = Set(OrderState::Cancelled);
    active.stock_reserved = Set(false);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %id, %from, released_stock = release, "order cancelled");
    Ok(ApiResponse::success(
        "Order cancelled",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct CheckoutRow {
    product_id: Uuid,
    quantity: i32,
    price: i64,
    stock: i32,
}

/// Turns the caller's pending cart into an order in a single transaction.
pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderWithLines>> {
    let txn = state.orm.begin().await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::State.eq(CartState::Pending))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let rows = CartLines::find()
        .select_only()
        .column(CartLineCol::ProductId)
        .column(CartLineCol::Quantity)
        .column_as(ProdCol::Price, "price")
        .column_as(ProdCol::Stock, "stock")
        .join(JoinType::InnerJoin, cart_lines::Relation::Products.def())
        .filter(CartLineCol::CartId.eq(cart.id))
        .lock(LockType::Update)
        .into_model::<CheckoutRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    for row in &rows {
        if row.stock < row.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                row.product_id
            )));
        }
    }

    let product_ids: Vec<Uuid> = rows.iter().map(|row| row.product_id).collect();
    let discounts = pricing::product_discounts(&txn, &product_ids).await?;
    let now = Utc::now();
    let priced: Vec<(&CheckoutRow, i64)> = rows
        .iter()
        .map(|row| {
            let unit_price = pricing::best_price(
                row.price,
                discounts.get(&row.product_id).into_iter().flatten(),
                now,
            );
            (row, unit_price)
        })
        .collect();
    let total: i64 = priced
        .iter()
        .map(|(row, unit_price)| unit_price * row.quantity as i64)
        .sum();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total: Set(total),
        state: Set(OrderState::Pending),
        stock_reserved: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines = Vec::with_capacity(priced.len());
    for (row, unit_price) in priced {
        let line = OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            quantity: Set(row.quantity),
            unit_price: Set(unit_price),
            subtotal: Set(unit_price * row.quantity as i64),
        }
        .insert(&txn)
        .await?;
        lines.push(OrderLine::from(line));

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(row.quantity))
            .filter(ProdCol::Id.eq(row.product_id))
            .exec(&txn)
            .await?;
    }

    CartLines::delete_many()
        .filter(CartLineCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    let mut cart: CartActive = cart.into();
    cart.state = Set(CartState::Confirmed);
    cart.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, total, "checkout completed");
    record_activity(
        &state.pool,
        user.user_id,
        ActivityType::OrderCreated,
        &format!("Pedido confirmado desde el carrito por {total}"),
        Some(order.id),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithLines {
            order: Order::from(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: Uuid::new_v4(),
            quantity,
        }
    }

    #[test]
    fn orders_need_at_least_one_positive_line() {
        assert!(matches!(validate_lines(&[]), Err(AppError::BadRequest(_))));
        assert!(matches!(
            validate_lines(&[line(2), line(0)]),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_lines(&[line(1), line(3)]).is_ok());
    }

    #[test]
    fn delivered_orders_cannot_go_back_to_pending() {
        let err = check_transition(OrderState::Delivered, OrderState::Pending).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, "ENTREGADO");
                assert_eq!(to, "PENDIENTE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn only_open_reserved_orders_release_stock_on_cancel() {
        assert!(releases_stock(OrderState::Pending, true));
        assert!(releases_stock(OrderState::Shipped, true));
        assert!(!releases_stock(OrderState::Delivered, true));
        assert!(!releases_stock(OrderState::Cancelled, true));
        assert!(!releases_stock(OrderState::Pending, false));
    }

    #[test]
    fn forward_transitions_are_accepted() {
        assert!(check_transition(OrderState::Pending, OrderState::Shipped).is_ok());
        assert!(check_transition(OrderState::Shipped, OrderState::Delivered).is_ok());
        assert!(check_transition(OrderState::Pending, OrderState::Cancelled).is_ok());
        assert!(check_transition(OrderState::Shipped, OrderState::Cancelled).is_err());
    }
}
