use ecommerce_backend::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        auth::RegisterRequest,
        cart::AddToCartRequest,
        catalog::{CreateCategoryRequest, CreateProductRequest},
        orders::UpdateOrderStateRequest,
    },
    entity::sea_orm_active_enums::OrderState,
    error::AppError,
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_CUSTOMER},
    routes::params::CostMarginQuery,
    services::{
        auth_service, cart_service, category_service, order_service, product_service,
        report_service,
    },
    state::AppState,
};
use uuid::Uuid;

// Flows below need a live Postgres; they are skipped when no URL is configured.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run store flows.");
            return Ok(None);
        }
    };

    let config = AppConfig {
        database_url: database_url.clone(),
        host: "127.0.0.1".into(),
        port: 0,
        db_max_connections: 5,
        jwt_secret: "test-secret".into(),
        jwt_ttl_minutes: 30,
        cors_origins: vec![],
        report_utc_offset_hours: -3,
    };
    let pool = create_pool(&database_url, config.db_max_connections).await?;
    let state = AppState::new(pool, config);

    // Test binaries run flows concurrently; serialize the migrator across them.
    let mut lock = state.pool.acquire().await?;
    sqlx::query("SELECT pg_advisory_lock(7420001)")
        .execute(&mut *lock)
        .await?;
    let migrated = run_migrations(&state.orm).await;
    sqlx::query("SELECT pg_advisory_unlock(7420001)")
        .execute(&mut *lock)
        .await?;
    migrated?;
    Ok(Some(state))
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

async fn register(state: &AppState, first_name: &str, email: &str) -> anyhow::Result<Uuid> {
    let response = auth_service::register_user(
        state,
        RegisterRequest {
            first_name: first_name.into(),
            last_name: "Tester".into(),
            email: email.into(),
            password: "password123".into(),
            phone: None,
        },
    )
    .await?;
    Ok(response.data.expect("registered user").id)
}

async fn customer(state: &AppState, first_name: &str) -> anyhow::Result<AuthUser> {
    let user_id = register(state, first_name, &unique_email(first_name)).await?;
    Ok(AuthUser {
        user_id,
        role: ROLE_CUSTOMER.into(),
    })
}

async fn admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user_id = register(state, "Admin", &unique_email("admin")).await?;
    Ok(AuthUser {
        user_id,
        role: ROLE_ADMIN.into(),
    })
}

async fn product(
    state: &AppState,
    admin: &AuthUser,
    price: i64,
    purchase_cost: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let category = category_service::create_category(
        state,
        admin,
        CreateCategoryRequest {
            name: "Electronics".into(),
            description: None,
            image_url: None,
        },
    )
    .await?
    .data
    .expect("category");

    let product = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: "Laptop".into(),
            description: Some("14 inch".into()),
            price,
            stock,
            image_url: None,
            purchase_cost: Some(purchase_cost),
            weight: None,
            volume: None,
            shipping_cost: None,
            category_id: category.id,
            subcategory_id: None,
        },
    )
    .await?
    .data
    .expect("product");
    assert!(product.code.starts_with("PRD-"));
    Ok(product.id)
}

async fn add(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(state, user, AddToCartRequest { product_id, quantity }).await?;
    Ok(())
}

async fn move_order(
    state: &AppState,
    admin: &AuthUser,
    order_id: Uuid,
    next: OrderState,
) -> Result<(), AppError> {
    order_service::update_state(state, admin, order_id, UpdateOrderStateRequest { state: next })
        .await
        .map(|_| ())
}

async fn cart_count(state: &AppState, user_id: Uuid, cart_state: &str) -> anyhow::Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM carts WHERE user_id = $1 AND state = $2")
            .bind(user_id)
            .bind(cart_state)
            .fetch_one(&state.pool)
            .await?;
    Ok(count)
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let email = unique_email("dup");
    register(&state, "First", &email).await?;
    let err = register(&state, "Second", &email.to_uppercase())
        .await
        .expect_err("duplicate email must fail");
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::EmailAlreadyRegistered)
    ));
    Ok(())
}

#[tokio::test]
async fn adding_same_product_twice_merges_into_one_line() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let user = customer(&state, "merge").await?;
    let product_id = product(&state, &admin, 250, 100, 10).await?;

    add(&state, &user, product_id, 1).await?;
    add(&state, &user, product_id, 2).await?;

    let view = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(view.lines.len(), 1);
    assert_eq!(view.lines[0].quantity, 3);
    assert_eq!(view.lines[0].subtotal, 750);
    assert_eq!(view.total, 750);
    assert_eq!(cart_count(&state, user.user_id, "PENDIENTE").await?, 1);
    Ok(())
}

#[tokio::test]
async fn checkout_moves_cart_into_order_and_reserves_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let user = customer(&state, "checkout").await?;
    let product_id = product(&state, &admin, 1000, 700, 5).await?;

    add(&state, &user, product_id, 2).await?;
    let placed = order_service::checkout(&state, &user).await?.data.expect("order");
    assert_eq!(placed.order.total, 2000);
    assert_eq!(placed.order.state, OrderState::Pending);
    assert_eq!(placed.lines.len(), 1);

    let stock = product_service::get_product(&state, product_id)
        .await?
        .data
        .expect("product")
        .stock;
    assert_eq!(stock, 3);

    assert_eq!(cart_count(&state, user.user_id, "CONFIRMADO").await?, 1);
    let fresh = cart_service::view_cart(&state, &user).await?.data.expect("cart");
    assert!(fresh.lines.is_empty());
    assert_eq!(fresh.total, 0);

    let again = order_service::checkout(&state, &user).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn checkout_rejects_quantities_above_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let user = customer(&state, "short").await?;
    let product_id = product(&state, &admin, 100, 50, 1).await?;

    add(&state, &user, product_id, 4).await?;
    let result = order_service::checkout(&state, &user).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let stock = product_service::get_product(&state, product_id)
        .await?
        .data
        .expect("product")
        .stock;
    assert_eq!(stock, 1);
    Ok(())
}

#[tokio::test]
async fn order_lifecycle_enforces_transitions() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let user = customer(&state, "lifecycle").await?;
    let product_id = product(&state, &admin, 300, 200, 10).await?;

    add(&state, &user, product_id, 1).await?;
    let delivered = order_service::checkout(&state, &user).await?.data.expect("order");
    move_order(&state, &admin, delivered.order.id, OrderState::Shipped).await?;
    move_order(&state, &admin, delivered.order.id, OrderState::Delivered).await?;

    let err = move_order(&state, &admin, delivered.order.id, OrderState::Pending)
        .await
        .expect_err("delivered orders are final");
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let forbidden = move_order(&state, &user, delivered.order.id, OrderState::Cancelled).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    add(&state, &user, product_id, 1).await?;
    let shipped = order_service::checkout(&state, &user).await?.data.expect("order");
    move_order(&state, &admin, shipped.order.id, OrderState::Shipped).await?;
    let cancelled = order_service::cancel_order(&state, &user, shipped.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.state, OrderState::Cancelled);
    Ok(())
}

#[tokio::test]
async fn cost_margin_reflects_delivered_sales() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let ana = customer(&state, "ana").await?;
    let product_id = product(&state, &admin, 1000, 700, 10).await?;

    add(&state, &ana, product_id, 2).await?;
    let order = order_service::checkout(&state, &ana).await?.data.expect("order");
    move_order(&state, &admin, order.order.id, OrderState::Shipped).await?;
    move_order(&state, &admin, order.order.id, OrderState::Delivered).await?;

    let rows = report_service::cost_margin(
        &state,
        &admin,
        CostMarginQuery {
            product_id: Some(product_id),
            category_id: None,
        },
    )
    .await?
    .data
    .expect("report");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].units_sold, 2);
    assert_eq!(rows[0].cost_total, 1400);
    assert_eq!(rows[0].profit_total, 600);
    assert!((rows[0].margin_pct - 30.0).abs() < f64::EPSILON);

    let missing = report_service::cost_margin(
        &state,
        &admin,
        CostMarginQuery {
            product_id: Some(Uuid::new_v4()),
            category_id: None,
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    Ok(())
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    Ok(product_service::get_product(state, product_id)
        .await?
        .data
        .expect("product")
        .stock)
}

#[tokio::test]
async fn cart_line_edits_report_missing_lines() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let user = customer(&state, "edits").await?;
    let in_cart = product(&state, &admin, 100, 60, 10).await?;
    let not_in_cart = product(&state, &admin, 40, 20, 10).await?;

    add(&state, &user, in_cart, 1).await?;
    let cart = cart_service::get_or_create_active_cart(&state, user.user_id).await?;

    let line = cart_service::update_quantity(&state, cart.id, in_cart, 5).await?;
    assert_eq!(line.quantity, 5);
    assert_eq!(line.subtotal, 500);

    let missing = cart_service::update_quantity(&state, cart.id, not_in_cart, 2).await;
    assert!(matches!(missing, Err(AppError::NotFound)));
    let missing = cart_service::remove_line(&state, cart.id, not_in_cart).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    assert_eq!(cart_service::clear_cart(&state, cart.id).await?, 1);
    assert_eq!(cart_service::clear_cart(&state, cart.id).await?, 0);
    assert!(cart_service::cart_lines(&state, cart.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn cart_writes_waiting_on_checkout_do_not_land_in_confirmed_cart() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let user = customer(&state, "race").await?;
    let first = product(&state, &admin, 100, 60, 10).await?;
    let second = product(&state, &admin, 200, 90, 10).await?;

    add(&state, &user, first, 1).await?;
    let cart = cart_service::get_or_create_active_cart(&state, user.user_id).await?;

    // Hold the cart the way checkout does while the writer is in flight.
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;

    let writer = tokio::spawn({
        let state = state.clone();
        let cart_id = cart.id;
        async move { cart_service::add_line(&state, cart_id, second, 3).await }
    });
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE carts SET state = 'CONFIRMADO' WHERE id = $1")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let result = writer.await?;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(cart_service::cart_lines(&state, cart.id).await?.is_empty());

    let late_update = cart_service::update_quantity(&state, cart.id, first, 2).await;
    assert!(matches!(late_update, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn cancelling_gives_back_stock_only_for_open_orders() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = admin(&state).await?;
    let user = customer(&state, "cancel").await?;
    let product_id = product(&state, &admin, 500, 300, 5).await?;

    add(&state, &user, product_id, 2).await?;
    let open = order_service::checkout(&state, &user).await?.data.expect("order");
    assert_eq!(stock_of(&state, product_id).await?, 3);

    let cancelled = order_service::cancel_order(&state, &user, open.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.state, OrderState::Cancelled);
    assert_eq!(stock_of(&state, product_id).await?, 5);

    // Cancelling twice must not release the units again.
    order_service::cancel_order(&state, &user, open.order.id).await?;
    assert_eq!(stock_of(&state, product_id).await?, 5);

    add(&state, &user, product_id, 1).await?;
    let delivered = order_service::checkout(&state, &user).await?.data.expect("order");
    move_order(&state, &admin, delivered.order.id, OrderState::Shipped).await?;
    move_order(&state, &admin, delivered.order.id, OrderState::Delivered).await?;
    assert_eq!(stock_of(&state, product_id).await?, 4);

    let forced = order_service::cancel_order(&state, &admin, delivered.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(forced.state, OrderState::Cancelled);
    assert_eq!(stock_of(&state, product_id).await?, 4);
    Ok(())
}
