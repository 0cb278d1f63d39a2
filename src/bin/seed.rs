use ecommerce_backend::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    middleware::auth::{ROLE_ADMIN, ROLE_CUSTOMER},
    services::{auth_service::hash_password, product_service::format_product_code},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&orm_from_pool(&pool)).await?;

    let admin_id = ensure_user(&pool, "Admin", "Tienda", "admin@example.com", "admin1234", ROLE_ADMIN).await?;
    let customer_id =
        ensure_user(&pool, "Ana", "Gomez", "ana@example.com", "cliente123", ROLE_CUSTOMER).await?;

    let electronics = ensure_category(&pool, "Electronica", "Computadoras y accesorios").await?;
    let laptops = ensure_subcategory(&pool, "Notebooks", electronics).await?;
    let home = ensure_category(&pool, "Hogar", "Articulos para el hogar").await?;

    seed_products(&pool, electronics, Some(laptops), home).await?;
    seed_reference_data(&pool).await?;

    tracing::info!(%admin_id, %customer_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, first_name, last_name, email, password_hash, role_id)
        SELECT $1, $2, $3, $4, $5, r.id FROM roles r WHERE r.name = $6
        ON CONFLICT (email) DO UPDATE SET role_id = EXCLUDED.role_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    tracing::info!(%email, %role, "ensured user");
    Ok(user_id)
}

async fn ensure_category(pool: &sqlx::PgPool, name: &str, description: &str) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn ensure_subcategory(pool: &sqlx::PgPool, name: &str, category_id: Uuid) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM subcategories WHERE name = $1 AND category_id = $2")
            .bind(name)
            .bind(category_id)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO subcategories (id, name, category_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(category_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_products(
    pool: &sqlx::PgPool,
    electronics: Uuid,
    laptops: Option<Uuid>,
    home: Uuid,
) -> anyhow::Result<()> {
    let products = vec![
        ("Laptop", "Notebook 14 pulgadas", 1000_i64, 700_i64, 25, electronics, laptops),
        ("Mouse inalambrico", "Mouse optico 2.4GHz", 150, 90, 120, electronics, None),
        ("Teclado mecanico", "Switches rojos", 400, 260, 60, electronics, None),
        ("Lampara de escritorio", "LED regulable", 220, 130, 40, home, None),
    ];

    for (name, description, price, cost, stock, category_id, subcategory_id) in products {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        let (seq,): (i64,) = sqlx::query_as("SELECT nextval('product_code_seq')")
            .fetch_one(pool)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO products
                (id, code, name, description, price, purchase_cost, stock, category_id, subcategory_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(format_product_code(seq))
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(cost)
        .bind(stock)
        .bind(category_id)
        .bind(subcategory_id)
        .execute(pool)
        .await?;
    }

    tracing::info!("seeded products");
    Ok(())
}

async fn seed_reference_data(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (kind, name) in [
        ("TARJETA", "Tarjeta de credito"),
        ("TRANSFERENCIA", "Transferencia bancaria"),
        ("EFECTIVO", "Efectivo"),
    ] {
        sqlx::query(
            r#"
            INSERT INTO payment_methods (id, kind, name)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM payment_methods WHERE name = $3)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(kind)
        .bind(name)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO shipping_companies (id, name, address, phone)
        SELECT $1, $2, $3, $4
        WHERE NOT EXISTS (SELECT 1 FROM shipping_companies WHERE name = $2)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Correo Central")
    .bind("Av. Siempre Viva 742")
    .bind("+54 11 5555-0000")
    .execute(pool)
    .await?;

    tracing::info!("seeded payment methods and shipping companies");
    Ok(())
}
