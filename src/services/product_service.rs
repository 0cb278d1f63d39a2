use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    activity::record_activity,
    dto::catalog::{CreateProductRequest, UpdateProductRequest},
    entity::{
        categories::Entity as Categories,
        products::{ActiveModel, Column, Entity as Products},
        sea_orm_active_enums::ActivityType,
        subcategories::Entity as SubCategories,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta, Page},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub fn format_product_code(seq: i64) -> String {
    format!("PRD-{seq:06}")
}

fn validate_amounts(price: i64, stock: i32, purchase_cost: Option<i64>) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::BadRequest("price cannot be negative".into()));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }
    if purchase_cost.is_some_and(|cost| cost < 0) {
        return Err(AppError::BadRequest("purchase cost cannot be negative".into()));
    }
    Ok(())
}

/// The category must exist and the subcategory, if any, must hang from it.
async fn check_classification<C: ConnectionTrait>(
    conn: &C,
    category_id: Uuid,
    subcategory_id: Option<Uuid>,
) -> AppResult<()> {
    if Categories::find_by_id(category_id).one(conn).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if let Some(subcategory_id) = subcategory_id {
        let subcategory = SubCategories::find_by_id(subcategory_id)
            .one(conn)
            .await?
            .ok_or(AppError::NotFound)?;
        if subcategory.category_id != category_id {
            return Err(AppError::BadRequest(
                "subcategory does not belong to the category".into(),
            ));
        }
    }
    Ok(())
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<Page<Product>>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Code).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(subcategory_id) = query.subcategory_id {
        condition = condition.add(Column::SubcategoryId.eq(subcategory_id));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::paged("Products", Page::new(items, page, limit, total)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    validate_amounts(payload.price, payload.stock, payload.purchase_cost)?;
    check_classification(&state.orm, payload.category_id, payload.subcategory_id).await?;

    let (seq,): (i64,) = sqlx::query_as("SELECT nextval('product_code_seq')")
        .fetch_one(&state.pool)
        .await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(format_product_code(seq)),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        image_url: Set(payload.image_url),
        purchase_cost: Set(payload.purchase_cost),
        weight: Set(payload.weight),
        volume: Set(payload.volume),
        shipping_cost: Set(payload.shipping_cost),
        category_id: Set(payload.category_id),
        subcategory_id: Set(payload.subcategory_id),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    tracing::info!(product_id = %product.id, code = %product.code, "product created");
    record_activity(
        &state.pool,
        user.user_id,
        ActivityType::ProductCreated,
        &format!("Producto {} ({}) creado", product.name, product.code),
        Some(product.id),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    validate_amounts(
        payload.price.unwrap_or(existing.price),
        payload.stock.unwrap_or(existing.stock),
        payload.purchase_cost,
    )?;
    let category_id = payload.category_id.unwrap_or(existing.category_id);
    // Moving to another category drops a subcategory that no longer fits.
    let subcategory_id = match (payload.subcategory_id, payload.category_id) {
        (Some(subcategory_id), _) => Some(subcategory_id),
        (None, Some(new_category)) if new_category != existing.category_id => None,
        (None, _) => existing.subcategory_id,
    };
    if payload.category_id.is_some() || payload.subcategory_id.is_some() {
        check_classification(&state.orm, category_id, subcategory_id).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(purchase_cost) = payload.purchase_cost {
        active.purchase_cost = Set(Some(purchase_cost));
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(Some(weight));
    }
    if let Some(volume) = payload.volume {
        active.volume = Set(Some(volume));
    }
    if let Some(shipping_cost) = payload.shipping_cost {
        active.shipping_cost = Set(Some(shipping_cost));
    }
    active.category_id = Set(category_id);
    active.subcategory_id = Set(subcategory_id);

    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|err| AppError::from_constraint(err, "product is referenced by orders"))?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    tracing::info!(product_id = %id, "product deleted");
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_codes_are_zero_padded() {
        assert_eq!(format_product_code(1), "PRD-000001");
        assert_eq!(format_product_code(123456), "PRD-123456");
        assert_eq!(format_product_code(1234567), "PRD-1234567");
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_amounts(0, 0, None).is_ok());
        assert!(validate_amounts(-1, 0, None).is_err());
        assert!(validate_amounts(10, -1, None).is_err());
        assert!(validate_amounts(10, 1, Some(-5)).is_err());
    }
}
