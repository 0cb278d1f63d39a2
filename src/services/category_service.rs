use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CreateCategoryRequest, CreateSubCategoryRequest, UpdateCategoryRequest},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
        subcategories::{
            ActiveModel as SubCategoryActive, Column as SubCategoryCol, Entity as SubCategories,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, SubCategory},
    response::{ApiResponse, Meta},
    routes::params::SubCategoryQuery,
    state::AppState,
};

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    Ok(name.to_string())
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(required_name(&payload.name)?),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Category created",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<Vec<Category>>> {
    let items = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::success("Categories", items, Some(Meta::empty())))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Category", Category::from(category), None))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: CategoryActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(required_name(&name)?);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    let category = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        Category::from(category),
        Some(Meta::empty()),
    ))
}

/// Refused while any product still points at the category.
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let in_use = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::BadRequest(format!(
            "category is used by {in_use} products"
        )));
    }

    let result = Categories::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|err| AppError::from_constraint(err, "category is used by products"))?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn create_subcategory(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSubCategoryRequest,
) -> AppResult<ApiResponse<SubCategory>> {
    ensure_admin(user)?;
    let name = required_name(&payload.name)?;
    if Categories::find_by_id(payload.category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let subcategory = SubCategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        category_id: Set(payload.category_id),
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Subcategory created",
        SubCategory::from(subcategory),
        Some(Meta::empty()),
    ))
}

pub async fn list_subcategories(
    state: &AppState,
    query: SubCategoryQuery,
) -> AppResult<ApiResponse<Vec<SubCategory>>> {
    let mut finder = SubCategories::find().order_by_asc(SubCategoryCol::Name);
    if let Some(category_id) = query.category_id {
        finder = finder.filter(SubCategoryCol::CategoryId.eq(category_id));
    }
    let items = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(SubCategory::from)
        .collect();
    Ok(ApiResponse::success("Subcategories", items, Some(Meta::empty())))
}
