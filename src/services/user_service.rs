use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::users::{ChangePasswordRequest, ChangeRoleRequest, UpdateProfileRequest},
    entity::{
        roles::{Column as RoleCol, Entity as Roles},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Role, User},
    response::{ApiResponse, Meta, Page},
    routes::params::Pagination,
    services::auth_service::{hash_password, validate_password, verify_password},
    state::AppState,
};

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", User::from(model), Some(Meta::empty())))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(first_name) = payload.first_name.filter(|s| !s.trim().is_empty()) {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = payload.last_name.filter(|s| !s.trim().is_empty()) {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    validate_password(&payload.new_password)?;
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !verify_password(&payload.current_password, &existing.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let mut active: UserActive = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.update(&state.orm).await?;

    tracing::info!(user_id = %user.user_id, "password changed");
    Ok(ApiResponse::success(
        "Password updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn change_role(
    state: &AppState,
    user: &AuthUser,
    target_id: Uuid,
    payload: ChangeRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let role = Roles::find()
        .filter(RoleCol::Name.eq(payload.role.trim()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let existing = Users::find_by_id(target_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    active.role_id = Set(role.id);
    let updated = active.update(&state.orm).await?;

    tracing::info!(user_id = %target_id, role = %role.name, "role changed");
    Ok(ApiResponse::success(
        "Role updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<Page<User>>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::paged("Users", Page::new(items, page, limit, total)))
}

pub async fn list_roles(state: &AppState) -> AppResult<ApiResponse<Vec<Role>>> {
    let roles = Roles::find()
        .order_by_asc(RoleCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Role::from)
        .collect();
    Ok(ApiResponse::success("Roles", roles, Some(Meta::empty())))
}
