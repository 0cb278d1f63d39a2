use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::sea_orm_active_enums::DiscountKind;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubCategoryRequest {
    pub name: String,
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub image_url: Option<String>,
    pub purchase_cost: Option<i64>,
    pub weight: Option<f64>,
    pub volume: Option<f64>,
    pub shipping_cost: Option<i64>,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub purchase_cost: Option<i64>,
    pub weight: Option<f64>,
    pub volume: Option<f64>,
    pub shipping_cost: Option<i64>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDiscountRequest {
    pub name: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    pub value: f64,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub conditions: Option<String>,
    pub product_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDiscountRequest {
    pub active: bool,
}
