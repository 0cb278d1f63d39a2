use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    activities, cart_lines, carts, categories, discounts, order_lines, orders, payment_methods,
    payments, products, roles, sea_orm_active_enums::*, shipments, shipping_companies,
    subcategories, users,
};

/// Public view of a user; the password hash never leaves the service layer.
#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubCategory {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
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
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Discount {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub kind: DiscountKind,
    pub value: f64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub conditions: Option<String>,
    pub active: bool,
    pub product_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub kind: PaymentMethodKind,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShippingCompany {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: CartState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total: i64,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Shipment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub address: String,
    pub company_id: Uuid,
    pub tracking_code: String,
    pub state: ShipmentState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: i64,
    pub state: PaymentState,
    pub payment_method_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    pub event_type: ActivityType,
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone: model.phone,
            role_id: model.role_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<roles::Model> for Role {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            image_url: model.image_url,
        }
    }
}

impl From<subcategories::Model> for SubCategory {
    fn from(model: subcategories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category_id: model.category_id,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            description: model.description,
            price: model.price,
            stock: model.stock,
            image_url: model.image_url,
            purchase_cost: model.purchase_cost,
            weight: model.weight,
            volume: model.volume,
            shipping_cost: model.shipping_cost,
            category_id: model.category_id,
            subcategory_id: model.subcategory_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<discounts::Model> for Discount {
    fn from(model: discounts::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            kind: model.kind,
            value: model.value,
            starts_at: model.starts_at.with_timezone(&Utc),
            ends_at: model.ends_at.map(|dt| dt.with_timezone(&Utc)),
            conditions: model.conditions,
            active: model.active,
            product_id: model.product_id,
            payment_method_id: model.payment_method_id,
        }
    }
}

impl From<payment_methods::Model> for PaymentMethod {
    fn from(model: payment_methods::Model) -> Self {
        Self {
            id: model.id,
            kind: model.kind,
            name: model.name,
            image_url: model.image_url,
        }
    }
}

impl From<shipping_companies::Model> for ShippingCompany {
    fn from(model: shipping_companies::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            phone: model.phone,
            image_url: model.image_url,
        }
    }
}

impl From<carts::Model> for Cart {
    fn from(model: carts::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            state: model.state,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<cart_lines::Model> for CartLine {
    fn from(model: cart_lines::Model) -> Self {
        Self {
            id: model.id,
            cart_id: model.cart_id,
            product_id: model.product_id,
            quantity: model.quantity,
            subtotal: model.subtotal,
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            total: model.total,
            state: model.state,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_lines::Model> for OrderLine {
    fn from(model: order_lines::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
            subtotal: model.subtotal,
        }
    }
}

impl From<shipments::Model> for Shipment {
    fn from(model: shipments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            address: model.address,
            company_id: model.company_id,
            tracking_code: model.tracking_code,
            state: model.state,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            amount: model.amount,
            state: model.state,
            payment_method_id: model.payment_method_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<activities::Model> for Activity {
    fn from(model: activities::Model) -> Self {
        Self {
            id: model.id,
            event_type: model.event_type,
            description: model.description,
            reference_id: model.reference_id,
            user_id: model.user_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
