use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::sea_orm_active_enums::{OrderState, PaymentState, ShipmentState},
    models::{Order, OrderLine},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Defaults to the caller; only administrators may create orders for someone else.
    pub user_id: Option<Uuid>,
    pub lines: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddOrderLineRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStateRequest {
    pub state: OrderState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShipmentRequest {
    pub order_id: Uuid,
    pub address: String,
    pub company_id: Uuid,
    pub tracking_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShipmentStateRequest {
    pub state: ShipmentState,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    pub payment_method_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePaymentStateRequest {
    pub state: PaymentState,
}
