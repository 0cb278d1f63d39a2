use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum CartState {
    #[sea_orm(string_value = "PENDIENTE")]
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[sea_orm(string_value = "CONFIRMADO")]
    #[serde(rename = "CONFIRMADO")]
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrderState {
    #[sea_orm(string_value = "PENDIENTE")]
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[sea_orm(string_value = "ENVIADO")]
    #[serde(rename = "ENVIADO")]
    Shipped,
    #[sea_orm(string_value = "ENTREGADO")]
    #[serde(rename = "ENTREGADO")]
    Delivered,
    #[sea_orm(string_value = "CANCELADO")]
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl OrderState {
    /// Allowed moves: PENDIENTE -> ENVIADO | CANCELADO, ENVIADO -> ENTREGADO.
    pub fn can_transition_to(self, next: OrderState) -> bool {
        matches!(
            (self, next),
            (OrderState::Pending, OrderState::Shipped)
                | (OrderState::Pending, OrderState::Cancelled)
                | (OrderState::Shipped, OrderState::Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderState::Delivered | OrderState::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ShipmentState {
    #[sea_orm(string_value = "PREPARADO")]
    #[serde(rename = "PREPARADO")]
    Prepared,
    #[sea_orm(string_value = "EN_CAMINO")]
    #[serde(rename = "EN_CAMINO")]
    InTransit,
    #[sea_orm(string_value = "ENTREGADO")]
    #[serde(rename = "ENTREGADO")]
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentState {
    #[sea_orm(string_value = "PENDIENTE")]
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[sea_orm(string_value = "APROBADO")]
    #[serde(rename = "APROBADO")]
    Approved,
    #[sea_orm(string_value = "RECHAZADO")]
    #[serde(rename = "RECHAZADO")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PaymentMethodKind {
    #[sea_orm(string_value = "TARJETA")]
    #[serde(rename = "TARJETA")]
    Card,
    #[sea_orm(string_value = "TRANSFERENCIA")]
    #[serde(rename = "TRANSFERENCIA")]
    Transfer,
    #[sea_orm(string_value = "EFECTIVO")]
    #[serde(rename = "EFECTIVO")]
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum DiscountKind {
    #[sea_orm(string_value = "PORCENTAJE")]
    #[serde(rename = "PORCENTAJE")]
    Percentage,
    #[sea_orm(string_value = "MONTO_FIJO")]
    #[serde(rename = "MONTO_FIJO")]
    FixedAmount,
    #[sea_orm(string_value = "CUOTAS_SIN_INTERES")]
    #[serde(rename = "CUOTAS_SIN_INTERES")]
    InterestFreeInstallments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ActivityType {
    #[sea_orm(string_value = "CREACION_USUARIO")]
    #[serde(rename = "CREACION_USUARIO")]
    UserCreated,
    #[sea_orm(string_value = "CREACION_PRODUCTO")]
    #[serde(rename = "CREACION_PRODUCTO")]
    ProductCreated,
    #[sea_orm(string_value = "CREACION_ENVIO")]
    #[serde(rename = "CREACION_ENVIO")]
    ShipmentCreated,
    #[sea_orm(string_value = "CREACION_PAGO")]
    #[serde(rename = "CREACION_PAGO")]
    PaymentCreated,
    #[sea_orm(string_value = "CREACION_PEDIDO")]
    #[serde(rename = "CREACION_PEDIDO")]
    OrderCreated,
}

macro_rules! display_as_db_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.to_value())
                }
            }
        )+
    };
}

display_as_db_value!(
    CartState,
    OrderState,
    ShipmentState,
    PaymentState,
    PaymentMethodKind,
    DiscountKind,
    ActivityType,
);

#[cfg(test)]
mod tests {
    use sea_orm::Iterable;

    use super::*;

    #[test]
    fn pending_order_can_ship_or_cancel() {
        assert!(OrderState::Pending.can_transition_to(OrderState::Shipped));
        assert!(OrderState::Pending.can_transition_to(OrderState::Cancelled));
        assert!(!OrderState::Pending.can_transition_to(OrderState::Delivered));
    }

    #[test]
    fn shipped_order_can_only_be_delivered() {
        assert!(OrderState::Shipped.can_transition_to(OrderState::Delivered));
        assert!(!OrderState::Shipped.can_transition_to(OrderState::Cancelled));
        assert!(!OrderState::Shipped.can_transition_to(OrderState::Pending));
    }

    #[test]
    fn terminal_states_reject_every_move() {
        for from in [OrderState::Delivered, OrderState::Cancelled] {
            assert!(from.is_terminal());
            for to in OrderState::iter() {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn states_render_with_wire_names() {
        assert_eq!(OrderState::Cancelled.to_string(), "CANCELADO");
        assert_eq!(CartState::Pending.to_value(), "PENDIENTE");
        assert_eq!(
            serde_json::to_string(&DiscountKind::FixedAmount).unwrap(),
            "\"MONTO_FIJO\""
        );
    }
}
