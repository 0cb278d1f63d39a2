use serde::Deserialize;
use utoipa::ToSchema;

use crate::entity::sea_orm_active_enums::PaymentMethodKind;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentMethodRequest {
    pub kind: PaymentMethodKind,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateShippingCompanyRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub image_url: Option<String>,
}
