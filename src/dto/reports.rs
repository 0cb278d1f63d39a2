use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub enum Granularity {
    #[serde(rename = "diario")]
    Daily,
    #[serde(rename = "semanal")]
    Weekly,
    #[serde(rename = "mensual")]
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalesBucket {
    pub period: String,
    pub total_sales: i64,
    pub order_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductSeasonality {
    pub product_id: Uuid,
    pub product_name: String,
    /// Units sold keyed by month number (1-12); every month is present.
    pub sales_by_month: BTreeMap<u32, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CostMarginRow {
    pub product_id: Uuid,
    pub name: String,
    pub units_sold: i64,
    pub cost_total: i64,
    pub profit_total: i64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyCancellation {
    /// `YYYY-MM`
    pub month: String,
    pub total_orders: i64,
    pub cancelled_orders: i64,
    pub cancelled_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CancellationMetrics {
    pub total_orders: i64,
    pub cancelled_orders: i64,
    pub cancelled_pct: f64,
    pub history: Vec<MonthlyCancellation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActiveUser {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub order_count: i64,
}
