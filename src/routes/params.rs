use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::reports::Granularity, entity::sea_orm_active_enums::OrderState};

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    #[serde(rename = "pagina", alias = "page")]
    pub page: Option<i64>,
    #[serde(rename = "tamanio", alias = "per_page")]
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

// Query strings are kept flat: serde_urlencoded cannot parse numbers through `#[serde(flatten)]`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    #[serde(rename = "pagina", alias = "page")]
    pub page: Option<i64>,
    #[serde(rename = "tamanio", alias = "per_page")]
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(rename = "pagina", alias = "page")]
    pub page: Option<i64>,
    #[serde(rename = "tamanio", alias = "per_page")]
    pub per_page: Option<i64>,
    pub state: Option<OrderState>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubCategoryQuery {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DiscountQuery {
    pub only_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLinesQuery {
    pub order_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SalesByPeriodQuery {
    pub granularity: Granularity,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SeasonalityQuery {
    pub year: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CostMarginQuery {
    pub product_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancellationQuery {
    pub months: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_to_first_page_of_twenty() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    }

    #[test]
    fn pagination_clamps_out_of_range_values() {
        assert_eq!(Pagination::new(Some(0), Some(1000)).normalize(), (1, 100, 0));
        assert_eq!(Pagination::new(Some(3), Some(10)).normalize(), (3, 10, 20));
    }

    #[test]
    fn pagination_reads_spanish_and_english_keys() {
        let spanish: Pagination = serde_json::from_str(r#"{"pagina": 2, "tamanio": 5}"#).unwrap();
        assert_eq!(spanish.normalize(), (2, 5, 5));
        let english: Pagination = serde_json::from_str(r#"{"page": 4, "per_page": 3}"#).unwrap();
        assert_eq!(english.normalize(), (4, 3, 9));
    }
}
