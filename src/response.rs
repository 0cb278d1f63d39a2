use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    #[serde(rename = "pagina")]
    pub page: Option<i64>,
    #[serde(rename = "tamanio")]
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

impl<T: Serialize> ApiResponse<Page<T>> {
    pub fn paged(message: impl Into<String>, page: Page<T>) -> Self {
        let meta = page.meta();
        Self::success(message, page, Some(meta))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub total: i64,
    #[serde(rename = "pagina")]
    pub page: i64,
    #[serde(rename = "tamanio")]
    pub per_page: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        Self {
            total,
            page,
            per_page,
            items,
        }
    }

    pub fn meta(&self) -> Meta {
        Meta::new(self.page, self.per_page, self.total)
    }
}
