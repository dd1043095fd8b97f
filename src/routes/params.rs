use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    entity::status::parse_active_enum,
    error::{AppError, AppResult},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
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

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AdminOrderQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    /// Matches order id or product name.
    pub q: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RequestListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub request_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ShippingListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub shipping_status: Option<String>,
}

// Query strings cannot carry integers through `#[serde(flatten)]`, so list
// queries repeat the page fields and hand them over here.
macro_rules! impl_paged {
    ($($query:ty),+) => {
        $(impl $query {
            pub fn pagination(&self) -> Pagination {
                Pagination {
                    page: self.page,
                    per_page: self.per_page,
                }
            }
        })+
    };
}

impl_paged!(OrderListQuery, AdminOrderQuery, RequestListQuery, ShippingListQuery);

/// Parse an optional enum filter; blank means "no filter".
pub fn parse_filter<E>(field: &str, raw: Option<&String>) -> AppResult<Option<E>>
where
    E: sea_orm::ActiveEnum<Value = String>,
{
    match raw.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => parse_active_enum::<E>(&value.to_uppercase())
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("invalid {field} filter: {value}"))),
    }
}
