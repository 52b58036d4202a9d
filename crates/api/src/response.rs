//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "meta": {...} }` envelope for paginated lists.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination details echoed back with a page.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    /// Number of matching items before pagination.
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
