//! Shared query parameter types for API handlers.

use contentflow_core::content::{non_empty, ContentStatus};
use contentflow_core::error::CoreError;
use contentflow_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use contentflow_db::models::content::ContentFilter;
use serde::Deserialize;

/// Query parameters for `GET /content`.
///
/// `tags` is a comma-separated list; content carrying any of them matches.
#[derive(Debug, Default, Deserialize)]
pub struct ContentListParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub status: Option<String>,
    pub lang: Option<String>,
    pub tags: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ContentListParams {
    /// Resolve into a store filter, clamping pagination and normalising the
    /// status filter.
    pub fn into_filter(self) -> Result<ContentFilter, CoreError> {
        let status = non_empty(self.status.as_deref())
            .map(ContentStatus::parse)
            .transpose()?
            .map(|s| s.as_str().to_string());

        let tags = self
            .tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ContentFilter {
            search: owned_non_empty(self.q),
            content_type: owned_non_empty(self.content_type),
            status,
            language: owned_non_empty(self.lang),
            tags,
            limit: clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
            offset: clamp_offset(self.offset),
        })
    }
}

fn owned_non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
