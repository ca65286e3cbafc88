use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Pagination query parameters shared by every list endpoint.
///
/// Parsing is lenient: values that are missing, non-numeric, or below 1
/// silently fall back to the defaults instead of rejecting the request.
/// Oversized `limit` values are clamped to [`MAX_PAGE_SIZE`] when read.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PageQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Items per page (default: 10, max: 100)
    #[serde(default = "default_limit", deserialize_with = "lenient_limit")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,
}

pub fn default_page() -> i64 {
    1
}

pub fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Raw query value before coercion. Query strings always arrive as text;
/// the numeric arms cover JSON bodies and literals in tests.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParam {
    Int(i64),
    Float(f64),
    Text(String),
}

fn coerce(raw: Option<RawParam>, fallback: i64) -> i64 {
    let parsed = match raw {
        Some(RawParam::Int(n)) => Some(n),
        Some(RawParam::Float(f)) if f.is_finite() => Some(f.trunc() as i64),
        Some(RawParam::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    parsed.filter(|n| *n >= 1).unwrap_or(fallback)
}

/// Deserializer for `page` fields in list query structs.
pub fn lenient_page<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce(Option::<RawParam>::deserialize(deserializer)?, default_page()))
}

/// Deserializer for `limit` fields in list query structs.
pub fn lenient_limit<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce(Option::<RawParam>::deserialize(deserializer)?, default_limit()))
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageQuery {
    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// Effective page size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Pagination metadata, computed from the filtered total. A `page` past the
/// last one is legitimate: it pairs with an empty `data` array, never an
/// error and never a clamp to the final page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    pub fn new(total: i64, query: &PageQuery) -> Self {
        let page = query.page.max(1);
        let limit = query.limit();
        let total_pages = (total as f64 / limit as f64).ceil() as i64;
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// The list envelope: `{ "data": [...], "meta": { ... } }`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, query: &PageQuery) -> Self {
        Self {
            data,
            meta: PageMeta::new(total, query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use axum_test::TestServer;
    use serde_json::json;

    fn from_json(value: serde_json::Value) -> PageQuery {
        serde_json::from_value(value).expect("PageQuery must never reject input")
    }

    #[test]
    fn test_defaults_when_missing() {
        let q = from_json(json!({}));
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
    }

    #[test]
    fn test_non_numeric_falls_back_to_defaults() {
        let q = from_json(json!({ "page": "abc", "limit": "xyz" }));
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
    }

    #[test]
    fn test_non_positive_falls_back_to_defaults() {
        let q = from_json(json!({ "page": "0", "limit": "-5" }));
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);

        let q = from_json(json!({ "page": -3, "limit": 0 }));
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
    }

    #[test]
    fn test_fractional_values_truncate() {
        let q = from_json(json!({ "page": "2.9", "limit": 3.7 }));
        assert_eq!(q.page, 2);
        assert_eq!(q.limit, 3);
    }

    #[test]
    fn test_oversized_limit_clamps_to_cap() {
        let q = from_json(json!({ "limit": "250" }));
        // The raw value survives deserialization; the accessor clamps.
        assert_eq!(q.limit(), 100);
        let meta = PageMeta::new(0, &q);
        assert_eq!(meta.limit, 100);
    }

    #[test]
    fn test_offset_formula() {
        let q = from_json(json!({ "page": 3, "limit": 20 }));
        assert_eq!(q.offset(), 40);
        assert_eq!(PageQuery::default().offset(), 0);
    }

    #[test]
    fn test_meta_ceil_and_flags() {
        // 12 items, 5 per page: pages 1..=3.
        let q = from_json(json!({ "page": 2, "limit": 5 }));
        let meta = PageMeta::new(12, &q);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_previous);
    }

    #[test]
    fn test_meta_beyond_last_page() {
        // Page 5 of 2 total pages: valid, empty, accurate flags.
        let q = from_json(json!({ "page": 5, "limit": 10 }));
        let meta = PageMeta::new(12, &q);
        assert_eq!(meta.page, 5);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
        assert!(meta.has_previous);
    }

    #[test]
    fn test_meta_empty_collection() {
        let meta = PageMeta::new(0, &PageQuery::default());
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_previous);
    }

    #[test]
    fn test_envelope_serialization_is_camel_case() {
        let body = serde_json::to_value(Paginated::new(
            vec![1, 2, 3],
            12,
            &from_json(json!({ "page": 2, "limit": 3 })),
        ))
        .unwrap();
        assert_eq!(body["data"], json!([1, 2, 3]));
        assert_eq!(body["meta"]["total"], 12);
        assert_eq!(body["meta"]["totalPages"], 4);
        assert_eq!(body["meta"]["hasNext"], true);
        assert_eq!(body["meta"]["hasPrevious"], true);
    }

    #[tokio::test]
    async fn test_query_extractor_is_lenient_over_http() {
        async fn show(Query(q): Query<PageQuery>) -> Json<serde_json::Value> {
            Json(json!({ "page": q.page, "limit": q.limit(), "offset": q.offset() }))
        }

        let server = TestServer::new(Router::new().route("/items", get(show))).unwrap();

        let res = server.get("/items").add_query_param("page", "abc").await;
        res.assert_status_ok();
        assert_eq!(res.json::<serde_json::Value>()["page"], 1);

        let res = server
            .get("/items")
            .add_query_param("page", "2")
            .add_query_param("limit", "999")
            .await;
        let body = res.json::<serde_json::Value>();
        assert_eq!(body["limit"], 100);
        assert_eq!(body["offset"], 100);
    }
}
