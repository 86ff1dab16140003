/// API route handlers, organized by resource
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `users`: Own profile plus admin account management
/// - `categories`: Category CRUD and statistics
/// - `tags`: Tag CRUD and statistics
/// - `tasks`: Task CRUD, search, statistics, and tag associations
///
/// Every success response uses the `{"status": "success", "data": ...}`
/// envelope; list endpoints add pagination fields alongside it.

pub mod auth;
pub mod categories;
pub mod health;
pub mod tags;
pub mod tasks;
pub mod users;

use serde::{Deserialize, Serialize};

/// Deserializer for patch fields on nullable columns: an absent field
/// stays `None` via `#[serde(default)]`, an explicit null becomes
/// `Some(None)` and clears the column.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Envelope for single-object responses
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            data,
            message: Some(message.into()),
        }
    }
}

/// Envelope for paginated list responses
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub status: String,
    pub data: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        // Ceiling division; an empty result set reports zero pages
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            status: "success".to_string(),
            data,
            page,
            per_page,
            total,
            pages,
        }
    }
}

/// Pagination and sorting query parameters shared by list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to 1..=100
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(20).clamp(1, 100)
    }

    pub fn sort_by(&self, default: &str) -> String {
        self.sort_by.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn sort_order_lenient(
        &self,
        default: tasknest_shared::models::SortOrder,
    ) -> tasknest_shared::models::SortOrder {
        match &self.sort_order {
            Some(raw) => tasknest_shared::models::SortOrder::from_lenient(raw),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_page_count() {
        let resp = ListResponse::new(vec![1, 2, 3], 1, 20, 3);
        assert_eq!(resp.pages, 1);

        let resp = ListResponse::new(vec![0; 20], 1, 20, 41);
        assert_eq!(resp.pages, 3);

        let resp: ListResponse<i32> = ListResponse::new(vec![], 1, 20, 0);
        assert_eq!(resp.pages, 0);
    }

    #[test]
    fn test_page_params_clamping() {
        let params = PageParams {
            page: Some(0),
            per_page: Some(500),
            sort_by: None,
            sort_order: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 100);

        let params = PageParams {
            page: None,
            per_page: None,
            sort_by: None,
            sort_order: None,
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 20);
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], 42);
        assert!(json.get("message").is_none());

        let json = serde_json::to_value(ApiResponse::with_message(1, "Created")).unwrap();
        assert_eq!(json["message"], "Created");
    }
}
