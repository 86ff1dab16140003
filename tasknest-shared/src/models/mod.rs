/// Database models for TaskNest
///
/// Each model owns its CRUD operations. Every query made on behalf of a
/// user filters by that user's id; the only global model is `user`
/// (accounts are managed by admins, not owned by anyone).
///
/// # Models
///
/// - `user`: Accounts, credentials, and roles
/// - `category`: Per-user task categories
/// - `tag`: Per-user task labels, many-to-many with tasks
/// - `task`: Tasks with status, priority, due dates, and tag associations

pub mod category;
pub mod tag;
pub mod task;
pub mod user;

use std::str::FromStr;

/// Sort direction for list and search queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses leniently: anything that is not "desc" sorts ascending.
    ///
    /// Used by the plain list operations, which tolerate bad input the
    /// same way they tolerate unknown sort fields.
    pub fn from_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    /// Strict parse used by task search, where a bad direction is a
    /// validation error rather than a silent default.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("sort_order must be 'asc' or 'desc', got '{}'", other)),
        }
    }
}

/// Computes the OFFSET for one-based page numbers
pub(crate) fn page_offset(page: i64, per_page: i64) -> i64 {
    (page - 1) * per_page
}
