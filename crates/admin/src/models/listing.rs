//! Pagination, search and sorting parameters for list endpoints.
//!
//! Sort keys are parsed into closed enums before they reach SQL, so a
//! `sortBy` value can never inject a column name.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query string shared by the paginated list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    /// Order status filter (orders only).
    pub status: Option<String>,
    /// Payment status filter (orders only).
    pub payment_status: Option<String>,
}

impl ListParams {
    #[must_use]
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }

    /// The trimmed search term, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn order_or(&self, default: SortOrder) -> SortOrder {
        self.order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or(default)
    }
}

/// A 1-based page of at most [`MAX_PAGE_SIZE`] rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub limit: i64,
}

impl Page {
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            number: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.number - 1) * self.limit
    }

    #[must_use]
    pub const fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

/// One page of results plus the total row count.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: Page,
}

impl<T> Paged<T> {
    #[must_use]
    pub const fn total_pages(&self) -> i64 {
        self.page.total_pages(self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sortable product columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    ProductId,
    Name,
    CreatedAt,
}

impl ProductSort {
    /// Parse a `sortBy` value; unknown keys fall back to the catalog id.
    #[must_use]
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("name") => Self::Name,
            Some("created_at" | "createdAt") => Self::CreatedAt,
            _ => Self::ProductId,
        }
    }

    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::ProductId => "product_id",
            Self::Name => "name",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Sortable order columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    CreatedAt,
    TotalAmount,
    OrderNumber,
}

impl OrderSort {
    /// Parse a `sortBy` value; unknown keys fall back to placement time.
    #[must_use]
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("total_amount" | "totalAmount") => Self::TotalAmount,
            Some("order_number" | "orderNumber" | "orderId") => Self::OrderNumber,
            _ => Self::CreatedAt,
        }
    }

    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "o.created_at",
            Self::TotalAmount => "o.total_amount",
            Self::OrderNumber => "o.order_number",
        }
    }
}
