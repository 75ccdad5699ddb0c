use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Page and page size used when a listing request leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationDefaults {
    pub page: i64,
    pub page_size: i64,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

/// Raw `?page=&pageSize=` query pair.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Page {
    pub fn resolve(query: PageQuery, defaults: &PaginationDefaults) -> Result<Self, AppError> {
        let page = query.page.unwrap_or(defaults.page);
        let page_size = query.page_size.unwrap_or(defaults.page_size);
        compute_offset(page, page_size)?;

        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn summary(&self, count: i64) -> PaginationInfo {
        build_pagination_summary(self.page, self.page_size, count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub page_count: i64,
    pub count: i64,
}

/// Row offset of the requested page: `(page - 1) * pageSize`.
pub fn compute_offset(page: i64, page_size: i64) -> Result<i64, AppError> {
    if page < 1 {
        return Err(AppError::InvalidArgument {
            field: "page",
            value: page,
        });
    }
    if page_size < 1 {
        return Err(AppError::InvalidArgument {
            field: "pageSize",
            value: page_size,
        });
    }

    Ok((page - 1).saturating_mul(page_size))
}

/// `page_size` must be at least 1; callers go through [`Page::resolve`].
pub fn build_pagination_summary(page: i64, page_size: i64, count: i64) -> PaginationInfo {
    let count = count.max(0);
    let page_count = if count == 0 {
        0
    } else {
        (count + page_size - 1) / page_size
    };

    PaginationInfo {
        page,
        page_size,
        page_count,
        count,
    }
}

pub fn validate_email(email: &str) -> bool {
    // Simple email validation
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}
