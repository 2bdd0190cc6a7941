//! List query parameters and paginated responses

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Default page size
pub const DEFAULT_LIMIT: u32 = 10;
/// Largest page size a client may ask for
pub const MAX_LIMIT: u32 = 100;

/// Query string accepted by every list endpoint
///
/// Unknown filters are ignored by endpoints that do not support them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// 1-based page number
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Case-insensitive substring match on title/name
    pub search: Option<String>,
    /// Only featured records
    pub featured: Option<bool>,
    /// Category filter
    pub category: Option<String>,
    /// Tag filter (articles)
    pub tag: Option<String>,
    /// Status filter
    pub status: Option<String>,
    /// Device type filter (pilots)
    pub device_type: Option<String>,
    /// Country filter (pilots)
    pub country: Option<String>,
    /// Role filter (users)
    pub role: Option<String>,
}

impl ListParams {
    /// Validated `(page, limit)`
    pub fn page_window(&self) -> Result<(u32, u32)> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        if page == 0 {
            return Err(Error::invalid_input("page must be 1 or greater"));
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(Error::invalid_input(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        Ok((page, limit))
    }

    /// True when no search term is set or any haystack contains it
    pub fn matches_search(&self, haystacks: &[&str]) -> bool {
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                haystacks.iter().any(|h| h.to_lowercase().contains(&term))
            }
        }
    }

    /// True when no featured filter is set or it equals `featured`
    pub fn matches_featured(&self, featured: bool) -> bool {
        self.featured.map_or(true, |wanted| wanted == featured)
    }

    /// Parse an optional enum filter with the type's own `FromStr`
    pub fn parse_filter<T>(value: Option<&str>, name: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
    {
        value
            .map(|raw| {
                raw.parse()
                    .map_err(|_| Error::invalid_input(format!("Unknown {}: {}", name, raw)))
            })
            .transpose()
    }
}

/// Pagination metadata returned next to list data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// Current page
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Matching records across all pages
    pub total: usize,
    /// Number of pages
    pub total_pages: u32,
}

/// One page of records
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Pagination metadata
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted list
    pub fn paginate(items: Vec<T>, params: &ListParams) -> Result<Self> {
        let (page, limit) = params.page_window()?;
        let total = items.len();
        let total_pages = total.div_ceil(limit as usize) as u32;
        let offset = (page as usize - 1) * limit as usize;

        let items = items.into_iter().skip(offset).take(limit as usize).collect();

        Ok(Self {
            items,
            meta: PageMeta {
                page,
                limit,
                total,
                total_pages,
            },
        })
    }

    /// Map the records while keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
