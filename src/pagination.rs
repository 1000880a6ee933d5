use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

/// List filters accepted on the query string.
///
/// `page` is zero-based. `size` is clamped to [1, 100] so a caller cannot
/// request an unbounded result set.
#[derive(Clone, Debug, Deserialize)]
pub struct PageFilter {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
    pub name: Option<String>,
    pub user_id: Option<Uuid>,
    /// When set, restricts the result set to the caller's own resources even
    /// for an unrestricted caller.
    #[serde(default)]
    pub logged_user: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageFilter {
    fn default() -> Self {
        PageFilter {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            name: None,
            user_id: None,
            logged_user: false,
        }
    }
}

impl PageFilter {
    fn clamped_size(&self) -> u32 {
        self.size.max(1).min(MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.clamped_size())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * self.limit()
    }

    /// The `ILIKE` pattern for the optional name filter.
    pub fn name_pattern(&self) -> Option<String> {
        self.name.as_ref().map(|name| format!("%{}%", name))
    }
}

/// The page envelope every list (and single-entity) response is wrapped in.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn from_rows(items: Vec<T>, total_items: u64, filter: &PageFilter) -> Page<T> {
        let size = u64::from(filter.clamped_size());
        let total_pages = ((total_items + size - 1) / size) as u32;
        Page {
            items,
            total_items,
            total_pages,
            current_page: filter.page,
        }
    }

    /// Wraps one entity as a degenerate single-item page.
    pub fn single(item: T) -> Page<T> {
        Page {
            items: vec![item],
            total_items: 1,
            total_pages: 1,
            current_page: 0,
        }
    }
}
