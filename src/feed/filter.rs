use crate::common::{contains_ci, has_category_tag, ItemKind};
use crate::error::FeedError;

/// Validated page/limit pair. Construction is the only place pagination
/// input is checked, and it happens before any store access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 15;

    pub fn new(page: i64, limit: i64) -> Result<Self, FeedError> {
        if page < 1 || limit < 1 {
            return Err(FeedError::Validation(
                "page and limit must be integers of 1 or greater".to_string(),
            ));
        }
        let page = u32::try_from(page).map_err(|_| {
            FeedError::Validation("page parameter out of range".to_string())
        })?;
        let limit = u32::try_from(limit).map_err(|_| {
            FeedError::Validation("limit parameter out of range".to_string())
        })?;
        Ok(Pagination { page, limit })
    }

    /// Parses raw caller strings, applying defaults for absent values.
    /// Non-numeric input is a validation failure, never a silent default.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, FeedError> {
        let page = match page {
            None => i64::from(Self::DEFAULT_PAGE),
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                FeedError::Validation(format!("page must be an integer, got '{}'", raw))
            })?,
        };
        let limit = match limit {
            None => i64::from(Self::DEFAULT_LIMIT),
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                FeedError::Validation(format!("limit must be an integer, got '{}'", raw))
            })?,
        };
        Self::new(page, limit)
    }

    /// Enforces a per-feed limit cap; `None` means the feed is uncapped.
    pub fn ensure_limit_within(&self, cap: Option<u32>) -> Result<(), FeedError> {
        if let Some(cap) = cap {
            if self.limit > cap {
                return Err(FeedError::Validation(format!(
                    "limit must not exceed {} for this feed",
                    cap
                )));
            }
        }
        Ok(())
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit as usize
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Which source tables a mixed feed reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemTypeFilter {
    All,
    Tweet,
    Bluesky,
    Article,
}

impl ItemTypeFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(ItemTypeFilter::All),
            "tweet" => Some(ItemTypeFilter::Tweet),
            "bluesky" => Some(ItemTypeFilter::Bluesky),
            "article" => Some(ItemTypeFilter::Article),
            _ => None,
        }
    }

    pub fn includes_articles(&self) -> bool {
        matches!(self, ItemTypeFilter::All | ItemTypeFilter::Article)
    }

    pub fn post_sources(&self) -> &'static [ItemKind] {
        match self {
            ItemTypeFilter::All => &ItemKind::POST_KINDS,
            ItemTypeFilter::Tweet => &[ItemKind::Tweet],
            ItemTypeFilter::Bluesky => &[ItemKind::Bluesky],
            ItemTypeFilter::Article => &[],
        }
    }
}

/// How a category clause matches against a stored category field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagMatch {
    /// ASCII case-insensitive substring; article categories are free text.
    Substring,
    /// Trimmed, case-insensitive membership in the comma-separated tag set.
    Exact,
}

/// One field's category clause: OR across its tags. Fields combine with
/// AND at the reader level (region in SQL, categories here).
#[derive(Clone, Debug)]
pub struct CategoryFilter {
    tags: Vec<String>,
    mode: TagMatch,
}

impl CategoryFilter {
    pub fn new(tags: &[String], mode: TagMatch) -> Self {
        let tags = tags
            .iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        CategoryFilter { tags, mode }
    }

    /// An empty clause matches everything.
    pub fn matches(&self, categories: &str) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        self.tags.iter().any(|tag| match self.mode {
            TagMatch::Substring => contains_ci(categories, tag),
            TagMatch::Exact => has_category_tag(categories, tag),
        })
    }
}

/// Normalized query for the mixed feeds, produced from raw caller input.
///
/// `item_filter` of `None` means the caller named an item type this engine
/// does not serve; the feed resolves to zero sources rather than an error.
#[derive(Clone, Debug)]
pub struct FeedQuery {
    pub categories: Vec<String>,
    pub region: Option<String>,
    pub item_filter: Option<ItemTypeFilter>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        FeedQuery {
            categories: Vec::new(),
            region: None,
            item_filter: Some(ItemTypeFilter::All),
        }
    }
}

impl FeedQuery {
    pub fn build(categories: &[String], region: Option<&str>, item_filter: Option<&str>) -> Self {
        FeedQuery {
            categories: categories
                .iter()
                .map(|category| category.trim().to_string())
                .filter(|category| !category.is_empty())
                .collect(),
            region: region
                .map(str::trim)
                .filter(|region| !region.is_empty())
                .map(String::from),
            item_filter: match item_filter {
                None => Some(ItemTypeFilter::All),
                Some(raw) => ItemTypeFilter::parse(raw),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_apply_when_absent() {
        let pagination = Pagination::parse(None, None).unwrap();
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.limit(), 15);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn pagination_rejects_non_numeric_input() {
        assert!(Pagination::parse(Some("abc"), None).is_err());
        assert!(Pagination::parse(None, Some("2.5")).is_err());
    }

    #[test]
    fn pagination_rejects_values_below_one() {
        assert!(Pagination::new(0, 10).is_err());
        assert!(Pagination::new(1, 0).is_err());
        assert!(Pagination::new(-3, 10).is_err());
        assert!(Pagination::parse(Some("0"), Some("15")).is_err());
    }

    #[test]
    fn pagination_offset_is_page_minus_one_times_limit() {
        let pagination = Pagination::new(3, 20).unwrap();
        assert_eq!(pagination.offset(), 40);
        assert_eq!(pagination.limit(), 20);
    }

    #[test]
    fn limit_cap_is_per_feed() {
        let pagination = Pagination::new(1, 51).unwrap();
        assert!(pagination.ensure_limit_within(Some(50)).is_err());
        assert!(pagination.ensure_limit_within(Some(51)).is_ok());
        assert!(pagination.ensure_limit_within(None).is_ok());
    }

    #[test]
    fn item_type_filter_resolves_sources() {
        assert_eq!(ItemTypeFilter::parse("ALL"), Some(ItemTypeFilter::All));
        assert_eq!(ItemTypeFilter::parse(" tweet "), Some(ItemTypeFilter::Tweet));
        assert_eq!(ItemTypeFilter::parse("rss"), None);

        assert!(ItemTypeFilter::Article.includes_articles());
        assert!(ItemTypeFilter::Article.post_sources().is_empty());
        assert_eq!(ItemTypeFilter::All.post_sources().len(), 2);
        assert!(!ItemTypeFilter::Bluesky.includes_articles());
    }

    #[test]
    fn substring_clause_matches_article_categories() {
        let filter = CategoryFilter::new(&["tech".to_string()], TagMatch::Substring);
        assert!(filter.matches("SCIENCE & TECHNOLOGY"));
        assert!(!filter.matches("Sports"));
    }

    #[test]
    fn exact_clause_requires_tag_membership() {
        let filter = CategoryFilter::new(&["tech".to_string()], TagMatch::Exact);
        assert!(filter.matches("Tech, Business"));
        assert!(!filter.matches("Technology, Business"));
    }

    #[test]
    fn clause_is_or_within_field() {
        let filter = CategoryFilter::new(
            &["sports".to_string(), "ai".to_string()],
            TagMatch::Exact,
        );
        assert!(filter.matches("AI, Business"));
        assert!(filter.matches("Sports"));
        assert!(!filter.matches("Politics"));
    }

    #[test]
    fn empty_clause_matches_everything() {
        let filter = CategoryFilter::new(&[" ".to_string()], TagMatch::Exact);
        assert!(filter.matches("anything"));
    }

    #[test]
    fn query_builder_normalizes_input() {
        let query = FeedQuery::build(
            &[" Tech ".to_string(), "".to_string()],
            Some("  "),
            Some("bogus"),
        );
        assert_eq!(query.categories, vec!["Tech".to_string()]);
        assert_eq!(query.region, None);
        assert_eq!(query.item_filter, None);

        let query = FeedQuery::build(&[], Some(" US "), None);
        assert_eq!(query.region.as_deref(), Some("US"));
        assert_eq!(query.item_filter, Some(ItemTypeFilter::All));
    }
}
