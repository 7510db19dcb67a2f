//! Menu link extraction from a business page
//!
//! Fetches the chosen business's page (through the response cache), locates a
//! single region of its markup and collects the links inside it. When no
//! usable menu link exists the business page itself is returned.

use std::sync::Arc;

use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;

use super::transport::{Fetch, FetchError, Request};
use crate::cache::{CacheError, JsonCache};

/// Class of the region holding the menu link on the review site's business page
pub const DEFAULT_MENU_CLASS: &str =
    "margin-t3__373c0__1l90z border-color--default__373c0__3-ifU";

/// Errors that can occur when extracting menu links
#[derive(Debug, Error)]
pub enum MenuError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Selection does not name an entry of the list
    #[error("Selection {selection} is out of range (1-{len})")]
    SelectionOutOfRange { selection: usize, len: usize },

    /// The page has no region matching the locator
    #[error("No region with class \"{0}\" on the page")]
    RegionNotFound(String),

    /// The cached entry for the page is not markup
    #[error("Cached entry for {0} is not page markup")]
    NotMarkup(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Finds the markup region whose links are extracted
pub trait RegionLocator: Send + Sync {
    /// Returns every outbound link inside the region
    ///
    /// # Returns
    /// * `Err(MenuError::RegionNotFound)` if the page lacks the region
    fn locate_links(&self, markup: &str) -> Result<Vec<String>, MenuError>;
}

/// Locates the first element whose `class` attribute equals a given string
#[derive(Debug, Clone)]
pub struct ClassRegionLocator {
    class: String,
}

impl ClassRegionLocator {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

impl Default for ClassRegionLocator {
    fn default() -> Self {
        Self::new(DEFAULT_MENU_CLASS)
    }
}

impl RegionLocator for ClassRegionLocator {
    fn locate_links(&self, markup: &str) -> Result<Vec<String>, MenuError> {
        let with_class = parse_selector("[class]")?;
        let anchors = parse_selector("a[href]")?;
        let document = Html::parse_document(markup);

        let region = document
            .select(&with_class)
            .find(|element| element.value().attr("class") == Some(self.class.as_str()))
            .ok_or_else(|| MenuError::RegionNotFound(self.class.clone()))?;

        Ok(region
            .select(&anchors)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, MenuError> {
    Selector::parse(selector).map_err(|e| MenuError::InvalidSelector(e.to_string()))
}

/// Whether a link is an absolute web address
fn is_absolute(link: &str) -> bool {
    link.starts_with("https://") || link.starts_with("http://")
}

/// Links extracted for a business, never empty
#[derive(Debug, Clone, PartialEq)]
pub struct MenuLinks {
    links: Vec<String>,
    fell_back: bool,
}

impl MenuLinks {
    /// Applies the fallback policy to the links found in the region
    ///
    /// Unless the first link is absolute, the result is exactly `[page_url]`.
    pub fn resolve(found: Vec<String>, page_url: &str) -> Self {
        match found.first() {
            Some(first) if is_absolute(first) => Self {
                links: found,
                fell_back: false,
            },
            _ => Self {
                links: vec![page_url.to_string()],
                fell_back: true,
            },
        }
    }

    /// The link to open
    pub fn first(&self) -> &str {
        &self.links[0]
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Whether the business page was substituted for a missing menu link
    pub fn fell_back(&self) -> bool {
        self.fell_back
    }
}

/// Fetches business pages and extracts their menu links
pub struct MenuClient {
    fetcher: Arc<dyn Fetch>,
    locator: Box<dyn RegionLocator>,
}

impl MenuClient {
    pub fn new(fetcher: Arc<dyn Fetch>, locator: Box<dyn RegionLocator>) -> Self {
        Self { fetcher, locator }
    }

    /// Returns the menu links for entry `selection` (1-based) of `urls`
    ///
    /// # Returns
    /// * `Ok(MenuLinks)` with at least one link; falls back to the page itself
    ///   when the region is missing or its first link is not absolute
    /// * `Err(MenuError::SelectionOutOfRange)` for a bad selection
    pub async fn menu_links(
        &self,
        cache: &mut JsonCache,
        urls: &[String],
        selection: usize,
    ) -> Result<MenuLinks, MenuError> {
        let page_url = selection
            .checked_sub(1)
            .and_then(|index| urls.get(index))
            .ok_or(MenuError::SelectionOutOfRange {
                selection,
                len: urls.len(),
            })?;

        if cache.contains(page_url) {
            tracing::info!(url = %page_url, "Using cache");
        } else {
            tracing::info!(url = %page_url, "Fetching");
            let markup = self.fetcher.get_text(&Request::get(page_url)).await?;
            cache.insert(page_url.clone(), Value::String(markup))?;
        }

        let markup = cache
            .get(page_url)
            .and_then(Value::as_str)
            .ok_or_else(|| MenuError::NotMarkup(page_url.clone()))?;

        let found = match self.locator.locate_links(markup) {
            Ok(found) => found,
            Err(MenuError::RegionNotFound(class)) => {
                tracing::debug!(url = %page_url, %class, "menu region not found");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(MenuLinks::resolve(found, page_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transport::stub::StubFetcher;
    use tempfile::TempDir;

    const PAGE_URL: &str = "https://www.yelp.com/biz/pizza-house-ann-arbor";

    fn create_test_cache() -> (JsonCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = JsonCache::load(temp_dir.path().join("cache.json"));
        (cache, temp_dir)
    }

    fn page_with_region(inner: &str) -> String {
        format!(
            r#"<html><body>
                <div class="header"><a href="https://www.yelp.com/">Yelp</a></div>
                <section class="{}"><div><p>Menu</p>{}</div></section>
                <a href="https://elsewhere.example.com/">Footer</a>
            </body></html>"#,
            DEFAULT_MENU_CLASS, inner
        )
    }

    fn client(stub: Arc<StubFetcher>) -> MenuClient {
        MenuClient::new(stub, Box::new(ClassRegionLocator::default()))
    }

    #[test]
    fn test_locator_collects_links_in_region_only() {
        let markup = page_with_region(
            r#"<a href="https://pizzahouse.example.com/menu">Full menu</a>
               <span><a href="/biz_redir?url=x">Website</a></span>
               <a>no href</a>"#,
        );

        let links = ClassRegionLocator::default().locate_links(&markup).unwrap();

        assert_eq!(
            links,
            ["https://pizzahouse.example.com/menu", "/biz_redir?url=x"]
        );
    }

    #[test]
    fn test_locator_requires_exact_class() {
        let markup = r#"<div class="margin-t3__373c0__1l90z"><a href="https://a.example.com">a</a></div>"#;

        let result = ClassRegionLocator::default().locate_links(markup);

        assert!(matches!(result, Err(MenuError::RegionNotFound(_))));
    }

    #[test]
    fn test_locator_custom_class() {
        let markup = r#"<ul class="menu-links"><li><a href="http://menu.example.com">m</a></li></ul>"#;

        let locator = ClassRegionLocator::new("menu-links");
        assert_eq!(locator.class(), "menu-links");
        assert_eq!(locator.locate_links(markup).unwrap(), ["http://menu.example.com"]);
    }

    #[test]
    fn test_resolve_keeps_absolute_links() {
        let found = vec![
            "https://menu.example.com".to_string(),
            "/relative".to_string(),
        ];

        let links = MenuLinks::resolve(found.clone(), PAGE_URL);

        assert!(!links.fell_back());
        assert_eq!(links.links(), found.as_slice());
        assert_eq!(links.first(), "https://menu.example.com");
    }

    #[test]
    fn test_resolve_relative_first_link_falls_back() {
        let found = vec![
            "/biz_redir?url=x".to_string(),
            "https://menu.example.com".to_string(),
        ];

        let links = MenuLinks::resolve(found, PAGE_URL);

        assert!(links.fell_back());
        assert_eq!(links.links(), [PAGE_URL.to_string()]);
    }

    #[test]
    fn test_resolve_empty_falls_back() {
        let links = MenuLinks::resolve(Vec::new(), PAGE_URL);
        assert_eq!(links.first(), PAGE_URL);
        assert!(links.fell_back());
    }

    #[tokio::test]
    async fn test_menu_links_fetches_and_caches_markup() {
        let (mut cache, _temp_dir) = create_test_cache();
        let markup = page_with_region(r#"<a href="https://pizzahouse.example.com/menu">Menu</a>"#);
        let stub = Arc::new(StubFetcher::new().with_text(PAGE_URL, &markup));
        let client = client(stub.clone());
        let urls = vec!["https://www.yelp.com/biz/other".to_string(), PAGE_URL.to_string()];

        let links = client.menu_links(&mut cache, &urls, 2).await.unwrap();

        assert_eq!(links.first(), "https://pizzahouse.example.com/menu");
        assert_eq!(stub.call_count(), 1);
        assert_eq!(cache.get(PAGE_URL).and_then(Value::as_str), Some(markup.as_str()));

        // Second lookup is served from the cache
        client.menu_links(&mut cache, &urls, 2).await.unwrap();
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_menu_links_missing_region_falls_back() {
        let (mut cache, _temp_dir) = create_test_cache();
        let stub = Arc::new(StubFetcher::new().with_text(PAGE_URL, "<html><body>redesigned</body></html>"));
        let client = client(stub);

        let links = client
            .menu_links(&mut cache, &[PAGE_URL.to_string()], 1)
            .await
            .unwrap();

        assert!(links.fell_back());
        assert_eq!(links.links(), [PAGE_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_menu_links_selection_out_of_range() {
        let (mut cache, _temp_dir) = create_test_cache();
        let stub = Arc::new(StubFetcher::new());
        let client = client(stub.clone());
        let urls = vec![PAGE_URL.to_string()];

        for selection in [0, 2] {
            let result = client.menu_links(&mut cache, &urls, selection).await;
            assert!(matches!(
                result,
                Err(MenuError::SelectionOutOfRange { len: 1, .. })
            ));
        }
        assert_eq!(stub.call_count(), 0);
    }
}
