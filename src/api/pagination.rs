//! Page-number pagination
//!
//! List endpoints accept `page` and `page_size` and answer with the
//! `{count, next, previous, results}` envelope.

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PaginationConfig;
use crate::error::AppError;
use crate::service::Listing;

/// Raw pagination query parameters
///
/// Kept as strings so that malformed values can be handled explicitly
/// instead of rejecting the whole query.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

impl PageParams {
    /// Resolve the requested page against configured limits
    ///
    /// # Errors
    /// `InvalidPage` if `page` is not a positive integer or its offset does
    /// not fit a SQL `OFFSET`
    pub fn window(&self, config: &PaginationConfig) -> Result<PageWindow, AppError> {
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<usize>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(AppError::InvalidPage),
            },
        };

        let page_size = self
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(config.max_page_size))
            .unwrap_or(config.default_page_size);

        (page - 1)
            .checked_mul(page_size)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or(AppError::InvalidPage)?;

        Ok(PageWindow { page, page_size })
    }
}

impl PageWindow {
    pub fn limit(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    /// Number of pages for `count` rows; an empty result still has one page
    fn num_pages(&self, count: i64) -> usize {
        let count = count.max(0) as usize;
        count.div_ceil(self.page_size).max(1)
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap one page of results
    ///
    /// `next`/`previous` are absolute links derived from the request URI with
    /// the `page` parameter replaced.
    ///
    /// # Errors
    /// `InvalidPage` if the window lies past the last page
    pub fn build(
        listing: Listing<T>,
        window: PageWindow,
        base_url: &str,
        uri: &Uri,
    ) -> Result<Self, AppError> {
        let num_pages = window.num_pages(listing.total);
        if window.page > num_pages {
            return Err(AppError::InvalidPage);
        }

        let next = (window.page < num_pages).then(|| page_link(base_url, uri, Some(window.page + 1)));
        let previous = match window.page {
            1 => None,
            2 => Some(page_link(base_url, uri, None)),
            page => Some(page_link(base_url, uri, Some(page - 1))),
        };

        Ok(Self {
            count: listing.total,
            next: next.flatten(),
            previous: previous.flatten(),
            results: listing.items,
        })
    }
}

/// Rebuild the request URL with `page` set to `page`, or removed for `None`
fn page_link(base_url: &str, uri: &Uri, page: Option<usize>) -> Option<String> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let mut url = match Url::parse(&format!("{}{}", base_url.trim_end_matches('/'), path_and_query)) {
        Ok(url) => url,
        Err(error) => {
            tracing::warn!(%error, %base_url, "Failed to build pagination link");
            return None;
        }
    };

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    if !retained.is_empty() || page.is_some() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        if let Some(page) = page {
            pairs.append_pair("page", &page.to_string());
        }
    }

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, page_size: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    fn listing(total: i64, len: usize) -> Listing<u32> {
        Listing {
            items: (0..len as u32).collect(),
            total,
        }
    }

    #[test]
    fn window_defaults_and_clamps() {
        let config = PaginationConfig::default();

        assert_eq!(
            params(None, None).window(&config).unwrap(),
            PageWindow { page: 1, page_size: 10 }
        );
        assert_eq!(params(None, Some("500")).window(&config).unwrap().page_size, 100);
        assert_eq!(params(None, Some("0")).window(&config).unwrap().page_size, 10);
        assert_eq!(params(None, Some("abc")).window(&config).unwrap().page_size, 10);

        let window = params(Some("3"), Some("20")).window(&config).unwrap();
        assert_eq!(window.offset(), 40);
        assert_eq!(window.limit(), 20);
    }

    #[test]
    fn window_rejects_bad_pages() {
        let config = PaginationConfig::default();
        assert!(matches!(
            params(Some("0"), None).window(&config),
            Err(AppError::InvalidPage)
        ));
        assert!(matches!(
            params(Some("two"), None).window(&config),
            Err(AppError::InvalidPage)
        ));
    }

    #[test]
    fn window_rejects_pages_whose_offset_overflows() {
        let config = PaginationConfig::default();
        assert!(matches!(
            params(Some("9223372036854775807"), None).window(&config),
            Err(AppError::InvalidPage)
        ));
        assert!(matches!(
            params(Some("18446744073709551615"), Some("100")).window(&config),
            Err(AppError::InvalidPage)
        ));
        assert!(matches!(
            params(Some("99999999999999999999999"), None).window(&config),
            Err(AppError::InvalidPage)
        ));
    }

    #[test]
    fn empty_first_page_is_valid() {
        let window = PageWindow { page: 1, page_size: 10 };
        let uri: Uri = "/api/posts".parse().unwrap();
        let page = Page::build(listing(0, 0), window, "http://localhost:8080", &uri).unwrap();

        assert_eq!(page.count, 0);
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
    }

    #[test]
    fn page_past_the_end_is_invalid() {
        let window = PageWindow { page: 3, page_size: 10 };
        let uri: Uri = "/api/posts?page=3".parse().unwrap();
        assert!(matches!(
            Page::build(listing(15, 0), window, "http://localhost:8080", &uri),
            Err(AppError::InvalidPage)
        ));
    }

    #[test]
    fn links_preserve_other_parameters() {
        let window = PageWindow { page: 2, page_size: 5 };
        let uri: Uri = "/api/posts?search=rust&page=2&page_size=5".parse().unwrap();
        let page = Page::build(listing(12, 5), window, "https://social.example.com", &uri).unwrap();

        assert_eq!(
            page.next.as_deref(),
            Some("https://social.example.com/api/posts?search=rust&page_size=5&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("https://social.example.com/api/posts?search=rust&page_size=5")
        );
    }

    #[test]
    fn previous_from_page_two_drops_page_entirely() {
        let window = PageWindow { page: 2, page_size: 10 };
        let uri: Uri = "/api/feed?page=2".parse().unwrap();
        let page = Page::build(listing(11, 1), window, "http://localhost:8080", &uri).unwrap();

        assert_eq!(page.previous.as_deref(), Some("http://localhost:8080/api/feed"));
        assert!(page.next.is_none());
    }
}
