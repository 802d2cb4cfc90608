//! URL and query-string assembly
//!
//! Pure functions of the request descriptor and the current time. The
//! window is resolved once per logical fetch, so auth retries reuse the
//! exact same URL.

use chrono::{DateTime, Utc};
use staleguard_common::time::{format_timestamp, TimeWindow};

use super::request::{FetchRequest, IdFilters};

/// Resolves resource paths against the configured base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    base_url: String,
}

impl QueryBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `request` with filters and window applied
    pub fn build_url(&self, request: &FetchRequest, now: DateTime<Utc>) -> String {
        let mut url = self.resolve(request.resource_path());

        let fragments: Vec<String> = Self::filter_fragment(request.filters())
            .into_iter()
            .chain(request.window().map(|window| Self::window_fragment(window, now)))
            .collect();

        if !fragments.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&fragments.join("&"));
        }
        url
    }

    /// `start=<ts>&end=<ts>` for the window ending at `now`
    pub fn window_fragment(window: TimeWindow, now: DateTime<Utc>) -> String {
        let (start, end) = window.bounds(now);
        format!(
            "start={}&end={}",
            urlencoding::encode(&format_timestamp(start)),
            urlencoding::encode(&format_timestamp(end))
        )
    }

    /// `field=id1,id2&...`, `None` when there is nothing to filter on
    pub fn filter_fragment(filters: &IdFilters) -> Option<String> {
        let parts: Vec<String> = filters
            .iter()
            .filter(|filter| !filter.ids.is_empty())
            .map(|filter| {
                let ids: Vec<_> = filter.ids.iter().map(|id| urlencoding::encode(id)).collect();
                format!("{}={}", urlencoding::encode(&filter.field), ids.join(","))
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join("&"))
    }

    fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use staleguard_common::testing::utc;

    use super::*;
    use crate::query::IdFilter;

    fn builder() -> QueryBuilder {
        QueryBuilder::new("https://api.example.com/v1/")
    }

    #[test]
    fn test_joins_base_and_path() {
        let now = utc(2024, 3, 10, 12, 0, 0);
        assert_eq!(
            builder().build_url(&FetchRequest::new("/orders"), now),
            "https://api.example.com/v1/orders"
        );
        assert_eq!(
            builder().build_url(&FetchRequest::new("https://other.example.com/x"), now),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_window_fragment_is_encoded() {
        let now = utc(2024, 3, 10, 12, 30, 0);
        assert_eq!(
            QueryBuilder::window_fragment(TimeWindow::LastDays(7), now),
            "start=2024-03-03T12%3A30%3A00&end=2024-03-10T12%3A30%3A00"
        );
        assert_eq!(
            QueryBuilder::window_fragment(TimeWindow::Today, now),
            "start=2024-03-10T00%3A00%3A00&end=2024-03-10T12%3A30%3A00"
        );
    }

    #[test]
    fn test_oversized_window_is_clamped_in_url() {
        let request = FetchRequest::new("orders").with_window(TimeWindow::LastDays(u32::MAX));
        assert_eq!(
            builder().build_url(&request, utc(2024, 1, 1, 0, 0, 0)),
            "https://api.example.com/v1/orders?start=1923-10-18T00%3A00%3A00&end=2024-01-01T00%3A00%3A00"
        );
    }

    #[test]
    fn test_filters_and_window_are_combined() {
        let now = utc(2024, 3, 10, 0, 0, 0);
        let request = FetchRequest::new("orders?status=open")
            .with_filter(IdFilter::new("accountId", ["a1", "a 2"]))
            .with_filter(IdFilter::new("unused", Vec::<String>::new()))
            .with_window(TimeWindow::Today);

        assert_eq!(
            builder().build_url(&request, now),
            "https://api.example.com/v1/orders?status=open&accountId=a1,a%202\
             &start=2024-03-10T00%3A00%3A00&end=2024-03-10T00%3A00%3A00"
        );
    }

    #[test]
    fn test_no_filters_means_no_query() {
        assert_eq!(QueryBuilder::filter_fragment(&IdFilters::new()), None);
    }
}
