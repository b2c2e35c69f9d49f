use axum::http::Uri;
use url::form_urlencoded;

use crate::{config::PaginationConfig, db::issues::SortKey};

/// Skip/limit parsing and previous/next link generation for list endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    /// Missing or non-positive limits fall back to the default, oversized
    /// ones are clamped, negative skips start from the beginning.
    pub fn parse(&self, skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
        let skip = skip.unwrap_or(0).max(0);
        let limit = match limit {
            Some(limit) if limit > 0 => limit.min(self.config.max_limit),
            _ => self.config.default_limit,
        };
        (skip, limit)
    }

    pub fn urls(
        &self,
        uri: &Uri,
        skip: i64,
        limit: i64,
        count: i64,
    ) -> (Option<String>, Option<String>) {
        let previous =
            (skip > 0).then(|| page_url(uri, skip.saturating_sub(limit).max(0), limit));
        let next_skip = skip.saturating_add(limit);
        let next = (next_skip < count).then(|| page_url(uri, next_skip, limit));
        (previous, next)
    }
}

fn page_url(uri: &Uri, skip: i64, limit: i64) -> String {
    let query = uri.query().unwrap_or_default();
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(
        form_urlencoded::parse(query.as_bytes()).filter(|(key, _)| key != "skip" && key != "limit"),
    );
    serializer
        .append_pair("skip", &skip.to_string())
        .append_pair("limit", &limit.to_string());

    format!("{}?{}", uri.path(), serializer.finish())
}

/// Parses `sort=created,-updated` style parameters against an allow-list.
/// Unknown keys are dropped.
#[derive(Debug, Clone, Copy)]
pub struct Sorter {
    allowed: &'static [&'static str],
}

impl Sorter {
    pub const fn new(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }

    pub fn parse(&self, raw: Option<&str>) -> Vec<SortKey> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        raw.split(',')
            .map(str::trim)
            .filter_map(|field| {
                let (name, descending) = match field.strip_prefix('-') {
                    Some(name) => (name, true),
                    None => (field, false),
                };
                self.allowed
                    .iter()
                    .find(|allowed| **allowed == name)
                    .map(|column| SortKey {
                        column: *column,
                        descending,
                    })
            })
            .collect()
    }
}
