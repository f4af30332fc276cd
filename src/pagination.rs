//! Pagination and sort normalization for list endpoints, plus self/next/prev link construction.
//!
//! Normalization never rejects: every malformed or out-of-range value is defaulted or clamped.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub const PAGE_PARAM: &str = "page";
pub const PER_PAGE_PARAM: &str = "perPage";
pub const SORT_BY_PARAM: &str = "sortBy";
pub const ORDER_PARAM: &str = "order";

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MIN_PER_PAGE: u64 = 1;
pub const MAX_PER_PAGE: u64 = 100;
pub const DEFAULT_SORT_FIELD: &str = "created_at";
/// Upper bound for `page`, so `offset` always fits in a u64.
pub const MAX_PAGE: u64 = u32::MAX as u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Case-insensitive `ASC` / `DESC`; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("ASC") {
            Some(SortDirection::Asc)
        } else if raw.eq_ignore_ascii_case("DESC") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Per-endpoint defaults applied when the query leaves a value out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationDefaults {
    /// Default 10.
    pub per_page: u64,
    /// Default `created_at`.
    pub sort_field: String,
    /// Default `DESC`; reference-data endpoints use `ASC`.
    pub direction: SortDirection,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        PaginationDefaults {
            per_page: DEFAULT_PER_PAGE,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl PaginationDefaults {
    pub fn with_direction(direction: SortDirection) -> Self {
        PaginationDefaults {
            direction,
            ..Self::default()
        }
    }
}

/// Canonical pagination request. Always well-formed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationSpec {
    pub page: u64,
    pub per_page: u64,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub offset: u64,
}

impl PaginationSpec {
    /// Normalize raw query pairs. When a key repeats, the last value wins.
    pub fn from_query(query: &[(String, String)], defaults: PaginationDefaults) -> Self {
        let lookup = |key: &str| {
            query
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        let page = match lookup(PAGE_PARAM).and_then(parse_leading_int) {
            Some(n) if n >= 1 => (n as u64).min(MAX_PAGE),
            _ => DEFAULT_PAGE,
        };

        let per_page = match lookup(PER_PAGE_PARAM).and_then(parse_leading_int) {
            Some(n) => n.clamp(MIN_PER_PAGE as i64, MAX_PER_PAGE as i64) as u64,
            None => defaults.per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE),
        };

        let sort_field = lookup(SORT_BY_PARAM)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.sort_field);

        let sort_direction = lookup(ORDER_PARAM)
            .and_then(SortDirection::parse)
            .unwrap_or(defaults.direction);

        PaginationSpec::new(page, per_page, sort_field, sort_direction)
    }

    /// Build from already-valid parts; `page` and `per_page` are still clamped.
    pub fn new(page: u64, per_page: u64, sort_field: String, sort_direction: SortDirection) -> Self {
        let page = page.clamp(DEFAULT_PAGE, MAX_PAGE);
        let per_page = per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE);
        PaginationSpec {
            page,
            per_page,
            sort_field,
            sort_direction,
            offset: (page - 1) * per_page,
        }
    }
}

/// Leading-integer parse: optional sign, then digits up to the first non-digit.
/// `"12abc"` is 12, `"abc"` is `None`. Saturates instead of overflowing.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: &str = &digits[..digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len())];
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Derived, read-only view of a page position against a total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total_items: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationInfo {
    pub fn new(spec: &PaginationSpec, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(spec.per_page).max(1);
        PaginationInfo {
            total_items,
            current_page: spec.page,
            per_page: spec.per_page,
            total_pages,
            has_next_page: spec.page < total_pages,
            has_prev_page: spec.page > 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// Where page links point: the request path and its incoming query, resolved against the app origin.
#[derive(Clone, Copy, Debug)]
pub struct LinkTarget<'a> {
    pub origin: &'a Url,
    pub path: &'a str,
    pub query: &'a [(String, String)],
}

impl LinkTarget<'_> {
    /// Path and query for `page`, keeping every other parameter as it came in. Repeated keys
    /// keep every value in order, so a multi-valued filter survives into `next` and `prev`.
    pub fn page_url(&self, page: u64, per_page: u64) -> String {
        let mut url = self
            .origin
            .join(self.path)
            .unwrap_or_else(|_| self.origin.clone());

        let kept = self
            .query
            .iter()
            .filter(|(k, _)| k != PAGE_PARAM && k != PER_PAGE_PARAM)
            .map(|(k, v)| (k.as_str(), v.as_str()));

        url.set_query(None);
        url.query_pairs_mut()
            .extend_pairs(kept)
            .append_pair(PAGE_PARAM, &page.to_string())
            .append_pair(PER_PAGE_PARAM, &per_page.to_string());

        match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        }
    }

    pub fn links(&self, info: &PaginationInfo) -> PageLinks {
        PageLinks {
            self_link: self.page_url(info.current_page, info.per_page),
            next: info
                .has_next_page
                .then(|| self.page_url(info.current_page + 1, info.per_page)),
            prev: info
                .has_prev_page
                .then(|| self.page_url(info.current_page - 1, info.per_page)),
        }
    }
}

/// Decode a raw query string into ordered pairs.
pub fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
