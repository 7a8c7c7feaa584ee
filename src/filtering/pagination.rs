use axum::http::header::{HeaderMap, HeaderValue};

/// Page size used when `per_page` is zero or negative
pub const DEFAULT_PER_PAGE: i64 = 25;

/// Response header carrying the unpaged result count
pub const TOTAL_COUNT_HEADER: &str = "X-REST-TOTAL";

/// Limit/offset derived from `page` and `per_page`.
///
/// Both are `None` unless both inputs were supplied. `page` is one-based;
/// `page = 0` is kept literally, which yields a negative offset. The compiler
/// applies negative offsets as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pager {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pager {
    #[must_use]
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let (Some(page), Some(per_page)) = (page, per_page) else {
            return Self::default();
        };

        let page = page.max(0);
        let per_page = if per_page <= 0 { DEFAULT_PER_PAGE } else { per_page };

        Self {
            limit: Some(per_page),
            offset: Some(per_page.saturating_mul(page - 1)),
        }
    }

    /// Build from raw query-string values; blank or non-numeric input counts
    /// as absent.
    #[must_use]
    pub fn from_params(page: Option<&str>, per_page: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|value| value.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(per_page))
    }

    #[must_use]
    pub fn is_paged(&self) -> bool {
        self.limit.is_some() && self.offset.is_some()
    }

    /// Limit and offset as they go into SQL.
    #[must_use]
    pub fn bounds(&self) -> Option<(u64, u64)> {
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => Some((
                u64::try_from(limit).unwrap_or(0),
                u64::try_from(offset).unwrap_or(0),
            )),
            _ => None,
        }
    }
}

/// Header map carrying the total count side channel.
#[must_use]
pub fn total_count_header(total: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));
    headers
}
