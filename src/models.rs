use serde::Deserialize;
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

/// Query keys with a reserved meaning; every other key is a filter criterion.
pub const RESERVED_KEYS: &[&str] = &[
    "page",
    "_p",
    "per_page",
    "_pp",
    "sort",
    "_s",
    "mode",
    "_m",
    "join",
    "_j",
    "embed",
    "_e",
    "function-projection",
    "_fn",
    "q",
    "_q",
];

/// Reserved query parameters for searching a resource.
///
/// Each parameter has a long and a short spelling. When both are given the
/// long one wins.
///
/// # Filtering
/// Any other key filters on a property: `name=Ann`, `age-gte=18`,
/// `id-in=1,2,3`, `team_id-is-null`, `team.name-like=Blue%`.
/// Operators are `eq` (default), `neq`, `gt`, `gte`, `lt`, `lte`, `like`,
/// `in`, `not-in`, `is-null` and `is-not-null`.
///
/// # Joins and embeds
/// `join=team,team.members-l` joins relations (`-l` for a left join);
/// `embed=team,o.age` decides which joined aliases and fields are returned.
///
/// # Pagination
/// `page` (one-based) and `per_page` together limit the result and add the
/// `X-REST-TOTAL` response header.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema, Default)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Page index, one-based
    #[param(example = "1")]
    pub page: Option<String>,
    /// Short form of `page`
    #[serde(rename = "_p")]
    pub page_short: Option<String>,
    /// Page size
    #[param(example = "25")]
    pub per_page: Option<String>,
    /// Short form of `per_page`
    #[serde(rename = "_pp")]
    pub per_page_short: Option<String>,
    /// Comma-separated properties, `-` prefix for descending
    #[param(example = "name,-age")]
    pub sort: Option<String>,
    /// Short form of `sort`
    #[serde(rename = "_s")]
    pub sort_short: Option<String>,
    /// `and` (default) or `or`, applies to every criterion
    #[param(example = "and")]
    pub mode: Option<String>,
    /// Short form of `mode`
    #[serde(rename = "_m")]
    pub mode_short: Option<String>,
    /// Comma-separated relations to join
    #[param(example = "team,team.members-l")]
    pub join: Option<String>,
    /// Short form of `join`
    #[serde(rename = "_j")]
    pub join_short: Option<String>,
    /// Comma-separated fields and aliases to return
    #[param(example = "team,o.age")]
    pub embed: Option<String>,
    /// Short form of `embed`
    #[serde(rename = "_e")]
    pub embed_short: Option<String>,
    /// Comma-separated computed properties to evaluate on each row
    #[serde(rename = "function-projection")]
    #[param(example = "label,items.total")]
    pub function_projection: Option<String>,
    /// Short form of `function-projection`
    #[serde(rename = "_fn")]
    pub function_projection_short: Option<String>,
    /// Free-text search over the resource's searchable columns
    pub q: Option<String>,
    /// Short form of `q`
    #[serde(rename = "_q")]
    pub q_short: Option<String>,
}

impl SearchParams {
    /// Pick the reserved keys out of a raw query map.
    #[must_use]
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        serde_json::to_value(query)
            .and_then(serde_json::from_value)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_reserved(key: &str) -> bool {
        RESERVED_KEYS.contains(&key)
    }

    #[must_use]
    pub fn page(&self) -> Option<&str> {
        pick(self.page.as_ref(), self.page_short.as_ref())
    }

    #[must_use]
    pub fn per_page(&self) -> Option<&str> {
        pick(self.per_page.as_ref(), self.per_page_short.as_ref())
    }

    #[must_use]
    pub fn sort(&self) -> Option<&str> {
        pick(self.sort.as_ref(), self.sort_short.as_ref())
    }

    #[must_use]
    pub fn mode(&self) -> Option<&str> {
        pick(self.mode.as_ref(), self.mode_short.as_ref())
    }

    #[must_use]
    pub fn join(&self) -> Option<&str> {
        pick(self.join.as_ref(), self.join_short.as_ref())
    }

    #[must_use]
    pub fn embed(&self) -> Option<&str> {
        pick(self.embed.as_ref(), self.embed_short.as_ref())
    }

    #[must_use]
    pub fn function_projection(&self) -> Option<&str> {
        pick(
            self.function_projection.as_ref(),
            self.function_projection_short.as_ref(),
        )
    }

    #[must_use]
    pub fn q(&self) -> Option<&str> {
        pick(self.q.as_ref(), self.q_short.as_ref())
    }
}

fn pick<'a>(long: Option<&'a String>, short: Option<&'a String>) -> Option<&'a str> {
    long.or(short).map(String::as_str)
}
