//! Turns a raw query-string map into a [`SearchRequest`].

use std::collections::HashMap;

use super::{Criterion, Join, Operator, Order, Pager};
use crate::errors::ApiError;
use crate::models::SearchParams;

/// How criteria are combined. One mode applies to the whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    And,
    Or,
}

impl Mode {
    /// Only an exact `or` selects [`Mode::Or`].
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("or") => Self::Or,
            _ => Self::And,
        }
    }
}

/// Everything a single search needs. Built fresh for each request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub criteria: Vec<Criterion>,
    pub orders: Vec<Order>,
    pub joins: Vec<Join>,
    pub pager: Pager,
    pub embeds: Vec<String>,
    pub functions: Vec<String>,
    pub mode: Mode,
    pub free_text: Option<String>,
}

impl SearchRequest {
    /// Extract a request from query parameters.
    ///
    /// Non-reserved keys become criteria in sorted key order. A plain embed
    /// that does not name a join alias is rewritten to `<root_alias>.<embed>`.
    ///
    /// # Errors
    ///
    /// Returns a malformed-query error for an unknown operator suffix.
    pub fn from_query(query: &HashMap<String, String>, root_alias: &str) -> Result<Self, ApiError> {
        let params = SearchParams::from_query(query);

        let mut keys: Vec<&String> = query
            .keys()
            .filter(|key| !SearchParams::is_reserved(key))
            .collect();
        keys.sort();

        let mut criteria = Vec::with_capacity(keys.len());
        for key in keys {
            let (property, token) = Criterion::split_key(key);
            let operator = match token {
                None => Operator::Eq,
                Some(token) => Operator::from_token(token).ok_or_else(|| {
                    ApiError::malformed_query(format!("unknown operator '{token}' in '{key}'"))
                })?,
            };
            if property.is_empty() {
                return Err(ApiError::malformed_query(format!("missing property in '{key}'")));
            }
            criteria.push(Criterion::new(property, operator, query[key].as_str()));
        }

        let joins = params
            .join()
            .map(|raw| Join::parse_list(raw, root_alias))
            .unwrap_or_default();

        let embeds = params
            .embed()
            .map(split_list)
            .unwrap_or_default()
            .into_iter()
            .map(|embed| {
                let is_alias = joins.iter().any(|join| join.alias == embed);
                if embed.contains('.') || is_alias {
                    embed
                } else {
                    format!("{root_alias}.{embed}")
                }
            })
            .collect();

        let free_text = params
            .q()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(ToString::to_string);

        Ok(Self {
            criteria,
            orders: params.sort().map(Order::parse_list).unwrap_or_default(),
            joins,
            pager: Pager::from_params(params.page(), params.per_page()),
            embeds,
            functions: params.function_projection().map(split_list).unwrap_or_default(),
            mode: Mode::parse(params.mode()),
            free_text,
        })
    }

    /// Prefix every plain criterion and order property with the root alias.
    /// Already qualified properties are left alone, so this is idempotent.
    pub fn qualify(&mut self, root_alias: &str) {
        for criterion in &mut self.criteria {
            if !criterion.has_prefix() {
                criterion.add_prefix(root_alias);
            }
        }
        for order in &mut self.orders {
            if !order.has_prefix() {
                order.add_prefix(root_alias);
            }
        }
    }

    /// Owned, qualified copy
    #[must_use]
    pub fn qualified(&self, root_alias: &str) -> Self {
        let mut request = self.clone();
        request.qualify(root_alias);
        request
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}
