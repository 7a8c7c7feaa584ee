//! Compiles a qualified [`SearchRequest`] against a [`Schema`] into a
//! sea-query statement plus the plan the hydrator needs to fold the flat
//! result back into documents.
//!
//! Every identifier that reaches SQL is first resolved against the schema, so
//! user text can only ever select among known aliases, relations and columns.

use sea_orm::sea_query::{
    Alias, Asterisk, Condition, Expr, Func, Query, SelectStatement, SimpleExpr,
};

use super::hydrate::{HydrationPlan, PlanNode};
use super::schema::{ColumnInfo, RelationDescriptor, Schema};
use crate::errors::ApiError;
use crate::filtering::{Direction, Join, Mode, SearchRequest, build_free_text_condition};

/// Separator between alias and column in selected labels: `team__name`
pub const LABEL_SEPARATOR: &str = "__";

/// Label of the count column produced by [`compile_count`]
pub const COUNT_LABEL: &str = "total";

const PAGE_KEY_LABEL: &str = "page_key";

/// A search statement and how to read its rows.
#[derive(Debug, Clone)]
pub struct CompiledSearch {
    pub statement: SelectStatement,
    pub plan: HydrationPlan,
}

#[must_use]
pub fn label(alias: &str, column: &str) -> String {
    format!("{alias}{LABEL_SEPARATOR}{column}")
}

/// Build the search statement.
///
/// `searchable` lists the root columns free-text search runs over.
///
/// # Errors
///
/// Returns a malformed-query error for an unknown alias, relation, column or
/// a duplicate join alias.
pub fn compile_search(
    schema: &Schema,
    request: &SearchRequest,
    root_alias: &str,
    searchable: &[String],
) -> Result<CompiledSearch, ApiError> {
    let scope = Scope::resolve(schema, root_alias, &request.joins)?;
    let mut statement = scope.base_select(request, searchable)?;

    let selection = Selection::build(&scope, &request.embeds)?;
    for (alias, columns) in &selection.columns {
        for column in columns {
            statement.expr_as(
                Expr::col((Alias::new(alias.as_str()), Alias::new(column.as_str()))),
                Alias::new(label(alias, column)),
            );
        }
    }

    for order in &request.orders {
        let (alias, column) = scope.column(&order.property)?;
        statement.order_by((Alias::new(alias), Alias::new(column.name.as_str())), order.direction.into());
    }

    if let Some((limit, offset)) = request.pager.bounds() {
        if request.joins.is_empty() {
            statement.limit(limit).offset(offset);
        } else {
            // a join may repeat a root row, so the page is cut over root keys
            let keys = scope.page_keys(request, searchable, limit, offset)?;
            statement.cond_where(
                Condition::all().add(
                    Expr::col((
                        Alias::new(root_alias),
                        Alias::new(schema.primary_key.as_str()),
                    ))
                    .in_subquery(keys),
                ),
            );
        }
    }

    Ok(CompiledSearch {
        statement,
        plan: selection.plan,
    })
}

/// Build `SELECT COUNT(*) FROM (SELECT DISTINCT root.pk ...)` with the same
/// joins and filters as the search, no pager and no projection.
///
/// # Errors
///
/// Same as [`compile_search`].
pub fn compile_count(
    schema: &Schema,
    request: &SearchRequest,
    root_alias: &str,
    searchable: &[String],
) -> Result<SelectStatement, ApiError> {
    let scope = Scope::resolve(schema, root_alias, &request.joins)?;
    let mut inner = scope.base_select(request, searchable)?;
    inner
        .distinct()
        .column((Alias::new(root_alias), Alias::new(schema.primary_key.as_str())));

    let mut outer = Query::select();
    outer
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new(COUNT_LABEL))
        .from_subquery(inner, Alias::new("counted"));
    Ok(outer)
}

/// One alias visible to a query: the root or a join.
#[derive(Debug)]
struct ScopeEntry<'a> {
    alias: String,
    schema: Schema,
    join: Option<&'a Join>,
    parent: Option<String>,
    relation: Option<RelationDescriptor>,
}

struct Scope<'a> {
    root_alias: &'a str,
    entries: Vec<ScopeEntry<'a>>,
}

impl<'a> Scope<'a> {
    fn resolve(schema: &Schema, root_alias: &'a str, joins: &'a [Join]) -> Result<Self, ApiError> {
        let mut scope = Self {
            root_alias,
            entries: vec![ScopeEntry {
                alias: root_alias.to_string(),
                schema: schema.clone(),
                join: None,
                parent: None,
                relation: None,
            }],
        };

        for join in joins {
            if scope.entry(&join.alias).is_some() {
                return Err(ApiError::malformed_query(format!(
                    "duplicate join alias '{}'",
                    join.alias
                )));
            }

            let (parent_alias, relation_name) = join
                .parent_and_relation()
                .filter(|(_, relation)| !relation.contains('.'))
                .ok_or_else(|| ApiError::malformed_query(format!("bad join path '{}'", join.path)))?;

            let parent = scope.entry(parent_alias).ok_or_else(|| {
                ApiError::malformed_query(format!(
                    "join '{}' refers to undeclared alias '{parent_alias}'",
                    join.path
                ))
            })?;

            let relation = parent.schema.relation(relation_name).ok_or_else(|| {
                ApiError::malformed_query(format!(
                    "unknown relation '{relation_name}' on '{parent_alias}'"
                ))
            })?;

            let entry = ScopeEntry {
                alias: join.alias.clone(),
                schema: relation.target(),
                join: Some(join),
                parent: Some(parent_alias.to_string()),
                relation: Some(relation.clone()),
            };
            scope.entries.push(entry);
        }

        Ok(scope)
    }

    fn entry(&self, alias: &str) -> Option<&ScopeEntry<'a>> {
        self.entries.iter().find(|entry| entry.alias == alias)
    }

    fn root(&self) -> &ScopeEntry<'a> {
        &self.entries[0]
    }

    /// Resolve a qualified property to its alias and column.
    fn column(&self, property: &str) -> Result<(&str, &ColumnInfo), ApiError> {
        let (alias, column) = property.split_once('.').unwrap_or((self.root_alias, property));
        let entry = self
            .entry(alias)
            .ok_or_else(|| ApiError::malformed_query(format!("unknown alias in '{property}'")))?;
        let info = entry
            .schema
            .column(column)
            .ok_or_else(|| ApiError::malformed_query(format!("unknown property '{property}'")))?;
        Ok((entry.alias.as_str(), info))
    }

    /// FROM, joins and WHERE; shared by search and count.
    fn base_select(&self, request: &SearchRequest, searchable: &[String]) -> Result<SelectStatement, ApiError> {
        let root = self.root();
        let mut statement = Query::select();
        statement.from_as(Alias::new(root.schema.table.as_str()), Alias::new(root.alias.as_str()));

        for entry in self.entries.iter().skip(1) {
            let (Some(join), Some(parent), Some(relation)) =
                (entry.join, entry.parent.as_deref(), entry.relation.as_ref())
            else {
                continue;
            };
            statement.join_as(
                join.kind.into(),
                Alias::new(entry.schema.table.as_str()),
                Alias::new(entry.alias.as_str()),
                Expr::col((Alias::new(parent), Alias::new(relation.from_column.as_str())))
                    .equals((Alias::new(entry.alias.as_str()), Alias::new(relation.to_column.as_str()))),
            );
        }

        let mut filters = match request.mode {
            Mode::And => Condition::all(),
            Mode::Or => Condition::any(),
        };
        for criterion in &request.criteria {
            let (alias, column) = self.column(&criterion.property)?;
            filters = filters.add(criterion.compile(alias, &column.name, column.kind)?);
        }

        let mut condition = Condition::all();
        if !request.criteria.is_empty() {
            condition = condition.add(filters);
        }

        if let Some(query) = request.free_text.as_deref() {
            for column in searchable {
                if root.schema.column(column).is_none() {
                    return Err(ApiError::malformed_query(format!(
                        "searchable column '{column}' is not on '{}'",
                        root.schema.table
                    )));
                }
            }
            if let Some(free_text) = build_free_text_condition(&root.alias, searchable, query) {
                condition = condition.add(free_text);
            }
        }

        if !condition.is_empty() {
            statement.cond_where(condition);
        }
        Ok(statement)
    }

    /// Root keys of one page, in search order. Each root appears once, so
    /// orders on joined aliases sort by their `MIN` (ascending) or `MAX`
    /// (descending) per root.
    fn page_keys(
        &self,
        request: &SearchRequest,
        searchable: &[String],
        limit: u64,
        offset: u64,
    ) -> Result<SelectStatement, ApiError> {
        let root = self.root();
        let key = (
            Alias::new(root.alias.as_str()),
            Alias::new(root.schema.primary_key.as_str()),
        );

        let mut keys = self.base_select(request, searchable)?;
        keys.expr_as(Expr::col(key.clone()), Alias::new(PAGE_KEY_LABEL))
            .group_by_col(key);

        for order in &request.orders {
            let (alias, column) = self.column(&order.property)?;
            let expr = Expr::col((Alias::new(alias), Alias::new(column.name.as_str())));
            let expr: SimpleExpr = if alias == root.alias {
                expr.into()
            } else {
                match order.direction {
                    Direction::Asc => Func::min(expr).into(),
                    Direction::Desc => Func::max(expr).into(),
                }
            };
            keys.order_by_expr(expr, order.direction.into());
        }
        keys.limit(limit).offset(offset);

        let mut page = Query::select();
        page.column(Alias::new(PAGE_KEY_LABEL))
            .from_subquery(keys, Alias::new("paged"));
        Ok(page)
    }
}

/// Columns to select per alias and the hydration plan they imply.
struct Selection {
    columns: Vec<(String, Vec<String>)>,
    plan: HydrationPlan,
}

impl Selection {
    fn build(scope: &Scope<'_>, embeds: &[String]) -> Result<Self, ApiError> {
        let root = scope.root();
        let mut selection = Self {
            columns: vec![(root.alias.clone(), Vec::new())],
            plan: HydrationPlan::new(&root.alias, &root.schema.primary_key),
        };

        let mut narrowed = false;
        for embed in embeds {
            let Some((alias, column)) = embed.split_once('.') else {
                // a bare alias: the whole joined entity
                let entry = scope
                    .entry(embed)
                    .filter(|entry| entry.join.is_some())
                    .ok_or_else(|| ApiError::malformed_query(format!("unknown embed '{embed}'")))?;
                for name in entry.schema.column_names() {
                    selection.select(&entry.alias, name);
                }
                selection.attach(scope, entry)?;
                continue;
            };

            let (alias, info) = scope.column(&format!("{alias}.{column}"))?;
            let entry = scope
                .entry(alias)
                .ok_or_else(|| ApiError::malformed_query(format!("unknown embed '{embed}'")))?;

            if entry.join.is_none() {
                narrowed = true;
                selection.select(alias, &info.name);
            } else {
                selection.select(alias, &entry.schema.primary_key);
                selection.select(alias, &info.name);
                selection.attach(scope, entry)?;
            }
        }

        if narrowed {
            selection.select_first(&root.alias, &root.schema.primary_key);
        } else {
            let all: Vec<String> = root.schema.column_names().map(ToString::to_string).collect();
            selection.columns[0].1 = all;
        }

        Ok(selection)
    }

    fn select(&mut self, alias: &str, column: &str) {
        let columns = match self.columns.iter().position(|(name, _)| name == alias) {
            Some(index) => &mut self.columns[index].1,
            None => {
                self.columns.push((alias.to_string(), Vec::new()));
                let last = self.columns.len() - 1;
                &mut self.columns[last].1
            }
        };
        if !columns.iter().any(|existing| existing == column) {
            columns.push(column.to_string());
        }
    }

    fn select_first(&mut self, alias: &str, column: &str) {
        if let Some((_, columns)) = self.columns.iter_mut().find(|(name, _)| name == alias)
            && !columns.iter().any(|existing| existing == column)
        {
            columns.insert(0, column.to_string());
        }
    }

    /// Hydrate `entry` and, transitively, every joined alias it hangs off.
    fn attach(&mut self, scope: &Scope<'_>, entry: &ScopeEntry<'_>) -> Result<(), ApiError> {
        let (Some(parent), Some(relation)) = (entry.parent.as_deref(), entry.relation.as_ref())
        else {
            return Ok(());
        };
        if self.plan.contains(&entry.alias) {
            return Ok(());
        }

        if parent != scope.root_alias && !self.plan.contains(parent) {
            let parent_entry = scope
                .entry(parent)
                .ok_or_else(|| ApiError::malformed_query(format!("unknown alias '{parent}'")))?;
            self.select(parent, &parent_entry.schema.primary_key);
            self.attach(scope, parent_entry)?;
        }

        self.select(&entry.alias, &entry.schema.primary_key);
        self.plan.push(PlanNode {
            alias: entry.alias.clone(),
            parent: parent.to_string(),
            relation: relation.name.to_string(),
            cardinality: relation.cardinality,
            primary_key: entry.schema.primary_key.clone(),
        });
        Ok(())
    }
}
