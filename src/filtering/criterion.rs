use sea_orm::{
    Value,
    sea_query::{Alias, Expr, SimpleExpr},
};
use std::fmt;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::query::schema::ValueKind;

/// Comparison operators accepted as `<property>-<operator>` suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equality (=), the default when no suffix is given
    Eq,
    /// Not equal (<>)
    Neq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// LIKE with a caller-supplied pattern
    Like,
    /// IN (comma-separated list)
    In,
    /// NOT IN (comma-separated list)
    NotIn,
    /// IS NULL, takes no value
    IsNull,
    /// IS NOT NULL, takes no value
    IsNotNull,
}

impl Operator {
    /// Parse an operator token. The older `notin`, `null` and `notnull`
    /// spellings are accepted as well.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "in" => Some(Self::In),
            "not-in" | "notin" => Some(Self::NotIn),
            "is-null" | "null" => Some(Self::IsNull),
            "is-not-null" | "notnull" => Some(Self::IsNotNull),
            _ => None,
        }
    }

    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::IsNull => "is-null",
            Self::IsNotNull => "is-not-null",
        }
    }

    /// Operators that bind a list of values
    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Operators that bind nothing
    #[must_use]
    pub fn is_nullary(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

/// The raw value of a criterion, shaped for its operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionValue {
    None,
    Scalar(String),
    List(Vec<String>),
}

/// A single filter predicate.
///
/// Values always travel as bound parameters. `parameter_key` is unique per
/// instance and only names the placeholder in the rendered predicate text
/// (see the `Display` impl), which is what ends up in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub property: String,
    pub operator: Operator,
    pub value: CriterionValue,
    pub parameter_key: String,
}

impl Criterion {
    /// Build a criterion from a raw query-string value.
    ///
    /// List operators split `raw` on commas (empty segments are dropped),
    /// nullary operators discard it.
    pub fn new(property: impl Into<String>, operator: Operator, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = if operator.is_nullary() {
            CriterionValue::None
        } else if operator.is_list() {
            CriterionValue::List(split_list(&raw))
        } else {
            CriterionValue::Scalar(raw)
        };

        Self {
            property: property.into(),
            operator,
            value,
            parameter_key: format!("p{}", Uuid::new_v4().simple()),
        }
    }

    /// Split a query-string key into property and optional operator token.
    ///
    /// The split happens on the first `-`, so `age-not-in` gives
    /// `("age", Some("not-in"))`.
    #[must_use]
    pub fn split_key(key: &str) -> (&str, Option<&str>) {
        match key.split_once('-') {
            Some((property, operator)) => (property, Some(operator)),
            None => (key, None),
        }
    }

    /// Whether the property is already qualified with an alias.
    #[must_use]
    pub fn has_prefix(&self) -> bool {
        self.property.contains('.')
    }

    /// Prefix the property with an alias: `name` becomes `o.name`.
    pub fn add_prefix(&mut self, alias: &str) {
        self.property = format!("{alias}.{}", self.property);
    }

    /// Compile to a predicate on `alias.column`, coercing bound values to the
    /// column's kind.
    ///
    /// # Errors
    ///
    /// Returns a malformed-query error when the value shape does not match the
    /// operator, which only happens for hand-built criteria.
    pub fn compile(&self, alias: &str, column: &str, kind: ValueKind) -> Result<SimpleExpr, ApiError> {
        let target = Expr::col((Alias::new(alias), Alias::new(column)));

        let expr = match (self.operator, &self.value) {
            (Operator::IsNull, _) => target.is_null(),
            (Operator::IsNotNull, _) => target.is_not_null(),
            (Operator::In, CriterionValue::List(values)) => target.is_in(coerce_all(kind, values)),
            (Operator::NotIn, CriterionValue::List(values)) => {
                target.is_not_in(coerce_all(kind, values))
            }
            (Operator::Like, CriterionValue::Scalar(pattern)) => target.like(pattern.as_str()),
            (Operator::Eq, CriterionValue::Scalar(raw)) => target.eq(kind.coerce(raw)),
            (Operator::Neq, CriterionValue::Scalar(raw)) => target.ne(kind.coerce(raw)),
            (Operator::Gt, CriterionValue::Scalar(raw)) => target.gt(kind.coerce(raw)),
            (Operator::Gte, CriterionValue::Scalar(raw)) => target.gte(kind.coerce(raw)),
            (Operator::Lt, CriterionValue::Scalar(raw)) => target.lt(kind.coerce(raw)),
            (Operator::Lte, CriterionValue::Scalar(raw)) => target.lte(kind.coerce(raw)),
            (operator, value) => {
                return Err(ApiError::malformed_query(format!(
                    "operator '{}' cannot take {value:?} on '{}'",
                    operator.token(),
                    self.property
                )));
            }
        };

        Ok(expr)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sql = self.operator.sql();
        match self.operator {
            Operator::IsNull | Operator::IsNotNull => write!(f, "{} {sql}", self.property),
            Operator::In | Operator::NotIn => {
                write!(f, "{} {sql} (:...{})", self.property, self.parameter_key)
            }
            _ => write!(f, "{} {sql} :{}", self.property, self.parameter_key),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn coerce_all(kind: ValueKind, values: &[String]) -> Vec<Value> {
    values.iter().map(|raw| kind.coerce(raw)).collect()
}
