//! Function projection: computed properties evaluated on fetched rows.
//!
//! A row type exposes its computed properties and relations through
//! [`Invocable`]. For `function-projection=label,items.total` every row gets
//! `_fn.label`, and every element of `items` gets `_fn.total`. Persisted
//! fields are never touched.

use serde_json::{Map, Value};

use crate::errors::ApiError;

/// Container for computed values, serialized as `_fn`.
pub type FnResults = Map<String, Value>;

/// A related row or rows, as seen by the projector.
pub enum Related<'a> {
    /// Known relation that was not loaded, or a null to-one relation
    Absent,
    One(&'a mut dyn Invocable),
    Many(Vec<&'a mut dyn Invocable>),
}

impl<'a> Related<'a> {
    pub fn one<T: Invocable + 'a>(value: Option<&'a mut T>) -> Self {
        match value {
            Some(value) => Self::One(value),
            None => Self::Absent,
        }
    }

    pub fn many<T: Invocable + 'a>(values: &'a mut [T]) -> Self {
        Self::Many(
            values
                .iter_mut()
                .map(|value| value as &mut dyn Invocable)
                .collect(),
        )
    }
}

/// Rows that can evaluate computed properties by name.
///
/// ```rust,ignore
/// impl Invocable for Person {
///     fn invoke(&self, name: &str) -> Option<Value> {
///         match name {
///             "label" => Some(json!(self.label())),
///             _ => None,
///         }
///     }
///
///     fn related(&mut self, name: &str) -> Option<Related<'_>> {
///         match name {
///             "team" => Some(Related::one(self.team.as_mut())),
///             "items" => Some(Related::many(&mut self.items)),
///             _ => None,
///         }
///     }
///
///     fn fn_results(&mut self) -> &mut Option<FnResults> {
///         &mut self.fn_results
///     }
/// }
/// ```
pub trait Invocable {
    /// Evaluate a computed property; `None` when no property has that name.
    fn invoke(&self, name: &str) -> Option<Value>;

    /// Relation by name; `None` when no relation has that name.
    fn related(&mut self, name: &str) -> Option<Related<'_>> {
        let _ = name;
        None
    }

    fn fn_results(&mut self) -> &mut Option<FnResults>;
}

/// Evaluate every path on every row.
///
/// # Errors
///
/// Returns a malformed-query error for an unknown computed property or
/// relation.
pub fn project<T: Invocable>(rows: &mut [T], paths: &[String]) -> Result<(), ApiError> {
    if paths.is_empty() {
        return Ok(());
    }
    for row in rows.iter_mut() {
        for path in paths {
            fill(row, path)?;
        }
    }
    Ok(())
}

fn fill(row: &mut dyn Invocable, path: &str) -> Result<(), ApiError> {
    let Some((head, rest)) = path.split_once('.') else {
        let value = row
            .invoke(path)
            .ok_or_else(|| ApiError::malformed_query(format!("unknown computed property '{path}'")))?;
        row.fn_results()
            .get_or_insert_with(Map::new)
            .insert(path.to_string(), value);
        return Ok(());
    };

    match row.related(head) {
        None => Err(ApiError::malformed_query(format!("unknown relation '{head}' in '{path}'"))),
        Some(Related::Absent) => {
            tracing::debug!(relation = head, path, "skipping projection on absent relation");
            Ok(())
        }
        Some(Related::One(child)) => fill(child, rest),
        Some(Related::Many(children)) => {
            for child in children {
                fill(child, rest)?;
            }
            Ok(())
        }
    }
}
