//! Folds the flat, labelled rows of a joined search back into one JSON
//! document per root entity.
//!
//! Roots keep the order in which their primary key first appears. A `One`
//! relation becomes an object (or `null` when a left join matched nothing),
//! a `Many` relation becomes an array without duplicates.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::compiler::LABEL_SEPARATOR;
use super::schema::Cardinality;
use crate::errors::ApiError;

/// A joined alias that is returned nested under its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    pub alias: String,
    pub parent: String,
    pub relation: String,
    pub cardinality: Cardinality,
    pub primary_key: String,
}

/// Which aliases to nest, in an order where parents come first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationPlan {
    root_alias: String,
    root_primary_key: String,
    nodes: Vec<PlanNode>,
}

impl HydrationPlan {
    #[must_use]
    pub fn new(root_alias: &str, root_primary_key: &str) -> Self {
        Self {
            root_alias: root_alias.to_string(),
            root_primary_key: root_primary_key.to_string(),
            nodes: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, alias: &str) -> bool {
        self.nodes.iter().any(|node| node.alias == alias)
    }

    pub fn push(&mut self, node: PlanNode) {
        self.nodes.push(node);
    }

    #[must_use]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Fold rows into documents without deserializing them.
    ///
    /// # Errors
    ///
    /// Fails when a row is not an object, lacks the root primary key, or a
    /// node's parent alias is not part of the plan.
    pub fn fold(&self, rows: Vec<Value>) -> Result<Vec<Value>, ApiError> {
        let mut roots: Vec<Node> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let Value::Object(row) = row else {
                return Err(ApiError::internal("Unexpected row shape", None));
            };
            let mut columns = split_labels(row);

            let mut root_fields = columns.remove(&self.root_alias).unwrap_or_default();
            let root_key = root_fields
                .get(&self.root_primary_key)
                .and_then(key_of)
                .ok_or_else(|| {
                    ApiError::internal("Row without primary key", Some(self.root_alias.clone()))
                })?;

            let position = match index.get(&root_key) {
                Some(&position) => position,
                None => {
                    roots.push(Node::new(root_key.clone(), std::mem::take(&mut root_fields)));
                    index.insert(root_key, roots.len() - 1);
                    roots.len() - 1
                }
            };
            let root = &mut roots[position];

            // path from the root to each alias present in this row
            let mut paths: HashMap<&str, Vec<(&str, String)>> = HashMap::new();
            paths.insert(self.root_alias.as_str(), Vec::new());

            for node in &self.nodes {
                let Some(parent_path) = paths.get(node.parent.as_str()).cloned() else {
                    if !self.contains(&node.parent) && node.parent != self.root_alias {
                        return Err(ApiError::internal(
                            "Hydration plan out of order",
                            Some(format!("'{}' before its parent '{}'", node.alias, node.parent)),
                        ));
                    }
                    continue;
                };
                let Some(parent) = root.descend(&parent_path) else {
                    continue;
                };

                let fields = columns.remove(&node.alias).unwrap_or_default();
                let key = fields.get(&node.primary_key).and_then(key_of);
                let slot = parent.slot(&node.relation, node.cardinality);

                let Some(key) = key else {
                    // left join without a match: the slot stays null / empty
                    continue;
                };
                slot.insert(key.clone(), fields);

                let mut path = parent_path;
                path.push((node.relation.as_str(), key));
                paths.insert(node.alias.as_str(), path);
            }
        }

        Ok(roots.into_iter().map(Node::into_value).collect())
    }

    /// Fold rows and deserialize each document into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`HydrationPlan::fold`], plus documents that do not fit `T`.
    pub fn hydrate<T: DeserializeOwned>(&self, rows: Vec<Value>) -> Result<Vec<T>, ApiError> {
        self.fold(rows)?
            .into_iter()
            .map(|document| {
                serde_json::from_value(document)
                    .map_err(|e| ApiError::internal("Failed to read row", Some(e.to_string())))
            })
            .collect()
    }
}

/// Group `alias__column` labels by alias.
fn split_labels(row: Map<String, Value>) -> HashMap<String, Map<String, Value>> {
    let mut grouped: HashMap<String, Map<String, Value>> = HashMap::new();
    for (label, value) in row {
        if let Some((alias, column)) = label.split_once(LABEL_SEPARATOR) {
            grouped
                .entry(alias.to_string())
                .or_default()
                .insert(column.to_string(), value);
        }
    }
    grouped
}

/// Identity of a row within its relation; `None` for a missing key.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug)]
struct Node {
    key: String,
    fields: Map<String, Value>,
    slots: Vec<(String, Slot)>,
}

#[derive(Debug)]
enum Slot {
    One(Option<Box<Node>>),
    Many(Vec<Node>),
}

impl Slot {
    fn insert(&mut self, key: String, fields: Map<String, Value>) {
        match self {
            Self::One(existing) => {
                if existing.is_none() {
                    *existing = Some(Box::new(Node::new(key, fields)));
                }
            }
            Self::Many(children) => {
                if !children.iter().any(|child| child.key == key) {
                    children.push(Node::new(key, fields));
                }
            }
        }
    }
}

impl Node {
    fn new(key: String, fields: Map<String, Value>) -> Self {
        Self {
            key,
            fields,
            slots: Vec::new(),
        }
    }

    fn slot(&mut self, relation: &str, cardinality: Cardinality) -> &mut Slot {
        let position = match self.slots.iter().position(|(name, _)| name == relation) {
            Some(position) => position,
            None => {
                let slot = match cardinality {
                    Cardinality::One => Slot::One(None),
                    Cardinality::Many => Slot::Many(Vec::new()),
                };
                self.slots.push((relation.to_string(), slot));
                self.slots.len() - 1
            }
        };
        &mut self.slots[position].1
    }

    fn descend(&mut self, path: &[(&str, String)]) -> Option<&mut Self> {
        let Some(((relation, key), rest)) = path.split_first() else {
            return Some(self);
        };
        let (_, slot) = self.slots.iter_mut().find(|(name, _)| name == relation)?;
        let child = match slot {
            Slot::One(Some(child)) if child.key == *key => &mut **child,
            Slot::One(_) => return None,
            Slot::Many(children) => children.iter_mut().find(|child| child.key == *key)?,
        };
        child.descend(rest)
    }

    fn into_value(self) -> Value {
        let mut fields = self.fields;
        for (relation, slot) in self.slots {
            let value = match slot {
                Slot::One(None) => Value::Null,
                Slot::One(Some(child)) => child.into_value(),
                Slot::Many(children) => {
                    Value::Array(children.into_iter().map(Node::into_value).collect())
                }
            };
            fields.insert(relation, value);
        }
        Value::Object(fields)
    }
}
