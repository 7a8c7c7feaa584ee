use restcrate::validation::validators::{
    validate_integer_field, validate_length, validate_range, validate_required_field,
};
use restcrate::validation::{Operation, ValidationError, ValidationErrors, entity_exists};
use restcrate::{
    Cardinality, FnResults, Invocable, Related, RelationDescriptor, RestResource, Schema,
    async_trait,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::item_entity::{self, Item};
use super::team_entity::{self, Team};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "people")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub team_id: Option<i32>,
    pub created: Option<DateTimeUtc>,
    pub updated: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn relations() -> Vec<RelationDescriptor> {
    vec![
        RelationDescriptor::new(
            "team",
            Cardinality::One,
            Column::TeamId,
            team_entity::Column::Id,
            || Schema::of::<team_entity::Entity>(team_entity::relations()),
        ),
        RelationDescriptor::new(
            "items",
            Cardinality::Many,
            Column::Id,
            item_entity::Column::PersonId,
            || Schema::of::<item_entity::Entity>(vec![]),
        ),
    ]
}

/// A person as returned by the API. Timestamps stay on the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Person {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Box<Team>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(rename = "_fn", default, skip_serializing_if = "Option::is_none")]
    pub fn_results: Option<FnResults>,
}

impl Person {
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            self.name.as_deref().unwrap_or("?"),
            self.age.unwrap_or_default()
        )
    }
}

impl Invocable for Person {
    fn invoke(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "label" => Some(json!(self.label())),
            "is_adult" => Some(json!(self.age.is_some_and(|age| age >= 18))),
            _ => None,
        }
    }

    fn related(&mut self, name: &str) -> Option<Related<'_>> {
        match name {
            "team" => Some(Related::one(self.team.as_deref_mut())),
            "items" => Some(Related::many(&mut self.items)),
            _ => None,
        }
    }

    fn fn_results(&mut self) -> &mut Option<FnResults> {
        &mut self.fn_results
    }
}

#[async_trait]
impl RestResource for Person {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type Row = Person;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "person";
    const RESOURCE_NAME_PLURAL: &'static str = "people";
    const CREATED_COLUMN: Option<Column> = Some(Column::Created);
    const UPDATED_COLUMN: Option<Column> = Some(Column::Updated);

    fn relations() -> Vec<RelationDescriptor> {
        relations()
    }

    fn searchable_columns() -> Vec<Column> {
        vec![Column::Name]
    }

    async fn validate(
        db: &DatabaseConnection,
        payload: &serde_json::Value,
        operation: Operation,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if operation == Operation::Create {
            errors.check(validate_required_field(payload, "name"));
            errors.check(validate_required_field(payload, "age"));
        }
        if let Some(name) = payload.get("name").and_then(serde_json::Value::as_str) {
            errors.check(validate_length("name", name, Some(1), Some(64)));
        }
        errors.check(validate_integer_field(payload, "age"));
        if let Some(age) = payload.get("age").and_then(serde_json::Value::as_i64) {
            errors.check(validate_range("age", age, Some(0), Some(150)));
        }

        if let Some(team_id) = payload.get("team_id").and_then(serde_json::Value::as_i64) {
            let exists = match i32::try_from(team_id) {
                Ok(id) => entity_exists::<Team>(db, &[id]).await.unwrap_or(false),
                Err(_) => false,
            };
            if !exists {
                errors.add(ValidationError::new("team_id", "Team does not exist"));
            }
        }

        errors.result()
    }
}
