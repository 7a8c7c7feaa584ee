use restcrate::{
    Cardinality, FnResults, Invocable, Related, RelationDescriptor, RestResource, Schema,
    async_trait,
};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::person_entity::{self, Person};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn relations() -> Vec<RelationDescriptor> {
    vec![RelationDescriptor::new(
        "members",
        Cardinality::Many,
        Column::Id,
        person_entity::Column::TeamId,
        || Schema::of::<person_entity::Entity>(person_entity::relations()),
    )]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Person>,
    #[serde(rename = "_fn", default, skip_serializing_if = "Option::is_none")]
    pub fn_results: Option<FnResults>,
}

impl Team {
    pub fn shout(&self) -> String {
        self.name.as_deref().unwrap_or_default().to_uppercase()
    }
}

impl Invocable for Team {
    fn invoke(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "shout" => Some(json!(self.shout())),
            _ => None,
        }
    }

    fn related(&mut self, name: &str) -> Option<Related<'_>> {
        match name {
            "members" => Some(Related::many(&mut self.members)),
            _ => None,
        }
    }

    fn fn_results(&mut self) -> &mut Option<FnResults> {
        &mut self.fn_results
    }
}

#[async_trait]
impl RestResource for Team {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type Row = Team;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "team";
    const RESOURCE_NAME_PLURAL: &'static str = "teams";

    fn relations() -> Vec<RelationDescriptor> {
        relations()
    }

    fn searchable_columns() -> Vec<Column> {
        vec![Column::Name]
    }
}
