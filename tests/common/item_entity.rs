use restcrate::{FnResults, Invocable, RestResource, async_trait};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub person_id: i32,
    pub label: String,
    pub price: i32,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(rename = "_fn", default, skip_serializing_if = "Option::is_none")]
    pub fn_results: Option<FnResults>,
}

impl Item {
    pub fn total(&self) -> i32 {
        self.price.unwrap_or_default() * self.quantity.unwrap_or_default()
    }
}

impl Invocable for Item {
    fn invoke(&self, name: &str) -> Option<serde_json::Value> {
        match name {
            "total" => Some(json!(self.total())),
            _ => None,
        }
    }

    fn fn_results(&mut self) -> &mut Option<FnResults> {
        &mut self.fn_results
    }
}

#[async_trait]
impl RestResource for Item {
    type EntityType = Entity;
    type ModelType = Model;
    type ColumnType = Column;
    type ActiveModelType = ActiveModel;
    type Row = Item;

    const ID_COLUMN: Column = Column::Id;
    const RESOURCE_NAME_SINGULAR: &'static str = "item";
    const RESOURCE_NAME_PLURAL: &'static str = "items";
}
