use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait,
    DatabaseConnection, EntityTrait, FromQueryResult, IdenStatic, IntoActiveModel,
    Iterable, JsonValue, ModelTrait, QueryFilter, TryIntoModel, Value,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Map;

use crate::errors::ApiError;
use crate::filtering::{Criterion, Join, Operator, SearchRequest};
use crate::projection::{Invocable, project};
use crate::query::compiler::COUNT_LABEL;
use crate::query::{RelationDescriptor, Schema, compile_count, compile_search};
use crate::validation::{Operation, ValidationError, ValidationErrors};

/// One page of a search, with the unpaged total when a pager was given.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: Option<u64>,
}

/// A searchable, writable resource backed by a Sea-ORM entity.
///
/// Implementors name their entity types and a `Row` type the search results
/// are read into; every operation has a default implementation.
///
/// `Row` is deserialized from the hydrated JSON document, so its persisted
/// fields should tolerate being absent (`Option` plus `#[serde(default)]`)
/// when a query narrows the projection.
#[async_trait]
pub trait RestResource: Sized + Send + Sync + 'static {
    type EntityType: EntityTrait<Model = Self::ModelType, Column = Self::ColumnType> + Sync;
    type ModelType: ModelTrait
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModelType>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync;
    type ColumnType: ColumnTrait + Send + Sync;
    type ActiveModelType: ActiveModelTrait<Entity = Self::EntityType>
        + ActiveModelBehavior
        + TryIntoModel<Self::ModelType>
        + Send
        + Sync;
    type Row: Serialize + DeserializeOwned + Invocable + Send + Sync;

    const ID_COLUMN: Self::ColumnType;
    /// Alias of the root entity in every query
    const ROOT_ALIAS: &'static str = "o";
    const RESOURCE_NAME_SINGULAR: &'static str;
    const RESOURCE_NAME_PLURAL: &'static str;
    /// Set to the current time on insert; must be a `DateTimeUtc` column
    const CREATED_COLUMN: Option<Self::ColumnType> = None;
    /// Set to the current time on every update; must be a `DateTimeUtc` column
    const UPDATED_COLUMN: Option<Self::ColumnType> = None;

    /// Relations that can be joined by name
    #[must_use]
    fn relations() -> Vec<RelationDescriptor> {
        vec![]
    }

    /// Root columns searched by the free-text `q` parameter
    #[must_use]
    fn searchable_columns() -> Vec<Self::ColumnType> {
        vec![]
    }

    #[must_use]
    fn schema() -> Schema {
        Schema::of::<Self::EntityType>(Self::relations())
    }

    /// Field rules for untyped payloads, run before any write.
    async fn validate(
        db: &DatabaseConnection,
        payload: &JsonValue,
        operation: Operation,
    ) -> Result<(), ValidationErrors> {
        let _ = (db, payload, operation);
        Ok(())
    }

    /// Run a search and return hydrated rows. Ignores function projection.
    async fn search(
        db: &DatabaseConnection,
        request: &SearchRequest,
    ) -> Result<Vec<Self::Row>, ApiError> {
        let (statement, plan) = {
            let qualified = request.qualified(Self::ROOT_ALIAS);
            let compiled = compile_search(
                &Self::schema(),
                &qualified,
                Self::ROOT_ALIAS,
                &searchable_names::<Self>(),
            )?;
            (db.get_database_backend().build(&compiled.statement), compiled.plan)
        };
        tracing::debug!(resource = Self::RESOURCE_NAME_PLURAL, sql = %statement.sql, "search");

        let rows = JsonValue::find_by_statement(statement).all(db).await?;
        plan.hydrate(rows)
    }

    /// Count distinct root rows matching the request's criteria, joins and
    /// free text. Pager, orders and embeds are ignored.
    async fn count(db: &DatabaseConnection, request: &SearchRequest) -> Result<u64, ApiError> {
        let statement = {
            let qualified = request.qualified(Self::ROOT_ALIAS);
            let select = compile_count(
                &Self::schema(),
                &qualified,
                Self::ROOT_ALIAS,
                &searchable_names::<Self>(),
            )?;
            db.get_database_backend().build(&select)
        };
        tracing::debug!(resource = Self::RESOURCE_NAME_PLURAL, sql = %statement.sql, "count");

        let row = db
            .query_one(statement)
            .await?
            .ok_or_else(|| ApiError::internal("Count returned no row", None))?;
        let total: i64 = row.try_get("", COUNT_LABEL)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Search, count when paged, then evaluate the requested functions.
    async fn list(
        db: &DatabaseConnection,
        request: &SearchRequest,
    ) -> Result<Page<Self::Row>, ApiError> {
        let mut rows = Self::search(db, request).await?;
        let total = if request.pager.is_paged() {
            Some(Self::count(db, request).await?)
        } else {
            None
        };
        project(&mut rows, &request.functions)?;
        Ok(Page { rows, total })
    }

    /// Fetch one row by id with the given embeds and joins.
    async fn get(
        db: &DatabaseConnection,
        id: i32,
        embeds: &[String],
        joins: &[Join],
    ) -> Result<Self::Row, ApiError> {
        let request = SearchRequest {
            criteria: vec![Criterion::new(
                Self::ID_COLUMN.as_str(),
                Operator::Eq,
                id.to_string(),
            )],
            embeds: embeds.to_vec(),
            joins: joins.to_vec(),
            ..SearchRequest::default()
        };

        let mut rows = Self::search(db, &request).await?;
        match (rows.pop(), rows.is_empty()) {
            (Some(row), true) => Ok(row),
            _ => Err(ApiError::not_found(
                Self::RESOURCE_NAME_SINGULAR,
                Some(id.to_string()),
            )),
        }
    }

    async fn create(db: &DatabaseConnection, data: JsonValue) -> Result<Self::Row, ApiError> {
        Self::validate(db, &data, Operation::Create).await?;

        let placeholder = JsonValue::Object(Map::from_iter([(
            Self::ID_COLUMN.as_str().to_string(),
            JsonValue::from(0),
        )]));
        let mut active = merge_payload::<Self>(
            Self::ActiveModelType::new(),
            placeholder,
            data,
            Some(Self::ID_COLUMN),
        )?;
        if let Some(column) = Self::CREATED_COLUMN {
            active.try_set(column, Utc::now().into())?;
        }
        let model = active.insert(db).await?;

        let saved: Self::ActiveModelType = model.into_active_model();
        let id = record_id(saved.get(Self::ID_COLUMN).into_value()).ok_or_else(|| {
            ApiError::internal(
                "Inserted row has no integer id",
                Some(Self::RESOURCE_NAME_SINGULAR.to_string()),
            )
        })?;
        tracing::debug!(resource = Self::RESOURCE_NAME_SINGULAR, id, "created");

        Self::get(db, id, &[], &[]).await
    }

    async fn update(
        db: &DatabaseConnection,
        id: i32,
        data: JsonValue,
        embeds: &[String],
        joins: &[Join],
    ) -> Result<Self::Row, ApiError> {
        Self::get(db, id, embeds, joins).await?;
        Self::validate(db, &data, Operation::Update).await?;

        let model = Self::EntityType::find()
            .filter(Self::ID_COLUMN.eq(id))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found(Self::RESOURCE_NAME_SINGULAR, Some(id.to_string())))?;

        let base = serde_json::to_value(&model)
            .map_err(|err| ApiError::internal("Failed to serialize model", Some(err.to_string())))?;
        let mut active = merge_payload::<Self>(
            model.into_active_model(),
            base,
            data,
            Some(Self::ID_COLUMN),
        )?;
        if let Some(column) = Self::UPDATED_COLUMN {
            active.try_set(column, Utc::now().into())?;
        }
        active.update(db).await?;

        Self::get(db, id, embeds, joins).await
    }

    async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ApiError> {
        Self::get(db, id, &[], &[]).await?;
        Self::EntityType::delete_many()
            .filter(Self::ID_COLUMN.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }
}

fn searchable_names<R: RestResource>() -> Vec<String> {
    R::searchable_columns()
        .iter()
        .map(|column| column.as_str().to_string())
        .collect()
}

/// Lay `payload` over `base`, read the result as a model, then copy the
/// payload's columns into `target`. `skip` is dropped from the payload and
/// never written.
fn merge_payload<R: RestResource>(
    mut target: R::ActiveModelType,
    base: JsonValue,
    payload: JsonValue,
    skip: Option<R::ColumnType>,
) -> Result<R::ActiveModelType, ApiError> {
    let JsonValue::Object(mut fields) = payload else {
        return Err(ApiError::validation_failed(vec![ValidationError::new(
            "payload",
            "expected a JSON object",
        )]));
    };
    if let Some(skipped) = skip {
        fields.remove(skipped.as_str());
    }
    let provided: Vec<String> = fields.keys().cloned().collect();

    let mut merged = match base {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(fields);
    let model: R::ModelType = serde_json::from_value(JsonValue::Object(merged))
        .map_err(|err| {
            ApiError::validation_failed(vec![ValidationError::new("payload", err.to_string())])
        })?;
    let snapshot: R::ActiveModelType = model.into_active_model();

    for column in R::ColumnType::iter() {
        let name = column.as_str();
        if !provided.iter().any(|key| key == name) {
            continue;
        }
        if let ActiveValue::Set(value) | ActiveValue::Unchanged(value) = snapshot.get(column) {
            target.try_set(column, value)?;
        }
    }
    Ok(target)
}

fn record_id(value: Option<Value>) -> Option<i32> {
    match value? {
        Value::Int(Some(v)) => Some(v),
        Value::SmallInt(Some(v)) => Some(i32::from(v)),
        Value::BigInt(Some(v)) => i32::try_from(v).ok(),
        Value::Unsigned(Some(v)) => i32::try_from(v).ok(),
        Value::BigUnsigned(Some(v)) => i32::try_from(v).ok(),
        _ => None,
    }
}
