use crate::core::RestResource;
use crate::errors::ApiError;
use crate::filtering::{SearchRequest, total_count_header};
use crate::projection::project;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use hyper::HeaderMap;
use sea_orm::{DatabaseConnection, JsonValue};
use std::collections::HashMap;

// Search a resource; adds the total count header when paged.
pub async fn search<T>(
    Query(query): Query<HashMap<String, String>>,
    State(db): State<DatabaseConnection>,
) -> Result<(HeaderMap, Json<Vec<T::Row>>), ApiError>
where
    T: RestResource,
{
    let request = SearchRequest::from_query(&query, T::ROOT_ALIAS)?;
    let page = T::list(&db, &request).await?;
    let headers = page.total.map(total_count_header).unwrap_or_default();
    Ok((headers, Json(page.rows)))
}

// Get one resource; honours join, embed and function-projection.
pub async fn get_one<T>(
    Path(id): Path<i32>,
    Query(query): Query<HashMap<String, String>>,
    State(db): State<DatabaseConnection>,
) -> Result<Json<T::Row>, ApiError>
where
    T: RestResource,
{
    let request = SearchRequest::from_query(&query, T::ROOT_ALIAS)?;
    let mut row = T::get(&db, id, &request.embeds, &request.joins).await?;
    project(std::slice::from_mut(&mut row), &request.functions)?;
    Ok(Json(row))
}

// Create one resource from an untyped payload.
pub async fn create_one<T>(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<JsonValue>,
) -> Result<(StatusCode, Json<T::Row>), ApiError>
where
    T: RestResource,
{
    let created = T::create(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// Merge a partial payload into one resource.
pub async fn update_one<T>(
    Path(id): Path<i32>,
    Query(query): Query<HashMap<String, String>>,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<JsonValue>,
) -> Result<Json<T::Row>, ApiError>
where
    T: RestResource,
{
    let request = SearchRequest::from_query(&query, T::ROOT_ALIAS)?;
    let mut row = T::update(&db, id, payload, &request.embeds, &request.joins).await?;
    project(std::slice::from_mut(&mut row), &request.functions)?;
    Ok(Json(row))
}

/// Deletes a single resource by its id.
///
/// # Errors
/// - 404 when nothing has that id, 500 on a database failure.
pub async fn delete_one<T>(
    Path(id): Path<i32>,
    State(db): State<DatabaseConnection>,
) -> Result<StatusCode, ApiError>
where
    T: RestResource,
{
    T::delete(&db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// All five handlers for `T`, ready to be nested under a path.
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api/v1/people", rest_router::<Person>())
///     .with_state(db);
/// ```
pub fn rest_router<T: RestResource>() -> Router<DatabaseConnection> {
    Router::new()
        .route("/", get(search::<T>).post(create_one::<T>))
        .route(
            "/{id}",
            get(get_one::<T>).put(update_one::<T>).delete(delete_one::<T>),
        )
}
