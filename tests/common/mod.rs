#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use restcrate::rest_router;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::prelude::*;
use tower::ServiceExt;

pub mod item_entity;
pub mod person_entity;
pub mod team_entity;

use item_entity::Item;
use person_entity::Person;
use team_entity::Team;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // Debug level includes the generated SQL
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let db = Database::connect(&url).await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Two teams, five people (two without a team) and three items.
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;

    for (id, name) in [(1, "Blue"), (2, "Red")] {
        team_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
        }
        .insert(&db)
        .await?;
    }

    for (id, name, age, team_id) in [
        (1, "Ann", 34, Some(1)),
        (2, "Bob", 17, Some(1)),
        (3, "Cid", 52, None),
        (4, "Dee", 25, Some(2)),
        (5, "foo", 20, None),
    ] {
        person_entity::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            age: Set(age),
            team_id: Set(team_id),
            created: Set(None),
            updated: Set(None),
        }
        .insert(&db)
        .await?;
    }

    for (id, person_id, label, price, quantity) in
        [(1, 1, "pen", 2, 3), (2, 1, "ink", 5, 1), (3, 4, "pad", 1, 4)]
    {
        item_entity::ActiveModel {
            id: Set(id),
            person_id: Set(person_id),
            label: Set(label.to_string()),
            price: Set(price),
            quantity: Set(quantity),
        }
        .insert(&db)
        .await?;
    }

    Ok(db)
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .nest("/people", rest_router::<Person>())
        .nest("/teams", rest_router::<Team>())
        .nest("/items", rest_router::<Item>())
        .with_state(db);

    Router::new().nest("/api/v1", api)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    payload: &serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(payload).unwrap()))
            .unwrap(),
    )
    .await
}

pub async fn body_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateTables)]
    }
}

pub struct CreateTables;

#[async_trait::async_trait]
impl MigrationName for CreateTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_people_teams_items"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Teams::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teams::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teams::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(People::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(People::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(People::Name).string().not_null())
                    .col(ColumnDef::new(People::Age).integer().not_null())
                    .col(ColumnDef::new(People::TeamId).integer().null())
                    .col(ColumnDef::new(People::Created).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(People::Updated).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::PersonId).integer().not_null())
                    .col(ColumnDef::new(Items::Label).string().not_null())
                    .col(ColumnDef::new(Items::Price).integer().not_null())
                    .col(ColumnDef::new(Items::Quantity).integer().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(People::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Teams::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Teams {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum People {
    Table,
    Id,
    Name,
    Age,
    TeamId,
    Created,
    Updated,
}

#[derive(DeriveIden)]
enum Items {
    Table,
    Id,
    PersonId,
    Label,
    Price,
    Quantity,
}
