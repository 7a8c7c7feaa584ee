//! # restcrate
//!
//! Turn arbitrary REST query strings into safe Sea-ORM searches.
//!
//! A query string such as
//!
//! ```text
//! GET /people?name-like=A%25&age-gte=18&join=team-l&embed=team&sort=-age&page=1&per_page=10
//! ```
//!
//! is extracted into a [`SearchRequest`], compiled against the resource's
//! [`Schema`](query::Schema) into a parameterized statement, executed, and the
//! flat rows are folded back into nested documents. With a pager the unpaged
//! total travels in the `X-REST-TOTAL` header, and `function-projection`
//! evaluates computed properties into each row's `_fn` container.
//!
//! ## Query keys
//!
//! | key | short | effect |
//! |---|---|---|
//! | `page`, `per_page` | `_p`, `_pp` | paging, one-based |
//! | `sort` | `_s` | `name,-age` |
//! | `mode` | `_m` | `and` (default) or `or` |
//! | `join` | `_j` | `team,team.members-l` |
//! | `embed` | `_e` | `team,o.age` |
//! | `function-projection` | `_fn` | `label,items.total` |
//! | `q` | `_q` | free-text search |
//!
//! Every other key is a criterion: `<property>[-<operator>]=<value>`.
//!
//! ## Implementing a resource
//!
//! ```rust,ignore
//! use restcrate::{RestResource, rest_router};
//!
//! struct People;
//!
//! #[async_trait::async_trait]
//! impl RestResource for People {
//!     type EntityType = person::Entity;
//!     type ModelType = person::Model;
//!     type ColumnType = person::Column;
//!     type ActiveModelType = person::ActiveModel;
//!     type Row = PersonRow;
//!
//!     const ID_COLUMN: person::Column = person::Column::Id;
//!     const RESOURCE_NAME_SINGULAR: &'static str = "person";
//!     const RESOURCE_NAME_PLURAL: &'static str = "people";
//!
//!     fn relations() -> Vec<RelationDescriptor> {
//!         vec![RelationDescriptor::new(
//!             "team",
//!             Cardinality::One,
//!             person::Column::TeamId,
//!             team::Column::Id,
//!             || Schema::of::<team::Entity>(vec![]),
//!         )]
//!     }
//! }
//!
//! let app = axum::Router::new()
//!     .nest("/people", rest_router::<People>())
//!     .with_state(db);
//! ```

pub mod core;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod projection;
pub mod query;
pub mod routes;
pub mod validation;

pub use crate::core::{Page, RestResource};
pub use errors::ApiError;
pub use filtering::{
    Criterion, CriterionValue, Direction, Join, JoinKind, Mode, Operator, Order, Pager,
    SearchRequest,
};
pub use models::SearchParams;
pub use projection::{FnResults, Invocable, Related, project};
pub use query::{Cardinality, RelationDescriptor, Schema};
pub use routes::rest_router;
pub use validation::{Operation, ValidationError, ValidationErrors};

// Re-export for implementors of `RestResource`
pub use async_trait::async_trait;
