pub mod compiler;
pub mod hydrate;
pub mod schema;

pub use compiler::{CompiledSearch, compile_count, compile_search};
pub use hydrate::{HydrationPlan, PlanNode};
pub use schema::{Cardinality, ColumnInfo, RelationDescriptor, Schema, ValueKind};
