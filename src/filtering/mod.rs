pub mod criterion;
pub mod join;
pub mod pagination;
pub mod query_parser;
pub mod search;
pub mod sort;

pub use criterion::{Criterion, CriterionValue, Operator};
pub use join::{Join, JoinKind};
pub use pagination::{DEFAULT_PER_PAGE, Pager, TOTAL_COUNT_HEADER, total_count_header};
pub use query_parser::{Mode, SearchRequest};
pub use search::{build_free_text_condition, escape_like_wildcards};
pub use sort::{Direction, Order};
