pub mod traits;

pub use traits::{Page, RestResource};
