pub mod catalog;
pub mod intent;
pub mod models;

pub use catalog::{CatalogError, ResponseCatalog, DEFAULT_KEY};
pub use intent::{validate_query, ValidationError, EMPTY_TEXT_MESSAGE};
pub use models::*;
