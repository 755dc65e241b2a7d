//! CrudService for the shared read/write template, plus the domain operations that need
//! transactions or guards.

pub mod adopters;
pub mod adoptions;
pub mod console;
mod crud;
pub mod pets;
pub mod shelters;
pub mod upload;
mod validation;

pub use crud::{row_to_json, CrudService, DEFAULT_LIMIT};
pub use validation::RequestValidator;
pub(crate) use validation::int_value;
