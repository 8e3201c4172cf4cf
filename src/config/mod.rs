//! Configuration module
//!
//! Loads and validates the YAML document describing a reveal page: the
//! countdown target, stage timings, the final artifact and the parameters
//! handed to each presentation collaborator.

pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoaderOptions};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
