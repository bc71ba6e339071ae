//! Configuration traits and validation shared by the engine crates

pub mod traits;
pub mod validation;

pub use traits::QuireConfig;
pub use validation::{ConfigValidator, ValidationError, ValidationResult};
