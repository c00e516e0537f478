pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{load_config, load_ingress, resolve_ingress_path};
pub use models::*;
pub use validation::{ServerConfigValidator, ValidationError, ValidationResult};
