pub mod factory;
pub mod repository;
pub mod validator;

pub use factory::{BackendConfig, BackendFactory, BackendRegistry};
pub use repository::{BackendError, JobCardBackend, UniquenessCheck};
pub use validator::{FieldRule, FieldSchema, SchemaValidator, ValidationReport};
