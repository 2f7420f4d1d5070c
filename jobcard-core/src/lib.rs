pub mod backend;
pub mod calculations;
pub mod cascade;
pub mod fields;
pub mod models;
pub mod serials;
pub mod session;
pub mod wizard;

pub use backend::{BackendConfig, BackendError, BackendRegistry, JobCardBackend};
pub use cascade::{CascadeLevel, OptionCascade};
pub use models::*;
pub use session::{JobCardSession, SessionError};
