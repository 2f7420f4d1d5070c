mod factory;
mod repository;
pub mod seed;

pub use factory::MemoryBackendFactory;
pub use repository::MemoryBackend;
pub use seed::{OptionSeedLoader, OptionSeedRecord, SeedError};
