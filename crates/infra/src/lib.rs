//! Infrastructure layer: repositories (in-memory + Postgres), configuration
//! and the application workflows that compose them.

pub mod config;
pub mod repository;
pub mod workflow;

pub use config::{AppConfig, ConfigError};
pub use repository::{
    ClaimRepository, InMemoryStore, ItemRepository, PostgresStore, RepositoryError, UserRepository,
};
pub use workflow::{Repositories, WorkflowError, WorkflowResult};
