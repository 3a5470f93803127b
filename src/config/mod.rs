//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → handed to ClientBuilder
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a client is built from it
//! - All fields have defaults to allow minimal configs
//! - A missing `[retry]` or `[circuit_breaker]` table disables that layer

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::CircuitBreakerConfig;
pub use schema::ClientConfig;
pub use schema::RetryConfig;
pub use validation::{validate_config, ValidationError};
