//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RegistryConfig (validated, immutable)
//!     → handed to the composition root at bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes are bound once per process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, CompatConfig, ListenerConfig, MappingConfig, NamespaceConfig,
    ObservabilityConfig, RegistryConfig, TelemetryConfig, TimeoutConfig,
};
