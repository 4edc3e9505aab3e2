//! Analysis configuration
//!
//! Describes how external functions are modelled (allocators, thread spawns,
//! memory copies) and a few presentation switches. Loadable from YAML:
//!
//! ```yaml
//! version: 1
//! analysis:
//!   allocators: [malloc, my_pool_alloc]
//!   spawn_functions:
//!     - { name: pthread_create, routine_arg: 2, payload_arg: 3 }
//! ```

pub mod alias_config;
pub mod error;
pub mod validation;

// Re-exports
pub use alias_config::{AliasConfig, ConfigFileV1, SpawnSignature, SUPPORTED_VERSIONS};
pub use error::{ConfigError, ConfigResult};
pub use validation::Validatable;
