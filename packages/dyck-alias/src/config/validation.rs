//! Configuration validation
//!
//! The driver checks its configuration through `Validatable` before it
//! touches the module.

use super::error::ConfigResult;

/// A configuration that can report its own inconsistencies
///
/// # Example
/// ```rust,ignore
/// use dyck_alias::config::Validatable;
///
/// let config = AliasConfig::bare().allocator("pool_alloc");
/// config.validate()?;
/// ```
pub trait Validatable {
    /// `Ok(())` if valid, otherwise the first violation found
    fn validate(&self) -> ConfigResult<()>;
}
