//! Shared types for the FarmCom chat workspace.

pub mod defaults;
pub mod errors;

pub use errors::{ConfigError, FarmcomError};

pub type Result<T> = std::result::Result<T, FarmcomError>;
