//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod assistant;
mod logging;
mod model;

pub use assistant::*;
pub use logging::*;
pub use model::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmcomConfig {
    pub model: ModelConfig,
    pub assistant: AssistantConfig,
    pub logging: LoggingConfig,
}
