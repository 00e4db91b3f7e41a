/*!
 * Core Module
 * Fundamental types, error handling, guards and configuration
 */

pub mod config;
pub mod errors;
pub mod guard;
pub mod types;

// Re-export for convenience
pub use config::{config, configure, ConditionsConfig, WarningOutput, WarningSink};
pub use errors::*;
pub use guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult};
pub use types::*;
