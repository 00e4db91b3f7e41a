/*!
 * Engine Configuration
 *
 * Process-wide settings for warning output and restart-name validation
 */

use crate::signals::Condition;
use parking_lot::{const_rwlock, RwLock};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Environment variable selecting the warning output
pub const WARNINGS_ENV: &str = "CONDITIONS_WARNINGS";

/// Environment variable toggling restart-name validation
pub const VALIDATE_NAMES_ENV: &str = "CONDITIONS_VALIDATE_NAMES";

/// Callback receiving unmuffled warnings
pub type WarningSink = Arc<dyn Fn(&dyn Condition) + Send + Sync>;

/// Where `warn` reports a condition that nobody muffled
#[derive(Clone)]
pub enum WarningOutput {
    /// `warning: <message>` on standard error
    Stderr,
    /// A `WARN` level tracing event
    Tracing,
    /// Drop the warning
    Silent,
    /// Hand the condition to a callback
    Custom(WarningSink),
}

impl fmt::Debug for WarningOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningOutput::Stderr => f.write_str("Stderr"),
            WarningOutput::Tracing => f.write_str("Tracing"),
            WarningOutput::Silent => f.write_str("Silent"),
            WarningOutput::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl WarningOutput {
    /// Parse the value of `CONDITIONS_WARNINGS`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stderr" => Some(WarningOutput::Stderr),
            "tracing" | "log" => Some(WarningOutput::Tracing),
            "off" | "silent" | "none" => Some(WarningOutput::Silent),
            _ => None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct ConditionsConfig {
    /// Destination of unmuffled warnings
    pub warning_output: WarningOutput,
    /// Reject restart names that are not identifiers
    pub validate_restart_names: bool,
}

impl Default for ConditionsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionsConfig {
    /// Defaults: warnings to stderr, names validated
    pub const fn new() -> Self {
        Self {
            warning_output: WarningOutput::Stderr,
            validate_restart_names: true,
        }
    }

    /// Warnings routed into tracing instead of stderr
    pub const fn traced() -> Self {
        Self {
            warning_output: WarningOutput::Tracing,
            validate_restart_names: true,
        }
    }

    /// Defaults overridden by `CONDITIONS_WARNINGS` and `CONDITIONS_VALIDATE_NAMES`
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(value) = std::env::var(WARNINGS_ENV) {
            match WarningOutput::parse(&value) {
                Some(output) => config.warning_output = output,
                None => warn!(value = %value, "Ignoring unknown {}", WARNINGS_ENV),
            }
        }

        if let Ok(value) = std::env::var(VALIDATE_NAMES_ENV) {
            config.validate_restart_names = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }

        config
    }

    pub fn with_warning_output(mut self, output: WarningOutput) -> Self {
        self.warning_output = output;
        self
    }

    pub fn with_name_validation(mut self, enabled: bool) -> Self {
        self.validate_restart_names = enabled;
        self
    }
}

static CONFIG: RwLock<ConditionsConfig> = const_rwlock(ConditionsConfig::new());

/// Replace the process-wide configuration
pub fn configure(config: ConditionsConfig) {
    *CONFIG.write() = config;
}

/// Snapshot of the process-wide configuration
pub fn config() -> ConditionsConfig {
    CONFIG.read().clone()
}
