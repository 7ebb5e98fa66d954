//! Execution context selection.
//!
//! The execution context decides which environment file is loaded and
//! whether BrowserStack-specific capabilities apply.

use serde::{Deserialize, Serialize};

use crate::config::settings::ConfigError;

/// Deployment target for a test run.
///
/// Selects the environment file (`config.<context>.env`) that supplies
/// device- and provider-specific settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Local Android emulator.
    Emulation,
    /// Physical device attached over adb.
    Real,
    /// BrowserStack cloud device farm.
    Browser,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::Browser
    }
}

impl ExecutionContext {
    /// All known contexts, in declaration order.
    pub const ALL: [ExecutionContext; 3] = [Self::Emulation, Self::Real, Self::Browser];

    /// Name of the environment file for this context.
    pub fn env_file_name(&self) -> String {
        format!("config.{}.env", self)
    }
}

impl std::fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionContext::Emulation => write!(f, "emulation"),
            ExecutionContext::Real => write!(f, "real"),
            ExecutionContext::Browser => write!(f, "browser"),
        }
    }
}

impl std::str::FromStr for ExecutionContext {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emulation" => Ok(ExecutionContext::Emulation),
            "real" => Ok(ExecutionContext::Real),
            "browser" => Ok(ExecutionContext::Browser),
            _ => Err(ConfigError::ValidationError(format!(
                "Unknown context: {}. Valid contexts are: emulation, real, browser",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_browser() {
        assert_eq!(ExecutionContext::default(), ExecutionContext::Browser);
    }

    #[test]
    fn test_display_from_str_round_trip() {
        for ctx in ExecutionContext::ALL {
            let parsed: ExecutionContext = ctx.to_string().parse().unwrap();
            assert_eq!(parsed, ctx);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("simulator".parse::<ExecutionContext>().is_err());
        assert!("".parse::<ExecutionContext>().is_err());
    }

    #[test]
    fn test_env_file_name() {
        assert_eq!(
            ExecutionContext::Emulation.env_file_name(),
            "config.emulation.env"
        );
        assert_eq!(ExecutionContext::Real.env_file_name(), "config.real.env");
        assert_eq!(
            ExecutionContext::Browser.env_file_name(),
            "config.browser.env"
        );
    }
}
