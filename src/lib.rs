//! # AppDriver
//!
//! Environment-aware Appium driver configuration and session bootstrap for
//! Android UI testing.
//!
//! AppDriver resolves a typed [`config::Settings`] record for one of three
//! execution contexts (emulator, physical device, BrowserStack cloud),
//! derives the WebDriver capability object from it, and opens the driver
//! session the test scripts run against.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use appdriver::{
//!     config::{ExecutionContext, Settings},
//!     driver::DriverSession,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::resolve(Some(ExecutionContext::Emulation))?;
//!     let session = DriverSession::connect(&settings).await?;
//!
//!     // ... run test steps against session.client() ...
//!
//!     session.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: context selection, settings resolution, capability derivation
//! - [`driver`]: WebDriver session bootstrap
//! - [`paths`]: project-root discovery and relative path resolution
//!
//! ## Configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. `config.<context>.env` in the project root
//! 3. Process environment variables
//!
//! See [`config::Settings`] for the recognized keys.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Full version string with name
pub const FULL_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

/// Context selection, settings resolution, and capability derivation.
pub mod config;

/// Driver session bootstrap over the WebDriver protocol.
pub mod driver;

/// Project-root discovery and relative path resolution.
pub mod paths;

// Re-exports for convenience
pub use config::{
    CapabilityBuilder, ConfigError, DriverCapabilities, ExecutionContext, Settings,
    BROWSERSTACK_HOST, DEFAULT_REMOTE_URL,
};
pub use driver::{DriverError, DriverSession};

/// Prelude module for convenient imports.
///
/// ```rust
/// use appdriver::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{DriverCapabilities, ExecutionContext, Settings};
    pub use crate::driver::{DriverError, DriverSession};
    pub use crate::{FULL_VERSION, NAME, VERSION};
}
