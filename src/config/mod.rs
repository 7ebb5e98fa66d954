//! Configuration resolution for a test run.
//!
//! This module turns an execution context into a typed, validated settings
//! record and derives the driver capability object from it:
//!
//! `context selection -> environment file lookup -> Settings -> DriverCapabilities`
//!
//! # Example
//!
//! ```rust,no_run
//! use appdriver::config::{DriverCapabilities, ExecutionContext, Settings};
//!
//! let settings = Settings::resolve(Some(ExecutionContext::Emulation)).unwrap();
//! let caps = DriverCapabilities::derive(&settings);
//! ```

mod capabilities;
mod context;
mod settings;

pub use capabilities::{CapabilityBuilder, DriverCapabilities};
pub use context::ExecutionContext;
pub use settings::{ConfigError, Settings, BROWSERSTACK_HOST, DEFAULT_REMOTE_URL};
