//! Driver session bootstrap over the WebDriver protocol.

mod session;

pub use session::{DriverError, DriverSession};
