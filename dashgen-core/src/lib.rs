//! dashgen core - shared data model, errors, logging, and configuration
//!
//! Every other dashgen crate builds on the types defined here

pub mod config;
pub mod error;
pub mod locator;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use locator::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
