//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Settings store implementations

pub mod config;
pub mod logging;
pub mod settings;
