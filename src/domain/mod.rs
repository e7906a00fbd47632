//! Domain layer for the PPM sentinel
//!
//! Models, errors and the ports through which the host is reached.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
