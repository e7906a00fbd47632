//! PPM Sentinel - periodic status checks and cluster recovery.
//!
//! The sentinel asks a chat bot for the user's PPM on a fixed schedule,
//! correlates the bot's reply and, when the value is zero or the cluster is
//! offline, drives a stop/start recovery and verifies the result. In helper
//! mode it also remediates zero-valued members of the user's group.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the host ports
//! - **Service Layer** (`services`): matcher, correlator, orchestrator, timers
//! - **Application Layer** (`application`): the session lifecycle
//! - **Adapters** (`adapters`): in-memory host used by tests and the simulator
//! - **Infrastructure Layer** (`infrastructure`): config, logging, settings
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ppm_sentinel::{Config, InMemoryHost, Session, StaticSettings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let host = Arc::new(InMemoryHost::new(&config.bot).with_identity("42"));
//!     let settings = Arc::new(StaticSettings::from_config(&config.settings));
//!     let session = Session::new(config, host, settings);
//!     session.start().await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use adapters::memory::InMemoryHost;
pub use application::Session;
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{CheckResult, Config, CycleOutcome, CycleReport, Roster, StartOutcome};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::settings::StaticSettings;
pub use services::{ResponseMatcher, StatusCorrelator};
