//! Settings store implementations.

pub mod static_settings;

pub use static_settings::StaticSettings;
