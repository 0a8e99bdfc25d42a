//! Effective settings resolved from a product config and the environment

pub mod settings;

pub use settings::Settings;
