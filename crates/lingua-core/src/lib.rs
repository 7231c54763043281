//! Lingua Core - shared configuration types
//!
//! Configuration is loaded once at startup and handed to the services that
//! need it. Nothing in the workspace reads settings from a global.

pub mod config;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
