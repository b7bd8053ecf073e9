/// Database configuration and connection management
pub mod database;

/// Default quotas and holiday calendar loading from config.toml
pub mod defaults;
