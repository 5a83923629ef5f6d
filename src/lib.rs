/// The current version, sourced from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod aws_profiles;
pub mod config;
pub mod config_locations;
pub mod constants;
pub mod env;
pub mod error;
pub mod executor;
pub mod logging;
pub mod mcp;
pub mod platform;
pub mod profile;
pub mod refresh;
pub mod trusted;
