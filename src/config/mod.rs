//! Configuration module for modelfetch
//!
//! Loads config from `$XDG_CONFIG_HOME/modelfetch/config.toml` or `~/.config/modelfetch/config.toml`.
//! Falls back to defaults if the file doesn't exist.
//! Partial configs are merged with defaults using serde's default attributes.
//!
//! # Example
//!
//! ```no_run
//! use modelfetch::config::Config;
//!
//! let config = Config::load().expect("Failed to load config");
//! println!("Cache root: {}", config.cache_root().unwrap().display());
//! println!("Timeout: {}s", config.network.timeout_secs);
//! ```

pub mod schema;

pub use schema::Config;
