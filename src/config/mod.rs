//! Configuration module for Reelcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reelcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reelcrawl.toml")).unwrap();
//! println!("Run stops after {} inserts", config.crawler.max_inserts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetchErrorPolicy, OutputConfig, SelectorConfig, SinkKind,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
