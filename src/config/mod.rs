//! Configuration management.
//!
//! This module provides configuration loading through TOML files and
//! environment variable management via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use switchboard::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(None);
//!
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/switchboard.toml"))).unwrap();
//! env.apply_overrides(&mut loader.config);
//!
//! println!("Max steps: {}", loader.config.execution.max_steps);
//! println!("Backend: {}", loader.config.checkpointing.backend);
//! ```

pub mod config;
pub mod environment;

pub use self::config::{
    default_personas, AgentConfig, AgentPersona, CheckpointingConfig, Configuration,
    ConfigurationLoader, ExecutionConfig, LlmConfig, LoggingConfig, ServerConfig, ToolsConfig,
    ARCHITECT_ID, FRONTEND_ID, SUPERVISOR_ID,
};
pub use self::environment::EnvironmentLoader;
