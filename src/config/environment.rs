//! Environment variable loading and management.
//!
//! Secrets and deployment-specific endpoints come from the environment rather
//! than the TOML file; the accessors here are the only place they are read.

use std::env;
use std::path::Path;

use super::config::Configuration;

/// Listen address override
pub const ADDR_VAR: &str = "SWITCHBOARD_ADDR";
/// DocumentDB/MongoDB connection string override
pub const MONGODB_URI_VAR: &str = "SWITCHBOARD_MONGODB_URI";
/// API key for the OpenAI-compatible endpoint
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Base URL override for the OpenAI-compatible endpoint
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
/// Path of the TOML configuration file
pub const CONFIG_PATH_VAR: &str = "SWITCHBOARD_CONFIG";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
    load_error: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Nothing is loaded when None.
    ///
    /// Usually called before tracing is installed, so a load failure is kept
    /// for the caller to report through [`EnvironmentLoader::load_error`].
    pub fn new(env_file: Option<&Path>) -> Self {
        // Only an explicit path is loaded so tests never pick up a stray .env
        let load_error = env_file
            .filter(|path| path.exists())
            .and_then(|path| dotenv::from_path(path).err())
            .map(|e| e.to_string());

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
            load_error,
        }
    }

    /// Why the .env file could not be loaded, if it could not
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// The .env file this loader was created with
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    pub fn addr(&self) -> Option<String> {
        non_empty_var(ADDR_VAR)
    }

    pub fn mongodb_uri(&self) -> Option<String> {
        non_empty_var(MONGODB_URI_VAR)
    }

    pub fn api_key(&self) -> Option<String> {
        non_empty_var(API_KEY_VAR)
    }

    pub fn base_url(&self) -> Option<String> {
        non_empty_var(BASE_URL_VAR)
    }

    pub fn config_path(&self) -> Option<String> {
        non_empty_var(CONFIG_PATH_VAR)
    }

    /// Apply environment overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut Configuration) {
        if let Some(addr) = self.addr() {
            config.server.addr = addr;
        }
        if let Some(uri) = self.mongodb_uri() {
            config.checkpointing.connection_string = Some(uri);
        }
        if let Some(base_url) = self.base_url() {
            config.llm.base_url = base_url;
        }
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
