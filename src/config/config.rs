//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persona id of the routing agent
pub const SUPERVISOR_ID: &str = "project_manager";
/// Persona id of the planning worker
pub const ARCHITECT_ID: &str = "technical_architect";
/// Persona id of the code-writing worker
pub const FRONTEND_ID: &str = "head_of_frontend";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
    pub execution: ExecutionConfig,
    pub tools: ToolsConfig,
    pub checkpointing: CheckpointingConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    /// Personas keyed by agent id (`project_manager`, `technical_architect`,
    /// `head_of_frontend`). Entries present in the file replace the defaults.
    pub agents: BTreeMap<String, AgentPersona>,
}

/// Service identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub version: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "switchboard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Markdown transcript file; no transcript is written when unset
    pub log_file: Option<String>,
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: "INFO".to_string(),
        }
    }
}

/// Execution limits for a single request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Upper bound for each model call and each tool call
    pub timeout_seconds: u64,
    /// Supervisor and worker hops allowed per request
    pub max_steps: u32,
    /// Model round-trips allowed inside one worker frame
    pub max_worker_iterations: u32,
    /// Append the thread id to delegation directives
    pub annotate_thread_id: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            max_steps: 25,
            max_worker_iterations: 15,
            annotate_thread_id: true,
        }
    }
}

/// Worker tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directory that file tools resolve paths against
    pub workspace_root: String,
    /// Character ceiling for `read_file`
    pub max_read_chars: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workspace_root: ".".to_string(),
            max_read_chars: 200_000,
        }
    }
}

/// Checkpoint and board storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointingConfig {
    /// `memory`, `file` or `documentdb`
    pub backend: String,
    /// Root directory for the file backend
    pub base_path: Option<String>,
    /// MongoDB/DocumentDB connection string
    pub connection_string: Option<String>,
    pub database: String,
    pub collection: String,
    pub board_collection: String,
    /// Namespace used for every checkpoint the service writes
    pub namespace: String,
}

impl Default for CheckpointingConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            base_path: None,
            connection_string: None,
            database: "switchboard".to_string(),
            collection: "checkpoints".to_string(),
            board_collection: "project_boards".to_string(),
            namespace: String::new(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Allowed CORS origins; `"*"` allows any origin, an empty list allows none
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Model endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    pub supervisor_model: String,
    pub worker_model: String,
    pub supervisor_temperature: f32,
    pub worker_temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            supervisor_model: "gpt-4o".to_string(),
            worker_model: "gpt-4o-mini".to_string(),
            supervisor_temperature: 0.5,
            worker_temperature: 0.1,
        }
    }
}

/// Persona of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPersona {
    /// Display name
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub system_prompt: String,
    /// Tool allow-list (workers only)
    #[serde(default)]
    pub tools: Vec<String>,
}

impl Configuration {
    /// Persona for `id`, falling back to the built-in default
    pub fn persona(&self, id: &str) -> Option<AgentPersona> {
        self.agents
            .get(id)
            .cloned()
            .or_else(|| default_personas().remove(id))
    }
}

/// Built-in personas for the supervisor and both workers
pub fn default_personas() -> BTreeMap<String, AgentPersona> {
    let mut personas = BTreeMap::new();
    personas.insert(
        SUPERVISOR_ID.to_string(),
        AgentPersona {
            name: "Creative Director".to_string(),
            role: "Project Manager".to_string(),
            system_prompt: "You manage a small software team. Clarify vague requests with the \
                user before doing anything. Delegate planning to the technical architect and \
                coding to the head of frontend. When the team reports back, present the result \
                to the user in plain language."
                .to_string(),
            tools: Vec::new(),
        },
    );
    personas.insert(
        ARCHITECT_ID.to_string(),
        AgentPersona {
            name: "The Producer".to_string(),
            role: "Technical Architect".to_string(),
            system_prompt: "You turn an agreed vision into a plan. Move the project board to \
                the Planning phase with update_board, write the plan to master_plan.md, then \
                update the board with the tasks from the plan and report the plan back. The \
                thread id for the board is given at the end of your instructions."
                .to_string(),
            tools: vec![
                "write_file".to_string(),
                "read_file".to_string(),
                "update_board".to_string(),
            ],
        },
    );
    personas.insert(
        FRONTEND_ID.to_string(),
        AgentPersona {
            name: "Head of Frontend".to_string(),
            role: "Frontend Engineer".to_string(),
            system_prompt: "You implement frontend tasks from master_plan.md. Inspect the \
                workspace, write the files, and report back only when the code is written."
                .to_string(),
            tools: vec![
                "write_file".to_string(),
                "read_file".to_string(),
                "list_files".to_string(),
            ],
        },
    );
    personas
}

/// Loads and manages TOML configuration.
#[derive(Debug)]
pub struct ConfigurationLoader {
    pub config_path: PathBuf,
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, uses `config/switchboard.toml`
    ///   when present and built-in defaults otherwise.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("config/switchboard.toml"));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Self::get_default_config()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config_path: PathBuf::from("config/switchboard.toml"),
            config,
        }
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Get default configuration.
    fn get_default_config() -> Configuration {
        Configuration {
            agents: default_personas(),
            ..Configuration::default()
        }
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "agent.name" => Some(self.config.agent.name.clone()),
            "agent.version" => Some(self.config.agent.version.clone()),
            "logging.log_file" => self.config.logging.log_file.clone(),
            "logging.log_level" => Some(self.config.logging.log_level.clone()),
            "checkpointing.backend" => Some(self.config.checkpointing.backend.clone()),
            "checkpointing.namespace" => Some(self.config.checkpointing.namespace.clone()),
            "server.addr" => Some(self.config.server.addr.clone()),
            "llm.base_url" => Some(self.config.llm.base_url.clone()),
            _ => None,
        }
    }

    /// Get numeric configuration value.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match key {
            "execution.timeout_seconds" => Some(self.config.execution.timeout_seconds),
            "execution.max_steps" => Some(self.config.execution.max_steps as u64),
            "execution.max_worker_iterations" => {
                Some(self.config.execution.max_worker_iterations as u64)
            }
            "tools.max_read_chars" => Some(self.config.tools.max_read_chars as u64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let loader = ConfigurationLoader::new(Some(Path::new("does/not/exist.toml"))).unwrap();
        let config = &loader.config;

        assert_eq!(config.agent.name, "switchboard");
        assert_eq!(config.execution.max_steps, 25);
        assert_eq!(config.execution.max_worker_iterations, 15);
        assert_eq!(config.tools.max_read_chars, 200_000);
        assert_eq!(config.checkpointing.backend, "memory");
        assert_eq!(config.checkpointing.namespace, "");
        assert_eq!(config.agents.len(), 3);
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[execution]
max_steps = 5

[checkpointing]
backend = "file"
base_path = "/tmp/switchboard"

[agents.head_of_frontend]
name = "Frontend"
system_prompt = "Write code."
tools = ["list_files"]
"#
        )
        .unwrap();

        let loader = ConfigurationLoader::new(Some(file.path())).unwrap();
        let config = &loader.config;

        assert_eq!(config.execution.max_steps, 5);
        assert_eq!(config.execution.timeout_seconds, 120);
        assert_eq!(config.checkpointing.backend, "file");
        assert_eq!(config.checkpointing.collection, "checkpoints");
        assert_eq!(config.server.addr, "0.0.0.0:8080");

        let frontend = config.persona(FRONTEND_ID).unwrap();
        assert_eq!(frontend.tools, vec!["list_files".to_string()]);

        // Personas missing from the file fall back to the built-ins
        let architect = config.persona(ARCHITECT_ID).unwrap();
        assert!(architect.tools.contains(&"update_board".to_string()));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[execution\nmax_steps = ").unwrap();
        assert!(ConfigurationLoader::new(Some(file.path())).is_err());
    }

    #[test]
    fn test_get_values_by_key() {
        let loader = ConfigurationLoader::from_config(Configuration::default());
        assert_eq!(loader.get_string("agent.name").as_deref(), Some("switchboard"));
        assert_eq!(loader.get_string("logging.log_file"), None);
        assert_eq!(loader.get_u64("execution.timeout_seconds"), Some(120));
        assert_eq!(loader.get_u64("unknown.key"), None);
    }
}
