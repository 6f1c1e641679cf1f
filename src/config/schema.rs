//! Configuration schema for rescache
//!
//! Configuration is stored at `~/.config/rescache/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Workspaces, each owning its own cache
    pub workspaces: Vec<WorkspaceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
            workspaces: vec![WorkspaceConfig::default()],
        }
    }
}

impl Config {
    /// Find a workspace by name
    pub fn workspace(&self, name: &str) -> Option<&WorkspaceConfig> {
        self.workspaces.iter().find(|w| w.name == name)
    }

    /// The first configured workspace
    pub fn default_workspace(&self) -> Option<&WorkspaceConfig> {
        self.workspaces.first()
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// When slots are reclaimed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Slots live until superseded or until the workspace is dropped
    #[default]
    Context,
    /// Eviction passes also drop slots with no attached consumer
    Unreferenced,
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Reclamation policy (default: context)
    pub eviction: EvictionPolicy,
}

/// One workspace/source and the collaborators its stores are built from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Unique workspace name
    pub name: String,

    /// Display title
    pub title: String,

    /// Route prefix for the workspace
    pub base_path: String,

    /// Content API project
    pub project_id: String,

    /// Content API dataset
    pub dataset: String,

    /// Content API host
    pub api_host: String,

    /// Content API version
    pub api_version: String,

    /// API token (optional)
    pub token: Option<String>,

    /// Real-time endpoint for presence and connection status
    pub realtime_url: String,

    /// Schema type names
    pub schema_types: Vec<String>,

    /// Initial-value template ids
    pub templates: Vec<String>,

    /// Current user id (optional)
    pub current_user: Option<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            title: "Default".to_string(),
            base_path: "/".to_string(),
            project_id: "local".to_string(),
            dataset: "production".to_string(),
            api_host: "api.example.com".to_string(),
            api_version: "v1".to_string(),
            token: None,
            realtime_url: "wss://realtime.example.com".to_string(),
            schema_types: vec!["document".to_string(), "image".to_string()],
            templates: vec![],
            current_user: None,
        }
    }
}
