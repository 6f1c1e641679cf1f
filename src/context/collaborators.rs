//! Handles to the external collaborators a workspace hands to its stores
//!
//! These are opaque from the cache's point of view: only their identity is
//! used as a dependency. Each carries a `Uuid` so that two handles built from
//! the same settings can still be told apart in output.

use crate::config::schema::WorkspaceConfig;
use crate::error::{RescacheError, RescacheResult};
use uuid::Uuid;

/// HTTP content API client
#[derive(Debug)]
pub struct ApiClient {
    pub id: Uuid,
    pub project_id: String,
    pub dataset: String,
    pub api_host: String,
    pub api_version: String,
    pub token: Option<String>,
}

impl ApiClient {
    /// Build a client from workspace settings
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            api_host: config.api_host.clone(),
            api_version: config.api_version.clone(),
            token: config.token.clone(),
        }
    }

    /// A new handle with the same settings but its own identity
    pub fn reconnect(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: self.project_id.clone(),
            dataset: self.dataset.clone(),
            api_host: self.api_host.clone(),
            api_version: self.api_version.clone(),
            token: self.token.clone(),
        }
    }

    /// Fail if the client cannot address a project dataset
    pub fn ensure_configured(&self) -> RescacheResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(RescacheError::ClientConfig(
                "project_id is not set".to_string(),
            ));
        }
        if self.dataset.trim().is_empty() {
            return Err(RescacheError::ClientConfig("dataset is not set".to_string()));
        }
        if !self
            .dataset
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(RescacheError::ClientConfig(format!(
                "invalid dataset name '{}'",
                self.dataset
            )));
        }
        Ok(())
    }

    /// Base URL for this client's project
    pub fn project_url(&self) -> String {
        format!(
            "https://{}.{}/{}",
            self.project_id, self.api_host, self.api_version
        )
    }
}

/// Real-time connection used for presence and connection status
#[derive(Debug)]
pub struct RealtimeClient {
    pub id: Uuid,
    pub url: String,
}

impl RealtimeClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
        }
    }
}

/// Source of the current user
#[derive(Debug, Default)]
pub struct UserStore {
    pub current_user: Option<String>,
}

/// Compiled content schema
#[derive(Debug, Default)]
pub struct Schema {
    pub name: String,
    pub types: Vec<String>,
}

impl Schema {
    pub fn has_type(&self, name: &str) -> bool {
        self.types.iter().any(|t| t == name)
    }
}

/// Initial-value templates for new documents
#[derive(Debug, Default)]
pub struct Templates {
    pub ids: Vec<String>,
}

/// Identity of the workspace itself
#[derive(Debug)]
pub struct WorkspaceHandle {
    pub name: String,
    pub title: String,
    pub base_path: String,
}
