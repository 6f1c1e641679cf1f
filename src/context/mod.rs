//! Workspace/source context
//!
//! A [`SourceContext`] carries the live collaborator handles for one
//! workspace. A [`Workspace`] owns that context together with the only
//! [`ResourceCache`](crate::cache::ResourceCache) its stores are kept in.
//! Nothing here is global; callers pass the workspace explicitly.

pub mod collaborators;
pub mod workspace;

pub use collaborators::{ApiClient, RealtimeClient, Schema, Templates, UserStore, WorkspaceHandle};
pub use workspace::Workspace;

use crate::cache::Dependency;
use crate::config::schema::WorkspaceConfig;
use std::sync::Arc;

/// Live collaborators for one workspace
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub client: Arc<ApiClient>,
    pub bifur: Arc<RealtimeClient>,
    pub user_store: Arc<UserStore>,
    pub schema: Arc<Schema>,
    pub templates: Arc<Templates>,
    pub workspace: Arc<WorkspaceHandle>,
}

impl SourceContext {
    /// Build fresh collaborator handles from workspace settings
    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self {
            client: Arc::new(ApiClient::from_config(config)),
            bifur: Arc::new(RealtimeClient::new(config.realtime_url.clone())),
            user_store: Arc::new(UserStore {
                current_user: config.current_user.clone(),
            }),
            schema: Arc::new(Schema {
                name: config.name.clone(),
                types: config.schema_types.clone(),
            }),
            templates: Arc::new(Templates {
                ids: config.templates.clone(),
            }),
            workspace: Arc::new(WorkspaceHandle {
                name: config.name.clone(),
                title: config.title.clone(),
                base_path: config.base_path.clone(),
            }),
        }
    }

    /// Same context with a different API client
    pub fn with_client(&self, client: Arc<ApiClient>) -> Self {
        Self {
            client,
            ..self.clone()
        }
    }

    /// Same context with a different schema
    pub fn with_schema(&self, schema: Arc<Schema>) -> Self {
        Self {
            schema,
            ..self.clone()
        }
    }

    pub fn client_dep(&self) -> Dependency {
        Dependency::of(&self.client)
    }

    pub fn bifur_dep(&self) -> Dependency {
        Dependency::of(&self.bifur)
    }

    pub fn user_store_dep(&self) -> Dependency {
        Dependency::of(&self.user_store)
    }

    pub fn schema_dep(&self) -> Dependency {
        Dependency::of(&self.schema)
    }

    pub fn workspace_dep(&self) -> Dependency {
        Dependency::of(&self.workspace)
    }
}
