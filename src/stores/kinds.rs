//! Built-in store kinds
//!
//! Each store only holds the handles it was built from. The data access they
//! front (documents, history, presence, ...) lives in the external clients.

use crate::context::{ApiClient, RealtimeClient, Schema, Templates, UserStore, WorkspaceHandle};
use crate::error::{RescacheError, RescacheResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Every store kind with a built-in binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreKind {
    Grants,
    History,
    CrossProjectToken,
    DocumentPreview,
    Document,
    ConnectionStatus,
    Presence,
    Project,
    Settings,
}

impl StoreKind {
    pub const ALL: [StoreKind; 9] = [
        StoreKind::Grants,
        StoreKind::History,
        StoreKind::CrossProjectToken,
        StoreKind::DocumentPreview,
        StoreKind::Document,
        StoreKind::ConnectionStatus,
        StoreKind::Presence,
        StoreKind::Project,
        StoreKind::Settings,
    ];

    /// Cache namespace for this kind
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Grants => "grantsStore",
            Self::History => "historyStore",
            Self::CrossProjectToken => "crossProjectTokenStore",
            Self::DocumentPreview => "documentPreviewStore",
            Self::Document => "documentStore",
            Self::ConnectionStatus => "connectionStatusStore",
            Self::Presence => "presenceStore",
            Self::Project => "projectStore",
            Self::Settings => "settingsStore",
        }
    }

    /// Kinds that must be resolved before this one
    pub fn requires(&self) -> &'static [StoreKind] {
        match self {
            Self::DocumentPreview => &[Self::CrossProjectToken],
            Self::Document => &[Self::History, Self::DocumentPreview],
            Self::Presence => &[Self::ConnectionStatus],
            _ => &[],
        }
    }

    /// Look up a kind by namespace
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.namespace() == namespace)
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Access grants for the current user
#[derive(Debug)]
pub struct GrantsStore {
    pub client: Arc<ApiClient>,
    pub user_store: Arc<UserStore>,
}

impl GrantsStore {
    pub fn new(client: Arc<ApiClient>, user_store: Arc<UserStore>) -> RescacheResult<Self> {
        client.ensure_configured()?;
        Ok(Self { client, user_store })
    }
}

/// Document revision history
#[derive(Debug)]
pub struct HistoryStore {
    pub client: Arc<ApiClient>,
}

impl HistoryStore {
    pub fn new(client: Arc<ApiClient>) -> RescacheResult<Self> {
        client.ensure_configured()?;
        Ok(Self { client })
    }
}

/// Tokens for reading references into other projects
#[derive(Debug)]
pub struct CrossProjectTokenStore {
    pub client: Arc<ApiClient>,
    tokens: RwLock<BTreeMap<String, String>>,
}

impl CrossProjectTokenStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            tokens: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn set_token(&self, project_id: &str, token: &str) {
        if let Ok(mut tokens) = self.tokens.write() {
            tokens.insert(project_id.to_string(), token.to_string());
        }
    }

    pub fn token(&self, project_id: &str) -> Option<String> {
        self.tokens.read().ok()?.get(project_id).cloned()
    }
}

/// Document previews, including cross-project references
#[derive(Debug)]
pub struct DocumentPreviewStore {
    pub client: Arc<ApiClient>,
    pub cross_project_tokens: Arc<CrossProjectTokenStore>,
}

/// Documents for the workspace schema
#[derive(Debug)]
pub struct DocumentStore {
    pub client: Arc<ApiClient>,
    pub preview: Arc<DocumentPreviewStore>,
    pub history: Arc<HistoryStore>,
    pub schema: Arc<Schema>,
    pub templates: Arc<Templates>,
}

impl DocumentStore {
    pub fn new(
        client: Arc<ApiClient>,
        preview: Arc<DocumentPreviewStore>,
        history: Arc<HistoryStore>,
        schema: Arc<Schema>,
        templates: Arc<Templates>,
    ) -> RescacheResult<Self> {
        client.ensure_configured()?;
        if schema.types.is_empty() {
            return Err(RescacheError::construction(
                StoreKind::Document.namespace(),
                format!("schema '{}' defines no types", schema.name),
            ));
        }
        Ok(Self {
            client,
            preview,
            history,
            schema,
            templates,
        })
    }
}

/// Real-time connection status
#[derive(Debug)]
pub struct ConnectionStatusStore {
    pub bifur: Arc<RealtimeClient>,
}

/// Who else is editing what
#[derive(Debug)]
pub struct PresenceStore {
    pub bifur: Arc<RealtimeClient>,
    pub connection_status: Arc<ConnectionStatusStore>,
    pub user_store: Arc<UserStore>,
}

/// Project metadata
#[derive(Debug)]
pub struct ProjectStore {
    pub client: Arc<ApiClient>,
}

impl ProjectStore {
    pub fn new(client: Arc<ApiClient>) -> RescacheResult<Self> {
        client.ensure_configured()?;
        Ok(Self { client })
    }
}

/// Per-workspace user settings
#[derive(Debug)]
pub struct SettingsStore {
    pub workspace: String,
    values: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl SettingsStore {
    pub fn new(workspace: &WorkspaceHandle) -> Self {
        Self {
            workspace: workspace.name.clone(),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn set(&self, key: &str, value: serde_json::Value) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.read().ok()?.get(key).cloned()
    }
}
