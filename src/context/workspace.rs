//! A workspace and the cache its stores live in

use crate::cache::{CacheStats, ResourceCache, SlotInfo};
use crate::config::schema::{CacheConfig, EvictionPolicy, WorkspaceConfig};
use crate::context::{ApiClient, SourceContext};
use crate::error::RescacheResult;
use crate::stores::{
    BindingRegistry, ConnectionStatusStore, CrossProjectTokenStore, DocumentPreviewStore,
    DocumentStore, GrantsStore, HistoryStore, PresenceStore, ProjectStore, Resolution, Resolver,
    SettingsStore, StoreKind,
};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// One workspace/source scope. Owns exactly one resource cache; dropping
/// the workspace drops every cached store.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    context: SourceContext,
    registry: Arc<BindingRegistry>,
    cache: ResourceCache,
    eviction: EvictionPolicy,
}

impl Workspace {
    /// Compose a workspace. The bindings are validated here so a cyclic or
    /// incomplete declaration fails before any store is requested.
    pub fn new(context: SourceContext, registry: Arc<BindingRegistry>) -> RescacheResult<Self> {
        let order = registry.validate()?;
        debug!("Store resolution order: {}", order.join(", "));

        Ok(Self {
            id: Uuid::new_v4(),
            context,
            registry,
            cache: ResourceCache::new(),
            eviction: EvictionPolicy::default(),
        })
    }

    /// Workspace with built-in bindings and fresh collaborators from config
    pub fn from_config(config: &WorkspaceConfig, cache: &CacheConfig) -> RescacheResult<Self> {
        let workspace = Self::new(
            SourceContext::from_config(config),
            Arc::new(BindingRegistry::with_defaults()),
        )?
        .with_eviction(cache.eviction);

        info!("Opened workspace {} ({})", config.name, workspace.id);
        Ok(workspace)
    }

    /// Set the eviction policy
    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.context.workspace.name
    }

    pub fn context(&self) -> &SourceContext {
        &self.context
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResourceCache {
        &mut self.cache
    }

    pub fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Replace the collaborators. Cached stores are kept; the next request
    /// for any store keyed by a changed handle supersedes it.
    pub fn set_context(&mut self, context: SourceContext) {
        self.context = context;
    }

    /// Swap the API client
    pub fn set_client(&mut self, client: Arc<ApiClient>) {
        info!("Swapping API client for workspace {}", self.name());
        self.context = self.context.with_client(client);
    }

    /// Resolve a store by namespace
    pub fn resolve<T: Any + Send + Sync>(&mut self, namespace: &str) -> RescacheResult<Arc<T>> {
        Resolver::new(&self.registry, &self.context, &mut self.cache).resolve_typed(namespace)
    }

    /// Resolve a store and report every namespace touched on the way
    pub fn resolve_traced(&mut self, namespace: &str) -> RescacheResult<Vec<Resolution>> {
        let mut resolver = Resolver::new(&self.registry, &self.context, &mut self.cache);
        resolver.resolve(namespace)?;
        Ok(resolver.into_trace())
    }

    pub fn grants_store(&mut self) -> RescacheResult<Arc<GrantsStore>> {
        self.resolve(StoreKind::Grants.namespace())
    }

    pub fn history_store(&mut self) -> RescacheResult<Arc<HistoryStore>> {
        self.resolve(StoreKind::History.namespace())
    }

    pub fn cross_project_token_store(&mut self) -> RescacheResult<Arc<CrossProjectTokenStore>> {
        self.resolve(StoreKind::CrossProjectToken.namespace())
    }

    pub fn document_preview_store(&mut self) -> RescacheResult<Arc<DocumentPreviewStore>> {
        self.resolve(StoreKind::DocumentPreview.namespace())
    }

    pub fn document_store(&mut self) -> RescacheResult<Arc<DocumentStore>> {
        self.resolve(StoreKind::Document.namespace())
    }

    pub fn connection_status_store(&mut self) -> RescacheResult<Arc<ConnectionStatusStore>> {
        self.resolve(StoreKind::ConnectionStatus.namespace())
    }

    pub fn presence_store(&mut self) -> RescacheResult<Arc<PresenceStore>> {
        self.resolve(StoreKind::Presence.namespace())
    }

    pub fn project_store(&mut self) -> RescacheResult<Arc<ProjectStore>> {
        self.resolve(StoreKind::Project.namespace())
    }

    pub fn settings_store(&mut self) -> RescacheResult<Arc<SettingsStore>> {
        self.resolve(StoreKind::Settings.namespace())
    }

    /// Run an eviction pass according to the configured policy.
    /// Under the context policy nothing is evicted.
    pub fn collect(&mut self) -> Vec<String> {
        match self.eviction {
            EvictionPolicy::Context => vec![],
            EvictionPolicy::Unreferenced => self.cache.evict_unreferenced(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn entries(&self) -> Vec<SlotInfo> {
        self.cache.entries()
    }

    /// Tear the workspace down, returning how many stores were dropped
    pub fn teardown(self) -> usize {
        let count = self.cache.len();
        info!(
            "Tearing down workspace {} ({} cached store(s))",
            self.name(),
            count
        );
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, RescacheError};
    use crate::stores::Binding;

    fn workspace() -> Workspace {
        Workspace::from_config(&WorkspaceConfig::default(), &CacheConfig::default()).unwrap()
    }

    #[test]
    fn repeated_requests_share_instances() {
        let mut ws = workspace();
        let first = ws.document_store().unwrap();
        let second = ws.document_store().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let history = ws.history_store().unwrap();
        assert!(Arc::ptr_eq(&history, &first.history));
        assert_eq!(ws.cache().len(), 4);
    }

    #[test]
    fn client_swap_supersedes_client_keyed_stores() {
        let mut ws = workspace();
        let document = ws.document_store().unwrap();
        let settings = ws.settings_store().unwrap();
        let connection = ws.connection_status_store().unwrap();

        let client = Arc::new(ws.context().client.reconnect());
        ws.set_client(client);

        let document_after = ws.document_store().unwrap();
        assert!(!Arc::ptr_eq(&document, &document_after));
        assert!(!Arc::ptr_eq(&document.history, &document_after.history));

        // Not keyed by the client
        assert!(Arc::ptr_eq(&settings, &ws.settings_store().unwrap()));
        assert!(Arc::ptr_eq(&connection, &ws.connection_status_store().unwrap()));
        assert!(ws.stats().supersessions >= 4);
    }

    #[test]
    fn schema_change_only_rebuilds_document_store() {
        let mut ws = workspace();
        let document = ws.document_store().unwrap();

        let schema = Arc::new(crate::context::Schema {
            name: "default".to_string(),
            types: vec!["post".to_string()],
        });
        let context = ws.context().with_schema(schema);
        ws.set_context(context);

        let document_after = ws.document_store().unwrap();
        assert!(!Arc::ptr_eq(&document, &document_after));
        assert!(Arc::ptr_eq(&document.history, &document_after.history));
        assert!(Arc::ptr_eq(&document.preview, &document_after.preview));
    }

    #[test]
    fn presence_shares_connection_status() {
        let mut ws = workspace();
        let presence = ws.presence_store().unwrap();
        let connection = ws.connection_status_store().unwrap();
        assert!(Arc::ptr_eq(&presence.connection_status, &connection));
    }

    #[test]
    fn misconfigured_client_is_a_construction_error() {
        let mut config = WorkspaceConfig::default();
        config.project_id = String::new();
        let mut ws = Workspace::from_config(&config, &CacheConfig::default()).unwrap();

        let err = ws.project_store().unwrap_err();
        assert!(matches!(err, RescacheError::Construction { .. }));
        assert!(!ws.cache().contains("projectStore"));

        // Stores not touching the client still resolve
        assert!(ws.settings_store().is_ok());
    }

    #[test]
    fn cyclic_registry_fails_at_composition() {
        let mut registry = BindingRegistry::new();
        registry
            .register(Binding::new("a", &["b"], |_, _| Ok(vec![]), |_, _| Ok(())))
            .unwrap();
        registry
            .register(Binding::new("b", &["a"], |_, _| Ok(vec![]), |_, _| Ok(())))
            .unwrap();

        let context = SourceContext::from_config(&WorkspaceConfig::default());
        let err = Workspace::new(context, Arc::new(registry)).unwrap_err();
        assert!(matches!(
            err,
            RescacheError::Configuration(ConfigurationError::CyclicBinding { .. })
        ));
    }

    #[test]
    fn collect_respects_policy() {
        let mut ws = workspace();
        ws.history_store().unwrap();
        assert!(ws.collect().is_empty());
        assert_eq!(ws.cache().len(), 1);

        let mut ws = workspace().with_eviction(EvictionPolicy::Unreferenced);
        ws.history_store().unwrap();
        assert_eq!(ws.collect(), vec!["historyStore".to_string()]);
        assert!(ws.cache().is_empty());
    }

    #[test]
    fn teardown_reports_dropped_stores() {
        let mut ws = workspace();
        ws.presence_store().unwrap();
        assert_eq!(ws.teardown(), 2);
    }
}
