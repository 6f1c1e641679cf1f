//! Registry of store bindings
//!
//! [`BindingRegistry::with_defaults`] declares the built-in store kinds. Each
//! dependency list is kept in the order the stores were historically keyed
//! by, so fingerprints stay comparable across releases.

use crate::error::ConfigurationError;
use crate::stores::binding::Binding;
use crate::stores::graph::BindingGraph;
use crate::stores::kinds::{
    ConnectionStatusStore, CrossProjectTokenStore, DocumentPreviewStore, DocumentStore,
    GrantsStore, HistoryStore, PresenceStore, ProjectStore, SettingsStore, StoreKind,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Named store bindings for one workspace
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: Vec<Binding>,
    index: HashMap<String, usize>,
}

impl BindingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in store kind
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for binding in default_bindings() {
            registry
                .register(binding)
                .expect("built-in store namespaces are distinct");
        }
        registry
    }

    /// Add a binding; namespaces must be unique
    pub fn register(&mut self, binding: Binding) -> Result<(), ConfigurationError> {
        let namespace = binding.namespace().to_string();
        if self.index.contains_key(&namespace) {
            return Err(ConfigurationError::DuplicateBinding(namespace));
        }
        self.index.insert(namespace, self.bindings.len());
        self.bindings.push(binding);
        Ok(())
    }

    pub fn get(&self, namespace: &str) -> Option<&Binding> {
        self.index.get(namespace).map(|&i| &self.bindings[i])
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.index.contains_key(namespace)
    }

    /// Namespaces in registration order
    pub fn namespaces(&self) -> Vec<&str> {
        self.bindings.iter().map(Binding::namespace).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Dependency graph of the registered bindings
    pub fn graph(&self) -> Result<BindingGraph, ConfigurationError> {
        BindingGraph::build(&self.bindings)
    }

    /// Check that every requirement is registered and the bindings form a
    /// DAG. Returns a valid resolution order.
    pub fn validate(&self) -> Result<Vec<String>, ConfigurationError> {
        self.graph()?.resolution_order()
    }
}

fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::new(
            StoreKind::Grants.namespace(),
            &[],
            |ctx, _| Ok(vec![ctx.client_dep(), ctx.user_store_dep()]),
            |ctx, _| GrantsStore::new(Arc::clone(&ctx.client), Arc::clone(&ctx.user_store)),
        ),
        Binding::new(
            StoreKind::History.namespace(),
            &[],
            |ctx, _| Ok(vec![ctx.client_dep()]),
            |ctx, _| HistoryStore::new(Arc::clone(&ctx.client)),
        ),
        Binding::new(
            StoreKind::CrossProjectToken.namespace(),
            &[],
            |ctx, _| Ok(vec![ctx.client_dep()]),
            |ctx, _| Ok(CrossProjectTokenStore::new(Arc::clone(&ctx.client))),
        ),
        Binding::new(
            StoreKind::DocumentPreview.namespace(),
            &[StoreKind::CrossProjectToken.namespace()],
            |ctx, up| {
                Ok(vec![
                    ctx.client_dep(),
                    up.dependency(StoreKind::CrossProjectToken.namespace())?,
                ])
            },
            |ctx, up| {
                Ok(DocumentPreviewStore {
                    client: Arc::clone(&ctx.client),
                    cross_project_tokens: up.get(StoreKind::CrossProjectToken.namespace())?,
                })
            },
        ),
        // Templates are handed to the store but are not part of its key
        Binding::new(
            StoreKind::Document.namespace(),
            &[
                StoreKind::History.namespace(),
                StoreKind::DocumentPreview.namespace(),
            ],
            |ctx, up| {
                Ok(vec![
                    ctx.client_dep(),
                    up.dependency(StoreKind::DocumentPreview.namespace())?,
                    up.dependency(StoreKind::History.namespace())?,
                    ctx.schema_dep(),
                ])
            },
            |ctx, up| {
                DocumentStore::new(
                    Arc::clone(&ctx.client),
                    up.get(StoreKind::DocumentPreview.namespace())?,
                    up.get(StoreKind::History.namespace())?,
                    Arc::clone(&ctx.schema),
                    Arc::clone(&ctx.templates),
                )
            },
        ),
        Binding::new(
            StoreKind::ConnectionStatus.namespace(),
            &[],
            |ctx, _| Ok(vec![ctx.bifur_dep()]),
            |ctx, _| {
                Ok(ConnectionStatusStore {
                    bifur: Arc::clone(&ctx.bifur),
                })
            },
        ),
        Binding::new(
            StoreKind::Presence.namespace(),
            &[StoreKind::ConnectionStatus.namespace()],
            |ctx, up| {
                Ok(vec![
                    ctx.bifur_dep(),
                    up.dependency(StoreKind::ConnectionStatus.namespace())?,
                    ctx.user_store_dep(),
                ])
            },
            |ctx, up| {
                Ok(PresenceStore {
                    bifur: Arc::clone(&ctx.bifur),
                    connection_status: up.get(StoreKind::ConnectionStatus.namespace())?,
                    user_store: Arc::clone(&ctx.user_store),
                })
            },
        ),
        Binding::new(
            StoreKind::Project.namespace(),
            &[],
            |ctx, _| Ok(vec![ctx.client_dep()]),
            |ctx, _| ProjectStore::new(Arc::clone(&ctx.client)),
        ),
        Binding::new(
            StoreKind::Settings.namespace(),
            &[],
            |ctx, _| Ok(vec![ctx.workspace_dep()]),
            |ctx, _| Ok(SettingsStore::new(&ctx.workspace)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_kind() {
        let registry = BindingRegistry::with_defaults();
        assert_eq!(registry.len(), StoreKind::ALL.len());
        for kind in StoreKind::ALL {
            let binding = registry.get(kind.namespace()).unwrap();
            let declared: Vec<&str> = kind.requires().iter().map(|k| k.namespace()).collect();
            assert_eq!(binding.requires(), declared.as_slice());
        }
    }

    #[test]
    fn defaults_form_a_dag() {
        let order = BindingRegistry::with_defaults().validate().unwrap();
        assert_eq!(order.len(), 9);

        let pos = |ns: &str| order.iter().position(|n| n == ns).unwrap();
        assert!(pos("historyStore") < pos("documentStore"));
        assert!(pos("documentPreviewStore") < pos("documentStore"));
        assert!(pos("connectionStatusStore") < pos("presenceStore"));
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = BindingRegistry::with_defaults();
        let err = registry
            .register(Binding::new(
                "historyStore",
                &[],
                |_, _| Ok(vec![]),
                |_, _| Ok(()),
            ))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateBinding("historyStore".to_string()));
    }

    #[test]
    fn mutual_requirement_fails_validation() {
        let mut registry = BindingRegistry::new();
        registry
            .register(Binding::new("a", &["b"], |_, _| Ok(vec![]), |_, _| Ok(())))
            .unwrap();
        registry
            .register(Binding::new("b", &["a"], |_, _| Ok(vec![]), |_, _| Ok(())))
            .unwrap();

        assert!(matches!(
            registry.validate(),
            Err(ConfigurationError::CyclicBinding { .. })
        ));
    }
}
