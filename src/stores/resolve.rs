//! Recursive store resolution against a workspace cache
//!
//! Upstream bindings are resolved first, through the same get-or-insert
//! protocol, and only then is the binding's own dependency list computed.
//! A namespace that re-enters its own resolution is a cyclic declaration and
//! fails immediately.

use crate::cache::{AnyValue, Lookup, ResourceCache};
use crate::context::SourceContext;
use crate::error::{ConfigurationError, RescacheError, RescacheResult};
use crate::stores::binding::{Binding, Upstream};
use crate::stores::registry::BindingRegistry;
use serde::Serialize;
use tracing::{debug, info};

/// What happened to one namespace during a resolution
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub namespace: String,
    pub lookup: Lookup,
    pub digest: String,
    /// Nesting level; 0 for the namespace that was asked for
    pub depth: usize,
}

/// One resolution pass over a registry, context and cache
pub struct Resolver<'a> {
    registry: &'a BindingRegistry,
    context: &'a SourceContext,
    cache: &'a mut ResourceCache,
    stack: Vec<String>,
    trace: Vec<Resolution>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a BindingRegistry,
        context: &'a SourceContext,
        cache: &'a mut ResourceCache,
    ) -> Self {
        Self {
            registry,
            context,
            cache,
            stack: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Resolve `namespace` and everything it requires
    pub fn resolve(&mut self, namespace: &str) -> RescacheResult<AnyValue> {
        if let Some(pos) = self.stack.iter().position(|n| n == namespace) {
            let mut cycle = self.stack[pos..].to_vec();
            cycle.push(namespace.to_string());
            return Err(ConfigurationError::CyclicBinding { cycle }.into());
        }

        let registry = self.registry;
        let binding = registry
            .get(namespace)
            .ok_or_else(|| ConfigurationError::UnknownBinding(namespace.to_string()))?;

        self.stack.push(namespace.to_string());
        let upstream = self.resolve_upstream(binding);
        self.stack.pop();
        let upstream = upstream?;

        let context = self.context;
        let dependencies = binding.dependencies(context, &upstream)?;
        let (value, lookup) = self.cache.try_get_or_insert_erased(
            namespace,
            dependencies,
            binding.type_id(),
            || {
                info!("Constructing {}", namespace);
                binding.construct(context, &upstream)
            },
        )?;

        let digest = self
            .cache
            .fingerprint(namespace)
            .map(|key| key.digest())
            .unwrap_or_default();
        debug!("Resolved {} ({:?}, {})", namespace, lookup, digest);

        self.trace.push(Resolution {
            namespace: namespace.to_string(),
            lookup,
            digest,
            depth: self.stack.len(),
        });

        Ok(value)
    }

    /// Resolve and downcast to the store type
    pub fn resolve_typed<T: std::any::Any + Send + Sync>(
        &mut self,
        namespace: &str,
    ) -> RescacheResult<std::sync::Arc<T>> {
        let value = self.resolve(namespace)?;
        value.downcast::<T>().ok_or_else(|| RescacheError::TypeMismatch {
            namespace: namespace.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    fn resolve_upstream(&mut self, binding: &Binding) -> RescacheResult<Upstream> {
        let mut upstream = Upstream::default();
        for required in binding.requires() {
            let value = self.resolve(required)?;
            upstream.insert(required, value);
        }
        Ok(upstream)
    }

    /// Every namespace touched so far, in completion order
    pub fn trace(&self) -> &[Resolution] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<Resolution> {
        self.trace
    }
}
