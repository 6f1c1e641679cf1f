//! Store factory bindings
//!
//! A binding declares, for one namespace, which other bindings it needs, the
//! ordered dependency list its store closes over, and how to construct it.
//! The dependency list must name every handle the store captures; a change in
//! any of them has to invalidate the cached instance.

use crate::cache::{AnyValue, Dependency};
use crate::context::SourceContext;
use crate::error::{ConfigurationError, RescacheError, RescacheResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type DependencyFn =
    dyn Fn(&SourceContext, &Upstream) -> RescacheResult<Vec<Dependency>> + Send + Sync;
type ConstructFn = dyn Fn(&SourceContext, &Upstream) -> RescacheResult<AnyValue> + Send + Sync;

/// Already-resolved upstream stores handed to a binding
#[derive(Debug, Default, Clone)]
pub struct Upstream {
    values: HashMap<String, AnyValue>,
}

impl Upstream {
    pub(crate) fn insert(&mut self, namespace: &str, value: AnyValue) {
        self.values.insert(namespace.to_string(), value);
    }

    /// Typed handle to an upstream store
    pub fn get<T: Any + Send + Sync>(&self, namespace: &str) -> RescacheResult<Arc<T>> {
        let value = self.values.get(namespace).ok_or_else(|| {
            RescacheError::from(ConfigurationError::UnknownBinding(namespace.to_string()))
        })?;

        value.downcast::<T>().ok_or_else(|| RescacheError::TypeMismatch {
            namespace: namespace.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Identity of an upstream store, for use in a dependency list
    pub fn dependency(&self, namespace: &str) -> RescacheResult<Dependency> {
        let value = self.values.get(namespace).ok_or_else(|| {
            RescacheError::from(ConfigurationError::UnknownBinding(namespace.to_string()))
        })?;
        Ok(Dependency::erased(
            Arc::clone(value.as_any()),
            value.type_name(),
        ))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Declared (dependencies, construct) pair for one store kind
pub struct Binding {
    namespace: String,
    requires: Vec<String>,
    type_id: TypeId,
    type_name: &'static str,
    dependencies: Box<DependencyFn>,
    construct: Box<ConstructFn>,
}

impl Binding {
    /// Declare a binding producing a `T`
    pub fn new<T, D, C>(namespace: &str, requires: &[&str], dependencies: D, construct: C) -> Self
    where
        T: Any + Send + Sync,
        D: Fn(&SourceContext, &Upstream) -> RescacheResult<Vec<Dependency>> + Send + Sync + 'static,
        C: Fn(&SourceContext, &Upstream) -> RescacheResult<T> + Send + Sync + 'static,
    {
        Self {
            namespace: namespace.to_string(),
            requires: requires.iter().map(|r| r.to_string()).collect(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dependencies: Box::new(dependencies),
            construct: Box::new(move |context, upstream| {
                construct(context, upstream).map(|store| AnyValue::new(Arc::new(store)))
            }),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Upstream namespaces, in declaration order
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Ordered dependency list for the current context
    pub fn dependencies(
        &self,
        context: &SourceContext,
        upstream: &Upstream,
    ) -> RescacheResult<Vec<Dependency>> {
        (self.dependencies)(context, upstream)
    }

    /// Build a new store. Any failure is reported as a construction error
    /// for this namespace.
    pub fn construct(
        &self,
        context: &SourceContext,
        upstream: &Upstream,
    ) -> RescacheResult<AnyValue> {
        (self.construct)(context, upstream).map_err(|e| match e {
            e @ RescacheError::Construction { .. } => e,
            other => RescacheError::construction(&self.namespace, other.to_string()),
        })
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("namespace", &self.namespace)
            .field("requires", &self.requires)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
