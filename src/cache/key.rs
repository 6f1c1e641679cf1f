//! Cache keys built from a namespace and an ordered list of dependencies
//!
//! Dependencies are live handles (API clients, schemas, other stores) and are
//! compared by identity, never by value. Two handles holding equal data are
//! still different dependencies.

use crate::error::{RescacheError, RescacheResult};
use sha2::{Digest, Sha256};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An identity token for one live value a store closes over
#[derive(Clone)]
pub struct Dependency {
    handle: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Dependency {
    /// Track the identity of a shared handle
    pub fn of<T: Any + Send + Sync>(handle: &Arc<T>) -> Self {
        Self {
            handle: Arc::clone(handle) as Arc<dyn Any + Send + Sync>,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Track the identity of an already type-erased handle
    pub fn erased(handle: Arc<dyn Any + Send + Sync>, type_name: &'static str) -> Self {
        Self { handle, type_name }
    }

    /// Address of the shared allocation, stable while the handle is alive
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.handle) as *const () as usize
    }

    /// Whether both tokens refer to the same allocation
    pub fn same_as(&self, other: &Dependency) -> bool {
        self.identity() == other.identity()
    }

    /// Type name of the tracked handle (diagnostics only)
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", short_type_name(self.type_name), self.identity())
    }
}

/// Namespace plus dependency fingerprint identifying one cached value
#[derive(Clone)]
pub struct CacheKey {
    namespace: String,
    dependencies: Vec<Dependency>,
}

impl CacheKey {
    /// The store kind this key belongs to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The recorded dependency sequence
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Whether this key was composed from exactly `namespace` and `dependencies`
    pub fn matches(&self, namespace: &str, dependencies: &[Dependency]) -> bool {
        self.namespace == namespace && same_sequence(&self.dependencies, dependencies)
    }

    /// Short hex digest of the namespace and dependency identities.
    ///
    /// Identities are allocation addresses, so the digest is only meaningful
    /// within one process.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.namespace.as_bytes());
        for dependency in &self.dependencies {
            hasher.update((dependency.identity() as u64).to_le_bytes());
        }
        let result = hasher.finalize();

        // First 12 hex characters (6 bytes)
        hex::encode(&result[..6])
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        other.matches(&self.namespace, &self.dependencies)
    }
}

impl Eq for CacheKey {}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("namespace", &self.namespace)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.digest())
    }
}

/// Compose a cache key. The namespace must be non-empty; an empty dependency
/// list is allowed.
pub fn compose(namespace: &str, dependencies: Vec<Dependency>) -> RescacheResult<CacheKey> {
    if namespace.is_empty() {
        return Err(RescacheError::EmptyNamespace);
    }

    Ok(CacheKey {
        namespace: namespace.to_string(),
        dependencies,
    })
}

/// Free-function form of [`CacheKey::matches`]
pub fn matches(key: &CacheKey, namespace: &str, dependencies: &[Dependency]) -> bool {
    key.matches(namespace, dependencies)
}

// Length differences are always a mismatch, never a prefix match.
fn same_sequence(left: &[Dependency], right: &[Dependency]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a.same_as(b))
}

fn short_type_name(name: &'static str) -> &'static str {
    name.rsplit("::").next().unwrap_or(name)
}
