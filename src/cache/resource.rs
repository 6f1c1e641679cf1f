//! Namespace-to-slot cache owned by a single workspace
//!
//! The cache holds at most one slot per namespace. Writing a value under a
//! different fingerprint replaces the previous slot outright, whatever its
//! reference count. All mutation goes through `&mut self`, so a lookup and the
//! insert that follows a miss can never interleave with another caller.

use crate::cache::key::{compose, CacheKey, Dependency};
use crate::cache::slot::{AnyValue, ResourceSlot};
use crate::error::{RescacheError, RescacheResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a get-or-insert call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lookup {
    /// Existing value returned, nothing constructed
    Hit,
    /// Value constructed and written back
    Miss,
}

/// Counters for cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    /// Slots replaced because their fingerprint went stale
    pub supersessions: u64,
    pub evictions: u64,
}

/// Snapshot of one slot for reporting
#[derive(Debug, Clone, Serialize)]
pub struct SlotInfo {
    pub namespace: String,
    pub digest: String,
    pub dependencies: usize,
    pub generation: u64,
    pub ref_count: usize,
    pub type_name: &'static str,
    pub created_at: DateTime<Utc>,
}

/// Dependency-keyed cache of store instances
#[derive(Debug, Default)]
pub struct ResourceCache {
    slots: HashMap<String, ResourceSlot>,
    stats: CacheStats,
    last_generation: u64,
}

impl ResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `namespace`, only if its fingerprint matches
    /// `dependencies` exactly. Never constructs anything.
    pub fn get<T: Any + Send + Sync>(
        &self,
        namespace: &str,
        dependencies: &[Dependency],
    ) -> Option<Arc<T>> {
        let value = self.get_erased(namespace, dependencies)?;
        let typed = value.downcast::<T>();
        if typed.is_none() {
            warn!(
                "Cached {} is a {}, not a {}",
                namespace,
                value.type_name(),
                std::any::type_name::<T>()
            );
        }
        typed
    }

    /// Type-erased form of [`ResourceCache::get`]
    pub fn get_erased(&self, namespace: &str, dependencies: &[Dependency]) -> Option<&AnyValue> {
        self.slots
            .get(namespace)
            .filter(|slot| slot.fingerprint().matches(namespace, dependencies))
            .map(ResourceSlot::value)
    }

    /// Store `value` under `namespace`, replacing any previous slot
    pub fn set<T: Any + Send + Sync>(
        &mut self,
        namespace: &str,
        dependencies: Vec<Dependency>,
        value: Arc<T>,
    ) -> RescacheResult<()> {
        let key = compose(namespace, dependencies)?;
        self.insert_slot(key, AnyValue::new(value));
        Ok(())
    }

    /// Return the cached value for this exact fingerprint, or build it with
    /// `factory` and store it.
    pub fn get_or_insert_with<T, F>(
        &mut self,
        namespace: &str,
        dependencies: &[Dependency],
        factory: F,
    ) -> RescacheResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.try_get_or_insert_with(namespace, dependencies, || {
            Ok::<_, RescacheError>(factory())
        })
    }

    /// Fallible form of [`ResourceCache::get_or_insert_with`].
    ///
    /// When `factory` fails nothing is stored, and any stale slot for the
    /// namespace is dropped so the cache holds no slot for it.
    pub fn try_get_or_insert_with<T, E, F>(
        &mut self,
        namespace: &str,
        dependencies: &[Dependency],
        factory: F,
    ) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        E: From<RescacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        let (value, _) = self.try_get_or_insert_erased(
            namespace,
            dependencies.to_vec(),
            TypeId::of::<T>(),
            || factory().map(|value| AnyValue::new(Arc::new(value))),
        )?;

        value.downcast::<T>().ok_or_else(|| {
            E::from(RescacheError::TypeMismatch {
                namespace: namespace.to_string(),
                expected: std::any::type_name::<T>(),
            })
        })
    }

    /// Type-erased get-or-insert used by store resolution. A cached value of
    /// a different type than `type_id` counts as a miss.
    pub fn try_get_or_insert_erased<E, F>(
        &mut self,
        namespace: &str,
        dependencies: Vec<Dependency>,
        type_id: TypeId,
        factory: F,
    ) -> Result<(AnyValue, Lookup), E>
    where
        E: From<RescacheError>,
        F: FnOnce() -> Result<AnyValue, E>,
    {
        let key = compose(namespace, dependencies)?;

        if let Some(value) = self.get_erased(namespace, key.dependencies()) {
            if value.type_id() == type_id {
                let value = value.clone();
                self.stats.hits += 1;
                debug!("Cache hit for {}", key);
                return Ok((value, Lookup::Hit));
            }
            warn!(
                "Cached {} has type {}, rebuilding",
                namespace,
                value.type_name()
            );
        }

        self.stats.misses += 1;
        debug!("Cache miss for {}", key);

        match factory() {
            Ok(value) => {
                self.insert_slot(key, value.clone());
                Ok((value, Lookup::Miss))
            }
            Err(e) => {
                if self.slots.remove(namespace).is_some() {
                    debug!("Dropped stale slot for {} after failed construction", namespace);
                }
                Err(e)
            }
        }
    }

    fn insert_slot(&mut self, key: CacheKey, value: AnyValue) {
        let namespace = key.namespace().to_string();
        self.stats.inserts += 1;

        if let Some(previous) = self.slots.get_mut(&namespace) {
            if previous.fingerprint() == &key {
                // Same fingerprint: attached consumers stay counted
                debug!("Replacing value of {} in place", key);
                previous.replace_value(value);
                return;
            }

            self.stats.supersessions += 1;
            info!(
                "Superseding {} with {} ({} consumer(s) on the stale slot)",
                previous.fingerprint(),
                key,
                previous.ref_count()
            );
        }

        self.last_generation += 1;
        let slot = ResourceSlot::new(key, value, self.last_generation);
        self.slots.insert(namespace, slot);
    }

    /// The fingerprint currently held for `namespace`
    pub fn fingerprint(&self, namespace: &str) -> Option<&CacheKey> {
        self.slots.get(namespace).map(ResourceSlot::fingerprint)
    }

    /// Generation of the live slot for `namespace`. A slot rebuilt after
    /// removal gets a new generation even under the same fingerprint.
    pub fn generation(&self, namespace: &str) -> Option<u64> {
        self.slots.get(namespace).map(ResourceSlot::generation)
    }

    /// Attach a consumer to the slot holding exactly `key`.
    /// Returns the generation attached to, or `None` if no such slot is live.
    pub fn attach(&mut self, key: &CacheKey) -> Option<u64> {
        let slot = self
            .slots
            .get_mut(key.namespace())
            .filter(|slot| slot.fingerprint() == key)?;
        slot.acquire();
        Some(slot.generation())
    }

    /// Detach a consumer from the slot of `namespace` with `generation`.
    /// Returns the new reference count, or `None` when that slot is gone.
    /// The slot itself stays until superseded or evicted.
    pub fn release(&mut self, namespace: &str, generation: u64) -> Option<usize> {
        let slot = self
            .slots
            .get_mut(namespace)
            .filter(|slot| slot.generation() == generation)?;
        Some(slot.release())
    }

    /// Reference count of the slot for `namespace`
    pub fn ref_count(&self, namespace: &str) -> Option<usize> {
        self.slots.get(namespace).map(ResourceSlot::ref_count)
    }

    /// Eviction pass: drop every slot no consumer is attached to.
    /// Returns the evicted namespaces, sorted.
    pub fn evict_unreferenced(&mut self) -> Vec<String> {
        let mut evicted: Vec<String> = self
            .slots
            .iter()
            .filter(|(_, slot)| !slot.is_referenced())
            .map(|(namespace, _)| namespace.clone())
            .collect();
        evicted.sort();

        for namespace in &evicted {
            self.slots.remove(namespace);
            info!("Evicted unreferenced slot {}", namespace);
        }
        self.stats.evictions += evicted.len() as u64;

        evicted
    }

    /// Drop the slot for `namespace`, whatever its fingerprint
    pub fn invalidate(&mut self, namespace: &str) -> bool {
        let removed = self.slots.remove(namespace).is_some();
        if removed {
            self.stats.evictions += 1;
            debug!("Invalidated {}", namespace);
        }
        removed
    }

    /// Drop every slot
    pub fn clear(&mut self) -> usize {
        let count = self.slots.len();
        self.slots.clear();
        self.stats.evictions += count as u64;
        count
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.slots.contains_key(namespace)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Namespaces with a live slot, sorted
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Snapshot of every live slot, sorted by namespace
    pub fn entries(&self) -> Vec<SlotInfo> {
        let mut entries: Vec<SlotInfo> = self
            .slots
            .iter()
            .map(|(namespace, slot)| SlotInfo {
                namespace: namespace.clone(),
                digest: slot.fingerprint().digest(),
                dependencies: slot.fingerprint().dependencies().len(),
                generation: slot.generation(),
                ref_count: slot.ref_count(),
                type_name: slot.value().type_name(),
                created_at: slot.created_at(),
            })
            .collect();
        entries.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Client(&'static str);

    #[derive(Debug)]
    struct DocumentStore(&'static str);

    fn deps(handles: &[&Arc<Client>]) -> Vec<Dependency> {
        handles.iter().map(|h| Dependency::of(*h)).collect()
    }

    #[test]
    fn hit_is_idempotent_and_identical() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let store = Arc::new(DocumentStore("a"));

        cache.set("documentStore", deps(&[&c1]), Arc::clone(&store)).unwrap();

        let first = cache.get::<DocumentStore>("documentStore", &deps(&[&c1])).unwrap();
        let second = cache.get::<DocumentStore>("documentStore", &deps(&[&c1])).unwrap();
        assert!(Arc::ptr_eq(&first, &store));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn different_fingerprint_is_absent() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let c2 = Arc::new(Client("c2"));

        cache.set("historyStore", deps(&[&c1]), Arc::new(DocumentStore("h"))).unwrap();

        assert!(cache.get::<DocumentStore>("historyStore", &deps(&[&c2])).is_none());
        assert!(cache.get::<DocumentStore>("historyStore", &deps(&[&c1, &c2])).is_none());
        assert!(cache.get::<DocumentStore>("historyStore", &[]).is_none());
    }

    #[test]
    fn set_supersedes_previous_fingerprint() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let c2 = Arc::new(Client("c2"));
        let v2 = Arc::new(DocumentStore("v2"));

        cache.set("documentStore", deps(&[&c1]), Arc::new(DocumentStore("v1"))).unwrap();
        cache.set("documentStore", deps(&[&c2]), Arc::clone(&v2)).unwrap();

        assert!(cache.get::<DocumentStore>("documentStore", &deps(&[&c1])).is_none());
        let got = cache.get::<DocumentStore>("documentStore", &deps(&[&c2])).unwrap();
        assert!(Arc::ptr_eq(&got, &v2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().supersessions, 1);
    }

    #[test]
    fn supersession_ignores_ref_count() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let c2 = Arc::new(Client("c2"));

        cache.set("presenceStore", deps(&[&c1]), Arc::new(DocumentStore("p1"))).unwrap();
        let key = cache.fingerprint("presenceStore").cloned().unwrap();
        let generation = cache.attach(&key).unwrap();
        assert_eq!(cache.ref_count("presenceStore"), Some(1));

        cache.set("presenceStore", deps(&[&c2]), Arc::new(DocumentStore("p2"))).unwrap();
        assert_eq!(cache.ref_count("presenceStore"), Some(0));
        assert_ne!(cache.generation("presenceStore"), Some(generation));
        assert_eq!(cache.release("presenceStore", generation), None);
    }

    #[test]
    fn set_with_unchanged_fingerprint_keeps_consumers() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let store = Arc::new(DocumentStore("h"));

        cache.set("historyStore", deps(&[&c1]), Arc::clone(&store)).unwrap();
        let key = cache.fingerprint("historyStore").cloned().unwrap();
        let generation = cache.attach(&key).unwrap();

        cache.set("historyStore", deps(&[&c1]), Arc::clone(&store)).unwrap();

        assert_eq!(cache.ref_count("historyStore"), Some(1));
        assert_eq!(cache.generation("historyStore"), Some(generation));
        assert_eq!(cache.stats().supersessions, 0);
        assert!(cache.evict_unreferenced().is_empty());
        assert!(cache.contains("historyStore"));
    }

    #[test]
    fn rebuilt_slot_gets_new_generation() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));

        cache.set("historyStore", deps(&[&c1]), Arc::new(DocumentStore("h1"))).unwrap();
        let key = cache.fingerprint("historyStore").cloned().unwrap();
        let generation = cache.attach(&key).unwrap();

        assert!(cache.invalidate("historyStore"));
        cache.set("historyStore", deps(&[&c1]), Arc::new(DocumentStore("h2"))).unwrap();

        assert_ne!(cache.generation("historyStore"), Some(generation));
        assert_eq!(cache.ref_count("historyStore"), Some(0));
        // Releasing the dropped slot must not touch the rebuilt one
        assert_eq!(cache.release("historyStore", generation), None);
    }

    #[test]
    fn namespaces_are_independent() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));

        cache.set("historyStore", deps(&[&c1]), Arc::new(DocumentStore("h"))).unwrap();
        assert!(cache.get::<DocumentStore>("projectStore", &deps(&[&c1])).is_none());

        cache.set("projectStore", deps(&[&c1]), Arc::new(DocumentStore("p"))).unwrap();
        let history = cache.get::<DocumentStore>("historyStore", &deps(&[&c1])).unwrap();
        assert_eq!(history.0, "h");
    }

    #[test]
    fn dependency_order_matters() {
        let mut cache = ResourceCache::new();
        let a = Arc::new(Client("a"));
        let b = Arc::new(Client("b"));

        cache.set("documentStore", deps(&[&a, &b]), Arc::new(DocumentStore("ab"))).unwrap();
        assert!(cache.get::<DocumentStore>("documentStore", &deps(&[&b, &a])).is_none());
    }

    #[test]
    fn client_swap_scenario() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let store_a = Arc::new(DocumentStore("A"));

        cache.set("documentStore", deps(&[&c1]), Arc::clone(&store_a)).unwrap();
        let got = cache.get::<DocumentStore>("documentStore", &deps(&[&c1])).unwrap();
        assert!(Arc::ptr_eq(&got, &store_a));

        let c2 = Arc::new(Client("c2"));
        assert!(cache.get::<DocumentStore>("documentStore", &deps(&[&c2])).is_none());

        let store_b = Arc::new(DocumentStore("B"));
        cache.set("documentStore", deps(&[&c2]), Arc::clone(&store_b)).unwrap();

        assert!(cache.get::<DocumentStore>("documentStore", &deps(&[&c1])).is_none());
        let got = cache.get::<DocumentStore>("documentStore", &deps(&[&c2])).unwrap();
        assert!(Arc::ptr_eq(&got, &store_b));
    }

    #[test]
    fn get_or_insert_constructs_once() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let mut builds = 0;

        let first = cache
            .get_or_insert_with("historyStore", &deps(&[&c1]), || {
                builds += 1;
                DocumentStore("h")
            })
            .unwrap();
        let second = cache
            .get_or_insert_with("historyStore", &deps(&[&c1]), || {
                builds += 1;
                DocumentStore("h2")
            })
            .unwrap();

        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn failed_construction_leaves_no_slot() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));
        let c2 = Arc::new(Client("c2"));

        cache.set("projectStore", deps(&[&c1]), Arc::new(DocumentStore("p"))).unwrap();

        let result: RescacheResult<Arc<DocumentStore>> =
            cache.try_get_or_insert_with("projectStore", &deps(&[&c2]), || {
                Err(RescacheError::construction("projectStore", "no project id"))
            });

        assert!(matches!(result, Err(RescacheError::Construction { .. })));
        assert!(!cache.contains("projectStore"));
    }

    #[test]
    fn empty_namespace_is_rejected_before_construction() {
        let mut cache = ResourceCache::new();
        let mut built = false;
        let result = cache.get_or_insert_with("", &[], || {
            built = true;
            DocumentStore("x")
        });

        assert!(matches!(result, Err(RescacheError::EmptyNamespace)));
        assert!(!built);
    }

    #[test]
    fn type_mismatch_rebuilds() {
        let mut cache = ResourceCache::new();
        cache.set("settingsStore", vec![], Arc::new(Client("wrong"))).unwrap();

        assert!(cache.get::<DocumentStore>("settingsStore", &[]).is_none());
        let store = cache
            .get_or_insert_with("settingsStore", &[], || DocumentStore("s"))
            .unwrap();
        assert_eq!(store.0, "s");
    }

    #[test]
    fn eviction_pass_keeps_referenced_slots() {
        let mut cache = ResourceCache::new();
        let c1 = Arc::new(Client("c1"));

        cache.set("historyStore", deps(&[&c1]), Arc::new(DocumentStore("h"))).unwrap();
        cache.set("projectStore", deps(&[&c1]), Arc::new(DocumentStore("p"))).unwrap();

        let key = cache.fingerprint("historyStore").cloned().unwrap();
        let generation = cache.attach(&key).unwrap();

        assert_eq!(cache.evict_unreferenced(), vec!["projectStore".to_string()]);
        assert!(cache.contains("historyStore"));

        assert_eq!(cache.release("historyStore", generation), Some(0));
        assert_eq!(cache.evict_unreferenced(), vec!["historyStore".to_string()]);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn entries_are_sorted() {
        let mut cache = ResourceCache::new();
        cache.set("projectStore", vec![], Arc::new(DocumentStore("p"))).unwrap();
        cache.set("grantsStore", vec![], Arc::new(DocumentStore("g"))).unwrap();

        let entries = cache.entries();
        assert_eq!(entries[0].namespace, "grantsStore");
        assert_eq!(entries[1].namespace, "projectStore");
        assert_eq!(cache.namespaces(), vec!["grantsStore", "projectStore"]);
    }

    #[test]
    fn invalidate_and_clear() {
        let mut cache = ResourceCache::new();
        cache.set("projectStore", vec![], Arc::new(DocumentStore("p"))).unwrap();
        cache.set("grantsStore", vec![], Arc::new(DocumentStore("g"))).unwrap();

        assert!(cache.invalidate("projectStore"));
        assert!(!cache.invalidate("projectStore"));
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }
}
