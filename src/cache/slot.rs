//! A single cached value with its dependency fingerprint

use crate::cache::key::CacheKey;
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A type-erased store instance plus the type it was created as
#[derive(Clone)]
pub struct AnyValue {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl AnyValue {
    /// Erase a shared value, remembering its concrete type
    pub fn new<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether the erased value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Recover the typed handle, sharing the same allocation
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        if !self.is::<T>() {
            return None;
        }
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// The erased handle
    pub fn as_any(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.value
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both values are the same instance
    pub fn ptr_eq(&self, other: &AnyValue) -> bool {
        Arc::as_ptr(&self.value) as *const () == Arc::as_ptr(&other.value) as *const ()
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{:p}",
            self.type_name,
            Arc::as_ptr(&self.value) as *const ()
        )
    }
}

/// One live cached instance for a namespace
#[derive(Debug)]
pub struct ResourceSlot {
    value: AnyValue,
    fingerprint: CacheKey,
    generation: u64,
    ref_count: usize,
    created_at: DateTime<Utc>,
}

impl ResourceSlot {
    /// Create a slot with no attached consumers. `generation` must be unique
    /// within the owning cache so a rebuilt slot is never mistaken for the one
    /// it replaced, even under an identical fingerprint.
    pub fn new(fingerprint: CacheKey, value: AnyValue, generation: u64) -> Self {
        Self {
            value,
            fingerprint,
            generation,
            ref_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn value(&self) -> &AnyValue {
        &self.value
    }

    /// Swap the value in place, keeping generation and attached consumers
    pub fn replace_value(&mut self, value: AnyValue) {
        self.value = value;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fingerprint(&self) -> &CacheKey {
        &self.fingerprint
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether any consumer is attached
    pub fn is_referenced(&self) -> bool {
        self.ref_count > 0
    }

    /// Record one more attached consumer, returning the new count
    pub fn acquire(&mut self) -> usize {
        self.ref_count += 1;
        self.ref_count
    }

    /// Record one detached consumer, returning the new count.
    /// Never drops below zero.
    pub fn release(&mut self) -> usize {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count
    }
}
