//! Consumer attachment protocol
//!
//! A consumer (a view, a command, a background task) asks its workspace for
//! one store kind on every evaluation pass. The first request attaches it to
//! the cached slot; repeated requests with unchanged dependencies are no-ops
//! that hand back the same instance; changed dependencies move the
//! attachment to the new slot. Detaching only drops the reference count.

use crate::cache::CacheKey;
use crate::context::Workspace;
use crate::error::{RescacheError, RescacheResult};
use crate::stores::StoreKind;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Attachment state of one consumer for one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerState {
    Unattached,
    /// Counted on the slot with this fingerprint and generation
    Attached { fingerprint: CacheKey, generation: u64 },
}

/// A consumer of one store kind
#[derive(Debug)]
pub struct StoreConsumer<T> {
    namespace: String,
    state: ConsumerState,
    current: Option<Arc<T>>,
}

impl<T: Any + Send + Sync> StoreConsumer<T> {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            state: ConsumerState::Unattached,
            current: None,
        }
    }

    /// Consumer of a built-in store kind
    pub fn for_kind(kind: StoreKind) -> Self {
        Self::new(kind.namespace())
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn state(&self) -> &ConsumerState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.state, ConsumerState::Attached { .. })
    }

    /// The store handed out by the last request
    pub fn current(&self) -> Option<&Arc<T>> {
        self.current.as_ref()
    }

    /// Request the store for this pass, attaching if needed.
    ///
    /// The attachment follows the live slot, not just its fingerprint: a slot
    /// rebuilt under the same fingerprint after being dropped is attached to
    /// afresh.
    pub fn request(&mut self, workspace: &mut Workspace) -> RescacheResult<Arc<T>> {
        let store = workspace.resolve::<T>(&self.namespace)?;
        self.current = Some(Arc::clone(&store));

        let live = workspace.cache().generation(&self.namespace);
        if let ConsumerState::Attached { generation, .. } = &self.state {
            if live == Some(*generation) {
                return Ok(store);
            }
        }

        let fingerprint = workspace
            .cache()
            .fingerprint(&self.namespace)
            .cloned()
            .ok_or_else(|| {
                RescacheError::Internal(format!("{} resolved without a slot", self.namespace))
            })?;

        if let ConsumerState::Attached { generation, .. } =
            std::mem::replace(&mut self.state, ConsumerState::Unattached)
        {
            // Usually a no-op: the held slot was superseded or dropped already
            workspace.cache_mut().release(&self.namespace, generation);
        }

        let generation = workspace.cache_mut().attach(&fingerprint).ok_or_else(|| {
            RescacheError::Internal(format!("no live slot for {}", fingerprint))
        })?;
        debug!("Consumer attached to {} (generation {})", fingerprint, generation);
        self.state = ConsumerState::Attached {
            fingerprint,
            generation,
        };

        Ok(store)
    }

    /// Detach from the slot. Returns false if the consumer was not attached.
    pub fn detach(&mut self, workspace: &mut Workspace) -> bool {
        match std::mem::replace(&mut self.state, ConsumerState::Unattached) {
            ConsumerState::Attached {
                fingerprint,
                generation,
            } => {
                workspace.cache_mut().release(&self.namespace, generation);
                self.current = None;
                debug!("Consumer detached from {}", fingerprint);
                true
            }
            ConsumerState::Unattached => false,
        }
    }
}
