//! Dependency-keyed resource cache
//!
//! Each namespace (one per store kind) maps to at most one live slot. A slot
//! remembers the exact dependency handles its value was built from; a lookup
//! with any other handle sequence is a miss.
//!
//! # Slot lifecycle
//!
//! | Event | Effect |
//! |-------|--------|
//! | Miss | Caller constructs, value written with a new fingerprint |
//! | Hit | Same instance returned, no write |
//! | Set, same fingerprint | Value replaced in place, consumers kept |
//! | Dependency change | Old slot superseded, regardless of ref count |
//! | Eviction pass | Slots with zero attached consumers dropped |
//! | Rebuilt after removal | New generation, no consumers |
//! | Workspace dropped | Whole cache dropped |

pub mod key;
pub mod resource;
pub mod slot;

pub use key::{compose, matches, CacheKey, Dependency};
pub use resource::{CacheStats, Lookup, ResourceCache, SlotInfo};
pub use slot::{AnyValue, ResourceSlot};
