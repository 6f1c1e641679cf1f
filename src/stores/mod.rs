//! Store factory bindings and resolution
//!
//! Built-in kinds and how they key:
//!
//! | Store | Requires | Keyed by |
//! |-------|----------|----------|
//! | grantsStore | | client, userStore |
//! | historyStore | | client |
//! | crossProjectTokenStore | | client |
//! | documentPreviewStore | crossProjectTokenStore | client, crossProjectTokenStore |
//! | documentStore | historyStore, documentPreviewStore | client, documentPreviewStore, historyStore, schema |
//! | connectionStatusStore | | bifur |
//! | presenceStore | connectionStatusStore | bifur, connectionStatusStore, userStore |
//! | projectStore | | client |
//! | settingsStore | | workspace |

pub mod binding;
pub mod graph;
pub mod kinds;
pub mod registry;
pub mod resolve;

pub use binding::{Binding, Upstream};
pub use graph::BindingGraph;
pub use kinds::{
    ConnectionStatusStore, CrossProjectTokenStore, DocumentPreviewStore, DocumentStore,
    GrantsStore, HistoryStore, PresenceStore, ProjectStore, SettingsStore, StoreKind,
};
pub use registry::BindingRegistry;
pub use resolve::{Resolution, Resolver};
