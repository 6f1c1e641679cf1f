//! rescache - Dependency-keyed resource cache for studio stores
//!
//! Builds each per-workspace store (documents, history, presence, ...) at
//! most once per set of live dependencies, and supersedes it when any of
//! those dependencies is replaced.

pub mod cache;
pub mod cli;
pub mod config;
pub mod consumer;
pub mod context;
pub mod error;
pub mod stores;
pub mod ui;

pub use cache::{CacheKey, Dependency, ResourceCache};
pub use consumer::{ConsumerState, StoreConsumer};
pub use context::{SourceContext, Workspace};
pub use error::{ConfigurationError, RescacheError, RescacheResult};
pub use stores::{Binding, BindingRegistry, StoreKind};
