//! CLI command implementations

pub mod completions;
pub mod config;
pub mod graph;
pub mod resolve;
pub mod workspaces;

pub use completions::execute as completions;
pub use config::execute as config;
pub use graph::execute as graph;
pub use resolve::execute as resolve;
pub use workspaces::execute as workspaces;
