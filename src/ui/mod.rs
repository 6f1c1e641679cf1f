//! Terminal output helpers
//!
//! Uses `cliclack` for styled output in a terminal and falls back to plain
//! bracketed prefixes when stdout is piped or running under CI.

mod context;
mod output;
mod theme;

pub use context::UiContext;
pub use output::{intro, key_value, section, step_info, step_ok, step_ok_detail, step_warn_hint};
pub use theme::{init_theme, RescacheTheme};
