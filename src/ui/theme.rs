//! Theme for cliclack output

use cliclack::ThemeState;
use console::Style;

/// Cyan bars, green on submit
#[derive(Debug, Clone, Default)]
pub struct RescacheTheme;

impl cliclack::Theme for RescacheTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().cyan(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().cyan().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active | ThemeState::Submit => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
        }
    }
}

/// Install the theme globally
pub fn init_theme() {
    cliclack::set_theme(RescacheTheme);
}
