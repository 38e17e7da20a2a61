//! Process-wide application state.

use crate::resolver::Terminal;
use crate::settings::Settings;

/// Everything the commands need: the resolved terminal and the loaded
/// settings. Constructed once in `main` and passed by reference.
pub struct AppState {
    pub terminal: Terminal,
    pub settings: Settings,
}

impl AppState {
    pub fn new(terminal: Terminal, settings: Settings) -> Self {
        Self { terminal, settings }
    }
}
