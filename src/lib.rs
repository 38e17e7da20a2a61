//! kterm: open a platform-appropriate terminal at a project directory,
//! list project commands from an optional manifest, and fetch package names
//! from the release feed for autocomplete.
//!
//! The library half holds everything testable; the `kterm` binary wires it
//! to a console front end.

pub mod commands;
pub mod feed;
pub mod host;
pub mod launcher;
pub mod resolver;
pub mod settings;
pub mod state;
#[cfg(windows)]
pub(crate) mod winconsole;

pub use launcher::{LaunchError, LaunchRequest};
pub use resolver::Terminal;
pub use state::AppState;
