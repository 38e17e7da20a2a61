//! Detached terminal launching with `%CWD%` parameter substitution.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::Command;

use crate::resolver::Terminal;

/// Placeholder token replaced with the target directory in each parameter.
pub const CWD_TOKEN: &str = "%CWD%";

/// One launch: a target directory plus parameter template strings.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub dir: String,
    pub parameters: Vec<String>,
}

/// Why a launch did not happen. `Display` is the user-facing dialog text.
#[derive(Debug)]
pub enum LaunchError {
    /// No target directory: the file was never saved and no folder is open.
    NoSaveLocation,
    /// The resolved terminal executable does not exist.
    TerminalNotFound(String),
    /// Any other spawn failure.
    Spawn(String),
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchError::NoSaveLocation => {
                write!(f, "No place to open a terminal: the target has not been saved to disk")
            }
            LaunchError::TerminalNotFound(choice) => {
                write!(f, "The terminal {choice} was not found")
            }
            LaunchError::Spawn(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LaunchError {}

/// Replace every occurrence of [`CWD_TOKEN`] with `dir`. Parameters without
/// the token pass through unchanged.
pub fn substitute_parameters(parameters: &[String], dir: &str) -> Vec<String> {
    parameters.iter().map(|p| p.replace(CWD_TOKEN, dir)).collect()
}

/// Spawn the resolved terminal detached, rooted at the request directory.
/// Fire and forget: the child is not waited on and no handle is kept.
pub fn launch(terminal: &Terminal, request: &LaunchRequest) -> Result<(), LaunchError> {
    if request.dir.is_empty() {
        return Err(LaunchError::NoSaveLocation);
    }

    let mut args = vec![terminal.choice.clone()];
    args.extend(substitute_parameters(&request.parameters, &request.dir));
    eprintln!("[launcher] {args:?}");

    let mut cmd = Command::new(&args[0]);
    cmd.args(&args[1..]).current_dir(&request.dir);
    apply_platform_flags(&mut cmd);

    match cmd.spawn() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(LaunchError::TerminalNotFound(terminal.choice.clone()))
        }
        Err(e) => Err(LaunchError::Spawn(format!("Failed to launch terminal: {e}"))),
    }
}

/// The child gets its own visible console window on Windows; elsewhere the
/// default spawn already detaches.
#[cfg(windows)]
fn apply_platform_flags(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    use windows_sys::Win32::System::Threading::CREATE_NEW_CONSOLE;
    cmd.creation_flags(CREATE_NEW_CONSOLE);
}

#[cfg(not(windows))]
fn apply_platform_flags(_cmd: &mut Command) {}

/// Resolve the launch target: an explicit path wins, then the current
/// directory. A file path is replaced by its parent directory.
pub fn resolve_target(path: Option<&Path>) -> Option<String> {
    let target = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let dir = if target.is_file() {
        target.parent()?.to_path_buf()
    } else {
        target
    };
    Some(dir.to_string_lossy().to_string())
}
