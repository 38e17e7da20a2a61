//! Terminal resolution.
//!
//! Desktop environments disagree about what "the terminal" is, so each
//! platform class gets its own selection strategy. The strategy is picked
//! once at startup via [`Terminal::detect`] and the resolved command is
//! carried in [`crate::AppState`] for the process lifetime; callers never
//! observe it changing mid-process.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

/// Coarse platform classes the resolver distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformClass {
    Windows,
    MacOs,
    LinuxDesktop,
}

impl PlatformClass {
    /// The class of the compile target.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            PlatformClass::Windows
        } else if cfg!(target_os = "macos") {
            PlatformClass::MacOs
        } else {
            PlatformClass::LinuxDesktop
        }
    }
}

// ---------------------------------------------------------------------------
// System probe
// ---------------------------------------------------------------------------

/// Read-only view of the host system used during resolution. Injectable so
/// every strategy runs under test on every host OS.
pub trait SystemProbe {
    /// Environment variable lookup. Unset and empty both yield None.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Whether a path exists on disk.
    fn file_exists(&self, path: &Path) -> bool;

    /// Command names of currently running processes. Platforms that never
    /// consult the process table may return an empty list.
    fn process_names(&self) -> Vec<String>;
}

/// Probe backed by the real operating system.
pub struct OsProbe;

impl SystemProbe for OsProbe {
    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn process_names(&self) -> Vec<String> {
        #[cfg(unix)]
        {
            match std::process::Command::new("ps").args(["-eo", "comm"]).output() {
                Ok(out) => String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .skip(1) // column header
                    .map(|line| line.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .collect(),
                Err(e) => {
                    eprintln!("[resolver] process listing failed: {e}");
                    Vec::new()
                }
            }
        }
        #[cfg(not(unix))]
        {
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Per-platform terminal selection. `resolve` always yields a non-empty
/// command; unrecognized environments fall back to a generic terminal
/// rather than failing.
pub trait TerminalStrategy: Send + Sync {
    fn resolve(&self, probe: &dyn SystemProbe, install_dir: &Path) -> String;
}

/// Pick the strategy for a platform class.
pub fn strategy_for(class: PlatformClass) -> &'static dyn TerminalStrategy {
    match class {
        PlatformClass::Windows => &WindowsStrategy,
        PlatformClass::MacOs => &MacStrategy,
        PlatformClass::LinuxDesktop => &LinuxDesktopStrategy,
    }
}

const POWERSHELL_SUBPATH: &str = "System32\\WindowsPowerShell\\v1.0\\powershell.exe";
const CMD_SUBPATH: &str = "System32\\cmd.exe";
const FALLBACK_SYSTEMROOT: &str = "C:\\Windows";

/// Windows: PowerShell through the bundled `PS.bat` wrapper when available,
/// plain `cmd.exe` otherwise.
pub struct WindowsStrategy;

impl TerminalStrategy for WindowsStrategy {
    fn resolve(&self, probe: &dyn SystemProbe, install_dir: &Path) -> String {
        let system_root = probe
            .env_var("SYSTEMROOT")
            .unwrap_or_else(|| FALLBACK_SYSTEMROOT.to_string());
        let powershell = Path::new(&system_root).join(POWERSHELL_SUBPATH);
        if probe.file_exists(&powershell) {
            // The wrapper needs the console profile and the install-dir env
            // var in place before the shell starts.
            #[cfg(windows)]
            crate::winconsole::prepare_powershell_profile(install_dir);
            install_dir.join("PS.bat").to_string_lossy().to_string()
        } else {
            Path::new(&system_root)
                .join(CMD_SUBPATH)
                .to_string_lossy()
                .to_string()
        }
    }
}

/// macOS: the bundled `Terminal.sh` script, marked executable on first use.
pub struct MacStrategy;

impl TerminalStrategy for MacStrategy {
    fn resolve(&self, _probe: &dyn SystemProbe, install_dir: &Path) -> String {
        let script = install_dir.join("Terminal.sh");
        #[cfg(unix)]
        ensure_executable(&script);
        script.to_string_lossy().to_string()
    }
}

lazy_static! {
    /// Session-manager process names recognized in `ps -eo comm` output.
    static ref SESSION_MANAGER: Regex =
        Regex::new(r"\A(gnome-session|ksmserver|xfce4-session)\z").unwrap();
}

/// Linux desktop: map the running session manager to its terminal emulator,
/// falling back to xterm when none of the known ones is running.
pub struct LinuxDesktopStrategy;

impl TerminalStrategy for LinuxDesktopStrategy {
    fn resolve(&self, probe: &dyn SystemProbe, _install_dir: &Path) -> String {
        let session = probe
            .process_names()
            .into_iter()
            .find(|name| SESSION_MANAGER.is_match(name));
        match session.as_deref() {
            Some("gnome-session") => "gnome-terminal",
            Some("xfce4-session") => "terminal",
            Some("ksmserver") => "konsole",
            _ => "xterm",
        }
        .to_string()
    }
}

#[cfg(unix)]
fn ensure_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let Ok(meta) = std::fs::metadata(path) else {
        return;
    };
    if meta.permissions().mode() & 0o111 == 0 {
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)) {
            eprintln!("[resolver] could not mark {} executable: {e}", path.display());
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved terminal
// ---------------------------------------------------------------------------

/// The terminal command resolved for this process. Computed once in `main`
/// and threaded through callers.
#[derive(Debug, Clone)]
pub struct Terminal {
    /// Executable path or bare command name.
    pub choice: String,
}

impl Terminal {
    /// Resolve for the current platform.
    pub fn detect(probe: &dyn SystemProbe, install_dir: &Path) -> Self {
        Self::detect_for(PlatformClass::current(), probe, install_dir)
    }

    /// Resolve for an explicit platform class.
    pub fn detect_for(class: PlatformClass, probe: &dyn SystemProbe, install_dir: &Path) -> Self {
        let choice = strategy_for(class).resolve(probe, install_dir);
        Self { choice }
    }
}

/// Directory the running executable lives in. The bundled wrapper scripts
/// (`PS.bat`, `Terminal.sh`) ship beside the binary.
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
