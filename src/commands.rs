//! Project command listing from the optional `project.json` manifest.

use std::fmt;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::host::HostUi;
use crate::launcher::{self, LaunchError, LaunchRequest};
use crate::state::AppState;

/// Manifest file looked up in the project root.
pub const MANIFEST_FILE: &str = "project.json";

/// Invocation marker prefixed to every manifest-declared command.
const RUNTIME_PREFIX: &str = "k ";

/// Commands always offered, after any manifest-declared ones.
const TRAILER_COMMANDS: &[&str] = &["k build", "kpm restore", "kpm pack"];

/// The optional on-disk project manifest. A missing `commands` field is an
/// empty contribution, not an error.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub commands: Vec<String>,
}

/// Why the manifest could not be read. `NotFound` is the quiet, expected
/// case; the other kinds are logged but still yield the default list.
#[derive(Debug)]
pub enum ManifestError {
    NotFound,
    Io(String),
    Parse(String),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::NotFound => write!(f, "{MANIFEST_FILE} not found"),
            ManifestError::Io(msg) => write!(f, "could not read {msg}"),
            ManifestError::Parse(msg) => write!(f, "could not parse {msg}"),
        }
    }
}

/// Read and decode `project.json` from `root`.
pub fn read_manifest(root: &Path) -> Result<ProjectManifest, ManifestError> {
    let path = root.join(MANIFEST_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ManifestError::NotFound),
        Err(e) => return Err(ManifestError::Io(format!("{}: {e}", path.display()))),
    };
    serde_json::from_str(&content)
        .map_err(|e| ManifestError::Parse(format!("{}: {e}", path.display())))
}

/// Build the selectable list: prefixed manifest commands first, the fixed
/// trailers always appended.
pub fn build_command_list(manifest_commands: &[String]) -> Vec<String> {
    let mut commands: Vec<String> = manifest_commands
        .iter()
        .map(|c| format!("{RUNTIME_PREFIX}{c}"))
        .collect();
    commands.extend(TRAILER_COMMANDS.iter().map(|c| c.to_string()));
    commands
}

/// Map a quick-panel selection to the single launch request it dispatches.
/// Cancellation or an out-of-range index dispatches nothing.
pub fn dispatch_for_selection(
    commands: &[String],
    selection: Option<usize>,
    root: &Path,
) -> Option<LaunchRequest> {
    let command = commands.get(selection?)?;
    Some(LaunchRequest {
        dir: root.to_string_lossy().to_string(),
        parameters: vec![command.clone()],
    })
}

/// Present the command list for the project at `root` and launch the chosen
/// command in a terminal. A missing or unreadable manifest is logged, never
/// a dialog; only launch failures are returned for the caller to surface.
pub fn run_project_command(
    state: &AppState,
    ui: &dyn HostUi,
    root: &Path,
) -> Result<(), LaunchError> {
    let manifest_commands = match read_manifest(root) {
        Ok(manifest) => manifest.commands,
        Err(e) => {
            eprintln!("[commands] {e}");
            Vec::new()
        }
    };

    let commands = build_command_list(&manifest_commands);
    let selection = ui.quick_panel(&commands);
    let Some(request) = dispatch_for_selection(&commands, selection, root) else {
        return Ok(());
    };
    launcher::launch(&state.terminal, &request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Terminal;
    use crate::settings::Settings;
    use std::cell::{Cell, RefCell};

    /// Recording fake of the host UI: a canned quick-panel answer plus
    /// counters for what was shown.
    struct FakeUi {
        selection: Option<usize>,
        shown: RefCell<Vec<String>>,
        errors: Cell<usize>,
    }

    impl FakeUi {
        fn answering(selection: Option<usize>) -> Self {
            Self {
                selection,
                shown: RefCell::new(Vec::new()),
                errors: Cell::new(0),
            }
        }
    }

    impl HostUi for FakeUi {
        fn error_message(&self, _message: &str) {
            self.errors.set(self.errors.get() + 1);
        }

        fn quick_panel(&self, items: &[String]) -> Option<usize> {
            *self.shown.borrow_mut() = items.to_vec();
            self.selection
        }
    }

    fn test_state() -> AppState {
        // A terminal that cannot exist: any dispatched launch fails with
        // TerminalNotFound instead of spawning a real process.
        AppState::new(
            Terminal {
                choice: "/nonexistent/kterm-test-terminal".into(),
            },
            Settings::default(),
        )
    }

    #[test]
    fn manifest_commands_are_prefixed_and_trailers_appended() {
        let list = build_command_list(&["build".to_string(), "test".to_string()]);
        assert_eq!(
            list,
            vec!["k build", "k test", "k build", "kpm restore", "kpm pack"]
        );
    }

    #[test]
    fn empty_manifest_yields_only_trailers() {
        assert_eq!(
            build_command_list(&[]),
            vec!["k build", "kpm restore", "kpm pack"]
        );
    }

    #[test]
    fn read_manifest_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            read_manifest(dir.path()),
            Err(ManifestError::NotFound)
        ));
    }

    #[test]
    fn read_manifest_decodes_commands() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"commands": ["build", "test"]}"#,
        )
        .unwrap();
        let manifest = read_manifest(dir.path()).unwrap();
        assert_eq!(manifest.commands, vec!["build", "test"]);
    }

    #[test]
    fn read_manifest_tolerates_missing_commands_field() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), r#"{"version": "1.0"}"#).unwrap();
        let manifest = read_manifest(dir.path()).unwrap();
        assert!(manifest.commands.is_empty());
    }

    #[test]
    fn read_manifest_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "not json").unwrap();
        assert!(matches!(
            read_manifest(dir.path()),
            Err(ManifestError::Parse(_))
        ));
    }

    #[test]
    fn cancellation_dispatches_nothing() {
        let commands = build_command_list(&[]);
        assert!(dispatch_for_selection(&commands, None, Path::new("/proj")).is_none());
    }

    #[test]
    fn selection_dispatches_the_chosen_command_as_sole_parameter() {
        let commands = build_command_list(&["build".to_string()]);
        let request = dispatch_for_selection(&commands, Some(0), Path::new("/proj")).unwrap();
        assert_eq!(request.dir, "/proj");
        assert_eq!(request.parameters, vec!["k build"]);
    }

    #[test]
    fn out_of_range_selection_dispatches_nothing() {
        let commands = build_command_list(&[]);
        assert!(dispatch_for_selection(&commands, Some(99), Path::new("/proj")).is_none());
    }

    #[test]
    fn missing_manifest_shows_trailers_and_no_error_dialog() {
        let dir = tempfile::TempDir::new().unwrap();
        let ui = FakeUi::answering(None);
        let result = run_project_command(&test_state(), &ui, dir.path());
        assert!(result.is_ok());
        assert_eq!(
            *ui.shown.borrow(),
            vec!["k build", "kpm restore", "kpm pack"]
        );
        assert_eq!(ui.errors.get(), 0);
    }

    #[test]
    fn manifest_commands_appear_in_the_panel() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"commands": ["build", "test"]}"#,
        )
        .unwrap();
        let ui = FakeUi::answering(None);
        run_project_command(&test_state(), &ui, dir.path()).unwrap();
        assert_eq!(
            *ui.shown.borrow(),
            vec!["k build", "k test", "k build", "kpm restore", "kpm pack"]
        );
    }

    #[test]
    fn selection_attempts_exactly_one_launch() {
        let dir = tempfile::TempDir::new().unwrap();
        let ui = FakeUi::answering(Some(0));
        // The fake terminal does not exist, so the one dispatched launch
        // surfaces as TerminalNotFound.
        let err = run_project_command(&test_state(), &ui, dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::TerminalNotFound(_)));
    }
}
