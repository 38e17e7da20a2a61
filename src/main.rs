//! kterm command-line entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use kterm::commands;
use kterm::feed::PackageFetch;
use kterm::host::{ConsoleUi, HostUi};
use kterm::launcher::{self, LaunchError, LaunchRequest};
use kterm::resolver::{OsProbe, Terminal, install_dir};
use kterm::settings;
use kterm::state::AppState;

#[derive(Parser)]
#[command(
    name = "kterm",
    version,
    about = "Open a terminal at a project directory and run project commands"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a terminal rooted at PATH (default: current directory)
    Open {
        /// File or directory to open the terminal at
        path: Option<PathBuf>,
        /// Parameter passed to the terminal; %CWD% expands to the target
        /// directory. Repeatable; defaults come from the settings file.
        #[arg(long = "parameter", value_name = "PARAM")]
        parameters: Vec<String>,
    },
    /// Pick a project command from project.json and run it in a terminal
    Run {
        /// Project root (default: current directory)
        path: Option<PathBuf>,
    },
    /// Fetch the package-name list from the release feed
    Packages {
        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = ConsoleUi;

    let settings = settings::load_settings();
    let terminal = Terminal::detect(&OsProbe, &install_dir());
    let state = AppState::new(terminal, settings);

    match cli.command {
        Commands::Open { path, parameters } => {
            open_terminal(&state, &ui, path.as_deref(), parameters)
        }
        Commands::Run { path } => {
            let root = path.unwrap_or_else(|| PathBuf::from("."));
            match commands::run_project_command(&state, &ui, &root) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    ui.error_message(&e.to_string());
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Packages { timeout } => fetch_packages(&ui, timeout),
    }
}

fn open_terminal(
    state: &AppState,
    ui: &dyn HostUi,
    path: Option<&Path>,
    parameters: Vec<String>,
) -> ExitCode {
    let parameters = if parameters.is_empty() {
        state.settings.parameters.clone()
    } else {
        parameters
    };

    let Some(dir) = launcher::resolve_target(path) else {
        ui.error_message(&LaunchError::NoSaveLocation.to_string());
        return ExitCode::FAILURE;
    };

    let request = LaunchRequest { dir, parameters };
    match launcher::launch(&state.terminal, &request) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui.error_message(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn fetch_packages(ui: &dyn HostUi, timeout_secs: u64) -> ExitCode {
    let fetch = PackageFetch::spawn(Duration::from_secs(timeout_secs));
    match fetch.wait() {
        Ok(names) => {
            for name in names {
                println!("{name}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            ui.error_message(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
