//! Development launcher.
//!
//! Starts the backend API server and the frontend dev server, each in its
//! own terminal session, and returns immediately. Nothing is supervised:
//! a process that fails to start is reported once and otherwise left to its
//! own terminal.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

/// Default backend bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default backend bind port
pub const DEFAULT_PORT: u16 = 8000;

/// Server executable run inside `./backend`
pub const DEFAULT_BACKEND_CMD: &str = "uvicorn app.main:app";

/// Package manager used inside `./frontend`
pub const DEFAULT_NPM: &str = "npm";

const BACKEND_DIR: &str = "backend";
const FRONTEND_DIR: &str = "frontend";

/// One process to start in its own terminal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub name: &'static str,
    pub title: String,
    pub cwd: PathBuf,
    /// Shell command line, may chain several commands with `&&`.
    pub command_line: String,
}

impl ProcessSpec {
    /// Human readable form used for status output and dry runs.
    pub fn describe(&self) -> String {
        format!("[{}] (cd {}) {}", self.name, self.cwd.display(), self.command_line)
    }

    /// Command that opens a new console window running the process.
    #[cfg(windows)]
    pub fn terminal_command(&self, _terminal: Option<&[String]>) -> Command {
        use std::os::windows::process::CommandExt;

        let mut cmd = Command::new("cmd");
        cmd.arg("/C")
            .raw_arg(format!(
                "start \"{}\" cmd /K \"{}\"",
                self.title, self.command_line
            ))
            .current_dir(&self.cwd);
        cmd
    }

    /// Command that runs the process under `sh`, inside the given terminal
    /// emulator when there is one, otherwise in its own process group so an
    /// interrupt aimed at one server does not reach the other.
    #[cfg(unix)]
    pub fn terminal_command(&self, terminal: Option<&[String]>) -> Command {
        use std::os::unix::process::CommandExt;

        let mut cmd = match terminal {
            Some([program, args @ ..]) => {
                let mut cmd = Command::new(program);
                cmd.args(args).arg("sh");
                cmd
            }
            _ => Command::new("sh"),
        };
        cmd.arg("-c")
            .arg(&self.command_line)
            .current_dir(&self.cwd)
            .process_group(0);
        cmd
    }
}

/// The two processes of a development session.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub backend: ProcessSpec,
    pub frontend: ProcessSpec,
    /// Terminal emulator prefix, e.g. `["x-terminal-emulator", "-e"]`.
    pub terminal: Option<Vec<String>>,
}

impl LaunchPlan {
    pub fn new(root: &Path, host: &str, port: u16, backend_cmd: &str, npm: &str) -> Self {
        let backend = ProcessSpec {
            name: "backend",
            title: "VitaSage API".to_string(),
            cwd: root.join(BACKEND_DIR),
            command_line: format!("{} --host {} --port {}", backend_cmd, host, port),
        };

        let frontend = ProcessSpec {
            name: "frontend",
            title: "VitaSage UI".to_string(),
            cwd: root.join(FRONTEND_DIR),
            command_line: format!("{npm} install && {npm} run dev"),
        };

        Self {
            backend,
            frontend,
            terminal: None,
        }
    }

    /// Use a terminal emulator, given as a whitespace separated command prefix.
    pub fn with_terminal(mut self, terminal: Option<&str>) -> Self {
        self.terminal = terminal
            .map(|t| t.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());
        self
    }

    pub fn specs(&self) -> [&ProcessSpec; 2] {
        [&self.backend, &self.frontend]
    }
}

/// Spawn both processes and return without waiting on either.
pub fn launch(plan: &LaunchPlan) {
    for spec in plan.specs() {
        println!("Starting {} ...", spec.title);
        match spec.terminal_command(plan.terminal.as_deref()).spawn() {
            // The child is deliberately never waited on
            Ok(child) => info!(process = spec.name, pid = child.id(), "Spawned"),
            Err(e) => warn!(process = spec.name, cwd = %spec.cwd.display(), error = %e, "Failed to spawn"),
        }
    }
    println!("Both servers are starting in their own terminals.");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults(root: &Path) -> LaunchPlan {
        LaunchPlan::new(root, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_BACKEND_CMD, DEFAULT_NPM)
    }

    #[test]
    fn test_backend_spec() {
        let plan = defaults(Path::new("/work"));
        assert_eq!(plan.backend.cwd, PathBuf::from("/work/backend"));
        assert_eq!(
            plan.backend.command_line,
            "uvicorn app.main:app --host 127.0.0.1 --port 8000"
        );
    }

    #[test]
    fn test_frontend_spec_installs_then_runs_dev() {
        let plan = defaults(Path::new("/work"));
        assert_eq!(plan.frontend.cwd, PathBuf::from("/work/frontend"));
        assert_eq!(plan.frontend.command_line, "npm install && npm run dev");
    }

    #[test]
    fn test_overridden_commands() {
        let plan = LaunchPlan::new(Path::new("."), "0.0.0.0", 9000, "python -m uvicorn app.main:app", "pnpm");
        assert_eq!(
            plan.backend.command_line,
            "python -m uvicorn app.main:app --host 0.0.0.0 --port 9000"
        );
        assert_eq!(plan.frontend.command_line, "pnpm install && pnpm run dev");
    }

    #[test]
    fn test_terminal_prefix_parsing() {
        let plan = defaults(Path::new("."))
            .with_terminal(Some("x-terminal-emulator -e"));
        assert_eq!(
            plan.terminal,
            Some(vec!["x-terminal-emulator".to_string(), "-e".to_string()])
        );

        let plan = plan.with_terminal(Some("   "));
        assert!(plan.terminal.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_describe() {
        let plan = defaults(Path::new("/work"));
        assert_eq!(
            plan.frontend.describe(),
            "[frontend] (cd /work/frontend) npm install && npm run dev"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_command_uses_sh() {
        let plan = defaults(Path::new("/work"));
        let cmd = plan.backend.terminal_command(None);
        assert_eq!(cmd.get_program(), "sh");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args[0], "-c");
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/work/backend")));

        let term = vec!["xterm".to_string(), "-e".to_string()];
        let cmd = plan.backend.terminal_command(Some(term.as_slice()));
        assert_eq!(cmd.get_program(), "xterm");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args[..3], ["-e", "sh", "-c"]);
    }

    #[test]
    fn test_launch_with_missing_directories_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let plan = defaults(dir.path());
        // Neither ./backend nor ./frontend exists; spawn errors are only logged
        launch(&plan);
    }
}
