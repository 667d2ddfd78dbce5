use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;

use crate::error::LaunchError;

/// Hands files to whatever the desktop has registered for them.
pub trait Launcher: Send + Sync {
    /// Open `path` with its default application.
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the path is missing or no handler can be started.
    fn open(&self, path: &Path) -> Result<(), LaunchError>;

    /// Show `path` in the file manager (its folder, for files).
    ///
    /// # Errors
    ///
    /// Returns `LaunchError` if the path is missing or no handler can be started.
    fn reveal(&self, path: &Path) -> Result<(), LaunchError>;
}

/// Delegates to `open`, `explorer` or `xdg-open`.
///
/// The spawned process is never waited on by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn open(&self, path: &Path) -> Result<(), LaunchError> {
        ensure_exists(path)?;
        spawn_default_handler(path)
    }

    fn reveal(&self, path: &Path) -> Result<(), LaunchError> {
        ensure_exists(path)?;
        let target = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };
        spawn_default_handler(target)
    }
}

fn ensure_exists(path: &Path) -> Result<(), LaunchError> {
    if path.exists() {
        Ok(())
    } else {
        Err(LaunchError::Missing {
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Desktop {
    MacOs,
    Windows,
    Unix,
}

impl Desktop {
    fn current() -> Self {
        if cfg!(target_os = "macos") {
            Desktop::MacOs
        } else if cfg!(target_os = "windows") {
            Desktop::Windows
        } else {
            Desktop::Unix
        }
    }
}

/// Program and arguments that hand `path` to the desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    program: &'static str,
    args: Vec<OsString>,
    /// `explorer` exits with 1 even when it succeeded.
    meaningful_status: bool,
}

impl Invocation {
    fn for_path(desktop: Desktop, path: &Path) -> Self {
        // No shell in between, so `&`, `^` and `%` in file names stay literal.
        let (program, meaningful_status) = match desktop {
            Desktop::MacOs => ("open", true),
            Desktop::Windows => ("explorer", false),
            Desktop::Unix => ("xdg-open", true),
        };
        Self {
            program,
            args: vec![path.as_os_str().to_os_string()],
            meaningful_status,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// What went wrong with a finished handler, if anything worth logging.
fn exit_problem(result: io::Result<ExitStatus>, meaningful_status: bool) -> Option<String> {
    match result {
        Ok(status) if meaningful_status && !status.success() => Some(status.to_string()),
        Ok(_) => None,
        Err(err) => Some(err.to_string()),
    }
}

fn spawn_default_handler(path: &Path) -> Result<(), LaunchError> {
    let invocation = Invocation::for_path(Desktop::current(), path);
    let mut cmd = invocation.command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|err| LaunchError::NoHandler {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    tracing::debug!(pid = child.id(), path = %path.display(), "handed off to default handler");

    // Reap the helper off-thread so it does not linger as a zombie.
    let shown = path.display().to_string();
    let program = invocation.program;
    let meaningful_status = invocation.meaningful_status;
    std::thread::spawn(move || {
        if let Some(problem) = exit_problem(child.wait(), meaningful_status) {
            tracing::warn!(program, path = %shown, %problem, "default handler failed");
        }
    });
    Ok(())
}

/// A request captured by `RecordingLauncher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    Open(PathBuf),
    Reveal(PathBuf),
}

/// Launcher that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    requests: Mutex<Vec<LaunchRequest>>,
    failure: Option<String>,
}

impl RecordingLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A launcher that records requests and then reports `NoHandler`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Paths passed to `open`, in order.
    #[must_use]
    pub fn opened(&self) -> Vec<PathBuf> {
        self.requests()
            .into_iter()
            .filter_map(|request| match request {
                LaunchRequest::Open(path) => Some(path),
                LaunchRequest::Reveal(_) => None,
            })
            .collect()
    }

    fn record(&self, request: LaunchRequest) -> Result<(), LaunchError> {
        let path = match &request {
            LaunchRequest::Open(path) | LaunchRequest::Reveal(path) => path.clone(),
        };
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }
        match &self.failure {
            Some(reason) => Err(LaunchError::NoHandler {
                path,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Launcher for RecordingLauncher {
    fn open(&self, path: &Path) -> Result<(), LaunchError> {
        self.record(LaunchRequest::Open(path.to_path_buf()))
    }

    fn reveal(&self, path: &Path) -> Result<(), LaunchError> {
        self.record(LaunchRequest::Reveal(path.to_path_buf()))
    }
}
