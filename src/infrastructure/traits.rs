//! Process boundary traits for testability
//!
//! Locating and running subcommand executables are the only side effects of the
//! dispatcher. Both sit behind traits so dispatch logic can be tested with mocks.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::{debug, trace};

use crate::exitcode;
use crate::infrastructure::signals;

/// Finds the executable backing a subcommand.
pub trait ExecutableLocator: Send + Sync {
    /// Return the full path of `name`, or None if it cannot be found.
    fn locate(&self, name: &str) -> Option<PathBuf>;

    /// A file called `name` that exists on the search path but cannot be run.
    ///
    /// Consulted only after [`locate`](Self::locate) came up empty.
    fn locate_non_executable(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// Runs a located subcommand and reports its exit code.
pub trait Delegate: Send + Sync {
    /// Run `executable` with `args`, inheriting stdin/stdout/stderr.
    ///
    /// Returns the child's exit code. An `Err` means the child never ran.
    fn delegate(&self, executable: &Path, args: &[OsString]) -> io::Result<i32>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Shell-like executable search: `dirs` in order, then the system `PATH`.
#[derive(Debug, Clone)]
pub struct SearchPathLocator {
    dirs: Vec<PathBuf>,
    system_path: Option<OsString>,
    cwd: PathBuf,
}

impl SearchPathLocator {
    /// Search `dirs` first, then the current process `PATH`.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            system_path: env::var_os("PATH"),
            cwd: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Replace the `PATH` value searched after `dirs`.
    pub fn with_system_path(mut self, path: Option<OsString>) -> Self {
        self.system_path = path;
        self
    }

    /// Directories in search order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.dirs.clone();
        if let Some(path) = &self.system_path {
            dirs.extend(env::split_paths(path));
        }
        dirs
    }

    fn search_path(&self) -> Option<OsString> {
        // join_paths rejects entries containing the separator; drop those instead of failing
        let usable: Vec<PathBuf> = self
            .search_dirs()
            .into_iter()
            .filter(|dir| env::join_paths([dir]).is_ok())
            .collect();
        env::join_paths(usable).ok()
    }
}

impl ExecutableLocator for SearchPathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let paths = self.search_path()?;
        trace!("searching {:?} in {:?}", name, paths);
        match which::which_in(name, Some(paths), &self.cwd) {
            Ok(path) => {
                debug!("located {} at {}", name, path.display());
                Some(path)
            }
            Err(e) => {
                debug!("cannot locate {}: {}", name, e);
                None
            }
        }
    }

    fn locate_non_executable(&self, name: &str) -> Option<PathBuf> {
        self.search_dirs()
            .into_iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}

/// Directory holding the running executable, symlinks resolved.
pub fn install_dir() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent().map(Path::to_path_buf)
}

/// Replace the current process with the subcommand.
///
/// On non-Unix platforms there is no process replacement, so this falls back to
/// [`SpawnDelegate`].
#[derive(Debug, Default)]
pub struct ExecDelegate;

impl Delegate for ExecDelegate {
    #[cfg(unix)]
    fn delegate(&self, executable: &Path, args: &[OsString]) -> io::Result<i32> {
        use std::os::unix::process::CommandExt;

        debug!("exec {} {:?}", executable.display(), args);
        // exec only returns on failure
        Err(Command::new(executable).args(args).exec())
    }

    #[cfg(not(unix))]
    fn delegate(&self, executable: &Path, args: &[OsString]) -> io::Result<i32> {
        SpawnDelegate.delegate(executable, args)
    }
}

/// Spawn the subcommand and wait for it, forwarding termination signals.
#[derive(Debug, Default)]
pub struct SpawnDelegate;

impl Delegate for SpawnDelegate {
    fn delegate(&self, executable: &Path, args: &[OsString]) -> io::Result<i32> {
        signals::install_forwarding();

        debug!("spawn {} {:?}", executable.display(), args);
        let mut child = Command::new(executable).args(args).spawn()?;
        let _tracked = signals::track(child.id());

        let status = child.wait()?;
        debug!("{} exited: {}", executable.display(), status);
        Ok(exit_code(status))
    }
}

/// Map a child's exit status to the code the dispatcher exits with.
///
/// A child killed by signal N maps to 128 + N, as a shell would report it.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return exitcode::SIGNAL_BASE + signal;
        }
    }
    exitcode::FAILURE
}
