//! Shared primitives for setup steps.
//!
//! A [`StepRunner`] is borrowed by every setup component. It gates on the
//! platform, resolves commands, shells out to package managers, and mutates
//! the filesystem while registering reversal actions. Each primitive
//! converts faults from the OS or the child process into a boolean outcome
//! plus a log line; nothing here panics or propagates an error to callers,
//! with the single exception of [`StepRunner::command_output`], which
//! returns an explicit result so empty output and failure stay
//! distinguishable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, RigupError};
use crate::tracker::{RunSummary, StepTracker};

/// A recorded reversal for a previously applied mutation.
///
/// The closure captures its own arguments, so executing it takes nothing
/// and restores the state from before the mutation.
pub struct RollbackAction {
    label: String,
    undo: Box<dyn FnOnce() -> io::Result<()> + Send>,
}

impl RollbackAction {
    pub fn new(
        label: impl Into<String>,
        undo: impl FnOnce() -> io::Result<()> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            undo: Box::new(undo),
        }
    }
}

/// Outcome of one rollback pass. Every registered action is attempted,
/// even when an earlier one fails; failures are collected here instead of
/// aborting the loop.
#[derive(Debug, Default)]
pub struct RollbackReport {
    pub attempted: usize,
    pub failures: Vec<(String, String)>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct StepRunner {
    os: String,
    tracker: StepTracker,
    rollback_stack: Vec<RollbackAction>,
}

impl Default for StepRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StepRunner {
    pub fn new() -> Self {
        Self::with_os(std::env::consts::OS)
    }

    /// Construct with an explicit OS identifier instead of the host's.
    pub fn with_os(os: &str) -> Self {
        Self {
            os: os.to_string(),
            tracker: StepTracker::new(),
            rollback_stack: Vec::new(),
        }
    }

    pub fn is_macos(&self) -> bool {
        self.os == "macos"
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn summary(&self) -> RunSummary {
        self.tracker.summary()
    }

    pub fn has_rollback_steps(&self) -> bool {
        !self.rollback_stack.is_empty()
    }

    fn begin(&mut self, name: &str) {
        if let Err(e) = self.tracker.start(name) {
            tracing::warn!("step tracking: {}", e);
        }
    }

    fn finish(&mut self, name: &str, success: bool, message: Option<String>) {
        self.tracker.end(name, success, message);
    }

    /// True only when running on macOS. The outcome is recorded either way.
    pub fn check_platform(&mut self) -> bool {
        self.begin("platform_check");
        if self.is_macos() {
            self.finish("platform_check", true, None);
            true
        } else {
            let msg = format!("unsupported platform: {}", self.os);
            tracing::error!("this setup is only supported on macOS (found {})", self.os);
            self.finish("platform_check", false, Some(msg));
            false
        }
    }

    /// True iff `command` resolves on the search path. Never escalates.
    pub fn command_available(&mut self, command: &str) -> bool {
        let step = format!("check_command_{command}");
        self.begin(&step);
        match which::which(command) {
            Ok(_) => {
                self.finish(&step, true, None);
                true
            }
            Err(_) => {
                let msg = format!("command not found: {command}");
                tracing::debug!("{}", msg);
                self.finish(&step, false, Some(msg));
                false
            }
        }
    }

    /// Run a command to completion, inheriting stdio. True iff it exited
    /// with status zero. Launch failures and non-zero exits are logged and
    /// reported as `false`.
    pub async fn run_command(&mut self, argv: &[&str], cwd: Option<&Path>) -> bool {
        let step = format!("run_command_{}", argv.join("_"));
        self.begin(&step);

        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => {
                self.finish(&step, false, Some("empty command".to_string()));
                return false;
            }
        };

        let mut command = tokio::process::Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        match command.status().await {
            Ok(status) if status.success() => {
                self.finish(&step, true, None);
                true
            }
            Ok(status) => {
                let msg = format!("command failed: {} ({})", argv.join(" "), status);
                tracing::error!("{}", msg);
                self.finish(&step, false, Some(msg));
                false
            }
            Err(e) => {
                let msg = format!("failed to launch {}: {}", argv.join(" "), e);
                tracing::error!("{}", msg);
                self.finish(&step, false, Some(msg));
                false
            }
        }
    }

    /// Run a command and capture its stdout, trimmed of surrounding
    /// whitespace. Non-zero exit and launch faults are errors, so a
    /// successful empty output is distinguishable from failure.
    pub async fn command_output(&mut self, argv: &[&str]) -> Result<String> {
        let step = format!("command_output_{}", argv.join("_"));
        self.begin(&step);

        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => {
                self.finish(&step, false, Some("empty command".to_string()));
                return Err(RigupError::Command("empty command".to_string()));
            }
        };

        let result = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                self.finish(&step, true, None);
                Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let msg = format!(
                    "command failed: {} ({}): {}",
                    argv.join(" "),
                    output.status,
                    stderr.trim()
                );
                tracing::error!("{}", msg);
                self.finish(&step, false, Some(msg.clone()));
                Err(RigupError::Command(msg))
            }
            Err(e) => {
                let msg = format!("failed to launch {}: {}", argv.join(" "), e);
                tracing::error!("{}", msg);
                self.finish(&step, false, Some(msg.clone()));
                Err(RigupError::Command(msg))
            }
        }
    }

    pub fn add_rollback(&mut self, action: RollbackAction) {
        self.rollback_stack.push(action);
    }

    /// Execute registered reversals in reverse registration order.
    ///
    /// Best effort: a failing reversal is recorded in the report and the
    /// remaining reversals still run. The whole pass is one step record.
    pub fn rollback(&mut self) -> RollbackReport {
        self.begin("rollback");

        let mut report = RollbackReport::default();
        while let Some(action) = self.rollback_stack.pop() {
            report.attempted += 1;
            tracing::info!("rolling back: {}", action.label);
            if let Err(e) = (action.undo)() {
                tracing::error!("rollback of '{}' failed: {}", action.label, e);
                report.failures.push((action.label, e.to_string()));
            }
        }

        let message = if report.is_clean() {
            None
        } else {
            Some(format!("{} reversal(s) failed", report.failures.len()))
        };
        self.finish("rollback", report.is_clean(), message);
        report
    }

    /// Create `path` and any missing parents. An already existing directory
    /// is success. Registers a reversal that removes the directory only if
    /// it is still empty at rollback time.
    pub fn create_directory(&mut self, path: &Path) -> bool {
        let step = format!("create_directory_{}", path.display());
        self.begin(&step);

        match fs::create_dir_all(path) {
            Ok(()) => {
                let created = path.to_path_buf();
                self.add_rollback(RollbackAction::new(
                    format!("remove directory {}", created.display()),
                    move || remove_dir_if_empty(&created),
                ));
                self.finish(&step, true, None);
                true
            }
            Err(e) => {
                tracing::error!("failed to create {}: {}", path.display(), e);
                self.finish(&step, false, Some(e.to_string()));
                false
            }
        }
    }

    /// Append `content` to `path`, creating it if absent. Registers a
    /// reversal that restores the prior content, or deletes the file if it
    /// did not previously exist.
    pub fn append_to_file(&mut self, path: &Path, content: &str) -> bool {
        let step = format!("append_to_file_{}", path.display());
        self.begin(&step);

        let original = if path.exists() {
            match fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::error!("failed to read {}: {}", path.display(), e);
                    self.finish(&step, false, Some(e.to_string()));
                    return false;
                }
            }
        } else {
            None
        };

        let appended = {
            use std::io::Write;
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(content.as_bytes()))
        };

        match appended {
            Ok(()) => {
                let target = path.to_path_buf();
                self.add_rollback(RollbackAction::new(
                    format!("restore {}", target.display()),
                    move || match original {
                        Some(text) => fs::write(&target, text),
                        None => fs::remove_file(&target),
                    },
                ));
                self.finish(&step, true, None);
                true
            }
            Err(e) => {
                tracing::error!("failed to append to {}: {}", path.display(), e);
                self.finish(&step, false, Some(e.to_string()));
                false
            }
        }
    }

    /// Copy `path` to `path.bak`. A nonexistent source is a no-op success.
    pub fn backup_file(&mut self, path: &Path) -> bool {
        let step = format!("backup_file_{}", path.display());
        self.begin(&step);

        if !path.exists() {
            self.finish(&step, true, None);
            return true;
        }

        let backup = backup_path(path);
        match fs::copy(path, &backup) {
            Ok(_) => {
                tracing::info!("backed up {} to {}", path.display(), backup.display());
                self.finish(&step, true, None);
                true
            }
            Err(e) => {
                tracing::error!("failed to back up {}: {}", path.display(), e);
                self.finish(&step, false, Some(e.to_string()));
                false
            }
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Non-empty directories are left in place: the package manager may have
/// populated them after we created them, and their contents are not ours
/// to delete.
fn remove_dir_if_empty(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut entries = fs::read_dir(path)?;
    if entries.next().is_none() {
        fs::remove_dir(path)?;
    }
    Ok(())
}
