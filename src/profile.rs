//! Shell profile resolution.
//!
//! Setup components append init snippets to the user's interactive shell
//! profile. Which file that is depends on `$SHELL`; a shell outside the two
//! supported families is a hard error raised at component construction,
//! before any mutation happens.

use std::path::{Path, PathBuf};

use crate::error::{Result, RigupError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Zsh,
}

impl std::fmt::Display for ShellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bash => write!(f, "bash"),
            Self::Zsh => write!(f, "zsh"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellProfile {
    pub kind: ShellKind,
    pub path: PathBuf,
}

impl ShellProfile {
    /// Resolve the profile file from the `SHELL` environment variable and
    /// the home directory.
    pub fn detect(home: &Path) -> Result<Self> {
        let shell = std::env::var("SHELL").unwrap_or_default();
        Self::from_shell(&shell, home)
    }

    pub fn from_shell(shell: &str, home: &Path) -> Result<Self> {
        if shell.contains("bash") {
            Ok(Self {
                kind: ShellKind::Bash,
                path: home.join(".bashrc"),
            })
        } else if shell.contains("zsh") {
            Ok(Self {
                kind: ShellKind::Zsh,
                path: home.join(".zshrc"),
            })
        } else {
            Err(RigupError::UnsupportedShell(shell.to_string()))
        }
    }
}

/// Snippet appended to the shell profile so pyenv shims resolve in new
/// interactive shells.
pub fn pyenv_init_snippet(pyenv_root: &Path) -> String {
    format!(
        "\n# Pyenv configuration\n\
         export PYENV_ROOT=\"{}\"\n\
         command -v pyenv >/dev/null || export PATH=\"$PYENV_ROOT/bin:$PATH\"\n\
         eval \"$(pyenv init -)\"\n",
        pyenv_root.display()
    )
}
