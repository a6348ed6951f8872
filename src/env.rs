use crate::error::{Result, ShellError};
use crate::history::History;
use crate::signal::SignalRelay;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// All mutable state of one shell session.
///
/// The environment contains:
/// - `vars`: environment variables handed to executed commands.
/// - `current_dir`: the tracked working directory. `cd` changes only this;
///   the shell process itself never changes directory.
/// - `history`: submitted lines, persisted at shutdown.
/// - `relay`: where the running child registers for interrupt forwarding.
/// - `should_exit`: set by `exit`, checked by the input loop.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub history: History,
    pub relay: SignalRelay,
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state with an empty in-memory history.
    ///
    /// Fails when the working directory cannot be determined.
    pub fn new() -> Result<Self> {
        let current_dir = stdenv::current_dir().map_err(ShellError::WorkingDirectory)?;
        Ok(Self::with_dir(current_dir))
    }

    /// Environment rooted at `current_dir`, with the process variables.
    pub fn with_dir(current_dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: stdenv::vars().collect(),
            current_dir: current_dir.into(),
            history: History::in_memory(),
            relay: SignalRelay::new(),
            should_exit: false,
        }
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}
