use crate::error::{Result, ShellError};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Runtime;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Forwards Ctrl-C to the foreground child instead of killing the shell.
///
/// Executors publish the pid they are waiting on with [`SignalRelay::track`];
/// the listener delivers each interrupt to that pid, or drops it when no
/// child is running.
#[derive(Clone, Default)]
pub struct SignalRelay {
    foreground: Arc<Mutex<Option<u32>>>,
}

impl fmt::Debug for SignalRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRelay")
            .field("foreground", &self.foreground_pid())
            .finish()
    }
}

impl SignalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register for SIGINT and spawn the listener on `runtime`.
    ///
    /// From here on an interrupt no longer terminates the shell process.
    pub fn listen(&self, runtime: &Runtime) -> Result<JoinHandle<()>> {
        let mut interrupts = {
            let _guard = runtime.enter();
            signal(SignalKind::interrupt()).map_err(ShellError::Signal)?
        };
        let relay = self.clone();
        Ok(runtime.spawn(async move {
            while interrupts.recv().await.is_some() {
                relay.forward_interrupt();
            }
        }))
    }

    /// Mark `pid` as the process an interrupt should go to until the guard
    /// is dropped.
    pub fn track(&self, pid: u32) -> Foreground {
        *self.slot() = Some(pid);
        Foreground {
            relay: self.clone(),
        }
    }

    pub fn foreground_pid(&self) -> Option<u32> {
        *self.slot()
    }

    /// Deliver SIGINT to the tracked child. Returns whether a child was
    /// signalled; with no child the interrupt is discarded.
    pub fn forward_interrupt(&self) -> bool {
        let slot = self.slot();
        let Some(pid) = *slot else {
            debug!("interrupt while idle, discarded");
            return false;
        };
        match kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
            Ok(()) => {
                debug!(pid, "forwarded SIGINT");
                true
            }
            Err(e) => {
                warn!(pid, error = %e, "cannot forward SIGINT");
                false
            }
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<u32>> {
        self.foreground
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the relay's foreground pid on drop.
pub struct Foreground {
    relay: SignalRelay,
}

impl Drop for Foreground {
    fn drop(&mut self) {
        *self.relay.slot() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;

    #[test]
    fn test_idle_interrupt_is_discarded() {
        let relay = SignalRelay::new();
        assert!(!relay.forward_interrupt());
    }

    #[test]
    fn test_guard_clears_foreground() {
        let relay = SignalRelay::new();
        {
            let _fg = relay.track(4242);
            assert_eq!(relay.foreground_pid(), Some(4242));
        }
        assert_eq!(relay.foreground_pid(), None);
    }

    #[test]
    fn test_interrupt_reaches_child() {
        let relay = SignalRelay::new();
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let status = {
            let _fg = relay.track(child.id());
            assert!(relay.forward_interrupt());
            child.wait().unwrap()
        };
        assert_eq!(status.signal(), Some(Signal::SIGINT as i32));
    }
}
