use crate::env::Environment;
use anyhow::Result;
use std::io::{self, Read, Write};
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// A readable input stream that also knows how to wire itself into a child
/// process.
pub trait Stdin: Read {
    /// Convert this input into a [`Stdio`] handle, plus the bytes that must
    /// be written into the child's stdin pipe when the handle is piped.
    fn into_stdio(self: Box<Self>) -> (Stdio, Option<Vec<u8>>);
}

/// A writable output stream that also knows how to wire itself into a child
/// process.
pub trait Stdout: Write {
    /// The [`Stdio`] handle a child should get for its standard output.
    fn stdio(&self) -> Stdio;

    /// Whether child output must be read back through a pipe and written to
    /// this sink, rather than going straight to the inherited descriptor.
    fn is_captured(&self) -> bool {
        false
    }
}

impl Stdout for io::Stdout {
    fn stdio(&self) -> Stdio {
        Stdio::inherit()
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: &mut dyn Stdout,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
