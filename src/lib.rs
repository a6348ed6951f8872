//! A small interactive shell.
//!
//! The crate reads keystrokes from a raw-mode terminal through a byte-level
//! decoder and line editor with history recall, splits the submitted line
//! into `|`-separated stages, and runs them one after another with each
//! stage's captured output fed to the next. While a child runs, Ctrl-C is
//! forwarded to it instead of ending the shell.
//!
//! The main entry point is [`Interpreter`], which owns one session's
//! [`Environment`] (tracked working directory, history, signal relay) and
//! resolves program names through pluggable [`command::CommandFactory`]
//! implementations: builtins first, then executables found on `PATH`.

mod builtin;
pub mod command;
pub mod config;
pub mod decoder;
pub mod editor;
pub mod env;
pub mod error;
mod external;
pub mod history;
mod interpreter;
mod io_adapters;
pub mod parser;
pub mod signal;
pub mod terminal;

pub use env::Environment;
pub use error::{Result, ShellError};
pub use interpreter::Interpreter;
pub use io_adapters::{InheritedStdin, MemReader, MemWriter};
