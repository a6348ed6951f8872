use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::config::ShellConfig;
use crate::editor::{Collected, LineEditor};
use crate::env::Environment;
use crate::error::{Result, ShellError};
use crate::history::History;
use crate::io_adapters::{InheritedStdin, MemReader, MemWriter};
use crate::parser::{self, CommandSpec, Pipeline};
use crate::terminal::{ByteSource, RawMode};
use std::io::{Read, Write};
use tracing::{debug, info, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Implemented for every `BuiltinCommand` and for `ExternalCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive shell: one session's state, its line editor, and the
/// factories used to turn program names into commands.
///
/// Example
/// ```
/// use gosh::{Environment, Interpreter, MemWriter};
/// let mut sh = Interpreter::new(Environment::with_dir("/"), "$");
/// let mut out = MemWriter::new();
/// sh.execute_line("pwd", &mut out);
/// assert_eq!(out.as_bytes(), b"/\n");
/// ```
pub struct Interpreter {
    env: Environment,
    editor: LineEditor,
    commands: Vec<Box<dyn CommandFactory>>,
    raw_terminal: bool,
}

impl Interpreter {
    /// Interpreter with the default builtins and external command launcher.
    pub fn new(env: Environment, prompt: impl Into<String>) -> Self {
        Self::with_commands(env, prompt, default_commands())
    }

    /// Create a new interpreter with a custom set of command factories.
    pub fn with_commands(
        env: Environment,
        prompt: impl Into<String>,
        commands: Vec<Box<dyn CommandFactory>>,
    ) -> Self {
        Self {
            env,
            editor: LineEditor::new(prompt),
            commands,
            raw_terminal: false,
        }
    }

    /// Session for the real terminal: process directory, persisted history.
    pub fn from_config(config: &ShellConfig) -> Result<Self> {
        let env = Environment::new()?.with_history(History::open(&config.history_path));
        let mut shell = Self::new(env, config.prompt.clone());
        shell.raw_terminal = config.raw_terminal;
        Ok(shell)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Read lines and run them until `exit` or end of input.
    ///
    /// The editor draws on `terminal`; the last stage of every pipeline writes
    /// to `stdout`. Raw mode, when enabled, is held only while a line is
    /// being typed.
    pub fn repl<R: Read>(
        &mut self,
        input: R,
        terminal: &mut dyn Write,
        stdout: &mut dyn Stdout,
    ) -> Result<()> {
        let mut source = ByteSource::new(input);
        info!(
            dir = %self.env.current_dir.display(),
            history = self.env.history.len(),
            "session started"
        );

        while !self.env.should_exit {
            let collected = {
                let _raw = if self.raw_terminal {
                    RawMode::enable().unwrap_or_else(|e| {
                        warn!(error = %e, "cannot enter raw mode");
                        None
                    })
                } else {
                    None
                };
                self.editor
                    .collect_line(&mut source, &self.env.history, terminal)?
            };

            self.execute_line(collected.line(), stdout);
            if let Collected::EndOfInput(_) = collected {
                debug!("end of input");
                break;
            }
        }

        info!("session ended");
        Ok(())
    }

    /// Persist history. Called once when the session ends.
    pub fn shutdown(&self) -> Result<()> {
        self.env.history.save()
    }

    /// Run one submitted line and record it in history.
    ///
    /// Failures are reported on stderr and never end the session. Returns
    /// the exit code of the last stage when the pipeline ran to the end.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Stdout) -> Option<ExitCode> {
        let line = line.trim();
        let result = match parser::build(line) {
            Ok(None) => return None,
            Ok(Some(pipeline)) => self.execute_pipeline(&pipeline, stdout),
            Err(e) => Err(e),
        };
        let _ = stdout.flush();

        if line != "history" {
            self.env.history.append(line);
        }

        match result {
            Ok(code) => {
                debug!(code, "pipeline finished");
                Some(code)
            }
            Err(e) => {
                eprintln!("gosh: {}", e);
                None
            }
        }
    }

    /// Run the stages left to right, each to completion before the next.
    ///
    /// Every stage but the last writes into memory, and that buffer is the
    /// next stage's input. The last stage writes to `stdout`. A stage that
    /// cannot be resolved or started aborts the rest of the pipeline; output
    /// already produced stays where it went.
    pub fn execute_pipeline(
        &mut self,
        pipeline: &Pipeline,
        stdout: &mut dyn Stdout,
    ) -> Result<ExitCode> {
        let last = pipeline.len().saturating_sub(1);
        let mut previous: Option<Vec<u8>> = None;
        let mut code: ExitCode = 0;

        for (i, stage) in pipeline.stages.iter().enumerate() {
            let cmd = self.resolve(stage)?;
            let stdin: Box<dyn Stdin> = match previous.take() {
                Some(buf) => Box::new(MemReader::new(buf)),
                None if pipeline.len() == 1 => Box::new(InheritedStdin::default()),
                None => Box::new(MemReader::default()),
            };
            debug!(stage = i + 1, program = %stage.program, args = ?stage.args, "running stage");

            if i == last {
                code = cmd.execute(stdin, stdout, &mut self.env)?;
            } else {
                let mut sink = MemWriter::new();
                code = cmd.execute(stdin, &mut sink, &mut self.env)?;
                previous = Some(sink.into_inner());
            }
        }
        Ok(code)
    }

    fn resolve(&self, stage: &CommandSpec) -> Result<Box<dyn ExecutableCommand>> {
        let args: Vec<&str> = stage.args.iter().map(String::as_str).collect();
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(&self.env, &stage.program, &args))
            .ok_or_else(|| ShellError::CommandNotFound {
                program: stage.program.clone(),
            })
    }
}

/// Builtins first, so `cd` and friends shadow programs of the same name:
/// - built-ins: `cd`, `pwd`, `history`, `exit`
/// - external command launcher
fn default_commands() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::external::ExternalCommand;
    vec![
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<ShowHistory>::default()),
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}
