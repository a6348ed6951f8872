use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::debug;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command using provided IO streams and environment.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        mut stdin: Box<dyn Stdin>,
        mut stdout: &mut dyn Stdout,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match T::execute(*self, &mut stdin, &mut stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{:#}", e)?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: Box<dyn Stdin>,
        stdout: &mut dyn Stdout,
        _env: &mut Environment,
    ) -> anyhow::Result<i32> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the shell's working directory. Exactly one directory is required.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let [target] = self.args.as_slice() else {
            writeln!(stdout, "cd: requires 1 argument")?;
            return Ok(1);
        };

        let target = PathBuf::from(target);
        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: {}", new_dir.display()))?;
        fs::read_dir(&canonical).with_context(|| format!("cd: {}", canonical.display()))?;

        debug!(dir = %canonical.display(), "changing directory");
        // Only the tracked directory moves; children pick it up at spawn.
        env.current_dir = canonical;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print every history entry, oldest first.
pub struct ShowHistory {}

impl BuiltinCommand for ShowHistory {
    fn name() -> &'static str {
        "history"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        for entry in env.history.entries() {
            writeln!(stdout, "{}", entry)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell after the current line. History is saved on the way out.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; the shell always exits with status 0.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::{MemReader, MemWriter};
    use std::io::Cursor;

    fn env_in(dir: &std::path::Path) -> Environment {
        Environment::with_dir(fs::canonicalize(dir).unwrap())
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_pwd_prints_tracked_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path());

        let mut out = Vec::new();
        let res = Pwd {}.execute(&mut Cursor::new(Vec::new()), &mut out, &mut env);

        assert!(res.is_ok());
        assert_eq!(output(out), format!("{}\n", env.current_dir.to_string_lossy()));
    }

    #[test]
    fn test_cd_without_argument_prints_usage() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path());
        let before = env.current_dir.clone();

        let mut out = Vec::new();
        let code = Cd { args: vec![] }
            .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();

        assert_eq!(code, 1);
        assert_eq!(output(out), "cd: requires 1 argument\n");
        assert_eq!(env.current_dir, before);
    }

    #[test]
    fn test_cd_with_two_arguments_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path());
        let mut out = Vec::new();
        let code = Cd {
            args: vec!["a".into(), "b".into()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
        .unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_cd_relative_and_parent() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let mut env = env_in(tmp.path());
        let root = env.current_dir.clone();
        let process_dir = std::env::current_dir().unwrap();

        let mut out = Vec::new();
        Cd {
            args: vec!["sub".into()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
        .unwrap();
        assert_eq!(env.current_dir, root.join("sub"));

        Cd {
            args: vec!["..".into()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
        .unwrap();
        assert_eq!(env.current_dir, root);

        // The process itself never moves.
        assert_eq!(std::env::current_dir().unwrap(), process_dir);
    }

    #[test]
    fn test_cd_missing_dir_keeps_state() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path());
        let before = env.current_dir.clone();

        let mut out = MemWriter::new();
        let cmd = Factory::<Cd>::default()
            .try_create(&env, "cd", &["missing"])
            .unwrap();
        let code = cmd
            .execute(Box::new(MemReader::default()), &mut out, &mut env)
            .unwrap();

        assert_eq!(code, 1);
        assert!(output(out.into_inner()).starts_with("cd: "));
        assert_eq!(env.current_dir, before);
    }

    #[test]
    fn test_history_lists_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path());
        env.history.append("ls");
        env.history.append("pwd");

        let mut out = Vec::new();
        ShowHistory {}
            .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        assert_eq!(output(out), "ls\npwd\n");
    }

    #[test]
    fn test_exit_sets_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let mut env = env_in(tmp.path());
        let code = Exit { _args: vec![] }
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::<u8>::new(), &mut env)
            .unwrap();
        assert_eq!(code, 0);
        assert!(env.should_exit);
    }

    #[test]
    fn test_factory_matches_name_only() {
        let env = Environment::with_dir("/");
        assert!(Factory::<Pwd>::default().try_create(&env, "pwd", &[]).is_some());
        assert!(Factory::<Pwd>::default().try_create(&env, "cd", &[]).is_none());
    }

    #[test]
    fn test_bad_flag_reports_usage() {
        let mut env = Environment::with_dir("/");
        let cmd = Factory::<Pwd>::default()
            .try_create(&env, "pwd", &["--bogus"])
            .unwrap();
        let mut out = MemWriter::new();
        let code = cmd
            .execute(Box::new(MemReader::default()), &mut out, &mut env)
            .unwrap();
        assert_eq!(code, 1);
        assert!(!out.as_bytes().is_empty());
    }
}
