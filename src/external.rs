use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdin, Stdout};
use crate::env::Environment;
use crate::error::ShellError;
use crate::interpreter::Factory;
use anyhow::Result;
use std::ffi::{OsStr, OsString};
use std::io::{self, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use tracing::debug;

/// Command that is not a builtin: a resolved executable plus arguments.
pub struct ExternalCommand {
    name: String,
    path: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    pub fn new(name: impl Into<String>, path: PathBuf, args: Vec<OsString>) -> Self {
        Self {
            name: name.into(),
            path,
            args,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let executable =
            find_command_path(OsStr::new(search_paths), &env.current_dir, Path::new(name))?;
        Some(Box::new(ExternalCommand::new(
            name,
            executable,
            args.iter().map(OsString::from).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdin: Box<dyn Stdin>,
        stdout: &mut dyn Stdout,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let (input, feed) = stdin.into_stdio();
        let mut child = Command::new(&self.path)
            .args(&self.args)
            .env_clear()
            .envs(&env.vars)
            .env("PWD", &env.current_dir)
            .current_dir(&env.current_dir)
            .stdin(input)
            .stdout(stdout.stdio())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ShellError::Spawn {
                program: self.name.clone(),
                source,
            })?;
        debug!(pid = child.id(), program = %self.name, "spawned");
        let pipe_in = child.stdin.take();
        let pipe_out = child.stdout.take();
        let foreground = env.relay.track(child.id());
        let exit_status = thread::scope(|scope| -> io::Result<ExitStatus> {
            if let (Some(mut pipe), Some(bytes)) = (pipe_in, feed) {
                // Fed from a helper so a child that fills its stdout before
                // draining stdin cannot block us.
                scope.spawn(move || {
                    if let Err(e) = pipe.write_all(&bytes) {
                        if e.kind() != ErrorKind::BrokenPipe {
                            debug!(error = %e, "cannot feed stage input");
                        }
                    }
                });
            }
            if let Some(mut out) = pipe_out {
                if stdout.is_captured() {
                    io::copy(&mut out, stdout)?;
                }
            }
            // The pid stays reserved until reaped, so stop forwarding before that.
            wait_exited(&child)?;
            drop(foreground);
            child.wait()
        })?;

        let code = match exit_status.code() {
            Some(x) => x,
            None => terminated_by_signal(exit_status),
        };
        debug!(program = %self.name, code, "exited");
        Ok(code)
    }
}

/// Block until `child` has exited without reaping it.
#[cfg(target_os = "linux")]
fn wait_exited(child: &Child) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::wait::{Id, WaitPidFlag, waitid};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(child.id() as i32);
    loop {
        match waitid(Id::Pid(pid), WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn wait_exited(_child: &Child) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returned if it is an executable file.
/// - Anything with more than one component (`bin/sh`, `./foo`, `../x`):
///   resolved against `base`, the shell's tracked directory, never the
///   process working directory.
/// - Single path component (no separators): search each directory in
///   `search_paths` (PATH) and return the first executable match.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, base: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(Component::Normal(name)), None) => find_in_path(search_paths, name),
        _ => find_by_path(&base.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths).find_map(|dir| find_by_path(&dir.join(cmd)))
}

#[cfg(unix)]
fn find_by_path(path: &Path) -> Option<PathBuf> {
    use std::os::unix::fs::PermissionsExt;
    let meta = path.metadata().ok()?;
    (meta.is_file() && meta.permissions().mode() & 0o111 != 0).then(|| path.to_path_buf())
}

#[cfg(not(unix))]
fn find_by_path(path: &Path) -> Option<PathBuf> {
    path.is_file().then(|| path.to_path_buf())
}
