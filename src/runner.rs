//! Synchronous subprocess runner.
//!
//! [`Task`] resolves the command, spawns the child with piped stdout and
//! stderr, drains both pipes on dedicated reader threads, waits for the
//! child to exit and returns a [`TaskResult`]. The call blocks until the
//! child has terminated; there is no timeout.

use crate::env::EnvSnapshot;
use crate::error::{Result, RunError};
use crate::resolve::{Resolver, WhichTool, resolve_command};
use crate::result::TaskResult;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// A command invocation: arguments, optional input, working directory and
/// environment policy.
///
/// # Examples
///
/// ```no_run
/// use taskrun::Task;
///
/// let result = Task::new(["cat"]).input(b"abc".to_vec()).run()?;
/// assert_eq!(result.stdout, b"abc");
/// # Ok::<(), taskrun::RunError>(())
/// ```
#[derive(Clone)]
pub struct Task {
    args: Vec<String>,
    input: Option<Vec<u8>>,
    cwd: Option<PathBuf>,
    inherit_environment: bool,
    env_snapshot: Option<EnvSnapshot>,
    extra_env: EnvSnapshot,
    resolver: Arc<dyn Resolver>,
}

impl Task {
    /// Create a task from a command followed by its arguments.
    ///
    /// Each string is passed to the child as exactly one argument; no shell
    /// is involved.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            input: None,
            cwd: None,
            inherit_environment: true,
            env_snapshot: None,
            extra_env: EnvSnapshot::empty(),
            resolver: Arc::new(WhichTool::default()),
        }
    }

    /// Bytes fed to the child's stdin, followed by EOF.
    pub fn input(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.input = Some(data.into());
        self
    }

    /// Working directory of the child.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Whether the child inherits the caller's environment (default: true).
    ///
    /// When false the child only sees variables added with [`Task::env`].
    pub fn inherit_environment(mut self, inherit: bool) -> Self {
        self.inherit_environment = inherit;
        self
    }

    /// Add one variable to the child's environment.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.extra_env.set(key, value);
        self
    }

    /// Use `snapshot` as the inherited environment instead of capturing the
    /// caller's environment at run time.
    pub fn env_snapshot(mut self, snapshot: EnvSnapshot) -> Self {
        self.env_snapshot = Some(snapshot);
        self
    }

    /// Strategy used to resolve a non-absolute command.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The environment the child will be started with.
    pub fn child_environment(&self) -> EnvSnapshot {
        let mut env = if self.inherit_environment {
            self.env_snapshot.clone().unwrap_or_else(EnvSnapshot::capture)
        } else {
            EnvSnapshot::empty()
        };
        env.extend(&self.extra_env);
        env
    }

    /// Run the command to completion.
    ///
    /// A non-zero exit is returned as data in [`TaskResult::code`]. Errors
    /// are a resolution failure ([`RunError::Task`]) or an OS failure
    /// ([`RunError::Io`]).
    pub fn run(&self) -> Result<TaskResult> {
        let (command, rest) = self.args.split_first().ok_or(RunError::EmptyCommand)?;
        let program = resolve_command(self.resolver.as_ref(), command)?;

        let mut cmd = Command::new(&program);
        cmd.args(rest);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let env = self.child_environment();
        cmd.env_clear();
        cmd.envs(env.iter());

        cmd.stdin(if self.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(
            program = %program.display(),
            args = ?rest,
            cwd = ?self.cwd,
            env_vars = env.len(),
            "spawning child"
        );
        let mut child = cmd.spawn()?;

        let writer = match (child.stdin.take(), &self.input) {
            (Some(stdin), Some(data)) => Some(spawn_writer(stdin, data.clone())),
            _ => None,
        };
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = child.wait()?;

        if let Some(handle) = writer {
            join(handle)?;
        }
        let stdout = collect(stdout_reader)?;
        let stderr = collect(stderr_reader)?;

        let result = TaskResult::from_status(status, stdout, stderr);
        debug!(
            program = %program.display(),
            code = result.code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "child exited"
        );
        Ok(result)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("args", &self.args)
            .field("input_len", &self.input.as_ref().map(Vec::len))
            .field("cwd", &self.cwd)
            .field("inherit_environment", &self.inherit_environment)
            .finish_non_exhaustive()
    }
}

/// Run `args` with default settings.
pub fn run_args<S: AsRef<str>>(args: &[S]) -> Result<TaskResult> {
    Task::new(args.iter().map(|a| a.as_ref().to_string())).run()
}

/// Run a command given as separate arguments.
///
/// ```no_run
/// let result = taskrun::run!("/bin/echo", "hello")?;
/// assert_eq!(result.stdout_string_utf8(), "hello");
/// # Ok::<(), taskrun::RunError>(())
/// ```
#[macro_export]
macro_rules! run {
    ($($arg:expr),+ $(,)?) => {
        $crate::runner::Task::new([$(::std::string::String::from($arg)),+]).run()
    };
}

/// Write all of `data` to the child's stdin, then close it.
///
/// A child that exits without reading its input closes the pipe early; that
/// is not an error.
fn spawn_writer(mut stdin: ChildStdin, data: Vec<u8>) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || {
        match stdin.write_all(&data) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                trace!(bytes = data.len(), "child closed stdin before reading all input");
            }
            Err(e) => return Err(e),
        }
        drop(stdin);
        Ok(())
    })
}

/// Read a pipe to EOF on its own thread.
fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<Vec<u8>> {
    match reader {
        Some(handle) => join(handle),
        None => Ok(Vec::new()),
    }
}

fn join<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .map_err(|_| io::Error::other("pipe thread panicked"))?
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::resolve::Fixed;
    use serial_test::serial;
    use tempfile::TempDir;

    fn sh(script: &str) -> Task {
        Task::new(["/bin/sh", "-c", script])
    }

    #[test]
    fn echo_captures_stdout() {
        let result = Task::new(["/bin/echo", "hello"]).run().unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout, b"hello\n");
        assert_eq!(result.stdout_string_utf8(), "hello");
        assert_eq!(result.stderr_string_utf8(), "");
    }

    #[test]
    fn nonzero_exit_is_data_not_error() {
        let result = sh("exit 7").run().unwrap();
        assert_eq!(result.code, 7);
        assert!(!result.is_success());
    }

    #[test]
    fn stderr_is_captured_separately() {
        let result = sh("echo err 1>&2").run().unwrap();
        assert_eq!(result.stderr_string_utf8(), "err");
        assert_eq!(result.stdout_string_utf8(), "");
    }

    #[test]
    fn input_round_trips_through_cat() {
        let result = Task::new(["/bin/cat"]).input(b"abc".to_vec()).run().unwrap();
        assert_eq!(result.stdout, b"abc");
    }

    #[test]
    fn binary_input_round_trips_byte_for_byte() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let result = Task::new(["/bin/cat"]).input(data.clone()).run().unwrap();
        assert_eq!(result.stdout, data);
        assert_eq!(result.stdout_string_utf8(), "");
    }

    #[test]
    fn without_input_child_sees_eof() {
        let result = Task::new(["/bin/cat"]).run().unwrap();
        assert_eq!(result.code, 0);
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn unread_input_is_not_an_error() {
        let data = vec![b'x'; 1 << 20];
        let result = sh("exit 3").input(data).run().unwrap();
        assert_eq!(result.code, 3);
    }

    #[test]
    fn large_output_on_both_streams_does_not_deadlock() {
        let script = "i=0; while [ $i -lt 2000 ]; do \
                      echo 0123456789012345678901234567890123456789; \
                      echo abcdefghijabcdefghijabcdefghijabcdefghij 1>&2; \
                      i=$((i+1)); done";
        let result = sh(script).run().unwrap();
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout.len(), 2000 * 41);
        assert_eq!(result.stderr.len(), 2000 * 41);
    }

    #[test]
    fn arguments_are_passed_verbatim() {
        let result = Task::new(["/bin/sh", "-c", "printf '%s|' \"$@\"", "sh", "a b", "$HOME", "'q'"])
            .run()
            .unwrap();
        assert_eq!(result.stdout_string_utf8(), "a b|$HOME|'q'|");
    }

    #[test]
    fn cwd_sets_working_directory() {
        let dir = TempDir::new().unwrap();
        let result = Task::new(["/bin/pwd"]).cwd(dir.path()).run().unwrap();
        let expected = dir.path().canonicalize().unwrap();
        let actual = PathBuf::from(result.stdout_string_utf8()).canonicalize().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn invalid_cwd_is_io_error() {
        let err = Task::new(["/bin/echo"])
            .cwd("/no/such/directory/anywhere")
            .run()
            .unwrap_err();
        assert!(matches!(err, RunError::Io(_)));
    }

    #[test]
    fn missing_absolute_program_is_io_error() {
        let err = Task::new(["/no/such/program"]).run().unwrap_err();
        assert!(matches!(err, RunError::Io(_)));
    }

    #[test]
    fn empty_args_is_rejected() {
        let err = Task::new(Vec::<String>::new()).run().unwrap_err();
        assert!(matches!(err, RunError::EmptyCommand));
    }

    #[test]
    fn custom_resolver_is_used_for_bare_names() {
        let resolver = Fixed::new().with("greet", "/bin/echo");
        let result = Task::new(["greet", "hi"])
            .resolver(Arc::new(resolver))
            .run()
            .unwrap();
        assert_eq!(result.stdout_string_utf8(), "hi");
    }

    #[test]
    fn unresolvable_command_is_task_error() {
        let err = Task::new(["nonexistent-tool-xyz"])
            .resolver(Arc::new(Fixed::new()))
            .run()
            .unwrap_err();
        assert_eq!(
            err.as_task_error().unwrap().description,
            "Failed to find tool \"nonexistent-tool-xyz\""
        );
    }

    #[test]
    fn explicit_snapshot_is_inherited() {
        let snapshot = EnvSnapshot::empty().with("TASKRUN_SNAPSHOT_VAR", "from-snapshot");
        let result = sh("echo \"$TASKRUN_SNAPSHOT_VAR\"")
            .env_snapshot(snapshot)
            .run()
            .unwrap();
        assert_eq!(result.stdout_string_utf8(), "from-snapshot");
    }

    #[test]
    #[serial]
    fn caller_environment_is_inherited_by_default() {
        // SAFETY: #[serial] orders this against other env writers; concurrent
        // reads from non-serial tests go through std's environment lock.
        unsafe { std::env::set_var("TASKRUN_INHERIT_TEST", "inherited") };
        let result = sh("echo \"$TASKRUN_INHERIT_TEST\"").run();
        unsafe { std::env::remove_var("TASKRUN_INHERIT_TEST") };

        assert_eq!(result.unwrap().stdout_string_utf8(), "inherited");
    }

    #[test]
    #[serial]
    fn no_inherit_withholds_caller_environment() {
        unsafe { std::env::set_var("TASKRUN_NO_INHERIT_TEST", "leaked") };
        let result = sh("echo \"[$TASKRUN_NO_INHERIT_TEST][$EXTRA]\"")
            .inherit_environment(false)
            .env("EXTRA", "given")
            .run();
        unsafe { std::env::remove_var("TASKRUN_NO_INHERIT_TEST") };

        assert_eq!(result.unwrap().stdout_string_utf8(), "[][given]");
    }

    #[test]
    fn extra_env_overrides_inherited_value() {
        let snapshot = EnvSnapshot::empty().with("NAME", "old");
        let result = sh("echo \"$NAME\"")
            .env_snapshot(snapshot)
            .env("NAME", "new")
            .run()
            .unwrap();
        assert_eq!(result.stdout_string_utf8(), "new");
    }

    #[test]
    fn concurrent_runs_are_independent() {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                thread::spawn(move || {
                    let arg = i.to_string();
                    Task::new(["/bin/sh", "-c", "echo $0", arg.as_str()])
                        .run()
                        .unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            assert_eq!(result.stdout_string_utf8(), i.to_string());
        }
    }

    #[test]
    fn run_args_matches_builder() {
        let result = run_args(&["/bin/echo", "a", "b"]).unwrap();
        assert_eq!(result.stdout_string_utf8(), "a b");
    }

    #[test]
    fn run_macro_accepts_variadic_arguments() {
        let result = crate::run!("/bin/echo", "x", String::from("y")).unwrap();
        assert_eq!(result.stdout_string_utf8(), "x y");
    }
}
