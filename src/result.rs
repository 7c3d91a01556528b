//! The outcome of a finished child process.

use crate::text::decode_utf8_trimmed;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::process::ExitStatus;

/// Exit code reported when the OS gives neither a status nor a signal.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Exit code and captured output of a child process that has terminated.
///
/// A non-zero `code` is ordinary data, not an error: the command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Exit status of the child.
    pub code: i32,
    /// Everything the child wrote to standard output.
    pub stdout: Vec<u8>,
    /// Everything the child wrote to standard error.
    pub stderr: Vec<u8>,
}

impl TaskResult {
    pub(crate) fn from_status(status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            code: exit_code_of(status),
            stdout,
            stderr,
        }
    }

    /// Stdout decoded as UTF-8 with trailing whitespace removed.
    ///
    /// Invalid UTF-8 gives an empty string.
    pub fn stdout_string_utf8(&self) -> String {
        decode_utf8_trimmed(&self.stdout)
    }

    /// Stderr decoded as UTF-8 with trailing whitespace removed.
    ///
    /// Invalid UTF-8 gives an empty string.
    pub fn stderr_string_utf8(&self) -> String {
        decode_utf8_trimmed(&self.stderr)
    }

    /// Returns true if the child exited with code 0.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

impl Serialize for TaskResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TaskResult", 3)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("stdout", &self.stdout_string_utf8())?;
        state.serialize_field("stderr", &self.stderr_string_utf8())?;
        state.end()
    }
}

/// Map an exit status to a single signed code.
///
/// A child killed by a signal reports `128 + signal`, as shells do.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}
