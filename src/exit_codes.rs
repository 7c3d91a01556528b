//! Exit code constants for the taskrun CLI.
//!
//! When the child runs, taskrun exits with the child's own code. These codes
//! are used only when no child result exists:
//! - 0: Success
//! - 1: User error (bad args, bad config)
//! - 2: Command could not be resolved
//! - 3: OS-level process or pipe failure
//!
//! They overlap the child's code range, so scripts that must tell them apart
//! should use `--json`.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, empty command, unreadable input or config.
pub const USER_ERROR: i32 = 1;

/// The command is not absolute and the resolver could not find it.
pub const TOOL_NOT_FOUND: i32 = 2;

/// Spawn, pipe or wait failure reported by the operating system.
pub const IO_FAILURE: i32 = 3;
