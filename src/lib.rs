//! Taskrun: run a subprocess synchronously and capture its output.
//!
//! ```no_run
//! use taskrun::Task;
//!
//! let result = Task::new(["/bin/sh", "-c", "echo err 1>&2; exit 7"]).run()?;
//! assert_eq!(result.code, 7);
//! assert_eq!(result.stderr_string_utf8(), "err");
//! # Ok::<(), taskrun::RunError>(())
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod resolve;
pub mod result;
pub mod runner;
pub mod text;

pub use env::EnvSnapshot;
pub use error::{Result, RunError, TaskError};
pub use resolve::{Fixed, PathSearch, Resolver, WhichTool};
pub use result::TaskResult;
pub use runner::{Task, run_args};
