//! Executable resolution.
//!
//! A command starting with `/` is used verbatim. Anything else is handed to a
//! [`Resolver`]. The default resolver asks the external `which` tool at a
//! fixed path; hosts without it can plug in [`PathSearch`] or [`Fixed`].

use crate::error::{Result, TaskError};
use crate::runner::Task;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Path of the lookup tool used by [`WhichTool::default`].
pub const DEFAULT_WHICH_PATH: &str = "/usr/bin/which";

/// Strategy turning a bare command name into an executable path.
pub trait Resolver: Send + Sync {
    /// Resolve `tool`, failing with a [`TaskError`] if it cannot be found.
    fn resolve(&self, tool: &str) -> Result<PathBuf>;
}

/// Returns true if `command` is an absolute path.
pub fn is_absolute(command: &str) -> bool {
    command.starts_with('/')
}

/// Resolve `command`, skipping the resolver for absolute paths.
pub fn resolve_command(resolver: &dyn Resolver, command: &str) -> Result<PathBuf> {
    if is_absolute(command) {
        return Ok(PathBuf::from(command));
    }
    let path = resolver.resolve(command)?;
    debug!(tool = command, path = %path.display(), "resolved command");
    Ok(path)
}

/// Resolves names by running an external `which`-style tool.
///
/// The tool is run through the regular runner; its exit code must be 0 and
/// its trimmed stdout is the resolved path.
#[derive(Debug, Clone)]
pub struct WhichTool {
    path: String,
}

impl WhichTool {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Default for WhichTool {
    fn default() -> Self {
        Self::new(DEFAULT_WHICH_PATH)
    }
}

impl Resolver for WhichTool {
    fn resolve(&self, tool: &str) -> Result<PathBuf> {
        // The nested run must not recurse back into this resolver; a relative
        // lookup path fails against the empty table instead.
        let result = Task::new([self.path.as_str(), tool])
            .resolver(Arc::new(Fixed::default()))
            .run()?;

        if result.code != 0 {
            debug!(tool, code = result.code, "lookup tool did not find command");
            return Err(TaskError::tool_not_found(tool).into());
        }
        Ok(PathBuf::from(result.stdout_string_utf8()))
    }
}

/// Resolves names by searching `PATH` in-process.
#[derive(Debug, Clone, Default)]
pub struct PathSearch {
    search_path: Option<OsString>,
    cwd: Option<PathBuf>,
}

impl PathSearch {
    /// Search the caller's `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Search the given `PATH`-style list instead of the caller's.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Directory used for relative names such as `./tool`.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Resolver for PathSearch {
    fn resolve(&self, tool: &str) -> Result<PathBuf> {
        let found = match (&self.search_path, &self.cwd) {
            (None, None) => which::which(tool),
            (search_path, cwd) => {
                let cwd = match cwd {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir()?,
                };
                let search_path = search_path.clone().or_else(|| std::env::var_os("PATH"));
                which::which_in(tool, search_path, cwd)
            }
        };
        found.map_err(|e| {
            debug!(tool, error = %e, "PATH search failed");
            TaskError::tool_not_found(tool).into()
        })
    }
}

/// A fixed table of command names to paths.
#[derive(Debug, Clone, Default)]
pub struct Fixed {
    table: HashMap<String, PathBuf>,
}

impl Fixed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.table.insert(tool.into(), path.as_ref().to_path_buf());
        self
    }
}

impl Resolver for Fixed {
    fn resolve(&self, tool: &str) -> Result<PathBuf> {
        self.table
            .get(tool)
            .cloned()
            .ok_or_else(|| TaskError::tool_not_found(tool).into())
    }
}
