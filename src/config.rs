//! Configuration model for taskrun.
//!
//! A YAML file selects the resolver, the default environment policy and
//! extra variables applied to every run. Unknown fields are ignored for
//! forward compatibility, and every field has a default.

use crate::error::{Result, RunError};
use crate::resolve::{DEFAULT_WHICH_PATH, PathSearch, Resolver, WhichTool, is_absolute};
use crate::runner::Task;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming a config file for the CLI.
pub const CONFIG_ENV_VAR: &str = "TASKRUN_CONFIG";

/// How bare command names are turned into paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    /// Run the external lookup tool at `which_path` (default).
    #[default]
    WhichTool,
    /// Search `PATH` in-process.
    PathSearch,
}

impl ResolverKind {
    /// Parse a resolver kind from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "which_tool" => Some(Self::WhichTool),
            "path_search" => Some(Self::PathSearch),
            _ => None,
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Resolution strategy for non-absolute commands.
    pub resolver: ResolverKind,

    /// Absolute path of the lookup tool used by `which_tool`.
    #[serde(default = "default_which_path")]
    pub which_path: String,

    /// Whether children inherit the caller's environment.
    #[serde(default = "default_true")]
    pub inherit_environment: bool,

    /// Variables added to every child's environment.
    pub env: BTreeMap<String, String>,
}

fn default_which_path() -> String {
    DEFAULT_WHICH_PATH.to_string()
}
fn default_true() -> bool {
    true
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverKind::default(),
            which_path: default_which_path(),
            inherit_environment: default_true(),
            env: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            RunError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load the file named by `explicit`, else by `TASKRUN_CONFIG`, else
    /// return defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        };
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RunnerConfig = serde_yaml::from_str(yaml)
            .map_err(|e| RunError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| RunError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validation rules:
    /// - `which_path` must be absolute
    /// - `env` keys must be non-empty and contain no `=`
    pub fn validate(&self) -> Result<()> {
        if !is_absolute(&self.which_path) {
            return Err(RunError::Config(format!(
                "config validation failed: which_path must be absolute (found '{}')",
                self.which_path
            )));
        }

        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(RunError::Config(format!(
                    "config validation failed: invalid env variable name '{}'",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Build the configured resolver.
    pub fn build_resolver(&self) -> Arc<dyn Resolver> {
        match self.resolver {
            ResolverKind::WhichTool => Arc::new(WhichTool::new(self.which_path.clone())),
            ResolverKind::PathSearch => Arc::new(PathSearch::new()),
        }
    }

    /// Apply resolver, environment policy and extra variables to `task`.
    pub fn apply(&self, task: Task) -> Task {
        let task = task
            .resolver(self.build_resolver())
            .inherit_environment(self.inherit_environment);
        self.env
            .iter()
            .fold(task, |task, (key, value)| task.env(key, value))
    }
}
