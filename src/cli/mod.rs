//! CLI argument parsing for taskrun.
//!
//! Uses clap derive macros for declarative argument definitions. The run
//! itself lives in the `command` module.

use clap::Parser;
use std::path::PathBuf;
use taskrun::config::ResolverKind;

/// Taskrun: run a command, capture its stdout and stderr, and exit with its
/// exit code.
///
/// No shell is involved: each argument after the command is passed to it
/// verbatim. Bare command names are resolved with `/usr/bin/which` unless a
/// different resolver is configured.
#[derive(Parser, Debug)]
#[command(name = "taskrun")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Feed the contents of FILE to the command's stdin.
    #[arg(long, value_name = "FILE", conflicts_with = "stdin")]
    pub input_file: Option<PathBuf>,

    /// Forward this process's stdin (read to EOF first) to the command.
    #[arg(long)]
    pub stdin: bool,

    /// Start the command with an empty environment plus --env variables.
    #[arg(long)]
    pub no_inherit_env: bool,

    /// Add a variable to the command's environment (repeatable).
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Resolver for bare command names (which_tool, path_search).
    #[arg(long, value_name = "KIND", value_parser = parse_resolver)]
    pub resolver: Option<ResolverKind>,

    /// YAML config file (default: $TASKRUN_CONFIG).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the result as one JSON object instead of raw output.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Give the command as one line, split with shell-style quoting.
    #[arg(long, value_name = "COMMAND_LINE", conflicts_with = "command")]
    pub line: Option<String>,

    /// The command followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "line"
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn parse_resolver(s: &str) -> Result<ResolverKind, String> {
    ResolverKind::from_str(&s.replace('-', "_"))
        .ok_or_else(|| format!("unknown resolver '{}' (expected which_tool or path_search)", s))
}
