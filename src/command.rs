//! The single taskrun command: build a [`Task`] from CLI arguments, run it,
//! and report the result.

use crate::cli::Cli;
use anyhow::{Context, bail};
use std::io::{Read, Write};
use taskrun::config::RunnerConfig;
use taskrun::{RunError, Task, TaskResult, exit_codes};
use tracing::info;

/// Run the command described by `cli` and return the child's exit code.
pub fn execute(cli: Cli) -> anyhow::Result<i32> {
    let mut config = RunnerConfig::discover(cli.config.as_deref())?;
    if let Some(kind) = cli.resolver {
        config.resolver = kind;
    }
    if cli.no_inherit_env {
        config.inherit_environment = false;
    }

    let args = command_args(&cli)?;
    let mut task = config.apply(Task::new(args));
    if let Some(dir) = &cli.cwd {
        task = task.cwd(dir);
    }
    for (key, value) in &cli.env {
        task = task.env(key, value);
    }
    if let Some(data) = read_input(&cli)? {
        task = task.input(data);
    }

    info!(args = ?task.args(), "running command");
    let result = task.run()?;
    info!(code = result.code, "command finished");

    report(&result, cli.json)?;
    Ok(result.code)
}

/// The command and its arguments, from `--line` or the positional list.
fn command_args(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let args = match &cli.line {
        Some(line) => shell_words::split(line).with_context(|| {
            format!(
                "failed to parse command line '{}'\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                line
            )
        })?,
        None => cli.command.clone(),
    };
    if args.is_empty() {
        bail!(RunError::EmptyCommand);
    }
    Ok(args)
}

fn read_input(cli: &Cli) -> anyhow::Result<Option<Vec<u8>>> {
    if let Some(path) = &cli.input_file {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read input file '{}'", path.display()))?;
        return Ok(Some(data));
    }
    if cli.stdin {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("failed to read stdin")?;
        return Ok(Some(data));
    }
    Ok(None)
}

/// Write the child's output, raw or as JSON, to our own stdout/stderr.
fn report(result: &TaskResult, json: bool) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer(&mut stdout, result).context("failed to encode result")?;
        writeln!(stdout)?;
    } else {
        stdout.write_all(&result.stdout)?;
        let mut stderr = std::io::stderr().lock();
        stderr.write_all(&result.stderr)?;
        stderr.flush()?;
    }
    stdout.flush()?;
    Ok(())
}

/// Process exit byte for a child's code. Out-of-range codes wrap like a
/// shell's `$?` (so `-1` becomes 255).
pub fn exit_status_byte(code: i32) -> u8 {
    (code & 0xff) as u8
}

/// Exit code for an error that prevented the child from running.
pub fn error_exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<RunError>()
        .map(RunError::exit_code)
        .unwrap_or(exit_codes::USER_ERROR)
}
