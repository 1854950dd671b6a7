//! External tool execution
//!
//! [`run_tool`] is the only place this crate spawns a process. It:
//!
//! - logs the exact command line before running it
//! - isolates non-interactive tools in their own process group
//! - registers the child PID for signal-driven cleanup
//! - honours dry-run mode
//!
//! A non-zero exit is not an error here; callers map the exit code to the
//! error that fits their step.

use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{BuildError, Result};
use crate::process_guard::{CommandProcessGroup, RegisteredChild};
use crate::tool_args::{display_command, is_dry_run, OutputMode, ToolArgs};

/// Exit status of an external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl ToolOutput {
    fn skipped() -> Self {
        Self { exit_code: Some(0), success: true }
    }
}

/// Run an external tool and wait for it.
///
/// Returns `Err` only when the process could not be spawned or waited on.
pub fn run_tool<T: ToolArgs + ?Sized>(args: &T, mode: OutputMode) -> Result<ToolOutput> {
    let line = display_command(args);

    if is_dry_run() && !args.runs_in_dry_run() {
        info!("[DRY RUN] Skipped: {}", line);
        return Ok(ToolOutput::skipped());
    }

    info!("Running {}: {}", args.describe(), line);

    let mut cmd = Command::new(args.program());
    cmd.args(args.to_cli_args());
    match mode {
        OutputMode::Inherit => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        OutputMode::Silent => {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
    }
    if args.interactive() {
        cmd.stdin(Stdio::inherit());
    } else {
        // a background group reading the terminal would be stopped by SIGTTIN
        cmd.stdin(Stdio::null()).in_new_process_group();
    }

    let mut child = cmd
        .spawn()
        .map_err(|e| BuildError::tool(format!("failed to start {}: {}", args.describe(), e)))?;
    let _registration = RegisteredChild::new(child.id());

    let status = child.wait().map_err(|e| {
        BuildError::tool(format!("failed waiting for {}: {}", args.describe(), e))
    })?;

    let exit_code = status.code();
    let success = status.success();
    if success {
        debug!("{} exited successfully", args.describe());
    } else {
        warn!("{} exited with code {:?}", args.describe(), exit_code);
    }

    Ok(ToolOutput { exit_code, success })
}
