//! Pre-flight checks run before anything touches the workspace:
//! - `git` is on PATH
//! - the engine directory contains the Automation Tool entry point
//!
//! Failing fast here keeps a bad engine path from surfacing only after
//! both archives have been downloaded.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::builder::uat_script;

/// Result of environment verification
#[derive(Debug, Default)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    /// Automation Tool script that was expected but not found
    pub missing_uat: Option<PathBuf>,
}

impl SanityCheckResult {
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.missing_uat.is_none()
    }

    /// One line per problem, for error reporting.
    pub fn problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .missing_binaries
            .iter()
            .map(|b| format!("required program '{}' was not found on PATH", b))
            .collect();
        if let Some(uat) = &self.missing_uat {
            problems.push(format!(
                "engine Automation Tool not found at {} (is the engine directory correct?)",
                uat.display()
            ));
        }
        problems
    }
}

/// Programs the pipeline shells out to by name
const REQUIRED_BINARIES: &[&str] = &["git"];

fn binary_exists(name: &str) -> bool {
    let finder = if cfg!(windows) { "where" } else { "which" };
    Command::new(finder)
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Check required programs and the engine layout.
pub fn verify_environment(engine_dir: &Path) -> SanityCheckResult {
    debug!("Running pre-flight checks for engine {}", engine_dir.display());

    let missing_binaries = REQUIRED_BINARIES
        .iter()
        .filter(|b| !binary_exists(b))
        .map(|b| (*b).to_string())
        .collect();

    let uat = uat_script(engine_dir);
    let missing_uat = (!uat.is_file()).then_some(uat);

    let result = SanityCheckResult { missing_binaries, missing_uat };
    if result.is_ok() {
        info!("Pre-flight checks passed");
    }
    result
}

/// Print a summary of failed checks to stderr
pub fn print_failures(result: &SanityCheckResult) {
    eprintln!();
    eprintln!("Pre-flight check failed:");
    for problem in result.problems() {
        eprintln!("  - {}", problem);
    }
    eprintln!();
}
