//! Repository detection, cloning and updating via the `git` executable.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{BuildError, Result};
use crate::tool_args::{is_dry_run, OutputMode, ToolArgs};
use crate::tool_runner::run_tool;

/// The git subcommands the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCommand {
    /// `git -C <dir> status`
    Status { dir: PathBuf },
    /// `git clone <url> <dir>`
    Clone { url: String, dir: PathBuf },
    /// `git -C <dir> pull`
    Pull { dir: PathBuf },
}

impl ToolArgs for GitCommand {
    fn program(&self) -> OsString {
        "git".into()
    }

    fn to_cli_args(&self) -> Vec<OsString> {
        match self {
            GitCommand::Status { dir } => {
                vec!["-C".into(), dir.into(), "status".into()]
            }
            GitCommand::Clone { url, dir } => {
                vec!["clone".into(), url.into(), dir.into()]
            }
            GitCommand::Pull { dir } => {
                vec!["-C".into(), dir.into(), "pull".into()]
            }
        }
    }

    // clone and pull may ask for credentials
    fn interactive(&self) -> bool {
        !matches!(self, GitCommand::Status { .. })
    }

    fn describe(&self) -> String {
        match self {
            GitCommand::Status { .. } => "git status",
            GitCommand::Clone { .. } => "git clone",
            GitCommand::Pull { .. } => "git pull",
        }
        .to_string()
    }

    fn runs_in_dry_run(&self) -> bool {
        matches!(self, GitCommand::Status { .. })
    }
}

/// Returns true if `path` is inside a git working tree.
///
/// Any failure (path missing, git not installed, not a repository) is false.
pub fn is_repository(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    run_tool(&GitCommand::Status { dir: path.to_path_buf() }, OutputMode::Silent)
        .map(|output| output.success)
        .unwrap_or(false)
}

/// Clone `url` into `dir`.
///
/// An existing `dir` is left alone and the clone skipped, so a rerun after a
/// successful clone goes straight to the build.
pub fn clone_repository(url: &str, dir: &Path) -> Result<()> {
    if dir.exists() {
        warn!(
            "{} already exists, skipping clone of {}",
            dir.display(),
            url
        );
        return Ok(());
    }

    if !is_dry_run() {
        fs::create_dir_all(dir)?;
    }
    let output = run_tool(
        &GitCommand::Clone { url: url.to_string(), dir: dir.to_path_buf() },
        OutputMode::Inherit,
    )?;
    if !output.success {
        // a leftover empty directory would make the next run skip the clone
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!("Failed to remove {} after failed clone: {}", dir.display(), e);
        }
        return Err(BuildError::vcs(format!(
            "git clone {} exited with code {:?}",
            url, output.exit_code
        )));
    }
    info!("Cloned {} into {}", url, dir.display());
    Ok(())
}

/// Bring the repository at `dir` up to date with its upstream.
pub fn pull(dir: &Path) -> Result<()> {
    let output = run_tool(&GitCommand::Pull { dir: dir.to_path_buf() }, OutputMode::Inherit)?;
    if !output.success {
        return Err(BuildError::vcs(format!(
            "git pull in {} exited with code {:?}",
            dir.display(),
            output.exit_code
        )));
    }
    Ok(())
}

/// Directory name for a clone of `url`: its last path segment without a
/// trailing `.git`.
pub fn repository_name(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches(['/', '\\']);
    let segment = match trimmed.split_once("://") {
        Some((_, rest)) => match rest.rsplit_once(['/', '\\']) {
            Some((_, last)) => last,
            // host only: drop credentials and port
            None => rest
                .rsplit('@')
                .next()
                .and_then(|host| host.split(':').next())
                .unwrap_or_default(),
        },
        // scp-style `host:path` and local paths
        None => trimmed.rsplit(['/', '\\', ':']).next().unwrap_or_default(),
    };
    let name = segment.strip_suffix(".git").unwrap_or(segment);

    if name.is_empty() || name == "." || name == ".." {
        return Err(BuildError::validation(format!(
            "cannot derive a repository name from '{}'",
            url
        )));
    }
    Ok(name.to_string())
}
