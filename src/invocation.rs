//! Resolution of the positional command line into a concrete run.
//!
//! The positional forms are order-sensitive and depend on whether the
//! current directory is already a repository:
//!
//! | cwd is repo | positionals               | meaning                         |
//! |-------------|---------------------------|---------------------------------|
//! | any         | none                      | prompt for engine, build cwd    |
//! | yes         | `<engine> [flags...]`     | build cwd                       |
//! | no          | `<engine>`                | build cwd                       |
//! | no          | `<engine> <url> [flags]`  | clone url, build the clone      |

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BuildError, Result};
use crate::vcs::repository_name;

/// Source of answers for values missing from the command line.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Prompts on stdout and reads a line from stdin.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", question)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(BuildError::validation("no input on stdin"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

pub const ENGINE_DIR_QUESTION: &str = "Enter the Unreal Engine directory path: ";

/// Where the workspace comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSource {
    /// Build the repository already checked out here
    Existing(PathBuf),
    /// Clone `url` into `dir` first
    Clone { url: String, dir: PathBuf },
}

impl WorkspaceSource {
    pub fn root(&self) -> &Path {
        match self {
            WorkspaceSource::Existing(dir) => dir,
            WorkspaceSource::Clone { dir, .. } => dir,
        }
    }
}

/// Fully resolved inputs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub engine_dir: PathBuf,
    pub workspace: WorkspaceSource,
    pub extra_flags: Vec<String>,
}

/// Turn the positional arguments into an [`Invocation`].
///
/// `positionals` is everything after the program name that is not one of
/// this tool's own options.
pub fn resolve_invocation(
    positionals: &[String],
    cwd: &Path,
    cwd_is_repo: bool,
    prompt: &mut dyn Prompt,
) -> Result<Invocation> {
    let Some((engine, rest)) = positionals.split_first() else {
        debug!("No engine directory given, prompting");
        let answer = prompt.ask(ENGINE_DIR_QUESTION)?;
        return Ok(Invocation {
            engine_dir: engine_path(&answer)?,
            workspace: WorkspaceSource::Existing(cwd.to_path_buf()),
            extra_flags: Vec::new(),
        });
    };
    let engine_dir = engine_path(engine)?;

    let (url, flags) = match rest.split_first() {
        Some(split) if !cwd_is_repo => split,
        _ => {
            return Ok(Invocation {
                engine_dir,
                workspace: WorkspaceSource::Existing(cwd.to_path_buf()),
                extra_flags: rest.to_vec(),
            });
        }
    };
    let dir = cwd.join(repository_name(url)?);
    debug!("Will clone {} into {}", url, dir.display());
    Ok(Invocation {
        engine_dir,
        workspace: WorkspaceSource::Clone { url: url.clone(), dir },
        extra_flags: flags.to_vec(),
    })
}

fn engine_path(raw: &str) -> Result<PathBuf> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return Err(BuildError::validation("engine directory must not be empty"));
    }
    Ok(PathBuf::from(trimmed))
}
