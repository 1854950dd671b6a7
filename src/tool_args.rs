//! Typed argument contracts for external tools.
//!
//! Every external program this crate runs (`git`, the engine's packaging
//! tool) is described by a struct implementing [`ToolArgs`]. The struct is
//! the single source of truth for the program path and its argument list, so
//! argument order is fixed at compile time instead of being assembled from
//! loose strings at each call site.

use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, Ordering};

static DRY_RUN: AtomicBool = AtomicBool::new(false);

/// Log external commands instead of running them.
pub fn enable_dry_run() {
    DRY_RUN.store(true, Ordering::SeqCst);
}

pub fn is_dry_run() -> bool {
    DRY_RUN.load(Ordering::SeqCst)
}

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Child writes straight to our terminal
    Inherit,
    /// Output is discarded; only the exit status matters
    Silent,
}

/// Trait for typed external tool invocations.
///
/// # Contract
///
/// - `program()`: executable to run, either a bare name resolved via `PATH`
///   or an absolute path.
/// - `to_cli_args()`: arguments exactly as the program expects them, one
///   element per argv entry. Nothing is re-split by a shell.
/// - `interactive()`: whether the tool may need the controlling terminal
///   (credential prompts). Interactive tools stay in our process group and
///   keep our stdin; all others get `/dev/null`.
pub trait ToolArgs {
    fn program(&self) -> OsString;

    fn to_cli_args(&self) -> Vec<OsString>;

    fn interactive(&self) -> bool {
        false
    }

    /// Short human-readable name for log lines (e.g. "git pull").
    fn describe(&self) -> String;

    /// Whether this invocation still runs in dry-run mode.
    ///
    /// Read-only queries (`git status`) return true so dry runs take the
    /// same branches as real ones.
    fn runs_in_dry_run(&self) -> bool {
        false
    }
}

/// Render a command line for logging.
pub fn display_command<T: ToolArgs + ?Sized>(args: &T) -> String {
    let mut line = args.program().to_string_lossy().into_owned();
    for arg in args.to_cli_args() {
        let arg = arg.to_string_lossy();
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(&arg);
            line.push('"');
        } else {
            line.push_str(&arg);
        }
    }
    line
}
