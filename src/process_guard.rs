//! Process lifecycle management for external tools
//!
//! `git` and the engine's packaging tool can run for a long time and spawn
//! their own children (UnrealBuildTool, compilers). If the builder is
//! interrupted those trees must not keep writing into the workspace.
//!
//! - Each external tool is spawned as the leader of its own process group
//! - Leader PIDs are tracked in a global registry while they run
//! - On SIGINT/SIGTERM/SIGHUP the registered groups get SIGTERM, then SIGKILL
//!   after a grace period
//!
//! On non-unix targets the registry still tracks PIDs but no signals are sent.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use tracing::{debug, info, warn};

static CHILD_REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// Registry of running external tool processes
#[derive(Debug, Default)]
pub struct ChildRegistry {
    pids: HashSet<u32>,
    /// Set once termination has started so it never runs twice
    cleanup_initiated: bool,
}

impl ChildRegistry {
    /// Get or create the global child registry
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        CHILD_REGISTRY
            .get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default())))
            .clone()
    }

    pub fn register(&mut self, pid: u32) {
        self.pids.insert(pid);
        debug!("Registered child process PID {}", pid);
    }

    pub fn unregister(&mut self, pid: u32) {
        self.pids.remove(&pid);
        debug!("Unregistered child process PID {}", pid);
    }

    pub fn count(&self) -> usize {
        self.pids.len()
    }

    /// Terminate every tracked process group.
    ///
    /// Sends SIGTERM, waits up to `grace_period` for the leaders to exit,
    /// then sends SIGKILL to whatever is left.
    pub fn terminate_all(&mut self, grace_period: Duration) {
        if self.cleanup_initiated {
            debug!("Cleanup already initiated, skipping");
            return;
        }
        self.cleanup_initiated = true;

        if self.pids.is_empty() {
            debug!("No child processes to terminate");
            return;
        }

        info!("Terminating {} child process(es)...", self.pids.len());
        let pids: Vec<u32> = self.pids.drain().collect();
        platform::terminate_groups(&pids, grace_period);
        info!("Child process cleanup complete");
    }
}

/// Ties an external tool's lifetime to the registry.
///
/// Registers on creation and unregisters on drop, so early returns via `?`
/// never leave stale PIDs behind.
pub struct RegisteredChild {
    pid: u32,
}

impl RegisteredChild {
    pub fn new(pid: u32) -> Self {
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.register(pid);
        }
        Self { pid }
    }
}

impl Drop for RegisteredChild {
    fn drop(&mut self) {
        if let Ok(mut registry) = ChildRegistry::global().lock() {
            registry.unregister(self.pid);
        }
    }
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP.
///
/// The handler thread terminates all registered tool processes and exits
/// with `128 + signal`. Call once at program start.
#[cfg(unix)]
pub fn init_signal_handlers() -> std::io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            let name = match sig {
                SIGINT => "SIGINT",
                SIGTERM => "SIGTERM",
                SIGHUP => "SIGHUP",
                _ => "UNKNOWN",
            };
            warn!("Received {}, stopping external tools...", name);

            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.terminate_all(Duration::from_secs(3));
            }
            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn init_signal_handlers() -> std::io::Result<()> {
    debug!("Signal handlers are not installed on this platform");
    Ok(())
}

/// Extension trait for `std::process::Command` to isolate the child
pub trait CommandProcessGroup {
    /// Run the command as the leader of a new process group that dies with
    /// its parent.
    fn in_new_process_group(&mut self) -> &mut Self;
}

#[cfg(unix)]
impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;

        self.process_group(0);
        #[cfg(target_os = "linux")]
        // SAFETY: prctl is async-signal-safe and touches no parent state.
        unsafe {
            self.pre_exec(|| {
                if nix::libc::prctl(nix::libc::PR_SET_PDEATHSIG, nix::libc::SIGTERM) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
        self
    }
}

#[cfg(not(unix))]
impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        self
    }
}

#[cfg(unix)]
mod platform {
    use std::time::{Duration, Instant};

    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    use tracing::{debug, warn};

    pub(super) fn terminate_groups(pids: &[u32], grace_period: Duration) {
        for &pid in pids {
            if let Err(e) = signal_group(pid, Signal::SIGTERM) {
                warn!("Failed to send SIGTERM to process group {}: {}", pid, e);
            } else {
                debug!("Sent SIGTERM to process group {}", pid);
            }
        }

        let start = Instant::now();
        while start.elapsed() < grace_period {
            if pids.iter().all(|&pid| !is_process_alive(pid)) {
                return;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        for &pid in pids.iter().filter(|&&pid| is_process_alive(pid)) {
            warn!("Process group {} did not terminate, sending SIGKILL", pid);
            let _ = signal_group(pid, Signal::SIGKILL);
        }
    }

    /// Negative PID addresses the whole group
    fn signal_group(pgid: u32, sig: Signal) -> Result<(), nix::Error> {
        match signal::kill(Pid::from_raw(-(pgid as i32)), sig) {
            // interactive tools share our group, signal the process alone
            Err(nix::Error::ESRCH) => signal::kill(Pid::from_raw(pgid as i32), sig),
            other => other,
        }
    }

    /// Alive means the PID exists and is not a zombie
    pub(super) fn is_process_alive(pid: u32) -> bool {
        if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
            return false;
        }
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .and_then(|rest| rest.split_whitespace().next())
                .is_none_or(|state| !matches!(state, "Z" | "X")),
            Err(_) => true,
        }
    }
}

#[cfg(not(unix))]
mod platform {
    use std::time::Duration;

    pub(super) fn terminate_groups(_pids: &[u32], _grace_period: Duration) {}
}
