//! Graceful termination signals.

#[cfg(unix)]
use tracing::info;
use tracing::warn;

/// Ask `pid` to terminate. Returns whether the signal was delivered.
#[cfg(unix)]
pub(crate) fn terminate(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        warn!("PID {pid} does not fit a signal target");
        return false;
    };

    info!("Sending SIGTERM to pid {pid}");
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to send SIGTERM to pid {pid}: {e}");
            false
        }
    }
}

/// No graceful signal exists; the caller falls through to a kill.
#[cfg(not(unix))]
pub(crate) fn terminate(pid: u32) -> bool {
    warn!("No graceful signal available for pid {pid}, falling back to a kill");
    false
}
