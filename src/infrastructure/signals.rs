//! Signal forwarding for spawned subcommands
//!
//! While a child is tracked, SIGINT, SIGTERM, SIGHUP, SIGUSR1 and SIGUSR2 delivered
//! to the dispatcher are re-sent to the child unchanged. The dispatcher itself keeps
//! waiting so the child's exit code can still be passed through.

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Once;

use tracing::{debug, warn};

static CHILD_PID: AtomicU32 = AtomicU32::new(0);
static INSTALL: Once = Once::new();

/// Signals re-sent to the tracked child.
#[cfg(unix)]
pub const FORWARDED: [i32; 5] = [
    signal_hook::consts::SIGINT,
    signal_hook::consts::SIGTERM,
    signal_hook::consts::SIGHUP,
    signal_hook::consts::SIGUSR1,
    signal_hook::consts::SIGUSR2,
];

/// Install the process-wide forwarding. Safe to call repeatedly.
pub fn install_forwarding() {
    INSTALL.call_once(|| {
        if let Err(e) = start_forwarder() {
            warn!("cannot install signal forwarding: {}", e);
        }
    });
}

#[cfg(unix)]
fn start_forwarder() -> io::Result<()> {
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new(FORWARDED)?;
    std::thread::Builder::new()
        .name("signal-forward".into())
        .spawn(move || {
            for signal in signals.forever() {
                forward_to_child(signal);
            }
        })?;
    Ok(())
}

// console control events already reach every process attached to the console;
// the handler only keeps the dispatcher alive until the child has exited
#[cfg(not(unix))]
fn start_forwarder() -> io::Result<()> {
    ctrlc::set_handler(|| {
        if let Some(pid) = tracked_pid() {
            debug!("console event received while waiting for {}", pid);
        }
    })
    .map_err(io::Error::other)
}

/// Marks a child as the forwarding target until dropped.
#[derive(Debug)]
pub struct TrackedChild {
    pid: u32,
}

impl TrackedChild {
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for TrackedChild {
    fn drop(&mut self) {
        let _ = CHILD_PID.compare_exchange(self.pid, 0, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Start forwarding signals to `pid`.
pub fn track(pid: u32) -> TrackedChild {
    CHILD_PID.store(pid, Ordering::SeqCst);
    TrackedChild { pid }
}

/// Pid currently receiving forwarded signals, if any.
pub fn tracked_pid() -> Option<u32> {
    match CHILD_PID.load(Ordering::SeqCst) {
        0 => None,
        pid => Some(pid),
    }
}

#[cfg(unix)]
fn forward_to_child(signal: i32) {
    let Some(pid) = tracked_pid() else {
        debug!("signal {} received with no child running", signal);
        return;
    };
    match send_signal(pid, signal) {
        Ok(()) => debug!("forwarded signal {} to {}", signal, pid),
        Err(e) => debug!("cannot forward signal {} to {}: {}", signal, pid, e),
    }
}

/// Send the raw signal number `signal` to `pid`.
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: i32) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(pid).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let signal = Signal::try_from(signal).map_err(io::Error::from)?;
    kill(Pid::from_raw(pid), signal).map_err(io::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_tracked_child_when_dropped_then_stops_forwarding() {
        {
            let tracked = track(4242);
            assert_eq!(tracked.pid(), 4242);
            assert_eq!(tracked_pid(), Some(4242));
        }
        assert_eq!(tracked_pid(), None);
    }

    #[cfg(unix)]
    #[test]
    fn given_running_child_when_sending_signal_then_child_dies_by_that_signal() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::Command;

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();

        send_signal(child.id(), signal_hook::consts::SIGUSR1).unwrap();

        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(signal_hook::consts::SIGUSR1));
    }

    #[cfg(unix)]
    #[test]
    fn given_unknown_signal_number_when_sending_then_errors() {
        assert!(send_signal(1, 0xFFFF).is_err());
    }
}
