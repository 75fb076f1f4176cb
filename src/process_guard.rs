//! Encoder process lifetime
//!
//! A compilation runs at most one encoder at a time, synchronously. While it
//! runs its PID sits in an [`EncoderSlot`]; the [`EncoderGuard`] returned by
//! [`EncoderSlot::track`] empties the slot again however the wait ends.
//!
//! If duckforge is interrupted mid-compile, the signal thread stops the
//! encoder's whole process group (SIGTERM, then SIGKILL after a grace period)
//! so it cannot keep writing to the output path after we exit.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// How long a stopped encoder gets to exit before SIGKILL
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(3);

static ACTIVE_ENCODER: EncoderSlot = EncoderSlot::new();

/// Holds the PID of the encoder currently running, if any
#[derive(Debug, Default)]
pub struct EncoderSlot {
    pid: Mutex<Option<u32>>,
}

impl EncoderSlot {
    pub const fn new() -> Self {
        Self {
            pid: Mutex::new(None),
        }
    }

    /// Slot consulted by the signal handlers
    pub fn global() -> &'static EncoderSlot {
        &ACTIVE_ENCODER
    }

    // A panic elsewhere must not stop us from tracking or killing the encoder
    fn lock(&self) -> MutexGuard<'_, Option<u32>> {
        self.pid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `pid` as the running encoder until the guard is dropped
    pub fn track(&self, pid: u32) -> EncoderGuard<'_> {
        if let Some(previous) = self.lock().replace(pid) {
            log::warn!("Encoder {} was still tracked when {} started", previous, pid);
        }
        log::debug!("Tracking encoder PID {}", pid);
        EncoderGuard { slot: self, pid }
    }

    pub fn current(&self) -> Option<u32> {
        *self.lock()
    }

    /// Stop the tracked encoder's process group.
    ///
    /// Returns false when no encoder was running.
    pub fn stop(&self, grace_period: Duration) -> bool {
        let Some(pid) = self.lock().take() else {
            log::debug!("No encoder running");
            return false;
        };

        // Negative PID addresses the group: a wrapper script and the JVM it
        // starts both go
        let group = Pid::from_raw(-(pid as i32));
        log::info!("Stopping encoder process group {}", pid);
        if let Err(e) = signal::kill(group, Signal::SIGTERM) {
            log::debug!("Encoder group {} already gone: {}", pid, e);
            return true;
        }

        let deadline = Instant::now() + grace_period;
        while Instant::now() < deadline {
            if signal::kill(group, None).is_err() {
                log::info!("Encoder stopped");
                return true;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        log::warn!("Encoder group {} ignored SIGTERM, sending SIGKILL", pid);
        if let Err(e) = signal::kill(group, Signal::SIGKILL) {
            log::error!("Failed to kill encoder group {}: {}", pid, e);
        }
        true
    }
}

/// Clears its slot on drop, unless a newer encoder has replaced the PID
#[derive(Debug)]
pub struct EncoderGuard<'a> {
    slot: &'a EncoderSlot,
    pid: u32,
}

impl EncoderGuard<'_> {
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for EncoderGuard<'_> {
    fn drop(&mut self) {
        let mut current = self.slot.lock();
        if *current == Some(self.pid) {
            *current = None;
            log::debug!("Encoder PID {} finished", self.pid);
        }
    }
}

/// Install SIGINT, SIGTERM and SIGHUP handlers that stop a running encoder
/// and exit. Call this once at program start.
pub fn init_signal_handlers() -> Result<(), std::io::Error> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            log::info!("Received signal {}, cleaning up...", sig);
            EncoderSlot::global().stop(STOP_GRACE_PERIOD);
            std::process::exit(128 + sig);
        }
    });

    Ok(())
}

/// Extension trait for std::process::Command to set up process groups
pub trait CommandProcessGroup {
    /// Run the command as leader of its own process group
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for std::process::Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // PGID = child PID
        self.process_group(0);
        set_parent_death_signal(self);
        self
    }
}

/// Encoder dies with us even if our signal handler never runs
#[cfg(target_os = "linux")]
fn set_parent_death_signal(cmd: &mut std::process::Command) {
    use std::os::unix::process::CommandExt;
    unsafe {
        cmd.pre_exec(|| {
            if nix::libc::prctl(nix::libc::PR_SET_PDEATHSIG, nix::libc::SIGTERM) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(target_os = "linux"))]
fn set_parent_death_signal(_cmd: &mut std::process::Command) {}
