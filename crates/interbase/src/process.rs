//! Timeout-bounded subprocess execution.
//!
//! Every external CLI the SDK shells out to goes through [`run_quiet`]
//! so that no guard or action can hang a host workflow. Launch
//! failures and timeouts are reported as `None`, never as errors.

use log::debug;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run a command with stdio detached, waiting at most `timeout`.
///
/// Returns the exit status, or `None` when the command could not be
/// spawned or did not finish in time. A timed-out child is killed and
/// reaped before returning.
pub(crate) fn run_quiet(command: &mut Command, timeout: Duration) -> Option<ExitStatus> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!("failed to spawn {:?}: {err}", command.get_program());
            return None;
        }
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    debug!("{:?} timed out after {timeout:?}", command.get_program());
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                debug!("failed to wait on {:?}: {err}", command.get_program());
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    }
}
