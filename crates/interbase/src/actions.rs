//! Action shims for the ecosystem CLIs.
//!
//! Actions return nothing: they are guaranteed no-ops when the backing
//! CLI is absent, and subprocess failures go to the log, never to the
//! caller. Returning an error here would create dead code at every
//! call site.

use crate::guards::{has_bd, has_ic, ic_run_active};
use crate::process::run_quiet;
use log::warn;
use std::process::Command;
use std::time::Duration;

const ACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Set the phase on a bead via `bd set-state`. Silent no-op without bd.
pub fn phase_set(bead: &str, phase: &str) {
    if !has_bd() {
        return;
    }
    let mut command = Command::new("bd");
    command
        .args(["set-state", bead])
        .arg(format!("phase={phase}"));
    match run_quiet(&mut command, ACTION_TIMEOUT) {
        Some(status) if status.success() => {}
        _ => warn!("bd set-state failed (bead={bead}, phase={phase})"),
    }
}

/// Emit an event via `ic events emit`. Silent no-op without ic. An
/// empty payload defaults to `{}`.
pub fn emit_event(run_id: &str, event_type: &str, payload: &str) {
    if !has_ic() {
        return;
    }
    let payload = if payload.is_empty() { "{}" } else { payload };
    let mut command = Command::new("ic");
    command
        .args(["events", "emit", run_id, event_type])
        .arg(format!("--payload={payload}"));
    match run_quiet(&mut command, ACTION_TIMEOUT) {
        Some(status) if status.success() => {}
        _ => warn!("ic events emit failed (run={run_id}, event={event_type})"),
    }
}

/// Human-readable ecosystem status line.
pub fn session_status() -> String {
    let mut parts = Vec::new();

    parts.push(if has_bd() {
        "beads=active"
    } else {
        "beads=not-detected"
    });

    if has_ic() {
        parts.push(if ic_run_active() {
            "ic=active"
        } else {
            "ic=not-initialized"
        });
    } else {
        parts.push("ic=not-detected");
    }

    format!("[interverse] {}", parts.join(" | "))
}
