//! Fail-open capability detection.
//!
//! Every guard returns a plain bool and treats any probe failure
//! (missing binary, unreadable directory, subprocess timeout) as
//! "capability absent".

use crate::config::{cache_entries, plugin_cache_root};
use crate::process::run_quiet;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// True if the ic (Intercore) CLI is on PATH.
pub fn has_ic() -> bool {
    which::which("ic").is_ok()
}

/// True if the bd (Beads) CLI is on PATH.
pub fn has_bd() -> bool {
    which::which("bd").is_ok()
}

/// True if the named companion plugin is present in the Claude plugin
/// cache. Empty names and unreadable caches report absent.
pub fn has_companion(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    plugin_cache_root().is_some_and(|root| !cache_entries(&root, name).is_empty())
}

/// True if the centralized interbase install exists: `$INTERMOD_LIB`
/// when set, else `~/.intermod/interbase/interbase.sh`.
pub fn in_ecosystem() -> bool {
    let path = match std::env::var("INTERMOD_LIB") {
        Ok(lib) if !lib.is_empty() => PathBuf::from(lib),
        _ => {
            let Some(dirs) = directories::BaseDirs::new() else {
                return false;
            };
            dirs.home_dir()
                .join(".intermod")
                .join("interbase")
                .join("interbase.sh")
        }
    };
    path.is_file()
}

/// Current bead ID from `$CLAVAIN_BEAD_ID`, or empty string.
pub fn get_bead() -> String {
    std::env::var("CLAVAIN_BEAD_ID").unwrap_or_default()
}

/// True if there is an active sprint context (bead set + ic run).
pub fn in_sprint() -> bool {
    if get_bead().is_empty() {
        return false;
    }
    if !has_ic() {
        return false;
    }
    ic_run_active()
}

/// Probe `ic run current` for the working directory's project.
pub(crate) fn ic_run_active() -> bool {
    let mut command = Command::new("ic");
    command.args(["run", "current", "--project=."]);
    run_quiet(&mut command, PROBE_TIMEOUT).is_some_and(|status| status.success())
}
