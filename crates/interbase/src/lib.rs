//! Rust SDK for Demarch plugin integration.
//!
//! All guard functions are fail-open: they return `false` when their
//! dependency is missing or a probe fails. All action functions are
//! silent no-ops when dependencies are absent. This keeps plugins
//! working identically in standalone and ecosystem modes; nothing in
//! this crate ever blocks a host workflow on an infrastructure error.

pub mod actions;
pub mod config;
pub mod guards;
pub mod nudge;

mod process;

/// Re-export for convenience.
pub use interbase_protocol::{ErrorKind, ToolError};

pub use actions::{emit_event, phase_set, session_status};
pub use config::{config_root, ecosystem_root, plugin_cache_path};
pub use guards::{get_bead, has_bd, has_companion, has_ic, in_ecosystem, in_sprint};
pub use nudge::{Nudger, nudge_companion};

/// Wire up env_logger when the `logging` feature is enabled; a no-op
/// otherwise. Plugin binaries should call this early in startup so the
/// SDK's diagnostic lines have somewhere to go.
#[inline]
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
