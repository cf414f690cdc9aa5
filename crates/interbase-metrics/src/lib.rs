//! Per-tool call metrics for Demarch tool servers.
//!
//! [`ToolMetrics`] is an injectable collector owned by the host
//! process: create one at startup, route every handler call through
//! [`ToolMetrics::observe`], and read [`ToolMetrics::snapshot`] on
//! demand. `observe` also enforces the error contract at the boundary:
//! any non-[`ToolError`] failure is wrapped as INTERNAL, and a panicking
//! handler is converted to an INTERNAL error instead of unwinding into
//! the host.

use interbase_protocol::ToolError;
use parking_lot::RwLock;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Atomic counters for a single tool.
#[derive(Debug, Default)]
struct ToolCounters {
    calls: AtomicU64,
    errors: AtomicU64,
    duration_ns: AtomicU64,
}

/// Snapshot of metrics for a single tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolStats {
    /// Total handler invocations.
    pub calls: u64,
    /// Invocations that returned an error or panicked.
    pub errors: u64,
    /// Total time spent in handlers.
    pub duration: Duration,
}

impl fmt::Display for ToolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "calls={} errors={} duration={:?}",
            self.calls, self.errors, self.duration
        )
    }
}

/// Collects per-tool call metrics.
#[derive(Debug, Default)]
pub struct ToolMetrics {
    tools: RwLock<HashMap<String, Arc<ToolCounters>>>,
}

impl ToolMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for a tool, created on first use.
    fn counters_for(&self, tool: &str) -> Arc<ToolCounters> {
        if let Some(counters) = self.tools.read().get(tool) {
            return Arc::clone(counters);
        }
        let mut tools = self.tools.write();
        Arc::clone(tools.entry(tool.to_string()).or_default())
    }

    /// Snapshot of metrics for all tools seen so far.
    pub fn snapshot(&self) -> HashMap<String, ToolStats> {
        let tools = self.tools.read();
        tools
            .iter()
            .map(|(name, counters)| {
                (
                    name.clone(),
                    ToolStats {
                        calls: counters.calls.load(Ordering::Relaxed),
                        errors: counters.errors.load(Ordering::Relaxed),
                        duration: Duration::from_nanos(
                            counters.duration_ns.load(Ordering::Relaxed),
                        ),
                    },
                )
            })
            .collect()
    }

    /// Run a handler under timing and error accounting.
    ///
    /// Failures are normalized to [`ToolError`]: an existing `ToolError`
    /// passes through unchanged, anything else becomes INTERNAL, and a
    /// panic is caught and reported as `panic in <tool>: <message>`.
    pub fn observe<T, E>(
        &self,
        tool: &str,
        handler: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, ToolError>
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        let counters = self.counters_for(tool);
        counters.calls.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(handler));

        let elapsed = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
        counters.duration_ns.fetch_add(elapsed, Ordering::Relaxed);

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                counters.errors.fetch_add(1, Ordering::Relaxed);
                Err(ToolError::wrap(err.into()))
            }
            Err(payload) => {
                counters.errors.fetch_add(1, Ordering::Relaxed);
                Err(ToolError::internal(format!(
                    "panic in {tool}: {}",
                    panic_message(payload.as_ref())
                )))
            }
        }
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
