//! Companion nudge protocol: rate-limited install suggestions.
//!
//! A nudge is advisory, so every filesystem step here is best-effort:
//! unreadable or corrupt state reads as the zero value, failed writes
//! are logged and abandoned, and nothing ever surfaces to the caller.
//! The one hard requirement is the claim step: concurrent hook
//! invocations racing on the same `(session, plugin, companion)` must
//! produce exactly one emission, which `create_dir` guarantees at the
//! filesystem level.

use crate::config::{config_root, sanitize_id};
use crate::guards::has_companion;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const STATE_DIR_NAME: &str = "interverse";
const STATE_FILE_NAME: &str = "nudge-state.json";
const SESSION_BUDGET: u32 = 2;
const DISMISS_AFTER: u32 = 3;
const FALLBACK_ID: &str = "unknown";

/// Per-session nudge budget file body.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionBudget {
    count: u32,
}

/// Durable per-`plugin:companion` nudge record.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct NudgeRecord {
    ignores: u32,
    dismissed: bool,
}

/// Suggest installing a missing companion. Silent no-op when the
/// companion is already installed, the session budget is spent, the
/// user has dismissed the nudge, or another caller got there first.
pub fn nudge_companion(companion: &str, benefit: &str, plugin: &str) {
    let Some(nudger) = Nudger::from_env() else {
        return;
    };
    nudger.suggest_unless(plugin, companion, benefit, has_companion);
}

/// Nudge emitter bound to a state directory and a session identity.
///
/// [`nudge_companion`] builds one from the environment; tests point it
/// at a temporary directory instead.
#[derive(Debug, Clone)]
pub struct Nudger {
    state_dir: PathBuf,
    session_id: String,
}

impl Nudger {
    /// Create a nudger. The session id is sanitized for filename use;
    /// an empty or fully-stripped id collapses to `"unknown"`.
    pub fn new(state_dir: impl Into<PathBuf>, session_id: &str) -> Self {
        let mut session_id = sanitize_id(session_id);
        if session_id.is_empty() {
            session_id = FALLBACK_ID.to_string();
        }
        Self {
            state_dir: state_dir.into(),
            session_id,
        }
    }

    /// Build from `$CLAUDE_SESSION_ID` and the user config root.
    fn from_env() -> Option<Self> {
        let root = config_root()?;
        let session_id = std::env::var("CLAUDE_SESSION_ID").unwrap_or_default();
        Some(Self::new(root.join(STATE_DIR_NAME), &session_id))
    }

    /// [`Self::suggest`] gated on a capability check: an already
    /// installed companion is never nudged and leaves no state behind.
    fn suggest_unless(
        &self,
        plugin: &str,
        companion: &str,
        benefit: &str,
        companion_present: impl Fn(&str) -> bool,
    ) -> bool {
        if companion.is_empty() || companion_present(companion) {
            return false;
        }
        self.suggest(plugin, companion, benefit)
    }

    /// Run the emission algorithm for one `(plugin, companion)` key.
    /// Returns whether a nudge was actually printed. Companion
    /// detection is the caller's job; see [`nudge_companion`].
    pub fn suggest(&self, plugin: &str, companion: &str, benefit: &str) -> bool {
        if companion.is_empty() {
            return false;
        }
        let plugin = if plugin.is_empty() { FALLBACK_ID } else { plugin };

        let session_file = self.session_file();
        let count = read_session_count(&session_file);
        if count >= SESSION_BUDGET {
            return false;
        }

        let state_file = self.state_dir.join(STATE_FILE_NAME);
        if is_dismissed(&state_file, plugin, companion) {
            return false;
        }

        // Atomic claim: mkdir is the create-exclusive primitive shared
        // with the other SDKs. The first caller to create the marker
        // wins; everyone else backs off. Markers are never cleaned up.
        let _ = fs::create_dir_all(&self.state_dir);
        let marker = self.state_dir.join(format!(
            ".nudge-{}-{plugin}-{companion}",
            self.session_id
        ));
        if fs::create_dir(&marker).is_err() {
            return false;
        }

        eprintln!("[interverse] Tip: run /plugin install {companion} for {benefit}.");

        write_session_count(&session_file, count + 1);
        record_ignore(&state_file, plugin, companion);
        true
    }

    fn session_file(&self) -> PathBuf {
        self.state_dir
            .join(format!("nudge-session-{}.json", self.session_id))
    }
}

fn state_key(plugin: &str, companion: &str) -> String {
    format!("{plugin}:{companion}")
}

fn read_session_count(path: &Path) -> u32 {
    fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<SessionBudget>(&raw).ok())
        .map_or(0, |budget| budget.count)
}

fn write_session_count(path: &Path, count: u32) {
    let Ok(body) = serde_json::to_string(&SessionBudget { count }) else {
        return;
    };
    if let Err(err) = fs::write(path, body) {
        warn!("failed to persist session budget ({}): {err}", path.display());
    }
}

fn load_state(path: &Path) -> BTreeMap<String, NudgeRecord> {
    fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn is_dismissed(path: &Path, plugin: &str, companion: &str) -> bool {
    load_state(path)
        .get(&state_key(plugin, companion))
        .is_some_and(|record| record.dismissed)
}

fn record_ignore(path: &Path, plugin: &str, companion: &str) {
    let mut state = load_state(path);
    let record = state.entry(state_key(plugin, companion)).or_default();
    record.ignores += 1;
    if record.ignores >= DISMISS_AFTER {
        record.dismissed = true;
    }
    let Ok(body) = serde_json::to_string(&state) else {
        return;
    };
    if let Err(err) = fs::write(path, body) {
        warn!("failed to persist nudge state ({}): {err}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::{Nudger, load_state, state_key};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn nudger(dir: &std::path::Path, session: &str) -> Nudger {
        Nudger::new(dir.to_path_buf(), session)
    }

    #[test]
    fn third_ignore_dismisses_durably() {
        let dir = tempdir().expect("tempdir");

        // One emission per session so the per-session budget never
        // interferes; the durable state spans all of them.
        assert!(nudger(dir.path(), "s1").suggest("demo", "beads", "issue tracking"));
        assert!(nudger(dir.path(), "s2").suggest("demo", "beads", "issue tracking"));
        assert!(nudger(dir.path(), "s3").suggest("demo", "beads", "issue tracking"));

        let state = load_state(&dir.path().join("nudge-state.json"));
        let record = state.get(&state_key("demo", "beads")).expect("record");
        assert_eq!(record.ignores, 3);
        assert!(record.dismissed);

        // Fourth attempt in a fresh session: dismissed, no emission.
        assert!(!nudger(dir.path(), "s4").suggest("demo", "beads", "issue tracking"));
    }

    #[test]
    fn session_budget_caps_at_two_across_keys() {
        let dir = tempdir().expect("tempdir");
        let nudger = nudger(dir.path(), "one-session");

        assert!(nudger.suggest("demo", "companion-a", "a"));
        assert!(nudger.suggest("demo", "companion-b", "b"));
        assert!(!nudger.suggest("demo", "companion-c", "c"));

        // A different session still has budget.
        assert!(Nudger::new(dir.path().to_path_buf(), "another-session").suggest(
            "demo",
            "companion-c",
            "c"
        ));
    }

    #[test]
    fn claim_marker_dedups_same_emission() {
        let dir = tempdir().expect("tempdir");
        let nudger = nudger(dir.path(), "s1");

        assert!(nudger.suggest("demo", "beads", "tracking"));
        // Same (session, plugin, companion): the marker already exists.
        assert!(!nudger.suggest("demo", "beads", "tracking"));

        let state = load_state(&dir.path().join("nudge-state.json"));
        assert_eq!(state.get(&state_key("demo", "beads")).map(|r| r.ignores), Some(1));
    }

    #[test]
    fn concurrent_callers_emit_exactly_once() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().to_path_buf();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    Nudger::new(path, "race-session").suggest("demo", "beads", "tracking")
                })
            })
            .collect();
        let emitted = handles
            .into_iter()
            .map(|handle| handle.join().expect("join nudge thread"))
            .filter(|emitted| *emitted)
            .count();
        assert_eq!(emitted, 1);

        let state = load_state(&dir.path().join("nudge-state.json"));
        assert_eq!(
            state.get(&state_key("demo", "beads")).map(|r| r.ignores),
            Some(1)
        );
    }

    #[test]
    fn corrupt_state_reads_as_zero() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("nudge-state.json"), "not-json").expect("write");
        fs::write(dir.path().join("nudge-session-s1.json"), "{broken").expect("write");

        assert!(nudger(dir.path(), "s1").suggest("demo", "beads", "tracking"));
    }

    #[test]
    fn empty_companion_is_ignored_without_state_changes() {
        let dir = tempdir().expect("tempdir");
        assert!(!nudger(dir.path(), "s1").suggest("demo", "", "nothing"));
        assert!(!dir.path().join("nudge-state.json").exists());
        assert!(!dir.path().join("nudge-session-s1.json").exists());
    }

    #[test]
    fn session_id_is_sanitized_for_marker_names() {
        let dir = tempdir().expect("tempdir");
        assert!(nudger(dir.path(), "se ss/../ion!").suggest("demo", "beads", "tracking"));
        assert!(dir.path().join(".nudge-session-demo-beads").is_dir());
        assert!(dir.path().join("nudge-session-session.json").is_file());
    }

    #[test]
    fn empty_session_id_collapses_to_unknown() {
        let dir = tempdir().expect("tempdir");
        assert!(nudger(dir.path(), "").suggest("demo", "beads", "tracking"));
        assert!(dir.path().join(".nudge-unknown-demo-beads").is_dir());
    }

    #[test]
    fn present_companion_is_never_nudged_and_leaves_no_state() {
        let dir = tempdir().expect("tempdir");
        let emitted =
            nudger(dir.path(), "s1").suggest_unless("demo", "beads", "tracking", |_| true);
        assert!(!emitted);
        assert!(!dir.path().join("nudge-state.json").exists());
        assert!(!dir.path().join("nudge-session-s1.json").exists());
        assert!(!dir.path().join(".nudge-s1-demo-beads").exists());

        // Absent companion goes through the normal algorithm.
        assert!(nudger(dir.path(), "s1").suggest_unless("demo", "beads", "tracking", |_| false));
    }

    #[test]
    fn empty_plugin_defaults_to_unknown_key() {
        let dir = tempdir().expect("tempdir");
        assert!(nudger(dir.path(), "s1").suggest("", "beads", "tracking"));
        let state = load_state(&dir.path().join("nudge-state.json"));
        assert!(state.contains_key(&state_key("unknown", "beads")));
    }
}
