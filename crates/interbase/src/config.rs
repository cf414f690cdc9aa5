//! Config-root resolution and plugin cache discovery.

use directories::BaseDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-user configuration root: `$XDG_CONFIG_HOME`, else `~/.config`.
///
/// `None` only when the home directory cannot be resolved at all.
pub fn config_root() -> Option<PathBuf> {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => BaseDirs::new().map(|dirs| dirs.home_dir().join(".config")),
    }
}

/// Root of the Claude plugin cache (`~/.claude/plugins/cache`).
pub(crate) fn plugin_cache_root() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".claude")
            .join("plugins")
            .join("cache")
    })
}

/// Cache path for a named plugin, or `None` when not installed.
///
/// The cache holds one directory per marketplace, each containing
/// `<plugin>/<version>` entries; the highest-sorted entry wins.
pub fn plugin_cache_path(plugin: &str) -> Option<PathBuf> {
    if plugin.is_empty() {
        return None;
    }
    let root = plugin_cache_root()?;
    cache_entries(&root, plugin).pop()
}

/// All `<marketplace>/<plugin>/<version>` entries for a plugin, sorted.
/// Unreadable directories are skipped.
pub(crate) fn cache_entries(cache_root: &Path, plugin: &str) -> Vec<PathBuf> {
    let mut entries = Vec::new();
    let Ok(marketplaces) = fs::read_dir(cache_root) else {
        return entries;
    };
    for marketplace in marketplaces.flatten() {
        let plugin_dir = marketplace.path().join(plugin);
        let Ok(versions) = fs::read_dir(&plugin_dir) else {
            continue;
        };
        for version in versions.flatten() {
            entries.push(version.path());
        }
    }
    entries.sort();
    entries
}

/// Demarch monorepo root: `$DEMARCH_ROOT` if set, else the nearest
/// ancestor of the cwd containing `sdk/interbase`.
pub fn ecosystem_root() -> Option<PathBuf> {
    if let Ok(root) = std::env::var("DEMARCH_ROOT") {
        if !root.is_empty() {
            return Some(PathBuf::from(root));
        }
    }
    let cwd = std::env::current_dir().ok()?;
    ecosystem_root_from(&cwd)
}

/// Walk up from `start` looking for the monorepo marker directory.
pub(crate) fn ecosystem_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("sdk").join("interbase").is_dir())
        .map(Path::to_path_buf)
}

/// Strip every character outside `[A-Za-z0-9_-]` so externally supplied
/// identifiers are safe to embed in filenames.
pub(crate) fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}
