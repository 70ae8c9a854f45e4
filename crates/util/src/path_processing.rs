use std::path::PathBuf;

use dirs_next::home_dir;

/// Expands a leading `~`, alone or followed by a path separator, to the user's
/// home directory. `~user` forms are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let Some(rest) = trimmed.strip_prefix('~') else {
        return PathBuf::from(trimmed);
    };
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if rest.is_empty() {
        return home();
    }
    match rest.strip_prefix(['/', '\\']) {
        Some(relative) => home().join(relative),
        None => PathBuf::from(trimmed),
    }
}
