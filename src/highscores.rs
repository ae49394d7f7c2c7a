//! Persist the high score to disk (XDG config or ~/.config/skymatch).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const FILENAME: &str = "skymatch_high";

/// Path of the high score file (config dir / skymatch / skymatch_high).
pub fn config_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join("skymatch").join(FILENAME)
}

/// Stored high score; 0 when the file is missing or unparsable.
pub fn load_high_score() -> u32 {
    load_from(&config_path())
}

pub fn save_high_score(score: u32) -> Result<()> {
    save_to(&config_path(), score)
}

fn load_from(path: &Path) -> u32 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Creates the config directory if needed.
fn save_to(path: &Path, score: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", score))
        .with_context(|| format!("writing {}", path.display()))
}
