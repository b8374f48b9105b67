//! Assets discovery and the optional `assets/booth.json`.
//!
//! The config is lenient and forward-compatible: a missing file means
//! defaults, a malformed file logs a warning and falls back to defaults, and
//! unknown fields are ignored. Nothing in here is required for the demos to
//! run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::geometry::DrawMode;
use crate::logw;

pub const ASSETS_ENV: &str = "SHADERBOOTH_ASSETS";

/// A validated root directory containing runtime assets (JSON + shaders).
#[derive(Debug, Clone)]
pub struct AssetsRoot {
    path: PathBuf,
}

impl AssetsRoot {
    /// Locate the `assets/` directory.
    ///
    /// Resolution order:
    /// 1) `SHADERBOOTH_ASSETS` env var (if set)
    /// 2) Search upward from `start_dir` for a folder named `assets`
    pub fn discover(start_dir: &Path) -> Option<Self> {
        if let Ok(p) = std::env::var(ASSETS_ENV) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Some(Self { path: pb });
            }
        }

        let mut cur = start_dir.to_path_buf();
        loop {
            let cand = cur.join("assets");
            if cand.exists() {
                return Some(Self { path: cand });
            }
            if !cur.pop() {
                break;
            }
        }
        None
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.path.join(rel)
    }

    /// Resolve a config-provided path relative to the assets directory unless
    /// it is already absolute.
    pub fn resolve(&self, s: &str) -> PathBuf {
        let p = PathBuf::from(s);
        if p.is_absolute() {
            p
        } else {
            self.path.join(p)
        }
    }
}

/// Typed view of `assets/booth.json`. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct BoothConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Initial vertex shader, relative to assets/ unless absolute.
    #[serde(default = "default_vert")]
    pub vert: String,

    /// Initial fragment shader for the no-input demo.
    #[serde(default = "default_frag")]
    pub frag: String,

    /// Initial fragment shader for the audio-input demo.
    #[serde(default = "default_audio_frag")]
    pub audio_frag: String,

    #[serde(default)]
    pub mode: DrawMode,

    /// Show the info line (mode/paths/error/fps) in the window title.
    #[serde(default = "default_true")]
    pub overlay: bool,
}

fn default_version() -> u32 {
    1
}

fn default_vert() -> String {
    "shaders/default.vert".into()
}

fn default_frag() -> String {
    "shaders/default.frag".into()
}

fn default_audio_frag() -> String {
    "shaders/audio.frag".into()
}

fn default_true() -> bool {
    true
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            vert: default_vert(),
            frag: default_frag(),
            audio_frag: default_audio_frag(),
            mode: DrawMode::default(),
            overlay: true,
        }
    }
}

/// Load `booth.json`, falling back to defaults when missing or malformed.
pub fn load_booth_config(path: &Path) -> BoothConfig {
    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return BoothConfig::default(),
    };

    match serde_json::from_str::<BoothConfig>(&data) {
        Ok(cfg) => cfg,
        Err(e) => {
            logw!("config", "failed to parse {} ({e}); using defaults", path.display());
            BoothConfig::default()
        }
    }
}

/// Sorted list of shader sources with the given extension in `dir`.
pub fn list_sources(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some(ext))
            .collect(),
        Err(_) => Vec::new(),
    };
    out.sort();
    out
}

/// The next source after `current` in sorted order, wrapping around.
/// This is the `v`/`f` "pick a new source" action: the stack has no native
/// file dialog, so picking cycles through the shader directory instead.
pub fn next_source(dir: &Path, ext: &str, current: &Path) -> Option<PathBuf> {
    let sources = list_sources(dir, ext);
    if sources.is_empty() {
        return None;
    }
    let next = match sources.iter().position(|p| p == current) {
        Some(i) => (i + 1) % sources.len(),
        None => 0,
    };
    Some(sources[next].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn missing_config_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_booth_config(&dir.path().join("booth.json"));
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.vert, "shaders/default.vert");
        assert!(cfg.overlay);
        assert_eq!(cfg.mode, DrawMode::Rect);
    }

    #[test]
    fn partial_config_keeps_defaults_and_ignores_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.json");
        fs::write(&path, r#"{ "mode": "circle", "future_knob": 42 }"#).unwrap();

        let cfg = load_booth_config(&path);
        assert_eq!(cfg.mode, DrawMode::Circle);
        assert_eq!(cfg.frag, "shaders/default.frag");
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.json");
        fs::write(&path, "{ not json").unwrap();

        let cfg = load_booth_config(&path);
        assert_eq!(cfg.frag, "shaders/default.frag");
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let root = AssetsRoot { path: PathBuf::from("/tmp/assets") };
        assert_eq!(root.resolve("shaders/a.frag"), PathBuf::from("/tmp/assets/shaders/a.frag"));
        assert_eq!(root.resolve("/abs/b.frag"), PathBuf::from("/abs/b.frag"));
    }

    #[test]
    fn next_source_cycles_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.frag", "a.frag", "c.frag", "ignored.vert"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let a = dir.path().join("a.frag");
        let b = dir.path().join("b.frag");
        let c = dir.path().join("c.frag");

        assert_eq!(next_source(dir.path(), "frag", &a), Some(b.clone()));
        assert_eq!(next_source(dir.path(), "frag", &b), Some(c.clone()));
        assert_eq!(next_source(dir.path(), "frag", &c), Some(a.clone()));
        // Unknown current file starts at the beginning.
        assert_eq!(next_source(dir.path(), "frag", Path::new("elsewhere.frag")), Some(a));
    }

    #[test]
    fn next_source_is_none_for_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_source(dir.path(), "frag", Path::new("x.frag")), None);
    }
}
