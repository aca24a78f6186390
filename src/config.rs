use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::warn;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "liquid-progress")]
#[command(about = "Liquid progress disc with rippling waves, drawn in the terminal", long_about = None)]
pub(crate) struct Args {
    /// FPS cap (render rate), 10..=240
    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// Initial progress, 0..=100
    #[arg(long)]
    pub(crate) progress: Option<f32>,

    /// Do not start the continuous ripple on launch
    #[arg(long, default_value_t = false)]
    pub(crate) no_autostart: bool,

    /// Sub-cell rendering mode
    #[arg(long, value_enum)]
    pub(crate) mode: Option<RenderMode>,

    /// Draw in plain white instead of RGB colour
    #[arg(long, default_value_t = false)]
    pub(crate) no_color: bool,

    /// Hide the status line
    #[arg(long, default_value_t = false)]
    pub(crate) no_hud: bool,

    /// Write tracing output to this file (filter with RUST_LOG)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,

    /// Settings file to use instead of the per-user one
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum RenderMode {
    /// 2×4 dots per cell
    Braille,
    /// 1×2 blocks per cell
    HalfBlock,
}

impl RenderMode {
    /// Pixels per terminal cell, horizontally and vertically.
    pub(crate) fn subpixels(self) -> (u32, u32) {
        match self {
            RenderMode::Braille => (2, 4),
            RenderMode::HalfBlock => (1, 2),
        }
    }

    pub(crate) fn toggled(self) -> Self {
        match self {
            RenderMode::Braille => RenderMode::HalfBlock,
            RenderMode::HalfBlock => RenderMode::Braille,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) initial_progress: f32,
    pub(crate) autostart: bool,
    pub(crate) render_mode: RenderMode,
    pub(crate) enable_color: bool,
    pub(crate) show_hud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            initial_progress: 60.0,
            autostart: true,
            render_mode: RenderMode::Braille,
            enable_color: true,
            show_hud: true,
        }
    }
}

impl Settings {
    /// Command-line flags win over whatever the settings file said.
    pub(crate) fn with_args(mut self, args: &Args) -> Self {
        if let Some(fps) = args.fps {
            self.fps_cap = fps;
        }
        if let Some(p) = args.progress {
            self.initial_progress = p;
        }
        if args.no_autostart {
            self.autostart = false;
        }
        if let Some(mode) = args.mode {
            self.render_mode = mode;
        }
        if args.no_color {
            self.enable_color = false;
        }
        if args.no_hud {
            self.show_hud = false;
        }
        self
    }

    pub(crate) fn fps(&self) -> u32 {
        self.fps_cap.clamp(10, 240)
    }
}

/// Where settings live: `--config` if given, otherwise the per-user config
/// directory. `None` when no home directory can be resolved.
pub(crate) fn settings_path(args: &Args) -> Option<PathBuf> {
    if let Some(p) = &args.config {
        return Some(p.clone());
    }
    let proj = ProjectDirs::from("com", "liquid-progress", "LiquidProgress")?;
    Some(proj.config_dir().join("settings.json"))
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Settings::default(),
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read settings file, using defaults");
            return Settings::default();
        }
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => v,
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring malformed settings file");
            Settings::default()
        }
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("could not write {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on Windows
    #[cfg(windows)]
    if to.exists() {
        fs::remove_file(to).with_context(|| format!("could not remove {}", to.display()))?;
    }
    fs::rename(from, to).with_context(|| format!("could not replace {}", to.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "liquid-progress-{}-{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&dir);
        dir.join("settings.json")
    }

    #[test]
    fn flags_override_file_values() {
        let file = Settings {
            fps_cap: 60,
            show_hud: true,
            ..Settings::default()
        };
        let args = Args::parse_from([
            "liquid-progress",
            "--progress",
            "25",
            "--mode",
            "half-block",
            "--no-hud",
        ]);
        let s = file.with_args(&args);
        assert_eq!(s.fps_cap, 60);
        assert_eq!(s.initial_progress, 25.0);
        assert_eq!(s.render_mode, RenderMode::HalfBlock);
        assert!(!s.show_hud);
        assert!(s.autostart);
    }

    #[test]
    fn fps_is_clamped() {
        let s = Settings {
            fps_cap: 1000,
            ..Settings::default()
        };
        assert_eq!(s.fps(), 240);
        assert_eq!(Settings { fps_cap: 0, ..s }.fps(), 10);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let s: Settings = serde_json::from_str(r#"{ "render_mode": "half-block" }"#).unwrap();
        assert_eq!(s.render_mode, RenderMode::HalfBlock);
        assert_eq!(s.fps_cap, Settings::default().fps_cap);
    }

    #[test]
    fn missing_or_broken_file_falls_back() {
        let path = scratch("broken");
        assert_eq!(load_settings(&path), Settings::default());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn unreadable_file_falls_back() {
        let path = scratch("unreadable");
        // a directory where the file should be
        fs::create_dir_all(&path).unwrap();
        assert_eq!(load_settings(&path), Settings::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());

        let path = scratch("not-utf8");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, [0xff, 0xfe, 0x7b]).unwrap();
        assert_eq!(load_settings(&path), Settings::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn save_replaces_existing_file_in_place() {
        let path = scratch("replace");
        save_settings_atomic(&path, &Settings::default()).unwrap();
        let changed = Settings {
            show_hud: false,
            ..Settings::default()
        };
        save_settings_atomic(&path, &changed).unwrap();
        assert_eq!(load_settings(&path), changed);
        assert!(!path.with_extension("json.tmp").exists());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn save_then_load() {
        let path = scratch("roundtrip");
        let s = Settings {
            render_mode: RenderMode::HalfBlock,
            enable_color: false,
            ..Settings::default()
        };
        save_settings_atomic(&path, &s).unwrap();
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path), s);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn explicit_config_path_wins() {
        let args = Args::parse_from(["liquid-progress", "--config", "/tmp/x.json"]);
        assert_eq!(settings_path(&args), Some(PathBuf::from("/tmp/x.json")));
    }
}
