/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timings: Timings,
    pub levels_dir: PathBuf,
}

/// Durations are in seconds; they shape the feel of a replay, not its
/// outcome — every motion commits the same cells regardless.
#[derive(Clone, Debug)]
pub struct Timings {
    pub step_seconds: f32,
    pub fall_seconds: f32,
    pub intro_seconds: f32,
    pub banner_lead_seconds: f32,
    pub banner_seconds: f32,
    pub tick_rate_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            step_seconds: default_step(),
            fall_seconds: default_fall(),
            intro_seconds: default_intro(),
            banner_lead_seconds: default_banner_lead(),
            banner_seconds: default_banner(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timings: TomlTimings,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTimings {
    #[serde(default = "default_step")]
    step_seconds: f32,
    #[serde(default = "default_fall")]
    fall_seconds: f32,
    #[serde(default = "default_intro")]
    intro_seconds: f32,
    #[serde(default = "default_banner_lead")]
    banner_lead_seconds: f32,
    #[serde(default = "default_banner")]
    banner_seconds: f32,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_step() -> f32 { 0.5 }
fn default_fall() -> f32 { 0.25 }
fn default_intro() -> f32 { 3.0 }
fn default_banner_lead() -> f32 { 0.75 }
fn default_banner() -> f32 { 5.0 }
fn default_tick_rate() -> u64 { 16 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlTimings {
    fn default() -> Self {
        TomlTimings {
            step_seconds: default_step(),
            fall_seconds: default_fall(),
            intro_seconds: default_intro(),
            banner_lead_seconds: default_banner_lead(),
            banner_seconds: default_banner(),
            tick_rate_ms: default_tick_rate(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            timings: Timings {
                step_seconds: cfg.timings.step_seconds,
                fall_seconds: cfg.timings.fall_seconds,
                intro_seconds: cfg.timings.intro_seconds,
                banner_lead_seconds: cfg.timings.banner_lead_seconds,
                banner_seconds: cfg.timings.banner_seconds,
                tick_rate_ms: cfg.timings.tick_rate_ms,
            },
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data is found relative to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
