/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD, or the
/// usual data directories). Falls back to sensible defaults if the file
/// is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub sprites: SpriteGlyphs,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub walk_delay_ms: u64,
    pub sprint_delay_ms: u64,
    /// Minimum display time of an end/overlay screen before confirm works.
    pub state_dwell_ms: u64,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub lives: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub sprint: Vec<String>,
}

/// Optional glyph overrides for the sprite table. A missing entry means
/// "no image" and the renderer falls back to a solid-color cell.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SpriteGlyphs {
    pub player: Option<String>,
    pub wall: Option<String>,
    pub floor: Option<String>,
    pub homework: Option<String>,
    pub enemy: Option<String>,
    pub door: Option<String>,
    pub desk: Option<String>,
    pub heart: Option<String>,
    pub compass: Option<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    sprites: SpriteGlyphs,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_walk_delay")]
    walk_delay_ms: u64,
    #[serde(default = "default_sprint_delay")]
    sprint_delay_ms: u64,
    #[serde(default = "default_state_dwell")]
    state_dwell_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_lives")]
    lives: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_sprint")]
    sprint: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 } // ~60 ticks/s
fn default_walk_delay() -> u64 { 150 }
fn default_sprint_delay() -> u64 { 70 }
fn default_state_dwell() -> u64 { 1000 }
fn default_lives() -> u32 { 3 }

fn default_confirm() -> Vec<String> { vec!["South".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["East".into(), "Select".into()] }
fn default_sprint() -> Vec<String> { vec!["West".into(), "LeftTrigger".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            walk_delay_ms: default_walk_delay(),
            sprint_delay_ms: default_sprint_delay(),
            state_dwell_ms: default_state_dwell(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules { lives: default_lives() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            sprint: default_sprint(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir() }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_rate_ms: default_tick_rate(),
            walk_delay_ms: default_walk_delay(),
            sprint_delay_ms: default_sprint_delay(),
            state_dwell_ms: default_state_dwell(),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig { lives: default_lives() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data dir.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
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
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms,
                walk_delay_ms: toml_cfg.timing.walk_delay_ms,
                sprint_delay_ms: toml_cfg.timing.sprint_delay_ms,
                state_dwell_ms: toml_cfg.timing.state_dwell_ms,
            },
            rules: RulesConfig { lives: toml_cfg.rules.lives },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                sprint: toml_cfg.gamepad.sprint,
            },
            sprites: toml_cfg.sprites,
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data dirs (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (resolve symlinks so a
    //    /usr/bin shim still finds data next to the real binary)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/compass-high)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/compass-high");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/compass-high");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.timing.walk_delay_ms, 150);
        assert_eq!(cfg.timing.sprint_delay_ms, 70);
        assert_eq!(cfg.timing.state_dwell_ms, 1000);
        assert_eq!(cfg.rules.lives, 3);
        assert!(cfg.sprites.player.is_none());
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let cfg: TomlConfig = toml::from_str(
            "[timing]\nwalk_delay_ms = 200\n\n[sprites]\nplayer = \"@\"\n",
        )
        .unwrap();
        assert_eq!(cfg.timing.walk_delay_ms, 200);
        assert_eq!(cfg.timing.sprint_delay_ms, 70);
        assert_eq!(cfg.sprites.player.as_deref(), Some("@"));
        assert!(cfg.sprites.enemy.is_none());
    }
}
