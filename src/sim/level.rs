/// Level loading and validation.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1 (optional): `# Level Name`
///   Lines: map rows
///
/// ## Tile legend:
///   'W' = Wall            'D' = Desk (blocks like a wall)
///   'P' = Player spawn    'O' = Goal door
///   'H' = Homework        'E' = Vertical patroller
///   'R' = Horizontal patroller
///   '.' = Empty floor
///
/// All levels are parsed and validated once at startup, before the
/// terminal enters raw mode. A grid with zero or multiple player spawns,
/// ragged rows, or unknown tile codes is a fatal configuration error.

use std::path::Path;

use rand::seq::SliceRandom;
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::entity::{Axis, Collectible, Patroller, Player};
use crate::domain::geom::{Rect, TILE_SIZE};
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, WorldState};

/// Speeds a patroller may spawn with, in pixels per tick.
pub const PATROL_SPEEDS: [f32; 4] = [0.8, 1.0, 1.2, 1.5];

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {name:?}: no player spawn marker 'P'")]
    NoPlayerSpawn { name: String },
    #[error("level {name:?}: more than one player spawn marker 'P'")]
    MultiplePlayerSpawns { name: String },
    #[error("level {name:?}: row {row} is {len} tiles wide, expected {expected}")]
    RaggedRow { name: String, row: usize, len: usize, expected: usize },
    #[error("level {name:?}: unknown tile code {code:?} at column {col}, row {row}")]
    UnknownTile { name: String, code: char, col: usize, row: usize },
    #[error("level {name:?}: empty grid")]
    EmptyGrid { name: String },
    #[error("could not read {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

/// Where a patroller starts and which axis it walks.
#[derive(Clone, Copy, Debug)]
pub struct PatrolSpawn {
    pub x: i32,
    pub y: i32,
    pub axis: Axis,
}

/// Static per-level data, parsed once at startup. Entity sets are
/// instantiated from it on every (re)entry into the level.
#[derive(Clone, Debug)]
pub struct LevelData {
    pub name: String,
    pub cols: usize,
    pub rows: usize,
    pub tiles: Vec<Vec<Tile>>,
    /// Union of wall and desk rects — the blocking geometry.
    pub blocking: Vec<Rect>,
    pub goals: Vec<Rect>,
    pub collectible_spawns: Vec<Collectible>,
    pub patrol_spawns: Vec<PatrolSpawn>,
    pub player_spawn: (i32, i32),
}

// ══════════════════════════════════════════════════════════════
// Parsing & validation
// ══════════════════════════════════════════════════════════════

/// Parse a character grid into level data, validating as it goes.
pub fn parse_level(name: &str, rows: &[&str]) -> Result<LevelData, LevelError> {
    if rows.is_empty() {
        return Err(LevelError::EmptyGrid { name: name.to_string() });
    }
    let cols = rows[0].chars().count();
    if cols == 0 {
        return Err(LevelError::EmptyGrid { name: name.to_string() });
    }

    let mut tiles = vec![vec![Tile::Empty; cols]; rows.len()];
    let mut blocking = vec![];
    let mut goals = vec![];
    let mut collectible_spawns = vec![];
    let mut patrol_spawns = vec![];
    let mut player_spawn: Option<(i32, i32)> = None;

    for (r, row) in rows.iter().enumerate() {
        let len = row.chars().count();
        if len != cols {
            return Err(LevelError::RaggedRow {
                name: name.to_string(),
                row: r,
                len,
                expected: cols,
            });
        }
        for (c, ch) in row.chars().enumerate() {
            let x = c as i32 * TILE_SIZE;
            let y = r as i32 * TILE_SIZE;
            match ch {
                'W' => {
                    tiles[r][c] = Tile::Wall;
                    blocking.push(Rect::tile(x, y));
                }
                'D' => {
                    tiles[r][c] = Tile::Desk;
                    blocking.push(Rect::tile(x, y));
                }
                'O' => {
                    tiles[r][c] = Tile::Goal;
                    goals.push(Rect::tile(x, y));
                }
                'P' => {
                    if player_spawn.is_some() {
                        return Err(LevelError::MultiplePlayerSpawns {
                            name: name.to_string(),
                        });
                    }
                    player_spawn = Some((x, y));
                }
                'H' => collectible_spawns.push(Collectible::in_tile(x, y)),
                'E' => patrol_spawns.push(PatrolSpawn { x, y, axis: Axis::Vertical }),
                'R' => patrol_spawns.push(PatrolSpawn { x, y, axis: Axis::Horizontal }),
                '.' => {}
                other => {
                    return Err(LevelError::UnknownTile {
                        name: name.to_string(),
                        code: other,
                        col: c,
                        row: r,
                    });
                }
            }
        }
    }

    let player_spawn = player_spawn
        .ok_or_else(|| LevelError::NoPlayerSpawn { name: name.to_string() })?;

    Ok(LevelData {
        name: name.to_string(),
        cols,
        rows: rows.len(),
        tiles,
        blocking,
        goals,
        collectible_spawns,
        patrol_spawns,
        player_spawn,
    })
}

/// Parse a `.txt` level file: optional `# Name` first line, then grid rows.
/// Trailing blank lines are ignored.
fn parse_level_file(content: &str, fallback_name: &str) -> Result<LevelData, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<&str> = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && rows.is_empty() {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line);
        }
    }
    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }
    if name.is_empty() {
        name = fallback_name.to_string();
    }

    parse_level(&name, &rows)
}

// ══════════════════════════════════════════════════════════════
// Level set loading
// ══════════════════════════════════════════════════════════════

/// Load and validate the full level set: `levels_dir` if it contains
/// `.txt` files, otherwise the embedded schoolhouse levels.
pub fn load_all(config: &GameConfig) -> Result<Vec<LevelData>, LevelError> {
    let dir_levels = load_from_directory(&config.levels_dir)?;
    if !dir_levels.is_empty() {
        return Ok(dir_levels);
    }
    embedded_levels()
}

fn load_from_directory(dir: &Path) -> Result<Vec<LevelData>, LevelError> {
    let mut files: Vec<_> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |e| e == "txt"))
            .collect(),
        Err(_) => return Ok(vec![]), // no directory → fall back to embedded
    };
    files.sort();

    let mut levels = vec![];
    for path in files {
        let content = std::fs::read_to_string(&path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let stem = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        levels.push(parse_level_file(&content, &stem)?);
    }
    Ok(levels)
}

// ══════════════════════════════════════════════════════════════
// Entering a level
// ══════════════════════════════════════════════════════════════

/// Instantiate level `idx` into the world: fresh entity sets, lives back
/// to the starting count, collected counter cleared. Cumulative deaths
/// and the run clock are untouched (they reset only on a new run).
pub fn enter_level(world: &mut WorldState, idx: usize) {
    let data = world.levels[idx].clone();
    let mut rng = rand::thread_rng();

    world.current_level = idx;
    world.lives = world.rules.lives;
    world.collected = 0;
    world.total_homework = data.collectible_spawns.len() as u32;
    world.player = Player::new(data.player_spawn.0, data.player_spawn.1);
    world.player_spawn = data.player_spawn;
    world.collectibles = data.collectible_spawns.clone();
    world.patrollers = data
        .patrol_spawns
        .iter()
        .map(|s| {
            let speed = *PATROL_SPEEDS.choose(&mut rng).unwrap_or(&1.0);
            Patroller::new(s.x, s.y, s.axis, speed)
        })
        .collect();
    world.level = data;
    world.phase = Phase::Playing;
    world.set_message(&format!("Level {}: Start!", idx + 1));
}

// ══════════════════════════════════════════════════════════════
// Embedded levels (the schoolhouse trio)
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Result<Vec<LevelData>, LevelError> {
    Ok(vec![
        parse_level("The Hallway", &[
            "WWWWWWWWWWWWWWWWWWWW",
            "W.H.............R..W",
            "W.P...WWWW...O.....W",
            "W.....W..W.........W",
            "W..H..W..W...E.....W",
            "WW.WWWW..WWWWWWWW..W",
            "W..........H.......W",
            "W...R......WW...H..W",
            "W..........WW......W",
            "W.H...E............W",
            "WWWWWWWWWWWWWWWWWWWW",
        ])?,
        parse_level("The Classrooms", &[
            "WWWWWWWWWWWWWWWWWWWW",
            "W.....W.......H....W",
            "W.D.D.W.DD.DD.DDDD.W",
            "W.D.D.W.D...D.D..D.W",
            "W.DHD...D.H.D.D..D.W",
            "WW.W.WWWW.W.WWWW.WWW",
            "W..P......W........W",
            "W.WW.WWWW.WWWWWW.W.W",
            "W.W...E..........W.W",
            "W.H.......R......O.W",
            "WWWWWWWWWWWWWWWWWWWW",
        ])?,
        parse_level("The Cafeteria", &[
            "WWWWWWWWWWWWWWWWWWWW",
            "W.O......E.........W",
            "W...DD.......DD....W",
            "W...DD...H...DD....W",
            "W..................W",
            "W.R......H.......R.W",
            "W..................W",
            "W...DD.......DD....W",
            "W...DD...H...DD....W",
            "W.P......E.........W",
            "WWWWWWWWWWWWWWWWWWWW",
        ])?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_level() {
        let data = parse_level("t", &[
            "WWWW",
            "WP.W",
            "WHOW",
            "WWWW",
        ]).unwrap();
        assert_eq!(data.cols, 4);
        assert_eq!(data.rows, 4);
        assert_eq!(data.player_spawn, (TILE_SIZE, TILE_SIZE));
        assert_eq!(data.collectible_spawns.len(), 1);
        assert_eq!(data.goals.len(), 1);
        assert_eq!(data.blocking.len(), 12);
    }

    #[test]
    fn desk_joins_blocking_geometry() {
        let data = parse_level("t", &[
            "WWWW",
            "WPDW",
            "WWWW",
        ]).unwrap();
        // 10 walls + 1 desk
        assert_eq!(data.blocking.len(), 11);
        assert_eq!(data.tiles[1][2], Tile::Desk);
    }

    #[test]
    fn missing_player_spawn_is_fatal() {
        let err = parse_level("t", &["WWW", "W.W", "WWW"]).unwrap_err();
        assert!(matches!(err, LevelError::NoPlayerSpawn { .. }));
    }

    #[test]
    fn duplicate_player_spawn_is_fatal() {
        let err = parse_level("t", &["WWWW", "WPPW", "WWWW"]).unwrap_err();
        assert!(matches!(err, LevelError::MultiplePlayerSpawns { .. }));
    }

    #[test]
    fn ragged_rows_are_fatal() {
        let err = parse_level("t", &["WWWW", "WP.W", "WWW"]).unwrap_err();
        assert!(matches!(err, LevelError::RaggedRow { row: 2, len: 3, expected: 4, .. }));
    }

    #[test]
    fn unknown_tile_is_fatal() {
        let err = parse_level("t", &["WWW", "WPX", "WWW"]).unwrap_err();
        assert!(matches!(err, LevelError::UnknownTile { code: 'X', .. }));
    }

    #[test]
    fn patrol_markers_carry_axis() {
        let data = parse_level("t", &[
            "WWWWW",
            "WP.EW",
            "W.R.W",
            "WWWWW",
        ]).unwrap();
        assert_eq!(data.patrol_spawns.len(), 2);
        assert_eq!(data.patrol_spawns[0].axis, Axis::Vertical);
        assert_eq!(data.patrol_spawns[1].axis, Axis::Horizontal);
    }

    #[test]
    fn embedded_levels_validate() {
        let levels = embedded_levels().unwrap();
        assert_eq!(levels.len(), 3);
        for lvl in &levels {
            assert!(!lvl.collectible_spawns.is_empty());
            assert!(!lvl.goals.is_empty());
            assert!(!lvl.patrol_spawns.is_empty());
        }
    }

    #[test]
    fn level_file_name_line_parsed() {
        let data = parse_level_file("# My Room\nWWWW\nWP.W\nWWWW\n\n", "fallback").unwrap();
        assert_eq!(data.name, "My Room");
    }
}
