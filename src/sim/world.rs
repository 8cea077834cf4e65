/// WorldState: the complete snapshot of a running game.
///
/// Owned exclusively by the single loop thread. The state machine and the
/// per-tick resolver in `step` are the only mutators; the renderer reads.
///
/// ## Timers
///
/// Every timer is a millisecond timestamp from one monotonic clock,
/// sampled once per loop iteration and threaded through as `now_ms`:
///   - `run_start_ms`     — origin of the run clock (new run only)
///   - `last_move_ms`     — move gating (walk vs sprint delay)
///   - `state_entered_ms` — dwell gating for terminal/overlay phases

use rand::Rng;

use crate::config::{RulesConfig, TimingConfig};
use crate::domain::entity::{Collectible, Patroller, Player};
use crate::sim::level::LevelData;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    LevelComplete,
    GameOver,
    Victory,
}

/// Purely cosmetic celebration particle. Coordinates are normalized
/// 0..1 screen space so the animation is independent of terminal size.
#[derive(Clone, Copy, Debug)]
pub struct Confetti {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub palette: u8, // index into the renderer's confetti palette
    pub compass: bool,
}

pub struct WorldState {
    // ── Level set (validated at startup) ──
    pub levels: Vec<LevelData>,
    pub level: LevelData,
    pub current_level: usize,

    // ── Entities ──
    pub player: Player,
    pub player_spawn: (i32, i32),
    pub collectibles: Vec<Collectible>,
    pub patrollers: Vec<Patroller>,

    // ── Run tracking ──
    pub collected: u32,
    pub total_homework: u32,
    pub lives: u32,
    /// Cumulative across the whole run, unlike per-level lives.
    pub total_deaths: u32,
    pub phase: Phase,

    // ── Timers (ms, monotonic) ──
    pub run_start_ms: u64,
    pub last_move_ms: u64,
    pub state_entered_ms: u64,
    /// Final run time, captured exactly once at GameOver / Victory.
    pub final_time: String,

    // ── Config ──
    pub timing: TimingConfig,
    pub rules: RulesConfig,

    // ── UI ──
    pub message: String,
    pub flash_timer: u32,
    pub anim_tick: u32,
    pub confetti: Vec<Confetti>,
}

impl WorldState {
    pub fn new(levels: Vec<LevelData>, timing: TimingConfig, rules: RulesConfig) -> Self {
        let level = levels[0].clone();
        WorldState {
            levels,
            level,
            current_level: 0,
            player: Player::new(0, 0),
            player_spawn: (0, 0),
            collectibles: vec![],
            patrollers: vec![],
            collected: 0,
            total_homework: 0,
            lives: rules.lives,
            total_deaths: 0,
            phase: Phase::Title,
            run_start_ms: 0,
            last_move_ms: 0,
            state_entered_ms: 0,
            final_time: String::from("0:00"),
            timing,
            rules,
            message: String::new(),
            flash_timer: 0,
            anim_tick: 0,
            confetti: vec![],
        }
    }

    pub fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
    }

    pub fn is_final_level(&self) -> bool {
        self.current_level + 1 == self.levels.len()
    }

    /// Run clock display. Live while playing or between levels; frozen at
    /// the captured final time everywhere else.
    pub fn time_string(&self, now_ms: u64) -> String {
        match self.phase {
            Phase::Playing | Phase::LevelComplete => {
                format_time(now_ms.saturating_sub(self.run_start_ms))
            }
            _ => self.final_time.clone(),
        }
    }

    /// Freeze the run clock. Idempotent per capture site: callers only
    /// invoke this on the transition edge into GameOver / Victory.
    pub fn capture_final_time(&mut self, now_ms: u64) {
        self.final_time = format_time(now_ms.saturating_sub(self.run_start_ms));
    }

    // ── Confetti (cosmetic only, never self-terminating) ──

    pub fn spawn_confetti(&mut self) {
        let mut rng = rand::thread_rng();
        self.confetti = (0..100)
            .map(|_| Confetti {
                x: rng.gen_range(0.0..1.0),
                y: rng.gen_range(-1.0..0.0),
                speed: rng.gen_range(0.004..0.016),
                palette: rng.gen_range(0..4),
                compass: rng.gen_bool(0.3),
            })
            .collect();
    }

    pub fn update_confetti(&mut self) {
        let mut rng = rand::thread_rng();
        for p in &mut self.confetti {
            p.y += p.speed;
            if p.y > 1.0 {
                p.y = rng.gen_range(-0.15..0.0);
                p.x = rng.gen_range(0.0..1.0);
            }
        }
    }
}

pub fn format_time(elapsed_ms: u64) -> String {
    let seconds = elapsed_ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(59_999), "0:59");
        assert_eq!(format_time(61_000), "1:01");
        assert_eq!(format_time(600_000), "10:00");
    }

    #[test]
    fn confetti_recycles_at_bottom() {
        let levels = crate::sim::level::embedded_levels().unwrap();
        let mut world = WorldState::new(levels, TimingConfig::default(), RulesConfig::default());
        world.spawn_confetti();
        assert_eq!(world.confetti.len(), 100);
        for _ in 0..2000 {
            world.update_confetti();
            assert!(world.confetti.iter().all(|p| p.y <= 1.0 + 0.016));
        }
        // Animation never drains itself
        assert_eq!(world.confetti.len(), 100);
    }
}
