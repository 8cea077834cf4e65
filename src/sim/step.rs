/// The step function: advances the world by one tick.
///
/// Processing order (fixed, for determinism):
///   1. Player movement (time-gated whole-tile jump)
///   2. Patroller movement
///   3. Collectible pickups
///   4. Enemy contact (lives / respawn / game over)
///   5. Goal contact (locked / level complete / victory)
///
/// All time gating uses the single `now_ms` sample taken by the loop, so
/// every check inside one tick sees the same clock.

use crate::domain::entity::Intents;
use crate::domain::geom::Rect;
use crate::domain::motion;
use crate::sim::event::GameEvent;
use crate::sim::level;
use crate::sim::world::{Phase, WorldState};

/// Enemy boxes are shrunk by this many pixels (total, centered) before
/// the contact test, giving the player a slight overlap tolerance.
pub const CONTACT_INSET: i32 = 10;

pub fn step(world: &mut WorldState, intents: Intents, now_ms: u64) -> Vec<GameEvent> {
    if world.phase != Phase::Playing {
        return vec![];
    }
    let mut events = vec![];

    resolve_player_move(world, intents, now_ms);
    resolve_patrollers(world);
    resolve_pickups(world, &mut events);
    if resolve_enemy_contact(world, now_ms, &mut events) {
        // Lives exhausted mid-tick; the goal check is moot.
        return events;
    }
    resolve_goal(world, now_ms, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

/// A move command is accepted only after the walk (or sprint) delay has
/// elapsed since the last accepted one; each accepted move is a full
/// one-tile jump on a single axis.
fn resolve_player_move(world: &mut WorldState, intents: Intents, now_ms: u64) {
    let delay = if intents.sprint {
        world.timing.sprint_delay_ms
    } else {
        world.timing.walk_delay_ms
    };
    if now_ms.saturating_sub(world.last_move_ms) <= delay {
        return;
    }
    if let Some(dir) = intents.direction() {
        let (dx, dy) = dir.delta();
        motion::move_player(&mut world.player.rect, dx, dy, &world.level.blocking);
        // The command consumes the gate even when the move was blocked.
        world.last_move_ms = now_ms;
    }
}

fn resolve_patrollers(world: &mut WorldState) {
    for p in &mut world.patrollers {
        motion::update_patroller(p, &world.level.blocking);
    }
}

// ══════════════════════════════════════════════════════════════
// Interactions
// ══════════════════════════════════════════════════════════════

fn resolve_pickups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player = world.player.rect;
    let mut picked = 0u32;
    world.collectibles.retain(|c| {
        let hit = player.intersects(&c.rect);
        if hit {
            picked += 1;
        }
        !hit
    });
    if picked > 0 {
        world.collected += picked;
        world.set_message(&format!(
            "Collected: {}/{}",
            world.collected, world.total_homework
        ));
        events.push(GameEvent::CollectiblePicked {
            collected: world.collected,
            total: world.total_homework,
        });
    }
}

/// Returns true when the run ended (lives exhausted).
///
/// Contacts are NOT deduplicated within a tick: each patroller is tested
/// against the player's current box, so a respawn mid-scan is visible to
/// the patrollers checked after it.
fn resolve_enemy_contact(
    world: &mut WorldState,
    now_ms: u64,
    events: &mut Vec<GameEvent>,
) -> bool {
    for i in 0..world.patrollers.len() {
        let inset = world.patrollers[i].rect.shrink(CONTACT_INSET);
        if !world.player.rect.intersects(&inset) {
            continue;
        }
        world.lives = world.lives.saturating_sub(1);
        world.total_deaths += 1;
        if world.lives > 0 {
            world.player.rect = Rect::tile(world.player_spawn.0, world.player_spawn.1);
            world.set_message(&format!("OUCH! Lives left: {}", world.lives));
            events.push(GameEvent::PlayerCaught { lives_left: world.lives });
        } else {
            world.capture_final_time(now_ms);
            world.phase = Phase::GameOver;
            world.state_entered_ms = now_ms;
            events.push(GameEvent::GameOver);
            return true;
        }
    }
    false
}

fn resolve_goal(world: &mut WorldState, now_ms: u64, events: &mut Vec<GameEvent>) {
    for gi in 0..world.level.goals.len() {
        let goal = world.level.goals[gi];
        if !world.player.rect.intersects(&goal) {
            continue;
        }
        if world.collected < world.total_homework {
            let missing = world.total_homework - world.collected;
            world.set_message(&format!("Locked! Need {} more.", missing));
            events.push(GameEvent::GoalLocked { missing });
        } else if world.is_final_level() {
            world.capture_final_time(now_ms);
            world.phase = Phase::Victory;
            world.state_entered_ms = now_ms;
            world.spawn_confetti();
            events.push(GameEvent::Victory);
            return;
        } else {
            world.phase = Phase::LevelComplete;
            world.state_entered_ms = now_ms;
            events.push(GameEvent::LevelCleared);
            return;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Phase transitions driven by the confirm intent
// ══════════════════════════════════════════════════════════════

/// Apply a confirm press to the state machine. Transitions out of
/// GameOver / LevelComplete / Victory are gated by a minimum dwell time
/// after entering the state, so residual input cannot skip a screen.
pub fn handle_confirm(world: &mut WorldState, now_ms: u64) {
    match world.phase {
        Phase::Title => {
            // A completely new run: deaths and the run clock reset here,
            // and only here.
            world.total_deaths = 0;
            world.run_start_ms = now_ms;
            world.last_move_ms = now_ms;
            level::enter_level(world, 0);
        }
        Phase::LevelComplete => {
            if now_ms.saturating_sub(world.state_entered_ms) > world.timing.state_dwell_ms {
                let next = world.current_level + 1;
                level::enter_level(world, next);
            }
        }
        Phase::GameOver | Phase::Victory => {
            if now_ms.saturating_sub(world.state_entered_ms) > world.timing.state_dwell_ms {
                world.phase = Phase::Title;
                world.anim_tick = 0;
                world.confetti.clear();
            }
        }
        Phase::Playing => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RulesConfig, TimingConfig};
    use crate::domain::entity::{Axis, Patroller};
    use crate::domain::geom::TILE_SIZE;
    use crate::sim::level::parse_level;

    fn world_from(maps: &[&[&str]]) -> WorldState {
        let levels = maps
            .iter()
            .enumerate()
            .map(|(i, rows)| parse_level(&format!("t{i}"), rows).unwrap())
            .collect();
        let mut w = WorldState::new(levels, TimingConfig::default(), RulesConfig::default());
        handle_confirm(&mut w, 0); // Title → Playing, run starts at t=0
        w
    }

    fn go(dir: &str) -> Intents {
        Intents {
            left: dir == "left",
            right: dir == "right",
            up: dir == "up",
            down: dir == "down",
            ..Intents::default()
        }
    }

    /// Pin the lone patroller in place so contact geometry is static.
    fn park_patroller(w: &mut WorldState, col: i32, row: i32, axis: Axis) {
        w.patrollers = vec![{
            let mut p = Patroller::new(col * TILE_SIZE, row * TILE_SIZE, axis, 0.0);
            p.sync_rect();
            p
        }];
    }

    // ── Move gating ──

    #[test]
    fn second_move_within_walk_delay_rejected() {
        let mut w = world_from(&[&[
            "WWWWWW",
            "WP...W",
            "WWWWWW",
        ]]);
        let x0 = w.player.rect.x;
        step(&mut w, go("right"), 200);
        assert_eq!(w.player.rect.x, x0 + TILE_SIZE);
        step(&mut w, go("right"), 300); // 100 ms later < 150 ms walk delay
        assert_eq!(w.player.rect.x, x0 + TILE_SIZE);
        step(&mut w, go("right"), 360); // 160 ms later, accepted
        assert_eq!(w.player.rect.x, x0 + 2 * TILE_SIZE);
    }

    #[test]
    fn sprint_shortens_the_gate() {
        let mut w = world_from(&[&[
            "WWWWWW",
            "WP...W",
            "WWWWWW",
        ]]);
        let x0 = w.player.rect.x;
        let sprint = Intents { right: true, sprint: true, ..Intents::default() };
        step(&mut w, sprint, 200);
        step(&mut w, sprint, 280); // 80 ms later > 70 ms sprint delay
        assert_eq!(w.player.rect.x, x0 + 2 * TILE_SIZE);
    }

    #[test]
    fn blocked_move_consumes_the_gate() {
        let mut w = world_from(&[&[
            "WWW",
            "WPW",
            "WWW",
        ]]);
        let before = w.player.rect;
        step(&mut w, go("right"), 200);
        assert_eq!(w.player.rect, before);
        assert_eq!(w.last_move_ms, 200);
    }

    #[test]
    fn horizontal_wins_over_vertical() {
        let mut w = world_from(&[&[
            "WWWW",
            "WP.W",
            "W..W",
            "WWWW",
        ]]);
        let start = w.player.rect;
        let both = Intents { left: true, right: false, down: true, ..Intents::default() };
        // left is blocked by the wall, down is open — but only the first
        // non-zero direction (left) is applied this tick
        step(&mut w, both, 200);
        assert_eq!(w.player.rect, start);
    }

    // ── Pickups ──

    #[test]
    fn pickup_removes_and_counts_once() {
        let mut w = world_from(&[&[
            "WWWW",
            "WPHW",
            "WWWW",
        ]]);
        assert_eq!(w.total_homework, 1);
        let ev = step(&mut w, go("right"), 200);
        assert_eq!(w.collected, 1);
        assert!(w.collectibles.is_empty());
        assert!(ev.contains(&GameEvent::CollectiblePicked { collected: 1, total: 1 }));
        // Standing on the same spot again has no further effect
        let ev = step(&mut w, Intents::default(), 400);
        assert_eq!(w.collected, 1);
        assert!(!ev.iter().any(|e| matches!(e, GameEvent::CollectiblePicked { .. })));
        assert!(w.collected <= w.total_homework);
    }

    // ── Enemy contact ──

    #[test]
    fn contact_costs_a_life_and_respawns() {
        let mut w = world_from(&[&[
            "WWWWW",
            "WP.EW",
            "WWWWW",
        ]]);
        park_patroller(&mut w, 2, 1, Axis::Vertical);
        w.player.rect = Rect::tile(2 * TILE_SIZE, TILE_SIZE); // walk into it
        let ev = step(&mut w, Intents::default(), 200);
        assert_eq!(w.lives, 2);
        assert_eq!(w.total_deaths, 1);
        assert_eq!(w.player.rect, Rect::tile(w.player_spawn.0, w.player_spawn.1));
        assert!(ev.contains(&GameEvent::PlayerCaught { lives_left: 2 }));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn shallow_overlap_is_tolerated() {
        let mut w = world_from(&[&[
            "WWWWW",
            "WP.EW",
            "WWWWW",
        ]]);
        park_patroller(&mut w, 2, 1, Axis::Vertical);
        // 4 px of raw overlap — inside the 10 px contact inset
        w.player.rect = Rect::tile(2 * TILE_SIZE - TILE_SIZE + 4, TILE_SIZE);
        step(&mut w, Intents::default(), 200);
        assert_eq!(w.lives, 3);
    }

    #[test]
    fn lives_exhaustion_ends_the_run() {
        let mut w = world_from(&[&[
            "WWWWW",
            "WPE.W",
            "WWWWW",
        ]]);
        // Patroller parked on the spawn tile: every tick is a contact.
        park_patroller(&mut w, 1, 1, Axis::Vertical);
        step(&mut w, Intents::default(), 100);
        assert_eq!(w.lives, 2);
        step(&mut w, Intents::default(), 200);
        assert_eq!(w.lives, 1);
        let ev = step(&mut w, Intents::default(), 65_000);
        assert_eq!(w.lives, 0);
        assert_eq!(w.phase, Phase::GameOver);
        assert!(ev.contains(&GameEvent::GameOver));
        assert_eq!(w.final_time, "1:05");
        assert_eq!(w.total_deaths, 3);
        // Stays GameOver until a confirm lands after the dwell delay
        step(&mut w, go("right"), 65_100);
        assert_eq!(w.phase, Phase::GameOver);
        handle_confirm(&mut w, 65_500); // within dwell — ignored
        assert_eq!(w.phase, Phase::GameOver);
        handle_confirm(&mut w, 66_100); // past dwell
        assert_eq!(w.phase, Phase::Title);
    }

    // ── Goal ──

    #[test]
    fn goal_locked_until_quota_met() {
        let mut w = world_from(&[&[
            "WWWWWW",
            "WPHHOW",
            "WWWWWW",
        ]]);
        assert_eq!(w.total_homework, 2);
        step(&mut w, go("right"), 200); // picks first
        assert_eq!(w.collected, 1);
        // Skip the second collectible, jump straight onto the door
        w.player.rect = Rect::tile(4 * TILE_SIZE, TILE_SIZE);
        let ev = step(&mut w, Intents::default(), 400);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.collected, 1);
        assert!(ev.contains(&GameEvent::GoalLocked { missing: 1 }));
        assert_eq!(w.message, "Locked! Need 1 more.");
    }

    #[test]
    fn quota_met_advances_to_next_level() {
        let map1: &[&str] = &[
            "WWWWW",
            "WPHOW",
            "WWWWW",
        ];
        let map2: &[&str] = &[
            "WWWWW",
            "WP.OW",
            "WWWWW",
        ];
        let mut w = world_from(&[map1, map2]);
        step(&mut w, go("right"), 200); // pick up
        w.player.rect = Rect::tile(3 * TILE_SIZE, TILE_SIZE);
        let ev = step(&mut w, Intents::default(), 400);
        assert_eq!(w.phase, Phase::LevelComplete);
        assert!(ev.contains(&GameEvent::LevelCleared));
        handle_confirm(&mut w, 1500); // 1100 ms dwell elapsed
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.current_level, 1);
        assert_eq!(w.collected, 0);
        assert_eq!(w.lives, 3);
    }

    #[test]
    fn final_level_goal_is_victory_with_frozen_time() {
        let mut w = world_from(&[&[
            "WWWWW",
            "WP.OW",
            "WWWWW",
        ]]);
        w.player.rect = Rect::tile(3 * TILE_SIZE, TILE_SIZE);
        let ev = step(&mut w, Intents::default(), 30_000);
        assert_eq!(w.phase, Phase::Victory);
        assert!(ev.contains(&GameEvent::Victory));
        assert_eq!(w.final_time, "0:30");
        assert!(!w.confetti.is_empty());
        // The displayed time no longer advances with the clock
        assert_eq!(w.time_string(90_000), "0:30");
        // Confirm past the dwell dismisses to the title screen
        handle_confirm(&mut w, 31_100);
        assert_eq!(w.phase, Phase::Title);
        assert!(w.confetti.is_empty());
    }

    #[test]
    fn deaths_persist_across_levels_but_reset_per_run() {
        let map1: &[&str] = &[
            "WWWWW",
            "WPOEW",
            "WWWWW",
        ];
        let mut w = world_from(&[map1, map1]);
        park_patroller(&mut w, 1, 1, Axis::Vertical); // on the spawn
        step(&mut w, Intents::default(), 100);
        assert_eq!(w.total_deaths, 1);
        w.patrollers.clear();
        w.player.rect = Rect::tile(2 * TILE_SIZE, TILE_SIZE);
        step(&mut w, Intents::default(), 200);
        assert_eq!(w.phase, Phase::LevelComplete);
        handle_confirm(&mut w, 1500);
        // Lives reset on level entry, deaths do not
        assert_eq!(w.lives, 3);
        assert_eq!(w.total_deaths, 1);
        // A brand-new run clears the counter
        w.phase = Phase::Title;
        handle_confirm(&mut w, 2000);
        assert_eq!(w.total_deaths, 0);
    }
}
