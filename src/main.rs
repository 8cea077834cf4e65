/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::event::GameEvent;
use sim::step;
use sim::world::{Phase, WorldState};
use sim::level;
use ui::gamepad::GamepadState;
use ui::input::{self, InputState};
use ui::pointer::PointerState;
use ui::renderer::Renderer;
use ui::sprites::SpriteTable;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Ticks the red border stays up after the player is caught.
const HIT_FLASH_TICKS: u32 = 12;

fn main() {
    let config = GameConfig::load();

    // Parse and validate every level before touching the terminal, so a
    // bad grid prints a readable error instead of garbling raw mode.
    let levels = match level::load_all(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Level error: {e}");
            std::process::exit(1);
        }
    };

    let mut world = WorldState::new(levels, config.timing.clone(), config.rules.clone());
    let sprites = SpriteTable::load(&config.sprites);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &sprites, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Compass High: Ivan's Journey!");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sprites: &SpriteTable,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut ptr = PointerState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    // One monotonic clock for the whole run; every timer in WorldState is
    // a millisecond offset from this origin.
    let clock = Instant::now();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();
        let (cols, rows) = renderer.term_size();
        ptr.update(&kb.mouse_events, cols, rows);
        gp.update();

        if kb.ctrl_c_pressed()
            || kb.was_pressed(KeyCode::Char('q'))
            || kb.was_pressed(KeyCode::Char('Q'))
            || kb.was_pressed(KeyCode::Esc)
            || gp.cancel_pressed()
        {
            break;
        }

        let now_ms = clock.elapsed().as_millis() as u64;
        let intents = input::gather_intents(&kb, &ptr, &gp);

        // Confirm drives the state machine directly; it is edge-triggered
        // so handling it outside the tick gate cannot double-fire.
        if intents.confirm {
            step::handle_confirm(world, now_ms);
        }

        if last_tick.elapsed() >= tick_rate {
            world.anim_tick = world.anim_tick.wrapping_add(1);
            if world.flash_timer > 0 {
                world.flash_timer -= 1;
            }

            match world.phase {
                Phase::Playing => {
                    for ev in step::step(world, intents, now_ms) {
                        if let GameEvent::PlayerCaught { .. } = ev {
                            world.flash_timer = HIT_FLASH_TICKS;
                        }
                    }
                }
                Phase::Victory => world.update_confetti(),
                _ => {}
            }
            last_tick = Instant::now();
        }

        renderer.render(world, &ptr, sprites, now_ms)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
