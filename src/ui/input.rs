/// Keyboard state tracker and intent gathering.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered confirm (only fires on initial press)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't
/// support it. Mouse events are collected here too and handed to the
/// pointer overlay.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent};

use crate::domain::entity::Intents;
use crate::ui::pointer::PointerState;

use crate::ui::gamepad::GamepadState;

/// After this duration without a Press/Repeat event, consider the key
/// released. Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the most
    /// recent drain_events() call. Used for edge-triggered confirm.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Mouse events collected during drain, for the pointer overlay.
    pub mouse_events: Vec<MouseEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    /// Last time any event carried the SHIFT modifier. Expires on the
    /// same timeout as held keys.
    last_shift: Option<Instant>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            mouse_events: Vec::with_capacity(8),
            honor_release: false,
            last_shift: None,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.mouse_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => {
                    self.raw_events.push(key);
                    if key.modifiers.contains(event::KeyModifiers::SHIFT)
                        && key.kind != KeyEventKind::Release
                    {
                        self.last_shift = Some(Instant::now());
                    }

                    match key.kind {
                        KeyEventKind::Release if self.honor_release => {
                            self.last_active.remove(&key.code);
                        }
                        KeyEventKind::Release => {
                            // Ignore release when enhancement not confirmed;
                            // rely on timeout-based expiry instead
                        }
                        _ => {
                            let was_held = self.is_held_inner(key.code);
                            self.last_active.insert(key.code, Instant::now());
                            if !was_held {
                                self.fresh_presses.push(key.code);
                            }
                        }
                    }
                }
                Ok(Event::Mouse(m)) => {
                    self.mouse_events.push(m);
                }
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals
        // without Release events)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        if self
            .last_shift
            .map_or(false, |t| now.duration_since(t) >= HOLD_TIMEOUT)
        {
            self.last_shift = None;
        }
    }

    /// Is this key currently held down? Used for continuous movement.
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.is_held_inner(code)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C.
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Is the sprint modifier (shift) active? Shift arrives as a modifier
    /// flag on movement keys, so it rides the same timeout as held keys.
    fn sprint_held(&self) -> bool {
        self.last_shift
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    // ── Internal ──

    fn is_held_inner(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

/// Merge every input source into one set of discrete intents.
/// The simulation is agnostic to where an intent came from.
pub fn gather_intents(kb: &InputState, ptr: &PointerState, gp: &GamepadState) -> Intents {
    Intents {
        left: kb.any_held(KEYS_LEFT) || ptr.left_held() || gp.left_held(),
        right: kb.any_held(KEYS_RIGHT) || ptr.right_held() || gp.right_held(),
        up: kb.any_held(KEYS_UP) || ptr.up_held() || gp.up_held(),
        down: kb.any_held(KEYS_DOWN) || ptr.down_held() || gp.down_held(),
        sprint: kb.sprint_held() || ptr.sprint_held() || gp.sprint_held(),
        confirm: kb.any_pressed(KEYS_CONFIRM) || ptr.confirm_pressed() || gp.confirm_pressed(),
    }
}
