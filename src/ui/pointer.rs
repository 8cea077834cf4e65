/// On-screen touch control overlay.
///
/// A d-pad plus sprint/confirm buttons drawn in the bottom-right corner,
/// driven by terminal mouse events. A button counts as held while the
/// left mouse button is down over it (press or drag), mirroring a finger
/// resting on a touch control. Terminals without mouse reporting simply
/// never deliver events and the game stays keyboard-only.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OverlayButton {
    Up,
    Down,
    Left,
    Right,
    Sprint,
    Confirm,
}

#[derive(Clone, Copy, Debug)]
pub struct ButtonRect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
    pub button: OverlayButton,
    pub label: &'static str,
}

impl ButtonRect {
    fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x && col < self.x + self.w && row >= self.y && row < self.y + self.h
    }
}

/// Button positions for a terminal of the given size. The renderer draws
/// the overlay from this same layout, so hit-testing always matches what
/// is on screen.
pub fn overlay_layout(cols: u16, rows: u16) -> Vec<ButtonRect> {
    if cols < 34 || rows < 8 {
        return vec![]; // too cramped for touch controls
    }
    let base = cols - 31;
    let r1 = rows - 3; // one row above the HUD bar
    let r0 = r1 - 1;
    let b = |x: u16, y: u16, button, label| ButtonRect { x, y, w: 5, h: 1, button, label };
    vec![
        b(base + 6, r0, OverlayButton::Up, "  ▲  "),
        b(base, r1, OverlayButton::Left, "  ◀  "),
        b(base + 6, r1, OverlayButton::Down, "  ▼  "),
        b(base + 12, r1, OverlayButton::Right, "  ▶  "),
        b(base + 19, r1, OverlayButton::Sprint, " RUN "),
        b(base + 25, r1, OverlayButton::Confirm, " OK  "),
    ]
}

fn hit(layout: &[ButtonRect], col: u16, row: u16) -> Option<OverlayButton> {
    layout.iter().find(|b| b.contains(col, row)).map(|b| b.button)
}

pub struct PointerState {
    held: Option<OverlayButton>,
    fresh_confirm: bool,
}

impl PointerState {
    pub fn new() -> Self {
        PointerState { held: None, fresh_confirm: false }
    }

    /// Process this frame's mouse events against the current layout.
    pub fn update(&mut self, events: &[MouseEvent], cols: u16, rows: u16) {
        self.fresh_confirm = false;
        if events.is_empty() {
            return;
        }
        let layout = overlay_layout(cols, rows);
        for m in events {
            match m.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    let target = hit(&layout, m.column, m.row);
                    if target == Some(OverlayButton::Confirm) {
                        self.fresh_confirm = true;
                    }
                    self.held = target;
                }
                MouseEventKind::Drag(MouseButton::Left) => {
                    self.held = hit(&layout, m.column, m.row);
                }
                MouseEventKind::Up(_) => {
                    self.held = None;
                }
                _ => {}
            }
        }
    }

    pub fn left_held(&self) -> bool {
        self.held == Some(OverlayButton::Left)
    }
    pub fn right_held(&self) -> bool {
        self.held == Some(OverlayButton::Right)
    }
    pub fn up_held(&self) -> bool {
        self.held == Some(OverlayButton::Up)
    }
    pub fn down_held(&self) -> bool {
        self.held == Some(OverlayButton::Down)
    }
    pub fn sprint_held(&self) -> bool {
        self.held == Some(OverlayButton::Sprint)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.fresh_confirm
    }
    /// Which button to highlight when drawing the overlay.
    pub fn active_button(&self) -> Option<OverlayButton> {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_inside_and_outside() {
        let layout = overlay_layout(80, 24);
        let right = layout.iter().find(|b| b.button == OverlayButton::Right).unwrap();
        assert_eq!(hit(&layout, right.x, right.y), Some(OverlayButton::Right));
        assert_eq!(hit(&layout, right.x + right.w, right.y), None);
        assert_eq!(hit(&layout, 0, 0), None);
    }

    #[test]
    fn cramped_terminal_has_no_overlay() {
        assert!(overlay_layout(30, 6).is_empty());
    }

    #[test]
    fn buttons_do_not_overlap() {
        let layout = overlay_layout(100, 30);
        for (i, a) in layout.iter().enumerate() {
            for b in layout.iter().skip(i + 1) {
                let disjoint = a.x + a.w <= b.x || b.x + b.w <= a.x || a.y != b.y;
                assert!(disjoint, "{:?} overlaps {:?}", a.button, b.button);
            }
        }
    }

    #[test]
    fn layout_fits_on_screen() {
        for (c, r) in [(34u16, 8u16), (80, 24), (200, 50)] {
            for b in overlay_layout(c, r) {
                assert!(b.x + b.w <= c);
                assert!(b.y + b.h <= r);
            }
        }
    }
}
