/// Entities: Player, Patroller, Collectible.
///
/// The player moves in whole-tile jumps; patrollers glide at fractional
/// pixel speeds along one fixed axis. Both carry an axis-aligned box in
/// world pixels (see `geom`).

use crate::domain::geom::{Rect, TILE_SIZE};

/// Movement direction for a single accepted player move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    /// Whole-tile pixel delta for this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-TILE_SIZE, 0),
            MoveDir::Right => (TILE_SIZE, 0),
            MoveDir::Up => (0, -TILE_SIZE),
            MoveDir::Down => (0, TILE_SIZE),
        }
    }
}

/// Discrete intents for one tick, already merged from every input source
/// (keyboard, pointer overlay, gamepad). The simulation never sees raw
/// key or mouse state.
#[derive(Clone, Copy, Default, Debug)]
pub struct Intents {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub sprint: bool,
    pub confirm: bool,
}

impl Intents {
    /// Single-direction-per-tick policy: horizontal before vertical,
    /// left before right, up before down. The first held direction wins.
    pub fn direction(&self) -> Option<MoveDir> {
        if self.left {
            Some(MoveDir::Left)
        } else if self.right {
            Some(MoveDir::Right)
        } else if self.up {
            Some(MoveDir::Up)
        } else if self.down {
            Some(MoveDir::Down)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub rect: Rect,
}

impl Player {
    pub fn new(x: i32, y: i32) -> Self {
        Player { rect: Rect::tile(x, y) }
    }
}

/// Patrol axis. A patroller never leaves its axis: a horizontal one keeps
/// its y for its entire lifetime, and vice versa.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Back-and-forth enemy. Position is floating-point so speeds below one
/// pixel per tick work; the collision box is re-derived by truncation
/// after every advance.
#[derive(Clone, Debug)]
pub struct Patroller {
    pub x: f32,
    pub y: f32,
    pub rect: Rect,
    pub axis: Axis,
    pub speed: f32,
    /// Direction multiplier, always -1 or +1. Flips on wall contact.
    pub dir: i32,
}

impl Patroller {
    pub fn new(x: i32, y: i32, axis: Axis, speed: f32) -> Self {
        Patroller {
            x: x as f32,
            y: y as f32,
            rect: Rect::tile(x, y),
            axis,
            speed,
            dir: 1,
        }
    }

    /// Recompute the integer box from the float position.
    pub fn sync_rect(&mut self) {
        self.rect.x = self.x as i32;
        self.rect.y = self.y as i32;
    }
}

/// Collectible pickup margin: the box is inset this many pixels on each
/// side of its spawn tile, so it reads as an item lying on the floor.
pub const COLLECTIBLE_INSET: i32 = 10;

/// One-shot pickup. Lives in the level's live set until the player's box
/// overlaps it, then is removed permanently.
#[derive(Clone, Copy, Debug)]
pub struct Collectible {
    pub rect: Rect,
}

impl Collectible {
    /// Centered within the tile whose top-left corner is (x, y).
    pub fn in_tile(x: i32, y: i32) -> Self {
        Collectible {
            rect: Rect::new(
                x + COLLECTIBLE_INSET,
                y + COLLECTIBLE_INSET,
                TILE_SIZE - 2 * COLLECTIBLE_INSET,
                TILE_SIZE - 2 * COLLECTIBLE_INSET,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collectible_inset_within_tile() {
        let c = Collectible::in_tile(80, 40);
        assert_eq!(c.rect, Rect::new(90, 50, 20, 20));
        assert!(c.rect.w < TILE_SIZE && c.rect.h < TILE_SIZE);
        // Fully inside the spawn tile
        assert!(c.rect.x > 80 && c.rect.x + c.rect.w < 80 + TILE_SIZE);
    }

    #[test]
    fn patroller_rect_truncates_float_position() {
        let mut p = Patroller::new(40, 80, Axis::Horizontal, 0.8);
        p.x += 0.8;
        p.sync_rect();
        assert_eq!(p.rect.x, 40); // 40.8 truncates
        p.x += 0.8;
        p.sync_rect();
        assert_eq!(p.rect.x, 41);
    }
}
