/// Movement resolution — pure functions, no side effects beyond the
/// entity passed in.
///
/// ## Player: axis-separated tentative move
///
/// ┌───────────────────────────────┬──────────────────────────────┐
/// │ Step                          │ Effect                       │
/// ├───────────────────────────────┼──────────────────────────────┤
/// │ apply dx                      │ box shifts horizontally      │
/// │ box overlaps any blocker      │ revert dx                    │
/// │ apply dy                      │ box shifts vertically        │
/// │ box overlaps any blocker      │ revert dy                    │
/// └───────────────────────────────┴──────────────────────────────┘
///
/// Moves are whole-tile jumps with exactly one axis non-zero per call, so
/// at most one blocker can overlap per axis and there is no wall sliding.
///
/// ## Patroller: advance and bounce
///
/// Advance the float coordinate by `speed * dir` along the fixed axis,
/// truncate into the box, then scan the blockers: on overlap, flip `dir`
/// and reapply the (now reversed) delta. The overlapping step is undone by
/// reapplication rather than by backtracking to the wall face, which can
/// leave the box a fraction of a pixel inside geometry for one tick. That
/// imprecision is part of the patrol timing and must not change.

use crate::domain::entity::Patroller;
use crate::domain::geom::Rect;

fn hits_any(rect: &Rect, blocking: &[Rect]) -> bool {
    blocking.iter().any(|b| rect.intersects(b))
}

/// Move the player's box by (dx, dy), reverting each axis independently
/// if it would enter blocking geometry. Exactly one of dx/dy is non-zero.
pub fn move_player(rect: &mut Rect, dx: i32, dy: i32, blocking: &[Rect]) {
    rect.x += dx;
    if hits_any(rect, blocking) {
        rect.x -= dx;
    }
    rect.y += dy;
    if hits_any(rect, blocking) {
        rect.y -= dy;
    }
}

/// Advance a patroller one tick along its axis, bouncing off blockers.
pub fn update_patroller(p: &mut Patroller, blocking: &[Rect]) {
    match p.axis {
        crate::domain::entity::Axis::Horizontal => {
            p.x += p.speed * p.dir as f32;
            p.sync_rect();
            for b in blocking {
                if p.rect.intersects(b) {
                    p.dir = -p.dir;
                    p.x += p.speed * p.dir as f32;
                    p.sync_rect();
                }
            }
        }
        crate::domain::entity::Axis::Vertical => {
            p.y += p.speed * p.dir as f32;
            p.sync_rect();
            for b in blocking {
                if p.rect.intersects(b) {
                    p.dir = -p.dir;
                    p.y += p.speed * p.dir as f32;
                    p.sync_rect();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Axis;
    use crate::domain::geom::TILE_SIZE;

    fn t(col: i32, row: i32) -> Rect {
        Rect::tile(col * TILE_SIZE, row * TILE_SIZE)
    }

    // ── Player ──

    #[test]
    fn blocked_move_leaves_position_unchanged() {
        let walls = [t(2, 1)];
        let mut player = t(1, 1);
        let before = player;
        move_player(&mut player, TILE_SIZE, 0, &walls);
        assert_eq!(player, before);
    }

    #[test]
    fn open_move_advances_one_tile() {
        let walls = [t(0, 1), t(3, 1)];
        let mut player = t(1, 1);
        move_player(&mut player, TILE_SIZE, 0, &walls);
        assert_eq!(player, t(2, 1));
        move_player(&mut player, 0, TILE_SIZE, &walls);
        assert_eq!(player, t(2, 2));
    }

    #[test]
    fn vertical_block_reverts_only_vertical() {
        let walls = [t(1, 0)];
        let mut player = t(1, 1);
        move_player(&mut player, 0, -TILE_SIZE, &walls);
        assert_eq!(player, t(1, 1));
    }

    // ── Patroller ──

    #[test]
    fn horizontal_patroller_never_changes_y() {
        // Corridor: walls at columns 0 and 4
        let walls = [t(0, 1), t(4, 1)];
        let mut p = Patroller::new(TILE_SIZE, TILE_SIZE, Axis::Horizontal, 1.5);
        let y0 = p.rect.y;
        for _ in 0..500 {
            update_patroller(&mut p, &walls);
            assert_eq!(p.rect.y, y0);
            assert!(p.y == y0 as f32);
        }
    }

    #[test]
    fn vertical_patroller_never_changes_x() {
        let walls = [t(1, 0), t(1, 4)];
        let mut p = Patroller::new(TILE_SIZE, TILE_SIZE, Axis::Vertical, 0.8);
        let x0 = p.rect.x;
        for _ in 0..500 {
            update_patroller(&mut p, &walls);
            assert_eq!(p.rect.x, x0);
        }
    }

    #[test]
    fn patroller_reverses_on_wall_contact() {
        let walls = [t(0, 1), t(3, 1)];
        let mut p = Patroller::new(TILE_SIZE, TILE_SIZE, Axis::Horizontal, 1.0);
        assert_eq!(p.dir, 1);
        // Walk right until the bounce: starts at x=40, wall at x=120,
        // contact when box reaches x=81 (boxes overlap strictly).
        let mut flipped = false;
        for _ in 0..200 {
            update_patroller(&mut p, &walls);
            if p.dir == -1 {
                flipped = true;
                break;
            }
        }
        assert!(flipped);
        // After the flip the box is back out of the wall's interior span
        assert!(p.rect.x <= 2 * TILE_SIZE + 1);
    }

    #[test]
    fn patroller_stays_within_corridor() {
        let walls = [t(0, 1), t(5, 1)];
        let mut p = Patroller::new(2 * TILE_SIZE, TILE_SIZE, Axis::Horizontal, 1.2);
        for _ in 0..2000 {
            update_patroller(&mut p, &walls);
            // Bounce-by-reapply may sit a fraction inside for one tick,
            // but never deeper than one step
            assert!(p.rect.x > 0 && p.rect.x < 5 * TILE_SIZE + 2);
        }
    }
}
