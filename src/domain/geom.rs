/// Pixel-space geometry. The whole simulation runs in a 40-px-per-tile
/// coordinate space; only the renderer maps pixels to terminal cells.

/// Side length of one grid tile, in world pixels.
pub const TILE_SIZE: i32 = 40;

/// Axis-aligned bounding box in world pixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// One full tile with its top-left corner at (x, y).
    pub fn tile(x: i32, y: i32) -> Self {
        Rect::new(x, y, TILE_SIZE, TILE_SIZE)
    }

    /// Strictly-positive overlap on both axes.
    /// Touching edges do NOT intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }

    /// Symmetric inset: shrinks width and height by `amount`, keeping the
    /// center fixed. Used for the enemy-contact tolerance margin.
    pub fn shrink(&self, amount: i32) -> Rect {
        Rect {
            x: self.x + amount / 2,
            y: self.y + amount / 2,
            w: self.w - amount,
            h: self.h - amount,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_detected() {
        let a = Rect::new(0, 0, 40, 40);
        let b = Rect::new(30, 30, 40, 40);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 40, 40);
        let right = Rect::new(40, 0, 40, 40);
        let below = Rect::new(0, 40, 40, 40);
        assert!(!a.intersects(&right));
        assert!(!a.intersects(&below));
    }

    #[test]
    fn disjoint_rects() {
        let a = Rect::new(0, 0, 40, 40);
        let b = Rect::new(100, 100, 40, 40);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn shrink_keeps_center() {
        let r = Rect::new(80, 120, 40, 40);
        let s = r.shrink(10);
        assert_eq!(s, Rect::new(85, 125, 30, 30));
        assert_eq!(r.center(), s.center());
    }

    #[test]
    fn shrunk_rect_needs_deeper_overlap() {
        let enemy = Rect::tile(40, 0);
        let player = Rect::tile(4, 0); // 4 px of raw overlap
        assert!(player.intersects(&enemy));
        assert!(!player.intersects(&enemy.shrink(10)));
    }
}
