/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Empty,
    Wall,
    Desk, // blocks like a wall, drawn differently
    Goal,
}

impl Tile {
    /// Does this tile block movement? Walls and desks are
    /// collision-equivalent; both feed the blocking-geometry set.
    pub fn is_blocking(self) -> bool {
        matches!(self, Tile::Wall | Tile::Desk)
    }

    /// Is this the exit door?
    #[allow(dead_code)]
    pub fn is_goal(self) -> bool {
        matches!(self, Tile::Goal)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desk_blocks_like_wall() {
        assert!(Tile::Wall.is_blocking());
        assert!(Tile::Desk.is_blocking());
        assert!(!Tile::Empty.is_blocking());
        assert!(!Tile::Goal.is_blocking());
    }
}
