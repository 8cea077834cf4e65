/// The asset table: one optional glyph per logical sprite, resolved once
/// at startup from the `[sprites]` config section.
///
/// A sprite without a glyph is NOT an error: the renderer falls back to a
/// solid-color cell in that sprite's palette color. Fallback rendering is
/// a first-class mode — a bare default config runs entirely on it.

use crossterm::style::Color;

use crate::config::SpriteGlyphs;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpriteId {
    Player,
    Wall,
    Floor,
    Homework,
    Enemy,
    Door,
    Desk,
    Heart,
    Compass,
}

impl SpriteId {
    /// Palette color used when no glyph is configured, and as the glyph
    /// foreground when one is.
    pub fn color(self) -> Color {
        match self {
            SpriteId::Player => Color::Rgb { r: 46, g: 204, b: 113 },
            SpriteId::Wall => Color::Rgb { r: 100, g: 100, b: 100 },
            SpriteId::Floor => Color::Rgb { r: 50, g: 60, b: 80 },
            SpriteId::Homework => Color::Rgb { r: 240, g: 240, b: 240 },
            SpriteId::Enemy => Color::Rgb { r: 231, g: 76, b: 60 },
            SpriteId::Door => Color::Rgb { r: 200, g: 50, b: 50 },
            SpriteId::Desk => Color::Rgb { r: 139, g: 69, b: 19 },
            SpriteId::Heart => Color::Rgb { r: 255, g: 50, b: 50 },
            SpriteId::Compass => Color::Rgb { r: 241, g: 196, b: 15 },
        }
    }
}

pub struct SpriteTable {
    glyphs: [Option<char>; 9],
}

impl SpriteTable {
    /// Resolve the table once from config. Multi-character overrides keep
    /// only their first char; empty strings count as absent.
    pub fn load(cfg: &SpriteGlyphs) -> Self {
        let first = |s: &Option<String>| s.as_ref().and_then(|v| v.chars().next());
        SpriteTable {
            glyphs: [
                first(&cfg.player),
                first(&cfg.wall),
                first(&cfg.floor),
                first(&cfg.homework),
                first(&cfg.enemy),
                first(&cfg.door),
                first(&cfg.desk),
                first(&cfg.heart),
                first(&cfg.compass),
            ],
        }
    }

    /// Is an image (glyph) available for this sprite?
    pub fn glyph(&self, id: SpriteId) -> Option<char> {
        self.glyphs[Self::slot(id)]
    }

    fn slot(id: SpriteId) -> usize {
        match id {
            SpriteId::Player => 0,
            SpriteId::Wall => 1,
            SpriteId::Floor => 2,
            SpriteId::Homework => 3,
            SpriteId::Enemy => 4,
            SpriteId::Door => 5,
            SpriteId::Desk => 6,
            SpriteId::Heart => 7,
            SpriteId::Compass => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entries_fall_back() {
        let table = SpriteTable::load(&SpriteGlyphs::default());
        assert_eq!(table.glyph(SpriteId::Player), None);
        assert_eq!(table.glyph(SpriteId::Heart), None);
    }

    #[test]
    fn overrides_take_first_char() {
        let cfg = SpriteGlyphs {
            player: Some("@x".into()),
            enemy: Some("".into()),
            ..SpriteGlyphs::default()
        };
        let table = SpriteTable::load(&cfg);
        assert_eq!(table.glyph(SpriteId::Player), Some('@'));
        assert_eq!(table.glyph(SpriteId::Enemy), None);
        assert_eq!(table.glyph(SpriteId::Wall), None);
    }
}
