/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.
///
/// Coordinate mapping: the simulation runs in world pixels (40 px per
/// tile); only this module converts to terminal cells. A tile is two
/// columns wide and one row tall, so a pixel position maps to
/// `(px * CELL_W / TILE_SIZE, py / TILE_SIZE)`.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::geom::TILE_SIZE;
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, WorldState};
use crate::ui::pointer::{self, PointerState};
use crate::ui::sprites::{SpriteId, SpriteTable};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells. Using the
    /// SAME explicit RGB for both `Clear(ClearType::All)` and every cell's
    /// background keeps inter-row gap pixels on VTE terminals from showing
    /// as horizontal lines.
    const BASE_BG: Color = Color::Rgb { r: 25, g: 30, b: 40 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 {
            return "";
        }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Each map tile = 2 terminal columns (a 40 px tile reads roughly square
/// that way in a typical terminal font).
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    mouse_captured: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            mouse_captured: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        // Mouse reporting drives the touch overlay. Not every terminal
        // supports it; without it the game stays keyboard-only.
        self.mouse_captured = execute!(self.writer, EnableMouseCapture).is_ok();

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.mouse_captured {
            let _ = execute!(self.writer, DisableMouseCapture);
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn term_size(&self) -> (u16, u16) {
        (self.term_w as u16, self.term_h as u16)
    }

    pub fn render(
        &mut self,
        world: &WorldState,
        ptr: &PointerState,
        sprites: &SpriteTable,
        now_ms: u64,
    ) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        let phase_changed = self.last_phase != Some(world.phase);
        if phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        // Build front buffer
        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => self.compose_game(world, sprites, now_ms),
            Phase::LevelComplete => {
                self.compose_game(world, sprites, now_ms);
                self.compose_level_complete(world);
            }
            Phase::GameOver => self.compose_game_over(world),
            Phase::Victory => self.compose_victory(world, sprites),
        }

        // Touch overlay sits on top of every screen so pointer input is
        // always available.
        self.compose_overlay(ptr);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // IMPORTANT: Do NOT use ResetColor here — it resets to the terminal's
        // native default, which may differ from BASE_BG and cause line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell == prev {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState, sprites: &SpriteTable, now_ms: u64) {
        self.compose_hud(w, now_ms, sprites);
        self.compose_map(w, sprites);
        self.compose_flash_border(w);
        self.compose_message_bar(w);
    }

    fn compose_hud(&mut self, w: &WorldState, now_ms: u64, sprites: &SpriteTable) {
        let buf_w = self.front.width;
        let hud_bg = Color::Rgb { r: 20, g: 25, b: 50 };
        for x in 0..buf_w {
            self.front.set(x, HUD_ROW, Cell::from_char(' ', Color::White, hud_bg));
        }

        // Left: level name and homework tally
        let homework = sprites.glyph(SpriteId::Homework).unwrap_or('▣');
        let left = format!(
            " {}  {}{}/{}",
            w.level.name, homework, w.collected, w.total_homework,
        );
        self.front.put_str(0, HUD_ROW, &left, Color::White, hud_bg);

        // Compass hint toward the nearest homework (or the door once the
        // quota is met).
        if let Some(arrow) = compass_arrow(w) {
            let needle = sprites.glyph(SpriteId::Compass).unwrap_or('◈');
            let hint = format!("{} {}", needle, arrow);
            let hx = left.chars().count() + 3;
            self.front.put_str(hx, HUD_ROW, &hint, SpriteId::Compass.color(), hud_bg);
        }

        // Right: run clock, then hearts
        let clock = w.time_string(now_ms);
        let cx = buf_w.saturating_sub(clock.chars().count() + 2);
        self.front.put_str(cx, HUD_ROW, &clock, Color::White, hud_bg);

        let heart = sprites.glyph(SpriteId::Heart).unwrap_or('♥');
        let hearts: String = std::iter::repeat(heart).take(w.lives as usize).collect();
        let hw = w.lives as usize + 1;
        let hx = cx.saturating_sub(hw + 2);
        self.front.put_str(hx, HUD_ROW, &hearts, SpriteId::Heart.color(), hud_bg);
    }

    fn compose_map(&mut self, w: &WorldState, sprites: &SpriteTable) {
        // Tiles first, then pickups, patrollers, the player on top.
        for ty in 0..w.level.rows {
            let row = MAP_ROW + ty;
            if row >= self.front.height {
                break;
            }
            for tx in 0..w.level.cols {
                let col = tx * CELL_W;
                if col + 1 >= self.front.width {
                    break;
                }
                let id = match w.level.tiles[ty][tx] {
                    Tile::Empty => SpriteId::Floor,
                    Tile::Wall => SpriteId::Wall,
                    Tile::Desk => SpriteId::Desk,
                    Tile::Goal => SpriteId::Door,
                };
                self.put_tile(id, col, row, sprites);
            }
        }

        for c in &w.collectibles {
            let (cx, cy) = c.rect.center();
            let (col, row) = px_to_cell(cx, cy);
            if row < self.front.height && col < self.front.width {
                let glyph = sprites.glyph(SpriteId::Homework).unwrap_or('▣');
                let under = self.front.get(col, row).bg;
                self.front.set(col, row, Cell::from_char(glyph, SpriteId::Homework.color(), under));
            }
        }

        for p in &w.patrollers {
            self.put_entity(SpriteId::Enemy, p.rect.x, p.rect.y, sprites);
        }

        self.put_entity(SpriteId::Player, w.player.rect.x, w.player.rect.y, sprites);
    }

    /// Paint one map tile (two columns). With a glyph configured, the
    /// glyph sits on the floor color; without one, a solid color block.
    fn put_tile(&mut self, id: SpriteId, col: usize, row: usize, sprites: &SpriteTable) {
        match sprites.glyph(id) {
            Some(g) => {
                let bg = if id == SpriteId::Floor {
                    Cell::BASE_BG
                } else {
                    SpriteId::Floor.color()
                };
                self.front.set(col, row, Cell::from_char(g, id.color(), bg));
                self.front.set(col + 1, row, Cell::from_char(' ', id.color(), bg));
            }
            None => {
                let bg = id.color();
                self.front.set(col, row, Cell::from_char(' ', Color::White, bg));
                self.front.set(col + 1, row, Cell::from_char(' ', Color::White, bg));
            }
        }
    }

    /// Paint a moving entity at its pixel position (two columns). The
    /// half-tile horizontal resolution lets fractional patrol speeds read
    /// as motion between tiles.
    fn put_entity(&mut self, id: SpriteId, px: i32, py: i32, sprites: &SpriteTable) {
        let (col, row) = px_to_cell(px, py);
        if row >= self.front.height || col + 1 >= self.front.width {
            return;
        }
        match sprites.glyph(id) {
            Some(g) => {
                let under = self.front.get(col, row).bg;
                self.front.set(col, row, Cell::from_char(g, id.color(), under));
            }
            None => {
                let bg = id.color();
                self.front.set(col, row, Cell::from_char(' ', Color::White, bg));
                self.front.set(col + 1, row, Cell::from_char(' ', Color::White, bg));
            }
        }
    }

    /// One-cell red frame around the map while a hit flash is active.
    fn compose_flash_border(&mut self, w: &WorldState) {
        if w.flash_timer == 0 {
            return;
        }
        let red = Color::Rgb { r: 255, g: 40, b: 40 };
        let map_w = (w.level.cols * CELL_W).min(self.front.width);
        let top = MAP_ROW.saturating_sub(1);
        let bottom = MAP_ROW + w.level.rows;
        for x in 0..map_w {
            self.front.set(x, top, Cell::from_char('▄', red, Color::Reset));
            self.front.set(x, bottom, Cell::from_char('▀', red, Color::Reset));
        }
    }

    fn compose_message_bar(&mut self, w: &WorldState) {
        let msg_row = MAP_ROW + w.level.rows + 1;
        if msg_row >= self.front.height || w.message.is_empty() {
            return;
        }
        let bar_fg = Color::Black;
        let bar_bg = Color::Rgb { r: 241, g: 196, b: 15 };
        let msg = format!(" {} ", w.message);
        for x in 0..self.front.width {
            self.front.set(x, msg_row, Cell::from_char(' ', bar_fg, bar_bg));
        }
        self.front.put_str(0, msg_row, &msg, bar_fg, bar_bg);
    }

    /// Touch controls, drawn from the same layout the pointer hit-tests
    /// against. The currently pressed button renders inverted.
    fn compose_overlay(&mut self, ptr: &PointerState) {
        let layout = pointer::overlay_layout(self.term_w as u16, self.term_h as u16);
        let active = ptr.active_button();
        for b in &layout {
            let (fg, bg) = if active == Some(b.button) {
                (Color::Black, Color::Rgb { r: 241, g: 196, b: 15 })
            } else {
                (Color::Rgb { r: 150, g: 160, b: 180 }, Color::Rgb { r: 45, g: 52, b: 70 })
            };
            self.front.put_str(b.x as usize, b.y as usize, b.label, fg, bg);
        }
    }

    // ── Static screens (title, game over, etc.) ──

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  ___  ___   __  __  ___   _    ___  ___   _  _  ___  ___  _  _ ",
            r" / __|/ _ \ |  \/  || _ \ /_\  / __|/ __| | || ||_ _|/ __|| || |",
            r"| (__| (_) || |\/| ||  _// _ \ \__ \\__ \ | __ | | || (_ || __ |",
            r" \___|\___/ |_|  |_||_| /_/ \_\|___/|___/ |_||_||___|\___||_||_|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, SpriteId::Compass.color(), Color::Reset);
        }

        let subtitle = "◈◈  Ivan's Journey  ◈◈";
        let sx = 2 + (title[1].len().saturating_sub(subtitle.chars().count())) / 2;
        self.front.put_str(sx, 7, subtitle, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);

        // Blinking start prompt
        if (w.anim_tick / 8) % 2 == 0 {
            let prompt = "▸▸▸  PRESS ENTER TO START  ◂◂◂";
            let px = 2 + (title[1].len().saturating_sub(prompt.chars().count())) / 2;
            self.front.put_str(px, 10, prompt, Color::White, Color::Reset);
        }

        let help = [
            "Controls",
            "  ←→↑↓ / WASD   Move",
            "  SHIFT         Sprint",
            "  ENTER/SPACE   Confirm",
            "  Q / ESC       Quit",
            "",
            "Collect every homework sheet, dodge the hall monitors,",
            "then reach the red door.",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { SpriteId::Compass.color() } else { Color::White };
            self.front.put_str(8, 13 + i, line, color, Color::Reset);
        }
    }

    fn compose_level_complete(&mut self, w: &WorldState) {
        let cy = MAP_ROW + w.level.rows / 2;
        if cy < 1 || cy + 2 >= self.front.height {
            return;
        }
        let border = "╔══════════════════════════════╗";
        let middle = "║     ★ LEVEL COMPLETE ★      ║";
        let prompt = "║   ENTER / OK: Next Level     ║";
        let bottom = "╚══════════════════════════════╝";
        let map_cols = w.level.cols * CELL_W;
        let cx = map_cols.saturating_sub(border.chars().count()) / 2;
        let fg = SpriteId::Compass.color();
        let bg = Color::Rgb { r: 20, g: 60, b: 20 };
        self.front.put_str(cx, cy - 1, border, fg, bg);
        self.front.put_str(cx, cy, middle, fg, bg);
        self.front.put_str(cx, cy + 1, prompt, Color::Rgb { r: 80, g: 255, b: 80 }, bg);
        self.front.put_str(cx, cy + 2, bottom, fg, bg);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let box_art = [
            "╔════════════════════════════════╗",
            "║        ✕  GAME OVER  ✕        ║",
            "╚════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 4 + i, l, Color::Rgb { r: 255, g: 60, b: 60 }, Color::Reset);
        }
        let level = format!("◈ Made it to: {}", w.level.name);
        let time = format!("◈ Time: {}", w.final_time);
        let caught = format!("◈ Times caught: {}", w.total_deaths);
        self.front.put_str(8, 9, &level, Color::White, Color::Reset);
        self.front.put_str(8, 10, &time, Color::White, Color::Reset);
        self.front.put_str(8, 11, &caught, Color::White, Color::Reset);
        self.front.put_str(8, 13, "▸ ENTER / OK: Back to Title", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
    }

    fn compose_victory(&mut self, w: &WorldState, sprites: &SpriteTable) {
        // Confetti behind the stats box. Particle coordinates are
        // normalized; scale to whatever the terminal currently is.
        let palette = [
            Color::Rgb { r: 231, g: 76, b: 60 },
            Color::Rgb { r: 46, g: 204, b: 113 },
            Color::Rgb { r: 52, g: 152, b: 219 },
            Color::Rgb { r: 241, g: 196, b: 15 },
        ];
        let needle = sprites.glyph(SpriteId::Compass).unwrap_or('◈');
        for p in &w.confetti {
            if p.y < 0.0 {
                continue; // still above the screen
            }
            let col = (p.x * self.term_w as f32) as usize;
            let row = (p.y * self.term_h as f32) as usize;
            if col >= self.front.width || row >= self.front.height {
                continue;
            }
            let (ch, fg) = if p.compass {
                (needle, SpriteId::Compass.color())
            } else {
                ('•', palette[p.palette as usize % palette.len()])
            };
            self.front.set(col, row, Cell::from_char(ch, fg, Color::Reset));
        }

        let box_art = [
            "╔═══════════════════════════════════╗",
            "║       ★  YOU GRADUATED!  ★       ║",
            "╚═══════════════════════════════════╝",
        ];
        let bx = self.front.width.saturating_sub(box_art[0].chars().count()) / 2;
        let by = self.front.height / 3;
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(bx, by + i, l, SpriteId::Compass.color(), Color::Reset);
        }
        let time = format!("◈ Final time: {}", w.final_time);
        let caught = format!("◈ Times caught: {}", w.total_deaths);
        self.front.put_str(bx + 2, by + 4, &time, Color::White, Color::Reset);
        self.front.put_str(bx + 2, by + 5, &caught, Color::White, Color::Reset);
        self.front.put_str(
            bx + 2,
            by + 7,
            "▸ ENTER / OK: Back to Title",
            Color::Rgb { r: 80, g: 255, b: 80 },
            Color::Reset,
        );
    }
}

/// World pixels → terminal cell under the map origin.
fn px_to_cell(px: i32, py: i32) -> (usize, usize) {
    let col = (px.max(0) as usize * CELL_W) / TILE_SIZE as usize;
    let row = MAP_ROW + py.max(0) as usize / TILE_SIZE as usize;
    (col, row)
}

/// Arrow pointing from the player toward the nearest homework, or toward
/// the first goal door once the quota is met. Dominant axis wins.
fn compass_arrow(w: &WorldState) -> Option<char> {
    let (px, py) = w.player.rect.center();
    let target = if w.collectibles.is_empty() {
        w.level.goals.first().map(|g| g.center())
    } else {
        w.collectibles
            .iter()
            .map(|c| c.rect.center())
            .min_by_key(|&(cx, cy)| {
                let dx = (cx - px) as i64;
                let dy = (cy - py) as i64;
                dx * dx + dy * dy
            })
    };
    let (tx, ty) = target?;
    let dx = tx - px;
    let dy = ty - py;
    if dx == 0 && dy == 0 {
        return None;
    }
    Some(if dx.abs() >= dy.abs() {
        if dx > 0 { '→' } else { '←' }
    } else if dy > 0 {
        '↓'
    } else {
        '↑'
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_to_cell_mapping() {
        assert_eq!(px_to_cell(0, 0), (0, MAP_ROW));
        assert_eq!(px_to_cell(40, 40), (2, MAP_ROW + 1));
        // Half-tile horizontal resolution for gliding patrollers
        assert_eq!(px_to_cell(20, 0), (1, MAP_ROW));
        assert_eq!(px_to_cell(39, 0), (1, MAP_ROW));
    }
}
