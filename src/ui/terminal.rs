/// Terminal front-end: the tablet command channel and the renderer.
///
/// The renderer redraws a fixed-size framed area every frame with
/// batched `queue!` commands and a single flush. Every emitted row is
/// padded to the frame width, so no stale cells survive between frames
/// and no full-screen clear is needed after init.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::domain::actor::{Actor, ActorKind};
use crate::domain::command::{Command, MAX_COMMANDS};
use crate::domain::tile::Tile;
use crate::sim::channel::{CommandChannel, InputMode};
use crate::sim::session::LevelSimulation;

// ── TabletChannel ──

/// The stone tablet: command buffer, input mode and the billboard.
/// This is the game's only `CommandChannel` implementation.
pub struct TabletChannel {
    mode: InputMode,
    commands: Vec<Command>,
    executed: Vec<bool>,
    message: Option<(String, String)>,
}

impl TabletChannel {
    pub fn new() -> TabletChannel {
        TabletChannel {
            mode: InputMode::Locked,
            commands: Vec::new(),
            executed: Vec::new(),
            message: None,
        }
    }

    pub fn message(&self) -> Option<&(String, String)> {
        self.message.as_ref()
    }

    /// Tablet glyphs in typing order, executed ones swapped in.
    pub fn glyphs(&self) -> Vec<char> {
        self.commands
            .iter()
            .zip(&self.executed)
            .map(|(c, done)| if *done { c.executed_glyph() } else { c.glyph() })
            .collect()
    }
}

impl CommandChannel for TabletChannel {
    fn mode(&self) -> InputMode {
        self.mode
    }

    fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn append_command(&mut self, command: Command) {
        if self.mode == InputMode::Inputting && self.commands.len() < MAX_COMMANDS {
            self.commands.push(command);
            self.executed.push(false);
        }
    }

    fn delete_last_command(&mut self) {
        if self.mode == InputMode::Inputting {
            self.commands.pop();
            self.executed.pop();
        }
    }

    fn clear_commands(&mut self) {
        self.commands.clear();
        self.executed.clear();
    }

    fn mark_executed(&mut self, index: usize) {
        if let Some(done) = self.executed.get_mut(index) {
            *done = true;
        }
    }

    fn show_message(&mut self, title: &str, body: &str) {
        self.message = Some((title.to_string(), body.to_string()));
    }

    fn hide_message(&mut self) {
        self.message = None;
    }
}

// ── Renderer ──

const PANEL_WIDTH: usize = 20;
const GLYPHS_PER_ROW: usize = 4;

#[derive(Clone, Copy)]
struct Cell {
    ch: char,
    fg: Color,
}

const BLANK: Cell = Cell { ch: ' ', fg: Color::White };

pub struct Renderer {
    out: BufWriter<Stdout>,
}

impl Renderer {
    pub fn new() -> Renderer {
        Renderer { out: BufWriter::new(io::stdout()) }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.out, Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn render(&mut self, sim: &LevelSimulation, channel: &TabletChannel) -> io::Result<()> {
        let grid = sim.grid();
        let gw = grid.width() as usize;
        let gh = grid.height() as usize;
        let width = gw.max(24) + 3 + PANEL_WIDTH;
        let height = gh.max(9) + 2;

        let mut canvas = vec![vec![BLANK; width]; height];

        // Tiles.
        for y in 0..gh {
            for x in 0..gw {
                let tile = grid
                    .tile_at(crate::domain::grid::Cell::new(x as i32, y as i32))
                    .unwrap_or_default();
                canvas[y][x] = tile_cell(tile);
            }
        }

        // Actors, at their eased positions, snapped to the nearest cell.
        for actor in sim.actors() {
            stamp_actor(&mut canvas, actor, gw, gh);
        }

        // Tablet panel.
        let px = gw.max(24) + 3;
        put_str(&mut canvas, px, 0, sim.level_name(), Color::DarkYellow);
        put_str(&mut canvas, px, 1, "THE TABLET", Color::Yellow);
        let glyphs = channel.glyphs();
        for (i, g) in glyphs.iter().enumerate() {
            let row = 2 + i / GLYPHS_PER_ROW;
            let col = px + (i % GLYPHS_PER_ROW) * 2;
            if row < height {
                canvas[row][col] = Cell { ch: *g, fg: Color::White };
            }
        }

        // Mode hint under the grid.
        let hint = match channel.mode() {
            InputMode::Inputting => "arrows/wasd: command   backspace: undo   enter: replay",
            InputMode::Replaying | InputMode::Locked => "the word is given; the disciples obey",
        };
        put_str(&mut canvas, 0, height - 1, hint, Color::DarkGrey);

        // Billboard overlays everything else.
        if let Some((title, body)) = channel.message() {
            stamp_billboard(&mut canvas, title, body, width, height);
        }

        // Emit the whole frame, every row padded to `width`.
        let mut fg = Color::White;
        queue!(self.out, SetForegroundColor(fg))?;
        for (y, row) in canvas.iter().enumerate() {
            queue!(self.out, MoveTo(0, y as u16))?;
            for cell in row {
                if cell.fg != fg {
                    fg = cell.fg;
                    queue!(self.out, SetForegroundColor(fg))?;
                }
                queue!(self.out, Print(cell.ch))?;
            }
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }
}

fn tile_cell(tile: Tile) -> Cell {
    match tile {
        Tile::Sky => BLANK,
        Tile::Ground => Cell { ch: '█', fg: Color::DarkGreen },
        Tile::Goal => Cell { ch: '◎', fg: Color::Yellow },
        Tile::Ladder => Cell { ch: '╫', fg: Color::Grey },
        Tile::Water => Cell { ch: '~', fg: Color::Blue },
        Tile::Rubble => Cell { ch: '▒', fg: Color::DarkGrey },
    }
}

fn actor_cell(kind: ActorKind) -> Cell {
    match kind {
        ActorKind::Prophet => Cell { ch: '@', fg: Color::Cyan },
        ActorKind::Pride => Cell { ch: '&', fg: Color::Magenta },
        ActorKind::Gluttony => Cell { ch: 'G', fg: Color::Red },
        ActorKind::Envy => Cell { ch: 'v', fg: Color::Green },
    }
}

fn stamp_actor(canvas: &mut [Vec<Cell>], actor: &Actor, gw: usize, gh: usize) {
    let (wx, wy) = actor.render_position();
    let ax = wx.round() as i32;
    let ay = wy.round() as i32;
    let mut cell = actor_cell(actor.kind);
    if actor.is_moving() {
        cell.fg = Color::White;
    }
    let edge = actor.footprint_edge();
    for i in 0..edge {
        for j in 0..edge {
            let (x, y) = (ax + i, ay - j);
            if x >= 0 && (x as usize) < gw && y >= 0 && (y as usize) < gh {
                canvas[y as usize][x as usize] = cell;
            }
        }
    }
}

fn put_char(canvas: &mut [Vec<Cell>], x: usize, y: usize, ch: char, fg: Color) {
    if y < canvas.len() && x < canvas[y].len() {
        canvas[y][x] = Cell { ch, fg };
    }
}

fn put_str(canvas: &mut [Vec<Cell>], x: usize, y: usize, text: &str, fg: Color) {
    for (i, ch) in text.chars().enumerate() {
        put_char(canvas, x + i, y, ch, fg);
    }
}

/// Centered message box: title row, blank row, word-wrapped body.
fn stamp_billboard(canvas: &mut [Vec<Cell>], title: &str, body: &str, width: usize, height: usize) {
    let inner = width.saturating_sub(8).max(16);
    let mut lines = vec![title.to_string(), String::new()];
    lines.extend(wrap_words(body, inner));

    let box_w = inner + 4;
    let box_h = lines.len() + 2;
    let left = width.saturating_sub(box_w) / 2;
    let top = height.saturating_sub(box_h) / 2;

    for y in 0..box_h {
        for x in 0..box_w {
            let edge_x = x == 0 || x == box_w - 1;
            let edge_y = y == 0 || y == box_h - 1;
            let ch = match (edge_x, edge_y) {
                (true, true) => '+',
                (false, true) => '-',
                (true, false) => '|',
                (false, false) => ' ',
            };
            put_char(canvas, left + x, top + y, ch, Color::White);
        }
    }
    for (i, line) in lines.iter().enumerate() {
        let pad = (inner.saturating_sub(line.chars().count())) / 2;
        put_str(canvas, left + 2 + pad, top + 1 + i, line, Color::White);
    }
}

fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
