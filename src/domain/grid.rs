/// Cell coordinates and the immutable tile grid.
///
/// Coordinates are signed: `x` grows rightward, `y` grows downward
/// (row 0 is the top row). Signed cells let motion deltas point off the
/// map edge without wrapping; every grid query treats such cells as
/// out of bounds.
///
/// Out of bounds means: no tile at all (the void), blocking, not
/// climbable, not deadly. "No tile" and "deadly tile" are distinct
/// failure conditions with different messages.

use super::tile::Tile;

/// One grid cell. `x` = column, `y` = row (downward).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Cell { x: self.x + dx, y: self.y + dy }
    }

    /// The cell directly below (gravity direction).
    pub fn below(self) -> Self {
        self.offset(0, 1)
    }
}

/// Rectangular, immutable tile grid. Built once at level load.
#[derive(Debug)]
pub struct TileGrid {
    tiles: Vec<Tile>,
    width: i32,
    height: i32,
}

impl TileGrid {
    /// Parse a grid from a newline-delimited string of tile codes.
    /// Unknown codes, ragged rows and empty input are rejected here;
    /// a constructed grid is infallible from then on.
    pub fn parse(text: &str) -> Result<TileGrid, GridParseError> {
        let mut tiles = Vec::new();
        let mut width = None;
        let mut height = 0;

        for (row, line) in text.lines().enumerate() {
            let mut row_width = 0;
            for (col, code) in line.chars().enumerate() {
                let tile = Tile::from_code(code).ok_or(GridParseError::UnknownCode {
                    code,
                    x: col as i32,
                    y: row as i32,
                })?;
                tiles.push(tile);
                row_width += 1;
            }
            match width {
                None => width = Some(row_width),
                Some(w) if w != row_width => {
                    return Err(GridParseError::RaggedRow { row: row as i32 });
                }
                Some(_) => {}
            }
            height += 1;
        }

        match width {
            Some(w) if w > 0 => Ok(TileGrid { tiles, width: w, height }),
            _ => Err(GridParseError::Empty),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    /// The tile at `cell`, or `None` outside the grid (the void).
    pub fn tile_at(&self, cell: Cell) -> Option<Tile> {
        if !self.in_bounds(cell) {
            return None;
        }
        Some(self.tiles[(cell.y * self.width + cell.x) as usize])
    }

    /// Out of bounds is always blocked.
    pub fn is_blocking(&self, cell: Cell) -> bool {
        self.tile_at(cell).map_or(true, Tile::is_blocking)
    }

    /// Out of bounds is never climbable.
    pub fn is_climbable(&self, cell: Cell) -> bool {
        self.tile_at(cell).map_or(false, Tile::is_climbable)
    }

    /// Out of bounds is not deadly — it is the void, a separate condition.
    #[allow(dead_code)]
    pub fn is_deadly(&self, cell: Cell) -> bool {
        self.tile_at(cell).map_or(false, Tile::is_deadly)
    }

    pub fn is_goal(&self, cell: Cell) -> bool {
        self.tile_at(cell).map_or(false, Tile::is_goal)
    }
}

/// Why a tile-grid string failed to parse.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GridParseError {
    UnknownCode { code: char, x: i32, y: i32 },
    RaggedRow { row: i32 },
    Empty,
}
