//! Grid rules for the merge puzzle and the [`BoardEngine`] contract the search talks to.
//!
//! A [`Grid`] is an immutable square board of tile values (`0` for empty, otherwise a power of
//! two). Every rule operation returns a fresh grid, so search code can hand out copies freely.
//!
//! ```
//! use ai_2048_search::engine::{Grid, Move};
//!
//! let grid = Grid::from_rows(&[
//!     vec![2u32, 2, 0, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 4],
//! ]).unwrap();
//! let shifted = grid.shift(Move::Left);
//! assert_eq!(shifted.gained, 4);
//! assert_eq!(shifted.grid.row(0), &[4, 0, 0, 0]);
//! ```

use rand::Rng;
use std::fmt;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    /// Order in which the search expands player moves. Earlier entries win value ties.
    pub const SEARCH_ORDER: [Move; 4] = [Move::Left, Move::Right, Move::Up, Move::Down];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Left => "left",
            Move::Right => "right",
            Move::Up => "up",
            Move::Down => "down",
        };
        f.write_str(name)
    }
}

/// A `(row, col)` coordinate on a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self { Cell { row, col } }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("board side must be at least 2, got {0}")]
    TooSmall(usize),
    #[error("board is not square: row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
    #[error("cell ({row}, {col}) holds {value}, which is neither empty nor a power of two")]
    InvalidTile { row: usize, col: usize, value: u32 },
    #[error("cell ({row}, {col}) is outside a {size}x{size} board")]
    OutOfBounds { row: usize, col: usize, size: usize },
    #[error("cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },
    #[error("move {0} does not change the board")]
    NoOpMove(Move),
}

/// Result of sliding a grid in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub grid: Grid,
    /// Points earned by the merges of this shift (sum of merged tile values).
    pub gained: u64,
}

/// Square board of tile values, stored row-major.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    size: usize,
    cells: Box<[u32]>,
}

impl Grid {
    /// An all-empty board of side `size`.
    pub fn empty(size: usize) -> Result<Self, EngineError> {
        if size < 2 {
            return Err(EngineError::TooSmall(size));
        }
        Ok(Grid { size, cells: vec![0; size * size].into_boxed_slice() })
    }

    /// Build a board from its rows, validating shape and tile values.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, EngineError> {
        let size = rows.len();
        if size < 2 {
            return Err(EngineError::TooSmall(size));
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            if line.len() != size {
                return Err(EngineError::NotSquare { row, len: line.len(), size });
            }
            for (col, &value) in line.iter().enumerate() {
                if !is_tile_value(value) {
                    return Err(EngineError::InvalidTile { row, col, value });
                }
            }
            cells.extend_from_slice(line);
        }
        Ok(Grid { size, cells: cells.into_boxed_slice() })
    }

    /// Side length of the board.
    #[inline]
    pub fn size(&self) -> usize { self.size }

    /// Total number of cells (`size * size`).
    #[inline]
    pub fn cell_count(&self) -> usize { self.cells.len() }

    #[inline]
    pub fn get(&self, cell: Cell) -> Option<u32> {
        if cell.row < self.size && cell.col < self.size {
            Some(self.cells[cell.row * self.size + cell.col])
        } else {
            None
        }
    }

    /// Borrow one row of the board.
    #[inline]
    pub fn row(&self, row: usize) -> &[u32] { &self.cells[row * self.size..(row + 1) * self.size] }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ { self.cells.chunks(self.size) }

    pub fn column(&self, col: usize) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().skip(col).step_by(self.size).copied()
    }

    /// Count the number of empty cells.
    #[inline]
    pub fn count_empty(&self) -> usize { self.cells.iter().filter(|&&v| v == 0).count() }

    /// Coordinates of the empty cells, row-major.
    pub fn empty_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == 0)
            .map(|(idx, _)| Cell::new(idx / self.size, idx % self.size))
            .collect()
    }

    /// Return the highest tile value present (0 for an empty board).
    pub fn highest_tile(&self) -> u32 { self.cells.iter().copied().max().unwrap_or(0) }

    /// Slide and merge every line towards `dir`. No randomness.
    pub fn shift(&self, dir: Move) -> Shift {
        let n = self.size;
        let mut cells = self.cells.clone();
        let mut line = vec![0u32; n];
        let mut gained = 0;
        for line_idx in 0..n {
            for (pos, slot) in line.iter_mut().enumerate() {
                *slot = self.cells[line_index(n, dir, line_idx, pos)];
            }
            gained += shift_line_front(&mut line);
            for (pos, &value) in line.iter().enumerate() {
                cells[line_index(n, dir, line_idx, pos)] = value;
            }
        }
        Shift { grid: Grid { size: n, cells }, gained }
    }

    /// True if at least one direction changes the board.
    pub fn has_moves(&self) -> bool { Move::SEARCH_ORDER.iter().any(|&dir| self.shift(dir).grid != *self) }

    /// Place `value` in an empty cell.
    pub fn with_tile(&self, cell: Cell, value: u32) -> Result<Self, EngineError> {
        let current = self
            .get(cell)
            .ok_or(EngineError::OutOfBounds { row: cell.row, col: cell.col, size: self.size })?;
        if current != 0 {
            return Err(EngineError::CellOccupied { row: cell.row, col: cell.col });
        }
        if value == 0 || !is_tile_value(value) {
            return Err(EngineError::InvalidTile { row: cell.row, col: cell.col, value });
        }
        let mut cells = self.cells.clone();
        cells[cell.row * self.size + cell.col] = value;
        Ok(Grid { size: self.size, cells })
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// With `allow_fours == false` only 2s are spawned. A full board is returned unchanged.
    pub fn with_random_tile<R: Rng + ?Sized>(&self, rng: &mut R, allow_fours: bool) -> Self {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return self.clone();
        }
        let cell = empty[rng.gen_range(0..empty.len())];
        let mut cells = self.cells.clone();
        cells[cell.row * self.size + cell.col] = generate_random_tile(rng, allow_fours);
        Grid { size: self.size, cells }
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid{}x{}", self.size, self.size)?;
        f.debug_list().entries(self.rows()).finish()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divider = "-".repeat(self.size * 8);
        writeln!(f)?;
        for (idx, row) in self.rows().enumerate() {
            if idx > 0 {
                writeln!(f, "{}", divider)?;
            }
            let line: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

/// The board engine collaborator: the live game the agent plays on.
///
/// Only the stateful methods are required. The pure rule methods default to the [`Grid`]
/// rules; an engine with different movement rules can override them.
pub trait BoardEngine: Sync {
    /// Read-only snapshot of the authoritative board.
    fn current_board(&self) -> Grid;

    fn current_score(&self) -> u64;

    fn is_over(&self) -> bool;

    /// Apply `dir` to the authoritative board. Called exactly once per agent decision.
    fn commit_move(&mut self, dir: Move) -> Result<(), EngineError>;

    /// Pure move application on a copy. Returns the unchanged grid for a no-op move.
    fn apply_move(&self, board: &Grid, dir: Move) -> Shift { board.shift(dir) }

    fn empty_cells(&self, board: &Grid) -> Vec<Cell> { board.empty_cells() }

    /// Pure tile insertion on a copy.
    fn insert_tile(&self, board: &Grid, cell: Cell, value: u32) -> Result<Grid, EngineError> {
        board.with_tile(cell, value)
    }
}

/// Largest tile a `u32` cell holds.
pub const MAX_TILE: u32 = 1 << 31;

#[inline]
fn is_tile_value(value: u32) -> bool { value == 0 || (value >= 2 && value.is_power_of_two()) }

fn line_index(n: usize, dir: Move, line: usize, pos: usize) -> usize {
    match dir {
        Move::Left => line * n + pos,
        Move::Right => line * n + (n - 1 - pos),
        Move::Up => pos * n + line,
        Move::Down => (n - 1 - pos) * n + line,
    }
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R, allow_fours: bool) -> u32 {
    if !allow_fours || rng.gen_range(0..10) < 9 { 2 } else { 4 }
}

/// Compact and merge a line towards index 0, returning the points gained.
fn shift_line_front(line: &mut [u32]) -> u64 {
    let mut gained = 0;
    for i in 0..line.len() {
        gained += pull_into_front(&mut line[i..]);
    }
    gained
}

/// Pull the first tile of `slice` into slot 0, merging it with the next equal tile.
///
/// Tiles at [`MAX_TILE`] never merge.
fn pull_into_front(slice: &mut [u32]) -> u64 {
    let mut acc = 0;
    let mut gained = 0;
    for idx in 0..slice.len() {
        let val = slice[idx];
        if acc != 0 && acc == val && acc < MAX_TILE {
            slice[idx] = 0;
            acc *= 2;
            gained = u64::from(acc);
            break;
        } else if acc != 0 && val != 0 {
            break;
        } else if acc == 0 && val != 0 {
            slice[idx] = 0;
            acc = val;
        }
    }
    slice[0] = acc;
    gained
}

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn shifted(mut line: Vec<u32>) -> (Vec<u32>, u64) {
        let gained = shift_line_front(&mut line);
        (line, gained)
    }

    fn grid(rows: &[[u32; 4]; 4]) -> Grid { Grid::from_rows(rows).unwrap() }

    #[test]
    fn it_shift_line_front() {
        assert_eq!(shifted(vec![0, 0, 0, 0]), (vec![0, 0, 0, 0], 0));
        assert_eq!(shifted(vec![2, 4, 2, 4]), (vec![2, 4, 2, 4], 0));
        assert_eq!(shifted(vec![2, 2, 4, 4]), (vec![4, 8, 0, 0], 12));
        assert_eq!(shifted(vec![2, 0, 0, 2]), (vec![4, 0, 0, 0], 4));
        assert_eq!(shifted(vec![2, 2, 2, 2]), (vec![4, 4, 0, 0], 8));
        assert_eq!(shifted(vec![4, 4, 8, 0]), (vec![8, 8, 0, 0], 8));
        assert_eq!(shifted(vec![0, 2, 2, 2, 2]), (vec![4, 4, 0, 0, 0], 8));
    }

    #[test]
    fn test_move_left() {
        let g = grid(&[[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let s = g.shift(Move::Left);
        assert_eq!(s.grid, grid(&[[2, 4, 8, 16], [2, 16, 4, 0], [8, 0, 0, 0], [2, 4, 0, 0]]));
        assert_eq!(s.gained, 16 + 8);
    }

    #[test]
    fn test_move_right() {
        let g = grid(&[[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let s = g.shift(Move::Right);
        assert_eq!(s.grid, grid(&[[2, 4, 8, 16], [0, 2, 16, 4], [0, 0, 0, 8], [0, 0, 2, 4]]));
    }

    #[test]
    fn test_move_up() {
        let g = grid(&[[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]]);
        let s = g.shift(Move::Up);
        assert_eq!(s.grid, grid(&[[2, 2, 8, 2], [4, 16, 0, 4], [8, 4, 0, 0], [16, 0, 0, 0]]));
        assert_eq!(s.gained, 16 + 8);
    }

    #[test]
    fn test_move_down() {
        let g = grid(&[[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]]);
        let s = g.shift(Move::Down);
        assert_eq!(s.grid, grid(&[[2, 0, 0, 0], [4, 2, 0, 0], [8, 16, 0, 2], [16, 4, 8, 4]]));
    }

    #[test]
    fn it_rejects_malformed_rows() {
        assert_eq!(Grid::from_rows(&[vec![0u32]]), Err(EngineError::TooSmall(1)));
        assert_eq!(
            Grid::from_rows(&[vec![0u32, 0], vec![0]]),
            Err(EngineError::NotSquare { row: 1, len: 1, size: 2 })
        );
        assert_eq!(
            Grid::from_rows(&[vec![0u32, 3], vec![0, 0]]),
            Err(EngineError::InvalidTile { row: 0, col: 1, value: 3 })
        );
        assert!(Grid::from_rows(&[vec![0u32, 1], vec![0, 0]]).is_err());
    }

    #[test]
    fn it_count_empty() {
        let g = grid(&[[2, 2, 2, 2], [0, 0, 0, 0], [2, 2, 2, 2], [0, 0, 0, 0]]);
        assert_eq!(g.count_empty(), 8);
        assert_eq!(g.empty_cells()[0], Cell::new(1, 0));
        assert_eq!(g.empty_cells()[7], Cell::new(3, 3));
    }

    #[test]
    fn it_inserts_tiles() {
        let g = Grid::empty(3).unwrap();
        let g2 = g.with_tile(Cell::new(1, 2), 4).unwrap();
        assert_eq!(g2.get(Cell::new(1, 2)), Some(4));
        assert_eq!(g.get(Cell::new(1, 2)), Some(0));
        assert_eq!(g2.with_tile(Cell::new(1, 2), 2), Err(EngineError::CellOccupied { row: 1, col: 2 }));
        assert!(matches!(g2.with_tile(Cell::new(3, 0), 2), Err(EngineError::OutOfBounds { .. })));
    }

    #[test]
    fn it_test_insert_random_tile() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut g = Grid::empty(4).unwrap();
        for _ in 0..16 {
            g = g.with_random_tile(&mut rng, false);
        }
        assert_eq!(g.count_empty(), 0);
        assert!(g.rows().flatten().all(|&v| v == 2));
        assert_eq!(g.with_random_tile(&mut rng, true), g);
    }

    #[test]
    fn it_detects_locked_board() {
        let locked = grid(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(!locked.has_moves());
        assert!(grid(&[[2, 2, 4, 8], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]]).has_moves());
    }

    #[test]
    fn it_keeps_largest_tiles_apart() {
        let g = Grid::from_rows(&[[MAX_TILE, MAX_TILE], [0, 0]]).unwrap();
        let s = g.shift(Move::Left);
        assert_eq!(s.grid, g);
        assert_eq!(s.gained, 0);
        let (line, gained) = shifted(vec![1 << 30, 1 << 30, MAX_TILE, 0]);
        assert_eq!(line, vec![MAX_TILE, MAX_TILE, 0, 0]);
        assert_eq!(gained, u64::from(MAX_TILE));
        let full = Grid::from_rows(&[[MAX_TILE, MAX_TILE], [MAX_TILE, MAX_TILE]]).unwrap();
        assert!(!full.has_moves());
    }

    #[test]
    fn it_columns_and_highest_tile() {
        let g = grid(&[[2, 0, 0, 0], [4, 0, 0, 0], [8, 0, 0, 0], [1024, 0, 0, 2]]);
        assert_eq!(g.column(0).collect::<Vec<_>>(), vec![2, 4, 8, 1024]);
        assert_eq!(g.highest_tile(), 1024);
    }
}
