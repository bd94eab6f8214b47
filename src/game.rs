//! Reference [`BoardEngine`]: a seeded game of any square size.
//!
//! ```
//! use ai_2048_search::engine::{BoardEngine, Move};
//! use ai_2048_search::game::Game;
//!
//! let mut game = Game::new(4, 42).unwrap();
//! assert_eq!(game.current_board().count_empty(), 14);
//! let legal = Move::SEARCH_ORDER
//!     .into_iter()
//!     .find(|&dir| game.current_board().shift(dir).grid != game.current_board())
//!     .unwrap();
//! game.commit_move(legal).unwrap();
//! assert!(game.moves() == 1);
//! ```

use rand::{rngs::StdRng, SeedableRng};
use std::fmt;

use crate::engine::{BoardEngine, EngineError, Grid, Move};

/// Live game state: the authoritative grid, running score and spawn RNG.
#[derive(Debug, Clone)]
pub struct Game {
    grid: Grid,
    score: u64,
    moves: u64,
    allow_fours: bool,
    rng: StdRng,
}

impl Game {
    /// Start a `size`x`size` game with two random tiles (deterministic for a given `seed`).
    pub fn new(size: usize, seed: u64) -> Result<Self, EngineError> { Self::with_options(size, seed, true) }

    /// Like [`Game::new`], with the 4-tile setting applied to the opening tiles too.
    pub fn with_options(size: usize, seed: u64, allow_fours: bool) -> Result<Self, EngineError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = Grid::empty(size)?
            .with_random_tile(&mut rng, allow_fours)
            .with_random_tile(&mut rng, allow_fours);
        Ok(Game { grid, score: 0, moves: 0, allow_fours, rng })
    }

    /// Resume from a fixed position.
    pub fn from_grid(grid: Grid, score: u64, seed: u64) -> Self {
        Game { grid, score, moves: 0, allow_fours: true, rng: StdRng::seed_from_u64(seed) }
    }

    /// Enable or disable spawning of 4-tiles after each move.
    pub fn with_fours(mut self, allow_fours: bool) -> Self {
        self.allow_fours = allow_fours;
        self
    }

    #[inline]
    pub fn grid(&self) -> &Grid { &self.grid }

    /// Number of moves committed so far.
    #[inline]
    pub fn moves(&self) -> u64 { self.moves }

    /// Return the highest tile value (e.g., 2048) present on the board.
    #[inline]
    pub fn highest_tile(&self) -> u32 { self.grid.highest_tile() }
}

impl BoardEngine for Game {
    fn current_board(&self) -> Grid { self.grid.clone() }

    fn current_score(&self) -> u64 { self.score }

    /// True when no move in any direction changes the board.
    fn is_over(&self) -> bool { !self.grid.has_moves() }

    /// Perform a move then insert a random tile.
    fn commit_move(&mut self, dir: Move) -> Result<(), EngineError> {
        let shifted = self.grid.shift(dir);
        if shifted.grid == self.grid {
            return Err(EngineError::NoOpMove(dir));
        }
        self.grid = shifted.grid.with_random_tile(&mut self.rng, self.allow_fours);
        self.score += shifted.gained;
        self.moves += 1;
        Ok(())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}score: {}", self.grid, self.score)
    }
}
