use crate::engine::{BoardEngine, EngineError, Grid, Move};

/// Raw spawn weight of a 2-tile when 4-tiles are allowed.
const TWO_WEIGHT: f64 = 0.9;
/// Raw spawn weight of a 4-tile.
const FOUR_WEIGHT: f64 = 0.1;

/// Who acts next from a [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    Player,
    Environment,
}

/// One node's view of the game: a board snapshot plus the bookkeeping the search needs.
///
/// States are never mutated; children are built from their parent by one move or one insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    grid: Grid,
    score: u64,
    turn: Turn,
    last_move: Option<Move>,
    allow_fours: bool,
}

impl GameState {
    /// A player-to-move state at the root of a decision.
    pub fn root(grid: Grid, score: u64, allow_fours: bool) -> Self {
        Self::new(grid, score, Turn::Player, allow_fours)
    }

    pub fn new(grid: Grid, score: u64, turn: Turn, allow_fours: bool) -> Self {
        GameState { grid, score, turn, last_move: None, allow_fours }
    }

    #[inline]
    pub fn grid(&self) -> &Grid { &self.grid }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    #[inline]
    pub fn turn(&self) -> Turn { self.turn }

    /// The player move that produced this state, if it is a player-move child.
    #[inline]
    pub fn last_move(&self) -> Option<Move> { self.last_move }

    #[inline]
    pub fn allow_fours(&self) -> bool { self.allow_fours }
}

/// An environment child together with its probability of occurring.
#[derive(Debug, Clone, PartialEq)]
pub struct Insertion {
    pub state: GameState,
    pub probability: f64,
}

/// States reachable by one player move, in [`Move::SEARCH_ORDER`].
///
/// Moves that leave the board unchanged are skipped, so the input grid never reappears.
/// Empty when no move changes the board.
pub fn enumerate_player_moves<E>(engine: &E, state: &GameState) -> Vec<GameState>
where
    E: BoardEngine + ?Sized,
{
    let mut children = Vec::with_capacity(Move::SEARCH_ORDER.len());
    for dir in Move::SEARCH_ORDER {
        let shifted = engine.apply_move(&state.grid, dir);
        if shifted.grid != state.grid {
            children.push(GameState {
                grid: shifted.grid,
                score: state.score + shifted.gained,
                turn: Turn::Environment,
                last_move: Some(dir),
                allow_fours: state.allow_fours,
            });
        }
    }
    children
}

/// Every tile the environment could place, with probabilities summing to 1.
///
/// Each empty cell yields a 2 (weight 0.9) and a 4 (weight 0.1); with fours disabled only the
/// 2 remains, at weight 1. Weights are divided by the number of empty cells.
/// Empty when the board is full.
pub fn enumerate_random_insertions<E>(engine: &E, state: &GameState) -> Result<Vec<Insertion>, EngineError>
where
    E: BoardEngine + ?Sized,
{
    let empty = engine.empty_cells(&state.grid);
    if empty.is_empty() {
        return Ok(Vec::new());
    }
    let open = empty.len() as f64;
    let spawns: &[(u32, f64)] =
        if state.allow_fours { &[(2, TWO_WEIGHT), (4, FOUR_WEIGHT)] } else { &[(2, 1.0)] };

    let mut children = Vec::with_capacity(empty.len() * spawns.len());
    for cell in empty {
        for &(value, weight) in spawns {
            let grid = engine.insert_tile(&state.grid, cell, value)?;
            children.push(Insertion {
                state: GameState { grid, score: state.score, turn: Turn::Player, last_move: None, allow_fours: state.allow_fours },
                probability: weight / open,
            });
        }
    }
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;

    fn engine_for(rows: &[[u32; 4]; 4]) -> (Game, GameState) {
        let grid = Grid::from_rows(rows).unwrap();
        (Game::from_grid(grid.clone(), 0, 0), GameState::root(grid, 100, true))
    }

    #[test]
    fn player_moves_skip_no_ops_and_keep_order() {
        // Left and Up are no-ops: every tile is already packed into the top-left corner.
        let (game, root) = engine_for(&[[2, 4, 0, 0], [8, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let children = enumerate_player_moves(&game, &root);
        let dirs: Vec<_> = children.iter().map(|c| c.last_move().unwrap()).collect();
        assert_eq!(dirs, vec![Move::Right, Move::Down]);
        for child in &children {
            assert_ne!(child.grid(), root.grid());
            assert_eq!(child.turn(), Turn::Environment);
        }
    }

    #[test]
    fn player_moves_accumulate_score() {
        let (game, root) = engine_for(&[[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let children = enumerate_player_moves(&game, &root);
        assert_eq!(children[0].last_move(), Some(Move::Left));
        assert_eq!(children[0].score(), 104);
        // Down slides without merging.
        let down = children.iter().find(|c| c.last_move() == Some(Move::Down)).unwrap();
        assert_eq!(down.score(), 100);
    }

    #[test]
    fn locked_board_has_no_player_moves() {
        let (game, root) = engine_for(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(enumerate_player_moves(&game, &root).is_empty());
        assert!(enumerate_random_insertions(&game, &root).unwrap().is_empty());
    }

    #[test]
    fn insertions_cover_both_tiles_and_sum_to_one() {
        let (game, root) = engine_for(&[[2, 4, 0, 0], [8, 0, 0, 16], [0, 32, 0, 0], [64, 0, 128, 0]]);
        let k = root.grid().count_empty();
        let children = enumerate_random_insertions(&game, &root).unwrap();
        assert_eq!(children.len(), 2 * k);
        let total: f64 = children.iter().map(|c| c.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let fours = children.iter().filter(|c| c.probability < 0.05).count();
        assert_eq!(fours, k);
        for child in &children {
            assert_eq!(child.state.turn(), Turn::Player);
            assert_eq!(child.state.score(), root.score());
            assert_eq!(child.state.grid().count_empty(), k - 1);
        }
    }

    #[test]
    fn insertions_without_fours_are_uniform() {
        let grid = Grid::from_rows(&[[2u32, 0, 0], [0, 4, 0], [0, 0, 8]]).unwrap();
        let game = Game::from_grid(grid.clone(), 0, 0);
        let root = GameState::root(grid, 0, false);
        let children = enumerate_random_insertions(&game, &root).unwrap();
        assert_eq!(children.len(), 6);
        for child in &children {
            assert!((child.probability - 1.0 / 6.0).abs() < 1e-12);
        }
        let total: f64 = children.iter().map(|c| c.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
