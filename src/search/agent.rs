use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::engine::{BoardEngine, Move};

use super::backup::SearchTree;
use super::state::{enumerate_player_moves, GameState};
use super::{Algorithm, BranchEval, SearchConfig, SearchError, SearchStats};

/// What the agent did with its turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Moved(MoveReport),
    /// The engine reports the game finished or no direction changes the board; nothing was committed.
    GameOver,
}

impl Decision {
    /// The committed direction, if any.
    pub fn direction(&self) -> Option<Move> {
        match self {
            Decision::Moved(report) => Some(report.direction),
            Decision::GameOver => None,
        }
    }
}

/// Telemetry for one committed move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub direction: Move,
    /// Backed-up value of the chosen move.
    pub value: f64,
    /// Layer budget used for this decision.
    pub depth: u32,
    /// Wall time spent searching.
    pub elapsed: Duration,
    /// Score reported by the engine after the move was committed.
    pub score: u64,
}

/// Plays one move at a time on a [`BoardEngine`].
///
/// Constructors validate the configuration and remember the board size; a later board of a
/// different size is reported as [`SearchError::BoardSizeMismatch`].
pub struct SearchAgent<E> {
    engine: E,
    algorithm: Algorithm,
    cfg: SearchConfig,
    size: usize,
    stats: SearchStats,
}

impl<E: BoardEngine> SearchAgent<E> {
    pub fn new(engine: E, algorithm: Algorithm, cfg: SearchConfig) -> Result<Self, SearchError> {
        cfg.validate()?;
        let size = engine.current_board().size();
        Ok(Self { engine, algorithm, cfg, size, stats: SearchStats::default() })
    }

    /// Agent assuming worst-case tile placement.
    pub fn minimax(engine: E, cfg: SearchConfig) -> Result<Self, SearchError> {
        Self::new(engine, Algorithm::Minimax, cfg)
    }

    /// Agent averaging over tile placements by probability.
    pub fn expectimax(engine: E, cfg: SearchConfig) -> Result<Self, SearchError> {
        Self::new(engine, Algorithm::Expectimax, cfg)
    }

    #[inline]
    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    #[inline]
    pub fn config(&self) -> &SearchConfig { &self.cfg }

    #[inline]
    pub fn engine(&self) -> &E { &self.engine }

    #[inline]
    pub fn engine_mut(&mut self) -> &mut E { &mut self.engine }

    pub fn into_engine(self) -> E { self.engine }

    /// Statistics collected from the last call to [`Self::choose_and_apply_move`] or
    /// [`Self::branch_evals`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Layer budget the next decision would use.
    pub fn depth_budget(&self) -> Result<u32, SearchError> {
        let root = self.snapshot()?;
        Ok(self.depth_for(&root))
    }

    /// Search the current position, commit the best move and report it.
    ///
    /// Ties go to the earliest direction in [`Move::SEARCH_ORDER`].
    pub fn choose_and_apply_move(&mut self) -> Result<Decision, SearchError> {
        let begin = Instant::now();
        let root = self.snapshot()?;
        if self.engine.is_over() {
            log::debug!("engine reports game over at score {}", root.score());
            return Ok(Decision::GameOver);
        }
        let candidates = enumerate_player_moves(&self.engine, &root);
        if candidates.is_empty() {
            log::debug!("no legal move on a {}x{} board, score {}", self.size, self.size, root.score());
            return Ok(Decision::GameOver);
        }

        let depth = self.depth_for(&root);
        let values = self.evaluate_candidates(&candidates, depth, begin)?;
        let mut best: Option<(Move, f64)> = None;
        for (candidate, &value) in candidates.iter().zip(&values) {
            if let Some(dir) = candidate.last_move() {
                if best.map_or(true, |(_, best_value)| value > best_value) {
                    best = Some((dir, value));
                }
            }
        }
        let (direction, value) = best.unwrap_or_else(|| unreachable!("player-move children always record their move"));
        let elapsed = begin.elapsed();

        self.engine.commit_move(direction)?;
        let score = self.engine.current_score();
        log::debug!(
            "{:?} depth {} chose {} (value {:.2}) over {} nodes in {:?}",
            self.algorithm,
            depth,
            direction,
            value,
            self.stats.nodes,
            elapsed
        );
        Ok(Decision::Moved(MoveReport { direction, value, depth, elapsed, score }))
    }

    /// Value of every direction from the current position, in [`Move::SEARCH_ORDER`].
    ///
    /// Illegal moves are marked `legal = false` with a value of 0. Nothing is committed.
    pub fn branch_evals(&mut self) -> Result<[BranchEval; 4], SearchError> {
        let begin = Instant::now();
        let root = self.snapshot()?;
        let depth = self.depth_for(&root);
        let candidates = enumerate_player_moves(&self.engine, &root);
        let values = self.evaluate_candidates(&candidates, depth, begin)?;

        let mut out = Move::SEARCH_ORDER.map(|dir| BranchEval { dir, value: 0.0, legal: false });
        for (candidate, value) in candidates.iter().zip(values) {
            if let Some(slot) = out.iter_mut().find(|b| Some(b.dir) == candidate.last_move()) {
                slot.value = value;
                slot.legal = true;
            }
        }
        Ok(out)
    }

    fn snapshot(&self) -> Result<GameState, SearchError> {
        let grid = self.engine.current_board();
        if grid.size() != self.size {
            return Err(SearchError::BoardSizeMismatch { expected: self.size, found: grid.size() });
        }
        Ok(GameState::root(grid, self.engine.current_score(), self.cfg.allow_fours))
    }

    fn depth_for(&self, root: &GameState) -> u32 {
        let grid = root.grid();
        self.cfg.depth_policy().depth_for(grid.count_empty(), grid.cell_count())
    }

    /// Value each root candidate starting at the environment layer, one layer below `depth`.
    fn evaluate_candidates(&mut self, candidates: &[GameState], depth: u32, begin: Instant) -> Result<Vec<f64>, SearchError> {
        let deadline = self.cfg.deadline().map(|budget| begin + budget);
        let child_depth = depth.saturating_sub(1);
        let engine = &self.engine;
        let cfg = &self.cfg;
        let algorithm = self.algorithm;

        let evaluate_one = |candidate: &GameState| -> Result<(f64, SearchStats), SearchError> {
            let mut tree = SearchTree::new(engine, cfg, algorithm).with_deadline(deadline);
            let value = tree.value(candidate, child_depth)?;
            Ok((value, tree.stats()))
        };
        let results: Vec<(f64, SearchStats)> = if self.cfg.parallel_root {
            candidates.par_iter().map(evaluate_one).collect::<Result<_, _>>()?
        } else {
            candidates.iter().map(evaluate_one).collect::<Result<_, _>>()?
        };

        let mut stats = SearchStats::default();
        let mut values = Vec::with_capacity(results.len());
        for (value, sub) in results {
            stats.merge(&sub);
            values.push(value);
        }
        log::trace!(
            "{} candidates at depth {}: {} nodes, {} dead ends, smallest branch probability {:.3e}",
            candidates.len(),
            child_depth,
            stats.nodes,
            stats.dead_ends,
            stats.smallest_branch_prob
        );
        self.stats = stats;
        Ok(values)
    }
}
