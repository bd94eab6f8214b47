//! Minimax and expectimax move selection.
//!
//! This module provides two agent flavours behind one type:
//! - [`SearchAgent::minimax`]: the environment is assumed to place the worst tile for us.
//! - [`SearchAgent::expectimax`]: the environment's placement is averaged by its probability.
//!
//! Both share the state transition model ([`enumerate_player_moves`],
//! [`enumerate_random_insertions`]), the [`heuristic`] and the recursive [`SearchTree`].
//!
//! Notes
//! - Depth counts layers, not full turns: a budget of 3 expands player, environment, player.
//! - Search never touches the live board; only the chosen move is committed.
//!
//! Quick start
//! ```
//! use ai_2048_search::engine::BoardEngine;
//! use ai_2048_search::game::Game;
//! use ai_2048_search::search::{Decision, SearchAgent, SearchConfig};
//!
//! let game = Game::new(4, 7).unwrap();
//! let mut agent = SearchAgent::expectimax(game, SearchConfig::default()).unwrap();
//! match agent.choose_and_apply_move().unwrap() {
//!     Decision::Moved(report) => assert_eq!(report.score, agent.engine().current_score()),
//!     Decision::GameOver => unreachable!("fresh game has moves"),
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, Move};

mod agent;
mod backup;
mod depth;
mod heuristic;
mod state;

pub use agent::{Decision, MoveReport, SearchAgent};
pub use backup::{Backup, NodeKind, SearchTree};
pub use depth::{DepthPolicy, Phase};
pub use heuristic::{heuristic, monotonicity, smoothness, HeuristicWeights};
pub use state::{enumerate_player_moves, enumerate_random_insertions, GameState, Insertion, Turn};

/// How the environment layer of the tree is backed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Worst-case tile placement (min over insertions).
    Minimax,
    /// Probability-weighted tile placement (expectation over insertions).
    Expectimax,
}

/// Configurable knobs for the search agents.
///
/// - `base_depth`: layer budget before the dynamic adjustment; must be positive.
/// - `dynamic_depth`: adapt the budget to the fraction of empty cells (see [`DepthPolicy`]).
/// - `allow_fours`: whether the environment may place 4-tiles.
/// - `dead_end_penalty`: subtracted from the heuristic of a node with no continuation.
/// - `deadline_ms`: optional per-decision time budget; nodes reached after it are scored as leaves.
/// - `parallel_root`: evaluate root candidates on the rayon pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_depth: u32,
    pub dynamic_depth: bool,
    pub allow_fours: bool,
    pub weights: HeuristicWeights,
    pub dead_end_penalty: f64,
    pub deadline_ms: Option<u64>,
    pub parallel_root: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_depth: 2,
            dynamic_depth: true,
            allow_fours: true,
            weights: HeuristicWeights::default(),
            dead_end_penalty: 9999.0,
            deadline_ms: None,
            parallel_root: false,
        }
    }
}

impl SearchConfig {
    /// Reject configurations the search cannot honour. Nothing is clamped.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.base_depth == 0 {
            return Err(SearchError::ZeroDepth);
        }
        if let Some((name, value)) = self.weights.first_non_finite() {
            return Err(SearchError::InvalidWeight { name, value });
        }
        if !self.dead_end_penalty.is_finite() {
            return Err(SearchError::InvalidWeight { name: "dead_end_penalty", value: self.dead_end_penalty });
        }
        Ok(())
    }

    #[inline]
    pub fn depth_policy(&self) -> DepthPolicy { DepthPolicy { base: self.base_depth, dynamic: self.dynamic_depth } }

    #[inline]
    pub fn deadline(&self) -> Option<Duration> { self.deadline_ms.map(Duration::from_millis) }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("base search depth must be positive")]
    ZeroDepth,
    #[error("{name} must be finite, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("board engine reported a {found}x{found} board, agent was built for {expected}x{expected}")]
    BoardSizeMismatch { expected: usize, found: usize },
    #[error("board engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Per-branch value at the root.
///
/// - `value` is the backed-up value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub value: f64,
    pub legal: bool,
}

/// Basic search stats for a single decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaves: u64,
    pub dead_ends: u64,
    pub deadline_cutoffs: u64,
    /// Smallest cumulative probability reached through expectation layers. Diagnostic only.
    pub smallest_branch_prob: f64,
}

impl Default for SearchStats {
    fn default() -> Self {
        Self { nodes: 0, leaves: 0, dead_ends: 0, deadline_cutoffs: 0, smallest_branch_prob: 1.0 }
    }
}

impl SearchStats {
    pub(crate) fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.leaves += other.leaves;
        self.dead_ends += other.dead_ends;
        self.deadline_cutoffs += other.deadline_cutoffs;
        self.smallest_branch_prob = self.smallest_branch_prob.min(other.smallest_branch_prob);
    }
}
