use std::time::Instant;

use crate::engine::BoardEngine;

use super::heuristic::heuristic;
use super::state::{enumerate_player_moves, enumerate_random_insertions, GameState, Turn};
use super::{Algorithm, SearchConfig, SearchError, SearchStats};

/// Layer kind of a search node. Only the way children are combined differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Player choice: best child.
    Max,
    /// Adversarial environment: worst child.
    Min,
    /// Random environment: probability-weighted sum of children.
    Expectation,
}

impl NodeKind {
    /// Kind of the node holding a state whose next actor is `turn`.
    pub fn for_turn(algorithm: Algorithm, turn: Turn) -> Self {
        match (turn, algorithm) {
            (Turn::Player, _) => NodeKind::Max,
            (Turn::Environment, Algorithm::Minimax) => NodeKind::Min,
            (Turn::Environment, Algorithm::Expectimax) => NodeKind::Expectation,
        }
    }

    /// Fold one more child into the running aggregate. `probability` is ignored by Max and Min.
    #[inline]
    pub fn combine(self, acc: Option<f64>, value: f64, probability: f64) -> f64 {
        match self {
            NodeKind::Max => acc.map_or(value, |a| a.max(value)),
            NodeKind::Min => acc.map_or(value, |a| a.min(value)),
            NodeKind::Expectation => acc.unwrap_or(0.0) + value * probability,
        }
    }
}

/// Outcome of expanding one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backup {
    Value(f64),
    /// The node had no children: no legal move or no empty cell.
    DeadEnd,
}

impl From<Option<f64>> for Backup {
    fn from(acc: Option<f64>) -> Self { acc.map_or(Backup::DeadEnd, Backup::Value) }
}

/// Depth-limited recursive evaluator shared by both agents.
///
/// Depth counts layers: every player and every environment layer costs one unit, and depth 0
/// is scored with the heuristic whatever the node kind.
pub struct SearchTree<'a, E: ?Sized> {
    engine: &'a E,
    cfg: &'a SearchConfig,
    algorithm: Algorithm,
    deadline: Option<Instant>,
    stats: SearchStats,
}

impl<'a, E: BoardEngine + ?Sized> SearchTree<'a, E> {
    pub fn new(engine: &'a E, cfg: &'a SearchConfig, algorithm: Algorithm) -> Self {
        Self { engine, cfg, algorithm, deadline: None, stats: SearchStats::default() }
    }

    /// Stop expanding once `deadline` has passed; later nodes are scored as leaves.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Statistics accumulated by every `value` call on this tree.
    #[inline]
    pub fn stats(&self) -> SearchStats { self.stats }

    /// Backed-up value of `state` searched `depth` layers deep.
    pub fn value(&mut self, state: &GameState, depth: u32) -> Result<f64, SearchError> {
        self.evaluate(state, depth, 1.0)
    }

    fn evaluate(&mut self, state: &GameState, depth: u32, cum_prob: f64) -> Result<f64, SearchError> {
        self.stats.nodes += 1;
        if depth == 0 {
            self.stats.leaves += 1;
            return Ok(self.leaf(state));
        }
        if self.deadline_passed() {
            self.stats.deadline_cutoffs += 1;
            if self.stats.deadline_cutoffs == 1 {
                log::trace!("deadline reached after {} nodes, scoring remaining nodes as leaves", self.stats.nodes);
            }
            self.stats.leaves += 1;
            return Ok(self.leaf(state));
        }

        let kind = NodeKind::for_turn(self.algorithm, state.turn());
        match self.expand(kind, state, depth, cum_prob)? {
            Backup::Value(value) => Ok(value),
            Backup::DeadEnd => {
                self.stats.dead_ends += 1;
                Ok(self.leaf(state) - self.cfg.dead_end_penalty)
            }
        }
    }

    fn expand(&mut self, kind: NodeKind, state: &GameState, depth: u32, cum_prob: f64) -> Result<Backup, SearchError> {
        let mut acc = None;
        match kind {
            NodeKind::Max => {
                for child in enumerate_player_moves(self.engine, state) {
                    let value = self.evaluate(&child, depth - 1, cum_prob)?;
                    acc = Some(kind.combine(acc, value, 1.0));
                }
            }
            NodeKind::Min | NodeKind::Expectation => {
                for insertion in enumerate_random_insertions(self.engine, state)? {
                    let branch_prob = match kind {
                        NodeKind::Expectation => self.note_branch(cum_prob * insertion.probability),
                        _ => cum_prob,
                    };
                    let value = self.evaluate(&insertion.state, depth - 1, branch_prob)?;
                    acc = Some(kind.combine(acc, value, insertion.probability));
                }
            }
        }
        Ok(Backup::from(acc))
    }

    #[inline]
    fn leaf(&self, state: &GameState) -> f64 { heuristic(state, &self.cfg.weights) }

    #[inline]
    fn note_branch(&mut self, prob: f64) -> f64 {
        self.stats.smallest_branch_prob = self.stats.smallest_branch_prob.min(prob);
        prob
    }

    #[inline]
    fn deadline_passed(&self) -> bool { self.deadline.is_some_and(|d| Instant::now() >= d) }
}
