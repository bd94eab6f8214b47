use serde::{Deserialize, Serialize};

use crate::engine::Grid;

use super::GameState;

/// Weights of the four heuristic terms.
///
/// Monotonicity dominates: ordered rows and columns keep merges available.
/// Smoothness measures roughness, so its weight is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub score: f64,
    pub monotonicity: f64,
    pub smoothness: f64,
    pub blanks: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self { Self { score: 0.5, monotonicity: 1000.0, smoothness: -0.75, blanks: 0.25 } }
}

impl HeuristicWeights {
    pub(crate) fn first_non_finite(&self) -> Option<(&'static str, f64)> {
        [
            ("score", self.score),
            ("monotonicity", self.monotonicity),
            ("smoothness", self.smoothness),
            ("blanks", self.blanks),
        ]
        .into_iter()
        .find(|(_, w)| !w.is_finite())
    }
}

/// Static value of a state. Only meaningful relative to other states.
pub fn heuristic(state: &GameState, weights: &HeuristicWeights) -> f64 {
    let grid = state.grid();
    weights.score * state.score() as f64
        + weights.monotonicity * f64::from(monotonicity(grid))
        + weights.smoothness * smoothness(grid) as f64
        + weights.blanks * grid.count_empty() as f64
}

/// +1 for every row and column whose values never both rise and fall, -1 otherwise.
///
/// Empty cells take part as zeros.
pub fn monotonicity(grid: &Grid) -> i32 {
    let rows = grid.rows().map(|row| line_score(row.iter().copied()));
    let cols = (0..grid.size()).map(|col| line_score(grid.column(col)));
    rows.chain(cols).sum()
}

/// Sum of absolute differences between horizontally and vertically adjacent cells.
pub fn smoothness(grid: &Grid) -> u64 {
    let rows: u64 = grid.rows().map(|row| roughness(row.iter().copied())).sum();
    let cols: u64 = (0..grid.size()).map(|col| roughness(grid.column(col))).sum();
    rows + cols
}

fn line_score(line: impl Iterator<Item = u32>) -> i32 {
    let mut rising = true;
    let mut falling = true;
    let mut prev: Option<u32> = None;
    for val in line {
        if let Some(p) = prev {
            rising &= val >= p;
            falling &= val <= p;
        }
        prev = Some(val);
    }
    if rising || falling { 1 } else { -1 }
}

fn roughness(line: impl Iterator<Item = u32>) -> u64 {
    let mut total = 0;
    let mut prev: Option<u32> = None;
    for val in line {
        if let Some(p) = prev {
            total += u64::from(p.abs_diff(val));
        }
        prev = Some(val);
    }
    total
}
