/// Game phase derived from the share of empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// More than 70% of cells empty.
    Opening,
    Midgame,
    /// At most 30% of cells empty.
    Endgame,
}

impl Phase {
    // Thresholds in tenths of the board.
    const OPENING_ABOVE_TENTHS: usize = 7;
    const ENDGAME_AT_OR_BELOW_TENTHS: usize = 3;

    pub fn classify(blanks: usize, cells: usize) -> Self {
        if blanks * 10 > Self::OPENING_ABOVE_TENTHS * cells {
            Phase::Opening
        } else if blanks * 10 > Self::ENDGAME_AT_OR_BELOW_TENTHS * cells {
            Phase::Midgame
        } else {
            Phase::Endgame
        }
    }
}

/// Per-decision layer budget.
///
/// With `dynamic` set, openings search one layer shallower than `base` and endgames one layer
/// deeper; otherwise the budget is always `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthPolicy {
    pub base: u32,
    pub dynamic: bool,
}

impl DepthPolicy {
    pub fn depth_for(&self, blanks: usize, cells: usize) -> u32 {
        if !self.dynamic {
            return self.base;
        }
        match Phase::classify(blanks, cells) {
            Phase::Opening => self.base.saturating_sub(1),
            Phase::Midgame => self.base,
            Phase::Endgame => self.base + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_depth_follows_phase() {
        let policy = DepthPolicy { base: 2, dynamic: true };
        assert_eq!(policy.depth_for(12, 16), 1);
        assert_eq!(policy.depth_for(6, 16), 2);
        assert_eq!(policy.depth_for(2, 16), 3);
    }

    #[test]
    fn phase_boundaries() {
        // 0.7 * 20 = 14, 0.3 * 20 = 6
        assert_eq!(Phase::classify(15, 20), Phase::Opening);
        assert_eq!(Phase::classify(14, 20), Phase::Midgame);
        assert_eq!(Phase::classify(7, 20), Phase::Midgame);
        assert_eq!(Phase::classify(6, 20), Phase::Endgame);
        assert_eq!(Phase::classify(0, 25), Phase::Endgame);
    }

    #[test]
    fn static_depth_ignores_blanks() {
        let policy = DepthPolicy { base: 3, dynamic: false };
        assert_eq!(policy.depth_for(16, 16), 3);
        assert_eq!(policy.depth_for(0, 16), 3);
    }

    #[test]
    fn shallow_base_one_collapses_to_zero() {
        let policy = DepthPolicy { base: 1, dynamic: true };
        assert_eq!(policy.depth_for(15, 16), 0);
    }
}
