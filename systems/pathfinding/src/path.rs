use std::collections::VecDeque;

use tilewalk_core::CellCoord;

/// Ordered route produced by a successful search.
///
/// The first cell is the step right after the start and the last cell is the
/// goal. An empty path means the start already was the goal. Cells are
/// consumed front to back by [`Path::pop_next`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    steps: VecDeque<CellCoord>,
}

impl Path {
    pub(crate) fn from_steps(steps: Vec<CellCoord>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Number of steps left on the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether no steps remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Removes and returns the next cell to enter.
    pub fn pop_next(&mut self) -> Option<CellCoord> {
        self.steps.pop_front()
    }

    /// Remaining cells in travel order.
    #[must_use]
    pub fn cells(&self) -> Vec<CellCoord> {
        self.steps.iter().copied().collect()
    }

    /// Iterator over the remaining cells in travel order.
    pub fn iter(&self) -> impl Iterator<Item = &CellCoord> {
        self.steps.iter()
    }
}
