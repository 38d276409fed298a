//! Breadth-first distance field used to explain pathfinding outcomes.

use std::collections::VecDeque;

use tilewalk_core::{CellCoord, Direction, GridSize};

/// Dense step-distance grid seeded from a single origin cell.
///
/// Distances count 4-connected steps across open cells and default to
/// `u32::MAX` for cells that cannot be reached, so callers can tell walled-off
/// regions apart from distant ones.
#[derive(Clone, Debug, Default)]
pub struct DistanceField {
    size: GridSize,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Rebuilds the distances using a breadth-first search from `origin`.
    pub(crate) fn rebuild_with<F>(&mut self, size: GridSize, origin: CellCoord, mut is_blocked: F)
    where
        F: FnMut(CellCoord) -> bool,
    {
        self.size = size;
        self.distances.clear();
        self.distances.resize(size.cell_count(), u32::MAX);

        let Some(origin_index) = size.index(origin) else {
            return;
        };
        if is_blocked(origin) {
            return;
        }

        self.distances[origin_index] = 0;
        let mut queue = VecDeque::from([origin]);

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = size.index(cell) else {
                continue;
            };
            let next_distance = self.distances[current_index].saturating_add(1);

            for direction in Direction::ALL {
                let Some(neighbor) = direction.step_from(cell, size) else {
                    continue;
                };
                if is_blocked(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = size.index(neighbor) else {
                    continue;
                };
                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Step distance from the origin, or `None` when the cell is unreachable
    /// or lies outside the field.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        self.size
            .index(cell)
            .and_then(|offset| self.distances.get(offset).copied())
            .filter(|distance| *distance != u32::MAX)
    }

    /// Number of cells reachable from the origin, the origin included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances
            .iter()
            .filter(|distance| **distance != u32::MAX)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_with_sets_origin_to_zero() {
        let mut field = DistanceField::default();

        field.rebuild_with(GridSize::new(3, 4), CellCoord::new(1, 2), |_| false);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
        assert_eq!(field.reachable_count(), 12);
    }

    #[test]
    fn rebuild_with_respects_walls() {
        let mut field = DistanceField::default();
        let wall = CellCoord::new(1, 1);

        field.rebuild_with(GridSize::new(3, 4), CellCoord::new(1, 2), |cell| cell == wall);

        assert_eq!(field.distance(wall), None);
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn blocked_origin_reaches_nothing() {
        let mut field = DistanceField::default();
        let origin = CellCoord::new(0, 0);

        field.rebuild_with(GridSize::new(2, 2), origin, |cell| cell == origin);

        assert_eq!(field.reachable_count(), 0);
        assert_eq!(field.distance(CellCoord::new(1, 1)), None);
    }
}
