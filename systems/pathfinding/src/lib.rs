#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* search over a 4-connected tile grid.
//!
//! The search expands neighbours in North, East, South, West order and picks
//! the open node with the lowest `f = g + h`, where `h` is the Euclidean
//! distance to the goal. Ties go to the most recently discovered node. A cell
//! is marked as seen the moment a node is created for it and is never
//! revisited, even if a cheaper route to it turns up later. Together these
//! rules make the produced paths reproducible bit for bit across runs.

mod path;

use std::time::Instant;

use log::debug;
use thiserror::Error;
use tilewalk_core::{CellCoord, Direction, GridSize};

pub use path::Path;

/// Maximum number of node expansions performed by a single search.
pub const DEFAULT_ITERATION_CAP: u32 = 1000;

/// Tunables applied to every search performed by a [`PathFinder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Hard bound on node expansions before the search gives up.
    pub iteration_cap: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iteration_cap: DEFAULT_ITERATION_CAP,
        }
    }
}

/// Reasons a search ends without reaching its goal.
///
/// None of these are failures of the pathfinder itself; they are the normal
/// negative outcome of asking for a route that does not exist.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum NoPath {
    /// The start or goal cell lies outside the grid.
    #[error("cell ({}, {}) lies outside the grid", .cell.column(), .cell.row())]
    OutOfBounds {
        /// First offending cell.
        cell: CellCoord,
    },
    /// Every reachable cell was expanded without meeting the goal.
    #[error("goal is unreachable after expanding {expanded} cells")]
    Exhausted {
        /// Number of nodes expanded before the open list ran dry.
        expanded: u32,
    },
    /// The expansion budget ran out before the goal was reached.
    #[error("search gave up after {cap} expansions")]
    IterationCap {
        /// Budget that was exhausted.
        cap: u32,
    },
}

/// A* pathfinder over a fixed-size grid.
#[derive(Clone, Debug, Default)]
pub struct PathFinder {
    config: SearchConfig,
}

impl PathFinder {
    /// Creates a pathfinder using the provided search configuration.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Computes a route from `start` to `goal`.
    ///
    /// The returned [`Path`] excludes `start` and ends on `goal`; it is empty
    /// when both cells coincide. `is_blocked` is queried at most once per
    /// cell, blocked or not, and must not have side effects.
    pub fn find_path<F>(
        &self,
        start: CellCoord,
        goal: CellCoord,
        grid: GridSize,
        mut is_blocked: F,
    ) -> Result<Path, NoPath>
    where
        F: FnMut(CellCoord) -> bool,
    {
        for cell in [start, goal] {
            if !grid.contains(cell) {
                return Err(NoPath::OutOfBounds { cell });
            }
        }

        let started_at = Instant::now();
        let mut search = Search::new(grid, goal);
        search.insert(start, None);

        let mut expanded = 0;
        let mut reached = None;
        while expanded < self.config.iteration_cap {
            let Some(current) = search.take_best() else {
                break;
            };
            expanded += 1;

            let cell = search.nodes[current].cell;
            if cell == goal {
                reached = Some(current);
                break;
            }

            for direction in Direction::ALL {
                let Some(neighbor) = direction.step_from(cell, grid) else {
                    continue;
                };
                if search.is_seen(neighbor) {
                    continue;
                }
                if is_blocked(neighbor) {
                    search.mark_seen(neighbor);
                    continue;
                }
                search.insert(neighbor, Some(current));
            }
        }

        debug!(
            "pathfind {start:?} -> {goal:?}: {expanded} expansions in {:?}",
            started_at.elapsed()
        );

        match reached {
            Some(node) => Ok(search.reconstruct(node)),
            None if search.open.is_empty() => Err(NoPath::Exhausted { expanded }),
            None => Err(NoPath::IterationCap {
                cap: self.config.iteration_cap,
            }),
        }
    }
}

type NodeId = usize;

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    cell: CellCoord,
    parent: Option<NodeId>,
    g: u32,
    f: f64,
}

/// Scratch state owned by a single `find_path` call.
#[derive(Debug)]
struct Search {
    grid: GridSize,
    goal: CellCoord,
    nodes: Vec<SearchNode>,
    open: Vec<NodeId>,
    seen: Vec<bool>,
}

impl Search {
    fn new(grid: GridSize, goal: CellCoord) -> Self {
        Self {
            grid,
            goal,
            nodes: Vec::new(),
            open: Vec::new(),
            seen: vec![false; grid.cell_count()],
        }
    }

    fn is_seen(&self, cell: CellCoord) -> bool {
        self.grid
            .index(cell)
            .and_then(|index| self.seen.get(index).copied())
            .unwrap_or(true)
    }

    fn insert(&mut self, cell: CellCoord, parent: Option<NodeId>) {
        let g = parent.map_or(0, |id| self.nodes[id].g + 1);
        let h = cell.euclidean_distance(self.goal);
        let id = self.nodes.len();
        self.nodes.push(SearchNode {
            cell,
            parent,
            g,
            f: f64::from(g) + h,
        });
        self.open.push(id);
        self.mark_seen(cell);
    }

    fn mark_seen(&mut self, cell: CellCoord) {
        if let Some(slot) = self
            .grid
            .index(cell)
            .and_then(|index| self.seen.get_mut(index))
        {
            *slot = true;
        }
    }

    /// Removes the open node with the lowest `f`, favouring the latest insertion on ties.
    fn take_best(&mut self) -> Option<NodeId> {
        let first = *self.open.first()?;
        let mut best_position = 0;
        let mut best_f = self.nodes[first].f;

        for (position, id) in self.open.iter().enumerate().skip(1) {
            let f = self.nodes[*id].f;
            if f <= best_f {
                best_position = position;
                best_f = f;
            }
        }

        Some(self.open.remove(best_position))
    }

    fn reconstruct(&self, goal: NodeId) -> Path {
        let mut cells = Vec::new();
        let mut cursor = goal;

        // The root node is the start cell, which is not part of the route.
        while let Some(parent) = self.nodes[cursor].parent {
            cells.push(self.nodes[cursor].cell);
            cursor = parent;
        }

        cells.reverse();
        Path::from_steps(cells)
    }
}
